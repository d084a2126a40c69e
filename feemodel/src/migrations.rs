//! In-place upgrades of the persisted layout.
//!
//! Version 1 kept the parameters as JSON under [`LEGACY_PARAMS_KEY`], inside
//! the parameter space shared by all modules. Version 2 owns them under
//! [`PARAMS_KEY`](crate::keeper::PARAMS_KEY) in the binary encoding and
//! records its version under
//! [`STORE_VERSION_KEY`](crate::keeper::STORE_VERSION_KEY). A store without a
//! version key is version 1.

use crate::{
    error::{Error, Result},
    keeper::{encode, read_u64, Keeper, PARAMS_KEY, STORE_VERSION_KEY},
    params::Params,
    store::{KvStore, StoreError, WriteBatch},
};
use tracing::{debug, info};

pub const CONSENSUS_VERSION: u64 = 2;

pub const LEGACY_PARAMS_KEY: &[u8] = b"params";

pub fn store_version<S: KvStore>(keeper: &Keeper<S>) -> Result<u64> {
    Ok(read_u64(keeper.store(), STORE_VERSION_KEY)?.unwrap_or(1))
}

/// Bring the store up to [`CONSENSUS_VERSION`]. Returns the version the
/// store was at before.
pub fn migrate<S: KvStore>(keeper: &mut Keeper<S>) -> Result<u64> {
    let from = store_version(keeper)?;
    match from {
        CONSENSUS_VERSION => {
            debug!(version = from, "Fee model store is up to date");
        }
        1 => migrate_v1_to_v2(keeper)?,
        _ => {
            return Err(Error::UnsupportedStoreVersion {
                found: from,
                latest: CONSENSUS_VERSION,
            })
        }
    }
    Ok(from)
}

fn migrate_v1_to_v2<S: KvStore>(keeper: &mut Keeper<S>) -> Result<()> {
    let legacy = keeper
        .store()
        .get(LEGACY_PARAMS_KEY)?
        .ok_or_else(|| Error::InvalidState("legacy params are missing".to_string()))?;
    let params: Params = serde_json::from_slice(&legacy)
        .map_err(|e| StoreError::corrupted(LEGACY_PARAMS_KEY, e))?;
    params.validate_basic()?;

    let mut batch = WriteBatch::new();
    batch
        .put(PARAMS_KEY, encode(&params)?)
        .delete(LEGACY_PARAMS_KEY)
        .put(STORE_VERSION_KEY, 2u64.to_le_bytes());
    keeper.store_mut().write(batch)?;

    info!("Migrated fee model store from version 1 to 2");
    Ok(())
}
