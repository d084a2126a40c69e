//! State owned by the fee model and the per-block driver that updates it.
//!
//! Persistent layout (single-byte keys under the module namespace):
//!
//! | Key    | Value                           |
//! |--------|---------------------------------|
//! | `0x01` | [`Params`], bincode             |
//! | `0x02` | minimum gas price [`DecCoin`]    |
//! | `0x03` | short EMA, `u64` little endian  |
//! | `0x04` | long EMA, `u64` little endian   |
//! | `0x05` | store version, `u64` LE         |
//!
//! The gas consumed by the current block lives under `0x01` in a separate
//! transient store that is cleared by [`Keeper::begin_block`].

use crate::{
    decimal::{Dec, DecCoin},
    error::{Error, Result},
    model::{calculate_ema, Model},
    params::Params,
    store::{KvStore, MemStore, StoreError, WriteBatch},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const MODULE_NAME: &str = "feemodel";

/// Namespace of the module inside a shared store.
pub const STORE_PREFIX: &[u8] = b"feemodel/";

pub const PARAMS_KEY: &[u8] = &[0x01];
pub const MIN_GAS_PRICE_KEY: &[u8] = &[0x02];
pub const SHORT_EMA_GAS_KEY: &[u8] = &[0x03];
pub const LONG_EMA_GAS_KEY: &[u8] = &[0x04];
pub const STORE_VERSION_KEY: &[u8] = &[0x05];

/// Transient key holding gas consumed in the current block.
pub const GAS_TRACKING_KEY: &[u8] = &[0x01];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeeperConfig {
    /// Address allowed to change parameters, normally the governance module.
    pub authority: String,
}

/// What [`Keeper::end_block`] computed and persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockOutcome {
    pub tracked_gas: u64,
    pub short_ema: u64,
    pub long_ema: u64,
    pub min_gas_price: DecCoin,
}

pub struct Keeper<S> {
    store: S,
    transient: MemStore,
    config: KeeperConfig,
}

impl<S: KvStore> Keeper<S> {
    pub fn new(store: S, config: KeeperConfig) -> Self {
        Self {
            store,
            transient: MemStore::new(),
            config,
        }
    }

    pub fn authority(&self) -> &str {
        &self.config.authority
    }

    pub fn config(&self) -> &KeeperConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn params(&self) -> Result<Params> {
        match self.store.get(PARAMS_KEY)? {
            Some(bytes) => decode(PARAMS_KEY, &bytes),
            None => Err(Error::InvalidState("params are not set".to_string())),
        }
    }

    /// Validate and persist `params`. Invalid parameters never reach the
    /// store.
    pub fn set_params(&mut self, params: &Params) -> Result<()> {
        params.validate_basic()?;
        self.store.set(PARAMS_KEY, &encode(params)?)?;
        Ok(())
    }

    pub fn model(&self) -> Result<Model> {
        Ok(Model::new(self.params()?.model))
    }

    /// Currently published minimum gas price.
    ///
    /// A missing value means genesis never ran, which is reported as the
    /// fatal [`Error::MinGasPriceNotInitialized`].
    pub fn min_gas_price(&self) -> Result<DecCoin> {
        match self.store.get(MIN_GAS_PRICE_KEY)? {
            Some(bytes) => decode(MIN_GAS_PRICE_KEY, &bytes),
            None => Err(Error::MinGasPriceNotInitialized),
        }
    }

    pub fn set_min_gas_price(&mut self, price: &DecCoin) -> Result<()> {
        price.validate()?;
        self.store.set(MIN_GAS_PRICE_KEY, &encode(price)?)?;
        Ok(())
    }

    pub fn short_ema(&self) -> Result<u64> {
        self.read_u64(SHORT_EMA_GAS_KEY)
    }

    pub fn set_short_ema(&mut self, value: u64) -> Result<()> {
        self.store.set(SHORT_EMA_GAS_KEY, &value.to_le_bytes())?;
        Ok(())
    }

    pub fn long_ema(&self) -> Result<u64> {
        self.read_u64(LONG_EMA_GAS_KEY)
    }

    pub fn set_long_ema(&mut self, value: u64) -> Result<()> {
        self.store.set(LONG_EMA_GAS_KEY, &value.to_le_bytes())?;
        Ok(())
    }

    /// Start a new block: gas tracked for the previous one is discarded.
    pub fn begin_block(&mut self) {
        self.transient.reset();
    }

    /// Add gas consumed by a transaction in the current block.
    pub fn track_gas(&mut self, gas: u64) -> Result<()> {
        let total = self.tracked_gas()?.saturating_add(gas);
        self.transient.set(GAS_TRACKING_KEY, &total.to_le_bytes())?;
        Ok(())
    }

    pub fn tracked_gas(&self) -> Result<u64> {
        Ok(read_u64(&self.transient, GAS_TRACKING_KEY)?.unwrap_or(0))
    }

    /// Governance entry point. Only the configured authority may replace the
    /// parameters, and only with a valid set.
    pub fn update_params(&mut self, authority: &str, params: Params) -> Result<()> {
        if authority != self.config.authority {
            warn!(
                expected = %self.config.authority,
                actual = %authority,
                "Rejected params update from unauthorized address"
            );
            return Err(Error::InvalidSigner {
                expected: self.config.authority.clone(),
                actual: authority.to_string(),
            });
        }

        self.set_params(&params)?;
        info!(authority = %authority, "Fee model params updated");
        Ok(())
    }

    /// Lowest and highest minimum gas price reachable within `after_blocks`
    /// blocks, denominated like the published price.
    pub fn calculate_edge_gas_price_after_blocks(
        &self,
        after_blocks: u32,
    ) -> Result<(DecCoin, DecCoin)> {
        let params = self.params()?;
        if after_blocks > params.model.short_ema_block_length {
            return Err(Error::InvalidRequest(format!(
                "after_blocks must be at most {}, got {}",
                params.model.short_ema_block_length, after_blocks
            )));
        }

        let current = self.min_gas_price()?;
        let (low, high) = Model::new(params.model).calculate_edge_gas_price_after_blocks(
            self.short_ema()?,
            self.long_ema()?,
            current.amount,
            after_blocks,
        );

        Ok((
            DecCoin::new(current.denom.clone(), low),
            DecCoin::new(current.denom, high),
        ))
    }

    /// Fold the gas tracked in this block into both averages and publish the
    /// price for the next block. All three values are written in one batch.
    pub fn end_block(&mut self) -> Result<BlockOutcome> {
        let model = self.model()?;
        let params = model.params();
        let denom = self.min_gas_price()?.denom;

        let tracked_gas = self.tracked_gas()?;
        let short_ema = calculate_ema(self.short_ema()?, tracked_gas, params.short_ema_block_length);
        let long_ema = calculate_ema(self.long_ema()?, tracked_gas, params.long_ema_block_length);
        let min_gas_price = DecCoin::new(denom, model.calculate_next_gas_price(short_ema, long_ema));

        let mut batch = WriteBatch::new();
        batch
            .put(SHORT_EMA_GAS_KEY, short_ema.to_le_bytes())
            .put(LONG_EMA_GAS_KEY, long_ema.to_le_bytes())
            .put(MIN_GAS_PRICE_KEY, encode(&min_gas_price)?);
        self.store.write(batch)?;

        debug!(
            tracked_gas,
            short_ema,
            long_ema,
            min_gas_price = %min_gas_price,
            "Updated fee model state"
        );

        Ok(BlockOutcome {
            tracked_gas,
            short_ema,
            long_ema,
            min_gas_price,
        })
    }

    fn read_u64(&self, key: &[u8]) -> Result<u64> {
        Ok(read_u64(&self.store, key)?.unwrap_or(0))
    }
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(key: &[u8], bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| StoreError::corrupted(key, e).into())
}

pub(crate) fn read_u64<S: KvStore>(store: &S, key: &[u8]) -> Result<Option<u64>> {
    match store.get(key)? {
        Some(bytes) => {
            let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                StoreError::corrupted(key, format!("expected 8 bytes, got {}", bytes.len()))
            })?;
            Ok(Some(u64::from_le_bytes(raw)))
        }
        None => Ok(None),
    }
}

/// `(low + high) / 2`, used as the recommended price. Falls back to
/// `low + (high - low) / 2` when the sum does not fit.
pub(crate) fn midpoint(low: Dec, high: Dec) -> Dec {
    let two = Dec::from(2u64);
    match low.checked_add(high) {
        Some(sum) => sum / two,
        None => low + (high - low) / two,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ModelParams;
    use assert_matches::assert_matches;

    const GOV: &str = "core10d07y265gmmuvt4z0w9aw880jnsr700jgrnlvc";

    fn dec(s: &str) -> Dec {
        s.parse().unwrap()
    }

    fn keeper() -> Keeper<MemStore> {
        let mut keeper = Keeper::new(
            MemStore::new(),
            KeeperConfig {
                authority: GOV.to_string(),
            },
        );
        keeper.set_params(&Params::default()).unwrap();
        keeper
            .set_min_gas_price(&DecCoin::new("ucore", dec("0.0625")))
            .unwrap();
        keeper
    }

    #[test]
    fn test_accessors_round_trip() {
        let mut keeper = keeper();
        assert_eq!(keeper.short_ema().unwrap(), 0);
        assert_eq!(keeper.long_ema().unwrap(), 0);

        keeper.set_short_ema(1_234).unwrap();
        keeper.set_long_ema(u64::MAX).unwrap();
        assert_eq!(keeper.short_ema().unwrap(), 1_234);
        assert_eq!(keeper.long_ema().unwrap(), u64::MAX);

        let params = Params::new(ModelParams {
            max_block_gas: 10_000,
            short_ema_block_length: 3,
            long_ema_block_length: 7,
            ..Default::default()
        });
        keeper.set_params(&params).unwrap();
        assert_eq!(keeper.params().unwrap(), params);

        let price = DecCoin::new("ucore", dec("1.000000000000000001"));
        keeper.set_min_gas_price(&price).unwrap();
        assert_eq!(keeper.min_gas_price().unwrap(), price);
    }

    #[test]
    fn test_invalid_params_are_not_stored() {
        let mut keeper = keeper();
        let invalid = Params::new(ModelParams {
            long_ema_block_length: 50,
            ..Default::default()
        });
        assert_matches!(keeper.set_params(&invalid), Err(Error::InvalidParams(_)));
        assert_eq!(keeper.params().unwrap(), Params::default());
    }

    #[test]
    fn test_missing_min_gas_price_is_fatal() {
        let keeper = Keeper::new(
            MemStore::new(),
            KeeperConfig {
                authority: GOV.to_string(),
            },
        );
        let err = keeper.min_gas_price().unwrap_err();
        assert_matches!(err, Error::MinGasPriceNotInitialized);
        assert!(err.is_fatal());
        assert!(keeper.params().unwrap_err().is_fatal());
    }

    #[test]
    fn test_corrupted_ema_is_reported() {
        let mut keeper = keeper();
        keeper.store_mut().set(SHORT_EMA_GAS_KEY, &[1, 2, 3]).unwrap();
        let err = keeper.short_ema().unwrap_err();
        assert_matches!(err, Error::Store(StoreError::Corrupted { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_gas_tracking_is_per_block() {
        let mut keeper = keeper();
        keeper.begin_block();
        assert_eq!(keeper.tracked_gas().unwrap(), 0);
        keeper.track_gas(21_000).unwrap();
        keeper.track_gas(79_000).unwrap();
        assert_eq!(keeper.tracked_gas().unwrap(), 100_000);

        keeper.track_gas(u64::MAX).unwrap();
        assert_eq!(keeper.tracked_gas().unwrap(), u64::MAX);

        keeper.begin_block();
        assert_eq!(keeper.tracked_gas().unwrap(), 0);
    }

    #[test]
    fn test_end_block_updates_state() {
        let mut keeper = keeper();
        keeper.begin_block();
        keeper.track_gas(1_000_000).unwrap();

        let outcome = keeper.end_block().unwrap();
        assert_eq!(
            outcome,
            BlockOutcome {
                tracked_gas: 1_000_000,
                short_ema: 20_000,
                long_ema: 1_000,
                min_gas_price: DecCoin::new("ucore", dec("0.03125")),
            }
        );
        assert_eq!(keeper.short_ema().unwrap(), 20_000);
        assert_eq!(keeper.long_ema().unwrap(), 1_000);
        assert_eq!(keeper.min_gas_price().unwrap(), outcome.min_gas_price);
    }

    #[test]
    fn test_end_block_on_idle_chain_keeps_initial_price() {
        let mut keeper = keeper();
        for _ in 0..5 {
            keeper.begin_block();
            let outcome = keeper.end_block().unwrap();
            assert_eq!(outcome.short_ema, 0);
            assert_eq!(outcome.min_gas_price.amount, dec("0.0625"));
        }
    }

    #[test]
    fn test_end_block_without_genesis_fails_without_writes() {
        let mut keeper = Keeper::new(
            MemStore::new(),
            KeeperConfig {
                authority: GOV.to_string(),
            },
        );
        keeper.set_params(&Params::default()).unwrap();
        keeper.track_gas(5).unwrap();

        assert_matches!(keeper.end_block(), Err(Error::MinGasPriceNotInitialized));
        assert_eq!(keeper.store().len(), 1);
    }

    #[test]
    fn test_update_params_requires_authority() {
        let mut keeper = keeper();
        let params = Params::new(ModelParams {
            max_discount: dec("0.25"),
            ..Default::default()
        });

        assert_matches!(
            keeper.update_params("core1attacker", params.clone()),
            Err(Error::InvalidSigner { .. })
        );
        assert_eq!(keeper.params().unwrap(), Params::default());

        keeper.update_params(GOV, params.clone()).unwrap();
        assert_eq!(keeper.params().unwrap(), params);
    }

    #[test]
    fn test_edge_prices_use_published_denom() {
        let mut keeper = keeper();
        keeper.set_short_ema(30_000_000).unwrap();
        keeper.set_long_ema(30_000_000).unwrap();
        keeper
            .set_min_gas_price(&DecCoin::new("ucore", dec("0.03125")))
            .unwrap();

        let (low, high) = keeper.calculate_edge_gas_price_after_blocks(10).unwrap();
        assert_eq!(low, DecCoin::new("ucore", dec("0.03125")));
        assert_eq!(high.denom, "ucore");
        assert!(high.amount > low.amount);

        assert_matches!(
            keeper.calculate_edge_gas_price_after_blocks(51),
            Err(Error::InvalidRequest(_))
        );
    }

    #[test]
    fn test_midpoint() {
        assert_eq!(midpoint(dec("0.03125"), dec("0.0625")), dec("0.046875"));
        assert_eq!(
            midpoint(dec("0.000000000000000001"), dec("0.000000000000000002")),
            dec("0.000000000000000002")
        );

        let huge = dec("70000000000000000000000000000");
        assert_eq!(midpoint(huge, huge), huge);
        assert_eq!(
            midpoint(dec("60000000000000000000000000000"), huge),
            dec("65000000000000000000000000000")
        );
    }
}
