//! LMDB-backed [`KvStore`] for the fee model keeper.
//!
//! All keys live in one named database inside a single-file environment.
//! Each [`WriteBatch`] is applied in one read-write transaction, so a batch
//! either commits completely or leaves the database untouched.

use coreum_feemodel::{BatchOp, KvStore, StoreError, WriteBatch};
use lmdb::{Database, DatabaseFlags, Environment, EnvironmentFlags, Transaction, WriteFlags};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info};

/// File name of the environment inside the store directory.
pub const DATA_FILE: &str = "feemodel.mdb";

const DB_NAME: &str = "feemodel";

#[derive(Debug, Error)]
pub enum OpenError {
    #[error("Failed to create store directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("LMDB error: {0}")]
    Lmdb(#[from] lmdb::Error),
}

#[derive(Clone, Debug)]
pub struct LmdbStoreSettings {
    /// Upper bound on the size of the memory map, in bytes.
    pub map_size: usize,
}

impl Default for LmdbStoreSettings {
    fn default() -> Self {
        Self {
            map_size: 64 * 1024 * 1024, // 64MB
        }
    }
}

pub struct LmdbStore {
    env: Environment,
    db: Database,
    path: PathBuf,
}

impl LmdbStore {
    /// Open or create a store in `dir` with default settings.
    pub fn open(dir: &Path) -> Result<Self, OpenError> {
        Self::open_with_settings(dir, &LmdbStoreSettings::default())
    }

    pub fn open_with_settings(dir: &Path, settings: &LmdbStoreSettings) -> Result<Self, OpenError> {
        fs::create_dir_all(dir).map_err(|source| OpenError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(DATA_FILE);
        let env = Environment::new()
            .set_flags(EnvironmentFlags::NO_SUB_DIR)
            .set_max_dbs(1)
            .set_map_size(settings.map_size)
            .open(path.as_ref())?;
        let db = env.create_db(Some(DB_NAME), DatabaseFlags::empty())?;

        info!(path = %path.display(), "Opened fee model store");
        Ok(Self { env, db, path })
    }

    /// Path of the environment file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush the environment to disk.
    pub fn sync(&self) -> Result<(), StoreError> {
        self.env.sync(true).map_err(db_error)
    }
}

fn db_error(err: lmdb::Error) -> StoreError {
    StoreError::Database(err.to_string())
}

impl KvStore for LmdbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let txn = self.env.begin_ro_txn().map_err(db_error)?;
        let value = match txn.get(self.db, &key) {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(lmdb::Error::NotFound) => None,
            Err(e) => return Err(db_error(e)),
        };
        Ok(value)
    }

    fn write(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        let ops = batch.len();
        let mut txn = self.env.begin_rw_txn().map_err(db_error)?;

        // Returning early drops the transaction, which aborts it.
        for op in batch.into_ops() {
            match op {
                BatchOp::Put { key, value } => {
                    txn.put(self.db, &key, &value, WriteFlags::empty())
                        .map_err(db_error)?;
                }
                BatchOp::Delete { key } => match txn.del(self.db, &key, None) {
                    Ok(()) | Err(lmdb::Error::NotFound) => {}
                    Err(e) => return Err(db_error(e)),
                },
            }
        }

        txn.commit().map_err(db_error)?;
        debug!(ops, "Committed write batch");
        Ok(())
    }
}
