use crate::{decimal::DecimalError, params::ParamsError, store::StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid params: {0}")]
    InvalidParams(#[from] ParamsError),

    #[error("Invalid authority; expected {expected}, got {actual}")]
    InvalidSigner { expected: String, actual: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid genesis: {0}")]
    InvalidGenesis(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Codec(String),

    #[error("Decimal error: {0}")]
    Decimal(#[from] DecimalError),

    /// Genesis never stored a minimum gas price. The state machine was not
    /// initialised and the node must halt.
    #[error("Min gas price is not initialized")]
    MinGasPriceNotInitialized,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Unsupported store version {found}, latest known is {latest}")]
    UnsupportedStoreVersion { found: u64, latest: u64 },
}

impl Error {
    /// Whether the error means persisted state is missing or corrupt. The
    /// host must stop processing blocks rather than continue with defaults.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::MinGasPriceNotInitialized
                | Error::InvalidState(_)
                | Error::UnsupportedStoreVersion { .. }
                | Error::Store(StoreError::Corrupted { .. })
        )
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Codec(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Codec(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(Error::MinGasPriceNotInitialized.is_fatal());
        assert!(Error::InvalidState("missing params".into()).is_fatal());
        assert!(Error::Store(StoreError::corrupted(b"\x03", "bad length")).is_fatal());

        assert!(!Error::InvalidParams(ParamsError::ZeroMaxBlockGas).is_fatal());
        assert!(!Error::InvalidSigner {
            expected: "gov".into(),
            actual: "alice".into()
        }
        .is_fatal());
        assert!(!Error::Store(StoreError::Database("map full".into())).is_fatal());
    }

    #[test]
    fn test_messages_are_capitalised() {
        assert_eq!(
            Error::MinGasPriceNotInitialized.to_string(),
            "Min gas price is not initialized"
        );
        assert_eq!(
            Error::InvalidParams(ParamsError::ZeroShortEmaBlockLength).to_string(),
            "Invalid params: Short EMA block length must be at least 1"
        );
    }
}
