//! Genesis section of the fee model.

use crate::{
    decimal::{Dec, DecCoin},
    error::{Error, Result},
    keeper::{encode, Keeper, LONG_EMA_GAS_KEY, MIN_GAS_PRICE_KEY, PARAMS_KEY, SHORT_EMA_GAS_KEY, STORE_VERSION_KEY},
    migrations::CONSENSUS_VERSION,
    params::Params,
    store::{KvStore, WriteBatch},
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub params: Params,
    pub min_gas_price: DecCoin,
}

impl GenesisState {
    /// Default parameters with the initial price published in `denom`.
    pub fn new_default(denom: impl Into<String>) -> Self {
        let params = Params::default();
        let min_gas_price = DecCoin::new(denom, params.model.initial_gas_price);
        Self {
            params,
            min_gas_price,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.params.validate_basic()?;
        self.min_gas_price
            .validate()
            .map_err(|e| Error::InvalidGenesis(format!("min gas price: {e}")))?;
        if !self.min_gas_price.is_positive() {
            return Err(Error::InvalidGenesis(format!(
                "Min gas price must be positive, got {}",
                self.min_gas_price
            )));
        }
        if !self.min_gas_price.amount.is_exact() {
            return Err(Error::InvalidGenesis(format!(
                "Min gas price {} must be below {}",
                self.min_gas_price,
                Dec::max_exact()
            )));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidGenesis(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl<S: KvStore> Keeper<S> {
    /// Seed the store from `genesis`. Both averages start at zero.
    pub fn init_genesis(&mut self, genesis: &GenesisState) -> Result<()> {
        genesis.validate()?;

        let mut batch = WriteBatch::new();
        batch
            .put(PARAMS_KEY, encode(&genesis.params)?)
            .put(MIN_GAS_PRICE_KEY, encode(&genesis.min_gas_price)?)
            .put(SHORT_EMA_GAS_KEY, 0u64.to_le_bytes())
            .put(LONG_EMA_GAS_KEY, 0u64.to_le_bytes())
            .put(STORE_VERSION_KEY, CONSENSUS_VERSION.to_le_bytes());
        self.store_mut().write(batch)?;

        info!(min_gas_price = %genesis.min_gas_price, "Initialized fee model from genesis");
        Ok(())
    }

    pub fn export_genesis(&self) -> Result<GenesisState> {
        Ok(GenesisState {
            params: self.params()?,
            min_gas_price: self.min_gas_price()?,
        })
    }
}
