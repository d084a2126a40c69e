//! Read-only endpoints.

use crate::{
    decimal::DecCoin,
    error::Result,
    keeper::{midpoint, Keeper},
    params::Params,
    store::KvStore,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParamsResponse {
    pub params: Params,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMinGasPriceResponse {
    pub min_gas_price: DecCoin,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRecommendedGasPriceRequest {
    /// How many blocks ahead the transaction is expected to be included.
    /// At most `short_ema_block_length`.
    pub after_blocks: u32,
}

/// Price range a transaction should expect if it lands within
/// `after_blocks` blocks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRecommendedGasPriceResponse {
    pub low: DecCoin,
    pub med: DecCoin,
    pub high: DecCoin,
}

pub struct Querier<'a, S> {
    keeper: &'a Keeper<S>,
}

impl<'a, S: KvStore> Querier<'a, S> {
    pub fn new(keeper: &'a Keeper<S>) -> Self {
        Self { keeper }
    }

    pub fn params(&self) -> Result<QueryParamsResponse> {
        Ok(QueryParamsResponse {
            params: self.keeper.params()?,
        })
    }

    pub fn min_gas_price(&self) -> Result<QueryMinGasPriceResponse> {
        Ok(QueryMinGasPriceResponse {
            min_gas_price: self.keeper.min_gas_price()?,
        })
    }

    pub fn recommended_gas_price(
        &self,
        request: QueryRecommendedGasPriceRequest,
    ) -> Result<QueryRecommendedGasPriceResponse> {
        let (low, high) = self
            .keeper
            .calculate_edge_gas_price_after_blocks(request.after_blocks)?;
        let med = DecCoin::new(low.denom.clone(), midpoint(low.amount, high.amount));
        Ok(QueryRecommendedGasPriceResponse { low, med, high })
    }
}
