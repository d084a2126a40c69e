//! Coreum dynamic gas price model.
//!
//! The minimum gas price follows block space demand. Two exponential moving
//! averages of the gas used per block drive it:
//!
//! 1. **Short EMA** reacts within tens of blocks and detects spikes.
//! 2. **Long EMA** tracks the sustained baseline.
//!
//! ## Price Regions
//!
//! | Condition                          | Price                                   |
//! |------------------------------------|-----------------------------------------|
//! | short ≥ max block gas              | `max_gas_price` (ceiling)               |
//! | short > escalation start           | quadratic ramp towards the ceiling      |
//! | long ≤ short ≤ escalation start    | `gas_price_with_max_discount` (flat)    |
//! | short < long                       | quadratic recovery towards initial      |
//! | idle chain                         | `initial_gas_price`                     |
//!
//! ## Block Lifecycle
//!
//! - [`Keeper::begin_block`] clears the transient gas counter.
//! - The transaction layer reports consumed gas with [`Keeper::track_gas`].
//! - [`Keeper::end_block`] folds the block's gas into both averages and
//!   publishes the price for the next block in one atomic write.
//!
//! All arithmetic uses [`Dec`], an 18-digit fixed-point decimal, so every
//! node derives the same price bit for bit.

pub mod config;
pub mod decimal;
pub mod error;
pub mod genesis;
pub mod keeper;
pub mod migrations;
pub mod model;
pub mod msg;
pub mod params;
pub mod query;
pub mod simulation;
pub mod store;

pub use config::{FeeModelConfig, LoadSegment, ModuleConfig, SimulationConfig};
pub use decimal::{Dec, DecCoin, DecimalError, PRECISION};
pub use error::{Error, Result};
pub use genesis::GenesisState;
pub use keeper::{BlockOutcome, Keeper, KeeperConfig, MODULE_NAME, STORE_PREFIX};
pub use migrations::{migrate, store_version, CONSENSUS_VERSION};
pub use model::{calculate_ema, Model, CURVE_EXPONENT};
pub use msg::{MsgServer, MsgUpdateParams, MsgUpdateParamsResponse};
pub use params::{ModelParams, Params, ParamsError};
pub use query::{
    Querier, QueryMinGasPriceResponse, QueryParamsResponse, QueryRecommendedGasPriceRequest,
    QueryRecommendedGasPriceResponse,
};
pub use simulation::{block_gas_schedule, BlockSummary, Simulator};
pub use store::{BatchOp, KvStore, MemStore, PrefixedStore, StoreError, WriteBatch};
