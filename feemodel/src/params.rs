//! Governance-controlled parameters describing the shape of the gas price
//! curve.

use crate::decimal::Dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a parameter set is rejected. Invalid parameters are never
/// clamped into range.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("Initial gas price must be positive, got {0}")]
    InitialGasPriceNotPositive(Dec),

    #[error("Max gas price multiplier must be greater than one, got {0}")]
    MaxGasPriceMultiplierTooLow(Dec),

    #[error("Max discount must be between 0 and 1 exclusive, got {0}")]
    MaxDiscountOutOfRange(Dec),

    #[error("Escalation start fraction must be between 0 and 1 exclusive, got {0}")]
    EscalationStartFractionOutOfRange(Dec),

    #[error("Max block gas must be at least 1")]
    ZeroMaxBlockGas,

    #[error("Short EMA block length must be at least 1")]
    ZeroShortEmaBlockLength,

    #[error("Long EMA block length ({long}) must be greater than short EMA block length ({short})")]
    LongEmaNotLongerThanShort { short: u32, long: u32 },

    #[error("Max gas price {initial_gas_price} x {multiplier} is not representable")]
    MaxGasPriceOverflow { initial_gas_price: Dec, multiplier: Dec },

    #[error("Max gas price {max_gas_price} must be below {limit}")]
    MaxGasPriceTooHigh { max_gas_price: Dec, limit: Dec },
}

/// Shape of the pricing curve.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Price charged when the chain is idle (both averages are zero).
    pub initial_gas_price: Dec,

    /// `max_gas_price = initial_gas_price × max_gas_price_multiplier`.
    pub max_gas_price_multiplier: Dec,

    /// Largest fraction of the initial price that can be discounted.
    pub max_discount: Dec,

    /// Fraction of `max_block_gas` above which the price escalates.
    pub escalation_start_fraction: Dec,

    /// Gas limit of a block, mirrored from consensus parameters.
    pub max_block_gas: u64,

    /// Window of the short-term moving average, in blocks.
    pub short_ema_block_length: u32,

    /// Window of the long-term moving average, in blocks.
    pub long_ema_block_length: u32,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            initial_gas_price: Dec::new(625, 4),         // 0.0625
            max_gas_price_multiplier: Dec::from(1000u64), // up to 62.5
            max_discount: Dec::new(5, 1),                // down to 0.03125
            escalation_start_fraction: Dec::new(8, 1),   // escalate above 80% full
            max_block_gas: 50_000_000,
            short_ema_block_length: 50,
            long_ema_block_length: 1000,
        }
    }
}

impl ModelParams {
    pub fn validate_basic(&self) -> Result<(), ParamsError> {
        if !self.initial_gas_price.is_positive() {
            return Err(ParamsError::InitialGasPriceNotPositive(self.initial_gas_price));
        }

        if self.max_gas_price_multiplier <= Dec::one() {
            return Err(ParamsError::MaxGasPriceMultiplierTooLow(
                self.max_gas_price_multiplier,
            ));
        }

        if !is_open_unit_interval(self.max_discount) {
            return Err(ParamsError::MaxDiscountOutOfRange(self.max_discount));
        }

        if !is_open_unit_interval(self.escalation_start_fraction) {
            return Err(ParamsError::EscalationStartFractionOutOfRange(
                self.escalation_start_fraction,
            ));
        }

        if self.max_block_gas < 1 {
            return Err(ParamsError::ZeroMaxBlockGas);
        }

        if self.short_ema_block_length == 0 {
            return Err(ParamsError::ZeroShortEmaBlockLength);
        }

        if self.long_ema_block_length <= self.short_ema_block_length {
            return Err(ParamsError::LongEmaNotLongerThanShort {
                short: self.short_ema_block_length,
                long: self.long_ema_block_length,
            });
        }

        let max_gas_price = self
            .initial_gas_price
            .checked_mul(self.max_gas_price_multiplier)
            .ok_or(ParamsError::MaxGasPriceOverflow {
                initial_gas_price: self.initial_gas_price,
                multiplier: self.max_gas_price_multiplier,
            })?;

        // Every price the curve produces lies at or below the max price, so
        // bounding it keeps all stored prices at full precision.
        if !max_gas_price.is_exact() {
            return Err(ParamsError::MaxGasPriceTooHigh {
                max_gas_price,
                limit: Dec::max_exact(),
            });
        }

        Ok(())
    }
}

fn is_open_unit_interval(value: Dec) -> bool {
    value.is_positive() && value < Dec::one()
}

/// Parameter set owned by the module.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    pub model: ModelParams,
}

impl Params {
    pub fn new(model: ModelParams) -> Self {
        Self { model }
    }

    pub fn validate_basic(&self) -> Result<(), ParamsError> {
        self.model.validate_basic()
    }
}
