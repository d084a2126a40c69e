//! Gas price curve driven by short and long moving averages of block gas.
//!
//! # Regions
//!
//! ```text
//! price
//!   ▲
//!   │                                             ┌──── max_gas_price
//!   │                                            ╱
//!   │ initial ●                                 ╱   escalation
//!   │          ╲  discount recovery            ╱
//!   │           ╲                             ╱
//!   │ discounted ╲___________________________╱
//!   └──────────────┬─────────────────────────┬──────┬──▶ short EMA
//!              long EMA            escalation start   max block gas
//! ```
//!
//! 1. `short ≥ max_block_gas`: flat ceiling at `max_gas_price`.
//! 2. `short > escalation_start`: quadratic ramp from the discounted price to
//!    the ceiling.
//! 3. `short ≥ long` (and the chain is not idle): flat, maximally
//!    discounted price.
//! 4. `long > 0`: quadratic recovery from the initial price down to the
//!    discounted price as the short average catches up with the long one.
//! 5. Otherwise both averages are zero: the chain is idle and the initial
//!    price applies.
//!
//! The guards are evaluated in that order, which keeps every division in the
//! curves away from a zero denominator.

use crate::{decimal::Dec, params::ModelParams};

/// Exponent of both quadratic curves. Lower values make the price react
/// faster near the start of each region.
pub const CURVE_EXPONENT: u32 = 2;

/// Integer exponential moving average update:
///
/// ```text
/// ema' = floor(((window - 1) × ema + value) / window)
/// ```
///
/// A window of one (or zero, which is treated as one) snaps to `value`.
pub fn calculate_ema(previous: u64, value: u64, window: u32) -> u64 {
    let window = u128::from(window.max(1));
    let sum = (window - 1) * u128::from(previous) + u128::from(value);
    // The average never exceeds max(previous, value).
    u64::try_from(sum / window).unwrap_or(u64::MAX)
}

/// Pricing function for a fixed parameter set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Model {
    params: ModelParams,
}

impl Model {
    pub fn new(params: ModelParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    /// `initial_gas_price × max_gas_price_multiplier`
    pub fn max_gas_price(&self) -> Dec {
        self.params.initial_gas_price * self.params.max_gas_price_multiplier
    }

    /// `initial_gas_price × (1 - max_discount)`
    pub fn gas_price_with_max_discount(&self) -> Dec {
        self.params.initial_gas_price * (Dec::one() - self.params.max_discount)
    }

    /// `floor(max_block_gas × escalation_start_fraction)`
    pub fn escalation_start_block_gas(&self) -> u64 {
        (Dec::from(self.params.max_block_gas) * self.params.escalation_start_fraction).floor_u64()
    }

    /// Minimum gas price for the next block given the current averages.
    pub fn calculate_next_gas_price(&self, short_ema: u64, long_ema: u64) -> Dec {
        let escalation_start = self.escalation_start_block_gas();

        if short_ema >= self.params.max_block_gas {
            self.max_gas_price()
        } else if short_ema > escalation_start {
            self.escalation_price(short_ema, escalation_start)
        } else if short_ema >= long_ema && short_ema > 0 {
            self.gas_price_with_max_discount()
        } else if long_ema > 0 {
            self.discount_recovery_price(short_ema, long_ema)
        } else {
            self.params.initial_gas_price
        }
    }

    // escalation_start < short_ema < max_block_gas
    fn escalation_price(&self, short_ema: u64, escalation_start: u64) -> Dec {
        let base = self.gas_price_with_max_discount();
        let height = self.max_gas_price() - base;
        let width = Dec::from(self.params.max_block_gas - escalation_start);
        let x = Dec::from(short_ema - escalation_start);
        curve_point(base, height, x / width)
    }

    // short_ema < long_ema, long_ema > 0
    fn discount_recovery_price(&self, short_ema: u64, long_ema: u64) -> Dec {
        let base = self.gas_price_with_max_discount();
        let height = self.params.initial_gas_price - base;
        let ratio = (Dec::from(short_ema) / Dec::from(long_ema) - Dec::one()).abs();
        curve_point(base, height, ratio)
    }

    /// Lowest and highest minimum gas price reachable within `after_blocks`
    /// blocks from the given state.
    ///
    /// Two trajectories are simulated: every future block completely full
    /// and every future block empty. `current_price` seeds both bounds.
    pub fn calculate_edge_gas_price_after_blocks(
        &self,
        short_ema: u64,
        long_ema: u64,
        current_price: Dec,
        after_blocks: u32,
    ) -> (Dec, Dec) {
        let mut low = current_price;
        let mut high = current_price;

        let mut full = (short_ema, long_ema);
        let mut empty = (short_ema, long_ema);
        for _ in 0..after_blocks {
            full = self.next_emas(full, self.params.max_block_gas);
            empty = self.next_emas(empty, 0);

            for (short, long) in [full, empty] {
                let price = self.calculate_next_gas_price(short, long);
                low = low.min(price);
                high = high.max(price);
            }
        }

        (low, high)
    }

    fn next_emas(&self, (short, long): (u64, u64), block_gas: u64) -> (u64, u64) {
        (
            calculate_ema(short, block_gas, self.params.short_ema_block_length),
            calculate_ema(long, block_gas, self.params.long_ema_block_length),
        )
    }
}

fn curve_point(base: Dec, height: Dec, ratio: Dec) -> Dec {
    base + height * ratio.power(CURVE_EXPONENT)
}
