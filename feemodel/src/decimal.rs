//! Fixed-point decimal arithmetic for gas prices.
//!
//! Every validator must derive bit-identical prices from the same state, so
//! floating point is never used. [`Dec`] carries exactly [`PRECISION`]
//! fractional digits: after each operation the result is re-quantised with
//! banker's rounding (round half to even).
//!
//! ```text
//! 0.0625 × 0.5 = 0.031250000000000000
//! 1 / 3        = 0.333333333333333333
//! ```

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{
    fmt,
    ops::{Add, Div, Mul, Sub},
    str::FromStr,
};
use thiserror::Error;

/// Number of fractional digits carried by [`Dec`].
pub const PRECISION: u32 = 18;

/// Largest integer part for which every one of the [`PRECISION`] fractional
/// digits is kept. The 96-bit mantissa holds 28 significant digits, so
/// values at or above `10^10` may be rounded.
pub const MAX_EXACT_INTEGER_DIGITS: u32 = 10;

/// Errors produced when parsing or combining decimals.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecimalError {
    #[error("Invalid decimal {0:?}")]
    Parse(String),

    #[error("Decimal {value:?} has {scale} fractional digits, at most {PRECISION} are allowed")]
    TooPrecise { value: String, scale: u32 },

    #[error("Decimal {0:?} cannot be represented with {PRECISION} exact fractional digits")]
    PrecisionLoss(String),

    #[error("Decimal overflow")]
    Overflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid denom {0:?}")]
    InvalidDenom(String),

    #[error("Negative coin amount {0}")]
    NegativeAmount(Dec),
}

/// Signed fixed-point decimal with 18 fractional digits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dec(Decimal);

fn quantize(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRECISION, RoundingStrategy::MidpointNearestEven)
}

impl Dec {
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn one() -> Self {
        Self(Decimal::ONE)
    }

    /// Build `num × 10^-scale`, e.g. `Dec::new(625, 4)` is `0.0625`.
    ///
    /// Panics if `scale` exceeds 28.
    pub fn new(num: i64, scale: u32) -> Self {
        Self(quantize(Decimal::new(num, scale)))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        !self.0.is_zero() && self.0.is_sign_positive()
    }

    pub fn is_negative(&self) -> bool {
        !self.0.is_zero() && self.0.is_sign_negative()
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(|v| Self(quantize(v)))
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(|v| Self(quantize(v)))
    }

    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        self.0.checked_mul(rhs.0).map(|v| Self(quantize(v)))
    }

    pub fn checked_quo(self, rhs: Self) -> Option<Self> {
        self.0.checked_div(rhs.0).map(|v| Self(quantize(v)))
    }

    /// Divide by an integer, rounding half to even.
    pub fn quo_u64(self, rhs: u64) -> Result<Self, DecimalError> {
        if rhs == 0 {
            return Err(DecimalError::DivisionByZero);
        }
        self.checked_quo(Dec::from(rhs)).ok_or(DecimalError::Overflow)
    }

    /// Raise to an integer power by repeated squaring. Every intermediate
    /// product is quantised, so the result is reproducible bit for bit.
    pub fn power(self, exponent: u32) -> Self {
        let mut result = Dec::one();
        let mut base = self;
        let mut remaining = exponent;
        while remaining > 0 {
            if remaining & 1 == 1 {
                result = result * base;
            }
            remaining >>= 1;
            if remaining > 0 {
                base = base * base;
            }
        }
        result
    }

    /// Integer part rounded towards negative infinity, clamped to `u64`.
    pub fn floor_u64(self) -> u64 {
        if self.0.is_sign_negative() {
            return 0;
        }
        self.0.floor().to_u64().unwrap_or(u64::MAX)
    }

    /// Exclusive upper bound of the range in which arithmetic keeps all
    /// fractional digits: `10^MAX_EXACT_INTEGER_DIGITS`.
    pub fn max_exact() -> Self {
        Self(Decimal::from(10u64.pow(MAX_EXACT_INTEGER_DIGITS)))
    }

    /// Whether `|self|` lies below [`Dec::max_exact`].
    pub fn is_exact(&self) -> bool {
        self.abs() < Self::max_exact()
    }

    /// Number of fractional digits actually in use (trailing zeros ignored).
    pub fn scale(&self) -> u32 {
        self.0.normalize().scale()
    }
}

impl From<u64> for Dec {
    fn from(value: u64) -> Self {
        Self(Decimal::from(value))
    }
}

impl From<u32> for Dec {
    fn from(value: u32) -> Self {
        Self(Decimal::from(value))
    }
}

impl FromStr for Dec {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value = Decimal::from_str(trimmed).map_err(|_| DecimalError::Parse(s.to_string()))?;
        let written = written_scale(trimmed);
        if written > PRECISION {
            return Err(DecimalError::TooPrecise {
                value: s.to_string(),
                scale: written,
            });
        }
        // The mantissa ran out of digits and the parser rounded.
        if value.normalize().scale() < written {
            return Err(DecimalError::PrecisionLoss(s.to_string()));
        }
        Ok(Self(quantize(value)))
    }
}

/// Fractional digits in a decimal literal, ignoring trailing zeros.
fn written_scale(s: &str) -> u32 {
    match s.split_once('.') {
        Some((_, fraction)) => {
            let digits = fraction.trim_end_matches(|c| c == '0' || c == '_');
            digits.chars().filter(char::is_ascii_digit).count() as u32
        }
        None => 0,
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = quantize(self.0);
        let scale = value.scale() as usize;
        let digits = value.mantissa().unsigned_abs().to_string();

        let (integer, fraction) = if digits.len() > scale {
            let (integer, fraction) = digits.split_at(digits.len() - scale);
            (integer.to_string(), fraction.to_string())
        } else {
            ("0".to_string(), format!("{digits:0>scale$}"))
        };
        let sign = if value.is_sign_negative() && !value.is_zero() {
            "-"
        } else {
            ""
        };

        f.pad(&format!(
            "{sign}{integer}.{fraction:0<width$}",
            width = PRECISION as usize
        ))
    }
}

impl Add for Dec {
    type Output = Dec;

    fn add(self, rhs: Self) -> Self::Output {
        Self(quantize(self.0 + rhs.0))
    }
}

impl Sub for Dec {
    type Output = Dec;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(quantize(self.0 - rhs.0))
    }
}

impl Mul for Dec {
    type Output = Dec;

    fn mul(self, rhs: Self) -> Self::Output {
        Self(quantize(self.0 * rhs.0))
    }
}

impl Div for Dec {
    type Output = Dec;

    fn div(self, rhs: Self) -> Self::Output {
        Self(quantize(self.0 / rhs.0))
    }
}

impl Serialize for Dec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Dec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DecVisitor;

        impl de::Visitor<'_> for DecVisitor {
            type Value = Dec;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal string with at most 18 fractional digits")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Dec, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(DecVisitor)
    }
}

/// A decimal amount of a single denomination, e.g. a gas price of
/// `0.0625ucore`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecCoin {
    pub denom: String,
    pub amount: Dec,
}

impl DecCoin {
    pub fn new(denom: impl Into<String>, amount: Dec) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// Check the denom format and that the amount is not negative.
    pub fn validate(&self) -> Result<(), DecimalError> {
        validate_denom(&self.denom)?;
        if self.amount.is_negative() {
            return Err(DecimalError::NegativeAmount(self.amount));
        }
        Ok(())
    }

    pub fn is_positive(&self) -> bool {
        self.amount.is_positive()
    }
}

impl fmt::Display for DecCoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Denoms are 3 to 128 characters, start with a letter and otherwise use
/// alphanumerics or one of `/:._-`.
pub fn validate_denom(denom: &str) -> Result<(), DecimalError> {
    let invalid = || DecimalError::InvalidDenom(denom.to_string());
    if !(3..=128).contains(&denom.len()) {
        return Err(invalid());
    }
    let mut chars = denom.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return Err(invalid());
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-')) {
        return Err(invalid());
    }
    Ok(())
}
