//! Fixed-point money in integer minor units.
//!
//! All prices in the shop are Brazilian reais. Amounts are held as whole
//! centavos so cart totals never accumulate binary floating-point drift;
//! conversion to and from [`Decimal`] happens only at the storage and wire
//! boundaries, rounding half away from zero to two places.
//!
//! On the wire a `Money` is a JSON number (`230.0`, `199.9`) to stay
//! compatible with existing clients, and deserialization accepts either a
//! number or a decimal string.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when building a [`Money`] value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is below zero.
    #[error("amount cannot be negative")]
    Negative,
    /// The amount does not fit in the minor-unit representation.
    #[error("amount is out of range")]
    OutOfRange,
}

/// A non-negative amount of money in centavos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// Zero reais.
    pub const ZERO: Self = Self(0);

    /// Create from a count of centavos.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] for negative input.
    pub const fn from_minor(centavos: i64) -> Result<Self, MoneyError> {
        if centavos < 0 {
            return Err(MoneyError::Negative);
        }
        Ok(Self(centavos))
    }

    /// Create from whole reais.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError`] for negative or overflowing input.
    pub const fn from_major(reais: i64) -> Result<Self, MoneyError> {
        match reais.checked_mul(100) {
            Some(centavos) => Self::from_minor(centavos),
            None => Err(MoneyError::OutOfRange),
        }
    }

    /// Create from a decimal amount of reais, rounding to centavos.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError`] for negative or out-of-range input.
    pub fn from_decimal(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let centavos = rounded
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(MoneyError::OutOfRange)?;
        i64::try_from(centavos).map_or(Err(MoneyError::OutOfRange), Self::from_minor)
    }

    /// Amount in centavos.
    #[must_use]
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// Amount in reais with exactly two decimal places.
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(self.0), 2)
    }

    /// Line amount for `quantity` units, saturating on overflow.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Format for display the way the shop shows prices (`R$ 230.00`).
    #[must_use]
    pub fn display_brl(self) -> String {
        format!("R$ {self}")
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::from_decimal(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.to_decimal()
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.to_decimal(), serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::from_decimal(amount).map_err(serde::de::Error::custom)
    }
}
