//! Fixed-precision monetary amounts.
//!
//! [`Money`] wraps a [`Decimal`] held at exactly [`MONEY_SCALE`] decimal
//! places (the currency's minor unit). Construction rejects values that would
//! need more precision; nothing is ever silently truncated. Addition,
//! subtraction and multiplication by a share count are exact. The only
//! rounding in the engine happens in [`Money::prorate`], once, half-even.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::MONEY_SCALE;
use crate::errors::{Error, Result, ValidationError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Creates an amount, failing when `amount` carries more significant
    /// decimal places than the minor unit allows.
    pub fn new(amount: Decimal) -> Result<Self> {
        if amount.normalize().scale() > MONEY_SCALE {
            return Err(ValidationError::InvalidAmount(format!(
                "{} has more than {} decimal places",
                amount, MONEY_SCALE
            ))
            .into());
        }
        Self::checked_at_scale(amount).ok_or_else(|| overflow(amount.to_string()))
    }

    /// Whole currency units, e.g. `from_major(5000)` is 5000.00.
    pub fn from_major(units: i64) -> Self {
        Self::at_scale(Decimal::from(units))
    }

    /// Minor currency units, e.g. `from_minor(4550)` is 45.50.
    pub fn from_minor(units: i64) -> Self {
        Self::from_minor_i128(i128::from(units))
    }

    fn from_minor_i128(units: i128) -> Self {
        Money(Decimal::from_i128_with_scale(units, MONEY_SCALE))
    }

    /// Rounds `amount` half-even to the minor unit. Fails only when the
    /// amount is too large to carry two decimal places.
    pub fn rounded(amount: Decimal) -> Result<Self> {
        let rounded =
            amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven);
        Self::checked_at_scale(rounded).ok_or_else(|| overflow(amount.to_string()))
    }

    /// `amount` at the minor-unit scale, or `None` when it is too large to
    /// carry two decimal places.
    fn checked_at_scale(amount: Decimal) -> Option<Self> {
        let money = Self::at_scale(amount);
        (money.0.scale() == MONEY_SCALE).then_some(money)
    }

    fn at_scale(amount: Decimal) -> Self {
        let mut amount = amount;
        amount.rescale(MONEY_SCALE);
        Money(amount)
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// The amount expressed in minor units.
    pub fn minor_units(&self) -> i128 {
        self.0.mantissa()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// `self × quantity`, exact. Fails when the product leaves the
    /// representable range.
    pub fn times(&self, quantity: u64) -> Result<Money> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .and_then(Self::checked_at_scale)
            .ok_or_else(|| overflow(format!("{} × {}", self, quantity)))
    }

    /// `self + rhs`, failing instead of overflowing.
    pub fn try_add(self, rhs: Money) -> Result<Money> {
        self.0
            .checked_add(rhs.0)
            .and_then(Self::checked_at_scale)
            .ok_or_else(|| overflow(format!("{} + {}", self, rhs)))
    }

    /// `self - rhs`, failing instead of overflowing.
    pub fn try_sub(self, rhs: Money) -> Result<Money> {
        self.0
            .checked_sub(rhs.0)
            .and_then(Self::checked_at_scale)
            .ok_or_else(|| overflow(format!("{} - {}", self, rhs)))
    }

    /// Sum of `amounts`, failing instead of overflowing.
    pub fn try_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Result<Money> {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |total, amount| total.try_add(amount))
    }

    /// `self × numerator / denominator`, rounded half-even to the minor unit.
    ///
    /// The product and quotient are carried out on integer minor units, so the
    /// intermediate value is the exact rational and rounding is applied once.
    /// A zero denominator yields zero. Fails only when the result does not
    /// fit, which cannot happen while `numerator <= denominator`.
    pub fn prorate(&self, numerator: u64, denominator: u64) -> Result<Money> {
        if denominator == 0 {
            debug_assert!(false, "prorate with zero denominator");
            return Ok(Money::ZERO);
        }
        let too_large = || overflow(format!("{} × {} / {}", self, numerator, denominator));
        let magnitude = self.minor_units().unsigned_abs();
        let numerator = u128::from(numerator);
        let divisor = u128::from(denominator);

        // m × n / d = (m / d) × n + (m % d) × n / d; (m % d) × n < 2^128.
        let whole = (magnitude / divisor)
            .checked_mul(numerator)
            .ok_or_else(too_large)?;
        let partial = (magnitude % divisor) * numerator;
        let mut quotient = whole
            .checked_add(partial / divisor)
            .ok_or_else(too_large)?;
        let twice = (partial % divisor) * 2;
        if twice > divisor || (twice == divisor && quotient % 2 != 0) {
            quotient = quotient.checked_add(1).ok_or_else(too_large)?;
        }

        let mut units = i128::try_from(quotient).map_err(|_| too_large())?;
        if self.is_negative() {
            units = -units;
        }
        Decimal::try_from_i128_with_scale(units, MONEY_SCALE)
            .map(Money)
            .map_err(|_| too_large())
    }
}

fn overflow(operation: String) -> Error {
    ValidationError::InvalidAmount(format!("{} is out of range", operation)).into()
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let amount = Decimal::from_str(s.trim())?;
        Money::new(amount)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = Error;

    fn try_from(amount: Decimal) -> Result<Self> {
        Money::new(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Self::at_scale(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Self::at_scale(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

// Amounts travel as decimal strings ("45.00") so no binary float ever
// touches them on the way through JSON.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MoneyRepr {
    Text(String),
    Integer(i64),
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match MoneyRepr::deserialize(deserializer)? {
            MoneyRepr::Text(text) => Money::from_str(&text).map_err(serde::de::Error::custom),
            MoneyRepr::Integer(units) => Ok(Money::from_major(units)),
        }
    }
}
