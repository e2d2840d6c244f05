//! Monetary amounts in the smallest currency unit.
//!
//! Prices arrive from the backend as JSON decimals. They are converted to
//! integer minor units exactly once, at the edge; every total afterwards is
//! integer arithmetic. Two-decimal formatting only happens for display.
//!
//! Arithmetic saturates at `u64::MAX` minor units instead of wrapping.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign};

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

const MINOR_PER_MAJOR: u64 = 100;

/// Non-negative amount of money, stored as minor units (e.g. paise, cents).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    pub const fn from_major(major: u64) -> Self {
        Self(major.saturating_mul(MINOR_PER_MAJOR))
    }

    pub const fn minor(self) -> u64 {
        self.0
    }

    /// Whole currency units (truncated).
    pub const fn major_part(self) -> u64 {
        self.0 / MINOR_PER_MAJOR
    }

    /// Fractional part in minor units (0..=99).
    pub const fn minor_part(self) -> u64 {
        self.0 % MINOR_PER_MAJOR
    }

    /// Price of `quantity` units at this unit price.
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(u64::from(quantity)))
    }

    /// Parse a decimal string such as `"10"`, `"10.5"` or `"10.50"`.
    ///
    /// At most two fractional digits are accepted; anything finer would need
    /// rounding and is rejected instead.
    pub fn parse_decimal(raw: &str) -> DomainResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(DomainError::validation("amount cannot be empty"));
        }
        if raw.starts_with('-') {
            return Err(DomainError::validation("amount cannot be negative"));
        }

        let (whole, frac) = match raw.split_once('.') {
            Some((w, f)) => (w, f),
            None => (raw, ""),
        };
        if frac.len() > 2 {
            return Err(DomainError::validation(format!(
                "amount has more than two decimal places: {raw}"
            )));
        }
        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if !all_digits(whole) || !all_digits(frac) || (whole.is_empty() && frac.is_empty()) {
            return Err(DomainError::validation(format!("not a decimal amount: {raw}")));
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| DomainError::validation(format!("amount out of range: {raw}")))?
        };
        let frac: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().unwrap_or(0) * 10,
            _ => frac.parse::<u64>().unwrap_or(0),
        };

        whole
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|m| m.checked_add(frac))
            .map(Self)
            .ok_or_else(|| DomainError::validation(format!("amount out of range: {raw}")))
    }

    /// Convert a JSON-style float, rounding half away from zero to the
    /// nearest minor unit.
    pub fn from_f64(value: f64) -> DomainResult<Self> {
        if !value.is_finite() {
            return Err(DomainError::validation("amount must be finite"));
        }
        if value < 0.0 {
            return Err(DomainError::validation("amount cannot be negative"));
        }
        let minor = (value * MINOR_PER_MAJOR as f64).round();
        if minor > u64::MAX as f64 {
            return Err(DomainError::validation("amount out of range"));
        }
        Ok(Self(minor as u64))
    }

    /// Amount as a float in major units, for wire formats that expect numbers.
    pub fn to_f64(self) -> f64 {
        self.major_part() as f64 + self.minor_part() as f64 / MINOR_PER_MAJOR as f64
    }
}

impl ValueObject for Money {}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.major_part(), self.minor_part())
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_add(rhs.0);
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

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.minor_part() == 0 {
            serializer.serialize_u64(self.major_part())
        } else {
            serializer.serialize_f64(self.to_f64())
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative decimal amount")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        v.checked_mul(MINOR_PER_MAJOR)
            .map(Money)
            .ok_or_else(|| E::custom("amount out of range"))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        let v = u64::try_from(v).map_err(|_| E::custom("amount cannot be negative"))?;
        self.visit_u64(v)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Money::from_f64(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        Money::parse_decimal(v).map_err(E::custom)
    }
}
