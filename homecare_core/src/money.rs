//! Monetary amounts in integer minor units.
//!
//! Prices are held in halalas (1/100 riyal) so sums never drift. In JSON a
//! `Money` is a plain number in riyals (`50`, `12.5`), matching the layout the
//! bookings have always been stored in.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// A monetary value in halalas
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(halalas: i64) -> Self {
        Money(halalas)
    }

    pub const fn from_major(riyals: i64) -> Self {
        Money(riyals * 100)
    }

    pub const fn minor(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
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

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        if abs % 100 == 0 {
            write!(f, "{}{}", sign, abs / 100)
        } else {
            write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
        }
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_i64(self.0 / 100)
        } else {
            serializer.serialize_f64(self.0 as f64 / 100.0)
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let riyals = f64::deserialize(deserializer)?;
        if !riyals.is_finite() {
            return Err(de::Error::custom("price must be a finite number"));
        }
        Ok(Money((riyals * 100.0).round() as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_amounts_serialize_as_integers() {
        assert_eq!(serde_json::to_string(&Money::from_major(50)).unwrap(), "50");
        assert_eq!(serde_json::to_string(&Money::from_minor(1250)).unwrap(), "12.5");
    }

    #[test]
    fn test_deserialize_rounds_to_halalas() {
        let money: Money = serde_json::from_str("19.99").unwrap();
        assert_eq!(money.minor(), 1999);
        let money: Money = serde_json::from_str("40").unwrap();
        assert_eq!(money, Money::from_major(40));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_major(80).to_string(), "80");
        assert_eq!(Money::from_minor(1205).to_string(), "12.05");
        assert_eq!(Money::from_minor(-50).to_string(), "-0.50");
    }

    #[test]
    fn test_oversized_amounts_saturate() {
        let huge: Money = serde_json::from_str("1e18").unwrap();
        assert_eq!(huge.minor(), i64::MAX);

        let mut total = huge;
        total += Money::from_major(50);
        assert_eq!(total.minor(), i64::MAX);
        assert_eq!(huge + huge, Money::from_minor(i64::MAX));

        let sum: Money = [huge, huge, Money::from_major(1)].into_iter().sum();
        assert_eq!(sum.minor(), i64::MAX);
    }

    #[test]
    fn test_sum() {
        let total: Money = [50, 30, 40].into_iter().map(Money::from_major).sum();
        assert_eq!(total, Money::from_major(120));
    }
}
