//! Money, currencies, and posting sides.
//!
//! Amounts are integer minor units (cents, pence) in a single currency.
//! There is no decimal arithmetic anywhere in the engine; rendering with a
//! decimal point is a presentation concern.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Currency code, trimmed and uppercased on construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    /// Normalize a raw code: trim whitespace, uppercase ASCII.
    pub fn new(code: &str) -> Result<Self, TypeError> {
        let normalized = code.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(TypeError::EmptyCurrency);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Currency::new(&raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An amount in a single currency, in minor units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub currency: Currency,
    pub minor_units: i64,
}

impl Money {
    pub fn new(currency: Currency, minor_units: i64) -> Self {
        Self {
            currency,
            minor_units,
        }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(currency, 0)
    }

    pub fn is_positive(&self) -> bool {
        self.minor_units > 0
    }

    pub fn is_zero(&self) -> bool {
        self.minor_units == 0
    }

    /// Sum of two amounts. `None` on currency mismatch or i64 overflow.
    pub fn checked_add(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        let minor_units = self.minor_units.checked_add(other.minor_units)?;
        Some(Money::new(self.currency.clone(), minor_units))
    }

    /// Difference of two amounts. `None` on currency mismatch or i64 overflow.
    pub fn checked_sub(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        let minor_units = self.minor_units.checked_sub(other.minor_units)?;
        Some(Money::new(self.currency.clone(), minor_units))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.minor_units, self.currency)
    }
}

/// Which side of the books a journal line posts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Debit,
    Credit,
}

impl Side {
    /// The opposite side.
    pub fn flip(&self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }

    /// Sign applied when folding a net balance: debits add, credits subtract.
    pub fn sign(&self) -> i64 {
        match self {
            Self::Debit => 1,
            Self::Credit => -1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

impl FromStr for Side {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            other => Err(TypeError::UnknownSide(other.to_string())),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd() -> Currency {
        Currency::new("USD").unwrap()
    }

    #[test]
    fn currency_normalizes() {
        assert_eq!(Currency::new(" usd ").unwrap().as_str(), "USD");
        assert_eq!(Currency::new("gbp").unwrap(), Currency::new("GBP").unwrap());
    }

    #[test]
    fn currency_rejects_empty() {
        assert_eq!(Currency::new("   "), Err(TypeError::EmptyCurrency));
    }

    #[test]
    fn currency_deserialize_normalizes() {
        let c: Currency = serde_json::from_str("\"eur\"").unwrap();
        assert_eq!(c.as_str(), "EUR");
        assert!(serde_json::from_str::<Currency>("\"\"").is_err());
    }

    #[test]
    fn money_checked_ops() {
        let a = Money::new(usd(), 1500);
        let b = Money::new(usd(), 250);
        assert_eq!(a.checked_add(&b).unwrap().minor_units, 1750);
        assert_eq!(a.checked_sub(&b).unwrap().minor_units, 1250);
    }

    #[test]
    fn money_rejects_currency_mix() {
        let a = Money::new(usd(), 100);
        let b = Money::new(Currency::new("EUR").unwrap(), 100);
        assert_eq!(a.checked_add(&b), None);
    }

    #[test]
    fn money_overflow_is_none() {
        let a = Money::new(usd(), i64::MAX);
        let b = Money::new(usd(), 1);
        assert_eq!(a.checked_add(&b), None);
    }

    #[test]
    fn side_flip_and_sign() {
        assert_eq!(Side::Debit.flip(), Side::Credit);
        assert_eq!(Side::Credit.flip(), Side::Debit);
        assert_eq!(Side::Debit.sign(), 1);
        assert_eq!(Side::Credit.sign(), -1);
    }

    #[test]
    fn side_parses_exact_lowercase() {
        assert_eq!("debit".parse::<Side>().unwrap(), Side::Debit);
        assert_eq!("credit".parse::<Side>().unwrap(), Side::Credit);
        assert!("Debit".parse::<Side>().is_err());
    }

    #[test]
    fn side_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Side::Debit).unwrap(), "\"debit\"");
        let s: Side = serde_json::from_str("\"credit\"").unwrap();
        assert_eq!(s, Side::Credit);
    }

    #[test]
    fn money_display() {
        assert_eq!(Money::new(usd(), 1500).to_string(), "1500 USD");
    }
}
