//! Informational spending categories on journal entries.
//!
//! Categories never affect balancing or validation; they exist for
//! reporting. The built-in vocabulary covers the common personal-finance
//! buckets, and anything else round-trips through [`Category::Custom`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Entry category tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Uncategorized,
    General,
    EatingOut,
    Groceries,
    Transport,
    Shopping,
    Entertainment,
    Bills,
    Travel,
    Expenses,
    Income,
    Transfers,
    Savings,
    Charity,
    Family,
    Gifts,
    PersonalCare,
    Business,
    /// Free-form tag outside the built-in vocabulary.
    Custom(String),
}

impl Category {
    /// Parse a wire tag. Unknown tags become [`Category::Custom`], so
    /// parsing is total.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "uncategorized" => Self::Uncategorized,
            "general" => Self::General,
            "eating_out" => Self::EatingOut,
            "groceries" => Self::Groceries,
            "transport" => Self::Transport,
            "shopping" => Self::Shopping,
            "entertainment" => Self::Entertainment,
            "bills" => Self::Bills,
            "travel" => Self::Travel,
            "expenses" => Self::Expenses,
            "income" => Self::Income,
            "transfers" => Self::Transfers,
            "savings" => Self::Savings,
            "charity" => Self::Charity,
            "family" => Self::Family,
            "gifts" => Self::Gifts,
            "personal_care" => Self::PersonalCare,
            "business" => Self::Business,
            other => Self::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Uncategorized => "uncategorized",
            Self::General => "general",
            Self::EatingOut => "eating_out",
            Self::Groceries => "groceries",
            Self::Transport => "transport",
            Self::Shopping => "shopping",
            Self::Entertainment => "entertainment",
            Self::Bills => "bills",
            Self::Travel => "travel",
            Self::Expenses => "expenses",
            Self::Income => "income",
            Self::Transfers => "transfers",
            Self::Savings => "savings",
            Self::Charity => "charity",
            Self::Family => "family",
            Self::Gifts => "gifts",
            Self::PersonalCare => "personal_care",
            Self::Business => "business",
            Self::Custom(tag) => tag,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::Uncategorized
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Category {
    /// Encodes as the plain tag string.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::parse(&tag))
    }
}
