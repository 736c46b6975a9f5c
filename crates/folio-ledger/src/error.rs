use folio_types::{DeadlineExceeded, TypeError};
use serde::{Deserialize, Serialize};

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid input: {reason}")]
    Invalid { reason: String },

    #[error("record not found")]
    NotFound,

    #[error("record does not belong to the caller")]
    Forbidden,

    #[error("conflict: {reason}")]
    Conflict { reason: String },

    #[error("system accounts cannot be modified")]
    SystemAccount,

    #[error("account type, currency, and system flag are immutable")]
    Immutable,

    #[error("an entry needs at least 2 lines")]
    TooFewLines,

    #[error("line {index}: amount must be > 0")]
    InvalidAmount { index: usize },

    #[error("line {index}: account currency does not match entry currency")]
    CurrencyMismatch { index: usize },

    #[error("sum of debits must equal sum of credits")]
    UnbalancedEntry,

    #[error("entry is already reversed")]
    AlreadyReversed,

    #[error("operation deadline exceeded")]
    DeadlineExceeded,

    #[error("store error: {0}")]
    Store(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl LedgerError {
    /// Stable machine-readable code for transport layers and batch item
    /// reports.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Invalid { .. } => "invalid",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Conflict { .. } => "conflict",
            Self::SystemAccount => "system_account",
            Self::Immutable => "immutable",
            Self::TooFewLines => "too_few_lines",
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::CurrencyMismatch { .. } => "currency_mismatch",
            Self::UnbalancedEntry => "unbalanced_entry",
            Self::AlreadyReversed => "already_reversed",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::Store(_) => "store_error",
            Self::Serialization(_) => "serialization_error",
        }
    }

    /// Shorthand for [`LedgerError::Invalid`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`LedgerError::Conflict`].
    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict {
            reason: reason.into(),
        }
    }
}

impl From<DeadlineExceeded> for LedgerError {
    fn from(_: DeadlineExceeded) -> Self {
        Self::DeadlineExceeded
    }
}

impl From<TypeError> for LedgerError {
    fn from(err: TypeError) -> Self {
        Self::Invalid {
            reason: err.to_string(),
        }
    }
}

/// Per-item failure in a batch operation.
///
/// Batch operations never fail halfway: either every item lands or the whole
/// request is rejected with one `ItemError` per offending index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub index: usize,
    pub code: String,
    pub message: String,
}

impl ItemError {
    /// Item rejected during validation. The code is always
    /// `validation_error`; the message carries the specific reason.
    pub fn validation(index: usize, err: &LedgerError) -> Self {
        Self {
            index,
            code: "validation_error".to_string(),
            message: err.to_string(),
        }
    }

    /// Item rejected because its account path collides with another item or
    /// an existing account.
    pub fn conflict(index: usize) -> Self {
        Self {
            index,
            code: "conflict".to_string(),
            message: "account path already exists for user".to_string(),
        }
    }

    /// Item rejected with the error's own stable code.
    pub fn from_error(index: usize, err: &LedgerError) -> Self {
        Self {
            index,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Convenience alias used throughout the ledger crate.
pub type Result<T> = std::result::Result<T, LedgerError>;
