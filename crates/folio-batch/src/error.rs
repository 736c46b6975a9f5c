use folio_ledger::LedgerError;

/// Errors produced by batch coordination and idempotency bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    #[error("idempotency key is required")]
    IdempotencyRequired,

    #[error("batch of {count} items exceeds the limit of {limit}")]
    TooManyItems { count: usize, limit: usize },

    #[error("request does not match the original body for this idempotency key")]
    IdempotencyMismatch,

    #[error("another request with this idempotency key is in flight")]
    InFlight,

    #[error("idempotency store error: {0}")]
    Store(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl BatchError {
    /// Stable machine-readable code for transport layers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::IdempotencyRequired => "idempotency_required",
            Self::TooManyItems { .. } => "too_many_items",
            Self::IdempotencyMismatch => "idempotency_mismatch",
            Self::InFlight => "conflict",
            Self::Store(_) => "store_error",
            Self::Serialization(_) => "serialization_error",
            Self::Ledger(inner) => inner.code(),
        }
    }
}

/// Convenience alias used throughout the batch crate.
pub type Result<T> = std::result::Result<T, BatchError>;
