use thiserror::Error;

/// Errors produced by foundation type construction and validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("currency code must not be empty")]
    EmptyCurrency,

    #[error("metadata has {count} pairs, limit is {limit}")]
    MetadataTooManyPairs { count: usize, limit: usize },

    #[error("metadata key must not be empty")]
    MetadataEmptyKey,

    #[error("metadata key {key:?} is {len} bytes, limit is {limit}")]
    MetadataKeyTooLong {
        key: String,
        len: usize,
        limit: usize,
    },

    #[error("metadata value for {key:?} is {len} bytes, limit is {limit}")]
    MetadataValueTooLong {
        key: String,
        len: usize,
        limit: usize,
    },

    #[error("metadata encodes to {len} bytes, limit is {limit}")]
    MetadataTooLarge { len: usize, limit: usize },

    #[error("invalid slug {value:?}: {reason}")]
    InvalidSlug { value: String, reason: String },

    #[error("unknown account type {0:?}")]
    UnknownAccountType(String),

    #[error("unknown side {0:?}, expected debit or credit")]
    UnknownSide(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
