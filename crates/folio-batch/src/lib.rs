//! Idempotent batch posting for Folio.
//!
//! This crate layers keyed replay over `folio-ledger`:
//! - `BatchCoordinator` for all-or-nothing account and entry batches
//! - `IdempotencyStore` trait boundary with reserve/complete/abort
//! - `InMemoryIdempotency` implementation for tests and embedding
//! - Canonical body hashing so equal requests replay equal outcomes

pub mod coordinator;
pub mod error;
pub mod hash;
pub mod idempotency;
pub mod memory;

pub use coordinator::{
    BatchCoordinator, BatchReply, PostedEntry, MAX_BATCH_ACCOUNTS, MAX_BATCH_ENTRIES,
};
pub use error::{BatchError, Result};
pub use hash::hash_json;
pub use idempotency::{IdempotencyStore, Reservation};
pub use memory::InMemoryIdempotency;
