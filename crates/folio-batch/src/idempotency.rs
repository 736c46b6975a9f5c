use folio_types::{EntryId, UserId};

use crate::error::Result;

/// What [`IdempotencyStore::reserve`] found for a key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reservation {
    /// The key is new and now reserved by this caller. The caller must
    /// resolve the reservation with `complete` or `abort`.
    Fresh,
    /// The key completed earlier with the same body hash. The payload is
    /// the stored outcome, to be replayed verbatim.
    Replay(String),
    /// The key is reserved with the same body hash but not yet completed.
    InFlight,
    /// The key is known with a different body hash.
    Mismatch,
}

/// Keyed replay state for batch operations, plus the single-entry
/// `(user, key) -> entry` mapping.
///
/// All implementations must satisfy these invariants:
/// - `reserve` is a single critical section per key; of two concurrent
///   callers with a fresh key, exactly one sees `Fresh`.
/// - A completed outcome is immutable; later reservations with the same
///   hash replay it byte for byte.
/// - `abort` releases a pending reservation so a retry can execute; it
///   never erases a completed outcome.
/// - Batch keys share one namespace across operations; entry keys are
///   scoped per user.
pub trait IdempotencyStore: Send + Sync {
    /// Claim `key` for a request with the given body hash.
    fn reserve(&self, key: &str, body_hash: [u8; 32]) -> Result<Reservation>;

    /// Store the outcome for a pending reservation. Every later matching
    /// reservation replays `outcome`.
    fn complete(&self, key: &str, outcome: String) -> Result<()>;

    /// Release a pending reservation without storing an outcome.
    fn abort(&self, key: &str) -> Result<()>;

    /// The entry recorded for `(user_id, key)`, if any.
    fn entry_for_key(&self, user_id: UserId, key: &str) -> Result<Option<EntryId>>;

    /// Record `(user_id, key) -> entry_id` unless the pair is already
    /// mapped. First write wins; later writes are silently dropped.
    fn save_entry_key(&self, user_id: UserId, key: &str, entry_id: EntryId) -> Result<()>;
}
