use std::collections::HashMap;

use folio_types::{AccountId, AccountType, EntryId, UserId};

use crate::entities::{Account, JournalEntry};
use crate::error::Result;

/// Filter for [`LedgerReader::list_accounts`]. The default matches all of
/// the user's accounts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountFilter {
    pub group: Option<String>,
    pub vendor: Option<String>,
    pub account_type: Option<AccountType>,
}

/// Read boundary over stored accounts and entries.
///
/// All implementations must satisfy these invariants:
/// - Every query is scoped to one user; rows owned by other users never
///   leak into a result.
/// - `list_entries` returns entries ascending by `(date, id)`.
/// - Returned values are snapshots; mutating them does not touch the store.
pub trait LedgerReader: Send + Sync {
    /// Resolve several accounts for one user in a single call.
    ///
    /// Unknown ids and ids owned by other users are silently omitted, so
    /// callers compare the result size against the request.
    fn accounts_by_ids(
        &self,
        user_id: UserId,
        ids: &[AccountId],
    ) -> Result<HashMap<AccountId, Account>>;

    /// The user's accounts matching `filter`, sorted by path then currency.
    fn list_accounts(&self, user_id: UserId, filter: &AccountFilter) -> Result<Vec<Account>>;

    /// One account.
    ///
    /// Returns `NotFound` for a missing id and for an id owned by another
    /// user; callers cannot distinguish the two.
    fn get_account(&self, user_id: UserId, id: AccountId) -> Result<Account>;

    /// The user's entries ascending by `(date, id)`, lines embedded.
    fn list_entries(&self, user_id: UserId) -> Result<Vec<JournalEntry>>;

    /// One entry. `NotFound` covers missing and foreign ids alike.
    fn get_entry(&self, user_id: UserId, id: EntryId) -> Result<JournalEntry>;
}

/// Write boundary over stored accounts and entries.
///
/// Single-record writes are atomic at the store. Multi-record writes go
/// through [`LedgerWriter::begin_batch`].
pub trait LedgerWriter: Send + Sync {
    /// Persist a new account.
    ///
    /// The store re-checks `(path, currency)` uniqueness authoritatively
    /// and reports a duplicate as `Conflict`, even when the caller already
    /// checked.
    fn create_account(&self, account: &Account) -> Result<()>;

    /// Replace a stored account record. `NotFound` if absent.
    fn update_account(&self, account: &Account) -> Result<()>;

    /// Persist a new entry with all of its lines.
    fn create_entry(&self, entry: &JournalEntry) -> Result<()>;

    /// Replace a stored entry record (reversal marking). `NotFound` if
    /// absent.
    fn update_entry(&self, entry: &JournalEntry) -> Result<()>;

    /// Open a staged batch. Writes are buffered until `commit`.
    fn begin_batch(&self) -> Result<Box<dyn LedgerBatch + '_>>;
}

/// Staged writes that apply atomically or not at all.
///
/// Staging never touches the store; every check and write happens inside
/// `commit` under one lock. Dropping a batch without committing discards
/// every staged write.
pub trait LedgerBatch {
    fn create_account(&mut self, account: &Account) -> Result<()>;

    fn create_entry(&mut self, entry: &JournalEntry) -> Result<()>;

    /// Apply every staged write.
    ///
    /// Account `(path, currency)` conflicts against existing rows are
    /// re-checked here under the store lock; on any failure nothing is
    /// applied.
    fn commit(self: Box<Self>) -> Result<()>;
}
