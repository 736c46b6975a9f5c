//! Idempotent, all-or-nothing batch posting.
//!
//! Every batch call carries an idempotency key. The first request under a
//! key executes and its outcome is stored; any retry with the same body
//! replays that outcome verbatim instead of re-executing. Rejections are
//! outcomes too: a batch that failed validation replays the same rejection.
//! Deadline and storage failures release the key so a retry re-executes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use folio_ledger::{
    AccountDraft, AccountEngine, EnsureBatchOutcome, EntryDraft, EntryValidator, ItemError,
    JournalEntry, LedgerError, LedgerReader, LedgerWriter, PostingEngine,
};
use folio_types::{Deadline, UserId};

use crate::error::{BatchError, Result};
use crate::hash::hash_json;
use crate::idempotency::{IdempotencyStore, Reservation};

/// Most accounts accepted in one batch.
pub const MAX_BATCH_ACCOUNTS: usize = 100;

/// Most entries accepted in one batch.
pub const MAX_BATCH_ENTRIES: usize = 500;

/// Stored and replayed result of a batch: either every item was created or
/// the whole batch was rejected with per-item reports.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "body", rename_all = "snake_case")]
pub enum BatchReply<T> {
    Created(Vec<T>),
    Rejected(Vec<ItemError>),
}

/// Result of single-entry idempotent posting.
#[derive(Clone, Debug, PartialEq)]
pub struct PostedEntry {
    pub entry: JournalEntry,
    /// True when the entry was replayed from the key mapping instead of
    /// being posted now.
    pub replayed: bool,
}

/// Orchestrates idempotent batches over a ledger store and an idempotency
/// store.
pub struct BatchCoordinator;

impl BatchCoordinator {
    /// Posts up to [`MAX_BATCH_ENTRIES`] entries atomically under an
    /// idempotency key.
    ///
    /// Every draft is validated first; any failure rejects the whole batch
    /// with one report per offending index and persists nothing. The
    /// rejection is stored under the key like a success, so a retry with
    /// the identical body replays it instead of re-validating.
    pub fn post_entries<S, I>(
        store: &S,
        idempotency: &I,
        deadline: &Deadline,
        key: &str,
        drafts: &[EntryDraft],
    ) -> Result<BatchReply<JournalEntry>>
    where
        S: LedgerReader + LedgerWriter + ?Sized,
        I: IdempotencyStore + ?Sized,
    {
        if key.is_empty() {
            return Err(BatchError::IdempotencyRequired);
        }
        if drafts.is_empty() {
            return Err(LedgerError::invalid("entries is required").into());
        }
        if drafts.len() > MAX_BATCH_ENTRIES {
            return Err(BatchError::TooManyItems {
                count: drafts.len(),
                limit: MAX_BATCH_ENTRIES,
            });
        }

        #[derive(Serialize)]
        struct EntriesBody<'a> {
            entries: &'a [EntryDraft],
        }
        let body_hash = hash_json(&EntriesBody { entries: drafts })?;

        match idempotency.reserve(key, body_hash)? {
            Reservation::Fresh => {
                debug!(key = %key, body_hash = %hex::encode(body_hash), "entry batch reserved");
            }
            Reservation::Replay(stored) => {
                debug!(key = %key, "entry batch replayed");
                return decode_reply(&stored);
            }
            Reservation::InFlight => return Err(BatchError::InFlight),
            Reservation::Mismatch => return Err(BatchError::IdempotencyMismatch),
        }

        let reply = match Self::run_entries(store, deadline, drafts) {
            Ok(reply) => reply,
            Err(err) => {
                idempotency.abort(key)?;
                return Err(err);
            }
        };
        Self::store_outcome(idempotency, key, &reply)?;
        Ok(reply)
    }

    /// Creates up to [`MAX_BATCH_ACCOUNTS`] accounts atomically under an
    /// idempotency key, provisioning opening-balances anchors per currency.
    pub fn ensure_accounts<S, I>(
        store: &S,
        idempotency: &I,
        deadline: &Deadline,
        key: &str,
        user_id: UserId,
        drafts: &[AccountDraft],
    ) -> Result<BatchReply<folio_ledger::Account>>
    where
        S: LedgerReader + LedgerWriter + ?Sized,
        I: IdempotencyStore + ?Sized,
    {
        if key.is_empty() {
            return Err(BatchError::IdempotencyRequired);
        }
        if user_id.is_nil() {
            return Err(LedgerError::invalid("user_id is required").into());
        }
        if drafts.is_empty() {
            return Err(LedgerError::invalid("accounts is required").into());
        }
        if drafts.len() > MAX_BATCH_ACCOUNTS {
            return Err(BatchError::TooManyItems {
                count: drafts.len(),
                limit: MAX_BATCH_ACCOUNTS,
            });
        }

        #[derive(Serialize)]
        struct AccountsBody {
            user_id: UserId,
            accounts: Vec<AccountDraft>,
        }
        let body_hash = hash_json(&AccountsBody {
            user_id,
            accounts: drafts.iter().map(|d| d.normalized(user_id)).collect(),
        })?;

        match idempotency.reserve(key, body_hash)? {
            Reservation::Fresh => {
                debug!(key = %key, body_hash = %hex::encode(body_hash), "account batch reserved");
            }
            Reservation::Replay(stored) => {
                debug!(key = %key, "account batch replayed");
                return decode_reply(&stored);
            }
            Reservation::InFlight => return Err(BatchError::InFlight),
            Reservation::Mismatch => return Err(BatchError::IdempotencyMismatch),
        }

        let outcome = match AccountEngine::ensure_batch(store, deadline, user_id, drafts) {
            Ok(outcome) => outcome,
            Err(err) => {
                idempotency.abort(key)?;
                return Err(err.into());
            }
        };
        let reply = match outcome {
            EnsureBatchOutcome::Created(accounts) => BatchReply::Created(accounts),
            EnsureBatchOutcome::Rejected(items) => BatchReply::Rejected(items),
        };
        Self::store_outcome(idempotency, key, &reply)?;
        Ok(reply)
    }

    /// Posts one entry under an optional-retry idempotency key.
    ///
    /// A known `(user, key)` pair replays the recorded entry; the body is
    /// not compared, the key alone decides. A miss posts the entry, then
    /// records the mapping first-write-wins.
    pub fn post_entry_idempotent<S, I>(
        store: &S,
        idempotency: &I,
        deadline: &Deadline,
        key: &str,
        draft: &EntryDraft,
    ) -> Result<PostedEntry>
    where
        S: LedgerReader + LedgerWriter + ?Sized,
        I: IdempotencyStore + ?Sized,
    {
        if key.is_empty() {
            return Err(BatchError::IdempotencyRequired);
        }
        deadline.check().map_err(LedgerError::from)?;

        if let Some(entry_id) = idempotency.entry_for_key(draft.user_id, key)? {
            let entry = store.get_entry(draft.user_id, entry_id)?;
            debug!(key = %key, entry_id = %entry.id, "entry replayed");
            return Ok(PostedEntry {
                entry,
                replayed: true,
            });
        }

        let entry = PostingEngine::post(store, deadline, draft)?;
        idempotency.save_entry_key(draft.user_id, key, entry.id)?;
        Ok(PostedEntry {
            entry,
            replayed: false,
        })
    }

    fn run_entries<S>(
        store: &S,
        deadline: &Deadline,
        drafts: &[EntryDraft],
    ) -> Result<BatchReply<JournalEntry>>
    where
        S: LedgerReader + LedgerWriter + ?Sized,
    {
        let mut item_errors = Vec::new();
        for (i, draft) in drafts.iter().enumerate() {
            deadline.check().map_err(LedgerError::from)?;
            match EntryValidator::validate(store, deadline, draft) {
                Ok(()) => {}
                Err(err) if is_transient(&err) => return Err(err.into()),
                Err(err) => item_errors.push(ItemError::from_error(i, &err)),
            }
        }
        if !item_errors.is_empty() {
            return Ok(BatchReply::Rejected(item_errors));
        }

        let entries: Vec<JournalEntry> = drafts.iter().map(PostingEngine::materialize).collect();
        let mut batch = store.begin_batch()?;
        for entry in &entries {
            batch.create_entry(entry)?;
        }
        batch.commit()?;
        debug!(count = entries.len(), "entry batch posted");
        Ok(BatchReply::Created(entries))
    }

    fn store_outcome<I, T>(idempotency: &I, key: &str, reply: &BatchReply<T>) -> Result<()>
    where
        I: IdempotencyStore + ?Sized,
        T: Serialize,
    {
        let encoded = match serde_json::to_string(reply) {
            Ok(encoded) => encoded,
            Err(err) => {
                idempotency.abort(key)?;
                return Err(BatchError::Serialization(err.to_string()));
            }
        };
        idempotency.complete(key, encoded)
    }
}

/// Failures that must release the idempotency key instead of becoming a
/// stored outcome, so a retry re-executes.
fn is_transient(err: &LedgerError) -> bool {
    matches!(err, LedgerError::DeadlineExceeded | LedgerError::Store(_))
}

fn decode_reply<T: serde::de::DeserializeOwned>(stored: &str) -> Result<BatchReply<T>> {
    serde_json::from_str(stored).map_err(|e| BatchError::Serialization(e.to_string()))
}
