//! Posting, reversal, and reclassification.
//!
//! Entries are immutable once posted. Corrections happen by posting a
//! reversing entry (same lines, sides flipped) and, for reclassification,
//! a replacement entry on top. The original is marked `is_reversed` so it
//! can never be reversed twice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use folio_types::{Category, Deadline, EntryId, LineId, Metadata, UserId};

use crate::entities::{JournalEntry, JournalLine, JournalLines};
use crate::error::{LedgerError, Result};
use crate::traits::{LedgerReader, LedgerWriter};
use crate::validation::{EntryDraft, EntryValidator, LineDraft};

/// Marker prefix on the memo of every reversing entry, followed by the
/// original entry id.
pub const REVERSAL_MEMO_PREFIX: &str = "reversal of";

/// Input for reclassifying an entry: reverse it and post a corrected
/// replacement in one call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReclassifyRequest {
    pub user_id: UserId,
    pub entry_id: EntryId,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub memo: String,
    /// `None` keeps the original entry's category.
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub metadata: Metadata,
    pub lines: Vec<LineDraft>,
}

/// Outcome of a reclassification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reclassification {
    pub reversal: JournalEntry,
    pub replacement: JournalEntry,
}

/// Turns validated drafts into persisted entries.
pub struct PostingEngine;

impl PostingEngine {
    /// Validate a draft and persist it.
    pub fn post<S>(store: &S, deadline: &Deadline, draft: &EntryDraft) -> Result<JournalEntry>
    where
        S: LedgerReader + LedgerWriter + ?Sized,
    {
        EntryValidator::validate(store, deadline, draft)?;
        Self::create_entry(store, deadline, draft)
    }

    /// Persist a draft that has already passed validation.
    ///
    /// Entry and line ids are always assigned here; nothing in the draft
    /// can smuggle an id in. Callers that skip [`EntryValidator`] take on
    /// the balancing invariants themselves (the reversal path does, since
    /// a flipped entry is balanced by construction).
    pub fn create_entry<W>(
        writer: &W,
        deadline: &Deadline,
        draft: &EntryDraft,
    ) -> Result<JournalEntry>
    where
        W: LedgerWriter + ?Sized,
    {
        deadline.check()?;
        let entry = Self::materialize(draft);
        writer.create_entry(&entry)?;
        debug!(entry_id = %entry.id, lines = entry.lines.len(), "entry posted");
        Ok(entry)
    }

    /// Build the persistent entry for a draft, assigning fresh ids.
    pub fn materialize(draft: &EntryDraft) -> JournalEntry {
        let entry_id = EntryId::new();
        let mut lines = JournalLines::with_capacity(draft.lines.len());
        for line in &draft.lines {
            lines.push(JournalLine {
                id: LineId::new(),
                entry_id,
                account_id: line.account_id,
                side: line.side,
                amount_minor: line.amount_minor,
            });
        }
        JournalEntry {
            id: entry_id,
            user_id: draft.user_id,
            date: draft.date,
            currency: draft.currency.clone(),
            memo: draft.memo.clone(),
            category: draft.category.clone(),
            metadata: draft.metadata.clone(),
            is_reversed: false,
            lines,
        }
    }

    /// Post the reversing entry for `entry_id` and mark the original as
    /// reversed.
    ///
    /// The reversal carries the original's lines with sides flipped, the
    /// original's currency, category, and metadata, and a memo marking
    /// which entry it undoes. Fails with `AlreadyReversed` if the original
    /// was reversed before; an entry is reversed at most once.
    pub fn reverse_entry<S>(
        store: &S,
        deadline: &Deadline,
        user_id: UserId,
        entry_id: EntryId,
        date: DateTime<Utc>,
    ) -> Result<JournalEntry>
    where
        S: LedgerReader + LedgerWriter + ?Sized,
    {
        deadline.check()?;
        if user_id.is_nil() {
            return Err(LedgerError::invalid("user_id is required"));
        }

        let original = store.get_entry(user_id, entry_id)?;
        if original.user_id != user_id {
            return Err(LedgerError::Forbidden);
        }
        if original.is_reversed {
            return Err(LedgerError::AlreadyReversed);
        }

        let lines = original
            .lines
            .iter()
            .map(|line| LineDraft {
                account_id: line.account_id,
                side: line.side.flip(),
                amount_minor: line.amount_minor,
            })
            .collect();

        let draft = EntryDraft {
            user_id,
            date,
            currency: original.currency.clone(),
            memo: reversal_memo(&original),
            category: original.category.clone(),
            metadata: original.metadata.clone(),
            lines,
        };
        let reversal = Self::create_entry(store, deadline, &draft)?;

        let mut updated = original;
        updated.is_reversed = true;
        store.update_entry(&updated)?;

        debug!(entry_id = %entry_id, reversal_id = %reversal.id, "entry reversed");
        Ok(reversal)
    }

    /// Reverse an entry and post a corrected replacement.
    ///
    /// The replacement keeps the original's currency; moving an entry to a
    /// different currency means reversing and posting by hand. With no
    /// category given the replacement inherits the original's. The
    /// replacement is validated before anything is written, so a bad
    /// request leaves the original untouched and unreversed.
    pub fn reclassify_entry<S>(
        store: &S,
        deadline: &Deadline,
        request: &ReclassifyRequest,
    ) -> Result<Reclassification>
    where
        S: LedgerReader + LedgerWriter + ?Sized,
    {
        deadline.check()?;
        if request.user_id.is_nil() {
            return Err(LedgerError::invalid("user_id is required"));
        }

        let original = store.get_entry(request.user_id, request.entry_id)?;
        if original.is_reversed {
            return Err(LedgerError::AlreadyReversed);
        }

        let replacement_draft = EntryDraft {
            user_id: request.user_id,
            date: request.date,
            currency: original.currency.clone(),
            memo: request.memo.clone(),
            category: request
                .category
                .clone()
                .unwrap_or_else(|| original.category.clone()),
            metadata: request.metadata.clone(),
            lines: request.lines.clone(),
        };
        EntryValidator::validate(store, deadline, &replacement_draft)?;

        let reversal =
            Self::reverse_entry(store, deadline, request.user_id, request.entry_id, request.date)?;
        let replacement = Self::create_entry(store, deadline, &replacement_draft)?;

        debug!(
            entry_id = %request.entry_id,
            replacement_id = %replacement.id,
            "entry reclassified"
        );
        Ok(Reclassification {
            reversal,
            replacement,
        })
    }
}

fn reversal_memo(original: &JournalEntry) -> String {
    if original.memo.is_empty() {
        format!("{REVERSAL_MEMO_PREFIX} {}", original.id)
    } else {
        format!("{REVERSAL_MEMO_PREFIX} {}: {}", original.id, original.memo)
    }
}
