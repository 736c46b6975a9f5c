//! Journal entry validation.
//!
//! Checks run in a fixed order and stop at the first failure, so callers
//! always see the most fundamental problem first: caller identity, then
//! line shape, then balance, then account resolution.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use folio_types::{AccountId, Category, Currency, Deadline, Metadata, Side, UserId};

use crate::error::{LedgerError, Result};
use crate::traits::LedgerReader;

/// Input for a new journal entry, before ids are assigned.
///
/// The currency is already normalized by construction; an entry can only
/// carry a non-empty uppercase code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub user_id: UserId,
    pub date: DateTime<Utc>,
    pub currency: Currency,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub metadata: Metadata,
    pub lines: Vec<LineDraft>,
}

/// One line of a draft entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDraft {
    pub account_id: AccountId,
    pub side: Side,
    pub amount_minor: i64,
}

/// Validates entry drafts against the bookkeeping rules and the caller's
/// accounts. Pure reads; never writes.
pub struct EntryValidator;

impl EntryValidator {
    /// Check a draft in order:
    ///
    /// 1. `user_id` present
    /// 2. at least two lines
    /// 3. per line: account id present, positive amount
    /// 4. debits balance credits (summed in `i128`, overflow-proof)
    /// 5. metadata within limits
    /// 6. every referenced account resolves for this user (one batched read)
    /// 7. per line: account ownership and currency agreement
    pub fn validate<R: LedgerReader + ?Sized>(
        reader: &R,
        deadline: &Deadline,
        draft: &EntryDraft,
    ) -> Result<()> {
        deadline.check()?;

        if draft.user_id.is_nil() {
            return Err(LedgerError::invalid("user_id is required"));
        }
        if draft.lines.len() < 2 {
            return Err(LedgerError::TooFewLines);
        }

        let mut debits: i128 = 0;
        let mut credits: i128 = 0;
        let mut ids: Vec<AccountId> = Vec::with_capacity(draft.lines.len());
        let mut seen: HashSet<AccountId> = HashSet::with_capacity(draft.lines.len());

        for (index, line) in draft.lines.iter().enumerate() {
            if line.account_id.is_nil() {
                return Err(LedgerError::invalid(format!(
                    "line {index}: account_id is required"
                )));
            }
            if line.amount_minor <= 0 {
                return Err(LedgerError::InvalidAmount { index });
            }
            match line.side {
                Side::Debit => debits += i128::from(line.amount_minor),
                Side::Credit => credits += i128::from(line.amount_minor),
            }
            if seen.insert(line.account_id) {
                ids.push(line.account_id);
            }
        }

        if debits != credits {
            return Err(LedgerError::UnbalancedEntry);
        }

        draft.metadata.validate()?;

        deadline.check()?;
        let accounts = reader.accounts_by_ids(draft.user_id, &ids)?;
        if accounts.len() != ids.len() {
            return Err(LedgerError::invalid("unknown or unauthorized accounts"));
        }

        for (index, line) in draft.lines.iter().enumerate() {
            let account = accounts
                .get(&line.account_id)
                .ok_or_else(|| LedgerError::invalid("unknown or unauthorized accounts"))?;
            if account.user_id != draft.user_id {
                return Err(LedgerError::Forbidden);
            }
            if account.currency != draft.currency {
                return Err(LedgerError::CurrencyMismatch { index });
            }
        }

        Ok(())
    }
}
