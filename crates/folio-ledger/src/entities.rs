//! Persistent bookkeeping entities.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use folio_types::slug::slugify;
use folio_types::{
    AccountId, AccountType, Category, Currency, EntryId, LineId, Metadata, Side, UserId,
};

/// Reserved group for the per-currency equity anchor account.
pub const OPENING_BALANCES_GROUP: &str = "opening_balances";
/// Normalized path of the equity anchor account, vendor-independent.
pub const OPENING_BALANCES_PATH: &str = "equity:opening_balances";
/// Display name given to provisioned equity anchor accounts.
pub const OPENING_BALANCES_NAME: &str = "Opening Balances";
/// Vendor recorded on system-provisioned accounts.
pub const SYSTEM_VENDOR: &str = "System";

/// A user-owned bookkeeping account.
///
/// Identity (`account_type`, `currency`, `system`) is immutable after
/// creation; `name`, `group`, `vendor`, and `metadata` may change. Accounts
/// are never removed, only deactivated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    pub name: String,
    pub account_type: AccountType,
    pub currency: Currency,
    pub group: String,
    pub vendor: String,
    pub system: bool,
    pub active: bool,
    pub metadata: Metadata,
}

impl Account {
    /// Normalized `type:group:vendor` path, the per-user uniqueness key
    /// together with the currency.
    pub fn path(&self) -> String {
        normalized_path(self.account_type, &self.group, &self.vendor)
    }
}

/// Normalized `type:group:vendor` path for an account shape.
///
/// Any equity account in the `opening_balances` group collapses to the
/// reserved `equity:opening_balances` path regardless of vendor, so a user
/// cannot shadow the anchor account with a different vendor spelling.
pub fn normalized_path(account_type: AccountType, group: &str, vendor: &str) -> String {
    let group = group.to_lowercase();
    if account_type == AccountType::Equity && group == OPENING_BALANCES_GROUP {
        return OPENING_BALANCES_PATH.to_string();
    }
    format!("{}:{}:{}", account_type.as_str(), group, slugify(vendor))
}

/// A single debit or credit within a journal entry.
///
/// The amount is positive minor units in the owning entry's currency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    pub id: LineId,
    pub entry_id: EntryId,
    pub account_id: AccountId,
    pub side: Side,
    pub amount_minor: i64,
}

/// Lines of an entry, in creation order, with O(1) lookup by line id.
#[derive(Clone, Debug, Default)]
pub struct JournalLines {
    ordered: Vec<JournalLine>,
    by_id: HashMap<LineId, usize>,
}

impl JournalLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ordered: Vec::with_capacity(capacity),
            by_id: HashMap::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, line: JournalLine) {
        self.by_id.insert(line.id, self.ordered.len());
        self.ordered.push(line);
    }

    pub fn get(&self, id: &LineId) -> Option<&JournalLine> {
        self.by_id.get(id).map(|&i| &self.ordered[i])
    }

    /// Lines in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &JournalLine> {
        self.ordered.iter()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

impl From<Vec<JournalLine>> for JournalLines {
    fn from(lines: Vec<JournalLine>) -> Self {
        let mut out = Self::with_capacity(lines.len());
        for line in lines {
            out.push(line);
        }
        out
    }
}

impl PartialEq for JournalLines {
    fn eq(&self, other: &Self) -> bool {
        self.ordered == other.ordered
    }
}

impl Serialize for JournalLines {
    /// Encodes as a plain array; the id index is derived data.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.ordered.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for JournalLines {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let lines = Vec::<JournalLine>::deserialize(deserializer)?;
        Ok(Self::from(lines))
    }
}

/// A balanced journal entry.
///
/// Immutable after creation except for `is_reversed`, which flips to `true`
/// exactly once when a reversing entry is posted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: EntryId,
    pub user_id: UserId,
    pub date: DateTime<Utc>,
    pub currency: Currency,
    pub memo: String,
    pub category: Category,
    pub metadata: Metadata,
    pub is_reversed: bool,
    pub lines: JournalLines,
}
