//! Double-entry bookkeeping core for Folio.
//!
//! This crate is the heart of Folio. It provides:
//! - Account and journal entry records with balanced-entry validation
//! - `LedgerReader` / `LedgerWriter` trait boundaries
//! - `InMemoryLedger` implementation for tests and embedding
//! - Posting, reversal, and reclassification
//! - Trial balance, account balance, and running-ledger reporting
//! - Account lifecycle with the opening-balances anchor
//! - Cursor pagination over entries and ledger lines

pub mod accounts;
pub mod balance;
pub mod cursor;
pub mod dictionary;
pub mod entities;
pub mod error;
pub mod memory;
pub mod posting;
pub mod query;
pub mod traits;
pub mod validation;

pub use accounts::{AccountDraft, AccountEngine, AccountPatch, EnsureBatchOutcome};
pub use balance::{
    BalanceEngine, LedgerPage, LedgerQuery, LedgerRecord, TrialBalanceGroup, TrialBalanceRow,
};
pub use cursor::{Cursor, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use dictionary::GroupDef;
pub use entities::{
    normalized_path, Account, JournalEntry, JournalLine, JournalLines, OPENING_BALANCES_GROUP,
    OPENING_BALANCES_NAME, OPENING_BALANCES_PATH, SYSTEM_VENDOR,
};
pub use error::{ItemError, LedgerError, Result};
pub use memory::InMemoryLedger;
pub use posting::{PostingEngine, Reclassification, ReclassifyRequest, REVERSAL_MEMO_PREFIX};
pub use query::{EntryBrowser, EntryPage, EntryQuery};
pub use traits::{AccountFilter, LedgerBatch, LedgerReader, LedgerWriter};
pub use validation::{EntryDraft, EntryValidator, LineDraft};
