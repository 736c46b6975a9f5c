//! In-memory store for tests, local demos, and embedding.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};

use folio_types::{AccountId, EntryId, UserId};

use crate::entities::{Account, JournalEntry};
use crate::error::{LedgerError, Result};
use crate::traits::{AccountFilter, LedgerBatch, LedgerReader, LedgerWriter};

/// In-memory [`LedgerReader`] and [`LedgerWriter`] implementation.
///
/// Everything lives behind one `RwLock`; reads return cloned snapshots.
pub struct InMemoryLedger {
    inner: RwLock<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    accounts_by_id: HashMap<AccountId, Account>,
    entries_by_id: HashMap<EntryId, JournalEntry>,
    /// Per user, `(date, id)` pairs kept sorted ascending so listing does
    /// not re-sort on every call.
    entry_index_by_user: HashMap<UserId, Vec<(DateTime<Utc>, EntryId)>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LedgerState::default()),
        }
    }

    /// Inserts an account as-is, bypassing lifecycle rules. Test seeding
    /// helper.
    pub fn seed_account(&self, account: Account) {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        Self::insert_account(&mut state, account);
    }

    /// Drops every account and entry, returning the store to its freshly
    /// constructed state.
    pub fn reset(&self) {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *state = LedgerState::default();
    }

    /// Readiness probe. The only failure mode here is a poisoned lock.
    pub fn ready(&self) -> Result<()> {
        self.inner
            .read()
            .map(|_| ())
            .map_err(|_| LedgerError::Store("ledger state lock poisoned".into()))
    }

    fn insert_account(state: &mut LedgerState, account: Account) {
        state.accounts_by_id.insert(account.id, account);
    }

    fn insert_entry(state: &mut LedgerState, entry: JournalEntry) {
        let index = state.entry_index_by_user.entry(entry.user_id).or_default();
        let key = (entry.date, entry.id);
        let position = index.partition_point(|probe| *probe <= key);
        index.insert(position, key);
        state.entries_by_id.insert(entry.id, entry);
    }

    /// Whether another account of the same user already claims the
    /// `(path, currency)` pair.
    fn path_conflicts(state: &LedgerState, account: &Account) -> bool {
        let path = account.path();
        state.accounts_by_id.values().any(|other| {
            other.id != account.id
                && other.user_id == account.user_id
                && other.currency == account.currency
                && other.path() == path
        })
    }

    fn matches_filter(account: &Account, filter: &AccountFilter) -> bool {
        if let Some(group) = &filter.group {
            if !account.group.eq_ignore_ascii_case(group) {
                return false;
            }
        }
        if let Some(vendor) = &filter.vendor {
            if !account.vendor.eq_ignore_ascii_case(vendor) {
                return false;
            }
        }
        if let Some(account_type) = filter.account_type {
            if account.account_type != account_type {
                return false;
            }
        }
        true
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerReader for InMemoryLedger {
    fn accounts_by_ids(
        &self,
        user_id: UserId,
        ids: &[AccountId],
    ) -> Result<HashMap<AccountId, Account>> {
        let state = self
            .inner
            .read()
            .map_err(|_| LedgerError::Store("ledger state lock poisoned".into()))?;

        let mut found = HashMap::with_capacity(ids.len());
        for id in ids {
            if let Some(account) = state.accounts_by_id.get(id) {
                if account.user_id == user_id {
                    found.insert(*id, account.clone());
                }
            }
        }
        Ok(found)
    }

    fn list_accounts(&self, user_id: UserId, filter: &AccountFilter) -> Result<Vec<Account>> {
        let state = self
            .inner
            .read()
            .map_err(|_| LedgerError::Store("ledger state lock poisoned".into()))?;

        let mut accounts: Vec<Account> = state
            .accounts_by_id
            .values()
            .filter(|a| a.user_id == user_id && Self::matches_filter(a, filter))
            .cloned()
            .collect();
        accounts.sort_by(|a, b| {
            (a.path(), a.currency.as_str()).cmp(&(b.path(), b.currency.as_str()))
        });
        Ok(accounts)
    }

    fn get_account(&self, user_id: UserId, id: AccountId) -> Result<Account> {
        let state = self
            .inner
            .read()
            .map_err(|_| LedgerError::Store("ledger state lock poisoned".into()))?;

        state
            .accounts_by_id
            .get(&id)
            .filter(|a| a.user_id == user_id)
            .cloned()
            .ok_or(LedgerError::NotFound)
    }

    fn list_entries(&self, user_id: UserId) -> Result<Vec<JournalEntry>> {
        let state = self
            .inner
            .read()
            .map_err(|_| LedgerError::Store("ledger state lock poisoned".into()))?;

        let Some(index) = state.entry_index_by_user.get(&user_id) else {
            return Ok(Vec::new());
        };
        index
            .iter()
            .map(|(_, id)| {
                state
                    .entries_by_id
                    .get(id)
                    .cloned()
                    .ok_or_else(|| LedgerError::Store("entry index out of sync".into()))
            })
            .collect()
    }

    fn get_entry(&self, user_id: UserId, id: EntryId) -> Result<JournalEntry> {
        let state = self
            .inner
            .read()
            .map_err(|_| LedgerError::Store("ledger state lock poisoned".into()))?;

        state
            .entries_by_id
            .get(&id)
            .filter(|e| e.user_id == user_id)
            .cloned()
            .ok_or(LedgerError::NotFound)
    }
}

impl LedgerWriter for InMemoryLedger {
    fn create_account(&self, account: &Account) -> Result<()> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| LedgerError::Store("ledger state lock poisoned".into()))?;

        if state.accounts_by_id.contains_key(&account.id) {
            return Err(LedgerError::conflict("account id already exists"));
        }
        if Self::path_conflicts(&state, account) {
            return Err(LedgerError::conflict("account path already exists for user"));
        }
        Self::insert_account(&mut state, account.clone());
        Ok(())
    }

    fn update_account(&self, account: &Account) -> Result<()> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| LedgerError::Store("ledger state lock poisoned".into()))?;

        if !state.accounts_by_id.contains_key(&account.id) {
            return Err(LedgerError::NotFound);
        }
        Self::insert_account(&mut state, account.clone());
        Ok(())
    }

    fn create_entry(&self, entry: &JournalEntry) -> Result<()> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| LedgerError::Store("ledger state lock poisoned".into()))?;

        if state.entries_by_id.contains_key(&entry.id) {
            return Err(LedgerError::conflict("entry id already exists"));
        }
        Self::insert_entry(&mut state, entry.clone());
        Ok(())
    }

    fn update_entry(&self, entry: &JournalEntry) -> Result<()> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| LedgerError::Store("ledger state lock poisoned".into()))?;

        let Some(current) = state.entries_by_id.get(&entry.id) else {
            return Err(LedgerError::NotFound);
        };
        if current.date != entry.date {
            let old_key = (current.date, current.id);
            if let Some(index) = state.entry_index_by_user.get_mut(&entry.user_id) {
                index.retain(|probe| *probe != old_key);
            }
            Self::insert_entry(&mut state, entry.clone());
        } else {
            state.entries_by_id.insert(entry.id, entry.clone());
        }
        Ok(())
    }

    fn begin_batch(&self) -> Result<Box<dyn LedgerBatch + '_>> {
        Ok(Box::new(MemoryBatch {
            store: self,
            accounts: Vec::new(),
            entries: Vec::new(),
        }))
    }
}

/// Staged writes against an [`InMemoryLedger`]. Nothing is visible until
/// `commit`, which checks and applies everything under one write lock.
struct MemoryBatch<'a> {
    store: &'a InMemoryLedger,
    accounts: Vec<Account>,
    entries: Vec<JournalEntry>,
}

impl LedgerBatch for MemoryBatch<'_> {
    fn create_account(&mut self, account: &Account) -> Result<()> {
        self.accounts.push(account.clone());
        Ok(())
    }

    fn create_entry(&mut self, entry: &JournalEntry) -> Result<()> {
        self.entries.push(entry.clone());
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<()> {
        let Self {
            store,
            accounts,
            entries,
        } = *self;
        let mut state = store
            .inner
            .write()
            .map_err(|_| LedgerError::Store("ledger state lock poisoned".into()))?;

        for (i, account) in accounts.iter().enumerate() {
            if state.accounts_by_id.contains_key(&account.id) {
                return Err(LedgerError::conflict("account id already exists"));
            }
            if InMemoryLedger::path_conflicts(&state, account) {
                return Err(LedgerError::conflict("account path already exists for user"));
            }
            let path = account.path();
            if accounts[..i].iter().any(|other| {
                other.user_id == account.user_id
                    && other.currency == account.currency
                    && other.path() == path
            }) {
                return Err(LedgerError::conflict("account path already exists for user"));
            }
        }
        for entry in &entries {
            if state.entries_by_id.contains_key(&entry.id) {
                return Err(LedgerError::conflict("entry id already exists"));
            }
        }

        for account in accounts {
            InMemoryLedger::insert_account(&mut state, account);
        }
        for entry in entries {
            InMemoryLedger::insert_entry(&mut state, entry);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use folio_types::{AccountType, Category, Currency, Metadata, Side};

    use crate::entities::{JournalLine, JournalLines};

    fn account(
        user_id: UserId,
        ty: AccountType,
        group: &str,
        vendor: &str,
        currency: &str,
    ) -> Account {
        Account {
            id: AccountId::new(),
            user_id,
            name: vendor.to_string(),
            account_type: ty,
            currency: Currency::new(currency).unwrap(),
            group: group.to_string(),
            vendor: vendor.to_string(),
            system: false,
            active: true,
            metadata: Metadata::new(),
        }
    }

    fn entry(user_id: UserId, day: u32, debit: AccountId, credit: AccountId) -> JournalEntry {
        let id = EntryId::new();
        let lines = vec![
            JournalLine {
                id: folio_types::LineId::new(),
                entry_id: id,
                account_id: debit,
                side: Side::Debit,
                amount_minor: 100,
            },
            JournalLine {
                id: folio_types::LineId::new(),
                entry_id: id,
                account_id: credit,
                side: Side::Credit,
                amount_minor: 100,
            },
        ];
        JournalEntry {
            id,
            user_id,
            date: Utc.with_ymd_and_hms(2024, 5, day, 0, 0, 0).unwrap(),
            currency: Currency::new("USD").unwrap(),
            memo: format!("day {day}"),
            category: Category::default(),
            metadata: Metadata::new(),
            is_reversed: false,
            lines: JournalLines::from(lines),
        }
    }

    #[test]
    fn create_and_get_account() {
        let store = InMemoryLedger::new();
        let user = UserId::new();
        let cash = account(user, AccountType::Asset, "bank", "Monzo", "GBP");

        store.create_account(&cash).unwrap();
        let fetched = store.get_account(user, cash.id).unwrap();
        assert_eq!(fetched, cash);
    }

    #[test]
    fn create_account_rejects_duplicate_path() {
        let store = InMemoryLedger::new();
        let user = UserId::new();
        store
            .create_account(&account(user, AccountType::Asset, "bank", "Monzo", "GBP"))
            .unwrap();

        let err = store
            .create_account(&account(user, AccountType::Asset, "bank", "monzo", "GBP"))
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::conflict("account path already exists for user")
        );

        // Another user or another currency is no conflict.
        store
            .create_account(&account(UserId::new(), AccountType::Asset, "bank", "Monzo", "GBP"))
            .unwrap();
        store
            .create_account(&account(user, AccountType::Asset, "bank", "Monzo", "EUR"))
            .unwrap();
    }

    #[test]
    fn update_account_requires_existing_record() {
        let store = InMemoryLedger::new();
        let user = UserId::new();
        let cash = account(user, AccountType::Asset, "bank", "Monzo", "GBP");
        assert_eq!(store.update_account(&cash).unwrap_err(), LedgerError::NotFound);

        store.create_account(&cash).unwrap();
        let mut renamed = cash.clone();
        renamed.name = "Primary".to_string();
        store.update_account(&renamed).unwrap();
        assert_eq!(store.get_account(user, cash.id).unwrap().name, "Primary");
    }

    #[test]
    fn reads_are_scoped_to_the_user() {
        let store = InMemoryLedger::new();
        let owner = UserId::new();
        let intruder = UserId::new();
        let cash = account(owner, AccountType::Asset, "bank", "Monzo", "GBP");
        store.seed_account(cash.clone());

        assert_eq!(
            store.get_account(intruder, cash.id).unwrap_err(),
            LedgerError::NotFound
        );
        let resolved = store
            .accounts_by_ids(intruder, &[cash.id, AccountId::new()])
            .unwrap();
        assert!(resolved.is_empty());
        assert!(store
            .list_accounts(intruder, &AccountFilter::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn list_accounts_sorts_and_filters() {
        let store = InMemoryLedger::new();
        let user = UserId::new();
        store.seed_account(account(user, AccountType::Revenue, "salary", "Acme", "GBP"));
        store.seed_account(account(user, AccountType::Asset, "bank", "Monzo", "GBP"));
        store.seed_account(account(user, AccountType::Asset, "bank", "Monzo", "EUR"));
        store.seed_account(account(user, AccountType::Asset, "cash", "Wallet", "GBP"));

        let all = store.list_accounts(user, &AccountFilter::default()).unwrap();
        let listed: Vec<(String, String)> = all
            .iter()
            .map(|a| (a.path(), a.currency.as_str().to_string()))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("asset:bank:monzo".to_string(), "EUR".to_string()),
                ("asset:bank:monzo".to_string(), "GBP".to_string()),
                ("asset:cash:wallet".to_string(), "GBP".to_string()),
                ("revenue:salary:acme".to_string(), "GBP".to_string()),
            ]
        );

        let banks = store
            .list_accounts(
                user,
                &AccountFilter {
                    group: Some("BANK".to_string()),
                    ..AccountFilter::default()
                },
            )
            .unwrap();
        assert_eq!(banks.len(), 2);

        let revenue = store
            .list_accounts(
                user,
                &AccountFilter {
                    account_type: Some(AccountType::Revenue),
                    ..AccountFilter::default()
                },
            )
            .unwrap();
        assert_eq!(revenue.len(), 1);
        assert_eq!(revenue[0].vendor, "Acme");
    }

    #[test]
    fn entries_list_in_date_order_regardless_of_insertion() {
        let store = InMemoryLedger::new();
        let user = UserId::new();
        let cash = account(user, AccountType::Asset, "bank", "Monzo", "USD");
        let income = account(user, AccountType::Revenue, "salary", "Acme", "USD");
        let (cash_id, income_id) = (cash.id, income.id);
        store.seed_account(cash);
        store.seed_account(income);

        for day in [7, 2, 9, 4] {
            store.create_entry(&entry(user, day, cash_id, income_id)).unwrap();
        }

        let listed = store.list_entries(user).unwrap();
        let days: Vec<u32> = listed
            .iter()
            .map(|e| {
                use chrono::Datelike;
                e.date.day()
            })
            .collect();
        assert_eq!(days, vec![2, 4, 7, 9]);
    }

    #[test]
    fn create_entry_rejects_duplicate_id() {
        let store = InMemoryLedger::new();
        let user = UserId::new();
        let posted = entry(user, 1, AccountId::new(), AccountId::new());
        store.create_entry(&posted).unwrap();
        let err = store.create_entry(&posted).unwrap_err();
        assert_eq!(err, LedgerError::conflict("entry id already exists"));
    }

    #[test]
    fn update_entry_persists_reversal_mark() {
        let store = InMemoryLedger::new();
        let user = UserId::new();
        let posted = entry(user, 1, AccountId::new(), AccountId::new());
        store.create_entry(&posted).unwrap();

        let mut reversed = posted.clone();
        reversed.is_reversed = true;
        store.update_entry(&reversed).unwrap();
        assert!(store.get_entry(user, posted.id).unwrap().is_reversed);

        let unknown = entry(user, 2, AccountId::new(), AccountId::new());
        assert_eq!(store.update_entry(&unknown).unwrap_err(), LedgerError::NotFound);
    }

    #[test]
    fn get_entry_is_scoped_to_the_user() {
        let store = InMemoryLedger::new();
        let owner = UserId::new();
        let posted = entry(owner, 1, AccountId::new(), AccountId::new());
        store.create_entry(&posted).unwrap();

        assert_eq!(
            store.get_entry(UserId::new(), posted.id).unwrap_err(),
            LedgerError::NotFound
        );
        assert!(store.list_entries(UserId::new()).unwrap().is_empty());
    }

    #[test]
    fn batch_commit_applies_everything() {
        let store = InMemoryLedger::new();
        let user = UserId::new();
        let cash = account(user, AccountType::Asset, "bank", "Monzo", "USD");
        let income = account(user, AccountType::Revenue, "salary", "Acme", "USD");
        let posted = entry(user, 3, cash.id, income.id);

        let mut batch = store.begin_batch().unwrap();
        batch.create_account(&cash).unwrap();
        batch.create_account(&income).unwrap();
        batch.create_entry(&posted).unwrap();
        // Staged writes are invisible until commit.
        assert!(store
            .list_accounts(user, &AccountFilter::default())
            .unwrap()
            .is_empty());
        batch.commit().unwrap();

        assert_eq!(
            store.list_accounts(user, &AccountFilter::default()).unwrap().len(),
            2
        );
        assert_eq!(store.list_entries(user).unwrap().len(), 1);
    }

    #[test]
    fn batch_commit_is_all_or_nothing() {
        let store = InMemoryLedger::new();
        let user = UserId::new();
        store
            .create_account(&account(user, AccountType::Asset, "bank", "Monzo", "USD"))
            .unwrap();

        let mut batch = store.begin_batch().unwrap();
        batch
            .create_account(&account(user, AccountType::Asset, "cash", "Wallet", "USD"))
            .unwrap();
        batch
            .create_account(&account(user, AccountType::Asset, "bank", "monzo", "USD"))
            .unwrap();
        let err = batch.commit().unwrap_err();
        assert_eq!(
            err,
            LedgerError::conflict("account path already exists for user")
        );

        // The clean staged account was discarded with the rest.
        assert_eq!(
            store.list_accounts(user, &AccountFilter::default()).unwrap().len(),
            1
        );
    }

    #[test]
    fn batch_commit_rejects_intra_batch_duplicates() {
        let store = InMemoryLedger::new();
        let user = UserId::new();

        let mut batch = store.begin_batch().unwrap();
        batch
            .create_account(&account(user, AccountType::Asset, "bank", "Monzo", "USD"))
            .unwrap();
        batch
            .create_account(&account(user, AccountType::Asset, "bank", "MONZO", "USD"))
            .unwrap();
        let err = batch.commit().unwrap_err();
        assert_eq!(
            err,
            LedgerError::conflict("account path already exists for user")
        );
        assert!(store
            .list_accounts(user, &AccountFilter::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn dropped_batch_discards_staged_writes() {
        let store = InMemoryLedger::new();
        let user = UserId::new();

        {
            let mut batch = store.begin_batch().unwrap();
            batch
                .create_account(&account(user, AccountType::Asset, "bank", "Monzo", "USD"))
                .unwrap();
            batch
                .create_entry(&entry(user, 1, AccountId::new(), AccountId::new()))
                .unwrap();
        }

        assert!(store
            .list_accounts(user, &AccountFilter::default())
            .unwrap()
            .is_empty());
        assert!(store.list_entries(user).unwrap().is_empty());
    }

    #[test]
    fn reset_clears_state_and_ready_stays_ok() {
        let store = InMemoryLedger::new();
        let user = UserId::new();
        let cash = account(user, AccountType::Asset, "cash", "Wallet", "USD");
        let cash_id = cash.id;
        store.seed_account(cash);
        store.create_entry(&entry(user, 1, cash_id, AccountId::new())).unwrap();

        assert!(store.ready().is_ok());
        store.reset();

        assert!(store
            .list_accounts(user, &AccountFilter::default())
            .unwrap()
            .is_empty());
        assert!(store.list_entries(user).unwrap().is_empty());
        assert!(store.ready().is_ok());
    }
}
