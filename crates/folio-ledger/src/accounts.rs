//! Account lifecycle: creation, updates, deactivation, and the batch
//! ensure operation.
//!
//! Every user has one opening-balances anchor account per currency at the
//! reserved `equity:opening_balances` path. [`AccountEngine::create`]
//! provisions the anchor for the draft's currency before inserting the
//! requested account, so the first account a user creates always brings its
//! anchor along.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use folio_types::{AccountId, AccountType, Currency, Deadline, Metadata, UserId};

use crate::entities::{
    normalized_path, Account, OPENING_BALANCES_GROUP, OPENING_BALANCES_NAME, OPENING_BALANCES_PATH,
    SYSTEM_VENDOR,
};
use crate::error::{ItemError, LedgerError, Result};
use crate::traits::{AccountFilter, LedgerReader, LedgerWriter};

/// Input for a new account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountDraft {
    pub user_id: UserId,
    pub name: String,
    pub currency: Currency,
    pub account_type: AccountType,
    pub group: String,
    pub vendor: String,
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub metadata: Metadata,
}

impl AccountDraft {
    /// Copy with the caller's user id and trimmed group and vendor. Batch
    /// hashing and batch creation both operate on this shape.
    pub fn normalized(&self, user_id: UserId) -> AccountDraft {
        let mut draft = self.clone();
        draft.user_id = user_id;
        draft.group = draft.group.trim().to_string();
        draft.vendor = draft.vendor.trim().to_string();
        draft
    }

    fn path(&self) -> String {
        normalized_path(self.account_type, &self.group, &self.vendor)
    }
}

/// Partial update for an existing account. Absent fields keep their current
/// value; the metadata patch merges key by key instead of replacing the map.
///
/// Type, currency, and the system flag may be restated but never changed:
/// a differing value is rejected with [`LedgerError::Immutable`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountPatch {
    pub user_id: UserId,
    pub account_id: AccountId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub account_type: Option<AccountType>,
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub system: Option<bool>,
}

/// Result of [`AccountEngine::ensure_batch`]: either every draft was created
/// or none were.
#[derive(Clone, Debug, PartialEq)]
pub enum EnsureBatchOutcome {
    Created(Vec<Account>),
    Rejected(Vec<ItemError>),
}

/// Account lifecycle rules, independent of the backing store.
pub struct AccountEngine;

impl AccountEngine {
    /// Checks a draft against the creation rules without touching the store.
    ///
    /// The group must be a valid slug once lowercased. System accounts and
    /// anything in the `opening_balances` group must be equity accounts in
    /// exactly that group.
    pub fn validate_create(draft: &AccountDraft) -> Result<()> {
        if draft.user_id.is_nil() {
            return Err(LedgerError::invalid("user_id is required"));
        }
        if draft.name.is_empty() {
            return Err(LedgerError::invalid("name is required"));
        }
        if draft.group.is_empty() {
            return Err(LedgerError::invalid("group is required"));
        }
        folio_types::slug::check_slug(&draft.group.to_lowercase())?;
        if draft.vendor.is_empty() {
            return Err(LedgerError::invalid("vendor is required"));
        }
        if draft.system || draft.group.eq_ignore_ascii_case(OPENING_BALANCES_GROUP) {
            if draft.account_type != AccountType::Equity {
                return Err(LedgerError::invalid("opening balances accounts must be equity"));
            }
            if !draft.group.eq_ignore_ascii_case(OPENING_BALANCES_GROUP) {
                return Err(LedgerError::invalid(
                    "system accounts must use the opening_balances group",
                ));
            }
        }
        draft.metadata.validate()?;
        Ok(())
    }

    /// Returns the user's opening-balances anchor for `currency`, creating
    /// it if it does not exist yet. Idempotent.
    pub fn ensure_opening_balance<S>(
        store: &S,
        deadline: &Deadline,
        user_id: UserId,
        currency: &Currency,
    ) -> Result<Account>
    where
        S: LedgerReader + LedgerWriter + ?Sized,
    {
        deadline.check()?;
        if user_id.is_nil() {
            return Err(LedgerError::invalid("user_id is required"));
        }
        let existing = store.list_accounts(user_id, &AccountFilter::default())?;
        if let Some(found) = existing
            .iter()
            .find(|a| a.currency == *currency && a.path() == OPENING_BALANCES_PATH)
        {
            return Ok(found.clone());
        }

        let account = Account {
            id: AccountId::new(),
            user_id,
            name: OPENING_BALANCES_NAME.to_string(),
            account_type: AccountType::Equity,
            currency: currency.clone(),
            group: OPENING_BALANCES_GROUP.to_string(),
            vendor: SYSTEM_VENDOR.to_string(),
            system: true,
            active: true,
            metadata: Metadata::new(),
        };
        store.create_account(&account)?;
        debug!(
            account_id = %account.id,
            currency = %currency,
            "opening balances account provisioned"
        );
        Ok(account)
    }

    /// Creates an account after provisioning the opening-balances anchor for
    /// its currency.
    ///
    /// The `(path, currency)` pair is unique per user. Asking for the
    /// reserved `equity:opening_balances` path directly therefore conflicts:
    /// the anchor is provisioned first and claims it.
    pub fn create<S>(store: &S, deadline: &Deadline, draft: &AccountDraft) -> Result<Account>
    where
        S: LedgerReader + LedgerWriter + ?Sized,
    {
        Self::validate_create(draft)?;
        Self::ensure_opening_balance(store, deadline, draft.user_id, &draft.currency)?;
        deadline.check()?;

        let desired = draft.path();
        let existing = store.list_accounts(draft.user_id, &AccountFilter::default())?;
        if existing
            .iter()
            .any(|a| a.path() == desired && a.currency == draft.currency)
        {
            return Err(LedgerError::conflict("account path already exists for user"));
        }

        let account = Self::materialize(draft);
        store.create_account(&account)?;
        debug!(
            account_id = %account.id,
            path = %account.path(),
            currency = %account.currency,
            "account created"
        );
        Ok(account)
    }

    /// Creates every draft or none of them.
    ///
    /// All drafts are validated first, then checked for path collisions both
    /// inside the batch and against existing accounts. A collision between
    /// two drafts marks both indices. Only a fully clean batch is committed,
    /// in one store transaction.
    pub fn ensure_batch<S>(
        store: &S,
        deadline: &Deadline,
        user_id: UserId,
        drafts: &[AccountDraft],
    ) -> Result<EnsureBatchOutcome>
    where
        S: LedgerReader + LedgerWriter + ?Sized,
    {
        if user_id.is_nil() {
            return Err(LedgerError::invalid("user_id is required"));
        }

        let normalized: Vec<AccountDraft> = drafts.iter().map(|d| d.normalized(user_id)).collect();

        // First failure per index wins; the map keeps the report ordered.
        let mut item_errors: BTreeMap<usize, ItemError> = BTreeMap::new();
        for (i, draft) in normalized.iter().enumerate() {
            deadline.check()?;
            if let Err(err) = Self::validate_create(draft) {
                item_errors.insert(i, ItemError::validation(i, &err));
            }
        }
        if !item_errors.is_empty() {
            return Ok(EnsureBatchOutcome::Rejected(item_errors.into_values().collect()));
        }

        let mut currencies_seen = HashSet::new();
        for draft in &normalized {
            if currencies_seen.insert(draft.currency.clone()) {
                Self::ensure_opening_balance(store, deadline, user_id, &draft.currency)?;
            }
        }

        let existing = store.list_accounts(user_id, &AccountFilter::default())?;
        let mut claimed: HashMap<(String, Currency), usize> = HashMap::new();
        for (i, draft) in normalized.iter().enumerate() {
            let desired = (draft.path(), draft.currency.clone());
            if let Some(&prev) = claimed.get(&desired) {
                item_errors.entry(i).or_insert_with(|| ItemError::conflict(i));
                item_errors
                    .entry(prev)
                    .or_insert_with(|| ItemError::conflict(prev));
                continue;
            }
            claimed.insert(desired.clone(), i);
            if existing
                .iter()
                .any(|a| a.path() == desired.0 && a.currency == desired.1)
            {
                item_errors.insert(i, ItemError::conflict(i));
            }
        }
        if !item_errors.is_empty() {
            return Ok(EnsureBatchOutcome::Rejected(item_errors.into_values().collect()));
        }

        deadline.check()?;
        let mut batch = store.begin_batch()?;
        let mut created = Vec::with_capacity(normalized.len());
        for draft in &normalized {
            let account = Self::materialize(draft);
            batch.create_account(&account)?;
            created.push(account);
        }
        batch.commit()?;
        debug!(user_id = %user_id, count = created.len(), "account batch created");
        Ok(EnsureBatchOutcome::Created(created))
    }

    /// Applies a partial update. Renaming the path (group or vendor change)
    /// re-checks `(path, currency)` uniqueness against the user's other
    /// accounts. System accounts reject every update.
    pub fn update<S>(store: &S, deadline: &Deadline, patch: &AccountPatch) -> Result<Account>
    where
        S: LedgerReader + LedgerWriter + ?Sized,
    {
        deadline.check()?;
        if patch.user_id.is_nil() {
            return Err(LedgerError::invalid("user_id is required"));
        }
        if patch.account_id.is_nil() {
            return Err(LedgerError::invalid("account_id is required"));
        }

        let current = store.get_account(patch.user_id, patch.account_id)?;
        if current.system {
            return Err(LedgerError::SystemAccount);
        }
        if patch.account_type.is_some_and(|t| t != current.account_type) {
            return Err(LedgerError::Immutable);
        }
        if patch.currency.as_ref().is_some_and(|c| *c != current.currency) {
            return Err(LedgerError::Immutable);
        }
        if patch.system.is_some_and(|s| s != current.system) {
            return Err(LedgerError::Immutable);
        }

        let mut updated = current.clone();
        if let Some(name) = &patch.name {
            if name.is_empty() {
                return Err(LedgerError::invalid("name is required"));
            }
            updated.name = name.clone();
        }
        if let Some(group) = &patch.group {
            folio_types::slug::check_slug(&group.to_lowercase())?;
            updated.group = group.clone();
        }
        if let Some(vendor) = &patch.vendor {
            if vendor.is_empty() {
                return Err(LedgerError::invalid("vendor is required"));
            }
            updated.vendor = vendor.clone();
        }
        if let Some(meta_patch) = &patch.metadata {
            updated.metadata = current.metadata.merged(meta_patch)?;
        }

        if updated.path() != current.path() {
            let existing = store.list_accounts(patch.user_id, &AccountFilter::default())?;
            let desired = updated.path();
            if existing.iter().any(|a| {
                a.id != current.id && a.path() == desired && a.currency == current.currency
            }) {
                return Err(LedgerError::conflict("account path already exists for user"));
            }
        }

        store.update_account(&updated)?;
        debug!(account_id = %updated.id, path = %updated.path(), "account updated");
        Ok(updated)
    }

    /// Soft-deletes the account. History referencing it stays intact; it
    /// only stops being offered for new postings. Idempotent.
    pub fn deactivate<S>(
        store: &S,
        deadline: &Deadline,
        user_id: UserId,
        account_id: AccountId,
    ) -> Result<Account>
    where
        S: LedgerReader + LedgerWriter + ?Sized,
    {
        deadline.check()?;
        if user_id.is_nil() {
            return Err(LedgerError::invalid("user_id is required"));
        }
        if account_id.is_nil() {
            return Err(LedgerError::invalid("account_id is required"));
        }

        let mut account = store.get_account(user_id, account_id)?;
        if account.system {
            return Err(LedgerError::SystemAccount);
        }
        account.active = false;
        store.update_account(&account)?;
        debug!(account_id = %account.id, "account deactivated");
        Ok(account)
    }

    /// Lists the user's accounts, optionally narrowed by the filter.
    pub fn list<R>(
        reader: &R,
        deadline: &Deadline,
        user_id: UserId,
        filter: &AccountFilter,
    ) -> Result<Vec<Account>>
    where
        R: LedgerReader + ?Sized,
    {
        deadline.check()?;
        if user_id.is_nil() {
            return Err(LedgerError::invalid("user_id is required"));
        }
        reader.list_accounts(user_id, filter)
    }

    /// Builds the stored record for a validated draft. Equity accounts in
    /// the opening-balances group are forced onto the reserved system shape.
    fn materialize(draft: &AccountDraft) -> Account {
        let mut account = Account {
            id: AccountId::new(),
            user_id: draft.user_id,
            name: draft.name.clone(),
            account_type: draft.account_type,
            currency: draft.currency.clone(),
            group: draft.group.clone(),
            vendor: draft.vendor.clone(),
            system: draft.system,
            active: true,
            metadata: draft.metadata.clone(),
        };
        if account.account_type == AccountType::Equity
            && account.group.eq_ignore_ascii_case(OPENING_BALANCES_GROUP)
        {
            account.vendor = SYSTEM_VENDOR.to_string();
            account.system = true;
        }
        account
    }
}
