//! Balance computation: trial balance, single-account balance, and the
//! paginated account ledger with running balances.
//!
//! Balances are always derived by replaying entries; nothing is cached.
//! A net is positive when debits exceed credits, so asset and expense
//! accounts normally sit positive and liability, equity, and revenue
//! accounts negative.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use folio_types::{AccountId, AccountType, Currency, Deadline, EntryId, LineId, Money, Side, UserId};

use crate::cursor::{clamp_limit, Cursor};
use crate::error::{LedgerError, Result};
use crate::traits::LedgerReader;

/// One account's row in a trial balance report. The net lands in exactly
/// one of the two columns.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrialBalanceRow {
    pub account_id: AccountId,
    pub name: String,
    pub path: String,
    pub account_type: AccountType,
    pub debit_minor: i64,
    pub credit_minor: i64,
}

/// Trial balance rows of a single currency, sorted by account path.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrialBalanceGroup {
    pub currency: Currency,
    pub rows: Vec<TrialBalanceRow>,
}

/// Window and page selection for [`BalanceEngine::account_ledger`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    /// Opaque token from a previous page's `next_cursor`.
    pub cursor: Option<String>,
}

/// One ledger row: a posted line and the account balance after it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub entry_id: EntryId,
    pub line_id: LineId,
    pub date: DateTime<Utc>,
    pub memo: String,
    pub side: Side,
    pub amount_minor: i64,
    pub running_balance_minor: i64,
}

/// A page of ledger rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerPage {
    pub account_id: AccountId,
    pub currency: Currency,
    pub records: Vec<LedgerRecord>,
    /// Present only when rows remain past this page.
    pub next_cursor: Option<String>,
}

/// Derives balances and ledger views from stored entries.
pub struct BalanceEngine;

impl BalanceEngine {
    /// Net minor units per account over entries dated up to `as_of`
    /// (every entry when `None`). Debits add, credits subtract. Accounts
    /// netting to zero are omitted, so an empty map means "all square".
    ///
    /// Nets are per account and each account has one currency; nothing is
    /// netted across currencies.
    pub fn trial_balance<R>(
        reader: &R,
        deadline: &Deadline,
        user_id: UserId,
        as_of: Option<DateTime<Utc>>,
    ) -> Result<BTreeMap<AccountId, i64>>
    where
        R: LedgerReader + ?Sized,
    {
        deadline.check()?;
        let entries = reader.list_entries(user_id)?;

        let mut nets: BTreeMap<AccountId, i128> = BTreeMap::new();
        for entry in &entries {
            deadline.check()?;
            if let Some(bound) = as_of {
                if entry.date > bound {
                    continue;
                }
            }
            for line in entry.lines.iter() {
                *nets.entry(line.account_id).or_default() +=
                    i128::from(line.side.sign()) * i128::from(line.amount_minor);
            }
        }

        let mut out = BTreeMap::new();
        for (account_id, net) in nets {
            if net == 0 {
                continue;
            }
            let net = i64::try_from(net)
                .map_err(|_| LedgerError::invalid("account net overflows i64"))?;
            out.insert(account_id, net);
        }
        Ok(out)
    }

    /// Trial balance grouped per currency, row per account, the net split
    /// into debit and credit columns. Rows sort by path, groups by
    /// currency code.
    pub fn trial_balance_report<R>(
        reader: &R,
        deadline: &Deadline,
        user_id: UserId,
        as_of: Option<DateTime<Utc>>,
    ) -> Result<Vec<TrialBalanceGroup>>
    where
        R: LedgerReader + ?Sized,
    {
        let nets = Self::trial_balance(reader, deadline, user_id, as_of)?;
        let ids: Vec<AccountId> = nets.keys().copied().collect();

        deadline.check()?;
        let accounts = reader.accounts_by_ids(user_id, &ids)?;

        let mut groups: BTreeMap<Currency, Vec<TrialBalanceRow>> = BTreeMap::new();
        for (account_id, net) in &nets {
            let Some(account) = accounts.get(account_id) else {
                continue;
            };
            let (debit_minor, credit_minor) = if *net >= 0 { (*net, 0) } else { (0, -net) };
            groups
                .entry(account.currency.clone())
                .or_default()
                .push(TrialBalanceRow {
                    account_id: *account_id,
                    name: account.name.clone(),
                    path: account.path(),
                    account_type: account.account_type,
                    debit_minor,
                    credit_minor,
                });
        }

        Ok(groups
            .into_iter()
            .map(|(currency, mut rows)| {
                rows.sort_by(|a, b| a.path.cmp(&b.path));
                TrialBalanceGroup { currency, rows }
            })
            .collect())
    }

    /// Signed net balance of one account over entries dated up to `as_of`.
    ///
    /// The currency comes from the account record, so an account with no
    /// lines yet reports a stable zero in its own currency. `NotFound`
    /// covers a missing account and one owned by another user.
    pub fn account_balance<R>(
        reader: &R,
        deadline: &Deadline,
        user_id: UserId,
        account_id: AccountId,
        as_of: Option<DateTime<Utc>>,
    ) -> Result<Money>
    where
        R: LedgerReader + ?Sized,
    {
        deadline.check()?;
        let account = reader.get_account(user_id, account_id)?;
        let entries = reader.list_entries(user_id)?;

        let mut net: i128 = 0;
        for entry in &entries {
            deadline.check()?;
            if let Some(bound) = as_of {
                if entry.date > bound {
                    continue;
                }
            }
            for line in entry.lines.iter() {
                if line.account_id == account_id {
                    net += i128::from(line.side.sign()) * i128::from(line.amount_minor);
                }
            }
        }

        let net =
            i64::try_from(net).map_err(|_| LedgerError::invalid("account net overflows i64"))?;
        Ok(Money::new(account.currency, net))
    }

    /// The account's lines ascending by `(date, entry id, line id)`, each
    /// with the balance after it, windowed to `[from, to]` and paged.
    ///
    /// Running balances replay the account's full history from zero, so a
    /// window or a resumed page shows the same figure a full scan would: the
    /// balance after the final record always equals
    /// [`BalanceEngine::account_balance`] with no bound.
    pub fn account_ledger<R>(
        reader: &R,
        deadline: &Deadline,
        user_id: UserId,
        account_id: AccountId,
        query: &LedgerQuery,
    ) -> Result<LedgerPage>
    where
        R: LedgerReader + ?Sized,
    {
        deadline.check()?;
        let account = reader.get_account(user_id, account_id)?;
        let cursor = query.cursor.as_deref().map(Cursor::decode).transpose()?;
        let limit = clamp_limit(query.limit);

        let entries = reader.list_entries(user_id)?;

        // Full history first: running balances must include lines before
        // the window.
        let mut all: Vec<LedgerRecord> = Vec::new();
        for entry in &entries {
            deadline.check()?;
            for line in entry.lines.iter() {
                if line.account_id != account_id {
                    continue;
                }
                all.push(LedgerRecord {
                    entry_id: entry.id,
                    line_id: line.id,
                    date: entry.date,
                    memo: entry.memo.clone(),
                    side: line.side,
                    amount_minor: line.amount_minor,
                    running_balance_minor: 0,
                });
            }
        }
        all.sort_by(|a, b| {
            (a.date, a.entry_id.as_uuid(), a.line_id.as_uuid()).cmp(&(
                b.date,
                b.entry_id.as_uuid(),
                b.line_id.as_uuid(),
            ))
        });

        let mut running: i128 = 0;
        for record in &mut all {
            running += i128::from(record.side.sign()) * i128::from(record.amount_minor);
            record.running_balance_minor = i64::try_from(running)
                .map_err(|_| LedgerError::invalid("account net overflows i64"))?;
        }

        let windowed: Vec<LedgerRecord> = all
            .into_iter()
            .filter(|r| {
                query.from.map_or(true, |from| r.date >= from)
                    && query.to.map_or(true, |to| r.date <= to)
            })
            .collect();

        let start = match cursor {
            None => 0,
            Some(c) => {
                match windowed
                    .iter()
                    .position(|r| r.date == c.ts && *r.line_id.as_uuid() == c.id)
                {
                    Some(i) => i + 1,
                    // anchor vanished: resume at the first later date
                    None => windowed.partition_point(|r| r.date <= c.ts),
                }
            }
        };

        let end = (start + limit).min(windowed.len());
        let next_cursor = if end < windowed.len() && start < end {
            let last = &windowed[end - 1];
            Some(Cursor::new(last.date, *last.line_id.as_uuid()).encode())
        } else {
            None
        };

        Ok(LedgerPage {
            account_id,
            currency: account.currency,
            records: windowed[start..end].to_vec(),
            next_cursor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    use folio_types::{Category, Metadata};

    use crate::entities::Account;
    use crate::memory::InMemoryLedger;
    use crate::posting::PostingEngine;
    use crate::validation::{EntryDraft, LineDraft};

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

    fn date(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 0, 0, 0).unwrap()
    }

    fn post(
        store: &InMemoryLedger,
        user_id: UserId,
        day: u32,
        currency: &str,
        debit: AccountId,
        credit: AccountId,
        amount: i64,
    ) -> crate::entities::JournalEntry {
        let draft = EntryDraft {
            user_id,
            date: date(day),
            currency: Currency::new(currency).unwrap(),
            memo: format!("day {day}"),
            category: Category::default(),
            metadata: Metadata::new(),
            lines: vec![
                LineDraft {
                    account_id: debit,
                    side: Side::Debit,
                    amount_minor: amount,
                },
                LineDraft {
                    account_id: credit,
                    side: Side::Credit,
                    amount_minor: amount,
                },
            ],
        };
        PostingEngine::post(store, &Deadline::none(), &draft).unwrap()
    }

    fn seeded() -> (InMemoryLedger, UserId, AccountId, AccountId) {
        let store = InMemoryLedger::new();
        let user_id = UserId::new();
        let cash = account(user_id, AccountType::Asset, "bank", "Cash", "USD");
        let income = account(user_id, AccountType::Revenue, "salary", "Employer", "USD");
        let (cash_id, income_id) = (cash.id, income.id);
        store.seed_account(cash);
        store.seed_account(income);
        (store, user_id, cash_id, income_id)
    }

    #[test]
    fn trial_balance_nets_debit_positive() {
        let (store, user_id, cash, income) = seeded();
        post(&store, user_id, 1, "USD", cash, income, 1500);

        let nets = BalanceEngine::trial_balance(&store, &Deadline::none(), user_id, None).unwrap();
        assert_eq!(nets.get(&cash), Some(&1500));
        assert_eq!(nets.get(&income), Some(&-1500));
    }

    #[test]
    fn reversal_nets_to_zero_and_is_omitted() {
        let (store, user_id, cash, income) = seeded();
        let entry = post(&store, user_id, 1, "USD", cash, income, 1500);
        PostingEngine::reverse_entry(&store, &Deadline::none(), user_id, entry.id, date(2))
            .unwrap();

        let nets = BalanceEngine::trial_balance(&store, &Deadline::none(), user_id, None).unwrap();
        assert!(nets.is_empty());
    }

    #[test]
    fn trial_balance_respects_as_of() {
        let (store, user_id, cash, income) = seeded();
        post(&store, user_id, 1, "USD", cash, income, 100);
        post(&store, user_id, 5, "USD", cash, income, 900);

        let nets = BalanceEngine::trial_balance(&store, &Deadline::none(), user_id, Some(date(3)))
            .unwrap();
        assert_eq!(nets.get(&cash), Some(&100));
    }

    #[test]
    fn report_splits_columns_and_groups_by_currency() {
        let (store, user_id, cash, income) = seeded();
        let eur_cash = account(user_id, AccountType::Asset, "bank", "Euro Cash", "EUR");
        let eur_income = account(user_id, AccountType::Revenue, "salary", "Euro Inc", "EUR");
        let (eur_cash_id, eur_income_id) = (eur_cash.id, eur_income.id);
        store.seed_account(eur_cash);
        store.seed_account(eur_income);

        post(&store, user_id, 1, "USD", cash, income, 1500);
        post(&store, user_id, 2, "EUR", eur_cash_id, eur_income_id, 700);

        let report =
            BalanceEngine::trial_balance_report(&store, &Deadline::none(), user_id, None).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].currency.as_str(), "EUR");
        assert_eq!(report[1].currency.as_str(), "USD");

        let usd = &report[1];
        let cash_row = usd.rows.iter().find(|r| r.account_id == cash).unwrap();
        assert_eq!((cash_row.debit_minor, cash_row.credit_minor), (1500, 0));
        let income_row = usd.rows.iter().find(|r| r.account_id == income).unwrap();
        assert_eq!((income_row.debit_minor, income_row.credit_minor), (0, 1500));

        let paths: Vec<&str> = usd.rows.iter().map(|r| r.path.as_str()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }

    #[test]
    fn account_balance_uses_account_currency() {
        let (store, user_id, cash, income) = seeded();
        post(&store, user_id, 1, "USD", cash, income, 1500);

        let balance =
            BalanceEngine::account_balance(&store, &Deadline::none(), user_id, income, None)
                .unwrap();
        assert_eq!(balance.minor_units, -1500);
        assert_eq!(balance.currency.as_str(), "USD");
    }

    #[test]
    fn account_balance_zero_for_untouched_account() {
        let (store, user_id, cash, _) = seeded();
        let balance =
            BalanceEngine::account_balance(&store, &Deadline::none(), user_id, cash, None).unwrap();
        assert!(balance.is_zero());
        assert_eq!(balance.currency.as_str(), "USD");
    }

    #[test]
    fn account_balance_not_found_for_foreign_account() {
        let (store, _, cash, _) = seeded();
        let stranger = UserId::new();
        let err = BalanceEngine::account_balance(&store, &Deadline::none(), stranger, cash, None)
            .unwrap_err();
        assert_eq!(err, LedgerError::NotFound);
    }

    #[test]
    fn ledger_running_balance_tracks_history() {
        let (store, user_id, cash, income) = seeded();
        post(&store, user_id, 1, "USD", cash, income, 1000);
        post(&store, user_id, 2, "USD", cash, income, 250);
        post(&store, user_id, 3, "USD", income, cash, 400);

        let page = BalanceEngine::account_ledger(
            &store,
            &Deadline::none(),
            user_id,
            cash,
            &LedgerQuery::default(),
        )
        .unwrap();

        let balances: Vec<i64> = page
            .records
            .iter()
            .map(|r| r.running_balance_minor)
            .collect();
        assert_eq!(balances, vec![1000, 1250, 850]);
        assert_eq!(page.next_cursor, None);

        let unbounded =
            BalanceEngine::account_balance(&store, &Deadline::none(), user_id, cash, None).unwrap();
        assert_eq!(balances.last().copied().unwrap(), unbounded.minor_units);
    }

    #[test]
    fn ledger_window_keeps_prior_history_in_balances() {
        let (store, user_id, cash, income) = seeded();
        post(&store, user_id, 1, "USD", cash, income, 1000);
        post(&store, user_id, 5, "USD", cash, income, 200);

        let query = LedgerQuery {
            from: Some(date(4)),
            ..LedgerQuery::default()
        };
        let page = BalanceEngine::account_ledger(&store, &Deadline::none(), user_id, cash, &query)
            .unwrap();

        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].running_balance_minor, 1200);
    }

    #[test]
    fn ledger_pagination_scans_every_record_once() {
        let (store, user_id, cash, income) = seeded();
        for day in 1..=7 {
            post(&store, user_id, day, "USD", cash, income, 100);
        }

        let mut seen: Vec<LineId> = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let query = LedgerQuery {
                limit: Some(3),
                cursor: cursor.clone(),
                ..LedgerQuery::default()
            };
            let page =
                BalanceEngine::account_ledger(&store, &Deadline::none(), user_id, cash, &query)
                    .unwrap();
            assert!(page.records.len() <= 3);
            seen.extend(page.records.iter().map(|r| r.line_id));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        assert_eq!(seen.len(), 7);
        let mut deduped = seen.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), 7);

        let full = BalanceEngine::account_ledger(
            &store,
            &Deadline::none(),
            user_id,
            cash,
            &LedgerQuery::default(),
        )
        .unwrap();
        let full_ids: Vec<LineId> = full.records.iter().map(|r| r.line_id).collect();
        assert_eq!(seen, full_ids);
    }

    #[test]
    fn ledger_rejects_malformed_cursor() {
        let (store, user_id, cash, _) = seeded();
        let query = LedgerQuery {
            cursor: Some("not-hex".to_string()),
            ..LedgerQuery::default()
        };
        let err = BalanceEngine::account_ledger(&store, &Deadline::none(), user_id, cash, &query)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Invalid { .. }));
    }

    #[test]
    fn expired_deadline_stops_balance_reads() {
        let (store, user_id, cash, _) = seeded();
        let expired = Deadline::at(Utc::now() - chrono::Duration::seconds(1));
        let err = BalanceEngine::account_balance(&store, &expired, user_id, cash, None)
            .unwrap_err();
        assert_eq!(err, LedgerError::DeadlineExceeded);
    }

    proptest! {
        #[test]
        fn random_postings_net_to_zero_and_match_the_ledger(
            moves in prop::collection::vec((1i64..=100_000, 1u32..=28, any::<bool>()), 1..40),
        ) {
            let (store, user_id, cash, income) = seeded();
            let count = moves.len();
            for (amount, day, flipped) in moves {
                let (debit, credit) = if flipped { (income, cash) } else { (cash, income) };
                post(&store, user_id, day, "USD", debit, credit, amount);
            }

            let nets =
                BalanceEngine::trial_balance(&store, &Deadline::none(), user_id, None).unwrap();
            let total: i128 = nets.values().map(|&n| i128::from(n)).sum();
            prop_assert_eq!(total, 0);

            let page = BalanceEngine::account_ledger(
                &store,
                &Deadline::none(),
                user_id,
                cash,
                &LedgerQuery::default(),
            )
            .unwrap();
            let balance =
                BalanceEngine::account_balance(&store, &Deadline::none(), user_id, cash, None)
                    .unwrap();
            prop_assert_eq!(page.records.len(), count);
            let last = page.records.last().unwrap();
            prop_assert_eq!(last.running_balance_minor, balance.minor_units);
        }
    }
}
