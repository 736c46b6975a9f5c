//! Curated group vocabulary.
//!
//! A suggested set of groups per account type for pickers and seeders.
//! Nothing in the engine restricts groups to this list; any valid slug is
//! accepted. The one reserved code marks the group the engine provisions
//! itself.

use serde::Serialize;

use folio_types::AccountType;

use crate::entities::OPENING_BALANCES_GROUP;

/// One curated group suggestion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GroupDef {
    pub code: &'static str,
    pub label: &'static str,
    pub reserved: bool,
}

const fn def(code: &'static str, label: &'static str) -> GroupDef {
    GroupDef {
        code,
        label,
        reserved: false,
    }
}

const EQUITY_GROUPS: &[GroupDef] = &[
    GroupDef {
        code: OPENING_BALANCES_GROUP,
        label: "Opening Balances",
        reserved: true,
    },
    def("owner_equity", "Owner Equity"),
];

const ASSET_GROUPS: &[GroupDef] = &[
    def("bank", "Bank"),
    def("cash", "Cash"),
    def("wallet", "Wallet"),
    def("savings", "Savings"),
    def("investment", "Investment"),
    def("receivable", "Receivable"),
];

const LIABILITY_GROUPS: &[GroupDef] = &[
    def("credit_card", "Credit Card"),
    def("loan", "Loan"),
    def("payable", "Payable"),
];

const REVENUE_GROUPS: &[GroupDef] = &[
    def("salary", "Salary"),
    def("interest", "Interest"),
    def("refund", "Refund"),
    def("other_income", "Other Income"),
];

const EXPENSE_GROUPS: &[GroupDef] = &[
    def("groceries", "Groceries"),
    def("eating_out", "Eating Out"),
    def("rent", "Rent"),
    def("utilities", "Utilities"),
    def("transport", "Transport"),
    def("shopping", "Shopping"),
    def("entertainment", "Entertainment"),
    def("general", "General"),
];

fn curated(account_type: AccountType) -> &'static [GroupDef] {
    match account_type {
        AccountType::Asset => ASSET_GROUPS,
        AccountType::Liability => LIABILITY_GROUPS,
        AccountType::Equity => EQUITY_GROUPS,
        AccountType::Revenue => REVENUE_GROUPS,
        AccountType::Expense => EXPENSE_GROUPS,
    }
}

/// Curated groups for one type, or for every type in declaration order.
pub fn groups_for(account_type: Option<AccountType>) -> Vec<GroupDef> {
    match account_type {
        Some(ty) => curated(ty).to_vec(),
        None => AccountType::ALL
            .iter()
            .flat_map(|ty| curated(*ty).iter().copied())
            .collect(),
    }
}

/// Returns `true` if `group` is a reserved code for `account_type`.
pub fn is_reserved(account_type: AccountType, group: &str) -> bool {
    curated(account_type)
        .iter()
        .any(|g| g.code == group && g.reserved)
}
