//! Movement reports.
//!
//! A [`Report`] is the data handed to an external renderer: the selected
//! movements, their completed totals and the account's live balance.

use chrono::NaiveDate;

use crate::{Account, MoneyCents, Movement, MovementKind, MovementStatus, ResultEngine};

pub const DEFAULT_REPORT_TITLE: &str = "Financial movements report";

/// Identification fields of the reported account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountSummary {
    pub account_id: i64,
    pub bank: String,
    pub agency: String,
    pub account_number: String,
    pub holder: String,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.id,
            bank: account.bank.clone(),
            agency: account.agency.clone(),
            account_number: account.account_number.clone(),
            holder: account.holder.clone(),
        }
    }
}

/// Completed income and expense of a movement selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReportTotals {
    pub income: MoneyCents,
    pub expense: MoneyCents,
}

impl ReportTotals {
    /// Sums `COMPLETED` movements only.
    pub fn from_movements(movements: &[Movement]) -> ResultEngine<Self> {
        movements
            .iter()
            .filter(|m| m.status == MovementStatus::Completed)
            .try_fold(Self::default(), |mut totals, m| {
                match m.kind {
                    MovementKind::Income => totals.income = totals.income.try_add(m.amount)?,
                    MovementKind::Expense => totals.expense = totals.expense.try_add(m.amount)?,
                }
                Ok(totals)
            })
    }

    pub fn net(&self) -> ResultEngine<MoneyCents> {
        self.income.try_sub(self.expense)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub title: String,
    pub account: AccountSummary,
    pub generated_on: NaiveDate,
    pub movements: Vec<Movement>,
    pub total_income: MoneyCents,
    pub total_expense: MoneyCents,
    pub net: MoneyCents,
    /// Unfiltered balance of the account.
    pub current_balance: MoneyCents,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub kind: Option<MovementKind>,
    pub include_summary: bool,
}
