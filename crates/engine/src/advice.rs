//! Savings advice.
//!
//! Advice text is produced by an [`Advisor`], an external collaborator the
//! engine only feeds with data. Advisor failures never become engine errors:
//! the engine logs them and answers with a fallback text instead.

use std::fmt::{self, Write as _};

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use crate::{Goal, GoalCmd, MoneyCents};

/// Months of completed movements averaged into a [`FinancialSnapshot`].
pub const SNAPSHOT_MONTHS: u32 = 3;

#[derive(Debug, Error)]
pub enum AdviceError {
    #[error("advisor unavailable: {0}")]
    Unavailable(String),
}

/// Financial position of an account as seen by an advisor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FinancialSnapshot {
    pub as_of: NaiveDate,
    /// Average monthly completed income over the analysed months.
    pub monthly_income: MoneyCents,
    /// Average monthly completed expense over the analysed months.
    pub monthly_expense: MoneyCents,
    pub balance: MoneyCents,
    pub months_analyzed: u32,
}

impl FinancialSnapshot {
    /// What is left each month after expenses.
    #[must_use]
    pub fn monthly_capacity(&self) -> MoneyCents {
        self.monthly_income.saturating_sub(self.monthly_expense)
    }
}

/// Advice text plus whether it is a fallback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Advice {
    pub text: String,
    pub degraded: bool,
}

/// Turns goals and a financial snapshot into advice text.
pub trait Advisor: Send + Sync + fmt::Debug {
    fn generate_plan(&self, goal: &Goal, snapshot: &FinancialSnapshot) -> Result<String, AdviceError>;

    fn analyze_viability(&self, draft: &GoalCmd, snapshot: &FinancialSnapshot) -> Result<String, AdviceError>;

    fn suggest_optimizations(&self, goals: &[Goal], snapshot: &FinancialSnapshot) -> Result<String, AdviceError>;
}

/// Whole calendar months from `from` to `to`; a partial month does not count.
#[must_use]
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let mut months = i64::from(to.year() - from.year()) * 12 + i64::from(to.month()) - i64::from(from.month());
    if months > 0 && to.day() < from.day() {
        months -= 1;
    } else if months < 0 && to.day() > from.day() {
        months += 1;
    }
    months
}

/// Monthly amount needed to close `remaining` by `end_date`, rounded up to
/// the cent. With no whole month left the full remaining amount is due.
#[must_use]
pub fn required_monthly_saving(remaining: MoneyCents, as_of: NaiveDate, end_date: NaiveDate) -> MoneyCents {
    let months = months_between(as_of, end_date);
    if months <= 0 {
        return remaining;
    }
    remaining.div_ceil(months).unwrap_or(remaining)
}

/// Share of the monthly income a saving takes, in percent with one decimal.
fn income_commitment(saving: MoneyCents, income: MoneyCents) -> Option<String> {
    if !income.is_positive() {
        return None;
    }
    let tenths = (i128::from(saving.cents()) * 1000 + i128::from(income.cents()) / 2) / i128::from(income.cents());
    Some(format!("{}.{}%", tenths / 10, tenths % 10))
}

/// Deterministic advisor rendering Markdown from templates.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateAdvisor;

impl Advisor for TemplateAdvisor {
    fn generate_plan(&self, goal: &Goal, snapshot: &FinancialSnapshot) -> Result<String, AdviceError> {
        let monthly = required_monthly_saving(goal.remaining(), snapshot.as_of, goal.end_date);
        let mut out = String::new();
        let _ = writeln!(out, "# Action plan: {}", goal.name);
        let _ = writeln!(out);
        let _ = writeln!(out, "## Goal");
        let _ = writeln!(out, "- Target: {}", goal.target);
        let _ = writeln!(out, "- Saved: {} ({}%)", goal.current, goal.percentage);
        let _ = writeln!(out, "- Required monthly saving: {monthly}");
        let _ = writeln!(out, "- Deadline: {}", goal.end_date.format("%Y-%m-%d"));
        let _ = writeln!(out);
        write_position(&mut out, snapshot);
        let _ = writeln!(out);
        let _ = writeln!(out, "## Recommendations");
        if monthly <= snapshot.monthly_capacity() {
            let _ = writeln!(out, "1. Set up an automatic monthly transfer of {monthly}.");
            let _ = writeln!(out, "2. Review progress at the end of every month.");
        } else {
            let _ = writeln!(
                out,
                "1. The required saving exceeds the monthly capacity by {}.",
                monthly.saturating_sub(snapshot.monthly_capacity())
            );
            let _ = writeln!(out, "2. Cut discretionary expenses or move the deadline.");
        }
        Ok(out)
    }

    fn analyze_viability(&self, draft: &GoalCmd, snapshot: &FinancialSnapshot) -> Result<String, AdviceError> {
        let monthly = required_monthly_saving(draft.target, snapshot.as_of, draft.end_date);
        let viable = monthly <= snapshot.monthly_capacity();
        let mut out = String::new();
        let _ = writeln!(out, "# Viability: {}", draft.name.trim());
        let _ = writeln!(out);
        let _ = writeln!(out, "## Goal");
        let _ = writeln!(out, "- Target: {}", draft.target);
        let _ = writeln!(out, "- Required monthly saving: {monthly}");
        let _ = writeln!(
            out,
            "- Period: {} to {}",
            draft.start_date.format("%Y-%m-%d"),
            draft.end_date.format("%Y-%m-%d")
        );
        let _ = writeln!(out);
        write_position(&mut out, snapshot);
        let _ = writeln!(out);
        let _ = writeln!(out, "## Assessment");
        let _ = writeln!(out, "- Viable: {}", if viable { "yes" } else { "no" });
        if let Some(share) = income_commitment(monthly, snapshot.monthly_income) {
            let _ = writeln!(out, "- Income committed: {share}");
        }
        let _ = writeln!(
            out,
            "- Recommendation: {}",
            if viable {
                "the goal is reachable with discipline"
            } else {
                "lower the target or raise the saving capacity"
            }
        );
        Ok(out)
    }

    fn suggest_optimizations(&self, goals: &[Goal], snapshot: &FinancialSnapshot) -> Result<String, AdviceError> {
        let mut out = String::new();
        let _ = writeln!(out, "# Optimization suggestions");
        let _ = writeln!(out);
        let _ = writeln!(out, "## Active goals");
        if goals.is_empty() {
            let _ = writeln!(out, "- none");
        }
        let mut total_monthly = MoneyCents::ZERO;
        for goal in goals {
            let monthly = required_monthly_saving(goal.remaining(), snapshot.as_of, goal.end_date);
            total_monthly = total_monthly.saturating_add(monthly);
            let _ = writeln!(
                out,
                "- {}: {} / {} ({}%), {monthly} per month",
                goal.name, goal.current, goal.target, goal.percentage
            );
        }
        let _ = writeln!(out);
        write_position(&mut out, snapshot);
        let _ = writeln!(out);
        let _ = writeln!(out, "## Strategy");
        if total_monthly > snapshot.monthly_capacity() {
            let _ = writeln!(
                out,
                "- Goals need {total_monthly} per month, above the capacity of {}. Prioritize the closest deadlines.",
                snapshot.monthly_capacity()
            );
        } else {
            let _ = writeln!(
                out,
                "- Goals need {total_monthly} per month and fit the capacity of {}.",
                snapshot.monthly_capacity()
            );
        }
        let _ = writeln!(out, "- Follow the 50/30/20 split between needs, wants and savings.");
        Ok(out)
    }
}

fn write_position(out: &mut String, snapshot: &FinancialSnapshot) {
    let _ = writeln!(out, "## Financial position (last {} months)", snapshot.months_analyzed);
    let _ = writeln!(out, "- Monthly income: {}", snapshot.monthly_income);
    let _ = writeln!(out, "- Monthly expense: {}", snapshot.monthly_expense);
    let _ = writeln!(out, "- Saving capacity: {}", snapshot.monthly_capacity());
    let _ = writeln!(out, "- Balance: {}", snapshot.balance);
}

/// Text returned when the advisor fails.
pub(crate) fn fallback_text(snapshot: &FinancialSnapshot) -> String {
    format!(
        "Advice is temporarily unavailable. Monthly saving capacity: {}. Balance: {}.",
        snapshot.monthly_capacity(),
        snapshot.balance
    )
}
