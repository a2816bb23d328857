//! Conversions between engine values and wire bodies.

use api_types::{
    account::AccountView,
    goal::{AdviceView, GoalView},
    movement::{ImportView, MovementView},
    report::{ReportAccount, ReportView},
};
use engine::{Account, Advice, Goal, ImportSummary, Movement, Report};

use crate::ServerError;

/// Unwraps a field the request must carry.
pub(crate) fn required<T>(value: Option<T>, field: &str) -> Result<T, ServerError> {
    value.ok_or_else(|| ServerError::Generic(format!("{field} is required")))
}

/// Parses a symbolic enum field (`"INCOME"`, `"PAUSED"`, ...).
pub(crate) fn symbolic<T>(value: Option<&str>, field: &str) -> Result<T, ServerError>
where
    T: for<'a> TryFrom<&'a str, Error = engine::EngineError>,
{
    let value = required(value, field)?;
    Ok(T::try_from(value)?)
}

/// Parses an optional symbolic enum field.
pub(crate) fn symbolic_opt<T>(value: Option<&str>) -> Result<Option<T>, ServerError>
where
    T: for<'a> TryFrom<&'a str, Error = engine::EngineError>,
{
    value.map(T::try_from).transpose().map_err(ServerError::from)
}

pub(crate) fn account_view(account: Account) -> AccountView {
    AccountView {
        id: account.id,
        bank: account.bank,
        agency: account.agency,
        account_number: account.account_number,
        account_kind: account.account_kind,
        holder: account.holder,
    }
}

pub(crate) fn movement_view(movement: Movement) -> MovementView {
    MovementView {
        id: movement.id,
        account_id: movement.account_id,
        kind: movement.kind.as_str().to_string(),
        amount_minor: movement.amount.cents(),
        description: movement.description,
        category: movement.category.as_str().to_string(),
        movement_date: movement.movement_date,
        registered_at: movement.registered_at,
        status: movement.status.as_str().to_string(),
        source: movement.source.as_str().to_string(),
        notes: movement.notes,
        prior_balance_minor: movement.prior_balance.cents(),
        resulting_balance_minor: movement.resulting_balance.cents(),
        origin_file: movement.origin_file,
        external_id: movement.external_id,
    }
}

pub(crate) fn movement_views(movements: Vec<Movement>) -> Vec<MovementView> {
    movements.into_iter().map(movement_view).collect()
}

pub(crate) fn import_view(summary: ImportSummary) -> ImportView {
    ImportView {
        imported: movement_views(summary.imported),
        skipped: summary.skipped,
    }
}

pub(crate) fn report_view(report: Report) -> ReportView {
    ReportView {
        title: report.title,
        account: ReportAccount {
            account_id: report.account.account_id,
            bank: report.account.bank,
            agency: report.account.agency,
            account_number: report.account.account_number,
            holder: report.account.holder,
        },
        generated_on: report.generated_on,
        movements: movement_views(report.movements),
        total_income_minor: report.total_income.cents(),
        total_expense_minor: report.total_expense.cents(),
        net_minor: report.net.cents(),
        current_balance_minor: report.current_balance.cents(),
        from: report.from,
        to: report.to,
        kind: report.kind.map(|kind| kind.as_str().to_string()),
        include_summary: report.include_summary,
    }
}

pub(crate) fn goal_view(goal: Goal) -> GoalView {
    GoalView {
        id: goal.id,
        account_id: goal.account_id,
        name: goal.name,
        description: goal.description,
        kind: goal.kind.as_str().to_string(),
        target_minor: goal.target.cents(),
        current_minor: goal.current.cents(),
        percentage: goal.percentage.to_string(),
        start_date: goal.start_date,
        end_date: goal.end_date,
        status: goal.status.as_str().to_string(),
        registered_at: goal.registered_at,
        notes: goal.notes,
    }
}

pub(crate) fn goal_views(goals: Vec<Goal>) -> Vec<GoalView> {
    goals.into_iter().map(goal_view).collect()
}

pub(crate) fn advice_view(advice: Advice) -> AdviceView {
    AdviceView {
        text: advice.text,
        degraded: advice.degraded,
    }
}
