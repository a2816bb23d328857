use chrono::NaiveDate;

use crate::{
    Account, AccountSummary, EngineError, MovementFilter, Report, ReportParams, ReportTotals,
    ResultEngine, reports::DEFAULT_REPORT_TITLE, util::validate_id,
};

use super::{
    Engine, accounts::require_account, balances::balance_in, movements::select_movements,
    movements::validate_period,
};

/// Picks the listing a report runs on.
///
/// Priority: kind with a full range, kind alone, range alone, everything.
/// A range with a single bound counts as no range.
fn report_filter(params: &ReportParams, today: NaiveDate) -> ResultEngine<MovementFilter> {
    let range = params.from.zip(params.to);
    if let Some((from, to)) = range
        && from > to
    {
        return Err(EngineError::InvalidInput(
            "start date must not be after end date".to_string(),
        ));
    }

    let filter = match (params.kind, range) {
        (Some(kind), Some((from, to))) => MovementFilter::default().kind(kind).period(from, to),
        (Some(kind), None) => MovementFilter::default().kind(kind),
        (None, Some((from, to))) => {
            validate_period(from, to, today)?;
            MovementFilter::default().period(from, to)
        }
        (None, None) => MovementFilter::default(),
    };
    Ok(filter)
}

impl Engine {
    /// Builds a movement report for an account.
    ///
    /// Totals only count `COMPLETED` movements of the selection; the current
    /// balance ignores the filters.
    pub async fn build_report(&self, params: ReportParams, today: NaiveDate) -> ResultEngine<Report> {
        let account_id = validate_id(params.account_id)?;
        let filter = report_filter(&params, today)?;
        let account = Account::from(require_account(&self.database, account_id).await?);

        let movements = select_movements(&self.database, account_id, &filter).await?;
        let totals = ReportTotals::from_movements(&movements)?;
        let current_balance = balance_in(&self.database, account_id).await?;

        let title = params
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_REPORT_TITLE)
            .to_string();

        tracing::info!(
            account_id,
            movements = movements.len(),
            income = %totals.income,
            expense = %totals.expense,
            "report built"
        );

        Ok(Report {
            title,
            account: AccountSummary::from(&account),
            generated_on: today,
            movements,
            total_income: totals.income,
            total_expense: totals.expense,
            net: totals.net()?,
            current_balance,
            from: params.from,
            to: params.to,
            kind: params.kind,
            include_summary: params.include_summary,
        })
    }
}
