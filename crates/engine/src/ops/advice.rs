use chrono::{Months, NaiveDate};

use crate::{
    Advice, AdviceError, EngineError, FinancialSnapshot, GoalCmd, MoneyCents, MovementFilter,
    MovementStatus, ReportTotals, ResultEngine,
    advice::{SNAPSHOT_MONTHS, fallback_text},
    util::{require_positive, validate_id},
};

use super::{
    Engine, accounts::require_account, balances::balance_in, goals::require_goal,
    movements::select_movements,
};

/// Replaces an advisor failure by the fallback text.
fn degrade(
    outcome: Result<String, AdviceError>,
    snapshot: &FinancialSnapshot,
    request: &str,
) -> Advice {
    match outcome {
        Ok(text) => Advice {
            text,
            degraded: false,
        },
        Err(err) => {
            tracing::warn!(request, error = %err, "advisor failed, using fallback text");
            Advice {
                text: fallback_text(snapshot),
                degraded: true,
            }
        }
    }
}

impl Engine {
    /// Average monthly completed income and expense over the last
    /// [`SNAPSHOT_MONTHS`] months, plus the live balance.
    pub async fn financial_snapshot(
        &self,
        account_id: i64,
        today: NaiveDate,
    ) -> ResultEngine<FinancialSnapshot> {
        let account_id = validate_id(account_id)?;
        require_account(&self.database, account_id).await?;

        let from = today
            .checked_sub_months(Months::new(SNAPSHOT_MONTHS))
            .unwrap_or(NaiveDate::MIN);
        let filter = MovementFilter::default()
            .status(MovementStatus::Completed)
            .period(from, today);
        let movements = select_movements(&self.database, account_id, &filter).await?;
        let totals = ReportTotals::from_movements(&movements)?;
        let months = i64::from(SNAPSHOT_MONTHS);

        Ok(FinancialSnapshot {
            as_of: today,
            monthly_income: MoneyCents::new(totals.income.cents() / months),
            monthly_expense: MoneyCents::new(totals.expense.cents() / months),
            balance: balance_in(&self.database, account_id).await?,
            months_analyzed: SNAPSHOT_MONTHS,
        })
    }

    /// Action plan for an existing goal.
    pub async fn goal_plan(&self, goal_id: i64, today: NaiveDate) -> ResultEngine<Advice> {
        let goal_id = validate_id(goal_id)?;
        let goal = require_goal(&self.database, goal_id).await?;
        let snapshot = self.financial_snapshot(goal.account_id, today).await?;
        let outcome = self.advisor.generate_plan(&goal, &snapshot);
        Ok(degrade(outcome, &snapshot, "goal plan"))
    }

    /// Viability of a goal that has not been created yet.
    pub async fn goal_viability(&self, draft: GoalCmd, today: NaiveDate) -> ResultEngine<Advice> {
        require_positive(draft.target, "target amount")?;
        if draft.start_date > draft.end_date {
            return Err(EngineError::InvalidInput(
                "start date must not be after end date".to_string(),
            ));
        }
        let snapshot = self.financial_snapshot(draft.account_id, today).await?;
        let outcome = self.advisor.analyze_viability(&draft, &snapshot);
        Ok(degrade(outcome, &snapshot, "goal viability"))
    }

    /// Suggestions across the account's active goals.
    pub async fn optimization_suggestions(
        &self,
        account_id: i64,
        today: NaiveDate,
    ) -> ResultEngine<Advice> {
        let snapshot = self.financial_snapshot(account_id, today).await?;
        let goals = self.active_goals(account_id).await?;
        let outcome = self.advisor.suggest_optimizations(&goals, &snapshot);
        Ok(degrade(outcome, &snapshot, "optimization suggestions"))
    }
}
