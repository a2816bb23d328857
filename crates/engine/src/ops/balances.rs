use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};

use crate::{MoneyCents, MovementKind, MovementStatus, ResultEngine, movements, util::validate_id};

use super::{Engine, accounts::require_account};

/// Completed income and expense of one account, summed by the database.
#[derive(Clone, Copy, Debug, Default)]
pub(super) struct CompletedTotals {
    income: MoneyCents,
    expense: MoneyCents,
}

impl CompletedTotals {
    pub(super) fn balance(self) -> ResultEngine<MoneyCents> {
        self.income.try_sub(self.expense)
    }

    /// Fails when one more completed `amount` of `kind` would push that
    /// kind's total past `i64`, which would make the database `SUM` fail.
    pub(super) fn ensure_room(self, kind: MovementKind, amount: MoneyCents) -> ResultEngine<()> {
        let total = match kind {
            MovementKind::Income => self.income,
            MovementKind::Expense => self.expense,
        };
        total.try_add(amount).map(|_| ())
    }
}

pub(super) async fn completed_totals<C: ConnectionTrait>(
    db: &C,
    account_id: i64,
) -> ResultEngine<CompletedTotals> {
    let rows: Vec<(String, Option<i64>)> = movements::Entity::find()
        .select_only()
        .column(movements::Column::Kind)
        .column_as(movements::Column::AmountMinor.sum(), "total")
        .filter(movements::Column::AccountId.eq(account_id))
        .filter(movements::Column::Status.eq(MovementStatus::Completed.as_str()))
        .group_by(movements::Column::Kind)
        .into_tuple()
        .all(db)
        .await?;

    let mut totals = CompletedTotals::default();
    for (kind, total) in rows {
        let total = MoneyCents::new(total.unwrap_or_default());
        match MovementKind::try_from(kind.as_str())? {
            MovementKind::Income => totals.income = total,
            MovementKind::Expense => totals.expense = total,
        }
    }
    Ok(totals)
}

/// Sum of completed incomes minus completed expenses, recomputed from the
/// movement rows on every call.
pub(super) async fn balance_in<C: ConnectionTrait>(db: &C, account_id: i64) -> ResultEngine<MoneyCents> {
    let balance = completed_totals(db, account_id).await?.balance()?;
    tracing::debug!(account_id, balance = %balance, "balance computed");
    Ok(balance)
}

impl Engine {
    /// Current balance of an account.
    ///
    /// Only `COMPLETED` movements count. Snapshot fields stored on movements
    /// are never used here.
    pub async fn current_balance(&self, account_id: i64) -> ResultEngine<MoneyCents> {
        let account_id = validate_id(account_id)?;
        require_account(&self.database, account_id).await?;
        balance_in(&self.database, account_id).await
    }
}
