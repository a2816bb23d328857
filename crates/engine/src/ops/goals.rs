use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};

use crate::{
    EngineError, Goal, GoalCmd, GoalEvent, GoalKind, GoalStatus, MoneyCents, ResultEngine, goals,
    util::{normalize_optional_text, normalize_required_text, require_positive, validate_id},
};

use super::{Engine, accounts::require_account, integrity_checked, with_tx};

pub(super) struct GoalFields {
    pub(super) account_id: i64,
    pub(super) name: String,
    pub(super) description: Option<String>,
    pub(super) kind: GoalKind,
    pub(super) target: MoneyCents,
    pub(super) start_date: NaiveDate,
    pub(super) end_date: NaiveDate,
    pub(super) notes: Option<String>,
}

pub(super) fn normalize_goal(cmd: &GoalCmd, today: NaiveDate) -> ResultEngine<GoalFields> {
    let name = normalize_required_text(&cmd.name, "name")?;
    let account_id = validate_id(cmd.account_id)?;
    let target = require_positive(cmd.target, "target amount")?;
    if cmd.start_date > cmd.end_date {
        return Err(EngineError::InvalidInput(
            "start date must not be after end date".to_string(),
        ));
    }
    if cmd.start_date > today {
        return Err(EngineError::InvalidInput(
            "start date must not be in the future".to_string(),
        ));
    }
    Ok(GoalFields {
        account_id,
        name,
        description: normalize_optional_text(cmd.description.as_deref()),
        kind: cmd.kind,
        target,
        start_date: cmd.start_date,
        end_date: cmd.end_date,
        notes: normalize_optional_text(cmd.notes.as_deref()),
    })
}

pub(super) async fn require_goal<C: ConnectionTrait>(db: &C, goal_id: i64) -> ResultEngine<Goal> {
    let model = goals::Entity::find_by_id(goal_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("goal {goal_id}")))?;
    Goal::try_from(model)
}

fn goals_from(models: Vec<goals::Model>) -> ResultEngine<Vec<Goal>> {
    models.into_iter().map(Goal::try_from).collect()
}

async fn save_status<C: ConnectionTrait>(db: &C, goal_id: i64, status: GoalStatus) -> ResultEngine<()> {
    goals::ActiveModel {
        id: ActiveValue::Unchanged(goal_id),
        status: ActiveValue::Set(status.as_str().to_string()),
        ..Default::default()
    }
    .update(db)
    .await?;
    Ok(())
}

impl Engine {
    /// Creates an `ACTIVE` goal with nothing saved yet.
    pub async fn create_goal(&self, cmd: GoalCmd, now: DateTime<Utc>) -> ResultEngine<Goal> {
        let outcome = async {
            let fields = normalize_goal(&cmd, now.date_naive())?;
            with_tx!(self, |db_tx| {
                require_account(&db_tx, fields.account_id).await?;
                let mut goal = Goal {
                    id: 0,
                    account_id: fields.account_id,
                    name: fields.name,
                    description: fields.description,
                    kind: fields.kind,
                    target: fields.target,
                    current: MoneyCents::ZERO,
                    start_date: fields.start_date,
                    end_date: fields.end_date,
                    status: GoalStatus::Active,
                    registered_at: now,
                    notes: fields.notes,
                    percentage: Default::default(),
                };
                goal.refresh_percentage();
                let model = goals::ActiveModel::from(&goal).insert(&db_tx).await?;
                Goal::try_from(model)
            })
        }
        .await;
        let goal = integrity_checked("create goal", outcome)?;
        tracing::info!(goal_id = goal.id, account_id = goal.account_id, target = %goal.target, "goal created");
        Ok(goal)
    }

    pub async fn goal(&self, goal_id: i64) -> ResultEngine<Goal> {
        let goal_id = validate_id(goal_id)?;
        require_goal(&self.database, goal_id).await
    }

    pub async fn list_goals(&self) -> ResultEngine<Vec<Goal>> {
        let models = goals::Entity::find()
            .order_by_asc(goals::Column::Id)
            .all(&self.database)
            .await?;
        goals_from(models)
    }

    pub async fn account_goals(&self, account_id: i64) -> ResultEngine<Vec<Goal>> {
        let account_id = validate_id(account_id)?;
        require_account(&self.database, account_id).await?;
        let models = goals::Entity::find()
            .filter(goals::Column::AccountId.eq(account_id))
            .order_by_asc(goals::Column::Id)
            .all(&self.database)
            .await?;
        goals_from(models)
    }

    /// `ACTIVE` goals of an account, closest deadline first.
    pub async fn active_goals(&self, account_id: i64) -> ResultEngine<Vec<Goal>> {
        let account_id = validate_id(account_id)?;
        require_account(&self.database, account_id).await?;
        let models = goals::Entity::find()
            .filter(goals::Column::AccountId.eq(account_id))
            .filter(goals::Column::Status.eq(GoalStatus::Active.as_str()))
            .order_by_asc(goals::Column::EndDate)
            .order_by_asc(goals::Column::Id)
            .all(&self.database)
            .await?;
        goals_from(models)
    }

    /// Goals of an account past their end date and not completed, whether or
    /// not the sweep has flagged them yet.
    pub async fn expired_goals(&self, account_id: i64, today: NaiveDate) -> ResultEngine<Vec<Goal>> {
        let account_id = validate_id(account_id)?;
        require_account(&self.database, account_id).await?;
        let models = goals::Entity::find()
            .filter(goals::Column::AccountId.eq(account_id))
            .filter(goals::Column::EndDate.lt(today))
            .filter(goals::Column::Status.ne(GoalStatus::Completed.as_str()))
            .order_by_asc(goals::Column::EndDate)
            .order_by_asc(goals::Column::Id)
            .all(&self.database)
            .await?;
        goals_from(models)
    }

    pub async fn goals_by_kind(&self, account_id: i64, kind: GoalKind) -> ResultEngine<Vec<Goal>> {
        let account_id = validate_id(account_id)?;
        require_account(&self.database, account_id).await?;
        let models = goals::Entity::find()
            .filter(goals::Column::AccountId.eq(account_id))
            .filter(goals::Column::Kind.eq(kind.as_str()))
            .order_by_asc(goals::Column::Id)
            .all(&self.database)
            .await?;
        goals_from(models)
    }

    /// Replaces the descriptive fields, target and dates of a goal.
    ///
    /// The saved amount, the status and the owning account are kept; the
    /// percentage follows the new target.
    pub async fn update_goal(&self, goal_id: i64, cmd: GoalCmd, today: NaiveDate) -> ResultEngine<Goal> {
        let outcome = async {
            let goal_id = validate_id(goal_id)?;
            let fields = normalize_goal(&cmd, today)?;
            with_tx!(self, |db_tx| {
                let mut goal = require_goal(&db_tx, goal_id).await?;
                goal.name = fields.name;
                goal.description = fields.description;
                goal.kind = fields.kind;
                goal.target = fields.target;
                goal.start_date = fields.start_date;
                goal.end_date = fields.end_date;
                goal.notes = fields.notes;
                goal.refresh_percentage();
                let model = goals::ActiveModel::from(&goal).update(&db_tx).await?;
                Goal::try_from(model)
            })
        }
        .await;
        let goal = integrity_checked("update goal", outcome)?;
        tracing::info!(goal_id = goal.id, percentage = %goal.percentage, "goal updated");
        Ok(goal)
    }

    /// Adds to the saved amount, completing the goal once the target is met.
    pub async fn add_progress(&self, goal_id: i64, amount: MoneyCents) -> ResultEngine<Goal> {
        let outcome = async {
            let goal_id = validate_id(goal_id)?;
            require_positive(amount, "progress amount")?;
            with_tx!(self, |db_tx| {
                let mut goal = require_goal(&db_tx, goal_id).await?;
                goal.add_progress(amount)?;
                goals::ActiveModel {
                    id: ActiveValue::Unchanged(goal_id),
                    current_minor: ActiveValue::Set(goal.current.cents()),
                    status: ActiveValue::Set(goal.status.as_str().to_string()),
                    ..Default::default()
                }
                .update(&db_tx)
                .await?;
                Ok(goal)
            })
        }
        .await;
        let goal = integrity_checked("add goal progress", outcome)?;
        tracing::info!(
            goal_id = goal.id,
            current = %goal.current,
            percentage = %goal.percentage,
            status = %goal.status,
            "goal progress added"
        );
        Ok(goal)
    }

    pub async fn pause_goal(&self, goal_id: i64) -> ResultEngine<Goal> {
        self.apply_goal_event(goal_id, GoalEvent::Pause, "pause goal")
            .await
    }

    /// Moves a `PAUSED` goal back to `ACTIVE`.
    ///
    /// A goal whose end date already passed is still reactivated; the
    /// deadline is left as is and a warning is logged.
    pub async fn reactivate_goal(&self, goal_id: i64, today: NaiveDate) -> ResultEngine<Goal> {
        let goal = self
            .apply_goal_event(goal_id, GoalEvent::Reactivate, "reactivate goal")
            .await?;
        if goal.end_date < today {
            tracing::warn!(
                goal_id = goal.id,
                end_date = %goal.end_date,
                "goal reactivated past its end date"
            );
        }
        Ok(goal)
    }

    /// Explicitly completes a goal regardless of the saved amount.
    pub async fn complete_goal(&self, goal_id: i64) -> ResultEngine<Goal> {
        self.apply_goal_event(goal_id, GoalEvent::Complete, "complete goal")
            .await
    }

    async fn apply_goal_event(&self, goal_id: i64, event: GoalEvent, operation: &str) -> ResultEngine<Goal> {
        let outcome = async {
            let goal_id = validate_id(goal_id)?;
            with_tx!(self, |db_tx| {
                let mut goal = require_goal(&db_tx, goal_id).await?;
                goal.status = goal.status.apply(event)?;
                save_status(&db_tx, goal_id, goal.status).await?;
                Ok(goal)
            })
        }
        .await;
        let goal = integrity_checked(operation, outcome)?;
        tracing::info!(goal_id = goal.id, status = %goal.status, "goal status changed");
        Ok(goal)
    }

    pub async fn delete_goal(&self, goal_id: i64) -> ResultEngine<()> {
        let outcome = async {
            let goal_id = validate_id(goal_id)?;
            with_tx!(self, |db_tx| {
                require_goal(&db_tx, goal_id).await?;
                goals::Entity::delete_by_id(goal_id).exec(&db_tx).await?;
                Ok(())
            })
        }
        .await;
        integrity_checked("delete goal", outcome)?;
        tracing::info!(goal_id, "goal deleted");
        Ok(())
    }

    /// Flags every `ACTIVE` or `PAUSED` goal whose end date is before
    /// `today` as `EXPIRED` and returns how many were flipped.
    ///
    /// Each goal is committed on its own: a failure stops the sweep but keeps
    /// the flips already made.
    pub async fn sweep_expired(&self, today: NaiveDate) -> ResultEngine<u64> {
        let candidates = goals::Entity::find()
            .filter(goals::Column::EndDate.lt(today))
            .filter(goals::Column::Status.is_in([
                GoalStatus::Active.as_str(),
                GoalStatus::Paused.as_str(),
            ]))
            .order_by_asc(goals::Column::Id)
            .all(&self.database)
            .await?;

        let mut flipped = 0;
        for model in candidates {
            let outcome = self.mark_expired(model.id, today).await;
            if integrity_checked("sweep expired goals", outcome)? {
                flipped += 1;
            }
        }
        tracing::info!(flipped, %today, "expired goals swept");
        Ok(flipped)
    }

    /// Expires one goal, re-checked inside its own transaction. Returns
    /// `false` when the goal no longer qualifies.
    async fn mark_expired(&self, goal_id: i64, today: NaiveDate) -> ResultEngine<bool> {
        with_tx!(self, |db_tx| {
            let goal = require_goal(&db_tx, goal_id).await?;
            if !goal.is_overdue(today) {
                return Ok(false);
            }
            match goal.status.apply(GoalEvent::Expire) {
                Ok(status) => {
                    save_status(&db_tx, goal_id, status).await?;
                    Ok(true)
                }
                Err(EngineError::InvalidTransition(_)) => Ok(false),
                Err(err) => Err(err),
            }
        })
    }
}
