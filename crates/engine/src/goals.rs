//! Savings goals.
//!
//! A [`Goal`] is a target amount an account wants to reach by an end date.
//! Progress is added incrementally; the completion percentage is always
//! derived from `current / target` and never stored on its own.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{ActiveValue, entity::prelude::*};

use crate::{EngineError, MoneyCents, ResultEngine, util::require_positive, util::symbolic_enum};

symbolic_enum! {
    pub enum GoalKind ("goal kind") {
        EmergencyFund => "EMERGENCY_FUND",
        Trip => "TRIP",
        MonthlySavings => "MONTHLY_SAVINGS",
        SpecificInvestment => "SPECIFIC_INVESTMENT",
        Purchase => "PURCHASE",
        Education => "EDUCATION",
        Retirement => "RETIREMENT",
        Other => "OTHER",
    }
}

symbolic_enum! {
    pub enum GoalStatus ("goal status") {
        Active => "ACTIVE",
        Paused => "PAUSED",
        Completed => "COMPLETED",
        Expired => "EXPIRED",
    }
}

/// Events driving the goal status machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GoalEvent {
    Pause,
    Reactivate,
    Complete,
    Expire,
}

impl GoalEvent {
    fn verb(self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::Reactivate => "reactivate",
            Self::Complete => "complete",
            Self::Expire => "expire",
        }
    }
}

impl GoalStatus {
    /// The goal status table.
    ///
    /// | from                    | event      | to        |
    /// |-------------------------|------------|-----------|
    /// | ACTIVE                  | pause      | PAUSED    |
    /// | PAUSED                  | reactivate | ACTIVE    |
    /// | ACTIVE, PAUSED, EXPIRED | complete   | COMPLETED |
    /// | ACTIVE, PAUSED          | expire     | EXPIRED   |
    ///
    /// Every other pair is rejected with a message naming the current status.
    pub fn apply(self, event: GoalEvent) -> ResultEngine<Self> {
        use GoalEvent as E;

        match (self, event) {
            (Self::Active, E::Pause) => Ok(Self::Paused),
            (Self::Paused, E::Reactivate) => Ok(Self::Active),
            (Self::Active | Self::Paused | Self::Expired, E::Complete) => Ok(Self::Completed),
            (Self::Active | Self::Paused, E::Expire) => Ok(Self::Expired),
            (from, event) => Err(EngineError::InvalidTransition(format!(
                "cannot {} a goal that is {from}",
                event.verb()
            ))),
        }
    }
}

/// `current / target * 100`, four fractional digits, half-up.
#[must_use]
pub fn completion_percentage(current: MoneyCents, target: MoneyCents) -> Decimal {
    if !target.is_positive() {
        return Decimal::new(0, 4);
    }
    let ratio = Decimal::from(current.cents()) * Decimal::ONE_HUNDRED / Decimal::from(target.cents());
    let mut percentage = ratio.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);
    percentage.rescale(4);
    percentage
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Goal {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub kind: GoalKind,
    pub target: MoneyCents,
    pub current: MoneyCents,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: GoalStatus,
    pub registered_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub percentage: Decimal,
}

impl Goal {
    /// Recomputes [`Goal::percentage`] from the current amounts.
    pub fn refresh_percentage(&mut self) {
        self.percentage = completion_percentage(self.current, self.target);
    }

    /// Adds `amount` to the saved total.
    ///
    /// Reaching the target completes the goal; a completed goal accepts no
    /// further progress.
    pub fn add_progress(&mut self, amount: MoneyCents) -> ResultEngine<()> {
        require_positive(amount, "progress amount")?;
        if self.status == GoalStatus::Completed {
            return Err(EngineError::InvalidTransition(
                "goal already completed".to_string(),
            ));
        }
        self.current = self
            .current
            .checked_add(amount)
            .ok_or_else(|| EngineError::InvalidInput("progress amount too large".to_string()))?;
        if self.current >= self.target {
            self.status = self.status.apply(GoalEvent::Complete)?;
        }
        self.refresh_percentage();
        Ok(())
    }

    /// Amount still missing, never negative.
    #[must_use]
    pub fn remaining(&self) -> MoneyCents {
        self.target
            .saturating_sub(self.current)
            .max(MoneyCents::ZERO)
    }

    /// Past its end date without having been completed.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.end_date < today && self.status != GoalStatus::Completed
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "goals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub kind: String,
    pub target_minor: i64,
    pub current_minor: i64,
    pub start_date: Date,
    pub end_date: Date,
    pub status: String,
    pub registered_at: DateTimeUtc,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Account,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Goal> for ActiveModel {
    fn from(goal: &Goal) -> Self {
        Self {
            id: if goal.id > 0 {
                ActiveValue::Set(goal.id)
            } else {
                ActiveValue::NotSet
            },
            account_id: ActiveValue::Set(goal.account_id),
            name: ActiveValue::Set(goal.name.clone()),
            description: ActiveValue::Set(goal.description.clone()),
            kind: ActiveValue::Set(goal.kind.as_str().to_string()),
            target_minor: ActiveValue::Set(goal.target.cents()),
            current_minor: ActiveValue::Set(goal.current.cents()),
            start_date: ActiveValue::Set(goal.start_date),
            end_date: ActiveValue::Set(goal.end_date),
            status: ActiveValue::Set(goal.status.as_str().to_string()),
            registered_at: ActiveValue::Set(goal.registered_at),
            notes: ActiveValue::Set(goal.notes.clone()),
        }
    }
}

impl TryFrom<Model> for Goal {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let target = MoneyCents::new(model.target_minor);
        let current = MoneyCents::new(model.current_minor);
        Ok(Self {
            id: model.id,
            account_id: model.account_id,
            name: model.name,
            description: model.description,
            kind: GoalKind::try_from(model.kind.as_str())?,
            target,
            current,
            start_date: model.start_date,
            end_date: model.end_date,
            status: GoalStatus::try_from(model.status.as_str())?,
            registered_at: model.registered_at,
            notes: model.notes,
            percentage: completion_percentage(current, target),
        })
    }
}
