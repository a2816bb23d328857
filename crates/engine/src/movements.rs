//! Financial movements.
//!
//! A [`Movement`] is a single inflow or outflow recorded against an account.
//! Besides the amount it stores the balance the account had right before the
//! row was written and the balance right after. Those snapshot fields are a
//! point-in-time audit trail: reversals and later writes never rewrite them.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};

use crate::{EngineError, MoneyCents, ResultEngine, util::symbolic_enum};

symbolic_enum! {
    /// Direction of a movement.
    pub enum MovementKind ("movement kind") {
        Income => "INCOME",
        Expense => "EXPENSE",
    }
}

impl MovementKind {
    /// Applies `amount` to `balance` in this movement's direction.
    ///
    /// A result outside the `i64` range is an `InvalidInput` error.
    pub fn apply(self, balance: MoneyCents, amount: MoneyCents) -> ResultEngine<MoneyCents> {
        match self {
            Self::Income => balance.try_add(amount),
            Self::Expense => balance.try_sub(amount),
        }
    }
}

symbolic_enum! {
    pub enum MovementStatus ("movement status") {
        Pending => "PENDING",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
        Reversed => "REVERSED",
    }
}

symbolic_enum! {
    /// Where a movement came from.
    pub enum MovementSource ("movement source") {
        Manual => "MANUAL",
        Import => "IMPORT",
        Api => "API",
    }
}

symbolic_enum! {
    pub enum Category ("category") {
        Salary => "SALARY",
        Sales => "SALES",
        Services => "SERVICES",
        Investments => "INVESTMENTS",
        Food => "FOOD",
        Housing => "HOUSING",
        Utilities => "UTILITIES",
        Transport => "TRANSPORT",
        Health => "HEALTH",
        Education => "EDUCATION",
        Leisure => "LEISURE",
        Taxes => "TAXES",
        Transfer => "TRANSFER",
        Other => "OTHER",
    }
}

/// Events driving the movement status machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MovementEvent {
    Complete,
    Cancel,
    Reverse,
}

impl MovementEvent {
    fn verb(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Cancel => "cancel",
            Self::Reverse => "reverse",
        }
    }
}

impl MovementStatus {
    /// Status a freshly registered movement starts in.
    ///
    /// Defaults to `COMPLETED`; only `PENDING` and `COMPLETED` may be chosen
    /// by the caller.
    pub fn initial(requested: Option<Self>) -> ResultEngine<Self> {
        match requested {
            None => Ok(Self::Completed),
            Some(status @ (Self::Pending | Self::Completed)) => Ok(status),
            Some(other) => Err(EngineError::InvalidInput(format!(
                "a new movement cannot start as {other}"
            ))),
        }
    }

    /// The movement status table.
    ///
    /// | from                          | event    | to        |
    /// |-------------------------------|----------|-----------|
    /// | PENDING                       | complete | COMPLETED |
    /// | PENDING, COMPLETED            | cancel   | CANCELLED |
    /// | PENDING, COMPLETED, CANCELLED | reverse  | REVERSED  |
    ///
    /// Every other pair is rejected.
    pub fn apply(self, event: MovementEvent) -> ResultEngine<Self> {
        use MovementEvent as E;

        match (self, event) {
            (Self::Pending, E::Complete) => Ok(Self::Completed),
            (Self::Pending | Self::Completed, E::Cancel) => Ok(Self::Cancelled),
            (Self::Pending | Self::Completed | Self::Cancelled, E::Reverse) => Ok(Self::Reversed),
            (Self::Reversed, E::Reverse) => Err(EngineError::InvalidTransition(
                "movement already reversed".to_string(),
            )),
            (from, event) => Err(EngineError::InvalidTransition(format!(
                "cannot {} a {from} movement",
                event.verb()
            ))),
        }
    }

    /// Resolves a status requested through an edit into a table event.
    ///
    /// Asking for the current status is a no-op. Reversal has its own
    /// operation and a movement never goes back to `PENDING`.
    pub fn transition_to(self, target: Self) -> ResultEngine<Self> {
        if self == target {
            return Ok(self);
        }
        match target {
            Self::Completed => self.apply(MovementEvent::Complete),
            Self::Cancelled => self.apply(MovementEvent::Cancel),
            Self::Reversed => Err(EngineError::InvalidTransition(
                "use the reverse operation to reverse a movement".to_string(),
            )),
            Self::Pending => Err(EngineError::InvalidTransition(format!(
                "a {self} movement cannot go back to PENDING"
            ))),
        }
    }

    /// Only completed movements count towards an account balance.
    #[must_use]
    pub fn counts_towards_balance(self) -> bool {
        self == Self::Completed
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Movement {
    pub id: i64,
    pub account_id: i64,
    pub kind: MovementKind,
    pub amount: MoneyCents,
    pub description: String,
    pub category: Category,
    pub movement_date: NaiveDate,
    pub registered_at: DateTime<Utc>,
    pub status: MovementStatus,
    pub source: MovementSource,
    pub notes: Option<String>,
    pub prior_balance: MoneyCents,
    pub resulting_balance: MoneyCents,
    pub origin_file: Option<String>,
    /// Deduplication key for imported movements.
    pub external_id: Option<String>,
}

impl Movement {
    /// Signed contribution of this movement to the balance, zero unless it is
    /// completed.
    #[must_use]
    pub fn balance_effect(&self) -> ResultEngine<MoneyCents> {
        if self.status.counts_towards_balance() {
            self.kind.apply(MoneyCents::ZERO, self.amount)
        } else {
            Ok(MoneyCents::ZERO)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "movements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub account_id: i64,
    pub kind: String,
    pub amount_minor: i64,
    pub description: String,
    pub category: String,
    pub movement_date: Date,
    pub registered_at: DateTimeUtc,
    pub status: String,
    pub source: String,
    pub notes: Option<String>,
    pub prior_balance_minor: i64,
    pub resulting_balance_minor: i64,
    pub origin_file: Option<String>,
    #[sea_orm(unique)]
    pub external_id: Option<String>,
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

impl From<&Movement> for ActiveModel {
    fn from(movement: &Movement) -> Self {
        Self {
            id: if movement.id > 0 {
                ActiveValue::Set(movement.id)
            } else {
                ActiveValue::NotSet
            },
            account_id: ActiveValue::Set(movement.account_id),
            kind: ActiveValue::Set(movement.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(movement.amount.cents()),
            description: ActiveValue::Set(movement.description.clone()),
            category: ActiveValue::Set(movement.category.as_str().to_string()),
            movement_date: ActiveValue::Set(movement.movement_date),
            registered_at: ActiveValue::Set(movement.registered_at),
            status: ActiveValue::Set(movement.status.as_str().to_string()),
            source: ActiveValue::Set(movement.source.as_str().to_string()),
            notes: ActiveValue::Set(movement.notes.clone()),
            prior_balance_minor: ActiveValue::Set(movement.prior_balance.cents()),
            resulting_balance_minor: ActiveValue::Set(movement.resulting_balance.cents()),
            origin_file: ActiveValue::Set(movement.origin_file.clone()),
            external_id: ActiveValue::Set(movement.external_id.clone()),
        }
    }
}

impl TryFrom<Model> for Movement {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            account_id: model.account_id,
            kind: MovementKind::try_from(model.kind.as_str())?,
            amount: MoneyCents::new(model.amount_minor),
            description: model.description,
            category: Category::try_from(model.category.as_str())?,
            movement_date: model.movement_date,
            registered_at: model.registered_at,
            status: MovementStatus::try_from(model.status.as_str())?,
            source: MovementSource::try_from(model.source.as_str())?,
            notes: model.notes,
            prior_balance: MoneyCents::new(model.prior_balance_minor),
            resulting_balance: MoneyCents::new(model.resulting_balance_minor),
            origin_file: model.origin_file,
            external_id: model.external_id,
        })
    }
}
