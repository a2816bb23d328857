use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};

use crate::{
    Category, EngineError, MoneyCents, Movement, MovementCmd, MovementEvent, MovementFilter,
    MovementKind, MovementSource, MovementStatus, ResultEngine, movements,
    util::{normalize_optional_text, normalize_required_text, require_positive, validate_id},
};

use super::{
    Engine, accounts::require_account, balances::completed_totals, integrity_checked, with_tx,
};

/// A period is inclusive on both ends, must not be inverted and must not
/// start in the future.
pub(super) fn validate_period(from: NaiveDate, to: NaiveDate, today: NaiveDate) -> ResultEngine<()> {
    if from > to {
        return Err(EngineError::InvalidInput(
            "start date must not be after end date".to_string(),
        ));
    }
    if from > today {
        return Err(EngineError::InvalidInput(
            "start date must not be in the future".to_string(),
        ));
    }
    Ok(())
}

trait ApplyMovementFilters: QueryFilter + Sized {
    fn apply_movement_filters(self, filter: &MovementFilter) -> Self;
}

impl<T> ApplyMovementFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_movement_filters(mut self, filter: &MovementFilter) -> Self {
        if let Some(kind) = filter.kind {
            self = self.filter(movements::Column::Kind.eq(kind.as_str()));
        }
        if let Some(status) = filter.status {
            self = self.filter(movements::Column::Status.eq(status.as_str()));
        }
        if let Some((from, to)) = filter.full_period() {
            self = self
                .filter(movements::Column::MovementDate.gte(from))
                .filter(movements::Column::MovementDate.lte(to));
        }
        self
    }
}

/// Validated fields shared by registration, edits and imports.
pub(super) struct MovementFields {
    pub(super) account_id: i64,
    pub(super) kind: MovementKind,
    pub(super) amount: MoneyCents,
    pub(super) description: String,
    pub(super) category: Category,
    pub(super) movement_date: NaiveDate,
    pub(super) source: MovementSource,
    pub(super) notes: Option<String>,
    pub(super) origin_file: Option<String>,
    pub(super) external_id: Option<String>,
}

pub(super) fn normalize_movement(cmd: &MovementCmd) -> ResultEngine<MovementFields> {
    let description = normalize_required_text(&cmd.description, "description")?;
    let account_id = validate_id(cmd.account_id)?;
    let amount = require_positive(cmd.amount, "amount")?;
    Ok(MovementFields {
        account_id,
        kind: cmd.kind,
        amount,
        description,
        category: cmd.category,
        movement_date: cmd.movement_date,
        source: cmd.source,
        notes: normalize_optional_text(cmd.notes.as_deref()),
        origin_file: normalize_optional_text(cmd.origin_file.as_deref()),
        external_id: normalize_optional_text(cmd.external_id.as_deref()),
    })
}

pub(super) async fn external_id_taken<C: ConnectionTrait>(
    db: &C,
    external_id: &str,
    except_id: Option<i64>,
) -> ResultEngine<bool> {
    let mut query =
        movements::Entity::find().filter(movements::Column::ExternalId.eq(external_id));
    if let Some(id) = except_id {
        query = query.filter(movements::Column::Id.ne(id));
    }
    Ok(query.one(db).await?.is_some())
}

/// Runs an account listing without validating the filter.
pub(super) async fn select_movements<C: ConnectionTrait>(
    db: &C,
    account_id: i64,
    filter: &MovementFilter,
) -> ResultEngine<Vec<Movement>> {
    let query = movements::Entity::find()
        .filter(movements::Column::AccountId.eq(account_id))
        .apply_movement_filters(filter);
    let query = if filter.full_period().is_some() {
        query
            .order_by_desc(movements::Column::MovementDate)
            .order_by_desc(movements::Column::Id)
    } else {
        query.order_by_asc(movements::Column::Id)
    };
    let models = query.all(db).await?;
    models.into_iter().map(Movement::try_from).collect()
}

async fn require_movement<C: ConnectionTrait>(db: &C, movement_id: i64) -> ResultEngine<Movement> {
    let model = movements::Entity::find_by_id(movement_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("movement {movement_id}")))?;
    Movement::try_from(model)
}

/// Stamps snapshots from the account's current balance and inserts the row.
///
/// Callers hold the account lock and pass the transaction the balance is
/// read in.
pub(super) async fn insert_movement<C: ConnectionTrait>(
    db: &C,
    fields: MovementFields,
    status: MovementStatus,
    registered_at: DateTime<Utc>,
) -> ResultEngine<Movement> {
    require_account(db, fields.account_id).await?;
    if let Some(external_id) = &fields.external_id
        && external_id_taken(db, external_id, None).await?
    {
        return Err(EngineError::ExistingKey(format!("external id {external_id}")));
    }

    let totals = completed_totals(db, fields.account_id).await?;
    if status.counts_towards_balance() {
        totals.ensure_room(fields.kind, fields.amount)?;
    }
    let prior_balance = totals.balance()?;
    let resulting_balance = fields.kind.apply(prior_balance, fields.amount)?;
    let movement = Movement {
        id: 0,
        account_id: fields.account_id,
        kind: fields.kind,
        amount: fields.amount,
        description: fields.description,
        category: fields.category,
        movement_date: fields.movement_date,
        registered_at,
        status,
        source: fields.source,
        notes: fields.notes,
        prior_balance,
        resulting_balance,
        origin_file: fields.origin_file,
        external_id: fields.external_id,
    };
    let model = movements::ActiveModel::from(&movement).insert(db).await?;
    Movement::try_from(model)
}

impl Engine {
    /// Records a movement against an account.
    ///
    /// The prior balance is read and the row is written under the account
    /// lock and inside one DB transaction.
    pub async fn register_movement(
        &self,
        cmd: MovementCmd,
        registered_at: DateTime<Utc>,
    ) -> ResultEngine<Movement> {
        let outcome = async {
            let fields = normalize_movement(&cmd)?;
            let status = MovementStatus::initial(cmd.status)?;
            require_account(&self.database, fields.account_id).await?;
            let _guard = self.locks.lock(fields.account_id).await;
            with_tx!(self, |db_tx| {
                insert_movement(&db_tx, fields, status, registered_at).await
            })
        }
        .await;
        let movement = integrity_checked("register movement", outcome)?;
        tracing::info!(
            movement_id = movement.id,
            account_id = movement.account_id,
            kind = %movement.kind,
            amount = %movement.amount,
            "movement registered"
        );
        Ok(movement)
    }

    pub async fn movement(&self, movement_id: i64) -> ResultEngine<Movement> {
        let movement_id = validate_id(movement_id)?;
        require_movement(&self.database, movement_id).await
    }

    /// Every movement, ordered by id.
    pub async fn list_movements(&self) -> ResultEngine<Vec<Movement>> {
        let models = movements::Entity::find()
            .order_by_asc(movements::Column::Id)
            .all(&self.database)
            .await?;
        models.into_iter().map(Movement::try_from).collect()
    }

    /// Movements of one account.
    ///
    /// With a full period the rows are ordered by movement date descending;
    /// otherwise by id.
    pub async fn account_movements(
        &self,
        account_id: i64,
        filter: &MovementFilter,
        today: NaiveDate,
    ) -> ResultEngine<Vec<Movement>> {
        let account_id = validate_id(account_id)?;
        if let Some((from, to)) = filter.full_period() {
            validate_period(from, to, today)?;
        }
        require_account(&self.database, account_id).await?;
        select_movements(&self.database, account_id, filter).await
    }

    pub async fn movements_in_period(
        &self,
        account_id: i64,
        from: NaiveDate,
        to: NaiveDate,
        today: NaiveDate,
    ) -> ResultEngine<Vec<Movement>> {
        let filter = MovementFilter::default().period(from, to);
        self.account_movements(account_id, &filter, today).await
    }

    pub async fn movements_by_kind(
        &self,
        account_id: i64,
        kind: MovementKind,
        today: NaiveDate,
    ) -> ResultEngine<Vec<Movement>> {
        let filter = MovementFilter::default().kind(kind);
        self.account_movements(account_id, &filter, today).await
    }

    /// Edits a movement.
    ///
    /// Snapshots are re-stamped from the target account's balance at the time
    /// of the edit, not at the movement date. A requested status goes through
    /// the status table.
    pub async fn update_movement(&self, movement_id: i64, cmd: MovementCmd) -> ResultEngine<Movement> {
        let outcome = async {
            let movement_id = validate_id(movement_id)?;
            let fields = normalize_movement(&cmd)?;
            require_account(&self.database, fields.account_id).await?;
            let _guard = self.locks.lock(fields.account_id).await;
            with_tx!(self, |db_tx| {
                let current = require_movement(&db_tx, movement_id).await?;
                require_account(&db_tx, fields.account_id).await?;
                if let Some(external_id) = &fields.external_id
                    && external_id_taken(&db_tx, external_id, Some(movement_id)).await?
                {
                    return Err(EngineError::ExistingKey(format!("external id {external_id}")));
                }
                let status = match cmd.status {
                    Some(target) => current.status.transition_to(target)?,
                    None => current.status,
                };

                let totals = completed_totals(&db_tx, fields.account_id).await?;
                if status.counts_towards_balance() {
                    totals.ensure_room(fields.kind, fields.amount)?;
                }
                let prior_balance = totals.balance()?;
                let resulting_balance = fields.kind.apply(prior_balance, fields.amount)?;
                let updated = Movement {
                    id: movement_id,
                    account_id: fields.account_id,
                    kind: fields.kind,
                    amount: fields.amount,
                    description: fields.description,
                    category: fields.category,
                    movement_date: fields.movement_date,
                    registered_at: current.registered_at,
                    status,
                    source: fields.source,
                    notes: fields.notes,
                    prior_balance,
                    resulting_balance,
                    origin_file: fields.origin_file,
                    external_id: fields.external_id,
                };
                let model = movements::ActiveModel::from(&updated).update(&db_tx).await?;
                Movement::try_from(model)
            })
        }
        .await;
        let movement = integrity_checked("update movement", outcome)?;
        tracing::info!(movement_id = movement.id, status = %movement.status, "movement updated");
        Ok(movement)
    }

    /// Marks a movement as `REVERSED`, excluding it from the balance.
    ///
    /// Snapshot fields on this row and on later rows are left untouched.
    pub async fn reverse_movement(&self, movement_id: i64) -> ResultEngine<Movement> {
        self.apply_movement_event(movement_id, MovementEvent::Reverse, "reverse movement")
            .await
    }

    /// Moves a `PENDING` movement to `COMPLETED`.
    pub async fn complete_movement(&self, movement_id: i64) -> ResultEngine<Movement> {
        self.apply_movement_event(movement_id, MovementEvent::Complete, "complete movement")
            .await
    }

    pub async fn cancel_movement(&self, movement_id: i64) -> ResultEngine<Movement> {
        self.apply_movement_event(movement_id, MovementEvent::Cancel, "cancel movement")
            .await
    }

    async fn apply_movement_event(
        &self,
        movement_id: i64,
        event: MovementEvent,
        operation: &str,
    ) -> ResultEngine<Movement> {
        let outcome = async {
            let movement_id = validate_id(movement_id)?;
            with_tx!(self, |db_tx| {
                let mut movement = require_movement(&db_tx, movement_id).await?;
                let status = movement.status.apply(event)?;
                if status.counts_towards_balance() && !movement.status.counts_towards_balance() {
                    completed_totals(&db_tx, movement.account_id)
                        .await?
                        .ensure_room(movement.kind, movement.amount)?;
                }
                movement.status = status;
                movements::ActiveModel {
                    id: ActiveValue::Unchanged(movement_id),
                    status: ActiveValue::Set(movement.status.as_str().to_string()),
                    ..Default::default()
                }
                .update(&db_tx)
                .await?;
                Ok(movement)
            })
        }
        .await;
        let movement = integrity_checked(operation, outcome)?;
        tracing::info!(movement_id = movement.id, status = %movement.status, "movement status changed");
        Ok(movement)
    }

    pub async fn delete_movement(&self, movement_id: i64) -> ResultEngine<()> {
        let outcome = async {
            let movement_id = validate_id(movement_id)?;
            with_tx!(self, |db_tx| {
                require_movement(&db_tx, movement_id).await?;
                movements::Entity::delete_by_id(movement_id)
                    .exec(&db_tx)
                    .await?;
                Ok(())
            })
        }
        .await;
        integrity_checked("delete movement", outcome)?;
        tracing::info!(movement_id, "movement deleted");
        Ok(())
    }
}
