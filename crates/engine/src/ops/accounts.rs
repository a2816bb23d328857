use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};

use crate::{
    Account, AccountCmd, EngineError, ResultEngine, accounts,
    util::{normalize_required_text, validate_id},
};

use super::{Engine, integrity_checked, with_tx};

/// Loads an account or fails with `KeyNotFound`.
pub(super) async fn require_account<C: ConnectionTrait>(
    db: &C,
    account_id: i64,
) -> ResultEngine<accounts::Model> {
    accounts::Entity::find_by_id(account_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("account {account_id}")))
}

struct NormalizedAccount {
    bank: String,
    agency: String,
    account_number: String,
    account_kind: String,
    holder: String,
}

fn normalize_account(cmd: &AccountCmd) -> ResultEngine<NormalizedAccount> {
    Ok(NormalizedAccount {
        bank: normalize_required_text(&cmd.bank, "bank")?,
        agency: normalize_required_text(&cmd.agency, "agency")?,
        account_number: normalize_required_text(&cmd.account_number, "account number")?,
        account_kind: normalize_required_text(&cmd.account_kind, "account kind")?,
        holder: normalize_required_text(&cmd.holder, "holder")?,
    })
}

async fn ensure_number_free<C: ConnectionTrait>(
    db: &C,
    account_number: &str,
    except_id: Option<i64>,
) -> ResultEngine<()> {
    let mut query =
        accounts::Entity::find().filter(accounts::Column::AccountNumber.eq(account_number));
    if let Some(id) = except_id {
        query = query.filter(accounts::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(EngineError::ExistingKey(format!(
            "account number {account_number}"
        )));
    }
    Ok(())
}

impl Engine {
    /// Registers a new account. Account numbers are unique.
    pub async fn register_account(&self, cmd: AccountCmd) -> ResultEngine<Account> {
        let outcome = async {
            let fields = normalize_account(&cmd)?;
            with_tx!(self, |db_tx| {
                ensure_number_free(&db_tx, &fields.account_number, None).await?;
                let account = Account {
                    id: 0,
                    bank: fields.bank,
                    agency: fields.agency,
                    account_number: fields.account_number,
                    account_kind: fields.account_kind,
                    holder: fields.holder,
                };
                let model = accounts::ActiveModel::from(&account).insert(&db_tx).await?;
                Ok(Account::from(model))
            })
        }
        .await;
        let account = integrity_checked("register account", outcome)?;
        tracing::info!(account_id = account.id, "account registered");
        Ok(account)
    }

    pub async fn account(&self, account_id: i64) -> ResultEngine<Account> {
        let account_id = validate_id(account_id)?;
        let model = require_account(&self.database, account_id).await?;
        Ok(Account::from(model))
    }

    pub async fn account_by_number(&self, account_number: &str) -> ResultEngine<Account> {
        let account_number = normalize_required_text(account_number, "account number")?;
        accounts::Entity::find()
            .filter(accounts::Column::AccountNumber.eq(account_number.as_str()))
            .one(&self.database)
            .await?
            .map(Account::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("account number {account_number}")))
    }

    pub async fn list_accounts(&self) -> ResultEngine<Vec<Account>> {
        let models = accounts::Entity::find()
            .order_by_asc(accounts::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Account::from).collect())
    }

    /// Replaces every field of an account. The new number must not belong to
    /// another account.
    pub async fn update_account(&self, account_id: i64, cmd: AccountCmd) -> ResultEngine<Account> {
        let outcome = async {
            let account_id = validate_id(account_id)?;
            let fields = normalize_account(&cmd)?;
            with_tx!(self, |db_tx| {
                require_account(&db_tx, account_id).await?;
                ensure_number_free(&db_tx, &fields.account_number, Some(account_id)).await?;
                let model = accounts::ActiveModel {
                    id: ActiveValue::Unchanged(account_id),
                    bank: ActiveValue::Set(fields.bank),
                    agency: ActiveValue::Set(fields.agency),
                    account_number: ActiveValue::Set(fields.account_number),
                    account_kind: ActiveValue::Set(fields.account_kind),
                    holder: ActiveValue::Set(fields.holder),
                }
                .update(&db_tx)
                .await?;
                Ok(Account::from(model))
            })
        }
        .await;
        let account = integrity_checked("update account", outcome)?;
        tracing::info!(account_id = account.id, "account updated");
        Ok(account)
    }

    /// Deletes an account. Accounts still owning movements or goals are
    /// rejected by the storage layer.
    pub async fn delete_account(&self, account_id: i64) -> ResultEngine<()> {
        let outcome = async {
            let account_id = validate_id(account_id)?;
            with_tx!(self, |db_tx| {
                require_account(&db_tx, account_id).await?;
                accounts::Entity::delete_by_id(account_id)
                    .exec(&db_tx)
                    .await?;
                Ok(())
            })
        }
        .await;
        integrity_checked("delete account", outcome)?;
        tracing::info!(account_id, "account deleted");
        Ok(())
    }
}
