//! Bank accounts.
//!
//! An [`Account`] is the owner of every movement and savings goal. The engine
//! only needs lookups by id; registration and editing are kept minimal.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

/// A bank account as known to the account directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub bank: String,
    pub agency: String,
    /// Globally unique.
    pub account_number: String,
    pub account_kind: String,
    pub holder: String,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub bank: String,
    pub agency: String,
    #[sea_orm(unique)]
    pub account_number: String,
    pub account_kind: String,
    pub holder: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movements::Entity")]
    Movements,
    #[sea_orm(has_many = "super::goals::Entity")]
    Goals,
}

impl Related<super::movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl Related<super::goals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Goals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Account {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            bank: model.bank,
            agency: model.agency,
            account_number: model.account_number,
            account_kind: model.account_kind,
            holder: model.holder,
        }
    }
}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            id: if account.id > 0 {
                ActiveValue::Set(account.id)
            } else {
                ActiveValue::NotSet
            },
            bank: ActiveValue::Set(account.bank.clone()),
            agency: ActiveValue::Set(account.agency.clone()),
            account_number: ActiveValue::Set(account.account_number.clone()),
            account_kind: ActiveValue::Set(account.account_kind.clone()),
            holder: ActiveValue::Set(account.holder.clone()),
        }
    }
}
