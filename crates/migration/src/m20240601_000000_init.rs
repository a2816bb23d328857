//! Initial schema migration.
//!
//! - `accounts`: bank accounts movements and goals belong to
//! - `movements`: income and expense entries with their balance snapshots
//! - `goals`: savings goals tracked against an account

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Bank,
    Agency,
    AccountNumber,
    AccountKind,
    Holder,
}

#[derive(Iden)]
enum Movements {
    Table,
    Id,
    AccountId,
    Kind,
    AmountMinor,
    Description,
    Category,
    MovementDate,
    RegisteredAt,
    Status,
    Source,
    Notes,
    PriorBalanceMinor,
    ResultingBalanceMinor,
    OriginFile,
    ExternalId,
}

#[derive(Iden)]
enum Goals {
    Table,
    Id,
    AccountId,
    Name,
    Description,
    Kind,
    TargetMinor,
    CurrentMinor,
    StartDate,
    EndDate,
    Status,
    RegisteredAt,
    Notes,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::Bank).string().not_null())
                    .col(ColumnDef::new(Accounts::Agency).string().not_null())
                    .col(ColumnDef::new(Accounts::AccountNumber).string().not_null())
                    .col(ColumnDef::new(Accounts::AccountKind).string().not_null())
                    .col(ColumnDef::new(Accounts::Holder).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-account_number-unique")
                    .table(Accounts::Table)
                    .col(Accounts::AccountNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Movements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Movements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Movements::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Movements::AccountId).big_integer().not_null())
                    .col(ColumnDef::new(Movements::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Movements::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Movements::Description).string().not_null())
                    .col(ColumnDef::new(Movements::Category).string().not_null())
                    .col(ColumnDef::new(Movements::MovementDate).date().not_null())
                    .col(
                        ColumnDef::new(Movements::RegisteredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Movements::Status).string().not_null())
                    .col(ColumnDef::new(Movements::Source).string().not_null())
                    .col(ColumnDef::new(Movements::Notes).string())
                    .col(
                        ColumnDef::new(Movements::PriorBalanceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Movements::ResultingBalanceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Movements::OriginFile).string())
                    .col(ColumnDef::new(Movements::ExternalId).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-movements-account_id")
                            .from(Movements::Table, Movements::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movements-account_id-movement_date")
                    .table(Movements::Table)
                    .col(Movements::AccountId)
                    .col(Movements::MovementDate)
                    .to_owned(),
            )
            .await?;

        // NULLs are distinct, so only imported rows are deduplicated.
        manager
            .create_index(
                Index::create()
                    .name("idx-movements-external_id-unique")
                    .table(Movements::Table)
                    .col(Movements::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Goals
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Goals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Goals::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Goals::AccountId).big_integer().not_null())
                    .col(ColumnDef::new(Goals::Name).string().not_null())
                    .col(ColumnDef::new(Goals::Description).string())
                    .col(ColumnDef::new(Goals::Kind).string().not_null())
                    .col(ColumnDef::new(Goals::TargetMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(Goals::CurrentMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Goals::StartDate).date().not_null())
                    .col(ColumnDef::new(Goals::EndDate).date().not_null())
                    .col(ColumnDef::new(Goals::Status).string().not_null())
                    .col(
                        ColumnDef::new(Goals::RegisteredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Goals::Notes).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-goals-account_id")
                            .from(Goals::Table, Goals::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-goals-status-end_date")
                    .table(Goals::Table)
                    .col(Goals::Status)
                    .col(Goals::EndDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Reverse creation order for the foreign keys.
        manager
            .drop_table(Table::drop().table(Goals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Movements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
