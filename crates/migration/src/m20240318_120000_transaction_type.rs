//! Adds the `kind` column (`income` | `expense`) to `transactions`.
//!
//! The table is dropped and recreated rather than altered: rows written before
//! this version carry no type and cannot be classified. This only loses local
//! cache data, and running the step twice yields the same layout.

use sea_orm_migration::prelude::*;

use crate::m20240105_090000_init::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    UserId,
    AmountMinor,
    Category,
    CategoryNorm,
    Date,
    Kind,
}

fn transactions_table(with_kind: bool) -> TableCreateStatement {
    let mut table = Table::create();
    table
        .table(Transactions::Table)
        .col(
            ColumnDef::new(Transactions::Id)
                .blob()
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(Transactions::UserId).integer().not_null())
        .col(
            ColumnDef::new(Transactions::AmountMinor)
                .big_integer()
                .not_null(),
        )
        .col(ColumnDef::new(Transactions::Category).string().not_null())
        .col(
            ColumnDef::new(Transactions::CategoryNorm)
                .string()
                .not_null(),
        )
        .col(ColumnDef::new(Transactions::Date).date().not_null());
    if with_kind {
        table.col(ColumnDef::new(Transactions::Kind).string().not_null());
    }
    table
        .foreign_key(
            ForeignKey::create()
                .name("fk-transactions-user_id")
                .from(Transactions::Table, Transactions::UserId)
                .to(Users::Table, Users::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .on_update(ForeignKeyAction::NoAction),
        )
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(Transactions::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager.create_table(transactions_table(true)).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-user_id-date")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .col(Transactions::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(Transactions::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager.create_table(transactions_table(false)).await
    }
}
