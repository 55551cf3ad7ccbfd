//! Per-user category cards ("flashcards") with their cached running total.
//!
//! Keyed by `(user_id, label_norm)`. `amount_minor` is a cache recomputed from
//! `transactions`; it is never the source of truth.

use sea_orm_migration::prelude::*;

use crate::m20240105_090000_init::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Categories {
    Table,
    UserId,
    Label,
    LabelNorm,
    IconRef,
    AmountMinor,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Older layouts keyed cards by a surrogate id; there is nothing worth keeping.
        manager
            .drop_table(Table::drop().table(Categories::Table).if_exists().to_owned())
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .col(ColumnDef::new(Categories::UserId).integer().not_null())
                    .col(ColumnDef::new(Categories::Label).string().not_null())
                    .col(ColumnDef::new(Categories::LabelNorm).string().not_null())
                    .col(ColumnDef::new(Categories::IconRef).string().not_null())
                    .col(
                        ColumnDef::new(Categories::AmountMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(Categories::UserId)
                            .col(Categories::LabelNorm),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-categories-user_id")
                            .from(Categories::Table, Categories::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Categories::Table).if_exists().to_owned())
            .await
    }
}
