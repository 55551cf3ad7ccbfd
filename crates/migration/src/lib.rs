//! Versioned schema for the local budget store.
//!
//! Migrations are applied in order by [`Migrator`]. [`prepare`] is the entry
//! point used at startup: it applies pending migrations and, if any step
//! fails, drops every table and rebuilds the schema empty.

pub use sea_orm_migration::prelude::*;

mod m20240105_090000_init;
mod m20240212_100000_flashcards;
mod m20240318_120000_transaction_type;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240105_090000_init::Migration),
            Box::new(m20240212_100000_flashcards::Migration),
            Box::new(m20240318_120000_transaction_type::Migration),
        ]
    }
}

/// What [`prepare`] had to do to bring the schema up to date.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchemaOutcome {
    /// Number of migrations that were pending before `prepare` ran.
    pub applied: usize,
    /// `true` when a migration failed and every table was dropped and recreated.
    ///
    /// All local data is gone in that case; callers must tell the user.
    pub recreated: bool,
}

/// Applies pending migrations, falling back to a full recreate on failure.
///
/// The fallback deletes all stored users, transactions, budgets and cards.
/// It is only acceptable because the store is a single-device cache; a
/// partially migrated schema is never left behind.
pub async fn prepare(db: &sea_orm::DatabaseConnection) -> Result<SchemaOutcome, DbErr> {
    let pending = Migrator::get_pending_migrations(db).await?.len();

    match Migrator::up(db, None).await {
        Ok(()) => {
            tracing::info!(applied = pending, "schema is up to date");
            Ok(SchemaOutcome {
                applied: pending,
                recreated: false,
            })
        }
        Err(err) => {
            tracing::error!(
                "schema migration failed ({err}); dropping all tables and recreating an empty \
                 schema, local data has been lost"
            );
            Migrator::fresh(db).await?;
            Ok(SchemaOutcome {
                applied: Migrator::migrations().len(),
                recreated: true,
            })
        }
    }
}
