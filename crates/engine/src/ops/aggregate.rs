use std::sync::Arc;

use sea_orm::{ConnectionTrait, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    AggregateSnapshot, Category, EngineEvent, Money, ResultEngine, Summary, UserId,
    aggregate::{summarize, totals_by_category},
    transactions,
};

use super::{Engine, with_tx};

impl Engine {
    /// Rebuild every aggregate of `user_id` from its transaction log.
    ///
    /// Runs inside the caller's transaction so the recomputed card totals
    /// commit together with the mutation that triggered them. Defaults are
    /// seeded first, so a user that lost its cards gets them back here.
    pub(super) async fn recompute_in(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: UserId,
    ) -> ResultEngine<AggregateSnapshot> {
        self.seed_defaults_in(db_tx, user_id).await?;

        let rows = Self::transaction_models(db_tx, user_id).await?;
        let summary = summarize(&rows)?;
        let totals = totals_by_category(&rows)?;

        let cards = Self::category_models(db_tx, user_id).await?;
        let mut categories = Vec::with_capacity(cards.len());
        for card in cards {
            let amount = totals
                .get(card.label_norm.as_str())
                .copied()
                .unwrap_or_default();
            if card.amount_minor != amount.cents() {
                self.upsert_category_amount_in(db_tx, user_id, &card.label, amount)
                    .await?;
            }
            categories.push(Category {
                label: card.label,
                icon_ref: card.icon_ref,
                amount,
            });
        }

        tracing::debug!(
            user_id = %user_id,
            transactions = rows.len(),
            income = %summary.income,
            expense = %summary.expense,
            "aggregates recomputed"
        );
        Ok(AggregateSnapshot {
            user_id,
            summary,
            categories,
            transaction_count: rows.len(),
        })
    }

    /// Force a full recompute and publish the result.
    ///
    /// Mutations already recompute on their own; this exists for callers
    /// that want a fresh snapshot pushed to every subscriber.
    pub async fn recompute_aggregates(&self, user_id: UserId) -> ResultEngine<AggregateSnapshot> {
        let _guard = self.writer.lock().await;
        let snapshot = with_tx!(self, |db_tx| {
            Self::require_user(&db_tx, user_id).await?;
            self.recompute_in(&db_tx, user_id).await
        })?;
        self.publish(EngineEvent::AggregatesUpdated(Arc::new(snapshot.clone())));
        Ok(snapshot)
    }

    /// Income, expense and balance of `user_id`.
    pub async fn summary(&self, user_id: UserId) -> ResultEngine<Summary> {
        Self::require_user(&self.database, user_id).await?;
        let rows = Self::transaction_models(&self.database, user_id).await?;
        summarize(&rows)
    }

    /// Last committed aggregates, read in one transaction.
    pub async fn aggregates(&self, user_id: UserId) -> ResultEngine<AggregateSnapshot> {
        with_tx!(self, |db_tx| {
            Self::require_user(&db_tx, user_id).await?;
            let rows = Self::transaction_models(&db_tx, user_id).await?;
            let categories = Self::category_models(&db_tx, user_id)
                .await?
                .into_iter()
                .map(Category::from)
                .collect();
            Ok(AggregateSnapshot {
                user_id,
                summary: summarize(&rows)?,
                categories,
                transaction_count: rows.len(),
            })
        })
    }

    /// Sum of the amounts logged under `category_norm`, whatever their kind.
    pub(super) async fn logged_total<C: ConnectionTrait>(
        db: &C,
        user_id: UserId,
        category_norm: &str,
    ) -> ResultEngine<Money> {
        let rows = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id.0))
            .filter(transactions::Column::CategoryNorm.eq(category_norm))
            .all(db)
            .await?;
        Money::try_sum(rows.iter().map(|row| Money::new(row.amount_minor)))
    }
}
