use std::sync::Arc;

use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*,
    sea_query::{Expr, OnConflict, Order},
};

use crate::{
    Category, DEFAULT_CATEGORIES, EngineError, EngineEvent, Money, ResultEngine, UserId,
    categories,
    util::{normalize_category_display, normalize_category_key, required},
};

use super::{Engine, with_tx};

/// Icon of cards created implicitly by the aggregation pass.
const FALLBACK_ICON: &str = "ic_category";

impl Engine {
    /// Cards of `user_id` with their cached totals, in creation order.
    pub async fn list_categories(&self, user_id: UserId) -> ResultEngine<Vec<Category>> {
        Self::require_user(&self.database, user_id).await?;
        let cards = Self::category_models(&self.database, user_id).await?;
        Ok(cards.into_iter().map(Category::from).collect())
    }

    /// Add a user-defined card. Its total is computed from the existing log
    /// right away.
    pub async fn create_category(
        &self,
        user_id: UserId,
        label: &str,
        icon_ref: &str,
    ) -> ResultEngine<Category> {
        let label = normalize_category_display(label)?;
        let label_norm = normalize_category_key(&label)?;
        let icon_ref = required(icon_ref, "icon")?;

        let _guard = self.writer.lock().await;
        let snapshot = with_tx!(self, |db_tx| {
            Self::require_user(&db_tx, user_id).await?;
            let existing = categories::Entity::find_by_id((user_id.0, label_norm.clone()))
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(EngineError::Conflict(label));
            }
            categories::ActiveModel {
                user_id: ActiveValue::Set(user_id.0),
                label_norm: ActiveValue::Set(label_norm.clone()),
                label: ActiveValue::Set(label.clone()),
                icon_ref: ActiveValue::Set(icon_ref),
                amount_minor: ActiveValue::Set(0),
            }
            .insert(&db_tx)
            .await?;
            self.recompute_in(&db_tx, user_id).await
        })?;

        let created = snapshot
            .categories
            .iter()
            .find(|card| card.label == label)
            .cloned()
            .ok_or_else(|| EngineError::KeyNotFound(label.clone()))?;
        tracing::debug!(user_id = %user_id, label = %created.label, "category created");
        self.publish(EngineEvent::AggregatesUpdated(Arc::new(snapshot)));
        Ok(created)
    }

    /// Make sure the default cards exist. Existing cards are left alone.
    pub async fn seed_default_categories(&self, user_id: UserId) -> ResultEngine<()> {
        let _guard = self.writer.lock().await;
        with_tx!(self, |db_tx| {
            Self::require_user(&db_tx, user_id).await?;
            self.seed_defaults_in(&db_tx, user_id).await
        })
    }

    pub(super) async fn seed_defaults_in(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: UserId,
    ) -> ResultEngine<()> {
        let mut rows = Vec::with_capacity(DEFAULT_CATEGORIES.len());
        for (label, icon_ref) in DEFAULT_CATEGORIES {
            rows.push(categories::ActiveModel {
                user_id: ActiveValue::Set(user_id.0),
                label_norm: ActiveValue::Set(normalize_category_key(label)?),
                label: ActiveValue::Set(label.to_string()),
                icon_ref: ActiveValue::Set(icon_ref.to_string()),
                amount_minor: ActiveValue::Set(0),
            });
        }

        let result = categories::Entity::insert_many(rows)
            .on_conflict(
                OnConflict::columns([categories::Column::UserId, categories::Column::LabelNorm])
                    .do_nothing()
                    .to_owned(),
            )
            .exec(db_tx)
            .await;
        match result {
            Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Write a card total, creating the card if it does not exist yet.
    ///
    /// Only the aggregation pass calls this; card totals are derived values.
    pub(crate) async fn upsert_category_amount_in(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: UserId,
        label: &str,
        amount: Money,
    ) -> ResultEngine<()> {
        let label = normalize_category_display(label)?;
        let model = categories::ActiveModel {
            user_id: ActiveValue::Set(user_id.0),
            label_norm: ActiveValue::Set(normalize_category_key(&label)?),
            label: ActiveValue::Set(label),
            icon_ref: ActiveValue::Set(FALLBACK_ICON.to_string()),
            amount_minor: ActiveValue::Set(amount.cents()),
        };
        categories::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([categories::Column::UserId, categories::Column::LabelNorm])
                    .update_column(categories::Column::AmountMinor)
                    .to_owned(),
            )
            .exec(db_tx)
            .await?;
        Ok(())
    }

    pub(super) async fn category_models<C: ConnectionTrait>(
        db: &C,
        user_id: UserId,
    ) -> ResultEngine<Vec<categories::Model>> {
        Ok(categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id.0))
            .order_by(Expr::cust("rowid"), Order::Asc)
            .all(db)
            .await?)
    }
}
