use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{
    ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::{Expr, Order},
};
use uuid::Uuid;

use crate::{
    EngineError, EngineEvent, Money, ResultEngine, Transaction, TransactionDraft, TransactionKind,
    UserId, transactions,
};

use super::{Engine, with_tx};

impl Engine {
    /// Every transaction of `user_id`, newest date first.
    ///
    /// Rows sharing a date are returned most recently inserted first.
    pub async fn list_transactions(&self, user_id: UserId) -> ResultEngine<Vec<Transaction>> {
        Self::require_user(&self.database, user_id).await?;
        let rows = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id.0))
            .order_by_desc(transactions::Column::Date)
            .order_by(Expr::cust("rowid"), Order::Desc)
            .all(&self.database)
            .await?;
        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    /// Validate and store a transaction, then recompute the user's aggregates.
    pub async fn add_transaction(
        &self,
        user_id: UserId,
        amount: Money,
        category: &str,
        date: NaiveDate,
        kind: TransactionKind,
    ) -> ResultEngine<Transaction> {
        let draft = TransactionDraft::new(amount, category, date, kind)?;
        self.insert_transaction(user_id, draft).await
    }

    /// Store an already validated draft.
    ///
    /// The insert and the aggregate recompute commit together. Subscribers
    /// receive `TransactionsChanged` followed by `AggregatesUpdated`.
    pub async fn insert_transaction(
        &self,
        user_id: UserId,
        draft: TransactionDraft,
    ) -> ResultEngine<Transaction> {
        let _guard = self.writer.lock().await;
        let (model, snapshot) = with_tx!(self, |db_tx| {
            Self::require_user(&db_tx, user_id).await?;
            let model = draft.into_active_model(user_id).insert(&db_tx).await?;
            let snapshot = self.recompute_in(&db_tx, user_id).await?;
            Ok((model, snapshot))
        })?;

        tracing::debug!(
            user_id = %user_id,
            transaction_id = %model.id,
            amount = %Money::new(model.amount_minor),
            kind = %model.kind,
            "transaction inserted"
        );
        self.publish(EngineEvent::TransactionsChanged {
            user_id,
            inserted: Some(model.id),
            deleted: None,
        });
        self.publish(EngineEvent::AggregatesUpdated(Arc::new(snapshot)));
        Ok(Transaction::from(model))
    }

    /// Remove one of `user_id`'s transactions and recompute its aggregates.
    pub async fn delete_transaction(
        &self,
        user_id: UserId,
        transaction_id: Uuid,
    ) -> ResultEngine<()> {
        let _guard = self.writer.lock().await;
        let snapshot = with_tx!(self, |db_tx| {
            let result = transactions::Entity::delete_many()
                .filter(transactions::Column::Id.eq(transaction_id))
                .filter(transactions::Column::UserId.eq(user_id.0))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::KeyNotFound(format!(
                    "transaction {transaction_id}"
                )));
            }
            self.recompute_in(&db_tx, user_id).await
        })?;

        tracing::debug!(user_id = %user_id, transaction_id = %transaction_id, "transaction deleted");
        self.publish(EngineEvent::TransactionsChanged {
            user_id,
            inserted: None,
            deleted: Some(transaction_id),
        });
        self.publish(EngineEvent::AggregatesUpdated(Arc::new(snapshot)));
        Ok(())
    }

    pub(super) async fn transaction_models<C: ConnectionTrait>(
        db: &C,
        user_id: UserId,
    ) -> ResultEngine<Vec<transactions::Model>> {
        Ok(transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id.0))
            .all(db)
            .await?)
    }
}
