use std::collections::HashMap;

use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Budget, BudgetStatus, EngineError, EngineEvent, Money, ResultEngine, UserId,
    aggregate::totals_by_category,
    budgets::{self, ratio},
    categories,
    util::{normalize_category_display, normalize_category_key},
};

use super::{Engine, with_tx};

impl Engine {
    pub async fn list_budgets(&self, user_id: UserId) -> ResultEngine<Vec<Budget>> {
        Self::require_user(&self.database, user_id).await?;
        let rows = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id.0))
            .order_by_asc(budgets::Column::CategoryNorm)
            .all(&self.database)
            .await?;
        Ok(rows.into_iter().map(Budget::from).collect())
    }

    /// Set the ceiling for `category`, replacing any previous one.
    ///
    /// Categories match case-insensitively, so "food" updates the budget
    /// created as "Food".
    pub async fn set_budget(
        &self,
        user_id: UserId,
        category: &str,
        amount: Money,
    ) -> ResultEngine<Budget> {
        if amount.is_negative() {
            return Err(EngineError::Validation(
                "budget amount must be >= 0".to_string(),
            ));
        }
        let category = normalize_category_display(category)?;
        let category_norm = normalize_category_key(&category)?;

        let _guard = self.writer.lock().await;
        let model = with_tx!(self, |db_tx| {
            Self::require_user(&db_tx, user_id).await?;
            let existing = Self::find_budget(&db_tx, user_id, &category_norm).await?;
            let model = match existing {
                Some(existing) => {
                    let mut active: budgets::ActiveModel = existing.into();
                    active.category = ActiveValue::Set(category.clone());
                    active.budget_minor = ActiveValue::Set(amount.cents());
                    active.update(&db_tx).await?
                }
                None => {
                    budgets::ActiveModel {
                        id: ActiveValue::Set(Uuid::new_v4()),
                        user_id: ActiveValue::Set(user_id.0),
                        category: ActiveValue::Set(category.clone()),
                        category_norm: ActiveValue::Set(category_norm.clone()),
                        budget_minor: ActiveValue::Set(amount.cents()),
                    }
                    .insert(&db_tx)
                    .await?
                }
            };
            Ok(model)
        })?;

        tracing::debug!(user_id = %user_id, category = %model.category, amount = %amount, "budget set");
        self.publish(EngineEvent::BudgetsChanged { user_id });
        Ok(Budget::from(model))
    }

    pub async fn remove_budget(&self, user_id: UserId, category: &str) -> ResultEngine<()> {
        let category = normalize_category_display(category)?;
        let category_norm = normalize_category_key(&category)?;

        let _guard = self.writer.lock().await;
        with_tx!(self, |db_tx| {
            let result = budgets::Entity::delete_many()
                .filter(budgets::Column::UserId.eq(user_id.0))
                .filter(budgets::Column::CategoryNorm.eq(category_norm.as_str()))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::NotConfigured(category));
            }
            Ok(())
        })?;

        tracing::debug!(user_id = %user_id, category = %category, "budget removed");
        self.publish(EngineEvent::BudgetsChanged { user_id });
        Ok(())
    }

    /// Spend so far over the ceiling configured for `category`.
    ///
    /// Spend is the card total last written by the aggregation pass; for a
    /// category without a card it is summed from the log.
    pub async fn budget_ratio(&self, user_id: UserId, category: &str) -> ResultEngine<f64> {
        let category = normalize_category_display(category)?;
        let category_norm = normalize_category_key(&category)?;

        with_tx!(self, |db_tx| {
            Self::require_user(&db_tx, user_id).await?;
            let Some(budget) = Self::find_budget(&db_tx, user_id, &category_norm).await? else {
                return Err(EngineError::NotConfigured(category));
            };
            let card = categories::Entity::find_by_id((user_id.0, category_norm.clone()))
                .one(&db_tx)
                .await?;
            let spent = match card {
                Some(card) => Money::new(card.amount_minor),
                None => Self::logged_total(&db_tx, user_id, &category_norm).await?,
            };
            Ok(ratio(spent, Money::new(budget.budget_minor)))
        })
    }

    /// Every budget with its current spend, ordered by category.
    pub async fn budget_overview(&self, user_id: UserId) -> ResultEngine<Vec<BudgetStatus>> {
        with_tx!(self, |db_tx| {
            Self::require_user(&db_tx, user_id).await?;
            let rows = budgets::Entity::find()
                .filter(budgets::Column::UserId.eq(user_id.0))
                .order_by_asc(budgets::Column::CategoryNorm)
                .all(&db_tx)
                .await?;
            if rows.is_empty() {
                return Ok(Vec::new());
            }

            let cards: HashMap<String, Money> = Self::category_models(&db_tx, user_id)
                .await?
                .into_iter()
                .map(|card| (card.label_norm, Money::new(card.amount_minor)))
                .collect();
            let log = Self::transaction_models(&db_tx, user_id).await?;
            let logged = totals_by_category(&log)?;

            let overview = rows
                .into_iter()
                .map(|row| {
                    let spent = cards
                        .get(&row.category_norm)
                        .or_else(|| logged.get(row.category_norm.as_str()))
                        .copied()
                        .unwrap_or_default();
                    let budget = Budget::from(row);
                    BudgetStatus {
                        ratio: ratio(spent, budget.amount),
                        budget,
                        spent,
                    }
                })
                .collect();
            Ok(overview)
        })
    }

    async fn find_budget<C: ConnectionTrait>(
        db: &C,
        user_id: UserId,
        category_norm: &str,
    ) -> ResultEngine<Option<budgets::Model>> {
        Ok(budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id.0))
            .filter(budgets::Column::CategoryNorm.eq(category_norm))
            .one(db)
            .await?)
    }
}
