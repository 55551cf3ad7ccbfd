//! Budget ceilings, one per user and category.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Money, UserId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: UserId,
    pub category: String,
    pub amount: Money,
}

/// A budget next to what has been spent against it so far.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub budget: Budget,
    pub spent: Money,
    /// `spent / budget`; infinite when the ceiling is zero and something was spent.
    pub ratio: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: i64,
    pub category: String,
    pub category_norm: String,
    pub budget_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Budget {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: UserId(model.user_id),
            category: model.category,
            amount: Money::new(model.budget_minor),
        }
    }
}

/// Ratio of `spent` over `ceiling`.
pub(crate) fn ratio(spent: Money, ceiling: Money) -> f64 {
    if ceiling.is_zero() {
        return if spent.is_zero() { 0.0 } else { f64::INFINITY };
    }
    spent.as_f64() / ceiling.as_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_of_spend_over_ceiling() {
        assert_eq!(ratio(Money::new(5000), Money::new(10000)), 0.5);
        assert_eq!(ratio(Money::new(15000), Money::new(10000)), 1.5);
        assert_eq!(ratio(Money::ZERO, Money::ZERO), 0.0);
        assert!(ratio(Money::new(1), Money::ZERO).is_infinite());
    }
}
