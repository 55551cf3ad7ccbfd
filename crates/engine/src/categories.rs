//! Category cards ("flashcards") per user.
//!
//! A card is a named spending bucket with a cached running total. The total
//! is owned by the aggregation pass; nothing else writes `amount_minor`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::Money;

/// Cards every user starts with: `(label, icon_ref)`.
pub const DEFAULT_CATEGORIES: [(&str, &str); 6] = [
    ("Food & Drink", "ic_food"),
    ("Transportation", "ic_transport"),
    ("Housing & Utilities", "ic_housing"),
    ("Personal Care", "ic_personal_care"),
    ("Shopping", "ic_shopping"),
    ("Salary", "ic_salary"),
];

/// Card as exposed to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub label: String,
    pub icon_ref: String,
    pub amount: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub label_norm: String,
    pub label: String,
    pub icon_ref: String,
    pub amount_minor: i64,
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

impl From<Model> for Category {
    fn from(model: Model) -> Self {
        Self {
            label: model.label,
            icon_ref: model.icon_ref,
            amount: Money::new(model.amount_minor),
        }
    }
}
