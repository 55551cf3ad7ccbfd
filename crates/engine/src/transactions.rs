//! Transaction primitives.
//!
//! The transaction log is the single source of truth: every aggregate the
//! engine exposes (income, expense, balance, card totals) is recomputed from
//! these rows. A transaction is immutable once stored; it can only be deleted.

use std::str::FromStr;

use chrono::NaiveDate;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine, UserId,
    util::{normalize_category_display, normalize_category_key},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Classification used when reading stored rows.
    ///
    /// Only a case-insensitive `"income"` counts as income; anything else is
    /// treated as an expense.
    pub fn from_stored(value: &str) -> Self {
        if value.eq_ignore_ascii_case("income") {
            Self::Income
        } else {
            Self::Expense
        }
    }
}

impl FromStr for TransactionKind {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::Validation(format!(
                "invalid transaction type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: UserId,
    pub amount: Money,
    pub category: String,
    pub date: NaiveDate,
    pub kind: TransactionKind,
}

/// A validated, not yet stored transaction.
///
/// The only way to obtain one is [`TransactionDraft::new`] or
/// [`TransactionDraft::parse`], so a draft always has a positive amount, a
/// non-empty category and a known type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionDraft {
    amount: Money,
    category: String,
    category_norm: String,
    date: NaiveDate,
    kind: TransactionKind,
}

impl TransactionDraft {
    pub fn new(
        amount: Money,
        category: &str,
        date: NaiveDate,
        kind: TransactionKind,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::Validation(
                "amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            amount,
            category: normalize_category_display(category)?,
            category_norm: normalize_category_key(category)?,
            date,
            kind,
        })
    }

    /// Builds a draft from raw user input (`YYYY-MM-DD` dates,
    /// `income`/`expense` types in any case).
    pub fn parse(amount: &str, category: &str, date: &str, kind: &str) -> ResultEngine<Self> {
        let amount = Money::from_str(amount)?;
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|_| EngineError::Validation(format!("invalid date: {}", date.trim())))?;
        let kind = TransactionKind::from_str(kind)?;
        Self::new(amount, category, date, kind)
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub(crate) fn into_active_model(self, user_id: UserId) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            user_id: ActiveValue::Set(user_id.0),
            amount_minor: ActiveValue::Set(self.amount.cents()),
            category: ActiveValue::Set(self.category),
            category_norm: ActiveValue::Set(self.category_norm),
            date: ActiveValue::Set(self.date),
            kind: ActiveValue::Set(self.kind.as_str().to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: i64,
    pub amount_minor: i64,
    pub category: String,
    pub category_norm: String,
    pub date: Date,
    pub kind: String,
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

impl From<Model> for Transaction {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: UserId(model.user_id),
            amount: Money::new(model.amount_minor),
            category: model.category,
            date: model.date,
            kind: TransactionKind::from_stored(&model.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Income".parse::<TransactionKind>().unwrap(), TransactionKind::Income);
        assert_eq!(" EXPENSE ".parse::<TransactionKind>().unwrap(), TransactionKind::Expense);
        assert!("transfer".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn stored_kind_defaults_to_expense() {
        assert_eq!(TransactionKind::from_stored("INCOME"), TransactionKind::Income);
        assert_eq!(TransactionKind::from_stored("refund"), TransactionKind::Expense);
    }

    #[test]
    fn draft_rejects_non_positive_amounts() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        for cents in [0, -1, -500] {
            let err = TransactionDraft::new(Money::new(cents), "Food", date, TransactionKind::Expense)
                .unwrap_err();
            assert!(matches!(err, EngineError::Validation(_)));
        }
    }

    #[test]
    fn draft_parse_validates_every_field() {
        let draft = TransactionDraft::parse("120.50", " Food  & Drink", "2024-01-02", "expense")
            .unwrap();
        assert_eq!(draft.amount(), Money::new(12050));
        assert_eq!(draft.category(), "Food & Drink");
        assert_eq!(draft.kind(), TransactionKind::Expense);

        assert!(TransactionDraft::parse("abc", "Food", "2024-01-02", "expense").is_err());
        assert!(TransactionDraft::parse("10", "Food", "02/01/2024", "expense").is_err());
        assert!(TransactionDraft::parse("10", "Food", "2024-01-02", "gift").is_err());
        assert!(TransactionDraft::parse("10", "  ", "2024-01-02", "income").is_err());
    }
}
