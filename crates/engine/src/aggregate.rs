//! Aggregates derived from the transaction log.
//!
//! Everything here is a pure function of a user's full transaction set. The
//! engine recomputes from scratch on every mutation (O(n) in the number of
//! transactions) instead of adjusting totals incrementally, so a cached
//! value can never drift away from the log.
//!
//! Conventions:
//! - a row counts as income iff its stored kind is `"income"` (any case);
//!   everything else is an expense;
//! - a card total is the plain sum of the amounts of every transaction whose
//!   category matches the card label, whatever its kind;
//! - `balance = income - expense`, always derived, never stored;
//! - a sum that leaves the `i64` cents range is a validation error, so the
//!   mutation that caused it rolls back.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Category, EngineError, Money, ResultEngine, TransactionKind, UserId, transactions};

/// Income/expense totals and their balance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub income: Money,
    pub expense: Money,
    pub balance: Money,
}

impl Summary {
    pub fn new(income: Money, expense: Money) -> ResultEngine<Self> {
        let balance = income
            .checked_sub(expense)
            .ok_or_else(|| EngineError::Validation("amount too large".to_string()))?;
        Ok(Self {
            income,
            expense,
            balance,
        })
    }
}

/// Consistent view of one user's aggregates after a recompute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    pub user_id: UserId,
    pub summary: Summary,
    pub categories: Vec<Category>,
    pub transaction_count: usize,
}

pub(crate) fn summarize(rows: &[transactions::Model]) -> ResultEngine<Summary> {
    let mut income = Money::ZERO;
    let mut expense = Money::ZERO;
    for row in rows {
        let amount = Money::new(row.amount_minor);
        match TransactionKind::from_stored(&row.kind) {
            TransactionKind::Income => income = income.try_add(amount)?,
            TransactionKind::Expense => expense = expense.try_add(amount)?,
        }
    }
    Summary::new(income, expense)
}

/// Totals keyed by normalized category.
pub(crate) fn totals_by_category(
    rows: &[transactions::Model],
) -> ResultEngine<HashMap<&str, Money>> {
    let mut totals: HashMap<&str, Money> = HashMap::new();
    for row in rows {
        let total = totals.entry(row.category_norm.as_str()).or_default();
        *total = total.try_add(Money::new(row.amount_minor))?;
    }
    Ok(totals)
}
