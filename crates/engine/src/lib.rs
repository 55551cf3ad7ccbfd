//! Local store and aggregation engine of the budget tracker.
//!
//! [`Engine`] is the only way in: it owns the database connection, scopes
//! every operation to an explicit [`UserId`] and keeps the per-category card
//! totals and the income/expense/balance summary consistent with the
//! transaction log. Changes are announced on a broadcast channel, see
//! [`Engine::subscribe`] and [`EngineEvent`].
//!
//! The acting user is never global state: callers keep a [`SessionStore`]
//! and pass the [`UserId`] it holds to each operation.

pub use aggregate::{AggregateSnapshot, Summary};
pub use auth::{Identity, generate_reset_token, hash_password, verify_password};
pub use budgets::{Budget, BudgetStatus};
pub use categories::{Category, DEFAULT_CATEGORIES};
pub use error::EngineError;
pub use events::EngineEvent;
pub use money::Money;
pub use ops::{Engine, EngineBuilder};
pub use session::{SessionContext, SessionStore};
pub use transactions::{Transaction, TransactionDraft, TransactionKind};
pub use users::{User, UserId};

mod aggregate;
mod auth;
mod budgets;
mod categories;
mod error;
mod events;
mod money;
mod ops;
mod session;
mod transactions;
mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
