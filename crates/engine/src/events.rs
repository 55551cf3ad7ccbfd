//! Change notifications published by the engine.
//!
//! Events are sent on a `tokio::sync::broadcast` channel after the mutation
//! that caused them has committed. All events are sent while the store's
//! write gate is held, so for any given user they arrive in commit order.
//! A slow subscriber may observe `RecvError::Lagged`; it should then re-read
//! the aggregates it cares about with [`Engine::aggregates`].
//!
//! [`Engine::aggregates`]: crate::Engine::aggregates

use std::sync::Arc;

use uuid::Uuid;

use crate::{AggregateSnapshot, UserId};

pub(crate) const DEFAULT_CAPACITY: usize = 64;

#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    /// The transaction log of `user_id` changed.
    TransactionsChanged {
        user_id: UserId,
        inserted: Option<Uuid>,
        deleted: Option<Uuid>,
    },
    /// Aggregates recomputed after a change; always follows the
    /// `TransactionsChanged` event that triggered it.
    AggregatesUpdated(Arc<AggregateSnapshot>),
    /// A budget ceiling was set or removed.
    BudgetsChanged { user_id: UserId },
    /// The user and every row it owned are gone.
    UserDeleted { user_id: UserId },
}

impl EngineEvent {
    pub fn user_id(&self) -> UserId {
        match self {
            Self::TransactionsChanged { user_id, .. }
            | Self::BudgetsChanged { user_id }
            | Self::UserDeleted { user_id } => *user_id,
            Self::AggregatesUpdated(snapshot) => snapshot.user_id,
        }
    }
}
