use sea_orm::{ConnectionTrait, DatabaseConnection, prelude::*};
use tokio::sync::{Mutex, broadcast};

use crate::{EngineError, EngineEvent, ResultEngine, UserId, events};

mod aggregate;
mod auth;
mod budgets;
mod categories;
mod transactions;
mod users;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result: $crate::ResultEngine<_> = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Gateway to the local store.
///
/// Every mutation runs in one database transaction together with the
/// aggregate recompute it triggers, under a single writer gate. Readers
/// never see a changed log with stale card totals. Events are published
/// after commit, before the gate is released.
///
/// The gate is store-wide: writes for different users are serialized too,
/// so a slow mutation for one user delays every other writer. Reads do not
/// take it.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    /// Held for the whole of every mutation, whatever user it targets.
    writer: Mutex<()>,
    events: broadcast::Sender<EngineEvent>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Receive change notifications from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub fn database(&self) -> &DatabaseConnection {
        &self.database
    }

    fn publish(&self, event: EngineEvent) {
        // No subscriber is not an error.
        let _ = self.events.send(event);
    }

    async fn require_user<C: ConnectionTrait>(
        db: &C,
        user_id: UserId,
    ) -> ResultEngine<crate::users::Model> {
        crate::users::Entity::find_by_id(user_id.0)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {user_id}")))
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    event_capacity: Option<usize>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// How many undelivered events a slow subscriber may fall behind.
    pub fn event_capacity(mut self, capacity: usize) -> EngineBuilder {
        self.event_capacity = Some(capacity);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let capacity = self.event_capacity.unwrap_or(events::DEFAULT_CAPACITY);
        if capacity == 0 {
            return Err(EngineError::Validation(
                "event capacity must be > 0".to_string(),
            ));
        }
        let (events, _) = broadcast::channel(capacity);
        Ok(Engine {
            database: self.database,
            writer: Mutex::new(()),
            events,
        })
    }
}
