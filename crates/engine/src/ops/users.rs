use chrono::Utc;
use sea_orm::{ActiveValue, Condition, ConnectionTrait, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    EngineError, EngineEvent, ResultEngine, User, UserId, users,
    util::{normalize_email, normalize_username, required},
};

use super::{Engine, with_tx};

impl Engine {
    /// Store a new account and seed its default cards.
    ///
    /// `password_hash` must already be a PHC string; see
    /// [`Engine::register`] for the flow that hashes a plain password.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> ResultEngine<UserId> {
        let username = normalize_username(username)?;
        let email = normalize_email(email)?;
        let password_hash = required(password_hash, "password hash")?;

        let _guard = self.writer.lock().await;
        let user_id = with_tx!(self, |db_tx| {
            if let Some(existing) = Self::find_conflicting_user(&db_tx, &username, &email).await? {
                let taken = if existing.username == username {
                    username.clone()
                } else {
                    email.clone()
                };
                return Err(EngineError::Conflict(taken));
            }

            let model = users::ActiveModel {
                id: ActiveValue::NotSet,
                username: ActiveValue::Set(username.clone()),
                email: ActiveValue::Set(email.clone()),
                password_hash: ActiveValue::Set(password_hash),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            let user_id = UserId(model.id);
            self.seed_defaults_in(&db_tx, user_id).await?;
            Ok(user_id)
        })?;

        tracing::debug!(user_id = %user_id, "user created");
        Ok(user_id)
    }

    /// `true` if `username` (any case) or `email` is already registered.
    pub async fn is_user_exists(&self, username: &str, email: &str) -> ResultEngine<bool> {
        let username = normalize_username(username)?;
        let email = normalize_email(email)?;
        Ok(Self::find_conflicting_user(&self.database, &username, &email)
            .await?
            .is_some())
    }

    /// Case-insensitive exact lookup, returning the id and stored hash.
    pub async fn find_user_by_username(
        &self,
        username: &str,
    ) -> ResultEngine<Option<(UserId, String)>> {
        let username = normalize_username(username)?;
        let model = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.database)
            .await?;
        Ok(model.map(|model| (UserId(model.id), model.password_hash)))
    }

    pub async fn get_username(&self, user_id: UserId) -> ResultEngine<Option<String>> {
        Ok(self.user(user_id).await?.map(|user| user.username))
    }

    pub async fn user(&self, user_id: UserId) -> ResultEngine<Option<User>> {
        let model = users::Entity::find_by_id(user_id.0)
            .one(&self.database)
            .await?;
        Ok(model.map(User::from))
    }

    /// Delete the account; its transactions, budgets and cards go with it.
    pub async fn delete_user(&self, user_id: UserId) -> ResultEngine<()> {
        let _guard = self.writer.lock().await;
        with_tx!(self, |db_tx| {
            let result = users::Entity::delete_by_id(user_id.0).exec(&db_tx).await?;
            if result.rows_affected == 0 {
                return Err(EngineError::KeyNotFound(format!("user {user_id}")));
            }
            Ok(())
        })?;

        tracing::info!(user_id = %user_id, "user deleted");
        self.publish(EngineEvent::UserDeleted { user_id });
        Ok(())
    }

    async fn find_conflicting_user<C: ConnectionTrait>(
        db: &C,
        username: &str,
        email: &str,
    ) -> ResultEngine<Option<users::Model>> {
        Ok(users::Entity::find()
            .filter(
                Condition::any()
                    .add(users::Column::Username.eq(username))
                    .add(users::Column::Email.eq(email)),
            )
            .one(db)
            .await?)
    }
}
