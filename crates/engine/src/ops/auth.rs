use crate::{
    EngineError, Identity, ResultEngine, SessionContext, SessionStore, UserId,
    auth::{decoy_hash, hash_password, verify_password},
    util::{normalize_email, normalize_username, required},
};

use super::Engine;

impl Engine {
    /// Register a new account and return its id.
    ///
    /// Inputs are validated before anything is hashed or stored. The
    /// username is lowercased; the password is stored only as an Argon2 PHC
    /// string.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> ResultEngine<UserId> {
        let username = normalize_username(username)?;
        let email = normalize_email(email)?;
        if password.is_empty() {
            return Err(EngineError::Validation(
                "password must not be empty".to_string(),
            ));
        }
        if self.is_user_exists(&username, &email).await? {
            return Err(EngineError::Conflict(format!("{username} / {email}")));
        }

        let password_hash = hash_password(password)?;
        let user_id = self.create_user(&username, &email, &password_hash).await?;
        tracing::info!(user_id = %user_id, "user registered");
        Ok(user_id)
    }

    /// [`Engine::register`] behind a "repeat password" check.
    pub async fn register_with_confirmation(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirmation: &str,
    ) -> ResultEngine<UserId> {
        if password != confirmation {
            return Err(EngineError::Validation(
                "passwords do not match".to_string(),
            ));
        }
        self.register(username, email, password).await
    }

    /// Check credentials.
    ///
    /// An unknown username and a wrong password both yield
    /// [`EngineError::Auth`], and both pay for one hash verification.
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<Identity> {
        let username = required(username, "username")?;
        let found = self.find_user_by_username(&username).await?;

        let verified = match &found {
            Some((_, hash)) => verify_password(password, hash)?,
            None => {
                if let Some(decoy) = decoy_hash() {
                    let _ = verify_password(password, decoy);
                }
                false
            }
        };

        match found {
            Some((user_id, _)) if verified => {
                tracing::debug!(user_id = %user_id, "authenticated");
                Ok(Identity {
                    user_id,
                    username: normalize_username(&username)?,
                })
            }
            _ => {
                tracing::warn!("authentication failed");
                Err(EngineError::Auth)
            }
        }
    }

    /// Authenticate and persist the identity in `session`.
    pub async fn login(
        &self,
        session: &mut SessionStore,
        username: &str,
        password: &str,
    ) -> ResultEngine<SessionContext> {
        let identity = self.authenticate(username, password).await?;
        session.login(identity.user_id, &identity.username)?;
        tracing::info!(user_id = %identity.user_id, "user logged in");
        Ok(SessionContext::from(identity))
    }

    /// Re-validate a persisted session on cold start.
    ///
    /// A session naming a user that no longer exists is cleared.
    pub async fn restore_session(
        &self,
        session: &mut SessionStore,
    ) -> ResultEngine<Option<SessionContext>> {
        let Some(context) = session.current().cloned() else {
            return Ok(None);
        };
        match self.get_username(context.user_id).await? {
            Some(username) => Ok(Some(SessionContext {
                user_id: context.user_id,
                username,
            })),
            None => {
                tracing::warn!(user_id = %context.user_id, "session user no longer exists, logging out");
                session.logout()?;
                Ok(None)
            }
        }
    }
}
