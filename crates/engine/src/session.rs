//! Persisted identity of the signed-in user.
//!
//! The session is a small JSON record kept next to the database. It has no
//! expiry: it stays valid until [`SessionStore::logout`] or until the user it
//! names disappears, which [`Engine::restore_session`] checks on cold start.
//!
//! [`Engine::restore_session`]: crate::Engine::restore_session

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{EngineError, Identity, ResultEngine, UserId};

/// The acting user, handed explicitly to whatever needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: UserId,
    pub username: String,
}

impl From<Identity> for SessionContext {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.user_id,
            username: identity.username,
        }
    }
}

#[derive(Debug)]
pub struct SessionStore {
    path: Option<PathBuf>,
    current: Option<SessionContext>,
}

impl SessionStore {
    /// Load the session persisted at `path`; a missing file means signed out.
    pub fn open(path: impl Into<PathBuf>) -> ResultEngine<Self> {
        let path = path.into();
        let current = match fs::read_to_string(&path) {
            Ok(content) => {
                let stored: SessionContext = serde_json::from_str(&content)
                    .map_err(|err| EngineError::Session(format!("corrupt session file: {err}")))?;
                // Non-positive ids are the "signed out" sentinel.
                (stored.user_id.0 > 0).then_some(stored)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => return Err(EngineError::Session(err.to_string())),
        };
        Ok(Self {
            path: Some(path),
            current,
        })
    }

    /// A session that lives only as long as the process.
    pub fn ephemeral() -> Self {
        Self {
            path: None,
            current: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Persist `user_id`/`username`, replacing any previous session.
    pub fn login(&mut self, user_id: UserId, username: &str) -> ResultEngine<()> {
        let context = SessionContext {
            user_id,
            username: username.to_string(),
        };
        if let Some(path) = &self.path {
            write_atomically(path, &context)?;
        }
        tracing::info!(user_id = %user_id, "session opened");
        self.current = Some(context);
        Ok(())
    }

    pub fn is_logged_in(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_user_id(&self) -> Option<UserId> {
        self.current.as_ref().map(|ctx| ctx.user_id)
    }

    pub fn current(&self) -> Option<&SessionContext> {
        self.current.as_ref()
    }

    /// Forget the persisted identity. Logging out twice is not an error.
    pub fn logout(&mut self) -> ResultEngine<()> {
        if let Some(path) = &self.path {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(EngineError::Session(err.to_string())),
            }
        }
        if let Some(previous) = self.current.take() {
            tracing::info!(user_id = %previous.user_id, "session closed");
        }
        Ok(())
    }
}

fn write_atomically(path: &Path, context: &SessionContext) -> ResultEngine<()> {
    let io_err = |err: std::io::Error| EngineError::Session(err.to_string());
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let payload = serde_json::to_string_pretty(context)
        .map_err(|err| EngineError::Session(err.to_string()))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, payload).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)
}
