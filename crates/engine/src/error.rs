//! The module contains the errors the engine can return.
//!
//! The errors are:
//!
//! - [`Validation`] malformed input, rejected before any storage access.
//! - [`Conflict`] a username or email is already registered.
//! - [`Auth`] bad credentials; never says whether the user exists.
//! - [`NotConfigured`] no budget ceiling exists for a category.
//! - [`Storage`] the underlying database failed.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`Conflict`]: EngineError::Conflict
//!  [`Auth`]: EngineError::Auth
//!  [`NotConfigured`]: EngineError::NotConfigured
//!  [`Storage`]: EngineError::Storage
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("\"{0}\" already present!")]
    Conflict(String),
    #[error("Invalid credentials")]
    Auth,
    #[error("No budget configured for \"{0}\"")]
    NotConfigured(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Password hashing failed: {0}")]
    Password(String),
    #[error("Session store error: {0}")]
    Session(String),
    #[error(transparent)]
    Storage(DbErr),
}

impl EngineError {
    /// `true` for failures the caller can only report as "operation failed".
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Session(_) | Self::Password(_))
    }
}

impl From<DbErr> for EngineError {
    fn from(err: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            return Self::Conflict(detail);
        }
        tracing::error!("storage error: {err}");
        Self::Storage(err)
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Auth, Self::Auth) => true,
            (Self::NotConfigured(a), Self::NotConfigured(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Password(a), Self::Password(b)) => a == b,
            (Self::Session(a), Self::Session(b)) => a == b,
            (Self::Storage(a), Self::Storage(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
