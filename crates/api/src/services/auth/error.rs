//! Errors raised by account registration and login.

use thiserror::Error;

use crate::db::RepositoryError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] scoop_core::EmailError),

    /// Unknown email, wrong password, or an account that may not use this login.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("an account with this email already exists")]
    UserAlreadyExists,

    #[error("password rejected: {0}")]
    WeakPassword(String),

    /// Unknown role, or a role that cannot be assigned through this route.
    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("password hashing failed")]
    PasswordHash,
}
