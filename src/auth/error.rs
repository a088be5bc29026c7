//! Failure taxonomy for the credential and session flows.
//!
//! Every operation on [`crate::auth::AuthService`] fails with one of these
//! variants. Display strings are the user-visible messages: authentication,
//! token, and reset failures stay deliberately coarse so responses never
//! reveal whether an account, token, or reset secret exists. Root causes are
//! logged where they occur and never travel up in the error value.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Input failed shape or length checks. The message is specific since it
    /// only describes the caller's own input.
    #[error("{0}")]
    Validation(String),

    /// Unknown username or wrong password. One message for both.
    #[error("invalid username or password")]
    Authentication,

    /// Malformed, tampered, expired, or wrong-kind bearer token.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Reset secret unknown, expired, or already consumed.
    #[error("invalid or expired reset token")]
    NotFoundOrExpired,

    /// Username or email already registered.
    #[error("username or email already exists")]
    Conflict,

    /// Storage, hashing, or signing failure. Cause is logged, not exposed.
    #[error("internal error")]
    Internal,
}

impl AuthError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
