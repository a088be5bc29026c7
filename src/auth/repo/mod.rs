//! Persistence seam for accounts and reset tokens.
//!
//! Two backends implement [`AuthRepository`]: [`postgres::PgAuthRepository`]
//! for the running service and [`memory::MemoryRepository`] for tests. The
//! trait exposes coarse operations only; in particular, consuming a reset
//! token and writing the new password hash is a single composed operation so
//! a caller cannot produce a half-applied reset.

pub mod memory;
pub mod postgres;

use crate::auth::models::{Account, ResetToken};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Storage failures, pre-sorted for the service layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("duplicate key")]
    Duplicate,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// Insert a new account.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::Duplicate`] when the username or email is
    /// already registered.
    async fn create_account(&self, account: &Account) -> Result<(), StoreError>;

    /// Whether an account with the given username or email already exists.
    ///
    /// # Errors
    ///
    /// Fails on backend errors only.
    async fn account_exists(&self, username: &str, email: &str) -> Result<bool, StoreError>;

    /// # Errors
    ///
    /// Fails with [`StoreError::NotFound`] when no account matches.
    async fn find_account_by_username(&self, username: &str) -> Result<Account, StoreError>;

    /// # Errors
    ///
    /// Fails with [`StoreError::NotFound`] when no account matches.
    async fn find_account_by_email(&self, email: &str) -> Result<Account, StoreError>;

    /// # Errors
    ///
    /// Fails with [`StoreError::NotFound`] when no account matches.
    async fn find_account_by_id(&self, id: Uuid) -> Result<Account, StoreError>;

    /// Persist a freshly issued reset token.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::Duplicate`] on a secret collision.
    async fn create_reset_token(&self, token: &ResetToken) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Fails with [`StoreError::NotFound`] when no token matches the secret.
    async fn find_reset_token_by_secret(&self, secret: &str) -> Result<ResetToken, StoreError>;

    /// Mark the token consumed and write the new password hash as one atomic
    /// unit. Returns `false` without writing anything when the token is
    /// missing, expired, or already consumed; under concurrent calls with the
    /// same secret exactly one caller observes `true`.
    ///
    /// # Errors
    ///
    /// Fails on backend errors, or with [`StoreError::NotFound`] when the
    /// token was claimed but its account no longer exists.
    async fn consume_reset_and_update_password(
        &self,
        secret: &str,
        new_password_hash: &str,
    ) -> Result<bool, StoreError>;
}
