//! In-memory repository for tests.
//!
//! A single async mutex around both tables makes the composed
//! consume-and-update operation atomic without a transaction.

use crate::auth::{
    models::{Account, ResetToken},
    repo::{AuthRepository, StoreError},
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryRepository {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    accounts: HashMap<Uuid, Account>,
    tokens: HashMap<String, ResetToken>,
}

impl MemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reset tokens ever stored, consumed ones included.
    pub async fn reset_token_count(&self) -> usize {
        self.inner.lock().await.tokens.len()
    }
}

#[async_trait]
impl AuthRepository for MemoryRepository {
    async fn create_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let taken = inner
            .accounts
            .values()
            .any(|existing| existing.username == account.username || existing.email == account.email);
        if taken {
            return Err(StoreError::Duplicate);
        }
        inner.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn account_exists(&self, username: &str, email: &str) -> Result<bool, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .accounts
            .values()
            .any(|account| account.username == username || account.email == email))
    }

    async fn find_account_by_username(&self, username: &str) -> Result<Account, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .accounts
            .values()
            .find(|account| account.username == username)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Account, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .accounts
            .values()
            .find(|account| account.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Account, StoreError> {
        let inner = self.inner.lock().await;
        inner.accounts.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn create_reset_token(&self, token: &ResetToken) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.tokens.contains_key(&token.secret) {
            return Err(StoreError::Duplicate);
        }
        inner.tokens.insert(token.secret.clone(), token.clone());
        Ok(())
    }

    async fn find_reset_token_by_secret(&self, secret: &str) -> Result<ResetToken, StoreError> {
        let inner = self.inner.lock().await;
        inner.tokens.get(secret).cloned().ok_or(StoreError::NotFound)
    }

    async fn consume_reset_and_update_password(
        &self,
        secret: &str,
        new_password_hash: &str,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();

        let user_id = match inner.tokens.get(secret) {
            Some(token) if token.is_valid(now) => token.user_id,
            _ => return Ok(false),
        };

        if !inner.accounts.contains_key(&user_id) {
            return Err(StoreError::NotFound);
        }

        if let Some(token) = inner.tokens.get_mut(secret) {
            token.consumed_at = Some(now);
        }
        if let Some(account) = inner.accounts.get_mut(&user_id) {
            account.password_hash = new_password_hash.to_string();
        }

        Ok(true)
    }
}
