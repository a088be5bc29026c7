//! One-time password-reset tokens.
//!
//! Secrets carry 256 bits of CSPRNG entropy, encoded URL-safe so they can
//! ride in a query string. Whether a token is unknown, expired, or already
//! consumed is never distinguished for callers; every dead end maps to the
//! same [`AuthError::NotFoundOrExpired`].

use crate::auth::{
    error::AuthError,
    models::ResetToken,
    repo::{AuthRepository, StoreError},
};
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{Duration, Utc};
use rand::{RngCore, rngs::OsRng};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

/// Reset tokens expire one hour after issuance.
pub const RESET_TOKEN_TTL_SECONDS: i64 = 60 * 60;

const SECRET_BYTES: usize = 32;

pub struct ResetTokenLedger {
    repo: Arc<dyn AuthRepository>,
}

impl ResetTokenLedger {
    #[must_use]
    pub fn new(repo: Arc<dyn AuthRepository>) -> Self {
        Self { repo }
    }

    /// Mint and persist a fresh token for the account.
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::Internal`] when the token cannot be stored.
    pub async fn issue(&self, account_id: Uuid) -> Result<ResetToken, AuthError> {
        let mut entropy = [0u8; SECRET_BYTES];
        OsRng.fill_bytes(&mut entropy);
        let now = Utc::now();

        let token = ResetToken {
            id: Uuid::new_v4(),
            user_id: account_id,
            secret: Base64UrlUnpadded::encode_string(&entropy),
            created_at: now,
            expires_at: now + Duration::seconds(RESET_TOKEN_TTL_SECONDS),
            consumed_at: None,
        };

        if let Err(err) = self.repo.create_reset_token(&token).await {
            error!("Failed to persist reset token: {err}");
            return Err(AuthError::Internal);
        }

        Ok(token)
    }

    /// Look up a token and check it is still live.
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::NotFoundOrExpired`] when the secret is
    /// unknown, expired, or already consumed, or with
    /// [`AuthError::Internal`] on storage failures.
    pub async fn validate(&self, secret: &str) -> Result<ResetToken, AuthError> {
        let token = match self.repo.find_reset_token_by_secret(secret).await {
            Ok(token) => token,
            Err(StoreError::NotFound) => return Err(AuthError::NotFoundOrExpired),
            Err(err) => {
                error!("Failed to look up reset token: {err}");
                return Err(AuthError::Internal);
            }
        };

        if !token.is_valid(Utc::now()) {
            return Err(AuthError::NotFoundOrExpired);
        }

        Ok(token)
    }

    /// Spend the token and write the new password hash in one atomic unit.
    /// Of any number of concurrent calls with the same secret, exactly one
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::NotFoundOrExpired`] when the token is no
    /// longer spendable, or with [`AuthError::Internal`] on storage
    /// failures.
    pub async fn consume_and_set_password(
        &self,
        secret: &str,
        new_password_hash: &str,
    ) -> Result<(), AuthError> {
        match self
            .repo
            .consume_reset_and_update_password(secret, new_password_hash)
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => Err(AuthError::NotFoundOrExpired),
            Err(err) => {
                error!("Failed to consume reset token: {err}");
                Err(AuthError::Internal)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{models::Account, repo::memory::MemoryRepository};

    fn ledger() -> (Arc<MemoryRepository>, ResetTokenLedger) {
        let repo = Arc::new(MemoryRepository::new());
        let ledger = ResetTokenLedger::new(Arc::clone(&repo) as Arc<dyn AuthRepository>);
        (repo, ledger)
    }

    async fn seed_account(repo: &MemoryRepository) -> Account {
        let account = Account {
            id: Uuid::new_v4(),
            username: "rider1".to_string(),
            email: "rider1@example.com".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: "hash".to_string(),
            active: true,
            created_at: Utc::now(),
        };
        repo.create_account(&account).await.expect("seed account");
        account
    }

    #[tokio::test]
    async fn issued_secret_is_url_safe_and_long_enough() {
        let (repo, ledger) = ledger();
        let account = seed_account(&repo).await;

        let token = ledger.issue(account.id).await.expect("issue");

        // 32 bytes encode to 43 unpadded base64url characters.
        assert_eq!(token.secret.len(), 43);
        assert!(token
            .secret
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[tokio::test]
    async fn issued_token_expires_in_one_hour() {
        let (repo, ledger) = ledger();
        let account = seed_account(&repo).await;

        let token = ledger.issue(account.id).await.expect("issue");

        let ttl = token.expires_at - token.created_at;
        assert_eq!(ttl.num_seconds(), RESET_TOKEN_TTL_SECONDS);
        assert!(token.consumed_at.is_none());
    }

    #[tokio::test]
    async fn secrets_are_unique_per_issue() {
        let (repo, ledger) = ledger();
        let account = seed_account(&repo).await;

        let first = ledger.issue(account.id).await.expect("first");
        let second = ledger.issue(account.id).await.expect("second");
        assert_ne!(first.secret, second.secret);
    }

    #[tokio::test]
    async fn unknown_secret_fails_validation() {
        let (_repo, ledger) = ledger();

        let result = ledger.validate("no-such-secret").await;
        assert!(matches!(result, Err(AuthError::NotFoundOrExpired)));
    }

    #[tokio::test]
    async fn expired_secret_fails_validation() {
        let (repo, ledger) = ledger();
        let account = seed_account(&repo).await;

        let now = Utc::now();
        let stale = ResetToken {
            id: Uuid::new_v4(),
            user_id: account.id,
            secret: "stale-secret".to_string(),
            created_at: now - Duration::hours(2),
            expires_at: now - Duration::hours(1),
            consumed_at: None,
        };
        repo.create_reset_token(&stale).await.expect("seed token");

        let result = ledger.validate("stale-secret").await;
        assert!(matches!(result, Err(AuthError::NotFoundOrExpired)));
    }

    #[tokio::test]
    async fn consume_of_unknown_secret_is_rejected() {
        let (_repo, ledger) = ledger();

        let result = ledger.consume_and_set_password("no-such-secret", "hash").await;
        assert!(matches!(result, Err(AuthError::NotFoundOrExpired)));
    }

    #[tokio::test]
    async fn consume_spends_the_token_exactly_once() {
        let (repo, ledger) = ledger();
        let account = seed_account(&repo).await;
        let token = ledger.issue(account.id).await.expect("issue");

        ledger
            .consume_and_set_password(&token.secret, "new-hash")
            .await
            .expect("first consume");

        let second = ledger.consume_and_set_password(&token.secret, "other-hash").await;
        assert!(matches!(second, Err(AuthError::NotFoundOrExpired)));
    }
}
