//! Postgres-backed repository.

use crate::auth::{
    models::{Account, ResetToken},
    repo::{AuthRepository, StoreError},
};
use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{Instrument, info_span};
use uuid::Uuid;

#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_account(&self, query: &str, value: &str) -> Result<Account, StoreError> {
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );

        sqlx::query_as::<_, Account>(query)
            .bind(value)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("Failed to fetch account")?
            .ok_or(StoreError::NotFound)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait]
impl AuthRepository for PgAuthRepository {
    async fn create_account(&self, account: &Account) -> Result<(), StoreError> {
        let query = r"
            INSERT INTO accounts
            (id, username, email, first_name, last_name, password_hash, active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";

        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );

        let result = sqlx::query(query)
            .bind(account.id)
            .bind(&account.username)
            .bind(&account.email)
            .bind(&account.first_name)
            .bind(&account.last_name)
            .bind(&account.password_hash)
            .bind(account.active)
            .bind(account.created_at)
            .execute(&self.pool)
            .instrument(span)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Duplicate),
            Err(err) => Err(anyhow::Error::new(err)
                .context("Failed to insert account")
                .into()),
        }
    }

    async fn account_exists(&self, username: &str, email: &str) -> Result<bool, StoreError> {
        let query = r"SELECT EXISTS (SELECT 1 FROM accounts WHERE username = $1 OR email = $2)";

        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );

        let (exists,): (bool,) = sqlx::query_as(query)
            .bind(username)
            .bind(email)
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .context("Failed to check account existence")?;

        Ok(exists)
    }

    async fn find_account_by_username(&self, username: &str) -> Result<Account, StoreError> {
        let query = r"
            SELECT id, username, email, first_name, last_name, password_hash, active, created_at
            FROM accounts WHERE username = $1";

        self.fetch_account(query, username).await
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Account, StoreError> {
        let query = r"
            SELECT id, username, email, first_name, last_name, password_hash, active, created_at
            FROM accounts WHERE email = $1";

        self.fetch_account(query, email).await
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Account, StoreError> {
        let query = r"
            SELECT id, username, email, first_name, last_name, password_hash, active, created_at
            FROM accounts WHERE id = $1";

        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );

        sqlx::query_as::<_, Account>(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("Failed to fetch account by id")?
            .ok_or(StoreError::NotFound)
    }

    async fn create_reset_token(&self, token: &ResetToken) -> Result<(), StoreError> {
        let query = r"
            INSERT INTO password_reset_tokens
            (id, user_id, secret, created_at, expires_at, consumed_at)
            VALUES ($1, $2, $3, $4, $5, $6)";

        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );

        let result = sqlx::query(query)
            .bind(token.id)
            .bind(token.user_id)
            .bind(&token.secret)
            .bind(token.created_at)
            .bind(token.expires_at)
            .bind(token.consumed_at)
            .execute(&self.pool)
            .instrument(span)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Duplicate),
            Err(err) => Err(anyhow::Error::new(err)
                .context("Failed to insert reset token")
                .into()),
        }
    }

    async fn find_reset_token_by_secret(&self, secret: &str) -> Result<ResetToken, StoreError> {
        let query = r"
            SELECT id, user_id, secret, created_at, expires_at, consumed_at
            FROM password_reset_tokens WHERE secret = $1";

        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );

        sqlx::query_as::<_, ResetToken>(query)
            .bind(secret)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("Failed to fetch reset token")?
            .ok_or(StoreError::NotFound)
    }

    async fn consume_reset_and_update_password(
        &self,
        secret: &str,
        new_password_hash: &str,
    ) -> Result<bool, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        // The conditional UPDATE claims the token. Row locking guarantees
        // that of any number of concurrent claims on the same secret,
        // exactly one sees a matching row.
        let claim_query = r"
            UPDATE password_reset_tokens
            SET consumed_at = NOW()
            WHERE secret = $1 AND consumed_at IS NULL AND expires_at > NOW()
            RETURNING user_id";

        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = claim_query
        );

        let claimed: Option<(Uuid,)> = sqlx::query_as(claim_query)
            .bind(secret)
            .fetch_optional(&mut *tx)
            .instrument(span)
            .await
            .context("Failed to claim reset token")?;

        let Some((user_id,)) = claimed else {
            tx.rollback()
                .await
                .context("Failed to rollback transaction")?;
            return Ok(false);
        };

        let update_query = r"UPDATE accounts SET password_hash = $1 WHERE id = $2";

        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = update_query
        );

        let updated = sqlx::query(update_query)
            .bind(new_password_hash)
            .bind(user_id)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("Failed to update password hash")?;

        if updated.rows_affected() == 0 {
            tx.rollback()
                .await
                .context("Failed to rollback transaction")?;
            return Err(StoreError::NotFound);
        }

        tx.commit().await.context("Failed to commit transaction")?;

        Ok(true)
    }
}
