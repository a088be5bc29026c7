//! Session orchestration.
//!
//! Ties the credential store, token codec, reset ledger, and repository
//! together into the five account-facing operations: signup, login, access
//! refresh, reset request, and reset confirmation. Every failure leaving
//! this module is an [`AuthError`]; underlying causes are logged here and
//! never shown to callers.
//!
//! Login is by username only. An email address in the username field fails
//! like any other unknown username.

use crate::{
    auth::{
        error::AuthError,
        models::Account,
        password::{MIN_PASSWORD_LEN, PASSWORD_TOO_SHORT, hash_password, verify_password},
        repo::{AuthRepository, StoreError},
        reset::ResetTokenLedger,
        token::{ACCESS_TOKEN_TTL_SECONDS, AccessClaims, TokenCodec, TokenKind},
    },
    email::EmailSender,
};
use chrono::Utc;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

/// Acknowledgement returned by every reset request, found or not.
pub const RESET_REQUEST_ACK: &str = "If email exists, reset link has been sent";

/// Acknowledgement returned by a successful reset confirmation.
pub const RESET_CONFIRM_ACK: &str = "Password reset successful";

/// Acknowledgement returned by logout. Tokens are stateless, so logout is
/// client-side discard; the server only acknowledges.
pub const LOGOUT_ACK: &str = "Logout successful";

#[derive(Debug, Clone)]
pub struct SignupInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Token pair minted on signup and login.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Access-token lifetime in seconds.
    pub expires_in: i64,
}

/// A fresh access token minted from a refresh token.
#[derive(Debug, Clone)]
pub struct AccessTokenGrant {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub account: Account,
    pub tokens: SessionTokens,
}

pub struct AuthService {
    repo: Arc<dyn AuthRepository>,
    ledger: ResetTokenLedger,
    codec: TokenCodec,
    mailer: Arc<dyn EmailSender>,
    base_url: Url,
}

impl AuthService {
    #[must_use]
    pub fn new(
        repo: Arc<dyn AuthRepository>,
        mailer: Arc<dyn EmailSender>,
        codec: TokenCodec,
        base_url: Url,
    ) -> Self {
        let ledger = ResetTokenLedger::new(Arc::clone(&repo));
        Self {
            repo,
            ledger,
            codec,
            mailer,
            base_url,
        }
    }

    /// Register a new account and mint its first session.
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::Validation`] on empty username/email, a
    /// malformed email, or a short password, with [`AuthError::Conflict`]
    /// when the username or email is taken, and with
    /// [`AuthError::Internal`] on storage or signing failures.
    pub async fn signup(&self, input: SignupInput) -> Result<AuthenticatedAccount, AuthError> {
        if input.username.is_empty() || input.email.is_empty() {
            return Err(AuthError::validation("username and email are required"));
        }
        if !valid_email(&input.email) {
            return Err(AuthError::validation("invalid email format"));
        }

        match self
            .repo
            .account_exists(&input.username, &input.email)
            .await
        {
            Ok(false) => {}
            Ok(true) => return Err(AuthError::Conflict),
            Err(err) => {
                error!("Failed to check account existence: {err}");
                return Err(AuthError::Internal);
            }
        }

        let password_hash = hash_password(&input.password)?;

        let account = Account {
            id: Uuid::new_v4(),
            username: input.username,
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            password_hash,
            active: true,
            created_at: Utc::now(),
        };

        match self.repo.create_account(&account).await {
            Ok(()) => {}
            // Lost the race against a concurrent signup with the same
            // username or email.
            Err(StoreError::Duplicate) => return Err(AuthError::Conflict),
            Err(err) => {
                error!("Failed to create account: {err}");
                return Err(AuthError::Internal);
            }
        }

        info!(username = %account.username, "Account created");

        let tokens = self.issue_session(&account)?;
        self.send_welcome_email(&account);

        Ok(AuthenticatedAccount { account, tokens })
    }

    /// Authenticate by username and password.
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::Authentication`] on an unknown username or a
    /// password mismatch; the two causes are indistinguishable for callers.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedAccount, AuthError> {
        let account = match self.repo.find_account_by_username(username).await {
            Ok(account) => account,
            Err(StoreError::NotFound) => return Err(AuthError::Authentication),
            Err(err) => {
                error!("Failed to look up account: {err}");
                return Err(AuthError::Internal);
            }
        };

        if !verify_password(&account.password_hash, password) {
            return Err(AuthError::Authentication);
        }

        let tokens = self.issue_session(&account)?;

        Ok(AuthenticatedAccount { account, tokens })
    }

    /// Mint a fresh access token from a refresh token. Stateless: the new
    /// token is built from the refresh token's own claims, no lookup.
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::InvalidToken`] when the token does not
    /// verify or is not a refresh token.
    pub fn refresh_access(&self, refresh_token: &str) -> Result<AccessTokenGrant, AuthError> {
        let claims = match self.codec.verify(refresh_token) {
            Ok(claims) => claims,
            Err(err) => {
                debug!("Refresh token rejected: {err}");
                return Err(AuthError::InvalidToken);
            }
        };
        if claims.kind != TokenKind::Refresh {
            return Err(AuthError::InvalidToken);
        }
        let account_id = claims.account_id().map_err(|_| AuthError::InvalidToken)?;

        let access_token = self
            .codec
            .issue_access(account_id, &claims.email, &claims.username)
            .map_err(|err| {
                error!("Failed to issue access token: {err}");
                AuthError::Internal
            })?;

        Ok(AccessTokenGrant {
            access_token,
            expires_in: ACCESS_TOKEN_TTL_SECONDS,
        })
    }

    /// Verify an access token presented against a protected operation.
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::InvalidToken`] when the token does not
    /// verify or is not an access token. A refresh token is rejected here
    /// even though its signature and expiry would pass.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let claims = match self.codec.verify(token) {
            Ok(claims) => claims,
            Err(err) => {
                debug!("Access token rejected: {err}");
                return Err(AuthError::InvalidToken);
            }
        };
        if claims.kind != TokenKind::Access {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }

    /// Load the account behind verified access claims. A token whose
    /// account no longer exists is rejected like any other bad token.
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::InvalidToken`] when no account matches the
    /// claims, or with [`AuthError::Internal`] on storage failures.
    pub async fn account_for(&self, claims: &AccessClaims) -> Result<Account, AuthError> {
        let account_id = claims.account_id().map_err(|_| AuthError::InvalidToken)?;
        match self.repo.find_account_by_id(account_id).await {
            Ok(account) => Ok(account),
            Err(StoreError::NotFound) => Err(AuthError::InvalidToken),
            Err(err) => {
                error!("Failed to load account: {err}");
                Err(AuthError::Internal)
            }
        }
    }

    /// Issue a reset token and email its link to the account.
    ///
    /// Returns the same acknowledgement whether or not the email is
    /// registered; an unknown email is a silent no-op. Responses are
    /// indistinguishable by account existence.
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::Internal`] only when the account was found
    /// and the token could not be stored.
    pub async fn request_reset(&self, email: &str) -> Result<&'static str, AuthError> {
        let account = match self.repo.find_account_by_email(email).await {
            Ok(account) => account,
            Err(StoreError::NotFound) => return Ok(RESET_REQUEST_ACK),
            Err(err) => {
                // Storage trouble gets the uniform acknowledgement too, so
                // the response stays independent of account existence.
                warn!("Failed to look up account for password reset: {err}");
                return Ok(RESET_REQUEST_ACK);
            }
        };

        let token = self.ledger.issue(account.id).await?;
        let link = self.reset_link(&token.secret);
        self.send_reset_email(&account, link.as_str());

        Ok(RESET_REQUEST_ACK)
    }

    /// Spend a reset token and set the new password, all or nothing.
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::Validation`] on a short password, with
    /// [`AuthError::NotFoundOrExpired`] when the secret is unusable for any
    /// reason, and with [`AuthError::Internal`] on storage failures. Under
    /// concurrent confirms with the same secret exactly one caller
    /// succeeds; the rest observe [`AuthError::NotFoundOrExpired`].
    pub async fn confirm_reset(
        &self,
        secret: &str,
        new_password: &str,
    ) -> Result<&'static str, AuthError> {
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::validation(PASSWORD_TOO_SHORT));
        }

        let token = self.ledger.validate(secret).await?;

        match self.repo.find_account_by_id(token.user_id).await {
            Ok(_) => {}
            Err(StoreError::NotFound) => return Err(AuthError::NotFoundOrExpired),
            Err(err) => {
                error!("Failed to look up account for password reset: {err}");
                return Err(AuthError::Internal);
            }
        }

        let password_hash = hash_password(new_password)?;

        self.ledger
            .consume_and_set_password(secret, &password_hash)
            .await?;

        info!("Password reset completed");

        Ok(RESET_CONFIRM_ACK)
    }

    fn issue_session(&self, account: &Account) -> Result<SessionTokens, AuthError> {
        let access_token = self
            .codec
            .issue_access(account.id, &account.email, &account.username)
            .map_err(|err| {
                error!("Failed to issue access token: {err}");
                AuthError::Internal
            })?;
        let refresh_token = self
            .codec
            .issue_refresh(account.id, &account.email, &account.username)
            .map_err(|err| {
                error!("Failed to issue refresh token: {err}");
                AuthError::Internal
            })?;

        Ok(SessionTokens {
            access_token,
            refresh_token,
            expires_in: ACCESS_TOKEN_TTL_SECONDS,
        })
    }

    fn reset_link(&self, secret: &str) -> Url {
        let mut link = self.base_url.clone();
        link.set_path("/reset-password");
        link.set_query(None);
        link.query_pairs_mut().append_pair("token", secret);
        link
    }

    // Email delivery never fails the surrounding operation.
    fn send_welcome_email(&self, account: &Account) {
        if let Err(err) = self
            .mailer
            .send_welcome_email(&account.email, account.display_name())
        {
            warn!("Failed to send welcome email: {err}");
        }
    }

    fn send_reset_email(&self, account: &Account, reset_link: &str) {
        if let Err(err) =
            self.mailer
                .send_password_reset_email(&account.email, account.display_name(), reset_link)
        {
            warn!("Failed to send password reset email: {err}");
        }
    }
}

fn valid_email(email: &str) -> bool {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .is_ok_and(|re| re.is_match(email))
}
