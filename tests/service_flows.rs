#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use chrono::{Duration, Utc};
use rideaware::auth::repo::{AuthRepository, memory::MemoryRepository};
use rideaware::auth::service::{RESET_CONFIRM_ACK, RESET_REQUEST_ACK};
use rideaware::auth::token::{ACCESS_TOKEN_TTL_SECONDS, REFRESH_TOKEN_TTL_SECONDS};
use rideaware::auth::{AuthError, AuthService, ResetToken, SignupInput, TokenCodec, TokenKind};
use rideaware::email::EmailSender;
use secrecy::SecretString;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use url::Url;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Sent {
    Welcome { to: String },
    Reset { to: String, link: String },
}

/// Captures outbound email instead of sending it. Flipping `fail` makes
/// every send error, to exercise the best-effort delivery paths.
#[derive(Default)]
struct RecordingEmailSender {
    sent: Mutex<Vec<Sent>>,
    fail: AtomicBool,
}

impl RecordingEmailSender {
    fn sent(&self) -> Vec<Sent> {
        self.sent.lock().expect("mailer lock").clone()
    }

    fn fail_all_sends(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

impl EmailSender for RecordingEmailSender {
    fn send_welcome_email(&self, to_email: &str, _display_name: &str) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("smtp unreachable");
        }
        self.sent.lock().expect("mailer lock").push(Sent::Welcome {
            to: to_email.to_string(),
        });
        Ok(())
    }

    fn send_password_reset_email(
        &self,
        to_email: &str,
        _display_name: &str,
        reset_link: &str,
    ) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("smtp unreachable");
        }
        self.sent.lock().expect("mailer lock").push(Sent::Reset {
            to: to_email.to_string(),
            link: reset_link.to_string(),
        });
        Ok(())
    }
}

struct Harness {
    service: Arc<AuthService>,
    repo: Arc<MemoryRepository>,
    mailer: Arc<RecordingEmailSender>,
    codec: TokenCodec,
}

fn harness() -> Harness {
    let repo = Arc::new(MemoryRepository::new());
    let mailer = Arc::new(RecordingEmailSender::default());
    let codec = TokenCodec::new(SecretString::from("integration-test-signing-key"))
        .expect("codec");
    let base_url = Url::parse("https://rideaware.app").expect("base url");
    let service = Arc::new(AuthService::new(
        repo.clone(),
        mailer.clone(),
        codec.clone(),
        base_url,
    ));
    Harness {
        service,
        repo,
        mailer,
        codec,
    }
}

fn signup_input(username: &str, email: &str, password: &str) -> SignupInput {
    SignupInput {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        first_name: String::new(),
        last_name: String::new(),
    }
}

fn secret_from_link(link: &str) -> String {
    let url = Url::parse(link).expect("reset link");
    url.query_pairs()
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
        .expect("token query parameter")
}

#[tokio::test]
async fn signup_mints_a_verifiable_session() {
    let h = harness();

    let session = h
        .service
        .signup(signup_input("rider1", "rider1@example.com", "longenough1"))
        .await
        .expect("signup");

    assert_eq!(session.account.username, "rider1");
    assert_eq!(session.tokens.expires_in, ACCESS_TOKEN_TTL_SECONDS);

    let access = h
        .codec
        .verify(&session.tokens.access_token)
        .expect("access claims");
    assert_eq!(access.kind, TokenKind::Access);
    assert_eq!(access.username, "rider1");
    assert_eq!(access.email, "rider1@example.com");
    assert_eq!(access.iss, "rideaware");
    assert_eq!(access.exp - access.iat, ACCESS_TOKEN_TTL_SECONDS);
    assert_eq!(access.account_id().expect("subject"), session.account.id);

    let refresh = h
        .codec
        .verify(&session.tokens.refresh_token)
        .expect("refresh claims");
    assert_eq!(refresh.kind, TokenKind::Refresh);
    assert_eq!(refresh.exp - refresh.iat, REFRESH_TOKEN_TTL_SECONDS);

    assert_eq!(
        h.mailer.sent(),
        vec![Sent::Welcome {
            to: "rider1@example.com".to_string()
        }]
    );
}

#[tokio::test]
async fn signup_validates_before_touching_storage() {
    let h = harness();

    // Empty fields are reported before password length.
    let err = h
        .service
        .signup(signup_input("", "", "short"))
        .await
        .expect_err("empty input");
    assert!(matches!(err, AuthError::Validation(ref msg) if msg == "username and email are required"));

    let err = h
        .service
        .signup(signup_input("rider1", "not-an-email", "longenough1"))
        .await
        .expect_err("bad email");
    assert!(matches!(err, AuthError::Validation(ref msg) if msg == "invalid email format"));

    let err = h
        .service
        .signup(signup_input("rider1", "rider1@example.com", "short"))
        .await
        .expect_err("short password");
    assert!(matches!(
        err,
        AuthError::Validation(ref msg) if msg == "password must be at least 8 characters long"
    ));

    // Nothing was created along the way.
    let err = h
        .service
        .login("rider1", "longenough1")
        .await
        .expect_err("no account");
    assert!(matches!(err, AuthError::Authentication));
}

#[tokio::test]
async fn signup_conflicts_on_taken_username_or_email() {
    let h = harness();
    h.service
        .signup(signup_input("rider1", "rider1@example.com", "longenough1"))
        .await
        .expect("first signup");

    let err = h
        .service
        .signup(signup_input("rider1", "other@example.com", "longenough1"))
        .await
        .expect_err("username taken");
    assert!(matches!(err, AuthError::Conflict));

    let err = h
        .service
        .signup(signup_input("rider2", "rider1@example.com", "longenough1"))
        .await
        .expect_err("email taken");
    assert!(matches!(err, AuthError::Conflict));
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let h = harness();
    h.service
        .signup(signup_input("rider1", "rider1@example.com", "longenough1"))
        .await
        .expect("signup");

    let wrong_password = h
        .service
        .login("rider1", "wrong-password")
        .await
        .expect_err("wrong password");
    let unknown_user = h
        .service
        .login("ghost", "longenough1")
        .await
        .expect_err("unknown user");

    assert!(matches!(wrong_password, AuthError::Authentication));
    assert!(matches!(unknown_user, AuthError::Authentication));
    assert_eq!(wrong_password.to_string(), unknown_user.to_string());

    // Login is by username; the email address is not a login handle.
    let err = h
        .service
        .login("rider1@example.com", "longenough1")
        .await
        .expect_err("email as username");
    assert!(matches!(err, AuthError::Authentication));
}

#[tokio::test]
async fn refresh_accepts_only_refresh_tokens() {
    let h = harness();
    let session = h
        .service
        .signup(signup_input("rider1", "rider1@example.com", "longenough1"))
        .await
        .expect("signup");

    let err = h
        .service
        .refresh_access(&session.tokens.access_token)
        .expect_err("access token on refresh");
    assert!(matches!(err, AuthError::InvalidToken));

    let grant = h
        .service
        .refresh_access(&session.tokens.refresh_token)
        .expect("refresh");
    assert_eq!(grant.expires_in, ACCESS_TOKEN_TTL_SECONDS);

    let claims = h
        .service
        .verify_access_token(&grant.access_token)
        .expect("fresh access token");
    assert_eq!(claims.kind, TokenKind::Access);
    assert_eq!(claims.username, "rider1");
}

#[tokio::test]
async fn protected_routes_reject_refresh_and_tampered_tokens() {
    let h = harness();
    let session = h
        .service
        .signup(signup_input("rider1", "rider1@example.com", "longenough1"))
        .await
        .expect("signup");

    let err = h
        .service
        .verify_access_token(&session.tokens.refresh_token)
        .expect_err("refresh token on protected route");
    assert!(matches!(err, AuthError::InvalidToken));

    // Flip one character of the payload segment.
    let token = session.tokens.access_token;
    let mut parts: Vec<String> = token.split('.').map(ToString::to_string).collect();
    let payload = parts[1].clone();
    parts[1] = if payload.ends_with('A') {
        format!("{}B", &payload[..payload.len() - 1])
    } else {
        format!("{}A", &payload[..payload.len() - 1])
    };
    let tampered = parts.join(".");

    let err = h
        .service
        .verify_access_token(&tampered)
        .expect_err("tampered token");
    assert!(matches!(err, AuthError::InvalidToken));
}

#[tokio::test]
async fn access_claims_load_the_live_account() {
    let h = harness();
    let session = h
        .service
        .signup(signup_input("rider1", "rider1@example.com", "longenough1"))
        .await
        .expect("signup");

    let claims = h
        .service
        .verify_access_token(&session.tokens.access_token)
        .expect("claims");
    let account = h.service.account_for(&claims).await.expect("account");
    assert_eq!(account.id, session.account.id);
    assert_eq!(account.email, "rider1@example.com");

    // A well-signed token for an account that does not exist is rejected
    // like any other bad token.
    let orphan_token = h
        .codec
        .issue_access(Uuid::new_v4(), "ghost@example.com", "ghost")
        .expect("orphan token");
    let claims = h
        .service
        .verify_access_token(&orphan_token)
        .expect("orphan claims");
    let err = h
        .service
        .account_for(&claims)
        .await
        .expect_err("orphan account");
    assert!(matches!(err, AuthError::InvalidToken));
}

#[tokio::test]
async fn reset_requests_are_acknowledged_uniformly() {
    let h = harness();
    h.service
        .signup(signup_input("rider1", "rider1@example.com", "longenough1"))
        .await
        .expect("signup");

    let known = h
        .service
        .request_reset("rider1@example.com")
        .await
        .expect("known email");
    let unknown = h
        .service
        .request_reset("ghost@example.com")
        .await
        .expect("unknown email");

    assert_eq!(known, RESET_REQUEST_ACK);
    assert_eq!(known, unknown);

    // Only the registered address produced a token and an email.
    assert_eq!(h.repo.reset_token_count().await, 1);
    let sent = h.mailer.sent();
    let resets: Vec<&Sent> = sent
        .iter()
        .filter(|entry| matches!(entry, Sent::Reset { .. }))
        .collect();
    assert_eq!(resets.len(), 1);
    if let Sent::Reset { to, link } = resets[0] {
        assert_eq!(to, "rider1@example.com");
        assert!(link.starts_with("https://rideaware.app/reset-password?token="));
    }
}

#[tokio::test]
async fn email_outages_never_fail_the_operation() {
    let h = harness();
    h.mailer.fail_all_sends();

    let session = h
        .service
        .signup(signup_input("rider1", "rider1@example.com", "longenough1"))
        .await
        .expect("signup with failing mailer");
    assert_eq!(session.account.username, "rider1");

    let ack = h
        .service
        .request_reset("rider1@example.com")
        .await
        .expect("reset request with failing mailer");
    assert_eq!(ack, RESET_REQUEST_ACK);

    // The token was still issued; only delivery was lost.
    assert_eq!(h.repo.reset_token_count().await, 1);
    assert!(h.mailer.sent().is_empty());
}

#[tokio::test]
async fn confirm_reset_rotates_the_password_once() {
    let h = harness();
    h.service
        .signup(signup_input("rider1", "rider1@example.com", "longenough1"))
        .await
        .expect("signup");
    h.service
        .request_reset("rider1@example.com")
        .await
        .expect("request");

    let sent = h.mailer.sent();
    let link = sent
        .iter()
        .find_map(|entry| match entry {
            Sent::Reset { link, .. } => Some(link.clone()),
            Sent::Welcome { .. } => None,
        })
        .expect("reset email");
    let secret = secret_from_link(&link);

    let ack = h
        .service
        .confirm_reset(&secret, "rotated-password")
        .await
        .expect("confirm");
    assert_eq!(ack, RESET_CONFIRM_ACK);

    h.service
        .login("rider1", "rotated-password")
        .await
        .expect("login with new password");
    let err = h
        .service
        .login("rider1", "longenough1")
        .await
        .expect_err("old password");
    assert!(matches!(err, AuthError::Authentication));

    // The token is spent.
    let err = h
        .service
        .confirm_reset(&secret, "another-password")
        .await
        .expect_err("second confirm");
    assert!(matches!(err, AuthError::NotFoundOrExpired));
}

#[tokio::test]
async fn confirm_reset_checks_password_length_first() {
    let h = harness();

    let err = h
        .service
        .confirm_reset("no-such-token", "short")
        .await
        .expect_err("short password");
    assert!(matches!(err, AuthError::Validation(_)));

    let err = h
        .service
        .confirm_reset("no-such-token", "longenough1")
        .await
        .expect_err("unknown token");
    assert!(matches!(err, AuthError::NotFoundOrExpired));
}

#[tokio::test]
async fn expired_reset_tokens_are_inert() {
    let h = harness();
    let session = h
        .service
        .signup(signup_input("rider1", "rider1@example.com", "longenough1"))
        .await
        .expect("signup");

    let now = Utc::now();
    let stale = ResetToken {
        id: Uuid::new_v4(),
        user_id: session.account.id,
        secret: "stale-secret".to_string(),
        created_at: now - Duration::hours(2),
        expires_at: now - Duration::hours(1),
        consumed_at: None,
    };
    h.repo.create_reset_token(&stale).await.expect("seed token");

    let err = h
        .service
        .confirm_reset("stale-secret", "rotated-password")
        .await
        .expect_err("expired token");
    assert!(matches!(err, AuthError::NotFoundOrExpired));

    // The password is untouched.
    h.service
        .login("rider1", "longenough1")
        .await
        .expect("original password still valid");
}

#[tokio::test]
async fn concurrent_confirms_have_exactly_one_winner() {
    let h = harness();
    h.service
        .signup(signup_input("rider1", "rider1@example.com", "longenough1"))
        .await
        .expect("signup");
    h.service
        .request_reset("rider1@example.com")
        .await
        .expect("request");

    let sent = h.mailer.sent();
    let link = sent
        .iter()
        .find_map(|entry| match entry {
            Sent::Reset { link, .. } => Some(link.clone()),
            Sent::Welcome { .. } => None,
        })
        .expect("reset email");
    let secret = secret_from_link(&link);

    let mut tasks = Vec::new();
    for index in 0..8 {
        let service = h.service.clone();
        let secret = secret.clone();
        tasks.push(tokio::spawn(async move {
            let password = format!("contender-pass-{index}");
            let outcome = service.confirm_reset(&secret, &password).await;
            (password, outcome)
        }));
    }

    let mut winners = Vec::new();
    for task in tasks {
        let (password, outcome) = task.await.expect("join");
        match outcome {
            Ok(ack) => {
                assert_eq!(ack, RESET_CONFIRM_ACK);
                winners.push(password);
            }
            Err(err) => assert!(matches!(err, AuthError::NotFoundOrExpired)),
        }
    }
    assert_eq!(winners.len(), 1);

    // Only the winner's password opens the account.
    h.service
        .login("rider1", &winners[0])
        .await
        .expect("winner password");
    let err = h
        .service
        .login("rider1", "longenough1")
        .await
        .expect_err("pre-reset password");
    assert!(matches!(err, AuthError::Authentication));
}
