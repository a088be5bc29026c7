//! Signed bearer-token codec.
//!
//! Tokens are compact JWS strings: three dot-separated base64url segments
//! (header, payload, signature) signed with HMAC-SHA256. Verification is
//! stateless: validity is computed from the signature and the embedded
//! timestamps, nothing is looked up. The codec does not know which token
//! kind a caller expects; kind enforcement belongs to the caller.
//!
//! Expiry is compared against the verifier's wall clock with no leeway
//! window.

use anyhow::{Result, ensure};
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Issuer tag embedded in every token.
pub const ISSUER: &str = "rideaware";

/// Access tokens expire 15 minutes after issuance.
pub const ACCESS_TOKEN_TTL_SECONDS: i64 = 15 * 60;

/// Refresh tokens expire 7 days after issuance.
pub const REFRESH_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

const ALG: &str = "HS256";

/// Discriminates the two bearer-token roles. A refresh token must never be
/// accepted where an access token is required, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Decoded token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Account id, stringified in transport.
    pub sub: String,
    pub email: String,
    pub username: String,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl AccessClaims {
    /// Parse the subject back into an account id.
    ///
    /// # Errors
    ///
    /// Fails with [`TokenError::Subject`] when the subject is not a UUID.
    pub fn account_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::Subject)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Why a token failed to sign or verify. Callers collapse every variant
/// into one generic failure before anything reaches a client.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Format,
    #[error("invalid base64 segment")]
    Base64,
    #[error("invalid JSON segment")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("signature mismatch")]
    Signature,
    #[error("unknown issuer")]
    Issuer,
    #[error("token expired")]
    Expired,
    #[error("invalid subject")]
    Subject,
}

/// Stateless issue/verify over a process-wide signing key.
///
/// The key is injected at construction and read-only afterwards, so a codec
/// can be shared freely across request tasks.
#[derive(Clone)]
pub struct TokenCodec {
    signing_key: SecretString,
}

impl TokenCodec {
    /// Build a codec around the configured signing key.
    ///
    /// # Errors
    ///
    /// Fails when the key is empty so a misconfigured service refuses to
    /// start instead of signing tokens with an empty key.
    pub fn new(signing_key: SecretString) -> Result<Self> {
        ensure!(
            !signing_key.expose_secret().is_empty(),
            "token signing key must not be empty"
        );
        Ok(Self { signing_key })
    }

    /// Issue a 15-minute access token.
    ///
    /// # Errors
    ///
    /// Fails only when payload serialization or signing fails.
    pub fn issue_access(
        &self,
        account_id: Uuid,
        email: &str,
        username: &str,
    ) -> Result<String, TokenError> {
        self.issue_at(
            account_id,
            email,
            username,
            TokenKind::Access,
            Utc::now().timestamp(),
        )
    }

    /// Issue a 7-day refresh token.
    ///
    /// # Errors
    ///
    /// Fails only when payload serialization or signing fails.
    pub fn issue_refresh(
        &self,
        account_id: Uuid,
        email: &str,
        username: &str,
    ) -> Result<String, TokenError> {
        self.issue_at(
            account_id,
            email,
            username,
            TokenKind::Refresh,
            Utc::now().timestamp(),
        )
    }

    /// Verify signature, issuer, and expiry against the current wall clock.
    ///
    /// # Errors
    ///
    /// Fails on malformed structure, bad base64 or JSON, an unsupported
    /// algorithm, a signature mismatch, a foreign issuer, or expiry.
    pub fn verify(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    fn issue_at(
        &self,
        account_id: Uuid,
        email: &str,
        username: &str,
        kind: TokenKind,
        now: i64,
    ) -> Result<String, TokenError> {
        let ttl = match kind {
            TokenKind::Access => ACCESS_TOKEN_TTL_SECONDS,
            TokenKind::Refresh => REFRESH_TOKEN_TTL_SECONDS,
        };
        let header = Header {
            alg: ALG.to_string(),
            typ: "JWT".to_string(),
        };
        let claims = AccessClaims {
            sub: account_id.to_string(),
            email: email.to_string(),
            username: username.to_string(),
            kind,
            iat: now,
            exp: now + ttl,
            iss: ISSUER.to_string(),
        };

        let header_b64 = Base64UrlUnpadded::encode_string(&serde_json::to_vec(&header)?);
        let payload_b64 = Base64UrlUnpadded::encode_string(&serde_json::to_vec(&claims)?);
        let signature_b64 = self.sign(&header_b64, &payload_b64)?;

        Ok(format!("{header_b64}.{payload_b64}.{signature_b64}"))
    }

    fn verify_at(&self, token: &str, now: i64) -> Result<AccessClaims, TokenError> {
        let mut segments = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::Format);
        };

        let header_bytes =
            Base64UrlUnpadded::decode_vec(header_b64).map_err(|_| TokenError::Base64)?;
        let header: Header = serde_json::from_slice(&header_bytes)?;
        if header.alg != ALG {
            return Err(TokenError::UnsupportedAlg(header.alg));
        }

        // Constant-time comparison via the MAC itself.
        let signature =
            Base64UrlUnpadded::decode_vec(signature_b64).map_err(|_| TokenError::Base64)?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::Signature)?;

        let payload_bytes =
            Base64UrlUnpadded::decode_vec(payload_b64).map_err(|_| TokenError::Base64)?;
        let claims: AccessClaims = serde_json::from_slice(&payload_bytes)?;

        if claims.iss != ISSUER {
            return Err(TokenError::Issuer);
        }
        if now >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn sign(&self, header_b64: &str, payload_b64: &str) -> Result<String, TokenError> {
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        Ok(Base64UrlUnpadded::encode_string(
            &mac.finalize().into_bytes(),
        ))
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.signing_key.expose_secret().as_bytes())
            .map_err(|_| TokenError::Signature)
    }
}
