//! Password hashing for stored credentials.
//!
//! Passwords are hashed with Argon2id at the library's default cost and a
//! fresh random salt, producing a self-describing PHC string. Verification
//! delegates to the hash's own verify routine, so it never compares hash
//! values directly.

use crate::auth::error::AuthError;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use tracing::error;

/// Minimum accepted plaintext length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Message returned whenever a submitted password is too short.
pub const PASSWORD_TOO_SHORT: &str = "password must be at least 8 characters long";

/// Hash a plaintext password into a PHC string with a fresh random salt.
///
/// Two calls with the same plaintext produce different outputs.
///
/// # Errors
///
/// Returns [`AuthError::Validation`] when the plaintext is shorter than
/// [`MIN_PASSWORD_LEN`], and [`AuthError::Internal`] if hashing itself fails.
pub fn hash_password(plaintext: &str) -> Result<String, AuthError> {
    if plaintext.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::validation(PASSWORD_TOO_SHORT));
    }

    let salt = SaltString::generate(&mut OsRng);
    match Argon2::default().hash_password(plaintext.as_bytes(), &salt) {
        Ok(hash) => Ok(hash.to_string()),
        Err(err) => {
            error!("Failed to hash password: {err}");
            Err(AuthError::Internal)
        }
    }
}

/// Check a plaintext password against a stored PHC hash.
///
/// An unparseable stored hash counts as a mismatch rather than an error; the
/// caller cannot do anything else with it during login.
#[must_use]
pub fn verify_password(stored_hash: &str, plaintext: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}
