//! # RideAware Accounts
//!
//! `rideaware` is the credential and session authority for the RideAware
//! fitness platform. It owns signup, login, token refresh, and the password
//! reset flow for rider accounts.
//!
//! ## Sessions (stateless tokens)
//!
//! Sessions are plain `HS256` bearer tokens: a short-lived access token
//! (15 minutes) paired with a longer-lived refresh token (7 days). Nothing is
//! stored server side, so a token is valid until it expires and rotating the
//! signing key invalidates every outstanding token at once.
//!
//! Refresh tokens are accepted only by the refresh endpoint; access tokens
//! are accepted only by protected routes. The token kind is carried in the
//! claims and checked by the caller, never by the codec itself.
//!
//! ## Passwords & Reset
//!
//! Passwords are hashed with `Argon2id` and never leave the server. The reset
//! flow issues a single-use random token that expires after one hour. A reset
//! token is consumed in the same transaction that writes the new password
//! hash, so when two resets race on the same token exactly one wins.
//!
//! ## Enumeration Resistance
//!
//! Responses never reveal whether an email or username exists:
//!
//! - Login failures return the same message for an unknown username and a
//!   wrong password.
//! - Password reset requests are acknowledged identically whether or not the
//!   email is registered.
//! - Invalid, expired, and already-used reset tokens are indistinguishable.

pub mod api;
pub mod auth;
pub mod cli;
pub mod email;
