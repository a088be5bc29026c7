pub mod error;
pub mod models;
pub mod password;
pub mod repo;
pub mod reset;
pub mod service;
pub mod token;

pub use error::AuthError;
pub use models::{Account, ResetToken};
pub use service::{AuthService, AuthenticatedAccount, SessionTokens, SignupInput};
pub use token::{AccessClaims, TokenCodec, TokenKind};
