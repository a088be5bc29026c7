//! API handlers and shared utilities.
//!
//! One module per route. Handlers delegate to [`AuthService`] and surface
//! failures as [`AuthError`], rendered here as a JSON error body with the
//! matching status code.

pub mod health;
pub mod login;
pub mod logout;
pub mod me;
pub mod password_reset;
pub mod refresh_token;
pub mod signup;

use crate::auth::{AccessClaims, AuthError, AuthService};
use axum::{
    Json,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// JSON error body, `{"error": "..."}`.
#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

/// JSON acknowledgement body, `{"message": "..."}`.
#[derive(Serialize, Debug)]
pub struct MessageBody {
    pub message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Reset-confirm dead ends render as 400, never 404, so responses
        // stay independent of whether a matching token row exists.
        let status = match &self {
            Self::Validation(_) | Self::NotFoundOrExpired => StatusCode::BAD_REQUEST,
            Self::Authentication | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// 400 with the generic undecodable-payload body.
pub(crate) fn invalid_request() -> Response {
    let body = ErrorBody {
        error: "invalid request".to_string(),
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// Resolve the Authorization header into verified access claims.
///
/// A missing or malformed header, a bad token, and a refresh token are all
/// rejected with the same generic failure.
///
/// # Errors
///
/// Fails with [`AuthError::InvalidToken`].
pub fn require_access_token(
    headers: &HeaderMap,
    service: &AuthService,
) -> Result<AccessClaims, AuthError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AuthError::InvalidToken)?;

    service.verify_access_token(token)
}
