use crate::{
    api::handlers::invalid_request,
    auth::{AuthService, AuthenticatedAccount, SignupInput},
};
use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

#[derive(Deserialize, Debug)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Token pair plus account identity, returned by signup and login.
#[derive(Serialize, Debug)]
pub struct SessionResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user_id: String,
    pub username: String,
    pub email: String,
}

impl From<AuthenticatedAccount> for SessionResponse {
    fn from(authenticated: AuthenticatedAccount) -> Self {
        Self {
            access_token: authenticated.tokens.access_token,
            refresh_token: authenticated.tokens.refresh_token,
            expires_in: authenticated.tokens.expires_in,
            user_id: authenticated.account.id.to_string(),
            username: authenticated.account.username,
            email: authenticated.account.email,
        }
    }
}

#[instrument(skip(service, payload))]
pub async fn signup(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<SignupRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return invalid_request();
    };

    let input = SignupInput {
        username: request.username,
        email: request.email,
        password: request.password,
        first_name: request.first_name,
        last_name: request.last_name,
    };

    match service.signup(input).await {
        Ok(authenticated) => (
            StatusCode::CREATED,
            Json(SessionResponse::from(authenticated)),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
