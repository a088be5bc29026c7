use crate::{
    api::handlers::require_access_token,
    auth::{Account, AuthService},
};
use axum::{Json, extract::Extension, http::HeaderMap, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// Public view of an account; the password hash never leaves the server.
#[derive(Serialize, Debug)]
pub struct AccountResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.to_string(),
            username: account.username,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            created_at: account.created_at,
        }
    }
}

#[instrument(skip(service, headers))]
pub async fn me(service: Extension<Arc<AuthService>>, headers: HeaderMap) -> impl IntoResponse {
    let claims = match require_access_token(&headers, &service) {
        Ok(claims) => claims,
        Err(err) => return err.into_response(),
    };

    match service.account_for(&claims).await {
        Ok(account) => Json(AccountResponse::from(account)).into_response(),
        Err(err) => err.into_response(),
    }
}
