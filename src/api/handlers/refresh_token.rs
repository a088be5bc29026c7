use crate::{api::handlers::invalid_request, auth::AuthService};
use axum::{Json, extract::Extension, response::IntoResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

#[derive(Deserialize, Debug)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Serialize, Debug)]
pub struct RefreshResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[instrument(skip(service, payload))]
pub async fn refresh_token(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<RefreshRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return invalid_request();
    };

    match service.refresh_access(&request.refresh_token) {
        Ok(grant) => Json(RefreshResponse {
            access_token: grant.access_token,
            expires_in: grant.expires_in,
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}
