use crate::{
    api::handlers::{invalid_request, signup::SessionResponse},
    auth::AuthService,
};
use axum::{Json, extract::Extension, response::IntoResponse};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[instrument(skip(service, payload))]
pub async fn login(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return invalid_request();
    };

    match service.login(&request.username, &request.password).await {
        Ok(authenticated) => Json(SessionResponse::from(authenticated)).into_response(),
        Err(err) => err.into_response(),
    }
}
