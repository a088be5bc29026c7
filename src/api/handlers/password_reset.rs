use crate::{
    api::handlers::{MessageBody, invalid_request},
    auth::AuthService,
};
use axum::{Json, extract::Extension, response::IntoResponse};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

#[derive(Deserialize, Debug)]
pub struct ResetRequestPayload {
    pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct ResetConfirmPayload {
    pub token: String,
    pub new_password: String,
}

/// The response is the same whether or not the email is registered.
#[instrument(skip(service, payload))]
pub async fn request_password_reset(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<ResetRequestPayload>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return invalid_request();
    };

    match service.request_reset(&request.email).await {
        Ok(ack) => Json(MessageBody {
            message: ack.to_string(),
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}

#[instrument(skip(service, payload))]
pub async fn confirm_password_reset(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<ResetConfirmPayload>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return invalid_request();
    };

    match service
        .confirm_reset(&request.token, &request.new_password)
        .await
    {
        Ok(ack) => Json(MessageBody {
            message: ack.to_string(),
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}
