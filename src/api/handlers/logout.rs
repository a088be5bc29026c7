use crate::{api::handlers::MessageBody, auth::service::LOGOUT_ACK};
use axum::{Json, response::IntoResponse};

/// Tokens are stateless, so there is nothing to revoke server-side; clients
/// discard their tokens and the server acknowledges uniformly.
pub async fn logout() -> impl IntoResponse {
    Json(MessageBody {
        message: LOGOUT_ACK.to_string(),
    })
}
