use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiSuccess;
use super::MessageData;
use crate::domain::user::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub const FORGOT_PASSWORD_MESSAGE: &str = "Password reset email sent (if email exists)";

/// Always answers 200 with the same message, whether or not the address is
/// registered and whether or not the reset could be stored.
pub async fn forgot_password<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Json(body): Json<ForgotPasswordRequest>,
) -> ApiSuccess<MessageData> {
    if let Err(e) = state.auth_service.request_password_reset(&body.email).await {
        tracing::error!(error = %e, "Password reset request failed");
    }

    ApiSuccess::new(StatusCode::OK, MessageData::new(FORGOT_PASSWORD_MESSAGE))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForgotPasswordRequest {
    email: String,
}
