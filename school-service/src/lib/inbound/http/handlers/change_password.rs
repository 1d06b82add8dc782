use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::domain::user::access::Identity;
use crate::domain::user::ports::AuthServicePort;
use crate::inbound::http::router::AppState;
use crate::user::errors::AuthError;

pub async fn change_password<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    state
        .auth_service
        .change_password(&identity.user_id, &body.old_password, &body.new_password)
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredentials => {
                ApiError::BadRequest("Invalid old password".to_string())
            }
            _ => ApiError::from(e),
        })?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new("Password changed successfully"),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    old_password: String,
    new_password: String,
}
