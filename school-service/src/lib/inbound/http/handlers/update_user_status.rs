use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserProfileData;
use crate::domain::user::access::Identity;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::AuthServicePort;
use crate::inbound::http::router::AppState;
use crate::user::errors::AuthError;

pub async fn update_user_status<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateUserStatusRequest>,
) -> Result<ApiSuccess<UserProfileData>, ApiError> {
    let user_id = UserId::from_string(&user_id).map_err(AuthError::from)?;

    state
        .auth_service
        .set_user_active(&identity.user_id, &user_id, body.is_active)
        .await
        .map_err(ApiError::from)
        .map(|ref profile| ApiSuccess::new(StatusCode::OK, profile.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserStatusRequest {
    is_active: bool,
}
