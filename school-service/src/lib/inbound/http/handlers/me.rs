use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::ApiError;
use super::ApiSuccess;
use super::UserProfileData;
use crate::domain::user::access::Identity;
use crate::domain::user::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn me<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Extension(identity): Extension<Identity>,
) -> Result<ApiSuccess<UserProfileData>, ApiError> {
    state
        .auth_service
        .get_profile(&identity.user_id)
        .await
        .map_err(ApiError::from)
        .map(|ref profile| ApiSuccess::new(StatusCode::OK, profile.into()))
}
