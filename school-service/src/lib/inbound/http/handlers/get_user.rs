use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::ApiError;
use super::ApiSuccess;
use super::UserProfileData;
use crate::domain::user::access::AccessPolicy;
use crate::domain::user::access::Identity;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::AuthServicePort;
use crate::inbound::http::router::AppState;
use crate::user::errors::AuthError;

/// Owners may read their own record; admins may read any.
pub async fn get_user<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<String>,
) -> Result<ApiSuccess<UserProfileData>, ApiError> {
    let user_id = UserId::from_string(&user_id).map_err(AuthError::from)?;

    identity.authorize(AccessPolicy::SelfOrAdmin(user_id))?;

    state
        .auth_service
        .get_profile(&user_id)
        .await
        .map_err(ApiError::from)
        .map(|ref profile| ApiSuccess::new(StatusCode::OK, profile.into()))
}
