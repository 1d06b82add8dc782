use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserProfileData;
use crate::domain::user::models::Role;
use crate::domain::user::models::UserProfile;
use crate::domain::user::ports::AuthServicePort;
use crate::inbound::http::router::AppState;
use crate::user::errors::AuthError;

pub async fn list_users<S: AuthServicePort>(
    State(state): State<AppState<S>>,
) -> Result<ApiSuccess<Vec<UserProfileData>>, ApiError> {
    state
        .auth_service
        .list_users()
        .await
        .map_err(ApiError::from)
        .map(|ref profiles| ApiSuccess::new(StatusCode::OK, to_data(profiles)))
}

pub async fn list_users_by_role<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Query(params): Query<RoleQuery>,
) -> Result<ApiSuccess<Vec<UserProfileData>>, ApiError> {
    let role: Role = params.role.parse().map_err(AuthError::from)?;

    state
        .auth_service
        .list_users_by_role(role)
        .await
        .map_err(ApiError::from)
        .map(|ref profiles| ApiSuccess::new(StatusCode::OK, to_data(profiles)))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoleQuery {
    role: String,
}

fn to_data(profiles: &[UserProfile]) -> Vec<UserProfileData> {
    profiles.iter().map(UserProfileData::from).collect()
}
