use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::login::TokenResponseData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::user::access::Identity;
use crate::domain::user::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn refresh_token<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Extension(identity): Extension<Identity>,
) -> Result<ApiSuccess<TokenResponseData>, ApiError> {
    state
        .auth_service
        .refresh_token(&identity)
        .await
        .map_err(ApiError::from)
        .map(|ref outcome| ApiSuccess::new(StatusCode::OK, outcome.into()))
}
