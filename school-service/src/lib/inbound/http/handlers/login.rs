use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserProfileData;
use crate::domain::user::models::LoginOutcome;
use crate::domain::user::models::Role;
use crate::domain::user::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn login<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Json(body): Json<LoginRequestBody>,
) -> Result<ApiSuccess<TokenResponseData>, ApiError> {
    state
        .auth_service
        .login(&body.email, &body.password)
        .await
        .map_err(ApiError::from)
        .map(|ref outcome| ApiSuccess::new(StatusCode::OK, outcome.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequestBody {
    email: String,
    password: String,
}

/// Issued token plus the profile it was issued for. Shared with refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponseData {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub role: Role,
    pub profile: UserProfileData,
}

impl From<&LoginOutcome> for TokenResponseData {
    fn from(outcome: &LoginOutcome) -> Self {
        Self {
            access_token: outcome.access_token.clone(),
            token_type: outcome.token_type.to_string(),
            expires_in: outcome.expires_in_seconds,
            role: outcome.profile.role,
            profile: (&outcome.profile).into(),
        }
    }
}
