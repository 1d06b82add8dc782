use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::register_student::required;
use super::register_student::ParseRegistrationError;
use super::ApiError;
use super::ApiSuccess;
use super::UserProfileData;
use crate::domain::user::access::Identity;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::FullName;
use crate::domain::user::models::RegisterTeacherCommand;
use crate::domain::user::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn register_teacher<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<RegisterTeacherRequest>,
) -> Result<ApiSuccess<UserProfileData>, ApiError> {
    state
        .auth_service
        .register_teacher(body.try_into_command()?, &identity.user_id)
        .await
        .map_err(ApiError::from)
        .map(|ref profile| ApiSuccess::new(StatusCode::CREATED, profile.into()))
}

/// HTTP request body for teacher registration (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTeacherRequest {
    email: String,
    password: String,
    full_name: String,
    mobile: String,
    subject: String,
}

impl RegisterTeacherRequest {
    fn try_into_command(self) -> Result<RegisterTeacherCommand, ParseRegistrationError> {
        Ok(RegisterTeacherCommand {
            email: EmailAddress::new(self.email)?,
            full_name: FullName::new(self.full_name)?,
            mobile: required(self.mobile, "mobile")?,
            password: self.password,
            subject: required(self.subject, "subject")?,
        })
    }
}
