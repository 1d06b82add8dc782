use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use thiserror::Error;

use super::ApiError;
use super::ApiSuccess;
use super::UserProfileData;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::FullName;
use crate::domain::user::models::RegisterStudentCommand;
use crate::domain::user::ports::AuthServicePort;
use crate::inbound::http::router::AppState;
use crate::user::errors::EmailError;
use crate::user::errors::FullNameError;

pub async fn register_student<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Json(body): Json<RegisterStudentRequest>,
) -> Result<ApiSuccess<UserProfileData>, ApiError> {
    state
        .auth_service
        .register_student(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref profile| ApiSuccess::new(StatusCode::CREATED, profile.into()))
}

/// HTTP request body for student registration (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterStudentRequest {
    email: String,
    password: String,
    full_name: String,
    mobile: String,
    class_name: String,
    address: Option<String>,
}

#[derive(Debug, Clone, Error)]
pub(super) enum ParseRegistrationError {
    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid full name: {0}")]
    FullName(#[from] FullNameError),

    #[error("{0} must not be empty")]
    MissingField(&'static str),
}

impl From<ParseRegistrationError> for ApiError {
    fn from(err: ParseRegistrationError) -> Self {
        ApiError::UnprocessableEntity(err.to_string())
    }
}

pub(super) fn required(
    value: String,
    field: &'static str,
) -> Result<String, ParseRegistrationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ParseRegistrationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

impl RegisterStudentRequest {
    fn try_into_command(self) -> Result<RegisterStudentCommand, ParseRegistrationError> {
        Ok(RegisterStudentCommand {
            email: EmailAddress::new(self.email)?,
            full_name: FullName::new(self.full_name)?,
            mobile: required(self.mobile, "mobile")?,
            password: self.password,
            class_name: required(self.class_name, "className")?,
            address: self
                .address
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
        })
    }
}
