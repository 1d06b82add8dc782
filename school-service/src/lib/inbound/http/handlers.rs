use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::domain::user::models::Role;
use crate::domain::user::models::RoleDetails;
use crate::domain::user::models::UserProfile;
use crate::user::errors::AuthError;

pub mod change_password;
pub mod dashboard;
pub mod forgot_password;
pub mod get_user;
pub mod health;
pub mod list_users;
pub mod login;
pub mod me;
pub mod refresh_token;
pub mod register_student;
pub mod register_teacher;
pub mod reset_password;
pub mod update_user_status;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    UnprocessableEntity(String),
    BadRequest(String),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
}

impl ApiError {
    /// The single 401 used for every token failure.
    pub fn unauthenticated() -> Self {
        ApiError::Unauthorized(AuthError::Unauthenticated.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
        };

        (status, Json(ApiResponseBody::new_error(status, message))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated | AuthError::InvalidCredentials => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::Forbidden(_) | AuthError::AccountDeactivated => {
                ApiError::Forbidden(err.to_string())
            }
            AuthError::DuplicateEmail(_)
            | AuthError::InvalidOrExpiredToken
            | AuthError::Validation(_) => ApiError::BadRequest(err.to_string()),
            AuthError::NotFound(_) => ApiError::NotFound(err.to_string()),
            AuthError::InvalidUserId(_)
            | AuthError::InvalidEmail(_)
            | AuthError::InvalidFullName(_)
            | AuthError::InvalidRole(_) => ApiError::UnprocessableEntity(err.to_string()),
            AuthError::Password(_)
            | AuthError::Token(_)
            | AuthError::DatabaseError(_)
            | AuthError::Unknown(_) => {
                tracing::error!(error = %err, "Request failed");
                ApiError::InternalServerError("Internal server error".to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}

/// Body of endpoints that only confirm an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageData {
    pub message: String,
}

impl MessageData {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Public JSON shape of an account. Role attributes are flattened and only
/// present for the role that owns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileData {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub mobile: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admission_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
}

impl From<&UserProfile> for UserProfileData {
    fn from(profile: &UserProfile) -> Self {
        let mut data = Self {
            id: profile.id.to_string(),
            email: profile.email.as_str().to_string(),
            full_name: profile.full_name.as_str().to_string(),
            mobile: profile.mobile.clone(),
            role: profile.role,
            is_active: profile.is_active,
            created_at: profile.created_at,
            last_login: profile.last_login_at,
            class_name: None,
            admission_number: None,
            address: None,
            subject: None,
            employee_id: None,
        };

        match &profile.details {
            RoleDetails::Student(student) => {
                data.class_name = Some(student.class_name.clone());
                data.admission_number = Some(student.admission_number.clone());
                data.address = student.address.clone();
            }
            RoleDetails::Teacher(teacher) => {
                data.subject = Some(teacher.subject.clone());
                data.employee_id = Some(teacher.employee_id.clone());
            }
            RoleDetails::Admin(admin) => {
                data.employee_id = Some(admin.employee_id.clone());
            }
        }

        data
    }
}
