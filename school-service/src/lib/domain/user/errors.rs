use thiserror::Error;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for FullName validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FullNameError {
    #[error("Full name must not be empty")]
    Empty,

    #[error("Full name too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },
}

/// Error for Role parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("Invalid role {0}. Must be one of: admin, teacher, student")]
    Unknown(String),
}

/// Error for outgoing email delivery
#[derive(Debug, Clone, Error)]
pub enum EmailDeliveryError {
    #[error("Email transport is not configured")]
    NotConfigured,

    #[error("Invalid mail address: {0}")]
    InvalidAddress(String),

    #[error("Failed to deliver email: {0}")]
    DeliveryFailed(String),
}

/// Top-level error for all authentication and account operations.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid user ID: {0}")]
    InvalidUserId(#[from] UserIdError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid full name: {0}")]
    InvalidFullName(#[from] FullNameError),

    #[error("{0}")]
    InvalidRole(#[from] RoleError),

    #[error("Invalid input: {0}")]
    Validation(String),

    // Domain-level errors
    #[error("Email already registered")]
    DuplicateEmail(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is deactivated")]
    AccountDeactivated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid or expired reset token")]
    InvalidOrExpiredToken,

    #[error("Invalid or expired token")]
    Unauthenticated,

    #[error("User not found: {0}")]
    NotFound(String),

    // Infrastructure errors
    #[error("Password error: {0}")]
    Password(#[from] auth::PasswordError),

    #[error("Token error: {0}")]
    Token(#[from] auth::JwtError),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
