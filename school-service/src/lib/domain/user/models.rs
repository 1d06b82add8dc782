use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::user::errors::EmailError;
use crate::user::errors::FullNameError;
use crate::user::errors::RoleError;
use crate::user::errors::UserIdError;

/// User aggregate entity.
///
/// Represents a registered account. The role is not stored separately: it is
/// derived from the role details variant, so a teacher can never carry an
/// admission number and a student can never carry an employee id.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub full_name: FullName,
    pub mobile: String,
    pub password_hash: String,
    pub details: RoleDetails,
    pub is_active: bool,
    pub password_reset: Option<PasswordReset>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Role of this account.
    pub fn role(&self) -> Role {
        self.details.role()
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    ///
    /// # Returns
    /// UserId with random UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Arguments
    /// * `s` - UUID string to parse
    ///
    /// # Returns
    /// Parsed UserId
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validated with an RFC 5322 compliant parser and normalized to lower case,
/// so uniqueness in the directory is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Arguments
    /// * `email` - Raw email string
    ///
    /// # Returns
    /// Trimmed, lower-cased EmailAddress
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        let email = email.trim().to_lowercase();
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    /// Get email as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Display name of an account holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullName(String);

impl FullName {
    const MAX_LENGTH: usize = 128;

    /// Create a new validated full name.
    ///
    /// # Errors
    /// * `Empty` - Name is blank after trimming
    /// * `TooLong` - Name exceeds 128 characters
    pub fn new(name: String) -> Result<Self, FullNameError> {
        let name = name.trim().to_string();
        let length = name.chars().count();

        if length == 0 {
            Err(FullNameError::Empty)
        } else if length > Self::MAX_LENGTH {
            Err(FullNameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(name))
        }
    }

    /// Get name as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Account role. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Teacher, Role::Student];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(RoleError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role specific attributes, one variant per role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleDetails {
    Student(StudentDetails),
    Teacher(TeacherDetails),
    Admin(AdminDetails),
}

impl RoleDetails {
    /// Role selected by this variant.
    pub fn role(&self) -> Role {
        match self {
            RoleDetails::Student(_) => Role::Student,
            RoleDetails::Teacher(_) => Role::Teacher,
            RoleDetails::Admin(_) => Role::Admin,
        }
    }

    /// Employee id for staff accounts.
    pub fn employee_id(&self) -> Option<&str> {
        match self {
            RoleDetails::Student(_) => None,
            RoleDetails::Teacher(t) => Some(&t.employee_id),
            RoleDetails::Admin(a) => Some(&a.employee_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentDetails {
    pub class_name: String,
    pub admission_number: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeacherDetails {
    pub subject: String,
    pub employee_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminDetails {
    pub employee_id: String,
}

/// In-flight password reset. Cleared on use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordReset {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl PasswordReset {
    /// Whether the reset token can still be redeemed at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Human readable sequential identifier: `<prefix><year><4 digit sequence>`.
///
/// `existing` is the number of records already counted for the sequence.
pub fn sequential_identifier(prefix: &str, year: i32, existing: u64) -> String {
    format!("{}{}{:04}", prefix, year, existing + 1)
}

/// Prefix of student admission numbers.
pub const ADMISSION_PREFIX: &str = "ADM";

/// Prefix of teacher employee ids.
pub const TEACHER_PREFIX: &str = "TCH";

/// Prefix of admin employee ids.
pub const ADMIN_PREFIX: &str = "ADM";

/// Command to register a new student
#[derive(Debug)]
pub struct RegisterStudentCommand {
    pub email: EmailAddress,
    pub full_name: FullName,
    pub mobile: String,
    pub password: String,
    pub class_name: String,
    pub address: Option<String>,
}

/// Command to register a new teacher
#[derive(Debug)]
pub struct RegisterTeacherCommand {
    pub email: EmailAddress,
    pub full_name: FullName,
    pub mobile: String,
    pub password: String,
    pub subject: String,
}

/// Command to create the bootstrap admin account
#[derive(Debug, Clone)]
pub struct CreateAdminCommand {
    pub email: EmailAddress,
    pub full_name: FullName,
    pub mobile: String,
    pub password: String,
}

/// Sanitized projection of a user.
///
/// Never carries the password hash or reset token; this is the only user
/// shape the service hands out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub email: EmailAddress,
    pub full_name: FullName,
    pub mobile: String,
    pub role: Role,
    pub details: RoleDetails,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            mobile: user.mobile.clone(),
            role: user.role(),
            details: user.details.clone(),
            is_active: user.is_active,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// Successful login: bearer token plus the caller's profile.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in_seconds: i64,
    pub profile: UserProfile,
}

/// Role specific dashboard figures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardStats {
    Admin {
        total_students: u64,
        total_teachers: u64,
        total_admins: u64,
    },
    Teacher {
        students_count: u64,
        subject: String,
    },
    Student,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub message: String,
    pub profile: UserProfile,
    pub stats: DashboardStats,
}
