use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::user::access::Identity;
use crate::domain::user::models::CreateAdminCommand;
use crate::domain::user::models::Dashboard;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::LoginOutcome;
use crate::domain::user::models::PasswordReset;
use crate::domain::user::models::RegisterStudentCommand;
use crate::domain::user::models::RegisterTeacherCommand;
use crate::domain::user::models::Role;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;
use crate::user::errors::AuthError;
use crate::user::errors::EmailDeliveryError;

/// Port for authentication and account operations.
///
/// Every method that returns account data returns `UserProfile`, never the
/// stored record.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new student and assign an admission number.
    ///
    /// # Errors
    /// * `DuplicateEmail` - Email is already registered
    /// * `Validation` - Password is empty
    /// * `DatabaseError` - Directory operation failed
    async fn register_student(
        &self,
        command: RegisterStudentCommand,
    ) -> Result<UserProfile, AuthError>;

    /// Register a new teacher on behalf of an admin and assign an employee id.
    ///
    /// # Arguments
    /// * `command` - Validated teacher registration data
    /// * `requesting_admin_id` - Caller, must resolve to an admin record
    ///
    /// # Errors
    /// * `Forbidden` - Requester is unknown or not an admin
    /// * `DuplicateEmail` - Email is already registered
    /// * `DatabaseError` - Directory operation failed
    async fn register_teacher(
        &self,
        command: RegisterTeacherCommand,
        requesting_admin_id: &UserId,
    ) -> Result<UserProfile, AuthError>;

    /// Verify credentials and issue an access token.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password (indistinguishable)
    /// * `AccountDeactivated` - Credentials are correct but the account is inactive
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError>;

    /// Start a password reset. Succeeds whether or not the email is known.
    ///
    /// # Errors
    /// * `DatabaseError` - Directory operation failed
    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError>;

    /// Redeem a reset token and set a new password. Tokens are single use.
    ///
    /// # Errors
    /// * `InvalidOrExpiredToken` - No account holds this unexpired token
    /// * `Validation` - New password is empty
    async fn reset_password(&self, reset_token: &str, new_password: &str)
        -> Result<(), AuthError>;

    /// Replace the password of `user_id` after checking the current one.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown user or wrong current password (indistinguishable)
    /// * `Validation` - New password is empty
    async fn change_password(
        &self,
        user_id: &UserId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    /// Retrieve the profile of a single account.
    ///
    /// # Errors
    /// * `NotFound` - No such user
    async fn get_profile(&self, user_id: &UserId) -> Result<UserProfile, AuthError>;

    /// Retrieve every account.
    async fn list_users(&self) -> Result<Vec<UserProfile>, AuthError>;

    /// Retrieve every account holding `role`.
    async fn list_users_by_role(&self, role: Role) -> Result<Vec<UserProfile>, AuthError>;

    /// Resolve a bearer token into the caller identity.
    ///
    /// # Errors
    /// * `Unauthenticated` - Token is forged, malformed or expired
    async fn authenticate_token(&self, token: &str) -> Result<Identity, AuthError>;

    /// Issue a fresh token for an already authenticated caller.
    ///
    /// # Errors
    /// * `Unauthenticated` - Account no longer exists
    /// * `AccountDeactivated` - Account was deactivated since login
    async fn refresh_token(&self, identity: &Identity) -> Result<LoginOutcome, AuthError>;

    /// Build the role specific dashboard of `user_id`.
    ///
    /// # Errors
    /// * `NotFound` - No such user
    async fn dashboard(&self, user_id: &UserId) -> Result<Dashboard, AuthError>;

    /// Activate or deactivate an account.
    ///
    /// # Errors
    /// * `Forbidden` - Requester is not an admin, or tries to deactivate itself
    /// * `NotFound` - Target account does not exist
    async fn set_user_active(
        &self,
        requesting_admin_id: &UserId,
        user_id: &UserId,
        active: bool,
    ) -> Result<UserProfile, AuthError>;

    /// Create the bootstrap admin unless its email is already registered.
    ///
    /// # Returns
    /// True when the account was created
    async fn ensure_default_admin(&self, command: CreateAdminCommand) -> Result<bool, AuthError>;
}

/// Persistence operations for user records.
///
/// Implementations enforce email uniqueness themselves (unique index or an
/// equivalent atomic check-and-insert); callers never lock. Writes to an
/// existing record touch only the fields they name, so concurrent operations
/// on one account cannot undo each other.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    /// Persist a new user.
    ///
    /// # Errors
    /// * `DuplicateEmail` - Email is already registered
    /// * `DatabaseError` - Storage operation failed
    async fn create(&self, user: User) -> Result<User, AuthError>;

    /// Retrieve user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AuthError>;

    /// Retrieve user by (normalized) email address.
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, AuthError>;

    /// Retrieve all users, oldest first.
    async fn list_all(&self) -> Result<Vec<User>, AuthError>;

    /// Retrieve all users holding `role`, oldest first.
    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, AuthError>;

    /// Number of users holding `role`.
    async fn count_by_role(&self, role: Role) -> Result<u64, AuthError>;

    /// Stamp the last successful login time. No other field is written.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn record_login(&self, id: &UserId, at: DateTime<Utc>) -> Result<User, AuthError>;

    /// Store a pending reset token, replacing any earlier one.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn set_password_reset(&self, id: &UserId, reset: PasswordReset)
        -> Result<(), AuthError>;

    /// Replace the password hash and clear any pending reset token.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn set_password_hash(&self, id: &UserId, password_hash: String)
        -> Result<(), AuthError>;

    /// Activate or deactivate an account. Deactivation also clears any
    /// pending reset token.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn set_active(&self, id: &UserId, active: bool) -> Result<User, AuthError>;

    /// Atomically redeem a reset token.
    ///
    /// When a user holds `token` and its expiry is after `now`, the password
    /// hash is replaced and the reset fields are cleared in one step.
    ///
    /// # Returns
    /// The updated user, or `None` when no unexpired token matched
    async fn consume_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
        new_password_hash: String,
    ) -> Result<Option<User>, AuthError>;
}

/// Outgoing email collaborator.
#[async_trait]
pub trait EmailSender: Send + Sync + 'static {
    /// Deliver a password reset token.
    ///
    /// # Errors
    /// * `NotConfigured` - No transport available
    /// * `DeliveryFailed` - Transport rejected the message
    async fn send_password_reset(
        &self,
        to: &EmailAddress,
        full_name: &str,
        reset_token: &str,
    ) -> Result<(), EmailDeliveryError>;
}
