use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;
use auth::TokenService;
use chrono::Datelike;
use chrono::Duration;
use chrono::Utc;

use crate::domain::user::access::Identity;
use crate::domain::user::access::IdentityClaims;
use crate::domain::user::models::sequential_identifier;
use crate::domain::user::models::AdminDetails;
use crate::domain::user::models::CreateAdminCommand;
use crate::domain::user::models::Dashboard;
use crate::domain::user::models::DashboardStats;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::FullName;
use crate::domain::user::models::LoginOutcome;
use crate::domain::user::models::PasswordReset;
use crate::domain::user::models::RegisterStudentCommand;
use crate::domain::user::models::RegisterTeacherCommand;
use crate::domain::user::models::Role;
use crate::domain::user::models::RoleDetails;
use crate::domain::user::models::StudentDetails;
use crate::domain::user::models::TeacherDetails;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;
use crate::domain::user::models::ADMIN_PREFIX;
use crate::domain::user::models::ADMISSION_PREFIX;
use crate::domain::user::models::TEACHER_PREFIX;
use crate::user::errors::AuthError;
use crate::user::ports::AuthServicePort;
use crate::user::ports::EmailSender;
use crate::user::ports::UserDirectory;

/// Default lifetime of a password reset token.
pub const DEFAULT_RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// Well-formed stored hash that no password is known to match. Logins for
/// unknown emails are verified against it so they cost one full derivation.
const UNKNOWN_ACCOUNT_HASH: &str = "8bb7ca072af8b2ae8708ce74712ccb8bf86f5169ad0d344a111224c77712302d\
                                    2753ccc254384ff89e5c283d364e8c919e79254564a80ea214a9d2217a749725";

/// Domain service implementation for authentication and account operations.
///
/// Concrete implementation of AuthServicePort with dependency injection.
pub struct AuthService<UD, ES>
where
    UD: UserDirectory,
    ES: EmailSender,
{
    directory: Arc<UD>,
    email_sender: Arc<ES>,
    tokens: Arc<TokenService>,
    password_hasher: PasswordHasher,
    reset_token_ttl: Duration,
}

impl<UD, ES> AuthService<UD, ES>
where
    UD: UserDirectory,
    ES: EmailSender,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `directory` - User record storage
    /// * `email_sender` - Outgoing email collaborator
    /// * `tokens` - Access token issuer/verifier
    pub fn new(directory: Arc<UD>, email_sender: Arc<ES>, tokens: Arc<TokenService>) -> Self {
        Self {
            directory,
            email_sender,
            tokens,
            password_hasher: PasswordHasher::new(),
            reset_token_ttl: Duration::minutes(DEFAULT_RESET_TOKEN_TTL_MINUTES),
        }
    }

    /// Override the password reset token lifetime.
    pub fn with_reset_token_ttl(mut self, ttl: Duration) -> Self {
        self.reset_token_ttl = ttl;
        self
    }

    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.password_hasher;
        let password = password.to_string();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Unknown(format!("Password hashing task failed: {}", e)))?
            .map_err(AuthError::from)
    }

    async fn verify_password(&self, password: &str, encoded: &str) -> Result<bool, AuthError> {
        let hasher = self.password_hasher;
        let password = password.to_string();
        let encoded = encoded.to_string();

        tokio::task::spawn_blocking(move || hasher.verify(&password, &encoded))
            .await
            .map_err(|e| AuthError::Unknown(format!("Password verification task failed: {}", e)))
    }

    fn validate_new_password(password: &str) -> Result<(), AuthError> {
        if password.is_empty() {
            return Err(AuthError::Validation("Password must not be empty".to_string()));
        }
        Ok(())
    }

    async fn ensure_email_available(&self, email: &EmailAddress) -> Result<(), AuthError> {
        match self.directory.find_by_email(email).await? {
            Some(_) => Err(AuthError::DuplicateEmail(email.to_string())),
            None => Ok(()),
        }
    }

    async fn require_admin(&self, user_id: &UserId, action: &str) -> Result<User, AuthError> {
        match self.directory.find_by_id(user_id).await? {
            Some(user) if user.role() == Role::Admin && user.is_active => Ok(user),
            _ => {
                tracing::warn!(requester = %user_id, action, "Admin-only operation refused");
                Err(AuthError::Forbidden(format!("Only admins can {}", action)))
            }
        }
    }

    async fn staff_count(&self) -> Result<u64, AuthError> {
        let teachers = self.directory.count_by_role(Role::Teacher).await?;
        let admins = self.directory.count_by_role(Role::Admin).await?;
        Ok(teachers + admins)
    }

    fn issue_for(&self, profile: UserProfile) -> Result<LoginOutcome, AuthError> {
        let access_token = self
            .tokens
            .issue(profile.id, IdentityClaims::from(&profile), None)?;

        Ok(LoginOutcome {
            access_token,
            token_type: "bearer",
            expires_in_seconds: self.tokens.default_ttl().num_seconds(),
            profile,
        })
    }

    fn new_user(
        email: EmailAddress,
        full_name: FullName,
        mobile: String,
        password_hash: String,
        details: RoleDetails,
    ) -> User {
        User {
            id: UserId::new(),
            email,
            full_name,
            mobile,
            password_hash,
            details,
            is_active: true,
            password_reset: None,
            created_at: Utc::now(),
            last_login_at: None,
        }
    }
}

#[async_trait]
impl<UD, ES> AuthServicePort for AuthService<UD, ES>
where
    UD: UserDirectory,
    ES: EmailSender,
{
    async fn register_student(
        &self,
        command: RegisterStudentCommand,
    ) -> Result<UserProfile, AuthError> {
        Self::validate_new_password(&command.password)?;
        self.ensure_email_available(&command.email).await?;

        let existing_students = self.directory.count_by_role(Role::Student).await?;
        let admission_number =
            sequential_identifier(ADMISSION_PREFIX, Utc::now().year(), existing_students);

        let password_hash = self.hash_password(&command.password).await?;

        let user = Self::new_user(
            command.email,
            command.full_name,
            command.mobile,
            password_hash,
            RoleDetails::Student(StudentDetails {
                class_name: command.class_name,
                admission_number,
                address: command.address,
            }),
        );

        let created = self.directory.create(user).await?;
        tracing::info!(user_id = %created.id, role = "student", "Student registered");

        Ok(UserProfile::from(&created))
    }

    async fn register_teacher(
        &self,
        command: RegisterTeacherCommand,
        requesting_admin_id: &UserId,
    ) -> Result<UserProfile, AuthError> {
        self.require_admin(requesting_admin_id, "create teacher accounts")
            .await?;
        Self::validate_new_password(&command.password)?;
        self.ensure_email_available(&command.email).await?;

        let existing_staff = self.staff_count().await?;
        let employee_id = sequential_identifier(TEACHER_PREFIX, Utc::now().year(), existing_staff);

        let password_hash = self.hash_password(&command.password).await?;

        let user = Self::new_user(
            command.email,
            command.full_name,
            command.mobile,
            password_hash,
            RoleDetails::Teacher(TeacherDetails {
                subject: command.subject,
                employee_id,
            }),
        );

        let created = self.directory.create(user).await?;
        tracing::info!(
            user_id = %created.id,
            registered_by = %requesting_admin_id,
            role = "teacher",
            "Teacher registered"
        );

        Ok(UserProfile::from(&created))
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let user = match EmailAddress::new(email.to_string()) {
            Ok(email) => self.directory.find_by_email(&email).await?,
            Err(_) => None,
        };

        let Some(user) = user else {
            self.verify_password(password, UNKNOWN_ACCOUNT_HASH).await?;
            tracing::debug!("Login refused");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify_password(password, &user.password_hash).await? {
            tracing::debug!("Login refused");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            tracing::info!(user_id = %user.id, "Login refused for deactivated account");
            return Err(AuthError::AccountDeactivated);
        }

        let user = self.directory.record_login(&user.id, Utc::now()).await?;

        tracing::info!(user_id = %user.id, role = %user.role(), "User logged in");
        self.issue_for(UserProfile::from(&user))
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let Ok(email) = EmailAddress::new(email.to_string()) else {
            return Ok(());
        };

        let Some(user) = self.directory.find_by_email(&email).await? else {
            return Ok(());
        };

        let token = auth::generate_url_safe_secret()?;
        self.directory
            .set_password_reset(
                &user.id,
                PasswordReset {
                    token: token.clone(),
                    expires_at: Utc::now() + self.reset_token_ttl,
                },
            )
            .await?;
        tracing::info!(user_id = %user.id, "Password reset token issued");

        if let Err(e) = self
            .email_sender
            .send_password_reset(&user.email, user.full_name.as_str(), &token)
            .await
        {
            tracing::error!(
                user_id = %user.id,
                error = %e,
                "Failed to deliver password reset email"
            );
        }

        Ok(())
    }

    async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if reset_token.is_empty() {
            return Err(AuthError::InvalidOrExpiredToken);
        }
        Self::validate_new_password(new_password)?;

        let password_hash = self.hash_password(new_password).await?;

        let user = self
            .directory
            .consume_reset_token(reset_token, Utc::now(), password_hash)
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        tracing::info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }

    async fn change_password(
        &self,
        user_id: &UserId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        Self::validate_new_password(new_password)?;

        let Some(user) = self.directory.find_by_id(user_id).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify_password(old_password, &user.password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let password_hash = self.hash_password(new_password).await?;
        self.directory
            .set_password_hash(&user.id, password_hash)
            .await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    async fn get_profile(&self, user_id: &UserId) -> Result<UserProfile, AuthError> {
        self.directory
            .find_by_id(user_id)
            .await?
            .map(|user| UserProfile::from(&user))
            .ok_or(AuthError::NotFound(user_id.to_string()))
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>, AuthError> {
        let users = self.directory.list_all().await?;
        Ok(users.iter().map(UserProfile::from).collect())
    }

    async fn list_users_by_role(&self, role: Role) -> Result<Vec<UserProfile>, AuthError> {
        let users = self.directory.list_by_role(role).await?;
        Ok(users.iter().map(UserProfile::from).collect())
    }

    async fn authenticate_token(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self
            .tokens
            .verify::<IdentityClaims>(token)
            .ok_or(AuthError::Unauthenticated)?;

        let user_id = UserId::from_string(&claims.sub).map_err(|e| {
            tracing::warn!(error = %e, "Signed token carries a malformed subject");
            AuthError::Unauthenticated
        })?;

        Ok(Identity {
            user_id,
            email: claims.payload.email,
            role: claims.payload.role,
            full_name: claims.payload.full_name,
        })
    }

    async fn refresh_token(&self, identity: &Identity) -> Result<LoginOutcome, AuthError> {
        let user = self
            .directory
            .find_by_id(&identity.user_id)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        if !user.is_active {
            return Err(AuthError::AccountDeactivated);
        }

        self.issue_for(UserProfile::from(&user))
    }

    async fn dashboard(&self, user_id: &UserId) -> Result<Dashboard, AuthError> {
        let profile = self.get_profile(user_id).await?;

        let stats = match &profile.details {
            RoleDetails::Admin(_) => DashboardStats::Admin {
                total_students: self.directory.count_by_role(Role::Student).await?,
                total_teachers: self.directory.count_by_role(Role::Teacher).await?,
                total_admins: self.directory.count_by_role(Role::Admin).await?,
            },
            RoleDetails::Teacher(teacher) => DashboardStats::Teacher {
                students_count: self.directory.count_by_role(Role::Student).await?,
                subject: teacher.subject.clone(),
            },
            RoleDetails::Student(_) => DashboardStats::Student,
        };

        Ok(Dashboard {
            message: format!("Welcome to your {} dashboard!", profile.role),
            profile,
            stats,
        })
    }

    async fn set_user_active(
        &self,
        requesting_admin_id: &UserId,
        user_id: &UserId,
        active: bool,
    ) -> Result<UserProfile, AuthError> {
        self.require_admin(requesting_admin_id, "change account status")
            .await?;

        if requesting_admin_id == user_id && !active {
            return Err(AuthError::Forbidden(
                "Admins cannot deactivate their own account".to_string(),
            ));
        }

        let user = self.directory.set_active(user_id, active).await?;

        tracing::info!(
            user_id = %user.id,
            changed_by = %requesting_admin_id,
            is_active = active,
            "Account status changed"
        );
        Ok(UserProfile::from(&user))
    }

    async fn ensure_default_admin(&self, command: CreateAdminCommand) -> Result<bool, AuthError> {
        if self.directory.find_by_email(&command.email).await?.is_some() {
            tracing::debug!(email = %command.email, "Bootstrap admin already present");
            return Ok(false);
        }
        Self::validate_new_password(&command.password)?;

        let existing_staff = self.staff_count().await?;
        let employee_id = sequential_identifier(ADMIN_PREFIX, Utc::now().year(), existing_staff);
        let password_hash = self.hash_password(&command.password).await?;

        let user = Self::new_user(
            command.email,
            command.full_name,
            command.mobile,
            password_hash,
            RoleDetails::Admin(AdminDetails { employee_id }),
        );

        match self.directory.create(user).await {
            Ok(created) => {
                tracing::info!(user_id = %created.id, email = %created.email, "Bootstrap admin created");
                Ok(true)
            }
            Err(AuthError::DuplicateEmail(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
