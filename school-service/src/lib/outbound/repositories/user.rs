use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;

use crate::domain::user::models::AdminDetails;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::FullName;
use crate::domain::user::models::PasswordReset;
use crate::domain::user::models::Role;
use crate::domain::user::models::RoleDetails;
use crate::domain::user::models::StudentDetails;
use crate::domain::user::models::TeacherDetails;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserDirectory;
use crate::user::errors::AuthError;

const USER_COLUMNS: &str = "id, email, full_name, mobile, password_hash, role, \
     class_name, admission_number, address, subject, employee_id, \
     is_active, reset_token, reset_token_expires_at, created_at, last_login_at";

pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &PgRow) -> Result<User, AuthError> {
        let role: String = row.try_get("role").map_err(database_error)?;
        let details = details_from_columns(
            &role,
            row.try_get("class_name").map_err(database_error)?,
            row.try_get("admission_number").map_err(database_error)?,
            row.try_get("address").map_err(database_error)?,
            row.try_get("subject").map_err(database_error)?,
            row.try_get("employee_id").map_err(database_error)?,
        )?;

        let reset_token: Option<String> = row.try_get("reset_token").map_err(database_error)?;
        let reset_expires_at: Option<DateTime<Utc>> = row
            .try_get("reset_token_expires_at")
            .map_err(database_error)?;
        let password_reset = match (reset_token, reset_expires_at) {
            (Some(token), Some(expires_at)) => Some(PasswordReset { token, expires_at }),
            _ => None,
        };

        Ok(User {
            id: UserId(row.try_get("id").map_err(database_error)?),
            email: EmailAddress::new(row.try_get("email").map_err(database_error)?)?,
            full_name: FullName::new(row.try_get("full_name").map_err(database_error)?)?,
            mobile: row.try_get("mobile").map_err(database_error)?,
            password_hash: row.try_get("password_hash").map_err(database_error)?,
            details,
            is_active: row.try_get("is_active").map_err(database_error)?,
            password_reset,
            created_at: row.try_get("created_at").map_err(database_error)?,
            last_login_at: row.try_get("last_login_at").map_err(database_error)?,
        })
    }

    fn rows_to_users(rows: Vec<PgRow>) -> Result<Vec<User>, AuthError> {
        rows.iter().map(Self::row_to_user).collect()
    }
}

/// Flattened role detail columns, one nullable column per attribute.
#[derive(Debug, Default, PartialEq, Eq)]
struct DetailColumns<'a> {
    class_name: Option<&'a str>,
    admission_number: Option<&'a str>,
    address: Option<&'a str>,
    subject: Option<&'a str>,
    employee_id: Option<&'a str>,
}

impl<'a> From<&'a RoleDetails> for DetailColumns<'a> {
    fn from(details: &'a RoleDetails) -> Self {
        match details {
            RoleDetails::Student(s) => Self {
                class_name: Some(&s.class_name),
                admission_number: Some(&s.admission_number),
                address: s.address.as_deref(),
                ..Default::default()
            },
            RoleDetails::Teacher(t) => Self {
                subject: Some(&t.subject),
                employee_id: Some(&t.employee_id),
                ..Default::default()
            },
            RoleDetails::Admin(a) => Self {
                employee_id: Some(&a.employee_id),
                ..Default::default()
            },
        }
    }
}

fn details_from_columns(
    role: &str,
    class_name: Option<String>,
    admission_number: Option<String>,
    address: Option<String>,
    subject: Option<String>,
    employee_id: Option<String>,
) -> Result<RoleDetails, AuthError> {
    let corrupt = |column: &str| {
        AuthError::DatabaseError(format!("{} record is missing {}", role, column))
    };

    match role.parse::<Role>()? {
        Role::Student => Ok(RoleDetails::Student(StudentDetails {
            class_name: class_name.ok_or_else(|| corrupt("class_name"))?,
            admission_number: admission_number.ok_or_else(|| corrupt("admission_number"))?,
            address,
        })),
        Role::Teacher => Ok(RoleDetails::Teacher(TeacherDetails {
            subject: subject.ok_or_else(|| corrupt("subject"))?,
            employee_id: employee_id.ok_or_else(|| corrupt("employee_id"))?,
        })),
        Role::Admin => Ok(RoleDetails::Admin(AdminDetails {
            employee_id: employee_id.ok_or_else(|| corrupt("employee_id"))?,
        })),
    }
}

fn database_error(e: sqlx::Error) -> AuthError {
    AuthError::DatabaseError(e.to_string())
}

fn write_error(e: sqlx::Error, email: &EmailAddress) -> AuthError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() && db_err.constraint() == Some("users_email_key") {
            return AuthError::DuplicateEmail(email.to_string());
        }
    }
    database_error(e)
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn create(&self, user: User) -> Result<User, AuthError> {
        let columns = DetailColumns::from(&user.details);
        let reset = user.password_reset.as_ref();

        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, full_name, mobile, password_hash, role,
                class_name, admission_number, address, subject, employee_id,
                is_active, reset_token, reset_token_expires_at, created_at, last_login_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(user.id.0)
        .bind(user.email.as_str())
        .bind(user.full_name.as_str())
        .bind(&user.mobile)
        .bind(&user.password_hash)
        .bind(user.role().as_str())
        .bind(columns.class_name)
        .bind(columns.admission_number)
        .bind(columns.address)
        .bind(columns.subject)
        .bind(columns.employee_id)
        .bind(user.is_active)
        .bind(reset.map(|r| r.token.as_str()))
        .bind(reset.map(|r| r.expires_at))
        .bind(user.created_at)
        .bind(user.last_login_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &user.email))?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AuthError> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, AuthError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn list_all(&self) -> Result<Vec<User>, AuthError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users ORDER BY created_at ASC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        Self::rows_to_users(rows)
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, AuthError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users WHERE role = $1 ORDER BY created_at ASC",
            USER_COLUMNS
        ))
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        Self::rows_to_users(rows)
    }

    async fn count_by_role(&self, role: Role) -> Result<u64, AuthError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(count.max(0) as u64)
    }

    async fn record_login(&self, id: &UserId, at: DateTime<Utc>) -> Result<User, AuthError> {
        let row = sqlx::query(&format!(
            "UPDATE users SET last_login_at = $2 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id.0)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        match row {
            Some(row) => Self::row_to_user(&row),
            None => Err(AuthError::NotFound(id.to_string())),
        }
    }

    async fn set_password_reset(
        &self,
        id: &UserId,
        reset: PasswordReset,
    ) -> Result<(), AuthError> {
        let result = sqlx::query(
            "UPDATE users SET reset_token = $2, reset_token_expires_at = $3 WHERE id = $1",
        )
        .bind(id.0)
        .bind(reset.token)
        .bind(reset.expires_at)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        expect_one_row(result.rows_affected(), id)
    }

    async fn set_password_hash(
        &self,
        id: &UserId,
        password_hash: String,
    ) -> Result<(), AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, reset_token = NULL, reset_token_expires_at = NULL
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        expect_one_row(result.rows_affected(), id)
    }

    async fn set_active(&self, id: &UserId, active: bool) -> Result<User, AuthError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET is_active = $2,
                reset_token = CASE WHEN $2 THEN reset_token ELSE NULL END,
                reset_token_expires_at = CASE WHEN $2 THEN reset_token_expires_at ELSE NULL END
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id.0)
        .bind(active)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        match row {
            Some(row) => Self::row_to_user(&row),
            None => Err(AuthError::NotFound(id.to_string())),
        }
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
        new_password_hash: String,
    ) -> Result<Option<User>, AuthError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET password_hash = $3, reset_token = NULL, reset_token_expires_at = NULL
            WHERE reset_token = $1 AND reset_token_expires_at > $2
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(token)
        .bind(now)
        .bind(new_password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.as_ref().map(Self::row_to_user).transpose()
    }
}

fn expect_one_row(rows_affected: u64, id: &UserId) -> Result<(), AuthError> {
    if rows_affected == 0 {
        return Err(AuthError::NotFound(id.to_string()));
    }
    Ok(())
}
