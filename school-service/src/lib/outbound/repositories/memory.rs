use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::PasswordReset;
use crate::domain::user::models::Role;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserDirectory;
use crate::user::errors::AuthError;

/// Process-local user directory.
///
/// Records are kept in insertion order, so listings come back oldest first.
/// Every check-then-write runs under a single write lock.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `change` to the stored record of `id` under the write lock.
    async fn modify<F>(&self, id: &UserId, change: F) -> Result<User, AuthError>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.users.write().await;

        let user = users
            .iter_mut()
            .find(|u| u.id == *id)
            .ok_or_else(|| AuthError::NotFound(id.to_string()))?;

        change(user);
        Ok(user.clone())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn create(&self, user: User) -> Result<User, AuthError> {
        let mut users = self.users.write().await;

        if users.iter().any(|u| u.email == user.email) {
            return Err(AuthError::DuplicateEmail(user.email.to_string()));
        }

        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AuthError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == *id).cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, AuthError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == *email).cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>, AuthError> {
        Ok(self.users.read().await.clone())
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, AuthError> {
        let users = self.users.read().await;
        Ok(users.iter().filter(|u| u.role() == role).cloned().collect())
    }

    async fn count_by_role(&self, role: Role) -> Result<u64, AuthError> {
        let users = self.users.read().await;
        Ok(users.iter().filter(|u| u.role() == role).count() as u64)
    }

    async fn record_login(&self, id: &UserId, at: DateTime<Utc>) -> Result<User, AuthError> {
        self.modify(id, |user| user.last_login_at = Some(at)).await
    }

    async fn set_password_reset(
        &self,
        id: &UserId,
        reset: PasswordReset,
    ) -> Result<(), AuthError> {
        self.modify(id, |user| user.password_reset = Some(reset))
            .await
            .map(|_| ())
    }

    async fn set_password_hash(
        &self,
        id: &UserId,
        password_hash: String,
    ) -> Result<(), AuthError> {
        self.modify(id, |user| {
            user.password_hash = password_hash;
            user.password_reset = None;
        })
        .await
        .map(|_| ())
    }

    async fn set_active(&self, id: &UserId, active: bool) -> Result<User, AuthError> {
        self.modify(id, |user| {
            user.is_active = active;
            if !active {
                user.password_reset = None;
            }
        })
        .await
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
        new_password_hash: String,
    ) -> Result<Option<User>, AuthError> {
        let mut users = self.users.write().await;

        let matched = users.iter_mut().find(|u| {
            u.password_reset
                .as_ref()
                .is_some_and(|reset| reset.token == token && reset.is_valid_at(now))
        });

        Ok(matched.map(|user| {
            user.password_hash = new_password_hash;
            user.password_reset = None;
            user.clone()
        }))
    }
}
