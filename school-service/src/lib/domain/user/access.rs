use serde::Deserialize;
use serde::Serialize;

use crate::user::errors::AuthError;
use crate::user::models::Role;
use crate::user::models::UserId;
use crate::user::models::UserProfile;

/// Verified caller identity, built from the claims of a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    pub full_name: String,
}

/// Token payload carried next to `sub`, `iat` and `exp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub email: String,
    pub role: Role,
    pub full_name: String,
}

impl From<&UserProfile> for IdentityClaims {
    fn from(profile: &UserProfile) -> Self {
        Self {
            email: profile.email.as_str().to_string(),
            role: profile.role,
            full_name: profile.full_name.as_str().to_string(),
        }
    }
}

impl From<&Identity> for IdentityClaims {
    fn from(identity: &Identity) -> Self {
        Self {
            email: identity.email.clone(),
            role: identity.role,
            full_name: identity.full_name.clone(),
        }
    }
}

/// Role requirements shared by every role gated route group.
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];
pub const STAFF: &[Role] = &[Role::Admin, Role::Teacher];

/// Access requirement declared by a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy<'a> {
    /// Any verified identity.
    Authenticated,
    /// Identity role must be one of the listed roles.
    Roles(&'a [Role]),
    /// Identity must own the resource, or be an admin.
    SelfOrAdmin(UserId),
    /// Identity must own the resource, or hold one of the listed roles.
    OwnerOrRoles { owner: UserId, roles: &'a [Role] },
}

impl Identity {
    /// Check this identity against a route's access policy.
    ///
    /// # Errors
    /// * `Forbidden` - Role or ownership requirement not met
    pub fn authorize(&self, policy: AccessPolicy<'_>) -> Result<(), AuthError> {
        let allowed = match policy {
            AccessPolicy::Authenticated => true,
            AccessPolicy::Roles(roles) => roles.contains(&self.role),
            AccessPolicy::SelfOrAdmin(owner) => owner == self.user_id || self.role == Role::Admin,
            AccessPolicy::OwnerOrRoles { owner, roles } => {
                owner == self.user_id || roles.contains(&self.role)
            }
        };

        if allowed {
            Ok(())
        } else {
            Err(AuthError::Forbidden(Self::describe(policy)))
        }
    }

    fn describe(policy: AccessPolicy<'_>) -> String {
        match policy {
            AccessPolicy::Authenticated => "authentication required".to_string(),
            AccessPolicy::Roles(roles) => {
                let names: Vec<&str> = roles.iter().map(Role::as_str).collect();
                format!("{} access required", names.join(" or "))
            }
            AccessPolicy::SelfOrAdmin(_) => "access limited to the owner or an admin".to_string(),
            AccessPolicy::OwnerOrRoles { .. } => "access limited to the owner".to_string(),
        }
    }
}
