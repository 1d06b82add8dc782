use axum::extract::Request;
use axum::extract::State;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::Response;

use super::handlers::ApiError;
use crate::domain::user::access::AccessPolicy;
use crate::domain::user::access::Identity;
use crate::domain::user::models::Role;
use crate::domain::user::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

/// Middleware that verifies the bearer token and adds the caller `Identity`
/// to request extensions.
///
/// Every failure produces the same 401 body, so callers cannot tell a
/// missing token from a forged or expired one.
pub async fn authenticate<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token_from_header(&req).ok_or_else(ApiError::unauthenticated)?;

    let identity = state
        .auth_service
        .authenticate_token(&token)
        .await
        .map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            ApiError::unauthenticated()
        })?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Middleware that admits only identities holding one of `roles`.
///
/// Must be layered inside `authenticate`.
pub async fn require_roles(
    State(roles): State<&'static [Role]>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = req
        .extensions()
        .get::<Identity>()
        .ok_or_else(ApiError::unauthenticated)?;

    identity
        .authorize(AccessPolicy::Roles(roles))
        .map_err(|e| {
            tracing::info!(
                user_id = %identity.user_id,
                role = %identity.role,
                path = %req.uri().path(),
                "Role check failed"
            );
            ApiError::from(e)
        })?;

    Ok(next.run(req).await)
}

fn extract_token_from_header(req: &Request) -> Option<String> {
    let auth_str = req
        .headers()
        .get(http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;

    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }

    Some(token.to_string())
}
