use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::change_password::change_password;
use super::handlers::dashboard::dashboard;
use super::handlers::forgot_password::forgot_password;
use super::handlers::get_user::get_user;
use super::handlers::health::health;
use super::handlers::list_users::list_users;
use super::handlers::list_users::list_users_by_role;
use super::handlers::login::login;
use super::handlers::me::me;
use super::handlers::refresh_token::refresh_token;
use super::handlers::register_student::register_student;
use super::handlers::register_teacher::register_teacher;
use super::handlers::reset_password::reset_password;
use super::handlers::update_user_status::update_user_status;
use super::middleware::authenticate;
use super::middleware::require_roles;
use crate::domain::user::access::ADMIN_ONLY;
use crate::domain::user::ports::AuthServicePort;

pub struct AppState<S: AuthServicePort> {
    pub auth_service: Arc<S>,
}

impl<S: AuthServicePort> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            auth_service: Arc::clone(&self.auth_service),
        }
    }
}

/// Router options that change which routes are gated.
#[derive(Debug, Clone, Copy)]
pub struct RouterOptions {
    /// When false, student self-registration requires an admin token.
    pub open_student_registration: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            open_student_registration: true,
        }
    }
}

pub fn create_router<S: AuthServicePort>(auth_service: Arc<S>, options: RouterOptions) -> Router {
    let state = AppState { auth_service };

    let mut public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login::<S>))
        .route("/auth/forgot-password", post(forgot_password::<S>))
        .route("/auth/reset-password", post(reset_password::<S>));

    let authenticated_routes = Router::new()
        .route("/auth/me", get(me::<S>))
        .route("/auth/change-password", post(change_password::<S>))
        .route("/auth/refresh", post(refresh_token::<S>))
        .route("/auth/dashboard", get(dashboard::<S>))
        .route("/auth/users/:user_id", get(get_user::<S>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate::<S>,
        ));

    let mut admin_routes = Router::new()
        .route("/auth/register/teacher", post(register_teacher::<S>))
        .route("/auth/users", get(list_users::<S>))
        .route("/auth/users/by-role", get(list_users_by_role::<S>))
        .route("/auth/users/:user_id/status", patch(update_user_status::<S>));

    if options.open_student_registration {
        public_routes = public_routes.route("/auth/register/student", post(register_student::<S>));
    } else {
        admin_routes = admin_routes.route("/auth/register/student", post(register_student::<S>));
    }

    let admin_routes = admin_routes
        .route_layer(middleware::from_fn_with_state(ADMIN_ONLY, require_roles))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate::<S>,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(admin_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
