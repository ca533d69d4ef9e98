use std::sync::Arc;
use std::time::Duration;

use auth::CsrfTokenService;
use auth::TokenService;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::change_password::change_password;
use super::handlers::csrf_token::csrf_token;
use super::handlers::get_profile::get_profile;
use super::handlers::login::login;
use super::handlers::register::register;
use super::handlers::update_profile::update_profile;
use super::middleware::authenticate as auth_middleware;
use super::middleware::csrf_protect;
use crate::domain::user::ports::UserRepository;
use crate::domain::user::service::AuthService;
use crate::domain::user::service::ProfileService;

pub struct AppState<UR>
where
    UR: UserRepository,
{
    pub auth_service: Arc<AuthService<UR>>,
    pub profile_service: Arc<ProfileService<UR>>,
    pub token_service: Arc<TokenService>,
    pub csrf_service: Arc<CsrfTokenService>,
    pub secure_cookies: bool,
}

impl<UR> Clone for AppState<UR>
where
    UR: UserRepository,
{
    fn clone(&self) -> Self {
        Self {
            auth_service: Arc::clone(&self.auth_service),
            profile_service: Arc::clone(&self.profile_service),
            token_service: Arc::clone(&self.token_service),
            csrf_service: Arc::clone(&self.csrf_service),
            secure_cookies: self.secure_cookies,
        }
    }
}

pub fn create_router<UR>(state: AppState<UR>) -> Router
where
    UR: UserRepository,
{
    let public_routes = Router::new()
        .route("/api/csrf-token", get(csrf_token))
        .route("/auth/register", post(register::<UR>))
        .route("/auth/login", post(login::<UR>));

    let protected_routes = Router::new()
        .route(
            "/users/profile",
            get(get_profile::<UR>).put(update_profile::<UR>),
        )
        .route("/users/change-password", axum::routing::put(change_password::<UR>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::<UR>,
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
        .merge(protected_routes)
        // Layered on the whole router so no handler can skip the check
        .layer(middleware::from_fn_with_state(
            state.clone(),
            csrf_protect::<UR>,
        ))
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
