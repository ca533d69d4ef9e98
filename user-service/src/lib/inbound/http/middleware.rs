use axum::extract::Request;
use axum::extract::State;
use axum::http::Method;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::cookie::CookieJar;
use axum_extra::extract::cookie::SameSite;

use crate::domain::user::models::UserId;
use crate::inbound::http::handlers::ApiError;
use crate::domain::user::ports::UserRepository;
use crate::inbound::http::router::AppState;

/// Name of the HttpOnly cookie carrying the CSRF secret.
pub const CSRF_SECRET_COOKIE: &str = "_csrf";

/// Name of the script-readable cookie carrying the CSRF verifier.
pub const CSRF_TOKEN_COOKIE: &str = "XSRF-TOKEN";

/// Header the client echoes the verifier in, plus the accepted alias.
pub const CSRF_TOKEN_HEADER: &str = "x-xsrf-token";
pub const CSRF_TOKEN_HEADER_ALT: &str = "x-csrf-token";

/// Route prefixes exempt from CSRF validation (API documentation).
const CSRF_EXEMPT_PREFIXES: &[&str] = &["/api-docs"];

/// Extension type to store authenticated user info in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub username: String,
}

/// Extension type carrying the CSRF verifier issued for this request.
#[derive(Debug, Clone)]
pub struct IssuedCsrfToken(pub String);

/// Middleware that validates bearer tokens and adds user info to request extensions
pub async fn authenticate<UR: UserRepository>(
    State(state): State<AppState<UR>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    // Extract token from Authorization header
    let token = extract_token_from_header(&req)?;

    // Validate signature and expiry; no store lookup happens here
    let claims = state.token_service.verify(token).map_err(|e| {
        tracing::warn!("Session token validation failed: {}", e);
        unauthorized("Invalid or expired token")
    })?;

    let user_id = UserId::from_string(&claims.sub).map_err(|e| {
        tracing::error!("Failed to parse user ID from token: {}", e);
        unauthorized("Invalid token format")
    })?;

    req.extensions_mut().insert(AuthenticatedUser {
        user_id,
        username: claims.username,
    });

    Ok(next.run(req).await)
}

/// Middleware enforcing the double-submit-cookie protocol ahead of routing.
///
/// Safe methods pass through; if they arrive without a secret cookie a fresh
/// pair is minted and set on the response, and the verifier is exposed to
/// handlers through [`IssuedCsrfToken`]. Mutating methods are rejected with
/// 403 unless the header-supplied verifier matches the cookie-supplied
/// secret. No handler is reached on a mismatch.
pub async fn csrf_protect<UR: UserRepository>(
    State(state): State<AppState<UR>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let path = req.uri().path();
    if CSRF_EXEMPT_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return Ok(next.run(req).await);
    }

    let secret = jar
        .get(CSRF_SECRET_COOKIE)
        .map(|cookie| cookie.value().to_string());

    let safe_method = matches!(
        *req.method(),
        Method::GET | Method::HEAD | Method::OPTIONS
    );

    if safe_method {
        let (secret, token) = match secret {
            Some(secret) => {
                let token = state.csrf_service.derive(&secret);
                (secret, token)
            }
            None => {
                let pair = state.csrf_service.issue();
                (pair.secret, pair.token)
            }
        };

        req.extensions_mut().insert(IssuedCsrfToken(token.clone()));
        let response = next.run(req).await;

        // Re-set both cookies on every safe response, as the verifier cookie
        // must stay in sync with the secret for the life of the session
        let jar = jar
            .add(secret_cookie(secret, state.secure_cookies))
            .add(verifier_cookie(token));
        return Ok((jar, response).into_response());
    }

    let header_token = req
        .headers()
        .get(CSRF_TOKEN_HEADER)
        .or_else(|| req.headers().get(CSRF_TOKEN_HEADER_ALT))
        .and_then(|value| value.to_str().ok());

    match (secret.as_deref(), header_token) {
        (Some(secret), Some(token)) if state.csrf_service.validate(secret, token) => {
            Ok(next.run(req).await)
        }
        _ => {
            tracing::warn!(method = %req.method(), path = %req.uri().path(), "CSRF validation failed");
            Err(ApiError::Forbidden("Invalid CSRF token".to_string()).into_response())
        }
    }
}

fn secret_cookie(value: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(CSRF_SECRET_COOKIE, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_secure(secure);
    cookie
}

fn verifier_cookie(value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(CSRF_TOKEN_COOKIE, value);
    cookie.set_path("/");
    cookie.set_http_only(false);
    cookie.set_same_site(SameSite::Strict);
    cookie
}

fn unauthorized(message: &str) -> Response {
    ApiError::Unauthorized(message.to_string()).into_response()
}

fn extract_token_from_header(req: &Request) -> Result<&str, Response> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or_else(|| unauthorized("Missing Authorization header"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| unauthorized("Invalid Authorization header"))?;

    if !auth_str.starts_with("Bearer ") {
        return Err(unauthorized(
            "Invalid Authorization header format. Expected: Bearer <token>",
        ));
    }

    Ok(auth_str.trim_start_matches("Bearer "))
}
