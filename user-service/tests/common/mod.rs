use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use auth::CsrfTokenService;
use auth::PasswordHasher;
use auth::TokenService;
use axum::body::Body;
use axum::http::header;
use axum::http::HeaderMap;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::Router;
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use user_service::domain::user::models::User;
use user_service::domain::user::models::UserId;
use user_service::domain::user::ports::UserRepository;
use user_service::domain::user::service::AuthService;
use user_service::domain::user::service::ProfileService;
use user_service::inbound::http::router::create_router;
use user_service::inbound::http::router::AppState;
use user_service::user::errors::UserError;
use uuid::Uuid;

pub const TOKEN_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const CSRF_KEY: &[u8] = b"test-csrf-hmac-key";

/// In-memory credential store with the same atomicity contract as the
/// Postgres repository: uniqueness is checked and the write applied under a
/// single lock, so a concurrent duplicate insert has exactly one loser.
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.lock().unwrap();

        if users
            .values()
            .any(|u| u.username.as_str() == user.username.as_str())
        {
            return Err(UserError::UsernameAlreadyExists(
                user.username.as_str().to_string(),
            ));
        }
        if users.values().any(|u| u.email.as_str() == user.email.as_str()) {
            return Err(UserError::EmailAlreadyExists(
                user.email.as_str().to_string(),
            ));
        }

        users.insert(user.id.0, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let users = self.users.lock().unwrap();
        Ok(users.get(&id.0).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email.as_str() == email).cloned())
    }

    async fn update_profile(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.lock().unwrap();

        if users
            .values()
            .any(|u| u.id != user.id && u.username.as_str() == user.username.as_str())
        {
            return Err(UserError::UsernameAlreadyExists(
                user.username.as_str().to_string(),
            ));
        }
        if users
            .values()
            .any(|u| u.id != user.id && u.email.as_str() == user.email.as_str())
        {
            return Err(UserError::EmailAlreadyExists(
                user.email.as_str().to_string(),
            ));
        }

        let existing = users
            .get_mut(&user.id.0)
            .ok_or(UserError::NotFound(user.id.to_string()))?;
        *existing = user.clone();
        Ok(user)
    }

    async fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: String,
    ) -> Result<(), UserError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id.0)
            .ok_or(UserError::NotFound(id.to_string()))?;
        user.password_hash = password_hash;
        Ok(())
    }
}

/// Test harness driving the full router, CSRF middleware included, without
/// a network or a database.
pub struct TestApp {
    router: Router,
    pub csrf_cookie: Option<String>,
    pub csrf_token: Option<String>,
    pub bearer: Option<String>,
}

impl TestApp {
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryUserRepository::new());
        let password_hasher = Arc::new(PasswordHasher::new());
        let token_service = Arc::new(TokenService::new(TOKEN_SECRET, Duration::hours(1)));
        let csrf_service = Arc::new(CsrfTokenService::new(CSRF_KEY));

        let state = AppState {
            auth_service: Arc::new(AuthService::new(
                Arc::clone(&repository),
                Arc::clone(&password_hasher),
                Arc::clone(&token_service),
            )),
            profile_service: Arc::new(ProfileService::new(repository, password_hasher)),
            token_service,
            csrf_service,
            secure_cookies: false,
        };

        Self {
            router: create_router(state),
            csrf_cookie: None,
            csrf_token: None,
            bearer: None,
        }
    }

    /// A clone of the underlying router, for driving requests concurrently.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Fetch a CSRF pair via `GET /api/csrf-token` and remember it for
    /// subsequent mutating requests.
    pub async fn obtain_csrf(&mut self) {
        let (status, headers, body) = self.send(Method::GET, "/api/csrf-token", None).await;
        assert_eq!(status, StatusCode::OK, "csrf-token endpoint failed");

        let mut cookies = Vec::new();
        for value in headers.get_all(header::SET_COOKIE) {
            let cookie = value
                .to_str()
                .expect("Invalid Set-Cookie header")
                .split(';')
                .next()
                .unwrap()
                .to_string();
            cookies.push(cookie);
        }
        assert!(
            cookies.iter().any(|c| c.starts_with("_csrf=")),
            "Missing secret cookie"
        );
        assert!(
            cookies.iter().any(|c| c.starts_with("XSRF-TOKEN=")),
            "Missing verifier cookie"
        );

        self.csrf_cookie = Some(cookies.join("; "));
        self.csrf_token = Some(
            body["data"]["token"]
                .as_str()
                .expect("Missing token in body")
                .to_string(),
        );
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let request = self.build_request(method, path, body);
        send_request(self.router.clone(), request).await
    }

    pub fn build_request(&self, method: Method, path: &str, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(path);

        if let Some(cookie) = &self.csrf_cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if let Some(token) = &self.csrf_token {
            builder = builder.header("x-xsrf-token", token);
        }
        if let Some(bearer) = &self.bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", bearer));
        }

        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request")
    }

    /// Register a user and log in, storing the bearer token.
    pub async fn register_and_login(&mut self, username: &str, email: &str, password: &str) {
        if self.csrf_token.is_none() {
            self.obtain_csrf().await;
        }

        let (status, _, _) = self
            .send(
                Method::POST,
                "/auth/register",
                Some(serde_json::json!({
                    "username": username,
                    "email": email,
                    "password": password,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "registration failed");

        let (status, _, body) = self
            .send(
                Method::POST,
                "/auth/login",
                Some(serde_json::json!({
                    "email": email,
                    "password": password,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed");

        self.bearer = Some(body["data"]["token"].as_str().unwrap().to_string());
    }
}

pub async fn send_request(
    router: Router,
    request: Request<Body>,
) -> (StatusCode, HeaderMap, Value) {
    let response = router
        .oneshot(request)
        .await
        .expect("Failed to execute request");

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, headers, body)
}
