//! Credential and token security library
//!
//! Provides the security primitives for the user management service:
//! - Password hashing (Argon2id)
//! - Signed session token issuance and validation
//! - CSRF double-submit token generation and validation
//!
//! Nothing in this crate performs I/O; the service wires these pieces into
//! its own ports and request pipeline.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let digest = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &digest));
//! ```
//!
//! ## Session Tokens
//! ```
//! use auth::TokenService;
//! use chrono::Duration;
//!
//! let tokens = TokenService::new(b"secret_key_at_least_32_bytes_long!", Duration::hours(1));
//! let token = tokens.issue("user123", "alice").unwrap();
//! let claims = tokens.verify(&token).unwrap();
//! assert_eq!(claims.sub, "user123");
//! ```
//!
//! ## CSRF Double-Submit Tokens
//! ```
//! use auth::CsrfTokenService;
//!
//! let csrf = CsrfTokenService::new(b"csrf_hmac_key");
//! let pair = csrf.issue();
//! assert!(csrf.validate(&pair.secret, &pair.token));
//! ```

pub mod csrf;
pub mod password;
pub mod token;

// Re-export commonly used items
pub use csrf::CsrfTokenPair;
pub use csrf::CsrfTokenService;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use token::SessionClaims;
pub use token::TokenError;
pub use token::TokenService;
