use thiserror::Error;

/// Error type for password operations.
///
/// Verification has no error surface: a digest that cannot be parsed simply
/// fails to verify. Only the hashing path can fail observably.
#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),
}
