use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;
use auth::TokenService;
use chrono::Utc;

use crate::domain::user::models::ChangePasswordCommand;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;
use crate::user::errors::UserError;
use crate::user::ports::AuthServicePort;
use crate::user::ports::ProfileServicePort;
use crate::user::ports::UserRepository;

/// Registration and login orchestration.
///
/// Wires the password hasher, the token issuer, and the repository together;
/// uniqueness stays with the store and hashing runs on the blocking pool so
/// it never stalls token or CSRF checks on the async runtime.
pub struct AuthService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    password_hasher: Arc<PasswordHasher>,
    token_service: Arc<TokenService>,
}

impl<UR> AuthService<UR>
where
    UR: UserRepository,
{
    /// Create a new auth service with injected dependencies.
    pub fn new(
        repository: Arc<UR>,
        password_hasher: Arc<PasswordHasher>,
        token_service: Arc<TokenService>,
    ) -> Self {
        Self {
            repository,
            password_hasher,
            token_service,
        }
    }
}

#[async_trait]
impl<UR> AuthServicePort for AuthService<UR>
where
    UR: UserRepository,
{
    async fn register(&self, command: RegisterUserCommand) -> Result<UserProfile, UserError> {
        if command.password.is_empty() {
            return Err(UserError::Validation(
                "Password must not be empty".to_string(),
            ));
        }

        let password_hash =
            hash_password(Arc::clone(&self.password_hasher), command.password).await?;

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            username: command.username,
            email: command.email,
            password_hash,
            created_at: now,
            updated_at: now,
        };

        let created_user = self.repository.create(user).await?;
        tracing::info!(user_id = %created_user.id, "User registered");

        Ok(UserProfile::from(&created_user))
    }

    async fn login(&self, email: &str, password: &str) -> Result<String, UserError> {
        // Unknown email and wrong password collapse into one error
        let user = self
            .repository
            .find_by_email(email)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        let verified = verify_password(
            Arc::clone(&self.password_hasher),
            password.to_string(),
            user.password_hash.clone(),
        )
        .await?;

        if !verified {
            tracing::warn!(user_id = %user.id, "Login rejected");
            return Err(UserError::InvalidCredentials);
        }

        let token = self
            .token_service
            .issue(&user.id.to_string(), user.username.as_str())?;

        tracing::info!(user_id = %user.id, "User authenticated");
        Ok(token)
    }
}

/// Profile reads, profile updates, and password changes.
pub struct ProfileService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    password_hasher: Arc<PasswordHasher>,
}

impl<UR> ProfileService<UR>
where
    UR: UserRepository,
{
    /// Create a new profile service with injected dependencies.
    pub fn new(repository: Arc<UR>, password_hasher: Arc<PasswordHasher>) -> Self {
        Self {
            repository,
            password_hasher,
        }
    }
}

#[async_trait]
impl<UR> ProfileServicePort for ProfileService<UR>
where
    UR: UserRepository,
{
    async fn get_profile(&self, id: &UserId) -> Result<UserProfile, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .map(|ref user| UserProfile::from(user))
            .ok_or(UserError::NotFound(id.to_string()))
    }

    async fn update_profile(
        &self,
        id: &UserId,
        command: UpdateProfileCommand,
    ) -> Result<UserProfile, UserError> {
        if command.is_empty() {
            return Err(UserError::Validation(
                "At least one field (username or email) must be provided".to_string(),
            ));
        }

        let mut user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))?;

        if let Some(new_email) = command.email {
            // Friendly pre-check against other users; the store constraint
            // remains the atomic backstop for concurrent updates
            if let Some(existing) = self.repository.find_by_email(new_email.as_str()).await? {
                if existing.id != *id {
                    return Err(UserError::EmailAlreadyExists(new_email.to_string()));
                }
            }
            user.email = new_email;
        }

        if let Some(new_username) = command.username {
            user.username = new_username;
        }

        user.updated_at = Utc::now();

        let updated_user = self.repository.update_profile(user).await?;
        tracing::info!(user_id = %updated_user.id, "User profile updated");

        Ok(UserProfile::from(&updated_user))
    }

    async fn change_password(
        &self,
        id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), UserError> {
        if command.old_password.is_empty() || command.new_password.is_empty() {
            return Err(UserError::Validation(
                "Both old and new passwords are required".to_string(),
            ));
        }

        let user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))?;

        let verified = verify_password(
            Arc::clone(&self.password_hasher),
            command.old_password,
            user.password_hash,
        )
        .await?;

        if !verified {
            tracing::warn!(user_id = %id, "Password change rejected");
            return Err(UserError::InvalidCredentials);
        }

        let new_hash =
            hash_password(Arc::clone(&self.password_hasher), command.new_password).await?;

        self.repository.update_password_hash(id, new_hash).await?;
        tracing::info!(user_id = %id, "Password updated");

        Ok(())
    }
}

/// Hash a password on the blocking pool.
async fn hash_password(hasher: Arc<PasswordHasher>, password: String) -> Result<String, UserError> {
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| UserError::Unknown(format!("Hashing task failed: {}", e)))?
        .map_err(UserError::from)
}

/// Verify a password against a digest on the blocking pool.
async fn verify_password(
    hasher: Arc<PasswordHasher>,
    password: String,
    digest: String,
) -> Result<bool, UserError> {
    tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
        .await
        .map_err(|e| UserError::Unknown(format!("Verification task failed: {}", e)))
}
