use crate::data::user_repository::UserRepository;
use crate::domain::user::{SaveUserRequest, UserChanges, UserResponse};
use crate::domain::DomainError;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use rand_core::OsRng;
use std::sync::Arc;

pub struct UserService {
    user_repo: Arc<dyn UserRepository + Send + Sync>,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository + Send + Sync>) -> Self {
        Self { user_repo }
    }

    pub async fn get_all_users(&self) -> Result<Vec<UserResponse>, DomainError> {
        let users = self.user_repo.find_all().await?;

        if users.is_empty() {
            return Err(DomainError::UserNotFound);
        }

        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn create_user(&self, req: SaveUserRequest) -> Result<UserResponse, DomainError> {
        let valid = req.validate()?;

        self.ensure_email_free(&valid.email, None).await?;

        let password_hash = valid.password.as_deref().map(hash_password).transpose()?;

        let user = self
            .user_repo
            .create(UserChanges {
                name: valid.name,
                email: valid.email,
                password_hash,
            })
            .await?;

        if user.id == 0 {
            return Err(DomainError::CreationFailed(
                "Failed to create user".to_string(),
            ));
        }

        tracing::info!("User created: id={}", user.id);

        Ok(UserResponse::from(user))
    }

    pub async fn update_user(
        &self,
        id: i64,
        req: SaveUserRequest,
    ) -> Result<UserResponse, DomainError> {
        let valid = req.validate()?;

        self.ensure_email_free(&valid.email, Some(id)).await?;

        // Check if user exists
        self.user_repo.find_by_id(id).await?;

        let password_hash = valid.password.as_deref().map(hash_password).transpose()?;

        let user = self
            .user_repo
            .update(
                id,
                UserChanges {
                    name: valid.name,
                    email: valid.email,
                    password_hash,
                },
            )
            .await?;

        tracing::info!("User updated: id={}", id);

        Ok(UserResponse::from(user))
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), DomainError> {
        if !self.user_repo.exists(id).await? {
            return Err(DomainError::UserNotFound);
        }

        self.user_repo.delete(id).await?;

        tracing::info!("User deleted with posts: id={}", id);

        Ok(())
    }

    /// Returns the account bound to `email`, creating a password-less one on
    /// first sight.
    pub async fn get_or_create_oauth_user(
        &self,
        email: &str,
        name: &str,
    ) -> Result<UserResponse, DomainError> {
        match self.user_repo.find_by_email(email).await {
            Ok(user) => Ok(UserResponse::from(user)),
            Err(DomainError::UserNotFound) => {
                let user = self
                    .user_repo
                    .create(UserChanges {
                        name: name.to_string(),
                        email: email.to_string(),
                        password_hash: None,
                    })
                    .await?;

                tracing::info!("External account registered: id={}", user.id);

                Ok(UserResponse::from(user))
            }
            Err(e) => Err(e),
        }
    }

    /// The email may only belong to `owner` (or nobody).
    async fn ensure_email_free(&self, email: &str, owner: Option<i64>) -> Result<(), DomainError> {
        match self.user_repo.find_by_email(email).await {
            Ok(existing) if Some(existing.id) != owner => {
                tracing::warn!("Email already in use: {}", email);
                Err(DomainError::DuplicateEmail(email.to_string()))
            }
            Ok(_) | Err(DomainError::UserNotFound) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn hash_password(password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            DomainError::InternalError(format!("Password hashing failed: {}", e))
        })
}
