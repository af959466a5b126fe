use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("User not found")]
    UserNotFound,

    #[error("Post not found")]
    PostNotFound,

    #[error("Validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    #[error("User with email {0} already exists")]
    DuplicateEmail(String),

    #[error("Creation failed: {0}")]
    CreationFailed(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl DomainError {
    pub fn to_status_code(&self) -> u16 {
        match self {
            Self::UserNotFound | Self::PostNotFound => 404,
            Self::DuplicateEmail(_) => 409,
            Self::ValidationFailed(_) => 400,
            Self::CreationFailed(_)
            | Self::MalformedInput(_)
            | Self::DatabaseError(_)
            | Self::InternalError(_) => 500,
        }
    }

    /// Shorthand for a single-field validation failure.
    pub fn invalid(field: &str, message: &str) -> Self {
        Self::ValidationFailed(vec![format!("{}: {}", field, message)])
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}
