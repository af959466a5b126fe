use super::user::UserResponse;
use super::DomainError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const MAX_TITLE_LENGTH: usize = 255;
pub const MIN_CONTENT_LENGTH: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub country: String,
    pub categories: Vec<String>,
    pub created_at: NaiveDate,
    pub rating: f64,
    pub user_id: i64,
}

/// A post that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub country: String,
    pub categories: Vec<String>,
    pub created_at: NaiveDate,
    pub rating: f64,
    pub user_id: i64,
}

/// Mutable fields of a stored post. Owner and creation date never change.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub title: String,
    pub content: String,
    pub country: String,
    pub categories: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SavePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub country: Option<String>,
    pub categories: Option<Vec<String>>,
    pub user_id: Option<i64>,
}

/// A `SavePostRequest` that passed validation.
#[derive(Debug, Clone)]
pub struct ValidPost {
    pub changes: PostChanges,
    pub user_id: i64,
}

impl SavePostRequest {
    pub fn validate(self) -> Result<ValidPost, DomainError> {
        let mut errors = Vec::new();

        let title = self.title.unwrap_or_default();
        if title.trim().is_empty() {
            errors.push("title: title is required".to_string());
        } else if title.chars().count() > MAX_TITLE_LENGTH {
            errors.push(format!(
                "title: title must be less than {} characters",
                MAX_TITLE_LENGTH
            ));
        }

        let content = self.content.unwrap_or_default();
        if content.trim().is_empty() {
            errors.push("content: content is required".to_string());
        } else if content.chars().count() < MIN_CONTENT_LENGTH {
            errors.push(format!(
                "content: content must be at least {} characters",
                MIN_CONTENT_LENGTH
            ));
        }

        let country = self.country.unwrap_or_default();
        if country.trim().is_empty() {
            errors.push("country: country is required".to_string());
        }

        let categories = self.categories.unwrap_or_default();
        if categories.is_empty() {
            errors.push("categories: at least one category is required".to_string());
        } else if categories.iter().any(|c| c.trim().is_empty()) {
            errors.push("categories: category labels must not be blank".to_string());
        }

        if self.user_id.is_none() {
            errors.push("userId: userId is required".to_string());
        }

        match self.user_id {
            Some(user_id) if errors.is_empty() => Ok(ValidPost {
                changes: PostChanges {
                    title,
                    content,
                    country,
                    categories,
                },
                user_id,
            }),
            _ => Err(DomainError::ValidationFailed(errors)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub country: String,
    pub categories: Vec<String>,
    pub created_at: NaiveDate,
    pub rating: f64,
    pub user_id: i64,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            country: post.country,
            categories: post.categories,
            created_at: post.created_at,
            rating: post.rating,
            user_id: post.user_id,
        }
    }
}

/// Post details with the author embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedPostResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub country: String,
    pub categories: Vec<String>,
    pub created_at: NaiveDate,
    pub rating: f64,
    pub author: UserResponse,
}

impl ExtendedPostResponse {
    pub fn new(post: Post, author: UserResponse) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            country: post.country,
            categories: post.categories,
            created_at: post.created_at,
            rating: post.rating,
            author,
        }
    }
}

impl NewPost {
    pub fn new(changes: PostChanges, user_id: i64, created_at: NaiveDate) -> Self {
        Self {
            title: changes.title,
            content: changes.content,
            country: changes.country,
            categories: changes.categories,
            created_at,
            rating: 0.0,
            user_id,
        }
    }

    pub fn into_post(self, id: i64) -> Post {
        Post {
            id,
            title: self.title,
            content: self.content,
            country: self.country,
            categories: self.categories,
            created_at: self.created_at,
            rating: self.rating,
            user_id: self.user_id,
        }
    }
}
