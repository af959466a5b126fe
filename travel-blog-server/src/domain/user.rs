use super::DomainError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// `None` for accounts created through an external identity provider.
    pub password_hash: Option<String>,
}

/// Fields persisted on create and replaced on update.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SaveUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request of the internal identity-provider hook.
#[derive(Debug, Deserialize)]
pub struct OAuthUserRequest {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// A `SaveUserRequest` that passed validation.
#[derive(Debug, Clone)]
pub struct ValidUser {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
}

impl SaveUserRequest {
    pub fn validate(self) -> Result<ValidUser, DomainError> {
        let mut errors = Vec::new();

        let name = self.name.unwrap_or_default();
        if name.trim().is_empty() {
            errors.push("name: name is required".to_string());
        }

        let email = self.email.unwrap_or_default();
        if email.trim().is_empty() {
            errors.push("email: email is required".to_string());
        } else if !is_email_like(&email) {
            errors.push("email: email must be a well-formed email address".to_string());
        }

        if let Some(password) = &self.password {
            if password.trim().is_empty() {
                errors.push("password: password must not be blank".to_string());
            }
        }

        if !errors.is_empty() {
            return Err(DomainError::ValidationFailed(errors));
        }

        Ok(ValidUser {
            name,
            email,
            password: self.password,
        })
    }
}

fn is_email_like(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_never_carries_the_password_hash() {
        let user = User {
            id: 1,
            name: "Marusia".into(),
            email: "marusia@test.com".into(),
            password_hash: Some("$argon2id$v=19$hash".into()),
        };

        let json = serde_json::to_value(UserResponse::from(user)).unwrap();

        assert_eq!(json, serde_json::json!({"id": 1, "name": "Marusia", "email": "marusia@test.com"}));
    }

    #[test]
    fn empty_request_reports_name_and_email() {
        let err = SaveUserRequest::default().validate().unwrap_err();

        match err {
            DomainError::ValidationFailed(errors) => {
                assert_eq!(errors.len(), 2);
                assert!(errors[0].starts_with("name:"));
                assert!(errors[1].starts_with("email:"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn rejects_malformed_email() {
        let req = SaveUserRequest {
            name: Some("Ivanko".into()),
            email: Some("ivanko.test.com".into()),
            password: None,
        };

        assert!(matches!(
            req.validate(),
            Err(DomainError::ValidationFailed(_))
        ));
    }

    #[test]
    fn accepts_user_without_password() {
        let req = SaveUserRequest {
            name: Some("Ivanko".into()),
            email: Some("ivanko@test.com".into()),
            password: None,
        };

        let valid = req.validate().unwrap();
        assert_eq!(valid.email, "ivanko@test.com");
        assert!(valid.password.is_none());
    }
}
