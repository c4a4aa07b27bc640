use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::core::error::RegistryError;

pub const MAX_USERNAME_LEN: usize = 64;
pub const MAX_EMAIL_LEN: usize = 254;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "storage", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: i64, // unix seconds
    pub updated_at: i64,
}

/// Insert payload. The backend assigns the id and both timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

/// Partial update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    pub(crate) fn from_new(id: i64, new: NewUser) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id,
            username: new.username,
            email: new.email,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn apply(&mut self, patch: UserUpdate) {
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        self.updated_at = Utc::now().timestamp();
    }
}

impl NewUser {
    pub fn validate(&self) -> Result<(), RegistryError> {
        validate_username(&self.username)?;
        validate_email(&self.email)
    }
}

pub fn validate_username(username: &str) -> Result<(), RegistryError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::Validation("username must not be empty".into()));
    }
    if trimmed.len() > MAX_USERNAME_LEN {
        return Err(RegistryError::Validation(format!(
            "username exceeds {} bytes",
            MAX_USERNAME_LEN
        )));
    }
    Ok(())
}

/// Accepts `local@domain` where the domain has at least one dot.
/// Full RFC 5321 parsing is left to the mail system downstream.
pub fn validate_email(email: &str) -> Result<(), RegistryError> {
    if email.len() > MAX_EMAIL_LEN {
        return Err(RegistryError::Validation(format!(
            "email exceeds {} bytes",
            MAX_EMAIL_LEN
        )));
    }
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(RegistryError::Validation(format!("malformed email: {}", email)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("a.b+tag@sub.example.org").is_ok());
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(validate_email("").is_err());
        assert!(validate_email("ada").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada@").is_err());
        assert!(validate_email("ada@localhost").is_err());
        assert!(validate_email("ada@ex@ample.com").is_err());
    }

    #[test]
    fn rejects_oversized_email() {
        let email = format!("{}@example.com", "a".repeat(MAX_EMAIL_LEN));
        assert!(validate_email(&email).is_err());
    }

    #[test]
    fn username_must_have_content() {
        assert!(validate_username("ada").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
        assert!(validate_username(&"x".repeat(MAX_USERNAME_LEN + 1)).is_err());
    }

    #[test]
    fn apply_patches_only_given_fields() {
        let mut user = User::from_new(
            1,
            NewUser {
                username: "ada".into(),
                email: "ada@example.com".into(),
            },
        );
        user.apply(UserUpdate {
            username: None,
            email: Some("countess@example.com".into()),
        });
        assert_eq!(user.username, "ada");
        assert_eq!(user.email, "countess@example.com");
        assert!(user.updated_at >= user.created_at);
    }
}
