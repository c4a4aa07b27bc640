use crate::core::user::{validate_email, validate_username};
use crate::core::{NewUser, RegistryError, User, UserUpdate};
use crate::storage::UserRepository;

#[cfg(feature = "tracing")]
use tracing::{debug, info};

/// Domain service over a storage backend. Validation and uniqueness policy
/// live here so every backend behaves identically; the backend of choice is
/// injected at construction.
#[derive(Clone)]
pub struct UserRegistry<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserRegistry<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<User>, RegistryError> {
        self.repo.find_all().await
    }

    pub async fn get(&self, id: i64) -> Result<User, RegistryError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(RegistryError::NotFound(id))
    }

    pub async fn add(&self, new: NewUser) -> Result<User, RegistryError> {
        let new = NewUser {
            username: new.username.trim().to_string(),
            email: new.email.trim().to_string(),
        };
        new.validate()?;
        if self.repo.email_exists(&new.email).await? {
            return Err(RegistryError::DuplicateEmail(new.email));
        }
        let user = self.repo.insert(new).await?;
        #[cfg(feature = "tracing")]
        info!(id = user.id, username = %user.username, "user created");
        Ok(user)
    }

    pub async fn update(&self, id: i64, patch: UserUpdate) -> Result<User, RegistryError> {
        let patch = UserUpdate {
            username: patch.username.map(|u| u.trim().to_string()),
            email: patch.email.map(|e| e.trim().to_string()),
        };
        let mut user = self.get(id).await?;
        let email_changed = patch
            .email
            .as_deref()
            .is_some_and(|email| !email.eq_ignore_ascii_case(&user.email));
        user.apply(patch);
        validate_username(&user.username)?;
        validate_email(&user.email)?;
        if email_changed && self.repo.email_exists(&user.email).await? {
            return Err(RegistryError::DuplicateEmail(user.email));
        }
        let updated = self.repo.update(&user).await?;
        #[cfg(feature = "tracing")]
        debug!(id, "user updated");
        Ok(updated)
    }

    pub async fn remove(&self, id: i64) -> Result<(), RegistryError> {
        self.repo.delete(id).await?;
        #[cfg(feature = "tracing")]
        debug!(id, "user deleted");
        Ok(())
    }
}
