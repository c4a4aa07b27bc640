pub mod memory;
#[cfg(feature = "storage")]
pub mod sqlite;

use async_trait::async_trait;

use crate::core::{NewUser, RegistryError, User};

/// Storage-agnostic persistence contract for users. Absence is `Ok(None)`
/// on lookups; mutation of a missing row is `NotFound`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Every user, ordered by ascending id.
    async fn find_all(&self) -> Result<Vec<User>, RegistryError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RegistryError>;
    /// Assigns the id and timestamps, returns the stored row.
    async fn insert(&self, user: NewUser) -> Result<User, RegistryError>;
    /// Full-row replacement keyed by `user.id`.
    async fn update(&self, user: &User) -> Result<User, RegistryError>;
    async fn delete(&self, id: i64) -> Result<(), RegistryError>;
    /// Case-insensitive email lookup.
    async fn email_exists(&self, email: &str) -> Result<bool, RegistryError>;
}
