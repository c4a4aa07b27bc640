use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::core::{NewUser, RegistryError, User};
use crate::storage::UserRepository;

/// Map-backed repository. The default backend for servers running without
/// a database path, and for demos and tests.
#[derive(Clone, Default)]
pub struct MemoryRepository {
    inner: Arc<RwLock<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    users: HashMap<i64, User>,
    next_id: i64,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn find_all(&self) -> Result<Vec<User>, RegistryError> {
        let inner = self.inner.read().await;
        let mut users: Vec<User> = inner.users.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RegistryError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, RegistryError> {
        let mut inner = self.inner.write().await;
        // Checked under the write lock so concurrent inserts cannot race
        // past the service-level pre-check.
        if inner
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(RegistryError::DuplicateEmail(user.email));
        }
        inner.next_id += 1;
        let user = User::from_new(inner.next_id, user);
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, RegistryError> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&user.id) {
            return Err(RegistryError::NotFound(user.id));
        }
        if inner
            .users
            .values()
            .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(RegistryError::DuplicateEmail(user.email.clone()));
        }
        inner.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), RegistryError> {
        self.inner
            .write()
            .await
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or(RegistryError::NotFound(id))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, RegistryError> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(email)))
    }
}
