use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{NewUser, UpdateUser, User};

/// Persistence for [`User`] records.
///
/// Mutating methods return `false` when no document matched the id at write time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users, oldest first
    async fn list(&self) -> StoreResult<Vec<User>>;

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Assign an id and timestamps, then persist
    async fn create(&self, input: NewUser) -> StoreResult<User>;

    /// Replace name and email; the digest is left untouched
    async fn update_profile(&self, id: Uuid, input: UpdateUser) -> StoreResult<bool>;

    /// Replace the digest in a single write
    async fn update_password_hash(&self, id: Uuid, password_hash: String) -> StoreResult<bool>;

    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

/// Process-local store for development and tests.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(users: &HashMap<Uuid, User>, email: &str, except: Option<Uuid>) -> bool {
    users
        .values()
        .any(|u| u.email == email && Some(u.id) != except)
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn list(&self) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(all)
    }

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, input: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if email_taken(&users, &input.email, None) {
            return Err(StoreError::DuplicateEmail(input.email));
        }

        let user = User::new(input);
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, input: UpdateUser) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        if !users.contains_key(&id) {
            return Ok(false);
        }
        if email_taken(&users, &input.email, Some(id)) {
            return Err(StoreError::DuplicateEmail(input.email));
        }

        if let Some(user) = users.get_mut(&id) {
            user.name = input.name;
            user.email = input.email;
            user.updated_at = Utc::now();
        }
        Ok(true)
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: String) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}
