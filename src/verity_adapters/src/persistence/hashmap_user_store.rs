use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use verity_core::{Email, User, UserId, UserStore, UserStoreError};

#[derive(Default, Clone)]
pub struct HashMapUserStore {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl HashMapUserStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait::async_trait]
impl UserStore for HashMapUserStore {
    async fn add_user(&self, user: User) -> Result<(), UserStoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(UserStoreError::UserAlreadyExists);
        }
        users.insert(user.id, user);
        Ok(())
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, UserStoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| &user.email == email).cloned())
    }

    async fn user_exists(&self, id: &UserId) -> Result<bool, UserStoreError> {
        Ok(self.users.read().await.contains_key(id))
    }

    async fn mark_email_verified(
        &self,
        id: &UserId,
        verified_at: DateTime<Utc>,
    ) -> Result<(), UserStoreError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(id).ok_or(UserStoreError::UserNotFound)?;
        user.email_verified_at = Some(verified_at);
        user.updated_at = Some(verified_at);
        Ok(())
    }
}
