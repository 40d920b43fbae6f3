use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use tokio::sync::RwLock;
use verity_core::{CredentialStore, CredentialStoreError, UserId, UserPassword};

#[derive(Default, Clone)]
pub struct HashMapCredentialStore {
    passwords: Arc<RwLock<HashMap<UserId, UserPassword>>>,
}

impl HashMapCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CredentialStore for HashMapCredentialStore {
    async fn get_password(
        &self,
        user_id: &UserId,
    ) -> Result<Option<UserPassword>, CredentialStoreError> {
        Ok(self.passwords.read().await.get(user_id).cloned())
    }

    async fn create_password(&self, password: UserPassword) -> Result<(), CredentialStoreError> {
        match self.passwords.write().await.entry(password.user_id) {
            Entry::Occupied(_) => Err(CredentialStoreError::PasswordAlreadySet),
            Entry::Vacant(slot) => {
                slot.insert(password);
                Ok(())
            }
        }
    }

    async fn upsert_password(&self, password: UserPassword) -> Result<(), CredentialStoreError> {
        match self.passwords.write().await.entry(password.user_id) {
            Entry::Occupied(mut slot) => {
                let stored = slot.get_mut();
                stored.password_hash = password.password_hash;
                stored.updated_at = password.updated_at;
            }
            Entry::Vacant(slot) => {
                slot.insert(password);
            }
        }
        Ok(())
    }
}
