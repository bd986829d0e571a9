//! Read access to user profiles under `users/`.

use std::collections::HashMap;

use serde_json::Value;
use store::backend::children;
use store::models::{user_path, USERS};
use store::{DocumentStore, User, UserId};

use crate::error::StoreError;

/// Decode a `users` collection into a map keyed by user id.
///
/// Malformed profiles are skipped with a warning.
pub fn decode_users(collection: Option<Value>) -> HashMap<UserId, User> {
    children(collection)
        .into_iter()
        .filter_map(|(key, value)| match User::decode(&key, value) {
            Ok(user) => Some((user.id.clone(), user)),
            Err(e) => {
                tracing::warn!("skipping profile: {e}");
                None
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct UserDirectory<S> {
    store: S,
}

impl<S: DocumentStore> UserDirectory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// A single profile, `None` when absent or unreadable.
    pub async fn get(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let Some(value) = self.store.read(&user_path(id)).await? else {
            return Ok(None);
        };
        match User::decode(id.as_str(), value) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                tracing::warn!("unreadable profile: {e}");
                Ok(None)
            }
        }
    }

    /// Every readable profile.
    pub async fn list(&self) -> Result<HashMap<UserId, User>, StoreError> {
        Ok(decode_users(self.store.read(USERS).await?))
    }
}
