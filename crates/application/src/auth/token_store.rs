//! In-memory token storage.
//!
//! A thread-safe [`TokenStore`] that keeps the session only for the life of
//! the process. Used for ephemeral sessions and as the fake in tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use shortlet_domain::SessionKey;
use tokio::sync::RwLock;

use crate::ports::{TokenStore, TokenStoreError};

/// Thread-safe in-memory token store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTokenStore {
    values: Arc<RwLock<HashMap<SessionKey, String>>>,
}

impl InMemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with values.
    #[must_use]
    pub fn with_values(values: impl IntoIterator<Item = (SessionKey, String)>) -> Self {
        Self {
            values: Arc::new(RwLock::new(values.into_iter().collect())),
        }
    }

    /// Get count of stored keys.
    pub async fn count(&self) -> usize {
        self.values.read().await.len()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get(&self, key: SessionKey) -> Result<Option<String>, TokenStoreError> {
        Ok(self.values.read().await.get(&key).cloned())
    }

    async fn set(&self, key: SessionKey, value: &str) -> Result<(), TokenStoreError> {
        self.values.write().await.insert(key, value.to_string());
        Ok(())
    }

    async fn remove(&self, key: SessionKey) -> Result<(), TokenStoreError> {
        self.values.write().await.remove(&key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use shortlet_domain::UserProfile;

    fn profile() -> UserProfile {
        serde_json::from_str(
            r#"{"id": 1, "email": "ada@example.com", "first_name": "Ada", "last_name": "Obi"}"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = InMemoryTokenStore::new();
        store.set(SessionKey::AccessToken, "access123").await.unwrap();

        let value = store.get(SessionKey::AccessToken).await.unwrap();
        assert_eq!(value.as_deref(), Some("access123"));
        assert!(store.get(SessionKey::RefreshToken).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_missing_key_is_ok() {
        let store = InMemoryTokenStore::new();
        assert!(store.remove(SessionKey::RefreshToken).await.is_ok());
    }

    #[tokio::test]
    async fn test_save_and_clear_session() {
        let store = InMemoryTokenStore::new();
        store.save_session("a", "r", &profile()).await.unwrap();
        assert_eq!(store.count().await, 3);

        let session = store.load_session().await.unwrap();
        assert_eq!(session.access_token.as_deref(), Some("a"));
        assert_eq!(session.refresh_token.as_deref(), Some("r"));
        assert_eq!(session.profile, Some(profile()));

        store.clear_session().await.unwrap();
        assert_eq!(store.count().await, 0);
        assert!(store.load_session().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_profile_is_discarded() {
        let store = InMemoryTokenStore::with_values([
            (SessionKey::AccessToken, "a".to_string()),
            (SessionKey::CachedProfile, "{not json".to_string()),
        ]);

        let session = store.load_session().await.unwrap();
        assert_eq!(session.access_token.as_deref(), Some("a"));
        assert!(session.profile.is_none());
        assert!(store.get(SessionKey::CachedProfile).await.unwrap().is_none());
    }
}
