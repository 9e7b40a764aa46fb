//! Token store port
//!
//! Durable key/value storage for the three session fields.

use async_trait::async_trait;
use shortlet_domain::{SessionCredentials, SessionKey, UserProfile};

/// Errors that can occur during token store operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Store for persisted session state.
///
/// No transactional guarantee spans keys; callers keep the three fields
/// consistent.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Reads a value.
    async fn get(&self, key: SessionKey) -> Result<Option<String>, TokenStoreError>;

    /// Writes a value.
    async fn set(&self, key: SessionKey, value: &str) -> Result<(), TokenStoreError>;

    /// Deletes a value. Deleting a missing key is not an error.
    async fn remove(&self, key: SessionKey) -> Result<(), TokenStoreError>;

    /// Removes all three session fields.
    async fn clear_session(&self) -> Result<(), TokenStoreError> {
        for key in SessionKey::ALL {
            self.remove(key).await?;
        }
        Ok(())
    }

    /// Persists a complete session.
    async fn save_session(
        &self,
        access_token: &str,
        refresh_token: &str,
        profile: &UserProfile,
    ) -> Result<(), TokenStoreError> {
        let profile = serde_json::to_string(profile)
            .map_err(|e| TokenStoreError::Serialization(e.to_string()))?;
        self.set(SessionKey::AccessToken, access_token).await?;
        self.set(SessionKey::RefreshToken, refresh_token).await?;
        self.set(SessionKey::CachedProfile, &profile).await
    }

    /// Reads the persisted session.
    ///
    /// A cached profile that fails to parse is removed and reported absent.
    async fn load_session(&self) -> Result<SessionCredentials, TokenStoreError> {
        let access_token = self.get(SessionKey::AccessToken).await?;
        let refresh_token = self.get(SessionKey::RefreshToken).await?;
        let profile = match self.get(SessionKey::CachedProfile).await? {
            Some(raw) => match serde_json::from_str::<UserProfile>(&raw) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding unreadable cached profile");
                    self.remove(SessionKey::CachedProfile).await?;
                    None
                }
            },
            None => None,
        };

        Ok(SessionCredentials {
            access_token,
            refresh_token,
            profile,
        })
    }
}
