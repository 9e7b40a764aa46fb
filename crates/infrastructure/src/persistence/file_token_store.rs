//! File-backed session storage.
//!
//! The three session fields live in one JSON document, by default in the
//! platform config directory:
//! - Linux: ~/.config/shortlet/session.json
//! - macOS: ~/Library/Application Support/shortlet/session.json
//! - Windows: %APPDATA%/shortlet/session.json
//!
//! The file is read once when the store is opened and rewritten on every
//! change. Removing the last field deletes the file.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shortlet_application::ports::{TokenStore, TokenStoreError};
use shortlet_domain::SessionKey;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

const SCHEMA_VERSION: u32 = 1;

/// On-disk layout:
/// ```json
/// {
///   "schema_version": 1,
///   "values": {
///     "authRefreshToken": "eyJ...",
///     "authToken": "eyJ...",
///     "authUser": "{\"id\":7,...}"
///   }
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    schema_version: u32,
    #[serde(default)]
    values: BTreeMap<String, String>,
}

/// Durable [`TokenStore`] backed by a JSON file.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileTokenStore {
    /// Opens the store at `path`. A missing file is an empty session; an
    /// unreadable document is discarded with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, TokenStoreError> {
        let path = path.into();

        let values = match fs::read(&path).await {
            Ok(bytes) => match from_json_bytes::<SessionFile>(&bytes) {
                Ok(file) => file.values,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "session file is corrupt, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), fields = values.len(), "session file opened");

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Location of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), TokenStoreError> {
        if values.is_empty() {
            return match fs::remove_file(&self.path).await {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let document = SessionFile {
            schema_version: SCHEMA_VERSION,
            values: values.clone(),
        };
        let content = to_json_stable_bytes(&document)
            .map_err(|e| TokenStoreError::Serialization(e.to_string()))?;
        fs::write(&self.path, content).await?;
        restrict_permissions(&self.path).await
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<(), TokenStoreError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<(), TokenStoreError> {
    Ok(())
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, key: SessionKey) -> Result<Option<String>, TokenStoreError> {
        Ok(self.values.lock().await.get(key.as_str()).cloned())
    }

    async fn set(&self, key: SessionKey, value: &str) -> Result<(), TokenStoreError> {
        let mut values = self.values.lock().await;
        values.insert(key.as_str().to_string(), value.to_string());
        self.persist(&values).await
    }

    async fn remove(&self, key: SessionKey) -> Result<(), TokenStoreError> {
        let mut values = self.values.lock().await;
        if values.remove(key.as_str()).is_some() {
            self.persist(&values).await?;
        }
        Ok(())
    }
}
