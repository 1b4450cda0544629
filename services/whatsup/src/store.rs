//! Persistence of the last observed status per endpoint

use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::WhatsupError;

/// Namespace prefixed to every state key unless configured otherwise
pub const DEFAULT_NAMESPACE: &str = "/whatsup";

/// Build the state key for a host, e.g. `/whatsup/example.com`
pub fn state_key(namespace: &str, host_key: &str) -> String {
    let namespace = namespace.trim_matches('/');
    if namespace.is_empty() {
        format!("/{}", host_key)
    } else {
        format!("/{}/{}", namespace, host_key)
    }
}

/// Key-value store holding the last persisted status of each endpoint.
///
/// A key that was never written and a key the backend reports as missing
/// both read as `Ok(None)`. Any other backend failure is an
/// [`WhatsupError::StateStore`] error.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: &str) -> crate::Result<Option<String>>;

    /// Overwrite the value stored under `key`
    async fn put(&self, key: &str, value: &str) -> crate::Result<()>;
}

/// Volatile store, for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all stored values
    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.values.read().await.clone()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, key: &str) -> crate::Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> crate::Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a JSON object on disk.
///
/// A missing file reads as an empty store. Writes replace the file
/// through a temporary sibling and a rename.
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        tracing::debug!("Using state file {:?}", path);
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> crate::Result<BTreeMap<String, String>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(WhatsupError::StateStore(format!(
                    "Failed to read state file {:?}: {}",
                    self.path, e
                )))
            }
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            WhatsupError::StateStore(format!("Corrupt state file {:?}: {}", self.path, e))
        })
    }

    async fn save(&self, values: &BTreeMap<String, String>) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(values)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                WhatsupError::StateStore(format!("Failed to create {:?}: {}", parent, e))
            })?;
        }

        let mut tmp = OsString::from(self.path.as_os_str());
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, content).await.map_err(|e| {
            WhatsupError::StateStore(format!("Failed to write {:?}: {}", tmp, e))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            WhatsupError::StateStore(format!(
                "Failed to replace state file {:?}: {}",
                self.path, e
            ))
        })
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get(&self, key: &str) -> crate::Result<Option<String>> {
        Ok(self.load().await?.remove(key))
    }

    async fn put(&self, key: &str, value: &str) -> crate::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.load().await?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values).await?;
        tracing::debug!("Stored {} = {}", key, value);
        Ok(())
    }
}
