//! Durable key-value storage backing the session
//!
//! Batch writes are applied and persisted as one unit, so a session is never
//! left half-written.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::Error;
use crate::Result;

/// String key-value storage interface
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a single value
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write several entries in one batch
    async fn set_many(&self, entries: &[(&str, String)]) -> Result<()>;

    /// Remove several keys in one batch
    async fn remove_many(&self, keys: &[&str]) -> Result<()>;
}

/// In-process storage; contents are lost when the process exits
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set_many(&self, entries: &[(&str, String)]) -> Result<()> {
        let mut map = self.entries.write().await;
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut map = self.entries.write().await;
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

/// File-based storage holding a single JSON object
pub struct FileKeyValueStore {
    /// Path to the JSON file
    path: PathBuf,
    /// In-memory copy of the file contents
    cache: RwLock<HashMap<String, String>>,
}

impl FileKeyValueStore {
    /// Open the store at `path`
    ///
    /// If the file doesn't exist, it will be created on first write. A file
    /// that isn't a JSON object of strings is treated as empty and replaced on
    /// the next write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cache = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
                Error::Storage(format!("Failed to read {}: {}", path.display(), e))
            })?;
            if content.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&content).unwrap_or_else(|e| {
                    warn!("Ignoring unreadable session file {}: {}", path.display(), e);
                    HashMap::new()
                })
            }
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    async fn persist(&self, entries: &HashMap<String, String>) -> Result<()> {
        let content = serde_json::to_string_pretty(entries)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // Write a sibling file, then rename it over the original
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.cache.read().await.get(key).cloned())
    }

    async fn set_many(&self, entries: &[(&str, String)]) -> Result<()> {
        let mut cache = self.cache.write().await;
        let mut next = cache.clone();
        for (key, value) in entries {
            next.insert((*key).to_string(), value.clone());
        }
        self.persist(&next).await?;
        *cache = next;
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut cache = self.cache.write().await;
        if !keys.iter().any(|key| cache.contains_key(*key)) {
            return Ok(());
        }
        let mut next = cache.clone();
        for key in keys {
            next.remove(*key);
        }
        self.persist(&next).await?;
        *cache = next;
        Ok(())
    }
}
