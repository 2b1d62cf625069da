// # File Cache Store
//
// File-based implementation of CacheStore.
//
// ## Crash Safety
//
// - Atomic writes: the new document is written to a temporary file, synced
//   to disk, then renamed over the cache file
// - Corruption: an unparsable file is logged and treated as an empty cache,
//   which makes the next run behave like a first run
//
// ## File Format
//
// ```json
// {
//   "last_ip": "1.2.3.4",
//   "tokens": {}
// }
// ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::state::Cache;
use crate::traits::cache_store::CacheStore;

/// File-based cache store
///
/// # Example
///
/// ```rust,no_run
/// use dynzone_core::state::{Cache, FileCacheStore};
/// use dynzone_core::traits::CacheStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileCacheStore::new("/var/lib/dynzone/cf_cache.json");
///
///     let mut cache = store.load().await;
///     cache.last_ip = Some("1.2.3.4".to_string());
///     store.save(&cache).await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    path: PathBuf,
}

impl FileCacheStore {
    /// Create a store backed by `path`; nothing is read until [`CacheStore::load`]
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the cache file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    async fn read(&self) -> Result<Option<Cache>, Error> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::cache(format!(
                "Failed to read cache file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let cache = serde_json::from_str(&content)?;
        Ok(Some(cache))
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn load(&self) -> Cache {
        match self.read().await {
            Ok(Some(cache)) => {
                tracing::debug!(
                    path = %self.path.display(),
                    last_ip = ?cache.last_ip,
                    "Loaded cache"
                );
                cache
            }
            Ok(None) => {
                tracing::debug!(path = %self.path.display(), "Cache file does not exist");
                Cache::default()
            }
            Err(Error::Json(e)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    ok = false,
                    "Cache file corrupted ({}), creating new cache",
                    e
                );
                Cache::default()
            }
            Err(e) => {
                tracing::warn!(ok = false, "{}, creating new cache", e);
                Cache::default()
            }
        }
    }

    async fn save(&self, cache: &Cache) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::cache(format!(
                    "Failed to create cache directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let json = serde_json::to_string_pretty(cache)?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::cache(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::cache(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::cache(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            // Data must be on disk before the rename makes it visible
            file.sync_all().await.map_err(|e| {
                Error::cache(format!(
                    "Failed to sync temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::cache(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Cache written to file: {}", self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
