// # Cache Store Implementations
//
// This module provides the cache document and implementations of the
// CacheStore trait for different persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileCacheStore;
pub use memory::MemoryCacheStore;

use serde::{Deserialize, Serialize};

/// Last-applied state shared between runs
///
/// Serialized as `{"last_ip": string|null, "tokens": object}`. `tokens` is
/// carried through unchanged for compatibility with existing cache files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cache {
    /// IP written by the last successful run; `None` before the first one
    #[serde(default)]
    pub last_ip: Option<String>,

    #[serde(default)]
    pub tokens: serde_json::Map<String, serde_json::Value>,
}

impl Cache {
    /// Cache with a known last IP
    pub fn with_last_ip(ip: impl Into<String>) -> Self {
        Self {
            last_ip: Some(ip.into()),
            tokens: serde_json::Map::new(),
        }
    }

    /// True before the first successful run
    pub fn is_first_run(&self) -> bool {
        self.last_ip.is_none()
    }

    /// Whether `current_ip` differs from the cached one
    pub fn ip_changed(&self, current_ip: &str) -> bool {
        self.last_ip.as_deref() != Some(current_ip)
    }
}
