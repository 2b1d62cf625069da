// # Cache Store Trait
//
// Defines the interface for the durable last-applied state.
//
// ## Purpose
//
// The cache remembers the IP written by the last successful run so the
// engine can tell first runs and IP changes apart from no-op runs, and skip
// the cache write when nothing changed.
//
// ## Implementations
//
// - File-based: pretty-printed JSON (`FileCacheStore`)
// - In-memory: tests and embedding (`MemoryCacheStore`)

use async_trait::async_trait;

use crate::state::Cache;

/// Trait for cache store implementations
///
/// Single-process, single-run usage is assumed; implementations do no
/// cross-process locking.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the persisted cache
    ///
    /// Never fails: a missing, unreadable or corrupt cache yields
    /// [`Cache::default`] (after logging a warning where appropriate).
    async fn load(&self) -> Cache;

    /// Persist the full cache
    async fn save(&self, cache: &Cache) -> Result<(), crate::Error>;

    /// Where the cache lives (for logging)
    fn location(&self) -> String;
}
