// # dynzone-core
//
// Core library for keeping provider-hosted DNS records pointed at the
// caller's public IPv4 address.
//
// ## Architecture Overview
//
// - **IpSource**: Trait for discovering the current public IP
// - **DnsProvider**: Trait for listing zones/records and updating a record
// - **CacheStore**: Trait for the durable last-applied-IP cache
// - **UpdateEngine**: Decides per record whether an update is needed,
//   performs it, and persists the cache when the run changed state
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Decision logic is separate from provider I/O
// 2. **Scoped Failure**: A failure only abandons its record, domain or account
// 3. **Library-First**: The binary crate is a thin wrapper over this library
// 4. **Idempotency**: Remote content is compared before every write

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;
pub mod state;

// Re-export core types for convenience
pub use traits::{CacheStore, DnsProvider, IpSource};
pub use engine::{EngineEvent, RunSummary, UpdateEngine};
pub use config::{ApiToken, AuthConfig, DomainConfig, EngineConfig, RecordSpec, UpdaterConfig};
pub use error::{Error, Result};
pub use state::{Cache, FileCacheStore, MemoryCacheStore};
