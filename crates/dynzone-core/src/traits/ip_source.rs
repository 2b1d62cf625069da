// # IP Source Trait
//
// Defines the interface for discovering the current public IPv4 address.
//
// ## Implementations
//
// - HTTP echo services: `dynzone-ip-http` crate

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for IP source implementations
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Fetch the current public IPv4 address
    async fn current(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
