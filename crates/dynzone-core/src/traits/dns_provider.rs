// # DNS Provider Trait
//
// Defines the remote capabilities the engine needs: list zones, list records
// in a zone, update one record.
//
// ## Implementations
//
// - Cloudflare: `dynzone-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use dynzone_core::DnsProvider;
//
// let zones = provider.list_zones(&token).await?;
// let records = provider.list_records(&token, &zones["example.com"]).await?;
// ```

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;

use crate::config::{ApiToken, RecordSpec};

/// Zone name → zone id
pub type ZoneMap = HashMap<String, String>;

/// Fully-qualified record name → remote record
pub type RecordMap = HashMap<String, RemoteRecord>;

/// Read-only view of a record at the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRecord {
    /// Fully-qualified name
    pub fqdn: String,
    /// Provider record id
    pub id: String,
    /// Record type (e.g. "A", "TXT")
    pub record_type: String,
    /// Current value
    pub content: String,
}

/// Payload for updating a record in place
///
/// `name` is the bare label; the provider reconstructs the FQDN from the zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordUpdate {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub proxied: bool,
    pub ttl: u32,
}

impl RecordUpdate {
    /// Build the payload that points `spec` at `content`
    pub fn for_spec(spec: &RecordSpec, content: impl Into<String>) -> Self {
        Self {
            record_type: spec.record_type.clone(),
            name: spec.name.clone(),
            content: content.into(),
            proxied: spec.proxied,
            ttl: spec.ttl,
        }
    }
}

/// Trait for DNS provider implementations
///
/// Each method is a bounded network call. Failures are returned as
/// [`crate::Error::Timeout`] or [`crate::Error::Request`]; providers never
/// retry. Whether an update is needed is decided by the engine, never here.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List the zones visible to `token`
    async fn list_zones(&self, token: &ApiToken) -> Result<ZoneMap, crate::Error>;

    /// List the records of a zone, keyed by FQDN
    async fn list_records(&self, token: &ApiToken, zone_id: &str)
    -> Result<RecordMap, crate::Error>;

    /// Replace content/proxied/ttl of an existing record
    async fn update_record(
        &self,
        token: &ApiToken,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
