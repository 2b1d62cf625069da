//! Configuration types for dynzone
//!
//! This module defines the desired-state model consumed by the engine
//! (accounts → domains → records) and the engine settings. Loading and
//! templating of configuration files is the caller's job; these types only
//! describe the already-resolved structure.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level updater configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Credential scopes, processed in order
    #[serde(default)]
    pub auth_tokens: Vec<AuthConfig>,
}

impl UpdaterConfig {
    /// Suspicious but non-fatal settings, one message each
    ///
    /// Nothing here stops a run: an account with an empty token fails its
    /// own zone listing, an empty zone or record name is never found.
    pub fn warnings(&self) -> Vec<String> {
        if self.auth_tokens.is_empty() {
            return vec!["No auth_tokens configured".to_string()];
        }

        self.auth_tokens.iter().flat_map(AuthConfig::warnings).collect()
    }

    /// Total number of records across all accounts and domains
    pub fn record_count(&self) -> usize {
        self.auth_tokens
            .iter()
            .flat_map(|auth| &auth.domains)
            .map(|domain| domain.records.len())
            .sum()
    }
}

/// API token for one credential scope
///
/// `Debug` and `Display` never print the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiToken(String);

impl ApiToken {
    /// Wrap a raw token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building the authorization header only
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the token is empty (or only whitespace)
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(<REDACTED>)")
    }
}

impl fmt::Display for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<REDACTED>")
    }
}

/// One credential scope at the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Human-readable label used in logs
    #[serde(rename = "desc", alias = "description", default)]
    pub description: String,

    /// Bearer token
    pub token: ApiToken,

    /// Domains managed with this token, processed in order
    #[serde(default)]
    pub domains: Vec<DomainConfig>,
}

impl AuthConfig {
    /// Create a new credential scope
    pub fn new(description: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            token: ApiToken::new(token),
            domains: Vec::new(),
        }
    }

    /// Add a domain
    pub fn with_domain(mut self, domain: DomainConfig) -> Self {
        self.domains.push(domain);
        self
    }

    /// Suspicious settings within this scope
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.token.is_empty() {
            warnings.push(format!("Token for '{}' is empty", self.description));
        }

        for domain in &self.domains {
            if domain.zone_name.trim().is_empty() {
                warnings.push(format!(
                    "Domain under '{}' has an empty zone_name",
                    self.description
                ));
            }
            for record in &domain.records {
                if record.name.trim().is_empty() {
                    warnings.push(format!(
                        "Record in zone {} has an empty name",
                        domain.zone_name
                    ));
                }
            }
        }

        warnings
    }
}

/// A zone and the records to keep in sync within it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Zone name at the provider (e.g. "example.com")
    pub zone_name: String,

    /// Records to manage, processed in order
    #[serde(default)]
    pub records: Vec<RecordSpec>,
}

impl DomainConfig {
    /// Create a new domain
    pub fn new(zone_name: impl Into<String>) -> Self {
        Self {
            zone_name: zone_name.into(),
            records: Vec::new(),
        }
    }

    /// Add a record
    pub fn with_record(mut self, record: RecordSpec) -> Self {
        self.records.push(record);
        self
    }
}

/// Desired state of one DNS record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSpec {
    /// Subdomain label (e.g. "home")
    pub name: String,

    /// Record type sent back to the provider on update
    #[serde(rename = "type", default = "default_record_type")]
    pub record_type: String,

    /// Whether traffic is proxied by the provider
    #[serde(default)]
    pub proxied: bool,

    /// Time-to-live; 1 means "automatic" at Cloudflare
    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

impl RecordSpec {
    /// Create an A record spec with default settings
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: default_record_type(),
            proxied: false,
            ttl: default_ttl(),
        }
    }

    /// Set the proxied flag
    pub fn with_proxied(mut self, proxied: bool) -> Self {
        self.proxied = proxied;
        self
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Fully-qualified name within `zone_name`
    pub fn fqdn(&self, zone_name: &str) -> String {
        format!("{}.{}", self.name, zone_name)
    }
}

fn default_record_type() -> String {
    "A".to_string()
}

fn default_ttl() -> u32 {
    1
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Compute and report changes without remote writes
    #[serde(default)]
    pub dry_run: bool,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Set dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_event_channel_capacity() -> usize {
    1000
}
