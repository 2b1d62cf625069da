//! Record reconciliation engine
//!
//! The UpdateEngine is responsible for:
//! - Classifying the run (first run, IP changed, unchanged)
//! - Listing zones per account and records per zone via DnsProvider
//! - Comparing each record's remote content with the current IP
//! - Updating records whose content differs (or reporting it, in dry-run)
//! - Persisting the cache when the run changed state
//!
//! ## Architecture
//!
//! ```text
//!   current IP ──┐          ┌──────────────┐
//!                └────────► │ UpdateEngine │ ◄──── CacheStore (load)
//!                           └──────────────┘
//!                                  │
//!         ┌────────────────────────┼────────────────────────┐
//!         ▼                        ▼                        ▼
//! ┌───────────────┐       ┌───────────────┐        ┌───────────────┐
//! │  DnsProvider  │       │  CacheStore   │        │    Events     │
//! │ (list/update) │       │    (save)     │        │   (render)    │
//! └───────────────┘       └───────────────┘        └───────────────┘
//! ```
//!
//! ## Failure Scoping
//!
//! Every provider failure is contained at the narrowest scope:
//! record > domain > account. A failed scope is reported and skipped; the
//! run always continues with its siblings.

mod outcome;

pub use outcome::{AccountOutcome, DomainOutcome, RecordOutcome, RunSummary};

use crate::config::{ApiToken, AuthConfig, DomainConfig, EngineConfig, RecordSpec};
use crate::state::Cache;
use crate::traits::{CacheStore, DnsProvider, RecordMap, RecordUpdate, ZoneMap};
use std::fmt;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{Level, debug, warn};

/// Events emitted by the UpdateEngine
///
/// Events carry a severity and an ok/fail tag; how they are presented
/// (colors, symbols) is left to the consumer. They are the engine's only
/// output above `debug` level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Run classification, emitted once at the start of a run
    RunStarted {
        current_ip: String,
        previous_ip: Option<String>,
        first_run: bool,
        ip_changed: bool,
        dry_run: bool,
    },

    /// Zone listing failed for an account; its domains were skipped
    ZonesUnavailable { account: String, error: String },

    /// A configured zone does not exist for the account
    ZoneNotFound { account: String, zone: String },

    /// Record listing failed for a zone; its records were skipped
    RecordsUnavailable { zone: String, error: String },

    /// A configured record does not exist in its zone
    RecordNotFound { fqdn: String },

    /// Remote content already equals the current IP
    RecordUpToDate { fqdn: String, ip: String },

    /// Record content was rewritten
    RecordUpdated {
        fqdn: String,
        previous: String,
        ip: String,
    },

    /// Dry run: record content would have been rewritten
    RecordWouldUpdate {
        fqdn: String,
        previous: String,
        ip: String,
    },

    /// The update request failed
    RecordUpdateFailed { fqdn: String, error: String },

    /// The cache was persisted
    CacheSaved { location: String },

    /// Persisting the cache failed; the next run redoes the work
    CacheSaveFailed { location: String, error: String },

    /// Run finished
    RunFinished { summary: RunSummary },
}

impl EngineEvent {
    /// Log severity of the event
    pub fn severity(&self) -> Level {
        match self {
            Self::ZonesUnavailable { .. }
            | Self::ZoneNotFound { .. }
            | Self::RecordsUnavailable { .. }
            | Self::RecordNotFound { .. }
            | Self::RecordUpdateFailed { .. }
            | Self::CacheSaveFailed { .. } => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// Whether the event reports success
    pub fn is_ok(&self) -> bool {
        self.severity() != Level::ERROR
    }
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunStarted {
                current_ip,
                previous_ip,
                first_run,
                ip_changed,
                dry_run,
            } => {
                let mode = if *dry_run { " (dry run)" } else { "" };
                match (first_run, ip_changed, previous_ip) {
                    (true, _, _) => write!(f, "First run detected, will save initial state{mode}"),
                    (false, true, Some(previous)) => {
                        write!(f, "IP changed from {previous} to {current_ip}{mode}")
                    }
                    _ => write!(f, "IP {current_ip} hasn't changed{mode}"),
                }
            }
            Self::ZonesUnavailable { account, error } => {
                write!(f, "Failed to update zones for token {account}: {error}")
            }
            Self::ZoneNotFound { zone, .. } => write!(f, "Zone {zone} not found"),
            Self::RecordsUnavailable { zone, error } => {
                write!(f, "Failed to update domain {zone}: {error}")
            }
            Self::RecordNotFound { fqdn } => write!(f, "Record {fqdn} not found"),
            Self::RecordUpToDate { fqdn, .. } => write!(f, "Record {fqdn} already up to date"),
            Self::RecordUpdated { fqdn, ip, .. } => write!(f, "Updated {fqdn} to {ip}"),
            Self::RecordWouldUpdate { fqdn, ip, .. } => {
                write!(f, "Dry run: Would update {fqdn} to {ip}")
            }
            Self::RecordUpdateFailed { fqdn, error } => {
                write!(f, "Failed to update {fqdn}: {error}")
            }
            Self::CacheSaved { location } => write!(f, "Cache saved to {location}"),
            Self::CacheSaveFailed { error, .. } => write!(f, "Failed to save cache: {error}"),
            Self::RunFinished { summary } => write!(
                f,
                "Run finished: {} updated, {} would update, {} up to date, {} failed",
                summary.updated,
                summary.would_update,
                summary.up_to_date,
                summary.records_failed + summary.records_not_found
            ),
        }
    }
}

/// Core reconciliation engine
///
/// ## Lifecycle
///
/// 1. Create with [`UpdateEngine::new()`] (loads the cache once)
/// 2. Call [`UpdateEngine::update_all()`] once per run
/// 3. Drop to close the event channel
///
/// ## Threading
///
/// A run is strictly sequential: accounts, domains and records are
/// processed one at a time in configuration order.
pub struct UpdateEngine {
    /// DNS provider for listing and updating records
    provider: Box<dyn DnsProvider>,

    /// Durable store for the cache
    cache_store: Box<dyn CacheStore>,

    /// In-memory cache, loaded at construction
    cache: Cache,

    /// Report updates without issuing writes
    dry_run: bool,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl UpdateEngine {
    /// Create a new engine and load the cache
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub async fn new(
        provider: Box<dyn DnsProvider>,
        cache_store: Box<dyn CacheStore>,
        config: EngineConfig,
    ) -> (Self, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(config.event_channel_capacity.max(1));
        let cache = cache_store.load().await;

        debug!(
            provider = provider.provider_name(),
            cache = %cache_store.location(),
            last_ip = ?cache.last_ip,
            dry_run = config.dry_run,
            "Engine created"
        );

        let engine = Self {
            provider,
            cache_store,
            cache,
            dry_run: config.dry_run,
            event_tx: tx,
        };

        (engine, rx)
    }

    /// The in-memory cache
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Whether the engine runs in dry-run mode
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Bring every configured record in line with `current_ip`
    ///
    /// Never fails: provider and persistence failures are reported through
    /// logs, events and the returned summary.
    pub async fn update_all(&mut self, auth_configs: &[AuthConfig], current_ip: &str) -> RunSummary {
        let first_run = self.cache.is_first_run();
        let ip_changed = self.cache.ip_changed(current_ip);

        if first_run {
            debug!(ip = current_ip, "First run detected, will save initial state");
        } else if ip_changed {
            debug!(
                previous = ?self.cache.last_ip,
                ip = current_ip,
                "IP changed"
            );
        } else {
            debug!(ip = current_ip, "IP hasn't changed");
        }

        self.emit_event(EngineEvent::RunStarted {
            current_ip: current_ip.to_string(),
            previous_ip: self.cache.last_ip.clone(),
            first_run,
            ip_changed,
            dry_run: self.dry_run,
        });

        let mut summary = RunSummary {
            first_run,
            ip_changed,
            ..RunSummary::default()
        };

        for auth in auth_configs {
            let outcome = self.sync_account(auth, current_ip).await;
            summary.add_account(&outcome);
        }

        if first_run || ip_changed || summary.updates_made() {
            summary.cache_saved = self.persist(current_ip).await;
        } else {
            debug!("Nothing changed, cache left untouched");
        }

        debug!(
            updated = summary.updated,
            would_update = summary.would_update,
            up_to_date = summary.up_to_date,
            failed = summary.records_failed,
            "Run finished"
        );
        self.emit_event(EngineEvent::RunFinished {
            summary: summary.clone(),
        });

        summary
    }

    /// Process one credential scope
    async fn sync_account(&self, auth: &AuthConfig, current_ip: &str) -> AccountOutcome {
        if auth.token.is_empty() {
            debug!(account = %auth.description, ok = false, "Empty token, skipping account");
            self.emit_event(EngineEvent::ZonesUnavailable {
                account: auth.description.clone(),
                error: "API token is empty".to_string(),
            });
            return AccountOutcome::ZonesUnavailable;
        }

        let zones = match self.provider.list_zones(&auth.token).await {
            Ok(zones) => zones,
            Err(e) => {
                debug!(account = %auth.description, ok = false, "Failed to list zones: {}", e);
                self.emit_event(EngineEvent::ZonesUnavailable {
                    account: auth.description.clone(),
                    error: e.to_string(),
                });
                return AccountOutcome::ZonesUnavailable;
            }
        };

        debug!(account = %auth.description, zones = zones.len(), "Listed zones");

        let mut domains = Vec::with_capacity(auth.domains.len());
        for domain in &auth.domains {
            let outcome = self
                .sync_domain(&auth.description, &auth.token, domain, &zones, current_ip)
                .await;
            domains.push(outcome);
        }

        AccountOutcome::Processed(domains)
    }

    /// Process one domain of an account
    async fn sync_domain(
        &self,
        account: &str,
        token: &ApiToken,
        domain: &DomainConfig,
        zones: &ZoneMap,
        current_ip: &str,
    ) -> DomainOutcome {
        let zone_name = domain.zone_name.as_str();

        let Some(zone_id) = zones.get(zone_name) else {
            debug!(account, zone = zone_name, ok = false, "Zone not found");
            self.emit_event(EngineEvent::ZoneNotFound {
                account: account.to_string(),
                zone: zone_name.to_string(),
            });
            return DomainOutcome::ZoneNotFound;
        };

        let records = match self.provider.list_records(token, zone_id).await {
            Ok(records) => records,
            Err(e) => {
                debug!(zone = zone_name, ok = false, "Failed to list records: {}", e);
                self.emit_event(EngineEvent::RecordsUnavailable {
                    zone: zone_name.to_string(),
                    error: e.to_string(),
                });
                return DomainOutcome::RecordsUnavailable;
            }
        };

        debug!(zone = zone_name, records = records.len(), "Listed records");

        let mut outcomes = Vec::with_capacity(domain.records.len());
        for record in &domain.records {
            let outcome = self
                .sync_record(token, zone_id, zone_name, record, &records, current_ip)
                .await;
            outcomes.push(outcome);
        }

        DomainOutcome::Processed(outcomes)
    }

    /// Process one record of a domain
    async fn sync_record(
        &self,
        token: &ApiToken,
        zone_id: &str,
        zone_name: &str,
        record: &RecordSpec,
        records: &RecordMap,
        current_ip: &str,
    ) -> RecordOutcome {
        let fqdn = record.fqdn(zone_name);

        let Some(remote) = records.get(&fqdn) else {
            debug!(fqdn = %fqdn, ok = false, "Record not found");
            self.emit_event(EngineEvent::RecordNotFound { fqdn });
            return RecordOutcome::NotFound;
        };

        if remote.content == current_ip {
            debug!(fqdn = %fqdn, ok = true, "Record already up to date");
            self.emit_event(EngineEvent::RecordUpToDate {
                fqdn,
                ip: current_ip.to_string(),
            });
            return RecordOutcome::UpToDate;
        }

        if self.dry_run {
            debug!(
                fqdn = %fqdn,
                previous = %remote.content,
                ip = current_ip,
                ok = true,
                "Dry run: would update record"
            );
            self.emit_event(EngineEvent::RecordWouldUpdate {
                fqdn,
                previous: remote.content.clone(),
                ip: current_ip.to_string(),
            });
            return RecordOutcome::WouldUpdate;
        }

        let update = RecordUpdate::for_spec(record, current_ip);
        match self
            .provider
            .update_record(token, zone_id, &remote.id, &update)
            .await
        {
            Ok(()) => {
                debug!(fqdn = %fqdn, ip = current_ip, ok = true, "Updated record");
                self.emit_event(EngineEvent::RecordUpdated {
                    fqdn,
                    previous: remote.content.clone(),
                    ip: current_ip.to_string(),
                });
                RecordOutcome::Updated
            }
            Err(e) => {
                debug!(fqdn = %fqdn, timeout = e.is_timeout(), ok = false, "Failed to update record: {}", e);
                self.emit_event(EngineEvent::RecordUpdateFailed {
                    fqdn,
                    error: e.to_string(),
                });
                RecordOutcome::Failed
            }
        }
    }

    /// Record `current_ip` in the cache and persist it
    ///
    /// A failed save is reported and swallowed.
    async fn persist(&mut self, current_ip: &str) -> bool {
        self.cache.last_ip = Some(current_ip.to_string());
        let location = self.cache_store.location();

        match self.cache_store.save(&self.cache).await {
            Ok(()) => {
                debug!(location = %location, ok = true, "Cache saved");
                self.emit_event(EngineEvent::CacheSaved { location });
                true
            }
            Err(e) => {
                debug!(location = %location, ok = false, "Failed to save cache: {}", e);
                self.emit_event(EngineEvent::CacheSaveFailed {
                    location,
                    error: e.to_string(),
                });
                false
            }
        }
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening; events are optional.
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_events_are_errors() {
        let event = EngineEvent::ZoneNotFound {
            account: "main".to_string(),
            zone: "missing.com".to_string(),
        };
        assert_eq!(event.severity(), Level::ERROR);
        assert!(!event.is_ok());
        assert_eq!(event.to_string(), "Zone missing.com not found");
    }

    #[test]
    fn run_started_messages() {
        let first = EngineEvent::RunStarted {
            current_ip: "1.2.3.4".to_string(),
            previous_ip: None,
            first_run: true,
            ip_changed: true,
            dry_run: false,
        };
        assert_eq!(first.to_string(), "First run detected, will save initial state");

        let changed = EngineEvent::RunStarted {
            current_ip: "5.6.7.8".to_string(),
            previous_ip: Some("1.2.3.4".to_string()),
            first_run: false,
            ip_changed: true,
            dry_run: true,
        };
        assert_eq!(
            changed.to_string(),
            "IP changed from 1.2.3.4 to 5.6.7.8 (dry run)"
        );
        assert!(changed.is_ok());
    }

    #[test]
    fn dry_run_message() {
        let event = EngineEvent::RecordWouldUpdate {
            fqdn: "home.example.com".to_string(),
            previous: "1.2.3.4".to_string(),
            ip: "5.6.7.8".to_string(),
        };
        assert_eq!(
            event.to_string(),
            "Dry run: Would update home.example.com to 5.6.7.8"
        );
    }
}
