//! Test doubles and common utilities for engine contract tests

#![allow(dead_code)]

use dynzone_core::config::{ApiToken, AuthConfig, DomainConfig, RecordSpec};
use dynzone_core::error::{Error, Result};
use dynzone_core::traits::{DnsProvider, RecordMap, RecordUpdate, RemoteRecord, ZoneMap};
use dynzone_core::{EngineEvent, UpdateEngine};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// A recorded `update_record` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCall {
    pub token: String,
    pub zone_id: String,
    pub record_id: String,
    pub update: RecordUpdate,
}

#[derive(Default)]
struct MockState {
    /// token → zone name → zone id
    zones: HashMap<String, ZoneMap>,
    /// zone id → fqdn → record
    records: HashMap<String, RecordMap>,
    failing_tokens: HashSet<String>,
    failing_zones: HashSet<String>,
    failing_records: HashSet<String>,
    updates: Vec<UpdateCall>,
    list_zone_calls: usize,
    list_record_calls: usize,
}

/// A scripted DnsProvider that tracks calls
///
/// Clones share state, so a test can keep a handle after boxing one into
/// the engine. Successful updates rewrite the stored record content.
#[derive(Clone, Default)]
pub struct MockDnsProvider {
    state: Arc<Mutex<MockState>>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `zone_name` (id `zone_id`) visible to `token`
    pub fn with_zone(self, token: &str, zone_name: &str, zone_id: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state
                .zones
                .entry(token.to_string())
                .or_default()
                .insert(zone_name.to_string(), zone_id.to_string());
            state.records.entry(zone_id.to_string()).or_default();
        }
        self
    }

    /// Add a record to a zone
    pub fn with_record(self, zone_id: &str, fqdn: &str, record_id: &str, content: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.records.entry(zone_id.to_string()).or_default().insert(
                fqdn.to_string(),
                RemoteRecord {
                    fqdn: fqdn.to_string(),
                    id: record_id.to_string(),
                    record_type: "A".to_string(),
                    content: content.to_string(),
                },
            );
        }
        self
    }

    /// Make zone listing fail for `token`
    pub fn failing_token(self, token: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_tokens
            .insert(token.to_string());
        self
    }

    /// Make record listing fail for `zone_id`
    pub fn failing_zone(self, zone_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_zones
            .insert(zone_id.to_string());
        self
    }

    /// Make updates fail (with a timeout) for `record_id`
    pub fn failing_record(self, record_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_records
            .insert(record_id.to_string());
        self
    }

    /// Successful and failed update calls, in order
    pub fn updates(&self) -> Vec<UpdateCall> {
        self.state.lock().unwrap().updates.clone()
    }

    /// Number of update calls issued
    pub fn update_call_count(&self) -> usize {
        self.state.lock().unwrap().updates.len()
    }

    pub fn list_zone_calls(&self) -> usize {
        self.state.lock().unwrap().list_zone_calls
    }

    pub fn list_record_calls(&self) -> usize {
        self.state.lock().unwrap().list_record_calls
    }

    /// Current content of a remote record
    pub fn content(&self, zone_id: &str, fqdn: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .records
            .get(zone_id)
            .and_then(|records| records.get(fqdn))
            .map(|record| record.content.clone())
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_zones(&self, token: &ApiToken) -> Result<ZoneMap> {
        let mut state = self.state.lock().unwrap();
        state.list_zone_calls += 1;

        if state.failing_tokens.contains(token.expose()) {
            return Err(Error::status("https://mock/zones", 403, "Authentication failed"));
        }

        Ok(state.zones.get(token.expose()).cloned().unwrap_or_default())
    }

    async fn list_records(&self, _token: &ApiToken, zone_id: &str) -> Result<RecordMap> {
        let mut state = self.state.lock().unwrap();
        state.list_record_calls += 1;

        if state.failing_zones.contains(zone_id) {
            return Err(Error::timeout(format!("https://mock/zones/{zone_id}/dns_records")));
        }

        Ok(state.records.get(zone_id).cloned().unwrap_or_default())
    }

    async fn update_record(
        &self,
        token: &ApiToken,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.updates.push(UpdateCall {
            token: token.expose().to_string(),
            zone_id: zone_id.to_string(),
            record_id: record_id.to_string(),
            update: update.clone(),
        });

        if state.failing_records.contains(record_id) {
            return Err(Error::timeout(format!(
                "https://mock/zones/{zone_id}/dns_records/{record_id}"
            )));
        }

        if let Some(record) = state
            .records
            .get_mut(zone_id)
            .and_then(|records| records.values_mut().find(|r| r.id == record_id))
        {
            record.content = update.content.clone();
        }

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// One account with one domain holding the given record labels
pub fn single_account(token: &str, zone_name: &str, labels: &[&str]) -> AuthConfig {
    let mut domain = DomainConfig::new(zone_name);
    for label in labels {
        domain = domain.with_record(RecordSpec::new(*label));
    }
    AuthConfig::new(format!("{token} account"), token).with_domain(domain)
}

/// Drain all events currently buffered in the channel
pub fn drain_events(rx: &mut mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Build an engine over clones of the given test doubles
pub async fn engine_with(
    provider: &MockDnsProvider,
    store: &dynzone_core::MemoryCacheStore,
    dry_run: bool,
) -> (UpdateEngine, mpsc::Receiver<EngineEvent>) {
    UpdateEngine::new(
        Box::new(provider.clone()),
        Box::new(store.clone()),
        dynzone_core::EngineConfig::default().with_dry_run(dry_run),
    )
    .await
}
