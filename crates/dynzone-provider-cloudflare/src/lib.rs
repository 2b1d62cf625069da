// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare API v4 implementation of `DnsProvider`.
//
// ## Behavior
//
// - One bounded HTTP exchange per page/update (30 second client timeout)
// - Full error propagation to the engine; no retry, backoff or caching here
// - Timeouts are reported as `Error::Timeout`, everything else that goes
//   wrong on the wire as `Error::Request` with the HTTP status when known
// - Zone and record listings follow `result_info.total_pages`
//
// ## Security Requirements
//
// - API tokens are only ever used to build the `Authorization` header
// - API tokens never appear in logs or error messages
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?per_page=50&page=N`
// - List DNS Records: GET `/zones/:zone_id/dns_records?per_page=100&page=N`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use dynzone_core::config::ApiToken;
use dynzone_core::traits::{DnsProvider, RecordMap, RecordUpdate, RemoteRecord, ZoneMap};
use dynzone_core::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size used when listing zones
const ZONES_PER_PAGE: u32 = 50;

/// Page size used when listing DNS records
const RECORDS_PER_PAGE: u32 = 100;

/// Wraps every Cloudflare API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct ZoneInfo {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct DnsRecordInfo {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
}

/// Cloudflare DNS provider
///
/// Stateless apart from the shared HTTP client; the token is supplied per
/// call so a single provider serves every configured account.
#[derive(Debug, Clone)]
pub struct CloudflareProvider {
    /// HTTP client for API requests
    client: reqwest::Client,

    /// API base URL without trailing slash
    base_url: String,
}

impl CloudflareProvider {
    /// Create a provider talking to the public Cloudflare API
    pub fn new() -> Result<Self> {
        Self::with_base_url(CLOUDFLARE_API_BASE, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a provider for a different endpoint (proxy, test server)
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::config("Cloudflare API base URL cannot be empty"));
        }

        Ok(Self { client, base_url })
    }

    /// API base URL in use
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn zones_url(&self, page: u32) -> String {
        format!(
            "{}/zones?per_page={}&page={}",
            self.base_url, ZONES_PER_PAGE, page
        )
    }

    fn records_url(&self, zone_id: &str, page: u32) -> String {
        format!(
            "{}/zones/{}/dns_records?per_page={}&page={}",
            self.base_url, zone_id, RECORDS_PER_PAGE, page
        )
    }

    fn record_url(&self, zone_id: &str, record_id: &str) -> String {
        format!("{}/zones/{}/dns_records/{}", self.base_url, zone_id, record_id)
    }

    /// Send one request and decode the envelope
    async fn request<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        url: &str,
        token: &ApiToken,
        body: Option<&RecordUpdate>,
    ) -> Result<ApiResponse<T>> {
        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(token.expose())
            .header("Content-Type", "application/json");

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = error_body(response.text().await);
            let error = status_error(url, status.as_u16(), &error_text);
            tracing::debug!(url, status = status.as_u16(), ok = false, "{}", error);
            return Err(error);
        }

        let text = response.text().await.map_err(|e| transport_error(url, e))?;
        decode_envelope(url, &text)
    }

    /// Fetch every page of a listing
    async fn list_all<T: DeserializeOwned>(
        &self,
        token: &ApiToken,
        url_for_page: impl Fn(u32) -> String,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let url = url_for_page(page);
            let response: ApiResponse<Vec<T>> = self
                .request(reqwest::Method::GET, &url, token, None)
                .await?;

            items.extend(response.result.unwrap_or_default());

            match response.result_info {
                Some(info) if info.page.max(page) < info.total_pages => page += 1,
                _ => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn list_zones(&self, token: &ApiToken) -> Result<ZoneMap> {
        let zones: Vec<ZoneInfo> = self.list_all(token, |page| self.zones_url(page)).await?;
        tracing::debug!("Found {} zone(s)", zones.len());

        Ok(zones.into_iter().map(|zone| (zone.name, zone.id)).collect())
    }

    async fn list_records(&self, token: &ApiToken, zone_id: &str) -> Result<RecordMap> {
        let records: Vec<DnsRecordInfo> = self
            .list_all(token, |page| self.records_url(zone_id, page))
            .await?;
        tracing::debug!(zone_id, "Found {} record(s)", records.len());

        Ok(build_record_map(records))
    }

    async fn update_record(
        &self,
        token: &ApiToken,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<()> {
        let url = self.record_url(zone_id, record_id);
        tracing::debug!(
            url = %url,
            name = %update.name,
            content = %update.content,
            "Sending record update"
        );

        let _: ApiResponse<Value> = self
            .request(reqwest::Method::PUT, &url, token, Some(update))
            .await?;
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

/// Key records by name
///
/// When several records share a name, an address record (A/AAAA) is kept
/// over anything else; otherwise the first one listed wins.
fn build_record_map(records: Vec<DnsRecordInfo>) -> RecordMap {
    let mut map = RecordMap::new();

    for record in records {
        let replace = match map.get(&record.name) {
            None => true,
            Some(existing) => !is_address(&existing.record_type) && is_address(&record.record_type),
        };

        if replace {
            map.insert(
                record.name.clone(),
                RemoteRecord {
                    fqdn: record.name,
                    id: record.id,
                    record_type: record.record_type,
                    content: record.content,
                },
            );
        }
    }

    map
}

fn is_address(record_type: &str) -> bool {
    record_type.eq_ignore_ascii_case("A") || record_type.eq_ignore_ascii_case("AAAA")
}

/// Decode a 2xx body, treating `success: false` as a request failure
fn decode_envelope<T: DeserializeOwned>(url: &str, text: &str) -> Result<ApiResponse<T>> {
    let envelope: ApiResponse<T> = serde_json::from_str(text)
        .map_err(|e| Error::invalid_response(url, format!("Failed to parse response: {}", e)))?;

    if !envelope.success {
        let message = envelope
            .errors
            .iter()
            .map(|e| format!("{} ({})", e.message, e.code))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(Error::request(
            url,
            format!("Cloudflare API reported failure: {}", message),
        ));
    }

    Ok(envelope)
}

/// Body of a non-2xx response, or why it could not be read
fn error_body<E: std::fmt::Display>(body: std::result::Result<String, E>) -> String {
    body.unwrap_or_else(|e| format!("Unable to read error response: {}", e))
}

fn transport_error(url: &str, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        tracing::debug!(url, ok = false, "Request timed out");
        Error::timeout(url)
    } else {
        tracing::debug!(url, ok = false, "Request failed: {}", e);
        Error::request(url, format!("HTTP request failed: {}", e))
    }
}

/// Map HTTP status codes to request failures
fn status_error(url: &str, status: u16, error_text: &str) -> Error {
    let message = match status {
        401 | 403 => format!(
            "Authentication failed: Invalid API token or insufficient permissions. Status: {}",
            status
        ),
        404 => format!("Not found. Status: {}", status),
        409 => format!(
            "Conflict: Record is being updated by another process. Status: {}",
            status
        ),
        429 => format!("Rate limit exceeded. Please retry later. Status: {}", status),
        500..=599 => format!(
            "Cloudflare server error (transient): {} - {}",
            status, error_text
        ),
        _ => format!("Unexpected status: {} - {}", status, error_text),
    };

    Error::status(url, status, message)
}
