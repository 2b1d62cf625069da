// # HTTP IP Source
//
// Discovers the current public IPv4 address by asking plain-text echo
// services (e.g. icanhazip.com, ipify.org).
//
// ## Failover
//
// Services are tried in order; the first one that answers with a parsable
// IPv4 address wins. When all of them fail, the last error is returned.
// A single call never retries the same service.

use async_trait::async_trait;
use dynzone_core::traits::IpSource;
use dynzone_core::{Error, Result};

use std::net::Ipv4Addr;
use std::time::Duration;

/// Per-request timeout for echo services
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Default IP check services, in failover order
pub const DEFAULT_IP_SERVICES: &[&str] = &["https://ipv4.icanhazip.com", "https://api.ipify.org"];

/// HTTP-based IPv4 source with ordered failover
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// Echo service URLs, tried in order
    urls: Vec<String>,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a source using [`DEFAULT_IP_SERVICES`]
    pub fn new() -> Result<Self> {
        Self::with_urls(DEFAULT_IP_SERVICES.iter().map(|u| u.to_string()).collect())
    }

    /// Create a source with a custom list of services
    pub fn with_urls(urls: Vec<String>) -> Result<Self> {
        Self::with_timeout(urls, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a source with a custom list of services and timeout
    pub fn with_timeout(urls: Vec<String>, timeout: Duration) -> Result<Self> {
        if urls.is_empty() {
            return Err(Error::config("At least one IP service URL is required"));
        }
        if urls.iter().any(|u| u.trim().is_empty()) {
            return Err(Error::config("IP service URL cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { urls, client })
    }

    /// Configured service URLs
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    async fn fetch(&self, url: &str) -> Result<Ipv4Addr> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::timeout(url)
            } else {
                Error::request(url, format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::status(
                url,
                status.as_u16(),
                format!("HTTP error: {}", status),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::request(url, format!("Failed to read response: {}", e)))?;

        parse_ipv4(url, &body)
    }
}

#[async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        let mut last_error = None;

        for url in &self.urls {
            match self.fetch(url).await {
                Ok(ip) => {
                    tracing::debug!(url = %url, ip = %ip, "Public IP discovered");
                    return Ok(ip);
                }
                Err(e) => {
                    tracing::warn!(url = %url, "IP service failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::ip_source("No IP services configured")))
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

/// Parse an echo service body as a dotted-quad IPv4 address
fn parse_ipv4(url: &str, body: &str) -> Result<Ipv4Addr> {
    let text = body.trim();
    text.parse()
        .map_err(|_| Error::invalid_response(url, format!("Not an IPv4 address: {:?}", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trimmed_body() {
        let ip = parse_ipv4("https://ipv4.icanhazip.com", "203.0.113.7\n").unwrap();
        assert_eq!(ip, Ipv4Addr::new(203, 0, 113, 7));
    }

    #[test]
    fn rejects_non_ipv4_body() {
        for body in ["", "<html>", "2001:db8::1", "256.1.1.1"] {
            let err = parse_ipv4("https://svc", body).unwrap_err();
            assert!(matches!(err, Error::InvalidResponse { .. }), "{body}");
        }
    }

    #[test]
    fn defaults_follow_failover_order() {
        let source = HttpIpSource::new().unwrap();
        assert_eq!(source.urls()[0], "https://ipv4.icanhazip.com");
        assert_eq!(source.urls()[1], "https://api.ipify.org");
        assert_eq!(source.source_name(), "http");
    }

    #[test]
    fn empty_url_list_is_rejected() {
        assert!(HttpIpSource::with_urls(Vec::new()).is_err());
        assert!(HttpIpSource::with_urls(vec![" ".to_string()]).is_err());
    }

    #[tokio::test]
    async fn all_services_failing_returns_last_error() {
        // Port 9 on localhost refuses connections without waiting on a timeout.
        let source = HttpIpSource::with_timeout(
            vec![
                "http://127.0.0.1:9/first".to_string(),
                "http://127.0.0.1:9/second".to_string(),
            ],
            Duration::from_secs(2),
        )
        .unwrap();

        let err = source.current().await.unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("/second"));
    }
}
