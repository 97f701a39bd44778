//! RDAP (Registration Data Access Protocol) lookups.
//!
//! One HTTP GET per candidate domain against the endpoint chosen by the
//! [`EndpointResolver`]. The client reports what the server said and
//! nothing more: a record, an explicit 404, or a failure with its reason.
//! Deciding what a failure means for availability happens in the checker.

use crate::error::DomainCheckError;
use crate::protocols::registry::{extract_tld, EndpointResolver};
use crate::types::CheckConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER};
use reqwest::StatusCode;
use std::time::Duration;

/// Media type RDAP servers answer with.
pub const RDAP_MEDIA_TYPE: &str = "application/rdap+json";

/// Pause before the single retry on HTTP 429 when the server gives no hint.
const RATE_LIMIT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Longest `Retry-After` hint honoured before the retry.
const MAX_RATE_LIMIT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Parsed body of a successful RDAP response.
///
/// Kept as untyped JSON since registries disagree on which members they
/// send; the metadata extractor treats every member as optional.
#[derive(Debug, Clone, PartialEq)]
pub struct RdapRecord(serde_json::Value);

impl RdapRecord {
    pub fn from_json(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }
}

/// What a single lookup produced.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// HTTP 200 with a JSON body
    Found(RdapRecord),
    /// HTTP 404: the registry holds no record
    NotFound,
    /// Anything else, with the reason
    QueryFailed(DomainCheckError),
}

impl LookupOutcome {
    /// How long to wait before retrying, if this outcome was a 429.
    fn rate_limit_delay(&self) -> Option<Duration> {
        match self {
            LookupOutcome::QueryFailed(DomainCheckError::RateLimited { retry_after, .. }) => Some(
                retry_after
                    .unwrap_or(RATE_LIMIT_RETRY_DELAY)
                    .min(MAX_RATE_LIMIT_RETRY_DELAY),
            ),
            _ => None,
        }
    }
}

/// Source of RDAP answers for the checker.
///
/// Implemented by [`RdapClient`] for real lookups and by stubs in tests.
#[async_trait]
pub trait RdapLookup: Send + Sync {
    /// Look up one fully-qualified domain.
    async fn fetch(&self, domain: &str) -> LookupOutcome;

    /// Key used to group lookups that hit the same upstream server.
    fn endpoint_key(&self, domain: &str) -> String {
        extract_tld(domain)
    }
}

/// HTTP client for RDAP servers.
///
/// Holds one shared `reqwest::Client`, which is safe to use from many
/// concurrent lookups.
#[derive(Debug, Clone)]
pub struct RdapClient {
    /// HTTP client for making RDAP requests
    http_client: reqwest::Client,
    /// TLD to endpoint table
    resolver: EndpointResolver,
    /// Timeout for each request attempt
    timeout: Duration,
    /// Retry once when a server answers 429
    retry_on_rate_limit: bool,
}

impl RdapClient {
    /// Create a new RDAP client with default settings.
    pub fn new() -> Result<Self, DomainCheckError> {
        Self::with_config(&CheckConfig::default())
    }

    /// Create a client from a checker configuration.
    ///
    /// Uses the configured timeout, user agent, rate-limit retry setting and
    /// endpoint overrides.
    pub fn with_config(config: &CheckConfig) -> Result<Self, DomainCheckError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(RDAP_MEDIA_TYPE));

        let user_agent = HeaderValue::from_str(&config.user_agent).map_err(|e| {
            DomainCheckError::config(format!(
                "Invalid user agent '{}': {}",
                config.user_agent, e
            ))
        })?;

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .timeout(config.timeout.saturating_add(Duration::from_secs(2))) // Add buffer for HTTP timeout
            .build()
            .map_err(|e| {
                DomainCheckError::network_with_source(
                    "Failed to create RDAP HTTP client",
                    e.to_string(),
                )
            })?;

        Ok(Self {
            http_client,
            resolver: EndpointResolver::with_overrides(&config.endpoint_overrides),
            timeout: config.timeout,
            retry_on_rate_limit: config.retry_on_rate_limit,
        })
    }

    /// One request attempt, bounded by the configured timeout.
    async fn attempt(&self, url: &str, domain: &str) -> LookupOutcome {
        match tokio::time::timeout(self.timeout, self.request(url, domain)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => LookupOutcome::QueryFailed(e),
            Err(_) => LookupOutcome::QueryFailed(DomainCheckError::timeout(
                format!("RDAP request for {}", domain),
                self.timeout,
            )),
        }
    }

    async fn request(&self, url: &str, domain: &str) -> Result<LookupOutcome, DomainCheckError> {
        let response = self.http_client.get(url).send().await?;
        let status = response.status();

        tracing::debug!(domain, %status, "RDAP response");

        match status {
            StatusCode::OK => {
                let body = response.bytes().await?;
                let json = serde_json::from_slice::<serde_json::Value>(&body).map_err(|e| {
                    DomainCheckError::ParseError {
                        message: format!("RDAP response for {} is not JSON: {}", domain, e),
                        content: Some(String::from_utf8_lossy(&body).chars().take(200).collect()),
                    }
                })?;
                Ok(LookupOutcome::Found(RdapRecord::from_json(json)))
            }
            StatusCode::NOT_FOUND => Ok(LookupOutcome::NotFound),
            StatusCode::TOO_MANY_REQUESTS => Err(DomainCheckError::rate_limited(
                url_host(url).unwrap_or_else(|| domain.to_string()),
                "RDAP server answered 429 Too Many Requests",
                retry_after_hint(response.headers()),
            )),
            code => Err(DomainCheckError::rdap_with_status(
                domain,
                format!("RDAP server returned error: {}", code),
                code.as_u16(),
            )),
        }
    }
}

#[async_trait]
impl RdapLookup for RdapClient {
    async fn fetch(&self, domain: &str) -> LookupOutcome {
        let url = self.resolver.resolve(domain);
        tracing::debug!(domain, url = %url, "RDAP lookup");

        let outcome = self.attempt(&url, domain).await;
        if self.retry_on_rate_limit {
            if let Some(delay) = outcome.rate_limit_delay() {
                tracing::debug!(domain, "rate limited, retrying after {:?}", delay);
                tokio::time::sleep(delay).await;
                return self.attempt(&url, domain).await;
            }
        }

        outcome
    }

    fn endpoint_key(&self, domain: &str) -> String {
        url_host(&self.resolver.resolve(domain)).unwrap_or_else(|| extract_tld(domain))
    }
}

/// `Retry-After` in its delay-seconds form. HTTP-date values are ignored.
fn retry_after_hint(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn url_host(url: &str) -> Option<String> {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rdap_client_creation() {
        let client = RdapClient::new();
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_user_agent_is_config_error() {
        let config = CheckConfig::default().with_user_agent("bad\nagent");
        let err = RdapClient::with_config(&config).unwrap_err();
        assert!(matches!(err, DomainCheckError::ConfigError { .. }));
    }

    #[test]
    fn test_endpoint_key_groups_by_host() {
        let client = RdapClient::new().unwrap();
        assert_eq!(client.endpoint_key("example.com"), "rdap.verisign.com");
        assert_eq!(
            client.endpoint_key("example.com"),
            client.endpoint_key("example.net")
        );
        assert_eq!(client.endpoint_key("example.io"), "rdap.org");
        assert_eq!(client.endpoint_key("example.ch"), "rdap.nic.ch");
    }

    #[test]
    fn test_huge_timeout_does_not_overflow_client_timeout() {
        let config = CheckConfig::default().with_timeout(Duration::from_secs(u64::MAX));
        assert!(RdapClient::with_config(&config).is_ok());
    }

    #[test]
    fn test_rate_limit_delay_uses_capped_hint() {
        let hinted = LookupOutcome::QueryFailed(DomainCheckError::rate_limited(
            "rdap.org",
            "429",
            Some(Duration::from_secs(1)),
        ));
        assert_eq!(hinted.rate_limit_delay(), Some(Duration::from_secs(1)));

        let bare = LookupOutcome::QueryFailed(DomainCheckError::rate_limited("rdap.org", "429", None));
        assert_eq!(bare.rate_limit_delay(), Some(RATE_LIMIT_RETRY_DELAY));

        let greedy = LookupOutcome::QueryFailed(DomainCheckError::rate_limited(
            "rdap.org",
            "429",
            Some(Duration::from_secs(3600)),
        ));
        assert_eq!(greedy.rate_limit_delay(), Some(MAX_RATE_LIMIT_RETRY_DELAY));

        assert_eq!(LookupOutcome::NotFound.rate_limit_delay(), None);
    }

    #[test]
    fn test_retry_after_hint_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after_hint(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static(" 3 "));
        assert_eq!(retry_after_hint(&headers), Some(Duration::from_secs(3)));

        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after_hint(&headers), None);
    }
}
