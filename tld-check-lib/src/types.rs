//! Core data types for keyword-across-TLDs checking.
//!
//! This module defines the normalized query, the per-domain and aggregate
//! results handed back to callers, the internal three-way availability
//! classification, and the configuration that drives a checker.

use crate::error::DomainCheckError;
use crate::pacing::PacingPolicy;
use crate::utils::{normalize_keyword, normalize_tlds};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// User agent sent with every RDAP request unless configured otherwise.
pub const DEFAULT_USER_AGENT: &str = "DomainCheckerBot/1.0";

/// Registrar reported for registered domains whose record names none.
pub const UNKNOWN_REGISTRAR: &str = "Unknown";

/// TLDs checked when a query arrives without any.
pub const DEFAULT_TLDS: &[&str] = &["com", "id", "ai", "org", "net", "io"];

/// A normalized `(keyword, tlds)` pair ready for checking.
///
/// Construction enforces the query invariants: the keyword is non-empty,
/// lowercase ASCII label content, and the TLD list is lowercased and
/// deduplicated with first-seen order preserved. An empty TLD list is
/// replaced by the supplied defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainQuery {
    keyword: String,
    tlds: Vec<String>,
}

impl DomainQuery {
    /// Build a query, substituting `default_tlds` when `tlds` is empty.
    pub fn new<S: AsRef<str>, D: AsRef<str>>(
        keyword: &str,
        tlds: &[S],
        default_tlds: &[D],
    ) -> Result<Self, DomainCheckError> {
        let keyword = normalize_keyword(keyword)?;

        let mut tlds = normalize_tlds(tlds)?;
        if tlds.is_empty() {
            tlds = normalize_tlds(default_tlds)?;
        }
        if tlds.is_empty() {
            return Err(DomainCheckError::config(
                "No TLDs given and the default TLD set is empty",
            ));
        }

        Ok(Self { keyword, tlds })
    }

    /// The normalized keyword (label portion without TLD).
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// The normalized TLDs in check order.
    pub fn tlds(&self) -> &[String] {
        &self.tlds
    }

    /// Fully-qualified domains in TLD order.
    pub fn domains(&self) -> Vec<String> {
        self.tlds
            .iter()
            .map(|tld| format!("{}.{}", self.keyword, tld))
            .collect()
    }
}

/// Registration details pulled out of an RDAP record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationMetadata {
    /// Registrar name, `"Unknown"` when the record names none
    pub registrar: String,

    /// When the domain was first registered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,

    /// When the domain registration expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,

    /// Last change to the registration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_changed_date: Option<String>,

    /// Domain status codes (e.g., "client transfer prohibited")
    pub status: Vec<String>,

    /// Nameservers associated with the domain
    pub nameservers: Vec<String>,
}

impl Default for RegistrationMetadata {
    fn default() -> Self {
        Self {
            registrar: UNKNOWN_REGISTRAR.to_string(),
            registration_date: None,
            expiration_date: None,
            last_changed_date: None,
            status: Vec::new(),
            nameservers: Vec::new(),
        }
    }
}

/// Internal classification of one domain lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Availability {
    /// The registry holds no record for the domain
    Available,
    /// The registry returned a record
    Registered(RegistrationMetadata),
    /// The lookup could not determine either way
    LookupFailed(DomainCheckError),
}

/// One checked domain before it is flattened for the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainCheck {
    pub domain: String,
    pub availability: Availability,
}

/// How lookups that failed are reported to callers.
///
/// The outward result only carries a boolean, so a failed lookup has to be
/// flattened into one side or the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Report failed lookups as available, with the failure in `message`.
    /// Matches the long-standing behavior, but a network hiccup can make a
    /// registered domain look purchasable.
    #[default]
    TreatAsAvailable,

    /// Report failed lookups as not available with an `"Unknown"` registrar
    /// and keep them out of `availableDomains`.
    ReportUnknown,
}

impl FailurePolicy {
    /// Flatten an internal check into the caller-facing result.
    ///
    /// `detailed` controls whether status codes and nameservers are copied
    /// onto registered results.
    pub fn flatten(self, check: DomainCheck, detailed: bool) -> DomainCheckResult {
        let DomainCheck {
            domain,
            availability,
        } = check;

        match availability {
            Availability::Available => DomainCheckResult::available(domain),
            Availability::Registered(metadata) => {
                DomainCheckResult::registered(domain, metadata, detailed)
            }
            Availability::LookupFailed(error) => match self {
                FailurePolicy::TreatAsAvailable => DomainCheckResult {
                    message: Some(format!(
                        "Domain appears to be available (lookup failed: {})",
                        error
                    )),
                    lookup_failed: true,
                    ..DomainCheckResult::available(domain)
                },
                FailurePolicy::ReportUnknown => DomainCheckResult {
                    domain,
                    available: false,
                    registrar: Some(UNKNOWN_REGISTRAR.to_string()),
                    registration_date: None,
                    expiration_date: None,
                    message: Some(format!("Lookup failed: {}", error)),
                    lookup_failed: true,
                    status: Vec::new(),
                    nameservers: Vec::new(),
                },
            },
        }
    }
}

/// Result of checking one domain, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainCheckResult {
    /// The domain name that was checked (e.g., "example.com")
    pub domain: String,

    /// Whether the domain appears to be available for registration
    pub available: bool,

    /// Registrar name (registered domains only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registrar: Option<String>,

    /// ISO-8601 registration date, when the registry supplied one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,

    /// ISO-8601 expiration date, when the registry supplied one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,

    /// Human-readable explanation of the classification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// The lookup itself failed; `available` reflects the failure policy
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub lookup_failed: bool,

    /// Status codes, only filled in when detailed info is enabled
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<String>,

    /// Nameservers, only filled in when detailed info is enabled
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nameservers: Vec<String>,
}

impl DomainCheckResult {
    /// Result for a domain the registry has no record of.
    pub fn available<D: Into<String>>(domain: D) -> Self {
        Self {
            domain: domain.into(),
            available: true,
            registrar: None,
            registration_date: None,
            expiration_date: None,
            message: Some("Domain appears to be available".to_string()),
            lookup_failed: false,
            status: Vec::new(),
            nameservers: Vec::new(),
        }
    }

    /// Result for a registered domain.
    pub fn registered<D: Into<String>>(
        domain: D,
        metadata: RegistrationMetadata,
        detailed: bool,
    ) -> Self {
        let (status, nameservers) = if detailed {
            (metadata.status, metadata.nameservers)
        } else {
            (Vec::new(), Vec::new())
        };

        Self {
            domain: domain.into(),
            available: false,
            registrar: Some(metadata.registrar),
            registration_date: metadata.registration_date,
            expiration_date: metadata.expiration_date,
            message: Some("Domain is registered".to_string()),
            lookup_failed: false,
            status,
            nameservers,
        }
    }
}

/// Aggregate response for one keyword checked across a set of TLDs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainCheckResponse {
    pub keyword: String,
    pub total_checked: usize,
    pub available_domains: Vec<String>,
    pub results: Vec<DomainCheckResult>,
}

impl DomainCheckResponse {
    /// Assemble the response from results already in TLD order.
    pub fn assemble<K: Into<String>>(keyword: K, results: Vec<DomainCheckResult>) -> Self {
        let available_domains = results
            .iter()
            .filter(|r| r.available)
            .map(|r| r.domain.clone())
            .collect();

        Self {
            keyword: keyword.into(),
            total_checked: results.len(),
            available_domains,
            results,
        }
    }
}

/// Configuration options for checking operations.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Timeout for each RDAP request
    /// Default: 5 seconds
    pub timeout: Duration,

    /// Pacing applied around each domain check
    /// Default: fixed 100ms after every check
    pub pacing: PacingPolicy,

    /// Maximum number of domain checks in flight
    /// Default: 1 (sequential), Range: 1-100
    pub concurrency: usize,

    /// Maximum number of requests in flight against one RDAP host
    /// Default: 2, Range: 1-100
    pub per_endpoint_concurrency: usize,

    /// TLDs used when a query arrives without any
    pub default_tlds: Vec<String>,

    /// User agent sent with RDAP requests
    pub user_agent: String,

    /// How failed lookups are reported
    pub failure_policy: FailurePolicy,

    /// Whether to copy status codes and nameservers onto registered results
    /// Default: false
    pub detailed_info: bool,

    /// Upper bound for a whole batch; None means no deadline
    pub batch_deadline: Option<Duration>,

    /// Retry once after a short pause when a server answers 429
    /// Default: false
    pub retry_on_rate_limit: bool,

    /// Extra TLD to URL template rules, taking precedence over built-ins
    pub endpoint_overrides: HashMap<String, String>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            pacing: PacingPolicy::default(),
            concurrency: 1,
            per_endpoint_concurrency: 2,
            default_tlds: DEFAULT_TLDS.iter().map(|s| s.to_string()).collect(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            failure_policy: FailurePolicy::default(),
            detailed_info: false,
            batch_deadline: None,
            retry_on_rate_limit: false,
            endpoint_overrides: HashMap::new(),
        }
    }
}

impl CheckConfig {
    /// Set how many checks may run at once.
    ///
    /// Automatically caps concurrency at 100 to prevent resource exhaustion.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, 100);
        self
    }

    /// Set how many requests may hit one RDAP host at once.
    pub fn with_per_endpoint_concurrency(mut self, limit: usize) -> Self {
        self.per_endpoint_concurrency = limit.clamp(1, 100);
        self
    }

    /// Set custom timeout for RDAP requests.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the pacing policy.
    pub fn with_pacing(mut self, pacing: PacingPolicy) -> Self {
        self.pacing = pacing;
        self
    }

    /// Set the TLDs used when a query has none.
    pub fn with_default_tlds(mut self, tlds: Vec<String>) -> Self {
        self.default_tlds = tlds;
        self
    }

    /// Set the user agent sent to RDAP servers.
    pub fn with_user_agent<U: Into<String>>(mut self, user_agent: U) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Enable detailed domain information on registered results.
    pub fn with_detailed_info(mut self, enabled: bool) -> Self {
        self.detailed_info = enabled;
        self
    }

    /// Bound the wall-clock time of a whole batch.
    pub fn with_batch_deadline(mut self, deadline: Duration) -> Self {
        self.batch_deadline = Some(deadline);
        self
    }

    /// Retry once on HTTP 429.
    pub fn with_retry_on_rate_limit(mut self, enabled: bool) -> Self {
        self.retry_on_rate_limit = enabled;
        self
    }

    /// Add an endpoint rule for one TLD.
    pub fn with_endpoint<T: Into<String>, U: Into<String>>(mut self, tld: T, template: U) -> Self {
        self.endpoint_overrides
            .insert(tld.into().to_lowercase(), template.into());
        self
    }
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::TreatAsAvailable => write!(f, "treat-as-available"),
            FailurePolicy::ReportUnknown => write!(f, "report-unknown"),
        }
    }
}
