//! Main domain checker implementation.
//!
//! This module provides the `DomainChecker` that checks one keyword across
//! a set of TLDs: for each TLD it resolves the RDAP endpoint, looks the
//! domain up, extracts registration metadata and classifies the result,
//! then assembles the aggregate response in TLD order.

use crate::concurrent::ConcurrentProcessor;
use crate::error::DomainCheckError;
use crate::metadata::extract_metadata;
use crate::pacing::Pacer;
use crate::protocols::rdap::{LookupOutcome, RdapClient, RdapLookup};
use crate::types::{
    Availability, CheckConfig, DomainCheck, DomainCheckResponse, DomainCheckResult, DomainQuery,
};
use futures_util::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

/// Checks keywords across TLDs using RDAP.
///
/// The checker is generic over its lookup source so it can be driven by
/// anything implementing [`RdapLookup`]; the default is the HTTP
/// [`RdapClient`].
///
/// # Example
///
/// ```rust,no_run
/// use tld_check_lib::DomainChecker;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let checker = DomainChecker::new()?;
///     let response = checker
///         .check_keyword_across_tlds("example", &["com", "net", "org"])
///         .await?;
///     println!("Available: {:?}", response.available_domains);
///     Ok(())
/// }
/// ```
pub struct DomainChecker<L: RdapLookup = RdapClient> {
    /// Configuration settings for this checker instance
    config: CheckConfig,
    /// Where RDAP answers come from
    lookup: L,
}

impl DomainChecker<RdapClient> {
    /// Create a new domain checker with default configuration.
    ///
    /// Default settings:
    /// - Sequential checks, 100ms pause after each
    /// - Timeout: 5 seconds
    /// - Failed lookups reported as available
    pub fn new() -> Result<Self, DomainCheckError> {
        Self::with_config(CheckConfig::default())
    }

    /// Create a new domain checker with custom configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tld_check_lib::{CheckConfig, DomainChecker, FailurePolicy};
    /// use std::time::Duration;
    ///
    /// let config = CheckConfig::default()
    ///     .with_concurrency(4)
    ///     .with_timeout(Duration::from_secs(10))
    ///     .with_failure_policy(FailurePolicy::ReportUnknown);
    ///
    /// let checker = DomainChecker::with_config(config).unwrap();
    /// ```
    pub fn with_config(config: CheckConfig) -> Result<Self, DomainCheckError> {
        let lookup = RdapClient::with_config(&config)?;
        Ok(Self { config, lookup })
    }
}

impl<L: RdapLookup> DomainChecker<L> {
    /// Create a checker that takes its answers from `lookup`.
    pub fn with_lookup(config: CheckConfig, lookup: L) -> Self {
        Self { config, lookup }
    }

    /// Get the current configuration for this checker.
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Check one fully-qualified domain.
    ///
    /// # Arguments
    ///
    /// * `domain` - The domain name to check (e.g., "example.com")
    ///
    /// # Errors
    ///
    /// Returns `DomainCheckError` only if the domain is malformed; lookup
    /// failures are reported in the result per the failure policy.
    pub async fn check_domain(&self, domain: &str) -> Result<DomainCheckResult, DomainCheckError> {
        let (keyword, tld) = domain
            .trim()
            .rsplit_once('.')
            .filter(|(keyword, tld)| !keyword.is_empty() && !tld.is_empty())
            .ok_or_else(|| {
                DomainCheckError::invalid_domain(domain, "Expected a name like example.com")
            })?;
        let no_defaults: [&str; 0] = [];
        let query = DomainQuery::new(keyword, &[tld], &no_defaults)?;

        let domain = query
            .domains()
            .into_iter()
            .next()
            .ok_or_else(|| DomainCheckError::internal("Normalized query has no TLD"))?;
        let outcome = self.lookup.fetch(&domain).await;
        let check = DomainCheck {
            availability: classify(&domain, outcome),
            domain,
        };

        Ok(self
            .config
            .failure_policy
            .flatten(check, self.config.detailed_info))
    }

    /// Check a keyword across a set of TLDs.
    ///
    /// An empty TLD list means the configured default set. TLDs are
    /// deduplicated case-insensitively, keeping first-seen order, and the
    /// results follow that order.
    ///
    /// # Errors
    ///
    /// Returns `DomainCheckError` if the keyword or a TLD is malformed, or
    /// when the configured batch deadline elapses. Per-domain lookup
    /// failures never fail the batch.
    pub async fn check_keyword_across_tlds<S: AsRef<str>>(
        &self,
        keyword: &str,
        tlds: &[S],
    ) -> Result<DomainCheckResponse, DomainCheckError> {
        let query = DomainQuery::new(keyword, tlds, &self.config.default_tlds)?;
        self.check_query(&query, &CancellationToken::new()).await
    }

    /// Check an already-normalized query.
    ///
    /// Cancelling `cancel` stops in-flight and queued lookups and returns
    /// `DomainCheckError::Cancelled`.
    pub async fn check_query(
        &self,
        query: &DomainQuery,
        cancel: &CancellationToken,
    ) -> Result<DomainCheckResponse, DomainCheckError> {
        let domains = query.domains();
        tracing::info!(
            keyword = query.keyword(),
            tlds = domains.len(),
            concurrency = self.config.concurrency,
            "checking keyword"
        );

        let pacer = Pacer::new(self.config.pacing);
        let processor = ConcurrentProcessor::new(self.config.per_endpoint_concurrency);

        // `buffered` keeps results in input order whatever order they finish in
        let batch = stream::iter(domains)
            .map(|domain| self.check_one(domain, &pacer, &processor))
            .buffered(self.config.concurrency.clamp(1, 100))
            .collect::<Vec<_>>();

        let guarded = async {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(DomainCheckError::cancelled(format!(
                    "checking {}",
                    query.keyword()
                ))),
                checks = batch => Ok(checks),
            }
        };

        let checks = match self.config.batch_deadline {
            Some(deadline) => tokio::time::timeout(deadline, guarded).await.map_err(|_| {
                DomainCheckError::timeout(format!("checking {}", query.keyword()), deadline)
            })??,
            None => guarded.await?,
        };

        let policy = self.config.failure_policy;
        let results = checks
            .into_iter()
            .map(|check| policy.flatten(check, self.config.detailed_info))
            .collect();

        let response = DomainCheckResponse::assemble(query.keyword(), results);
        tracing::info!(
            keyword = query.keyword(),
            checked = response.total_checked,
            available = response.available_domains.len(),
            "check complete"
        );
        Ok(response)
    }

    /// Look up and classify one domain under the batch's limits.
    async fn check_one(
        &self,
        domain: String,
        pacer: &Pacer,
        processor: &ConcurrentProcessor,
    ) -> DomainCheck {
        let key = self.lookup.endpoint_key(&domain);

        let permit = processor.acquire(&key).await;
        pacer.before_request().await;
        let outcome = self.lookup.fetch(&domain).await;
        drop(permit);

        let availability = classify(&domain, outcome);
        pacer.after_request().await;

        DomainCheck {
            domain,
            availability,
        }
    }
}

/// Turn a lookup outcome into the three-way availability.
fn classify(domain: &str, outcome: LookupOutcome) -> Availability {
    match outcome {
        LookupOutcome::Found(record) => {
            tracing::debug!(domain, "registered");
            Availability::Registered(extract_metadata(&record))
        }
        LookupOutcome::NotFound => {
            tracing::debug!(domain, "not found");
            Availability::Available
        }
        LookupOutcome::QueryFailed(error) => {
            tracing::warn!(domain, error = %error, "lookup failed");
            Availability::LookupFailed(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::PacingPolicy;
    use crate::protocols::rdap::RdapRecord;
    use crate::types::{FailurePolicy, DEFAULT_TLDS};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    /// Lookup that answers from a table; unknown domains are NotFound.
    #[derive(Default)]
    struct StubLookup {
        answers: HashMap<String, LookupOutcome>,
        delays: HashMap<String, Duration>,
        single_endpoint: bool,
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl StubLookup {
        fn registered(mut self, domain: &str, registrar: &str) -> Self {
            let record = RdapRecord::from_json(json!({
                "ldhName": domain,
                "entities": [{
                    "roles": ["registrar"],
                    "vcardArray": ["vcard", [["fn", {}, "text", registrar]]]
                }],
                "events": [
                    {"eventAction": "registration", "eventDate": "2020-01-01"},
                    {"eventAction": "expiration", "eventDate": "2025-01-01"}
                ]
            }));
            self.answers
                .insert(domain.to_string(), LookupOutcome::Found(record));
            self
        }

        fn failing(mut self, domain: &str, error: DomainCheckError) -> Self {
            self.answers
                .insert(domain.to_string(), LookupOutcome::QueryFailed(error));
            self
        }

        fn delayed(mut self, domain: &str, delay: Duration) -> Self {
            self.delays.insert(domain.to_string(), delay);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RdapLookup for StubLookup {
        async fn fetch(&self, domain: &str) -> LookupOutcome {
            self.calls.lock().unwrap().push(domain.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if let Some(delay) = self.delays.get(domain) {
                tokio::time::sleep(*delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.answers
                .get(domain)
                .cloned()
                .unwrap_or(LookupOutcome::NotFound)
        }

        fn endpoint_key(&self, domain: &str) -> String {
            if self.single_endpoint {
                "rdap.example".to_string()
            } else {
                crate::protocols::registry::extract_tld(domain)
            }
        }
    }

    fn unpaced() -> CheckConfig {
        CheckConfig::default().with_pacing(PacingPolicy::None)
    }

    #[tokio::test]
    async fn test_keyword_across_tlds_end_to_end() {
        let stub = StubLookup::default().registered("example.com", "Example Registrar");
        let checker = DomainChecker::with_lookup(unpaced(), stub);

        let response = checker
            .check_keyword_across_tlds("example", &["com", "net", "org"])
            .await
            .unwrap();

        assert_eq!(response.keyword, "example");
        assert_eq!(response.total_checked, 3);
        assert_eq!(response.available_domains, vec!["example.net", "example.org"]);

        let com = &response.results[0];
        assert_eq!(com.domain, "example.com");
        assert!(!com.available);
        assert_eq!(com.registrar.as_deref(), Some("Example Registrar"));
        assert_eq!(com.registration_date.as_deref(), Some("2020-01-01"));
        assert_eq!(com.expiration_date.as_deref(), Some("2025-01-01"));
        assert_eq!(com.message.as_deref(), Some("Domain is registered"));

        for (result, domain) in response.results[1..].iter().zip(["example.net", "example.org"]) {
            assert_eq!(result.domain, domain);
            assert!(result.available);
            assert!(result.registrar.is_none());
            assert!(result.registration_date.is_none());
        }
    }

    #[tokio::test]
    async fn test_empty_tlds_use_defaults() {
        let checker = DomainChecker::with_lookup(unpaced(), StubLookup::default());
        let empty: [&str; 0] = [];

        let response = checker
            .check_keyword_across_tlds("mydomain", &empty)
            .await
            .unwrap();

        assert_eq!(response.total_checked, DEFAULT_TLDS.len());
        let domains: Vec<&str> = response.results.iter().map(|r| r.domain.as_str()).collect();
        assert_eq!(
            domains,
            vec![
                "mydomain.com",
                "mydomain.id",
                "mydomain.ai",
                "mydomain.org",
                "mydomain.net",
                "mydomain.io"
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_tlds_checked_once() {
        let checker = DomainChecker::with_lookup(unpaced(), StubLookup::default());

        let response = checker
            .check_keyword_across_tlds("Shop", &["net", "COM", "net", ".com"])
            .await
            .unwrap();

        assert_eq!(response.keyword, "shop");
        assert_eq!(response.total_checked, 2);
        assert_eq!(response.results.len(), 2);
        assert_eq!(checker.lookup.calls(), vec!["shop.net", "shop.com"]);
    }

    #[tokio::test]
    async fn test_repeated_checks_are_identical() {
        let stub = StubLookup::default()
            .registered("same.com", "Registrar A")
            .failing("same.io", DomainCheckError::network_with_source("Connection failed", "connection refused"));
        let checker = DomainChecker::with_lookup(unpaced(), stub);

        let first = checker
            .check_keyword_across_tlds("same", &["com", "net", "io"])
            .await
            .unwrap();
        let second = checker
            .check_keyword_across_tlds("same", &["com", "net", "io"])
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_empty_keyword_is_a_caller_error() {
        let checker = DomainChecker::with_lookup(unpaced(), StubLookup::default());

        let err = checker
            .check_keyword_across_tlds("", &["com"])
            .await
            .unwrap_err();

        assert!(matches!(err, DomainCheckError::InvalidDomain { .. }));
        assert!(checker.lookup.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failure_policies() {
        let stub = || {
            StubLookup::default()
                .failing("brand.io", DomainCheckError::timeout("RDAP request", Duration::from_secs(5)))
        };

        let lenient = DomainChecker::with_lookup(unpaced(), stub())
            .check_keyword_across_tlds("brand", &["com", "io"])
            .await
            .unwrap();
        assert_eq!(lenient.available_domains, vec!["brand.com", "brand.io"]);
        assert!(lenient.results[1]
            .message
            .as_deref()
            .unwrap()
            .contains("lookup failed"));

        let strict_config = unpaced().with_failure_policy(FailurePolicy::ReportUnknown);
        let strict = DomainChecker::with_lookup(strict_config, stub())
            .check_keyword_across_tlds("brand", &["com", "io"])
            .await
            .unwrap();
        assert_eq!(strict.total_checked, 2);
        assert_eq!(strict.available_domains, vec!["brand.com"]);
        assert_eq!(strict.results[1].registrar.as_deref(), Some("Unknown"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_pacing_after_every_check() {
        let config = CheckConfig::default().with_pacing(PacingPolicy::Fixed(Duration::from_millis(100)));
        let checker = DomainChecker::with_lookup(config, StubLookup::default());
        let start = Instant::now();

        checker
            .check_keyword_across_tlds("paced", &["com", "net", "org"])
            .await
            .unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_keep_tld_order_under_concurrency() {
        let stub = StubLookup::default()
            .delayed("fast.com", Duration::from_millis(300))
            .delayed("fast.net", Duration::from_millis(200))
            .delayed("fast.org", Duration::from_millis(100));
        let config = unpaced().with_concurrency(3);
        let checker = DomainChecker::with_lookup(config, stub);
        let start = Instant::now();

        let response = checker
            .check_keyword_across_tlds("fast", &["com", "net", "org"])
            .await
            .unwrap();

        let domains: Vec<&str> = response.results.iter().map(|r| r.domain.as_str()).collect();
        assert_eq!(domains, vec!["fast.com", "fast.net", "fast.org"]);
        // Ran in parallel, so the slowest lookup bounds the batch
        assert_eq!(start.elapsed(), Duration::from_millis(300));
        assert_eq!(checker.lookup.max_in_flight.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_endpoint_limit_is_respected() {
        let tlds = ["com", "net", "org", "io", "ai", "dev"];
        let mut stub = StubLookup {
            single_endpoint: true,
            ..Default::default()
        };
        for tld in tlds {
            stub = stub.delayed(&format!("busy.{}", tld), Duration::from_millis(50));
        }
        let config = unpaced()
            .with_concurrency(10)
            .with_per_endpoint_concurrency(2);
        let checker = DomainChecker::with_lookup(config, stub);

        let response = checker
            .check_keyword_across_tlds("busy", &tlds)
            .await
            .unwrap();

        assert_eq!(response.total_checked, 6);
        assert_eq!(checker.lookup.max_in_flight.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_the_batch() {
        let stub = StubLookup::default()
            .delayed("slow.com", Duration::from_secs(10))
            .delayed("slow.net", Duration::from_secs(10));
        let checker = DomainChecker::with_lookup(unpaced(), stub);
        let query = DomainQuery::new("slow", &["com", "net"], DEFAULT_TLDS).unwrap();
        let cancel = CancellationToken::new();
        let start = Instant::now();

        let (result, _) = tokio::join!(checker.check_query(&query, &cancel), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            cancel.cancel();
        });

        assert!(matches!(result, Err(DomainCheckError::Cancelled { .. })));
        assert!(start.elapsed() < Duration::from_secs(2));
        // The second lookup was never started
        assert_eq!(checker.lookup.calls(), vec!["slow.com"]);
    }

    #[tokio::test]
    async fn test_already_cancelled_token() {
        let checker = DomainChecker::with_lookup(unpaced(), StubLookup::default());
        let query = DomainQuery::new("early", &["com"], DEFAULT_TLDS).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = checker.check_query(&query, &cancel).await;
        assert!(matches!(result, Err(DomainCheckError::Cancelled { .. })));
        assert!(checker.lookup.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_deadline() {
        let stub = StubLookup::default().delayed("late.com", Duration::from_secs(5));
        let config = unpaced().with_batch_deadline(Duration::from_secs(1));
        let checker = DomainChecker::with_lookup(config, stub);

        let err = checker
            .check_keyword_across_tlds("late", &["com"])
            .await
            .unwrap_err();

        match err {
            DomainCheckError::Timeout { duration, .. } => {
                assert_eq!(duration, Duration::from_secs(1))
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_check_single_domain() {
        let stub = StubLookup::default().registered("example.com", "Example Registrar");
        let checker = DomainChecker::with_lookup(unpaced(), stub);

        let result = checker.check_domain("Example.COM").await.unwrap();
        assert_eq!(result.domain, "example.com");
        assert!(!result.available);
        assert_eq!(result.registrar.as_deref(), Some("Example Registrar"));

        let result = checker.check_domain("free.io").await.unwrap();
        assert!(result.available);

        assert!(checker.check_domain("nodot").await.is_err());
    }

    #[tokio::test]
    async fn test_detailed_info_carries_status() {
        let record = RdapRecord::from_json(json!({
            "status": ["active"],
            "nameservers": [{"ldhName": "ns1.example.net"}]
        }));
        let mut stub = StubLookup::default();
        stub.answers
            .insert("info.com".to_string(), LookupOutcome::Found(record));

        let checker = DomainChecker::with_lookup(unpaced().with_detailed_info(true), stub);
        let response = checker
            .check_keyword_across_tlds("info", &["com"])
            .await
            .unwrap();

        let result = &response.results[0];
        assert_eq!(result.registrar.as_deref(), Some("Unknown"));
        assert_eq!(result.status, vec!["active"]);
        assert_eq!(result.nameservers, vec!["ns1.example.net"]);
    }
}
