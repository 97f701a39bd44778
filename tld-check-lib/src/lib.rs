//! # TLD Check Library
//!
//! Checks one keyword across many top-level domains using RDAP.
//!
//! For each TLD the library picks the registry's RDAP server, looks the
//! domain up, pulls registrar and date metadata out of registered records,
//! and assembles one response in TLD order. Per-domain failures never fail
//! a batch; how they are reported is controlled by [`FailurePolicy`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tld_check_lib::DomainChecker;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let checker = DomainChecker::new()?;
//!     let response = checker
//!         .check_keyword_across_tlds("example", &["com", "net", "org"])
//!         .await?;
//!
//!     for result in &response.results {
//!         println!("{} - available: {}", result.domain, result.available);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Per-registry endpoints**: data-driven TLD table with config overrides
//! - **Pacing**: fixed interval or token bucket toward upstream servers
//! - **Bounded concurrency**: overall and per RDAP host, order preserved
//! - **Cancellation**: one token and an optional deadline per batch

// Re-export main public API types and functions
// This makes them available as tld_check_lib::TypeName
pub use checker::DomainChecker;
pub use config::{
    load_env_config, parse_duration_string, ConfigManager, DefaultsConfig, EnvConfig, FileConfig,
};
pub use error::DomainCheckError;
pub use metadata::extract_metadata;
pub use pacing::{Pacer, PacingPolicy};
pub use protocols::rdap::RDAP_MEDIA_TYPE;
pub use protocols::registry::FALLBACK_TEMPLATE;
pub use protocols::{extract_tld, EndpointResolver, LookupOutcome, RdapClient, RdapLookup, RdapRecord};
pub use request::CheckRequest;
pub use types::{
    Availability, CheckConfig, DomainCheck, DomainCheckResponse, DomainCheckResult, DomainQuery,
    FailurePolicy, RegistrationMetadata, DEFAULT_TLDS, DEFAULT_USER_AGENT, UNKNOWN_REGISTRAR,
};

// Cancellation tokens are part of the public API
pub use tokio_util::sync::CancellationToken;

// Internal modules - these are not part of the public API
mod checker;
mod concurrent;
mod config;
mod error;
mod metadata;
mod pacing;
mod protocols;
mod request;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, DomainCheckError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

/// Get library information for debugging or display purposes.
pub fn info() -> LibraryInfo {
    LibraryInfo {
        version: VERSION,
        author: AUTHOR,
        user_agent: DEFAULT_USER_AGENT,
    }
}

/// Information about the library build
#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub version: &'static str,
    pub author: &'static str,
    pub user_agent: &'static str,
}
