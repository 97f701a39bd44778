//! Protocol implementations for domain checking.
//!
//! This module contains the RDAP lookup client and the TLD to endpoint
//! table it resolves against.

/// RDAP (Registration Data Access Protocol) implementation
pub mod rdap;

/// TLD to RDAP endpoint mappings
pub mod registry;

// Re-export commonly used functions and types
pub use rdap::{LookupOutcome, RdapClient, RdapLookup, RdapRecord};
pub use registry::{extract_tld, EndpointResolver};
