//! Error handling for domain checking operations.
//!
//! This module defines the error type shared by every layer of the library.
//! Most variants describe a single failed lookup and are absorbed per domain
//! by the checker; only caller contract violations, cancellation and batch
//! deadlines ever reach the caller of a batch.

use std::fmt;
use std::time::Duration;

/// Main error type for domain checking operations.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainCheckError {
    /// Invalid domain name or keyword
    InvalidDomain { domain: String, reason: String },

    /// Invalid TLD in a query or request
    InvalidTld { tld: String, reason: String },

    /// Network-related errors (connection refused, DNS failure, etc.)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// RDAP server answered with something other than a record or a 404
    RdapError {
        domain: String,
        message: String,
        status_code: Option<u16>,
    },

    /// JSON parsing errors for RDAP responses
    ParseError {
        message: String,
        content: Option<String>,
    },

    /// Configuration errors (invalid settings, unparseable files, etc.)
    ConfigError { message: String },

    /// File I/O errors when reading configuration
    FileError { path: String, message: String },

    /// An operation ran past its allotted time
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Rate limiting errors when servers reject requests
    RateLimited {
        service: String,
        message: String,
        retry_after: Option<Duration>,
    },

    /// The caller cancelled the operation
    Cancelled { operation: String },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl DomainCheckError {
    /// Create a new invalid domain error.
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid TLD error.
    pub fn invalid_tld<T: Into<String>, R: Into<String>>(tld: T, reason: R) -> Self {
        Self::InvalidTld {
            tld: tld.into(),
            reason: reason.into(),
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new RDAP error with HTTP status code.
    pub fn rdap_with_status<D: Into<String>, M: Into<String>>(
        domain: D,
        message: M,
        status_code: u16,
    ) -> Self {
        Self::RdapError {
            domain: domain.into(),
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a new parse error.
    pub fn parse<M: Into<String>>(message: M) -> Self {
        Self::ParseError {
            message: message.into(),
            content: None,
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new rate limit error.
    ///
    /// `retry_after` is the server's `Retry-After` hint, when it sent one.
    pub fn rate_limited<S: Into<String>, M: Into<String>>(
        service: S,
        message: M,
        retry_after: Option<Duration>,
    ) -> Self {
        Self::RateLimited {
            service: service.into(),
            message: message.into(),
            retry_after,
        }
    }

    /// Create a new cancellation error.
    pub fn cancelled<O: Into<String>>(operation: O) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for errors caused by the caller's input rather than upstream state.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidDomain { .. } | Self::InvalidTld { .. })
    }
}

impl fmt::Display for DomainCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDomain { domain, reason } => {
                write!(f, "Invalid domain '{}': {}", domain, reason)
            }
            Self::InvalidTld { tld, reason } => {
                write!(f, "Invalid TLD '{}': {}", tld, reason)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::RdapError {
                domain,
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "RDAP error for '{}' (HTTP {}): {}", domain, code, message)
                } else {
                    write!(f, "RDAP error for '{}': {}", domain, message)
                }
            }
            Self::ParseError { message, content: _ } => {
                write!(f, "Parse error: {}", message)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::RateLimited {
                service,
                message,
                retry_after,
            } => {
                if let Some(retry) = retry_after {
                    write!(
                        f,
                        "Rate limited by {} (retry after {:?}): {}",
                        service, retry, message
                    )
                } else {
                    write!(f, "Rate limited by {}: {}", service, message)
                }
            }
            Self::Cancelled { operation } => {
                write!(f, "Cancelled: {}", operation)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for DomainCheckError {}

impl From<reqwest::Error> for DomainCheckError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network_with_source("HTTP request timed out", err.to_string())
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else if err.is_decode() {
            Self::parse(format!("Failed to decode response body: {}", err))
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}
