//! Inbound check requests.
//!
//! A request carries whatever the user typed: a bare keyword
//! (`myawesomesite`) or a full domain (`myawesomesite.com`), plus an
//! optional TLD list. This module validates that shape and turns it into
//! the normalized [`DomainQuery`] the checker works on.

use crate::error::DomainCheckError;
use crate::types::DomainQuery;
use crate::utils::{is_valid_tld, MAX_DOMAIN_LEN, MAX_TLD_LEN, MIN_TLD_LEN};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Shortest accepted `name`.
pub const MIN_NAME_LEN: usize = 3;

lazy_static::lazy_static! {
    static ref NAME_PATTERN: Regex =
        Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9.-]*[a-zA-Z0-9]$").expect("name pattern is valid");
}

/// A request to check one name across TLDs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRequest {
    /// Keyword or full domain, e.g. `myawesomesite` or `myawesomesite.com`
    pub name: String,

    /// TLDs to check; absent or empty means the default set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tlds: Option<Vec<String>>,
}

impl CheckRequest {
    pub fn new<N: Into<String>>(name: N, tlds: Option<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            tlds,
        }
    }

    /// Validate the request shape.
    ///
    /// `name` must be 3-253 characters of letters, digits, dots and hyphens,
    /// starting and ending with a letter or digit. Each TLD must be 2-10
    /// characters.
    pub fn validate(&self) -> Result<(), DomainCheckError> {
        let name = self.name.trim();
        let len = name.chars().count();

        if len < MIN_NAME_LEN {
            return Err(DomainCheckError::invalid_domain(
                name,
                format!("Name must be at least {} characters", MIN_NAME_LEN),
            ));
        }
        if len > MAX_DOMAIN_LEN {
            return Err(DomainCheckError::invalid_domain(
                name,
                format!("Name must be at most {} characters", MAX_DOMAIN_LEN),
            ));
        }
        if !NAME_PATTERN.is_match(name) {
            return Err(DomainCheckError::invalid_domain(
                name,
                "Name may only contain letters, digits, dots and hyphens, and must start and end with a letter or digit",
            ));
        }

        for tld in self.tlds.iter().flatten() {
            let tld_len = tld.trim().trim_start_matches('.').chars().count();
            if !(MIN_TLD_LEN..=MAX_TLD_LEN).contains(&tld_len) {
                return Err(DomainCheckError::invalid_tld(
                    tld.as_str(),
                    format!(
                        "TLDs must be between {} and {} characters",
                        MIN_TLD_LEN, MAX_TLD_LEN
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Split `name` into keyword and the TLD it ends with, if any.
    ///
    /// The split happens at the last dot: `api.example.com` gives
    /// `("api.example", Some("com"))`.
    pub fn split_name(&self) -> (String, Option<String>) {
        let name = self.name.trim();
        match name.rsplit_once('.') {
            Some((keyword, tld)) if !keyword.is_empty() && !tld.is_empty() => {
                (keyword.to_string(), Some(tld.to_ascii_lowercase()))
            }
            _ => (name.to_string(), None),
        }
    }

    /// Validate and normalize into a query.
    ///
    /// Explicit TLDs are used as given. Without them the default set is
    /// used, extended by the TLD the name ended with when it is a valid TLD
    /// not already in the set.
    pub fn into_query<S: AsRef<str>>(
        &self,
        default_tlds: &[S],
    ) -> Result<DomainQuery, DomainCheckError> {
        self.validate()?;

        let (keyword, extracted_tld) = self.split_name();

        let tlds: Vec<String> = match &self.tlds {
            Some(tlds) if !tlds.is_empty() => tlds.clone(),
            _ => {
                let mut tlds: Vec<String> = default_tlds
                    .iter()
                    .map(|tld| tld.as_ref().to_ascii_lowercase())
                    .collect();
                match extracted_tld {
                    Some(tld) if !is_valid_tld(&tld) => {
                        tracing::debug!(name = %self.name, suffix = %tld, "suffix is not a valid TLD, not checking it");
                    }
                    Some(tld) if !tlds.contains(&tld) => tlds.push(tld),
                    _ => {}
                }
                tlds
            }
        };

        DomainQuery::new(&keyword, &tlds, default_tlds)
    }
}
