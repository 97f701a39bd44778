//! Utility functions for keyword and TLD normalization.
//!
//! These helpers enforce the query invariants shared by [`DomainQuery`]
//! and the request layer: lowercase ASCII, no empty labels, and a
//! deduplicated TLD list in first-seen order.
//!
//! [`DomainQuery`]: crate::types::DomainQuery

use crate::error::DomainCheckError;

/// Shortest TLD accepted in a query.
pub const MIN_TLD_LEN: usize = 2;

/// Longest TLD accepted in a query.
pub const MAX_TLD_LEN: usize = 10;

/// Longest fully-qualified name RDAP servers will accept.
pub const MAX_DOMAIN_LEN: usize = 253;

/// Normalize a keyword (the label portion of a domain, without TLD).
///
/// Trims whitespace and lowercases. The result may contain dots, since a
/// keyword like `api.example` checks a subdomain-shaped name.
///
/// # Arguments
///
/// * `keyword` - Raw keyword as supplied by the caller
///
/// # Returns
///
/// The normalized keyword, or `InvalidDomain` when it is empty or malformed.
pub fn normalize_keyword(keyword: &str) -> Result<String, DomainCheckError> {
    let keyword = keyword.trim().to_ascii_lowercase();

    if keyword.is_empty() {
        return Err(DomainCheckError::invalid_domain(
            keyword,
            "Keyword cannot be empty",
        ));
    }

    if keyword.len() > MAX_DOMAIN_LEN {
        return Err(DomainCheckError::invalid_domain(
            keyword,
            format!("Keyword longer than {} characters", MAX_DOMAIN_LEN),
        ));
    }

    if !keyword
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
    {
        return Err(DomainCheckError::invalid_domain(
            keyword,
            "Only letters, digits, hyphens and dots are allowed",
        ));
    }

    for label in keyword.split('.') {
        if label.is_empty() {
            return Err(DomainCheckError::invalid_domain(
                keyword.clone(),
                "Keyword contains an empty label",
            ));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(DomainCheckError::invalid_domain(
                keyword.clone(),
                "Labels cannot start or end with a hyphen",
            ));
        }
    }

    Ok(keyword)
}

/// Normalize a single TLD: trim, strip a leading dot, lowercase.
///
/// Returns `Ok(None)` for an entry that is blank after trimming, so callers
/// can skip it.
pub fn normalize_tld(tld: &str) -> Result<Option<String>, DomainCheckError> {
    let tld = tld.trim();
    let tld = tld.strip_prefix('.').unwrap_or(tld).to_ascii_lowercase();

    if tld.is_empty() {
        return Ok(None);
    }

    if !is_valid_tld(&tld) {
        return Err(DomainCheckError::invalid_tld(
            tld,
            format!(
                "TLDs must be {}-{} letters, digits or hyphens",
                MIN_TLD_LEN, MAX_TLD_LEN
            ),
        ));
    }

    Ok(Some(tld))
}

/// Normalize a list of TLDs, dropping blanks and duplicates.
///
/// Order of first appearance is preserved.
pub fn normalize_tlds<S: AsRef<str>>(tlds: &[S]) -> Result<Vec<String>, DomainCheckError> {
    let mut normalized: Vec<String> = Vec::with_capacity(tlds.len());

    for tld in tlds {
        if let Some(tld) = normalize_tld(tld.as_ref())? {
            if !normalized.contains(&tld) {
                normalized.push(tld);
            }
        }
    }

    Ok(normalized)
}

/// Check TLD syntax without normalizing.
pub fn is_valid_tld(tld: &str) -> bool {
    (MIN_TLD_LEN..=MAX_TLD_LEN).contains(&tld.len())
        && !tld.starts_with('-')
        && !tld.ends_with('-')
        && tld.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_keyword() {
        assert_eq!(normalize_keyword("  Example ").unwrap(), "example");
        assert_eq!(normalize_keyword("api.example").unwrap(), "api.example");
        assert_eq!(normalize_keyword("my-shop").unwrap(), "my-shop");
    }

    #[test]
    fn test_normalize_keyword_rejects_malformed() {
        assert!(normalize_keyword("").is_err());
        assert!(normalize_keyword("   ").is_err());
        assert!(normalize_keyword("-shop").is_err());
        assert!(normalize_keyword("shop.").is_err());
        assert!(normalize_keyword("a..b").is_err());
        assert!(normalize_keyword("shop!").is_err());
        assert!(normalize_keyword(&"a".repeat(254)).is_err());
    }

    #[test]
    fn test_normalize_tld() {
        assert_eq!(normalize_tld(".COM").unwrap(), Some("com".to_string()));
        assert_eq!(normalize_tld(" io ").unwrap(), Some("io".to_string()));
        assert_eq!(normalize_tld("  ").unwrap(), None);
        assert!(normalize_tld("x").is_err());
        assert!(normalize_tld("waytoolongtld").is_err());
        assert!(normalize_tld("c_m").is_err());
    }

    #[test]
    fn test_normalize_tlds_dedups_in_order() {
        let tlds = normalize_tlds(&["io", "COM", "", ".io", "ai"]).unwrap();
        assert_eq!(tlds, vec!["io", "com", "ai"]);
    }
}
