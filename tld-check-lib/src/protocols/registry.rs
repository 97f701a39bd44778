//! TLD to RDAP endpoint mappings.
//!
//! The resolver is a priority-ordered table of `(tlds, url-template)` rules
//! plus a fallback template for everything else. Templates use `{tld}` and
//! `{domain}` placeholders. The built-in table is assembled once; callers
//! can layer configuration rules on top without touching the built-ins.

use std::collections::HashMap;

/// Template used for TLDs without a dedicated rule.
pub const FALLBACK_TEMPLATE: &str = "https://rdap.org/domain/{domain}";

/// Built-in rules in priority order. Earlier rules win when a TLD appears twice.
const BUILTIN_RULES: &[(&[&str], &str)] = &[
    // Country registries serving RDAP from their own nic host
    (&["ch", "li"], "https://rdap.nic.{tld}/domain/{domain}"),
    // Verisign
    (
        &["com", "net"],
        "https://rdap.verisign.com/{tld}/v1/domain/{domain}",
    ),
    // Public Interest Registry
    (
        &["org"],
        "https://rdap.publicinterestregistry.org/rdap/domain/{domain}",
    ),
];

lazy_static::lazy_static! {
    static ref DEFAULT_RESOLVER: EndpointResolver = EndpointResolver::from_rules(BUILTIN_RULES);
}

/// Maps fully-qualified domains to the RDAP URL that answers for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointResolver {
    templates: HashMap<String, String>,
    fallback: String,
}

impl Default for EndpointResolver {
    fn default() -> Self {
        DEFAULT_RESOLVER.clone()
    }
}

impl EndpointResolver {
    fn from_rules(rules: &[(&[&str], &str)]) -> Self {
        let mut templates = HashMap::new();
        for (tlds, template) in rules {
            for tld in tlds.iter() {
                templates
                    .entry(tld.to_string())
                    .or_insert_with(|| template.to_string());
            }
        }

        Self {
            templates,
            fallback: FALLBACK_TEMPLATE.to_string(),
        }
    }

    /// Built-in table extended with configured rules.
    ///
    /// Configured rules replace built-in ones for the same TLD.
    ///
    /// # Arguments
    ///
    /// * `overrides` - TLD to URL template mappings (e.g., from `[endpoints]`)
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut resolver = Self::default();
        for (tld, template) in overrides {
            let tld = tld.trim().trim_start_matches('.').to_lowercase();
            if !tld.is_empty() {
                resolver.templates.insert(tld, template.clone());
            }
        }
        resolver
    }

    /// Resolve the RDAP URL for a fully-qualified domain.
    ///
    /// Pure: the same domain always yields the same URL.
    pub fn resolve(&self, domain: &str) -> String {
        let tld = extract_tld(domain);
        let template = self.template_for(&tld);
        template.replace("{tld}", &tld).replace("{domain}", domain)
    }

    /// The template that would be used for a TLD.
    pub fn template_for(&self, tld: &str) -> &str {
        self.templates
            .get(&tld.to_lowercase())
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }

    /// TLDs with a dedicated rule, sorted, paired with their template.
    pub fn known_tlds(&self) -> Vec<(String, String)> {
        let mut known: Vec<(String, String)> = self
            .templates
            .iter()
            .map(|(tld, template)| (tld.clone(), template.clone()))
            .collect();
        known.sort();
        known
    }

    /// Template for TLDs without a rule.
    pub fn fallback_template(&self) -> &str {
        &self.fallback
    }
}

/// Extract the TLD from a domain name.
///
/// Takes the label after the last dot, lowercased. A dotless input is
/// treated as its own TLD. Multi-label suffixes like `co.uk` resolve on
/// their last label only.
pub fn extract_tld(domain: &str) -> String {
    domain
        .rsplit('.')
        .next()
        .unwrap_or(domain)
        .to_lowercase()
}
