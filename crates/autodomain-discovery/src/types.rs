//! Core discovery types: services, hostnames and domain sets

use serde::Serialize;
use std::collections::btree_set;
use std::collections::BTreeSet;
use std::fmt;

use crate::catalog;
use crate::error::{DiscoveryError, DiscoveryResult};

/// A target online service, identified by a case-insensitive key
///
/// The key is stored trimmed and lower-cased. It names the generated
/// artifact files, so it is restricted to `[a-z0-9._-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Service(String);

impl Service {
    pub fn parse(raw: &str) -> DiscoveryResult<Self> {
        let key = raw.trim().to_lowercase();

        if key.is_empty() {
            return Err(DiscoveryError::InvalidService(
                "service identifier cannot be empty".to_string(),
            ));
        }

        if key.starts_with('.')
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(DiscoveryError::InvalidService(format!(
                "'{}' may only contain letters, digits, '-', '_' and '.'",
                raw.trim()
            )));
        }

        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Root domain the DNS server zone is scoped to
    ///
    /// `<service>.com` unless the catalog knows better (e.g. `gemini`
    /// lives under `gemini.google.com`).
    pub fn primary_domain(&self) -> String {
        catalog::primary_domain_override(&self.0)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}.com", self.0))
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A normalized hostname: trimmed, lower-case, non-empty, wildcard-free
///
/// A hostname is a single token: it never contains whitespace or `@`, so
/// it always renders as exactly one field of a hosts file line.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Hostname(String);

impl Hostname {
    /// Normalize a raw name, returning `None` for names that must never
    /// reach a domain set: empty, wildcards, embedded whitespace and
    /// email addresses (certificate logs list `hostmaster@...` entries).
    pub fn parse(raw: &str) -> Option<Self> {
        let name = raw.trim();
        if name.is_empty()
            || name
                .chars()
                .any(|c| c == '*' || c == '@' || c.is_whitespace())
        {
            return None;
        }
        Some(Self(name.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Hostname {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A deduplicated set of hostnames, iterated in lexicographic order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DomainSet(BTreeSet<Hostname>);

impl DomainSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw name after normalization. Returns `true` only when a
    /// new hostname was added.
    pub fn insert_raw(&mut self, raw: &str) -> bool {
        match Hostname::parse(raw) {
            Some(hostname) => self.0.insert(hostname),
            None => false,
        }
    }

    /// Set union, consuming `other`
    pub fn merge(&mut self, other: DomainSet) {
        self.0.extend(other.0);
    }

    pub fn contains(&self, name: &str) -> bool {
        Hostname::parse(name).is_some_and(|h| self.0.contains(&h))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, Hostname> {
        self.0.iter()
    }

    /// Hostnames in sorted order, as plain strings
    pub fn to_sorted_vec(&self) -> Vec<String> {
        self.0.iter().map(|h| h.0.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a DomainSet {
    type Item = &'a Hostname;
    type IntoIter = btree_set::Iter<'a, Hostname>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<S: AsRef<str>> FromIterator<S> for DomainSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = DomainSet::new();
        for name in iter {
            set.insert_raw(name.as_ref());
        }
        set
    }
}

/// What each discovery source is asked about: the service and its
/// derived primary domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryTarget {
    pub service: Service,
    pub primary_domain: String,
}

impl DiscoveryTarget {
    pub fn for_service(service: &Service) -> Self {
        Self {
            service: service.clone(),
            primary_domain: service.primary_domain(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_parse_normalizes_case_and_whitespace() {
        let service = Service::parse("  Spotify ").unwrap();
        assert_eq!(service.as_str(), "spotify");
    }

    #[test]
    fn test_service_parse_rejects_empty() {
        assert!(matches!(
            Service::parse("   "),
            Err(DiscoveryError::InvalidService(_))
        ));
    }

    #[test]
    fn test_service_parse_rejects_path_characters() {
        assert!(Service::parse("../etc/passwd").is_err());
        assert!(Service::parse("spot ify").is_err());
        assert!(Service::parse(".hidden").is_err());
    }

    #[test]
    fn test_primary_domain_naive_pattern() {
        let service = Service::parse("spotify").unwrap();
        assert_eq!(service.primary_domain(), "spotify.com");
    }

    #[test]
    fn test_primary_domain_override() {
        let service = Service::parse("Gemini").unwrap();
        assert_eq!(service.primary_domain(), "gemini.google.com");

        let service = Service::parse("youtube").unwrap();
        assert_eq!(service.primary_domain(), "youtube.com");
    }

    #[test]
    fn test_hostname_parse_filters_wildcards_and_blanks() {
        assert!(Hostname::parse("*.spotify.com").is_none());
        assert!(Hostname::parse("").is_none());
        assert!(Hostname::parse(" \t ").is_none());
        assert_eq!(
            Hostname::parse(" API.Spotify.com\n").unwrap().as_str(),
            "api.spotify.com"
        );
    }

    #[test]
    fn test_hostname_parse_rejects_embedded_whitespace_and_emails() {
        assert!(Hostname::parse("evil.spotify.com other.example.net").is_none());
        assert!(Hostname::parse("x.spotify.com\ty.example.org").is_none());
        assert!(Hostname::parse("a.spotify.com\r\nb.example.org").is_none());
        assert!(Hostname::parse("hostmaster@spotify.com").is_none());
        assert!(Hostname::parse(" ok.spotify.com\t").is_some());
    }

    #[test]
    fn test_domain_set_is_sorted_and_deduplicated() {
        let set: DomainSet = ["scdn.co", "api.spotify.com", "SCDN.co", "*.scdn.co", ""]
            .into_iter()
            .collect();

        assert_eq!(set.len(), 2);
        assert_eq!(set.to_sorted_vec(), vec!["api.spotify.com", "scdn.co"]);
    }

    #[test]
    fn test_domain_set_merge_is_commutative_and_idempotent() {
        let a: DomainSet = ["a.example.com", "b.example.com"].into_iter().collect();
        let b: DomainSet = ["b.example.com", "c.example.com"].into_iter().collect();

        let mut ab = a.clone();
        ab.merge(b.clone());
        let mut ba = b.clone();
        ba.merge(a.clone());
        assert_eq!(ab, ba);

        let mut twice = ab.clone();
        twice.merge(b);
        assert_eq!(twice, ab);
    }

    #[test]
    fn test_domain_set_serializes_as_sorted_array() {
        let set: DomainSet = ["z.example.com", "a.example.com"].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["a.example.com","z.example.com"]"#);
    }
}
