//! Curated domain list source
//!
//! Serves hostnames gathered from community-maintained domain lists. The
//! built-in table can be extended with a JSON file of the form
//! `{"service": ["host", ...]}`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::catalog;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::source::DiscoverySource;
use crate::types::{DiscoveryTarget, DomainSet, Service};

/// Curated list source keyed by service
#[derive(Debug, Clone)]
pub struct CuratedListSource {
    lists: HashMap<String, DomainSet>,
}

impl CuratedListSource {
    /// Source backed by the built-in lists
    pub fn new() -> Self {
        Self::with_lists(
            catalog::CURATED_LISTS
                .iter()
                .map(|(service, domains)| (*service, domains.iter().copied())),
        )
    }

    /// Source backed only by the given lists
    pub fn with_lists<K, I, S>(lists: impl IntoIterator<Item = (K, I)>) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut source = Self {
            lists: HashMap::new(),
        };
        for (service, domains) in lists {
            source.extend(service.as_ref(), domains.into_iter().collect());
        }
        source
    }

    /// Merge lists from a JSON file into this source
    pub fn load_json_file(mut self, path: &Path) -> DiscoveryResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| DiscoveryError::CuratedListIo {
            path: path.to_path_buf(),
            source,
        })?;

        let lists: HashMap<String, Vec<String>> =
            serde_json::from_str(&raw).map_err(|source| DiscoveryError::CuratedListFormat {
                path: path.to_path_buf(),
                source,
            })?;

        for (service, domains) in lists {
            debug!(
                "Loaded {} curated entries for {} from {}",
                domains.len(),
                service,
                path.display()
            );
            self.extend(&service, domains.into_iter().collect());
        }

        Ok(self)
    }

    fn extend(&mut self, service: &str, domains: DomainSet) {
        let key = service.trim().to_lowercase();
        self.lists.entry(key).or_default().merge(domains);
    }

    /// Known-good hostnames for a service; unknown services yield an empty set
    pub fn lookup_curated(&self, service: &Service) -> DomainSet {
        self.lists.get(service.as_str()).cloned().unwrap_or_default()
    }
}

impl Default for CuratedListSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiscoverySource for CuratedListSource {
    async fn fetch(&self, target: &DiscoveryTarget) -> DomainSet {
        info!("Searching curated domain lists for {}...", target.service);
        let domains = self.lookup_curated(&target.service);
        info!("Curated lists returned {} hostnames", domains.len());
        domains
    }

    fn source_name(&self) -> &'static str {
        "curated-list"
    }
}
