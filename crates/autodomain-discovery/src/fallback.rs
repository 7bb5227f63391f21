//! Fallback domain source
//!
//! The minimum set of hostnames a service needs to work through the proxy.
//! Keeps discovery from coming back empty for a known service when the
//! certificate log is down and the curated lists have nothing.

use async_trait::async_trait;
use std::collections::HashMap;
use tracing::info;

use crate::catalog;
use crate::source::DiscoverySource;
use crate::types::{DiscoveryTarget, DomainSet, Service};

/// Predefined essential hostnames keyed by service
#[derive(Debug, Clone)]
pub struct FallbackSource {
    domains: HashMap<&'static str, DomainSet>,
}

impl FallbackSource {
    pub fn new() -> Self {
        let domains = catalog::FALLBACK_DOMAINS
            .iter()
            .map(|(service, domains)| (*service, domains.iter().collect()))
            .collect();
        Self { domains }
    }

    /// Essential hostnames for a service; unknown services yield an empty set
    pub fn lookup_fallback(&self, service: &Service) -> DomainSet {
        self.domains
            .get(service.as_str())
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for FallbackSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiscoverySource for FallbackSource {
    async fn fetch(&self, target: &DiscoveryTarget) -> DomainSet {
        let domains = self.lookup_fallback(&target.service);
        info!(
            "Added {} predefined hostnames for {}",
            domains.len(),
            target.service
        );
        domains
    }

    fn source_name(&self) -> &'static str {
        "fallback"
    }
}
