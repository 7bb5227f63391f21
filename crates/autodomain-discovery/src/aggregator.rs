//! Discovery aggregator
//!
//! Runs every configured source for a service and unions the results.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info};

use crate::certificate_log::{CertificateLogConfig, CertificateLogSource};
use crate::curated::CuratedListSource;
use crate::error::DiscoveryResult;
use crate::fallback::FallbackSource;
use crate::source::DiscoverySource;
use crate::types::{DiscoveryTarget, DomainSet, Service};

/// Aggregates independent discovery sources into one domain set
pub struct DiscoveryAggregator {
    sources: Vec<Arc<dyn DiscoverySource>>,
}

impl DiscoveryAggregator {
    /// Create an aggregator over the given sources
    pub fn new(sources: Vec<Arc<dyn DiscoverySource>>) -> Self {
        Self { sources }
    }

    /// Certificate log, built-in curated lists and fallbacks
    pub fn with_default_sources(config: CertificateLogConfig) -> DiscoveryResult<Self> {
        Ok(Self::new(vec![
            Arc::new(CertificateLogSource::new(config)?),
            Arc::new(CuratedListSource::new()),
            Arc::new(FallbackSource::new()),
        ]))
    }

    pub fn add_source(mut self, source: Arc<dyn DiscoverySource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.source_name()).collect()
    }

    /// Discover every hostname the configured sources know for `service`
    ///
    /// Sources run concurrently and never see each other's output. An
    /// empty result is returned as-is; deciding that nothing was found is
    /// up to the caller.
    pub async fn discover(&self, service: &Service) -> DomainSet {
        let target = DiscoveryTarget::for_service(service);
        info!(
            "Starting domain discovery for {} (primary domain {})",
            target.service, target.primary_domain
        );

        let results = join_all(self.sources.iter().map(|source| {
            let target = &target;
            async move { (source.source_name(), source.fetch(target).await) }
        }))
        .await;

        let mut domains = DomainSet::new();
        for (name, found) in results {
            debug!("Source {} contributed {} hostnames", name, found.len());
            domains.merge(found);
        }

        info!("Found a total of {} unique domains", domains.len());
        domains
    }
}
