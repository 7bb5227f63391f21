//! Discovery source trait
//!
//! Defines the interface every hostname source implements (certificate
//! logs, curated lists, fallbacks, ...) and the sleep hook used by sources
//! that retry.

use async_trait::async_trait;
use std::time::Duration;

use crate::types::{DiscoveryTarget, DomainSet};

/// A strategy for finding hostnames that belong to a service
///
/// Implementations absorb their own failures: a source that cannot reach
/// its backend logs the problem and returns an empty set.
#[async_trait]
pub trait DiscoverySource: Send + Sync {
    /// Discover hostnames for the target service
    async fn fetch(&self, target: &DiscoveryTarget) -> DomainSet;

    /// Get the name of this source (for logging/debugging)
    fn source_name(&self) -> &'static str;
}

/// Suspension hook between retry attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
