//! Hostname discovery for AutoDomain
//!
//! This crate finds the hostnames an online service uses so they can be
//! routed through an SNI proxy.
//!
//! # Sources
//!
//! - **Certificate log**: crt.sh certificate transparency search, with
//!   bounded retries
//! - **Curated lists**: known-good hostnames per service, optionally
//!   extended from a JSON file
//! - **Fallback**: the minimum hostnames a known service needs
//!
//! Sources implement [`DiscoverySource`] and never fail outward; the
//! [`DiscoveryAggregator`] runs them together and unions the results.
//!
//! # Usage
//!
//! ```ignore
//! use autodomain_discovery::{CertificateLogConfig, DiscoveryAggregator, Service};
//!
//! let aggregator = DiscoveryAggregator::with_default_sources(CertificateLogConfig::default())?;
//! let service = Service::parse("spotify")?;
//! let domains = aggregator.discover(&service).await;
//!
//! for hostname in &domains {
//!     println!("{}", hostname);
//! }
//! ```

mod catalog;

pub mod aggregator;
pub mod certificate_log;
pub mod curated;
pub mod error;
pub mod fallback;
pub mod source;
pub mod types;

pub use aggregator::DiscoveryAggregator;
pub use certificate_log::{
    parse_certificate_records, CertificateLogConfig, CertificateLogSource,
    DEFAULT_CERTIFICATE_LOG_URL,
};
pub use curated::CuratedListSource;
pub use error::{DiscoveryError, DiscoveryResult};
pub use fallback::FallbackSource;
pub use source::{DiscoverySource, Sleeper, TokioSleeper};
pub use types::{DiscoveryTarget, DomainSet, Hostname, Service};
