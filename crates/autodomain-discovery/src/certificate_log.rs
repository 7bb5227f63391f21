//! Certificate transparency log source
//!
//! Queries a crt.sh-compatible search endpoint for every certificate issued
//! under a domain and collects the names those certificates cover. Good at
//! finding official subdomains that serve TLS.
//!
//! Transport failures and non-success statuses are retried with a constant
//! delay. A body that is not a JSON array of records is not retried.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::{DiscoveryError, DiscoveryResult};
use crate::source::{DiscoverySource, Sleeper, TokioSleeper};
use crate::types::{DiscoveryTarget, DomainSet};

pub const DEFAULT_CERTIFICATE_LOG_URL: &str = "https://crt.sh";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Characters of a non-success response body kept in the error
const ERROR_BODY_LIMIT: usize = 200;

/// Settings for the certificate log source
#[derive(Debug, Clone)]
pub struct CertificateLogConfig {
    /// Base URL of the search service; queries go to `<base_url>/json?q=<domain>`
    pub base_url: String,
    /// Total number of requests per lookup (at least 1)
    pub max_attempts: u32,
    /// Constant pause between attempts
    pub retry_delay: Duration,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for CertificateLogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CERTIFICATE_LOG_URL.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// One record of the search response. crt.sh sends `null` for missing names.
#[derive(Debug, Deserialize)]
struct CertificateRecord {
    #[serde(default)]
    common_name: Option<String>,
    /// Newline-delimited subject alternative names
    #[serde(default)]
    name_value: Option<String>,
}

/// Certificate transparency log source
pub struct CertificateLogSource {
    client: Client,
    config: CertificateLogConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl CertificateLogSource {
    /// Create a new certificate log source
    pub fn new(config: CertificateLogConfig) -> DiscoveryResult<Self> {
        if url::Url::parse(&config.base_url).is_err() {
            return Err(DiscoveryError::InvalidUrl(config.base_url));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                error!("Failed to create HTTP client: {}", e);
                DiscoveryError::HttpClient(e.to_string())
            })?;

        Ok(Self {
            client,
            config,
            sleeper: Arc::new(TokioSleeper),
        })
    }

    /// Replace the sleep hook used between attempts (useful for testing)
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Fetch every non-wildcard hostname the log has seen for `domain`
    ///
    /// Never fails: exhausted retries and unparseable responses both
    /// yield an empty set.
    pub async fn fetch_certificate_hostnames(&self, domain: &str) -> DomainSet {
        let domain = domain.trim();
        if domain.is_empty() {
            warn!("Skipping certificate log lookup for an empty domain");
            return DomainSet::new();
        }

        let max_attempts = self.config.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            info!(
                "Fetching certificate log entries for {} (attempt {}/{})",
                domain, attempt, max_attempts
            );

            let body = match self.request(domain).await {
                Ok(body) => body,
                Err(e) if !e.is_retryable() => {
                    error!("Certificate log lookup for {} failed: {}", domain, e);
                    return DomainSet::new();
                }
                Err(e) => {
                    warn!(
                        "Attempt {}/{} to reach certificate log failed: {}",
                        attempt, max_attempts, e
                    );
                    if attempt < max_attempts {
                        info!("Retrying in {:?}...", self.config.retry_delay);
                        self.sleeper.sleep(self.config.retry_delay).await;
                    }
                    continue;
                }
            };

            return match parse_certificate_records(&body) {
                Ok(hostnames) => {
                    info!(
                        "Certificate log returned {} hostnames for {}",
                        hostnames.len(),
                        domain
                    );
                    hostnames
                }
                Err(e) => {
                    error!("Error parsing certificate log data for {}: {}", domain, e);
                    DomainSet::new()
                }
            };
        }

        error!(
            "Failed to fetch certificate log data for {} after {} attempts",
            domain, max_attempts
        );
        DomainSet::new()
    }

    /// Single request; returns the raw body of a successful response
    async fn request(&self, domain: &str) -> DiscoveryResult<String> {
        let url = format!("{}/json", self.config.base_url.trim_end_matches('/'));
        debug!("Certificate log request: GET {}?q={}", url, domain);

        let response = self.client.get(&url).query(&[("q", domain)]).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::UnexpectedStatus {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(response.text().await?)
    }
}

/// Error pages can be large HTML documents; keep only the start
fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((end, _)) => format!("{}...", &body[..end]),
        None => body.to_string(),
    }
}

/// Extract hostnames from a certificate log response body
///
/// Records that do not look like certificate entries are skipped, so a
/// mostly-valid response still contributes what it can. Only a body that
/// is not a JSON array is an error.
pub fn parse_certificate_records(body: &str) -> DiscoveryResult<DomainSet> {
    let records: Vec<serde_json::Value> = serde_json::from_str(body)?;
    let mut hostnames = DomainSet::new();

    for record in records {
        let record: CertificateRecord = match serde_json::from_value(record) {
            Ok(record) => record,
            Err(e) => {
                debug!("Skipping malformed certificate record: {}", e);
                continue;
            }
        };

        let names = record
            .common_name
            .iter()
            .chain(record.name_value.iter())
            .flat_map(|field| field.split('\n'));

        for name in names {
            hostnames.insert_raw(name);
        }
    }

    Ok(hostnames)
}

#[async_trait]
impl DiscoverySource for CertificateLogSource {
    async fn fetch(&self, target: &DiscoveryTarget) -> DomainSet {
        self.fetch_certificate_hostnames(&target.primary_domain).await
    }

    fn source_name(&self) -> &'static str {
        "certificate-log"
    }
}
