//! Discovery error types

use std::path::PathBuf;
use thiserror::Error;

pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Errors raised while discovering hostnames.
///
/// Sources never hand these to the aggregator; they are logged and turned
/// into an empty (or partial) domain set at the source boundary.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Invalid service identifier: {0}")]
    InvalidService(String),

    #[error("Invalid certificate log URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(String),

    #[error("Certificate log request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Certificate log returned status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Failed to parse certificate log response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read curated list {path}: {source}")]
    CuratedListIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid curated list {path}: {source}")]
    CuratedListFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl DiscoveryError {
    /// Transport failures and bad statuses may succeed on a later attempt;
    /// a body that failed to parse will parse the same way next time.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DiscoveryError::Request(_) | DiscoveryError::UnexpectedStatus { .. }
        )
    }
}
