//! CoreDNS integration error types

use std::path::PathBuf;
use thiserror::Error;

pub type CorednsResult<T> = Result<T, CorednsError>;

#[derive(Error, Debug)]
pub enum CorednsError {
    #[error("No domains were found for service '{0}'")]
    NoDomainsDiscovered(String),

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Restart command is empty")]
    EmptyRestartCommand,

    #[error("Failed to run '{command}': {source}")]
    RestartSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with {status}")]
    RestartFailed { command: String, status: String },

    #[error("Configuration error: {0}")]
    Config(String),
}
