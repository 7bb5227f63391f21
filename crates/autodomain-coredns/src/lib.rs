//! CoreDNS integration for AutoDomain
//!
//! Turns a discovered domain set into CoreDNS configuration that answers
//! every hostname of a service with the SNI proxy address:
//!
//! - a hosts file mapping each hostname to the proxy IP
//! - a server block for the service's primary domain that serves the hosts
//!   file and falls through to the next plugin on a miss
//!
//! The [`Provisioner`] runs the whole pipeline and restarts the DNS server
//! afterwards.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod provisioner;
pub mod restart;

pub use artifacts::{render_hosts_file, render_server_block, ArtifactWriter, ServiceArtifacts};
pub use config::CorednsConfig;
pub use error::{CorednsError, CorednsResult};
pub use provisioner::{
    ProvisionPlan, ProvisionReport, ProvisionRequest, Provisioner, RestartOutcome,
};
pub use restart::{CommandRestarter, DnsServerRestarter};
