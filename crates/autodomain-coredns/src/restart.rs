//! DNS server restart trigger
//!
//! The DNS server only picks up new server blocks on restart. The default
//! implementation shells out to the service manager.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{CorednsError, CorednsResult};

/// Restarts the DNS server so it loads freshly written configuration
#[async_trait]
pub trait DnsServerRestarter: Send + Sync {
    async fn restart(&self) -> CorednsResult<()>;

    /// Command an operator can run by hand if `restart` fails
    fn manual_command(&self) -> String;
}

/// Runs an external command (by default `sudo systemctl restart coredns`)
#[derive(Debug, Clone)]
pub struct CommandRestarter {
    command: Vec<String>,
}

impl CommandRestarter {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl DnsServerRestarter for CommandRestarter {
    async fn restart(&self) -> CorednsResult<()> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or(CorednsError::EmptyRestartCommand)?;
        let command_line = self.manual_command();

        info!("Restarting CoreDNS...");
        debug!("Running restart command: {}", command_line);

        let status = Command::new(program)
            .args(args)
            .status()
            .await
            .map_err(|source| CorednsError::RestartSpawn {
                command: command_line.clone(),
                source,
            })?;

        if !status.success() {
            return Err(CorednsError::RestartFailed {
                command: command_line,
                status: status.to_string(),
            });
        }

        info!("CoreDNS restarted successfully.");
        Ok(())
    }

    fn manual_command(&self) -> String {
        self.command.join(" ")
    }
}
