//! CoreDNS layout and restart configuration

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{CorednsError, CorednsResult};

// Defaults matching a stock CoreDNS + sniproxy split-DNS install
pub const DEFAULT_CONF_DIR: &str = "/etc/coredns/conf.d";
pub const DEFAULT_HOSTS_DIR: &str = "/etc/unblocker";
pub const DEFAULT_TTL: u32 = 300;
pub const DEFAULT_RESTART_COMMAND: &[&str] = &["sudo", "systemctl", "restart", "coredns"];

pub const CONF_DIR_ENV: &str = "AUTODOMAIN_CONF_DIR";
pub const HOSTS_DIR_ENV: &str = "AUTODOMAIN_HOSTS_DIR";
pub const TTL_ENV: &str = "AUTODOMAIN_TTL";
pub const RESTART_COMMAND_ENV: &str = "AUTODOMAIN_RESTART_COMMAND";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorednsConfig {
    /// Directory holding per-service server block fragments (`<service>.conf`)
    pub conf_dir: PathBuf,
    /// Directory holding per-service hosts files (`<service>.hosts`)
    pub hosts_dir: PathBuf,
    /// TTL written into the hosts plugin block
    pub ttl: u32,
    /// Program and arguments used to restart the DNS server
    pub restart_command: Vec<String>,
}

impl Default for CorednsConfig {
    fn default() -> Self {
        Self {
            conf_dir: PathBuf::from(DEFAULT_CONF_DIR),
            hosts_dir: PathBuf::from(DEFAULT_HOSTS_DIR),
            ttl: DEFAULT_TTL,
            restart_command: DEFAULT_RESTART_COMMAND
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl CorednsConfig {
    /// Defaults overlaid with `AUTODOMAIN_*` environment variables
    pub fn from_env() -> CorednsResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`; blank values are ignored
    pub fn from_lookup<F>(lookup: F) -> CorednsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get(CONF_DIR_ENV) {
            config.conf_dir = PathBuf::from(dir.trim());
        }
        if let Some(dir) = get(HOSTS_DIR_ENV) {
            config.hosts_dir = PathBuf::from(dir.trim());
        }
        if let Some(ttl) = get(TTL_ENV) {
            config.ttl = ttl.trim().parse().map_err(|_| {
                CorednsError::Config(format!(
                    "{} must be a positive integer, got '{}'",
                    TTL_ENV, ttl
                ))
            })?;
        }
        if let Some(command) = get(RESTART_COMMAND_ENV) {
            config.restart_command = command.split_whitespace().map(str::to_string).collect();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_conf_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.conf_dir = dir.into();
        self
    }

    pub fn with_hosts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.hosts_dir = dir.into();
        self
    }

    pub fn validate(&self) -> CorednsResult<()> {
        if self.ttl == 0 {
            return Err(CorednsError::Config("ttl must be greater than zero".to_string()));
        }
        if is_blank(&self.conf_dir) || is_blank(&self.hosts_dir) {
            return Err(CorednsError::Config(
                "configuration directories cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Hosts file path for a service key
    pub fn hosts_file(&self, service: &str) -> PathBuf {
        self.hosts_dir.join(format!("{}.hosts", service))
    }

    /// Server block fragment path for a service key
    pub fn conf_file(&self, service: &str) -> PathBuf {
        self.conf_dir.join(format!("{}.conf", service))
    }

    /// Restart command as a shell-style string, for log and hint messages
    pub fn restart_command_line(&self) -> String {
        self.restart_command.join(" ")
    }
}

fn is_blank(path: &Path) -> bool {
    path.as_os_str().is_empty()
}
