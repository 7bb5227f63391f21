//! CoreDNS artifact rendering and writing
//!
//! Each service gets two files:
//!
//! - `<hosts_dir>/<service>.hosts`: `<proxy_ip> <hostname>` per line, sorted
//! - `<conf_dir>/<service>.conf`: a server block for the primary domain that
//!   serves the hosts file and falls through to the next plugin on a miss

use serde::Serialize;
use std::fmt::Write as _;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use autodomain_discovery::DomainSet;

use crate::config::CorednsConfig;
use crate::error::{CorednsError, CorednsResult};

/// Render the hosts file: one `<proxy_ip> <hostname>` line per hostname
pub fn render_hosts_file(proxy_ip: IpAddr, domains: &DomainSet) -> String {
    let mut out = String::new();
    for hostname in domains {
        // Writing to a String cannot fail
        let _ = writeln!(out, "{} {}", proxy_ip, hostname);
    }
    out
}

/// Render the server block fragment scoped to `primary_domain`
pub fn render_server_block(primary_domain: &str, hosts_file: &Path, ttl: u32) -> String {
    format!(
        "{primary_domain} {{
    hosts {hosts} {{
        fallthrough
        ttl {ttl}
    }}
    log
    errors
}}
",
        primary_domain = primary_domain,
        hosts = hosts_file.display(),
        ttl = ttl,
    )
}

/// Rendered contents and destinations for one service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceArtifacts {
    pub hosts_file: PathBuf,
    pub hosts_content: String,
    pub conf_file: PathBuf,
    pub conf_content: String,
}

impl ServiceArtifacts {
    pub fn render(
        config: &CorednsConfig,
        service: &str,
        primary_domain: &str,
        proxy_ip: IpAddr,
        domains: &DomainSet,
    ) -> Self {
        let hosts_file = config.hosts_file(service);
        let conf_file = config.conf_file(service);
        let conf_content = render_server_block(primary_domain, &hosts_file, config.ttl);

        Self {
            hosts_content: render_hosts_file(proxy_ip, domains),
            hosts_file,
            conf_file,
            conf_content,
        }
    }
}

/// Writes rendered artifacts into the configured directories
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    config: CorednsConfig,
}

impl ArtifactWriter {
    pub fn new(config: CorednsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CorednsConfig {
        &self.config
    }

    /// Create the conf and hosts directories if they do not exist
    pub async fn ensure_directories(&self) -> CorednsResult<()> {
        for dir in [&self.config.conf_dir, &self.config.hosts_dir] {
            fs::create_dir_all(dir)
                .await
                .map_err(|source| CorednsError::CreateDirectory {
                    path: dir.clone(),
                    source,
                })?;
            debug!("Ensured directory {}", dir.display());
        }
        Ok(())
    }

    /// Write the hosts file, then the server block that references it
    ///
    /// Both files are staged next to their destination first and renamed
    /// into place, so the DNS server never reads a partial file and a
    /// failed staging step leaves the previous pair untouched.
    pub async fn write(&self, artifacts: &ServiceArtifacts) -> CorednsResult<()> {
        self.ensure_directories().await?;

        let hosts_staged = stage_file(&artifacts.hosts_file, &artifacts.hosts_content).await?;
        let conf_staged = match stage_file(&artifacts.conf_file, &artifacts.conf_content).await {
            Ok(path) => path,
            Err(e) => {
                discard_staged(&hosts_staged).await;
                return Err(e);
            }
        };

        if let Err(e) = commit_file(&hosts_staged, &artifacts.hosts_file).await {
            discard_staged(&conf_staged).await;
            return Err(e);
        }
        info!(
            "Written {} domains to {}",
            artifacts.hosts_content.lines().count(),
            artifacts.hosts_file.display()
        );

        commit_file(&conf_staged, &artifacts.conf_file).await?;
        info!("Created CoreDNS config file: {}", artifacts.conf_file.display());

        Ok(())
    }
}

/// Hidden sibling of `path` used while its content is being written
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

async fn stage_file(path: &Path, content: &str) -> CorednsResult<PathBuf> {
    let staged = staging_path(path);
    fs::write(&staged, content)
        .await
        .map_err(|source| CorednsError::WriteFile {
            path: staged.clone(),
            source,
        })?;
    Ok(staged)
}

async fn commit_file(staged: &Path, path: &Path) -> CorednsResult<()> {
    if let Err(source) = fs::rename(staged, path).await {
        discard_staged(staged).await;
        return Err(CorednsError::WriteFile {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

async fn discard_staged(staged: &Path) {
    if let Err(e) = fs::remove_file(staged).await {
        warn!("Failed to remove staged file {}: {}", staged.display(), e);
    }
}
