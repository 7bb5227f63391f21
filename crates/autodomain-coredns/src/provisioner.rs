//! Provisioning pipeline
//!
//! discover -> refuse an empty result -> render -> write -> restart
//!
//! Discovery problems inside the sources are already absorbed. The only
//! discovery outcome that stops the pipeline is an empty union. Write
//! failures stop it too; a failed restart only produces a warning because
//! the configuration is already on disk at that point.

use serde::Serialize;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use autodomain_discovery::{DiscoveryAggregator, DomainSet, Service};

use crate::artifacts::{ArtifactWriter, ServiceArtifacts};
use crate::error::{CorednsError, CorednsResult};
use crate::restart::DnsServerRestarter;

/// A validated provisioning request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub service: Service,
    pub proxy_ip: IpAddr,
}

/// What happened when the DNS server restart was triggered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RestartOutcome {
    Restarted,
    Skipped,
    Failed {
        error: String,
        manual_command: String,
    },
}

/// Discovery result rendered into artifacts, not yet written
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionPlan {
    pub service: Service,
    pub primary_domain: String,
    pub proxy_ip: IpAddr,
    pub domains: DomainSet,
    pub artifacts: ServiceArtifacts,
}

/// Outcome of a completed provisioning run
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    pub service: Service,
    pub primary_domain: String,
    pub proxy_ip: IpAddr,
    pub domain_count: usize,
    pub domains: DomainSet,
    pub hosts_file: PathBuf,
    pub conf_file: PathBuf,
    pub restart: RestartOutcome,
}

/// Chains discovery, artifact writing and the DNS server restart
pub struct Provisioner {
    aggregator: DiscoveryAggregator,
    writer: ArtifactWriter,
    restarter: Option<Arc<dyn DnsServerRestarter>>,
}

impl Provisioner {
    /// Create a provisioner. Without a restarter the DNS server is left
    /// running with its old configuration.
    pub fn new(
        aggregator: DiscoveryAggregator,
        writer: ArtifactWriter,
        restarter: Option<Arc<dyn DnsServerRestarter>>,
    ) -> Self {
        Self {
            aggregator,
            writer,
            restarter,
        }
    }

    /// Discover and render without touching the filesystem
    pub async fn plan(&self, request: &ProvisionRequest) -> CorednsResult<ProvisionPlan> {
        let primary_domain = request.service.primary_domain();
        let domains = self.aggregator.discover(&request.service).await;

        if domains.is_empty() {
            error!("No domains were found for {}. Aborting.", request.service);
            return Err(CorednsError::NoDomainsDiscovered(request.service.to_string()));
        }

        let artifacts = ServiceArtifacts::render(
            self.writer.config(),
            request.service.as_str(),
            &primary_domain,
            request.proxy_ip,
            &domains,
        );

        Ok(ProvisionPlan {
            service: request.service.clone(),
            primary_domain,
            proxy_ip: request.proxy_ip,
            domains,
            artifacts,
        })
    }

    /// Full run: plan, write both artifacts, then restart the DNS server
    pub async fn provision(&self, request: &ProvisionRequest) -> CorednsResult<ProvisionReport> {
        info!("Provisioning {} through proxy {}", request.service, request.proxy_ip);

        let plan = self.plan(request).await?;
        self.writer.write(&plan.artifacts).await?;
        let restart = self.restart_dns_server().await;

        Ok(ProvisionReport {
            service: plan.service,
            primary_domain: plan.primary_domain,
            proxy_ip: plan.proxy_ip,
            domain_count: plan.domains.len(),
            domains: plan.domains,
            hosts_file: plan.artifacts.hosts_file,
            conf_file: plan.artifacts.conf_file,
            restart,
        })
    }

    async fn restart_dns_server(&self) -> RestartOutcome {
        let Some(restarter) = &self.restarter else {
            info!("Skipping CoreDNS restart");
            return RestartOutcome::Skipped;
        };

        match restarter.restart().await {
            Ok(()) => RestartOutcome::Restarted,
            Err(e) => {
                let manual_command = restarter.manual_command();
                warn!("Failed to restart CoreDNS. Error: {}", e);
                warn!("Please try restarting it manually with '{}'.", manual_command);
                RestartOutcome::Failed {
                    error: e.to_string(),
                    manual_command,
                }
            }
        }
    }
}
