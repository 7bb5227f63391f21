//! Provision command
//!
//! Discovers every hostname of a service and writes the CoreDNS artifacts
//! that route them to an SNI proxy:
//! - hosts file mapping each hostname to the proxy IP
//! - server block for the service's primary domain
//! - CoreDNS restart (unless disabled)

use anyhow::Context;
use autodomain_coredns::{
    ArtifactWriter, CommandRestarter, CorednsConfig, DnsServerRestarter, ProvisionPlan,
    ProvisionReport, ProvisionRequest, Provisioner, RestartOutcome,
};
use autodomain_discovery::{
    CertificateLogConfig, CertificateLogSource, CuratedListSource, DiscoveryAggregator,
    FallbackSource, Service, DEFAULT_CERTIFICATE_LOG_URL,
};
use clap::Args;
use colored::Colorize;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Output format for the provision command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors and formatting
    #[default]
    Text,
    /// JSON output for automation and scripting
    Json,
}

/// Route a service's hostnames to an SNI proxy through CoreDNS
#[derive(Args, Debug)]
pub struct ProvisionCommand {
    /// Service name (e.g. spotify, gemini, youtube)
    pub service: String,

    /// IP address of the SNI proxy
    pub proxy_ip: String,

    /// Directory for CoreDNS server blocks (overrides AUTODOMAIN_CONF_DIR)
    #[arg(long)]
    pub conf_dir: Option<PathBuf>,

    /// Directory for hosts files (overrides AUTODOMAIN_HOSTS_DIR)
    #[arg(long)]
    pub hosts_dir: Option<PathBuf>,

    /// Base URL of the certificate transparency log
    #[arg(long, env = "AUTODOMAIN_CRTSH_URL", default_value = DEFAULT_CERTIFICATE_LOG_URL)]
    pub crtsh_url: String,

    /// Attempts against the certificate log before giving up
    #[arg(
        long,
        env = "AUTODOMAIN_MAX_ATTEMPTS",
        default_value_t = 3,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_attempts: u32,

    /// Seconds to wait between certificate log attempts
    #[arg(long, env = "AUTODOMAIN_RETRY_DELAY", default_value_t = 5)]
    pub retry_delay: u64,

    /// Per-request timeout for the certificate log, in seconds
    #[arg(
        long,
        env = "AUTODOMAIN_REQUEST_TIMEOUT",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub request_timeout: u64,

    /// JSON file with extra curated hostnames: {"service": ["host", ...]}
    #[arg(long, env = "AUTODOMAIN_CURATED_FILE")]
    pub curated_file: Option<PathBuf>,

    /// Write the configuration but leave CoreDNS running as is
    #[arg(long)]
    pub no_restart: bool,

    /// Print the generated configuration without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,
}

impl ProvisionCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let request = self.validate()?;
        info!(
            "Running in automatic mode with service '{}' and sniproxy IP '{}'",
            request.service, request.proxy_ip
        );

        let coredns_config = self.coredns_config()?;
        debug!("CoreDNS configuration: {:?}", coredns_config);

        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.run(request, coredns_config))
    }

    /// Trim and check the positional arguments before any network access
    pub fn validate(&self) -> anyhow::Result<ProvisionRequest> {
        let service = self.service.trim();
        let proxy_ip = self.proxy_ip.trim();

        if service.is_empty() || proxy_ip.is_empty() {
            anyhow::bail!("Service name or sniproxy IP cannot be empty. Exiting.");
        }

        let service = Service::parse(service)?;
        let proxy_ip: IpAddr = proxy_ip
            .parse()
            .with_context(|| format!("'{}' is not a valid IP address", proxy_ip))?;

        Ok(ProvisionRequest { service, proxy_ip })
    }

    /// Environment-derived configuration with command line overrides applied
    pub fn coredns_config(&self) -> anyhow::Result<CorednsConfig> {
        let mut config = CorednsConfig::from_env()?;
        if let Some(dir) = &self.conf_dir {
            config = config.with_conf_dir(dir);
        }
        if let Some(dir) = &self.hosts_dir {
            config = config.with_hosts_dir(dir);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn certificate_log_config(&self) -> CertificateLogConfig {
        CertificateLogConfig {
            base_url: self.crtsh_url.clone(),
            max_attempts: self.max_attempts,
            retry_delay: Duration::from_secs(self.retry_delay),
            timeout: Duration::from_secs(self.request_timeout),
        }
    }

    fn build_provisioner(&self, coredns_config: CorednsConfig) -> anyhow::Result<Provisioner> {
        let certificate_log = CertificateLogSource::new(self.certificate_log_config())?;

        let mut curated = CuratedListSource::new();
        if let Some(path) = &self.curated_file {
            curated = curated.load_json_file(path)?;
        }

        let aggregator = DiscoveryAggregator::new(vec![
            Arc::new(certificate_log),
            Arc::new(curated),
            Arc::new(FallbackSource::new()),
        ]);

        let restarter: Option<Arc<dyn DnsServerRestarter>> = if self.no_restart {
            None
        } else {
            Some(Arc::new(CommandRestarter::new(
                coredns_config.restart_command.clone(),
            )))
        };

        Ok(Provisioner::new(
            aggregator,
            ArtifactWriter::new(coredns_config),
            restarter,
        ))
    }

    async fn run(
        &self,
        request: ProvisionRequest,
        coredns_config: CorednsConfig,
    ) -> anyhow::Result<()> {
        let provisioner = self.build_provisioner(coredns_config)?;

        if self.dry_run {
            let plan = provisioner.plan(&request).await?;
            return self.print_plan(&plan);
        }

        let report = provisioner.provision(&request).await?;
        self.print_report(&report)
    }

    fn print_plan(&self, plan: &ProvisionPlan) -> anyhow::Result<()> {
        if self.output_format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(plan)?);
            return Ok(());
        }

        print_section(&format!("Dry run for {}", plan.service));
        print_info("Primary domain", &plan.primary_domain);
        print_info("Domains", &plan.domains.len().to_string());
        println!();
        print_file(&plan.artifacts.hosts_file, &plan.artifacts.hosts_content);
        print_file(&plan.artifacts.conf_file, &plan.artifacts.conf_content);
        print_warning("Dry run: nothing was written and CoreDNS was not restarted.");
        Ok(())
    }

    fn print_report(&self, report: &ProvisionReport) -> anyhow::Result<()> {
        if self.output_format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(report)?);
            return Ok(());
        }

        print_section(&format!("{} routed through {}", report.service, report.proxy_ip));
        print_info("Primary domain", &report.primary_domain);
        print_info("Domains", &report.domain_count.to_string());
        print_info("Hosts file", &report.hosts_file.display().to_string());
        print_info("Server block", &report.conf_file.display().to_string());
        println!();

        match &report.restart {
            RestartOutcome::Restarted => print_success("CoreDNS restarted."),
            RestartOutcome::Skipped => print_warning("CoreDNS was not restarted."),
            RestartOutcome::Failed {
                error,
                manual_command,
            } => {
                print_warning(&format!("Failed to restart CoreDNS. Error: {}", error));
                print_warning(&format!(
                    "Please try restarting it manually with '{}'.",
                    manual_command
                ));
            }
        }

        print_success("Setup is complete. You may need to flush your local DNS cache.");
        Ok(())
    }
}

fn print_section(title: &str) {
    println!();
    println!("{}", format!("── {} ──", title).bright_yellow().bold());
    println!();
}

fn print_success(message: &str) {
    println!("{} {}", "✓".bright_green(), message.bright_white());
}

fn print_warning(message: &str) {
    println!("{} {}", "!".bright_yellow(), message.bright_yellow());
}

fn print_info(label: &str, value: &str) {
    println!(
        "   {} {}",
        format!("{}:", label).bright_white().bold(),
        value.bright_cyan()
    );
}

fn print_file(path: &std::path::Path, content: &str) {
    println!("{}", path.display().to_string().bright_cyan().bold());
    for line in content.lines() {
        println!("   {}", line);
    }
    println!();
}
