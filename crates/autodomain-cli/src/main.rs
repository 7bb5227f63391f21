//! AutoDomain CLI
//!
//! Discovers the hostnames of an online service and points them at an SNI
//! proxy through CoreDNS:
//!
//! ```text
//! autodomain <SERVICE> <PROXY_IP>
//! ```

mod commands;

use clap::error::ErrorKind;
use clap::Parser;
use commands::ProvisionCommand;
use tracing_subscriber::{layer::SubscriberExt, Layer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "AUTODOMAIN_LOG_LEVEL")]
    log_level: String,

    /// Log format: compact, full
    #[arg(long, default_value = "compact", env = "AUTODOMAIN_LOG_FORMAT")]
    log_format: String,

    #[command(flatten)]
    command: ProvisionCommand,
}

fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            // Wrong or missing arguments: usage goes to stdout
            print!("{}", e.render());
            std::process::exit(1);
        }
    };

    // If RUST_LOG is set, use it directly; otherwise use our default filter
    let filter = match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::EnvFilter::try_from_default_env()?,
        Err(_) => tracing_subscriber::EnvFilter::try_new(format!(
            "autodomain={level},\
             autodomain_cli={level},\
             autodomain_discovery={level},\
             autodomain_coredns={level},\
             h2=warn,\
             hyper=warn,\
             reqwest=warn,\
             rustls=warn",
            level = cli.log_level
        ))?,
    };

    let fmt_layer = match cli.log_format.as_str() {
        "full" => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
        _ => tracing_subscriber::fmt::layer() // "compact" or any other value
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    cli.command.execute()
}
