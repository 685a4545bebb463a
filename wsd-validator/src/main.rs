//! WS-Discovery validator for ONVIF devices.
//!
//! Sends one Probe for NetworkVideoTransmitter devices, collects correlated
//! ProbeMatch replies (and optionally Hello announcements) until the timeout,
//! and prints a JSON report on stdout. Exits 0 when at least one device answered.
//!
//! ```bash
//! wsd-validator --timeout 10 --verbose
//! wsd-validator --listen-hello --interface 192.168.1.10
//! ```

mod codec;
mod config;
mod diagnostics;
mod report;
mod session;
mod table;
mod transport;

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use anyhow::{Context, Result};
use crate::config::{Config, DiscoveryConfig};
use crate::diagnostics::TracingSink;
use crate::session::DiscoverySession;

/// WS-Discovery validation for ONVIF devices
#[derive(Parser, Debug)]
#[command(name = "wsd-validator")]
#[command(version)]
struct Args {
    /// Discovery timeout in seconds [default: 5.0]
    #[arg(short, long)]
    timeout: Option<f64>,

    /// Also accept Hello announcements (passive discovery)
    #[arg(long)]
    listen_hello: bool,

    /// IPv4 address of the network interface to use
    #[arg(short, long)]
    interface: Option<Ipv4Addr>,

    /// TOML configuration file; command-line flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Progress on stderr (info level)
    #[arg(short, long)]
    verbose: bool,

    /// Raw XML and per-datagram decisions on stderr (debug level, implies --verbose)
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    fn apply(&self, config: &mut DiscoveryConfig) {
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if self.listen_hello {
            config.include_hello = true;
        }
        if let Some(interface) = self.interface {
            config.interface = Some(interface);
        }
    }

    fn default_filter(&self) -> &'static str {
        if self.debug {
            "wsd_validator=debug"
        } else if self.verbose {
            "wsd_validator=info"
        } else {
            "wsd_validator=warn"
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize tracing; stdout is reserved for the report
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.default_filter()))
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => {
            let config = Config::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            tracing::info!("Loaded config from {}", path.display());
            config
        }
        None => Config::default(),
    };
    args.apply(&mut config.discovery);
    let options = config.discovery.options()?;

    tracing::info!(
        "Starting WS-Discovery: timeout={:?}, listen_hello={}, interface={}",
        options.timeout,
        options.include_hello,
        options.interface.map(|i| i.to_string()).unwrap_or_else(|| "all".to_string()),
    );

    // Ctrl-C ends the listen window early; the partial report is still printed
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received");
            signal_cancel.cancel();
        }
    });

    let session = DiscoverySession::new(options, Arc::new(TracingSink));
    let report = session.run(&cancel).await;

    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    println!("{}", json);

    tracing::info!("{}", report.message);
    Ok(if report.succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
