use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use serde::Deserialize;
use anyhow::{Context, Result};
use shared::protocol::{DISCOVERY_PORT, MULTICAST_GROUP};
use crate::session::DiscoveryOptions;

/// One day; longer listening windows are a typo, not a use case
const MAX_TIMEOUT_SECS: f64 = 86_400.0;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: f64,
    #[serde(default)]
    pub include_hello: bool,
    #[serde(default)]
    pub interface: Option<Ipv4Addr>,
    /// Probe destination; only worth changing to point at a single device
    #[serde(default = "default_target")]
    pub target: SocketAddr,
    #[serde(default = "default_recv_buffer_size")]
    pub recv_buffer_size: usize,
}

fn default_timeout() -> f64 {
    5.0
}

fn default_target() -> SocketAddr {
    SocketAddr::from((MULTICAST_GROUP, DISCOVERY_PORT))
}

fn default_recv_buffer_size() -> usize {
    65535
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            include_hello: false,
            interface: None,
            target: default_target(),
            recv_buffer_size: default_recv_buffer_size(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }
}

impl DiscoveryConfig {
    /// Validate and convert into session options
    pub fn options(&self) -> Result<DiscoveryOptions> {
        let timeout = Duration::try_from_secs_f64(self.timeout_secs)
            .with_context(|| format!("Invalid timeout: {} seconds", self.timeout_secs))?;
        anyhow::ensure!(
            self.timeout_secs <= MAX_TIMEOUT_SECS,
            "Timeout of {} seconds exceeds the {} second limit",
            self.timeout_secs,
            MAX_TIMEOUT_SECS
        );
        anyhow::ensure!(self.recv_buffer_size > 0, "recv_buffer_size must be positive");

        Ok(DiscoveryOptions {
            timeout,
            include_hello: self.include_hello,
            interface: self.interface,
            target: self.target,
            recv_buffer_size: self.recv_buffer_size,
        })
    }
}
