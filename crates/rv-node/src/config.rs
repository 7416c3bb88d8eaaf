//! Node configuration.
//!
//! Sources, later wins:
//!
//! 1. Built-in defaults
//! 2. TOML file named by `RV_CONFIG`
//! 3. `RV_HTTP_HOST`, `RV_HTTP_PORT`, `RV_MAX_BATCH_SIZE`

use anyhow::{bail, Context, Result};
use rv_01_submissions::LifecycleConfig;
use rv_03_api_gateway::GatewayConfig;
use serde::Deserialize;
use shared_bus::DEFAULT_CHANNEL_CAPACITY;
use std::path::Path;
use tracing::{info, warn};

/// Everything the node needs to start.
///
/// Gateway sections (`[http]`, `[websocket]`, `[limits]`, `[timeouts]`,
/// `[cors]`, `[[auth.tokens]]`) sit at the top level of the file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    #[serde(flatten)]
    pub gateway: GatewayConfig,
    pub lifecycle: LifecycleConfig,
    pub bus: BusConfig,
}

/// Event bus sizing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Events buffered per subscriber before it starts lagging.
    pub capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl NodeConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse configuration")
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Apply `RV_*` overrides. `lookup` is `std::env::var` outside tests.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("RV_HTTP_HOST") {
            self.gateway.http.host = host
                .parse()
                .with_context(|| format!("RV_HTTP_HOST is not an IP address: {}", host))?;
        }
        if let Some(port) = lookup("RV_HTTP_PORT") {
            self.gateway.http.port = port
                .parse()
                .with_context(|| format!("RV_HTTP_PORT is not a port: {}", port))?;
        }
        if let Some(size) = lookup("RV_MAX_BATCH_SIZE") {
            self.gateway.limits.max_batch_size = size
                .parse()
                .with_context(|| format!("RV_MAX_BATCH_SIZE is not a number: {}", size))?;
        }
        Ok(())
    }

    /// Reconcile shared limits and validate every section.
    pub fn finalize(mut self) -> Result<Self> {
        // The gateway limit is authoritative for batch size.
        self.lifecycle.max_batch_size = self.gateway.limits.max_batch_size;

        self.gateway
            .validate()
            .context("Invalid gateway configuration")?;
        if let Err(reason) = self.lifecycle.validate() {
            bail!("Invalid lifecycle configuration: {}", reason);
        }
        if self.bus.capacity == 0 {
            bail!("Invalid bus configuration: capacity cannot be 0");
        }
        if self.gateway.auth.tokens.is_empty() {
            warn!("No bearer tokens configured; every authenticated request will be refused");
        }
        Ok(self)
    }
}

/// Load configuration from `RV_CONFIG` (optional) and the environment.
pub fn load_config() -> Result<NodeConfig> {
    let mut config = match std::env::var("RV_CONFIG") {
        Ok(path) => {
            info!(path = %path, "Loading configuration file");
            NodeConfig::from_file(Path::new(&path))?
        }
        Err(_) => NodeConfig::default(),
    };
    config.apply_overrides(|key| std::env::var(key).ok())?;
    config.finalize()
}
