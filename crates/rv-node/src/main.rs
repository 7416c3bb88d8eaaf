//! `rv-node` binary.
//!
//! Logging: `RUST_LOG` filters (default `info`), `RV_LOG_JSON=1` switches to
//! JSON lines.

use anyhow::{anyhow, Result};
use rv_node::{load_config, NodeRuntime};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = matches!(
        std::env::var("RV_LOG_JSON").as_deref(),
        Ok("1") | Ok("true")
    );

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
    .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let config = load_config()?;
    let node = NodeRuntime::new(config)?.start().await?;

    info!(addr = %node.local_addr(), "Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    node.shutdown().await;
    Ok(())
}
