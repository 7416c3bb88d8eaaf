//! Node runtime: wires the subsystems together and owns their tasks.
//!
//! ```text
//! HTTP/WS clients
//!       │
//!       ▼
//! rv-03 API Gateway ──► rv-01 Lifecycle ──publish──► shared-bus
//!       │                                               │
//!       │ admit / remove                                ▼
//!       └──────────► rv-02 Registry ◄──deliver── rv-02 Fan-out
//! ```

use crate::config::NodeConfig;
use anyhow::{Context, Result};
use rv_01_submissions::LifecycleService;
use rv_02_realtime::{ConnectionRegistry, InMemoryConnectionRegistry, NotificationFanout};
use rv_03_api_gateway::{ApiGatewayService, GatewayDependencies, StaticTokenResolver};
use shared_bus::{EventFilter, EventPublisher, InMemoryEventBus};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Assembled but not yet running node.
pub struct NodeRuntime {
    bus: Arc<InMemoryEventBus>,
    registry: Arc<InMemoryConnectionRegistry>,
    fanout: Arc<NotificationFanout>,
    gateway: ApiGatewayService,
    shutdown_tx: watch::Sender<bool>,
}

impl NodeRuntime {
    /// Build every subsystem from `config`.
    pub fn new(config: NodeConfig) -> Result<Self> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let bus = Arc::new(InMemoryEventBus::with_capacity(config.bus.capacity));
        let publisher: Arc<dyn EventPublisher> = bus.clone();

        let lifecycle = Arc::new(LifecycleService::new_in_memory(
            Arc::clone(&publisher),
            config.lifecycle.clone(),
        ));

        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let registry_dyn: Arc<dyn ConnectionRegistry> = registry.clone();
        let fanout = Arc::new(NotificationFanout::new(Arc::clone(&registry_dyn)));

        let resolver = StaticTokenResolver::new(config.gateway.auth.tokens.clone());
        if resolver.is_empty() {
            warn!("Token table is empty; clients cannot authenticate");
        }

        let gateway = ApiGatewayService::new(
            config.gateway,
            GatewayDependencies {
                lifecycle,
                registry: registry_dyn,
                resolver: Arc::new(resolver),
                publisher,
                fanout_stats: fanout.stats(),
                shutdown: shutdown_rx,
            },
        )
        .context("Failed to build API gateway")?;

        Ok(Self {
            bus,
            registry,
            fanout,
            gateway,
            shutdown_tx,
        })
    }

    /// Start the fan-out and the gateway.
    ///
    /// The fan-out subscribes before the listener is bound so no event
    /// committed through the gateway can be missed.
    pub async fn start(self) -> Result<RunningNode> {
        let Self {
            bus,
            registry,
            fanout,
            gateway,
            shutdown_tx,
        } = self;
        info!("Starting RefVerify node");

        let subscription = bus.subscribe(EventFilter::all());
        let fanout_task = fanout.spawn(subscription, shutdown_tx.subscribe());
        info!("[rv-02] Notification fan-out started");

        let listener = gateway
            .bind()
            .await
            .context("Failed to bind HTTP listener")?;
        let local_addr = listener
            .local_addr()
            .context("Failed to read listener address")?;

        let server_task = tokio::spawn(async move {
            if let Err(e) = gateway.serve(listener).await {
                error!(error = %e, "[rv-03] API gateway failed");
            }
        });
        info!(addr = %local_addr, "[rv-03] API gateway started");

        Ok(RunningNode {
            local_addr,
            registry,
            shutdown_tx,
            server_task,
            fanout_task,
        })
    }
}

/// Handle to a started node.
pub struct RunningNode {
    local_addr: SocketAddr,
    registry: Arc<InMemoryConnectionRegistry>,
    shutdown_tx: watch::Sender<bool>,
    server_task: JoinHandle<()>,
    fanout_task: JoinHandle<()>,
}

impl RunningNode {
    /// Address the gateway is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Live WebSocket connections.
    pub fn connection_count(&self) -> usize {
        self.registry.connection_count()
    }

    /// Signal shutdown and wait for every task to finish.
    pub async fn shutdown(self) {
        info!("Initiating graceful shutdown...");
        let _ = self.shutdown_tx.send(true);

        if let Err(e) = self.server_task.await {
            error!(error = %e, "API gateway task panicked");
        }
        if let Err(e) = self.fanout_task.await {
            error!(error = %e, "Fan-out task panicked");
        }
        info!("Shutdown complete");
    }
}
