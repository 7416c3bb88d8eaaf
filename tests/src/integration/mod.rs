//! Integration tests across rv-01, rv-02, rv-03 and the node runtime.

pub mod e2e_lifecycle;
pub mod live_transport;
pub mod notification_scoping;

#[cfg(test)]
pub(crate) mod fixtures {
    use rv_01_submissions::{LifecycleConfig, LifecycleService, NewSubmission};
    use rv_02_realtime::{
        Admission, ConnectionRegistry, Frame, InMemoryConnectionRegistry, NotificationFanout,
    };
    use serde_json::Value;
    use shared_bus::{EventFilter, EventPublisher, InMemoryEventBus};
    use shared_types::{Category, CountryCode, MediaType, Principal, Role, UserId};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::{mpsc, watch};
    use tokio::task::JoinHandle;
    use tokio::time::timeout;

    /// Lifecycle, bus, registry and a running fan-out wired together.
    pub struct Pipeline {
        pub lifecycle: Arc<LifecycleService>,
        pub registry: Arc<InMemoryConnectionRegistry>,
        pub fanout: Arc<NotificationFanout>,
        pub bus: Arc<InMemoryEventBus>,
        shutdown: watch::Sender<bool>,
        task: JoinHandle<()>,
    }

    impl Pipeline {
        pub fn start() -> Self {
            let bus = Arc::new(InMemoryEventBus::new());
            let publisher: Arc<dyn EventPublisher> = bus.clone();
            let lifecycle = Arc::new(LifecycleService::new_in_memory(
                publisher,
                LifecycleConfig::default(),
            ));
            let registry = Arc::new(InMemoryConnectionRegistry::new());
            let registry_dyn: Arc<dyn ConnectionRegistry> = registry.clone();
            let fanout = Arc::new(NotificationFanout::new(registry_dyn));

            let (shutdown, shutdown_rx) = watch::channel(false);
            let task = Arc::clone(&fanout).spawn(bus.subscribe(EventFilter::all()), shutdown_rx);

            Self {
                lifecycle,
                registry,
                fanout,
                bus,
                shutdown,
                task,
            }
        }

        pub fn connect(&self, principal: &Principal) -> Admission {
            self.registry.admit(principal.clone(), 64)
        }

        pub async fn stop(self) {
            let _ = self.shutdown.send(true);
            let _ = self.task.await;
        }
    }

    pub fn principal(user: &str, role: Role, country: &str) -> Principal {
        Principal::new(
            UserId::new(user).unwrap(),
            role,
            CountryCode::parse(country).unwrap(),
        )
    }

    pub fn new_submission(country: &str, title: &str) -> NewSubmission {
        NewSubmission {
            url: format!("https://news.example.org/{}", title.to_lowercase().replace(' ', "-")),
            title: title.to_string(),
            publisher: "Example Daily".to_string(),
            country: CountryCode::parse(country).unwrap(),
            category: Category::Secondary,
            media_type: MediaType::Article,
        }
    }

    /// Next frame on `receiver`, decoded.
    pub async fn next_frame(receiver: &mut mpsc::Receiver<Frame>) -> Value {
        let frame = timeout(Duration::from_secs(2), receiver.recv())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection queue closed");
        serde_json::from_str(&frame).unwrap()
    }

    /// Assert nothing arrives within a short window.
    pub async fn assert_silent(receiver: &mut mpsc::Receiver<Frame>) {
        let result = timeout(Duration::from_millis(150), receiver.recv()).await;
        assert!(result.is_err(), "unexpected frame: {:?}", result);
    }
}
