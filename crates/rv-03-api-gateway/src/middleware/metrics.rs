//! Gateway counters, exported as JSON on `/admin/metrics`.
//!
//! Everything is a relaxed atomic; readers get a best-effort snapshot.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Default)]
struct Counter(AtomicU64);

impl Counter {
    fn bump(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// HTTP, lifecycle and WebSocket counters for one gateway instance.
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    http_ok: Counter,
    http_failed: Counter,
    http_latency_us: Counter,

    committed: Counter,
    refused: Counter,

    ws_live: AtomicI64,
    ws_refused: Counter,
    ws_frames: Counter,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// One finished HTTP request. `success` means a non-4xx/5xx status.
    pub fn record_request(&self, success: bool, latency_ms: u64) {
        self.record_request_us(success, latency_ms.saturating_mul(1000));
    }

    fn record_request_us(&self, success: bool, latency_us: u64) {
        if success {
            self.http_ok.bump();
        } else {
            self.http_failed.bump();
        }
        self.http_latency_us.add(latency_us);
    }

    /// One lifecycle change attempted through the gateway; batch items
    /// count individually.
    pub fn record_transition(&self, committed: bool) {
        if committed {
            self.committed.bump();
        } else {
            self.refused.bump();
        }
    }

    pub fn record_ws_connect(&self) {
        self.ws_live.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ws_disconnect(&self) {
        self.ws_live.fetch_sub(1, Ordering::Relaxed);
    }

    /// Unauthenticated or timed-out handshake.
    pub fn record_handshake_failure(&self) {
        self.ws_refused.bump();
    }

    pub fn record_ws_frame(&self) {
        self.ws_frames.bump();
    }

    pub fn requests(&self) -> u64 {
        self.http_ok.get() + self.http_failed.get()
    }

    pub fn average_latency_ms(&self) -> f64 {
        match self.requests() {
            0 => 0.0,
            n => self.http_latency_us.get() as f64 / n as f64 / 1000.0,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "requests": {
                "total": self.requests(),
                "success": self.http_ok.get(),
                "error": self.http_failed.get(),
                "averageLatencyMs": self.average_latency_ms(),
            },
            "transitions": {
                "committed": self.committed.get(),
                "rejected": self.refused.get(),
            },
            "websocket": {
                "connections": self.ws_live.load(Ordering::Relaxed),
                "handshakeFailures": self.ws_refused.get(),
                "framesSent": self.ws_frames.get(),
            },
        })
    }
}

/// Measures one request from construction to [`RequestTimer::finish`].
pub struct RequestTimer {
    started: Instant,
    metrics: Arc<GatewayMetrics>,
}

impl RequestTimer {
    pub fn new(metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            started: Instant::now(),
            metrics,
        }
    }

    pub fn finish(self, success: bool) {
        let elapsed = self.started.elapsed().as_micros();
        self.metrics
            .record_request_us(success, u64::try_from(elapsed).unwrap_or(u64::MAX));
    }
}

/// `axum::middleware::from_fn_with_state` hook counting every request.
pub async fn track_requests(
    State(metrics): State<Arc<GatewayMetrics>>,
    request: Request,
    next: Next,
) -> Response {
    let timer = RequestTimer::new(metrics);
    let response = next.run(request).await;
    let status = response.status();
    timer.finish(!(status.is_client_error() || status.is_server_error()));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_counts_and_latency() {
        let metrics = GatewayMetrics::new();
        metrics.record_request(true, 100);
        metrics.record_request(true, 200);
        metrics.record_request(false, 300);

        assert_eq!(metrics.requests(), 3);
        assert!((metrics.average_latency_ms() - 200.0).abs() < 0.01);

        let json = metrics.to_json();
        assert_eq!(json["requests"]["success"], 2);
        assert_eq!(json["requests"]["error"], 1);
    }

    #[test]
    fn test_empty_metrics() {
        let metrics = GatewayMetrics::new();
        assert_eq!(metrics.average_latency_ms(), 0.0);
        assert_eq!(metrics.to_json()["requests"]["total"], 0);
    }

    #[test]
    fn test_websocket_and_transition_counters() {
        let metrics = GatewayMetrics::new();
        metrics.record_ws_connect();
        metrics.record_ws_connect();
        metrics.record_ws_disconnect();
        metrics.record_handshake_failure();
        metrics.record_ws_frame();
        metrics.record_transition(true);
        metrics.record_transition(false);
        metrics.record_transition(true);

        let json = metrics.to_json();
        assert_eq!(json["websocket"]["connections"], 1);
        assert_eq!(json["websocket"]["handshakeFailures"], 1);
        assert_eq!(json["websocket"]["framesSent"], 1);
        assert_eq!(json["transitions"]["committed"], 2);
        assert_eq!(json["transitions"]["rejected"], 1);
    }

    #[test]
    fn test_timer_records_one_request() {
        let metrics = Arc::new(GatewayMetrics::new());
        RequestTimer::new(Arc::clone(&metrics)).finish(false);
        assert_eq!(metrics.requests(), 1);
        assert_eq!(metrics.to_json()["requests"]["error"], 1);
    }
}
