//! WebSocket connection handler.
//!
//! One task per connection: authenticate inside the handshake window, admit
//! into the registry, then pump the outbound queue and answer client frames
//! until either side hangs up.

use crate::auth::bearer_token;
use crate::domain::config::WebSocketConfig;
use crate::domain::error::ApiError;
use crate::service::{wait_for_shutdown, AppState};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use rv_02_realtime::{authenticate_and_admit, Admission, OutboundMessage};
use serde::Deserialize;
use shared_types::ErrorKind;
use std::time::Duration;
use tokio::time::{interval_at, timeout, Instant};
use tracing::{debug, info, warn};

/// Query string of the upgrade request.
#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// Frames a client may send.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    Auth { token: String },
    Ping,
}

/// What to do with one inbound message after the handshake.
#[derive(Debug, PartialEq)]
pub enum ClientAction {
    Ignore,
    Reply(OutboundMessage),
    Close,
}

/// `GET /ws`
pub async fn ws_upgrade(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let credential = bearer_token(&headers).or(params.token);
    let max_message_size = state.config.websocket.max_message_size;
    ws.max_message_size(max_message_size)
        .on_upgrade(move |socket| WebSocketHandler::new(state).handle(socket, credential))
}

/// Per-connection handler.
pub struct WebSocketHandler {
    state: AppState,
    config: WebSocketConfig,
}

type Sink = SplitSink<WebSocket, Message>;
type Source = SplitStream<WebSocket>;

impl WebSocketHandler {
    pub fn new(state: AppState) -> Self {
        let config = state.config.websocket.clone();
        Self { state, config }
    }

    /// Run the connection to completion.
    pub async fn handle(self, socket: WebSocket, credential: Option<String>) {
        let (mut sink, mut source) = socket.split();

        let admission = match timeout(
            self.config.handshake_timeout,
            self.handshake(&mut source, credential),
        )
        .await
        {
            Ok(Ok(admission)) => admission,
            Ok(Err(err)) => {
                warn!(kind = %err.kind, reason = %err.message, "WebSocket handshake rejected");
                self.refuse(&mut sink, err).await;
                return;
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.config.handshake_timeout.as_millis() as u64,
                    "WebSocket handshake timed out"
                );
                self.refuse(&mut sink, ApiError::unauthorized("handshake timed out"))
                    .await;
                return;
            }
        };

        let connection_id = admission.info.id;
        self.state.metrics.record_ws_connect();
        info!(
            connection_id = %connection_id,
            user_id = %admission.info.principal.user_id,
            role = %admission.info.principal.role,
            "WebSocket connected"
        );

        self.pump(admission, sink, source).await;

        self.state.registry.remove(&connection_id);
        self.state.metrics.record_ws_disconnect();
        info!(connection_id = %connection_id, "WebSocket disconnected");
    }

    /// Resolve the credential (upgrade request or first frame) and admit.
    async fn handshake(
        &self,
        source: &mut Source,
        credential: Option<String>,
    ) -> Result<Admission, ApiError> {
        let credential = match credential {
            Some(credential) => credential,
            None => first_frame_token(source).await?,
        };
        let admission = authenticate_and_admit(
            self.state.registry.as_ref(),
            self.state.resolver.as_ref(),
            &credential,
            self.config.queue_capacity,
        )
        .await?;
        Ok(admission)
    }

    async fn refuse(&self, sink: &mut Sink, err: ApiError) {
        self.state.metrics.record_handshake_failure();
        if let Ok(frame) = OutboundMessage::error(err.kind, err.message).encode() {
            let _ = sink.send(Message::Text(frame.to_string())).await;
        }
        let _ = sink.send(Message::Close(None)).await;
    }

    async fn pump(&self, admission: Admission, mut sink: Sink, mut source: Source) {
        let Admission { info, mut receiver } = admission;
        let connection_id = info.id;

        if let Ok(frame) = OutboundMessage::ready(&info.principal, &info.channels).encode() {
            if sink.send(Message::Text(frame.to_string())).await.is_err() {
                return;
            }
        }

        let ping_every = self.config.ping_interval.max(Duration::from_millis(10));
        let mut ping = interval_at(Instant::now() + ping_every, ping_every);
        let mut last_seen = Instant::now();
        let shutdown = wait_for_shutdown(self.state.shutdown.clone());
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                outbound = receiver.recv() => match outbound {
                    Some(frame) => {
                        if sink.send(Message::Text(frame.to_string())).await.is_err() {
                            break;
                        }
                        self.state.metrics.record_ws_frame();
                    }
                    None => {
                        // Every sender dropped: removed or force-disconnected.
                        debug!(connection_id = %connection_id, "Connection closed by registry");
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                },
                inbound = source.next() => match inbound {
                    Some(Ok(message)) => {
                        last_seen = Instant::now();
                        match respond(message) {
                            ClientAction::Ignore => {}
                            ClientAction::Reply(reply) => {
                                if let Ok(frame) = reply.encode() {
                                    if sink.send(Message::Text(frame.to_string())).await.is_err() {
                                        break;
                                    }
                                }
                            }
                            ClientAction::Close => break,
                        }
                    }
                    Some(Err(e)) => {
                        debug!(connection_id = %connection_id, error = %e, "WebSocket read error");
                        break;
                    }
                    None => break,
                },
                _ = ping.tick() => {
                    if last_seen.elapsed() >= self.config.idle_timeout {
                        info!(connection_id = %connection_id, "Closing idle connection");
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                    if sink.send(Message::Ping(Vec::new())).await.is_err() {
                        break;
                    }
                }
                _ = &mut shutdown => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    }
}

/// Wait for `{"type":"auth","token":"..."}` as the first text frame.
async fn first_frame_token(source: &mut Source) -> Result<String, ApiError> {
    while let Some(message) = source.next().await {
        match message {
            Ok(Message::Text(text)) => {
                return match serde_json::from_str::<ClientFrame>(&text) {
                    Ok(ClientFrame::Auth { token }) => Ok(token),
                    _ => Err(ApiError::unauthorized(
                        "first frame must be {\"type\":\"auth\",\"token\":...}",
                    )),
                };
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Ok(Message::Binary(_)) => {
                return Err(ApiError::unauthorized("expected an auth frame"));
            }
            Ok(Message::Close(_)) | Err(_) => break,
        }
    }
    Err(ApiError::unauthorized("connection closed before authenticating"))
}

/// Decide how to answer one client message on an authenticated connection.
pub fn respond(message: Message) -> ClientAction {
    match message {
        Message::Text(text) => match serde_json::from_str::<ClientFrame>(&text) {
            Ok(ClientFrame::Ping) => ClientAction::Reply(OutboundMessage::pong()),
            Ok(ClientFrame::Auth { .. }) => ClientAction::Reply(OutboundMessage::error(
                ErrorKind::ValidationError,
                "connection is already authenticated",
            )),
            Err(_) => ClientAction::Reply(OutboundMessage::error(
                ErrorKind::ValidationError,
                "unsupported frame: subscriptions follow from identity",
            )),
        },
        Message::Binary(_) => ClientAction::Reply(OutboundMessage::error(
            ErrorKind::ValidationError,
            "binary frames are not supported",
        )),
        Message::Ping(_) | Message::Pong(_) => ClientAction::Ignore,
        Message::Close(_) => ClientAction::Close,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv_02_realtime::wire;

    fn reply_event(action: ClientAction) -> (String, serde_json::Value) {
        match action {
            ClientAction::Reply(message) => (message.event, message.data),
            other => panic!("expected a reply, got {:?}", other),
        }
    }

    #[test]
    fn test_client_frame_parsing() {
        assert_eq!(
            serde_json::from_str::<ClientFrame>(r#"{"type":"auth","token":"t1"}"#).unwrap(),
            ClientFrame::Auth { token: "t1".into() }
        );
        assert_eq!(
            serde_json::from_str::<ClientFrame>(r#"{"type":"ping"}"#).unwrap(),
            ClientFrame::Ping
        );
        assert!(serde_json::from_str::<ClientFrame>(r#"{"type":"subscribe","channel":"country:FR"}"#).is_err());
    }

    #[test]
    fn test_ping_gets_pong() {
        let (event, _) = reply_event(respond(Message::Text(r#"{"type":"ping"}"#.into())));
        assert_eq!(event, wire::PONG);
    }

    #[test]
    fn test_subscribe_attempt_is_refused() {
        let (event, data) = reply_event(respond(Message::Text(
            r#"{"type":"subscribe","channel":"country:FR"}"#.into(),
        )));
        assert_eq!(event, wire::ERROR);
        assert_eq!(data["kind"], "validation_error");
    }

    #[test]
    fn test_binary_and_control_frames() {
        let (event, _) = reply_event(respond(Message::Binary(vec![1, 2, 3])));
        assert_eq!(event, wire::ERROR);
        assert_eq!(respond(Message::Ping(vec![])), ClientAction::Ignore);
        assert_eq!(respond(Message::Close(None)), ClientAction::Close);
    }
}
