//! # Live transport
//!
//! Boots a full `rv-node` on an ephemeral port and drives it the way a
//! browser would: REST calls over HTTP/1.1 and notifications over a real
//! WebSocket connection.

#[cfg(test)]
mod tests {
    use futures::{SinkExt, StreamExt};
    use rv_02_realtime::wire;
    use rv_03_api_gateway::TokenEntry;
    use rv_node::{NodeConfig, NodeRuntime, RunningNode};
    use serde_json::{json, Value};
    use shared_types::{CountryCode, Role, UserId};
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;
    use tokio_tungstenite::tungstenite::http::HeaderValue;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

    fn token(token: &str, user: &str, role: Role, country: &str) -> TokenEntry {
        TokenEntry {
            token: token.into(),
            user_id: UserId::new(user).unwrap(),
            role,
            country: CountryCode::parse(country).unwrap(),
            active: true,
        }
    }

    async fn start_node() -> RunningNode {
        start_node_with(|_| {}).await
    }

    async fn start_node_with(tweak: impl FnOnce(&mut NodeConfig)) -> RunningNode {
        let mut config = NodeConfig::default();
        config.gateway.http.host = IpAddr::V4(Ipv4Addr::LOCALHOST);
        config.gateway.http.port = 0;
        config.gateway.auth.tokens = vec![
            token("admin-token", "admin-1", Role::Admin, "FR"),
            token("gh-token", "verifier-gh", Role::Verifier, "GH"),
            token("fr-token", "verifier-fr", Role::Verifier, "FR"),
            token("contrib-token", "contributor-1", Role::Contributor, "GH"),
        ];
        tweak(&mut config);
        let config = config.finalize().unwrap();
        NodeRuntime::new(config).unwrap().start().await.unwrap()
    }

    /// Minimal HTTP/1.1 client: one request per connection.
    async fn http(
        addr: SocketAddr,
        method: &str,
        path: &str,
        bearer: &str,
        body: Option<Value>,
    ) -> (u16, Value) {
        let body = body.map(|b| b.to_string()).unwrap_or_default();
        let request = format!(
            "{method} {path} HTTP/1.1\r\n\
             Host: localhost\r\n\
             Authorization: Bearer {bearer}\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {len}\r\n\
             Connection: close\r\n\r\n{body}",
            len = body.len(),
        );

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();

        let status = raw
            .split_whitespace()
            .nth(1)
            .and_then(|code| code.parse().ok())
            .unwrap_or(0);
        let payload = raw.split_once("\r\n\r\n").map(|(_, b)| b).unwrap_or("");
        let value = serde_json::from_str(payload).unwrap_or(Value::Null);
        (status, value)
    }

    /// Next JSON text frame, skipping transport pings.
    async fn next_json(ws: &mut Ws) -> Value {
        loop {
            let message = timeout(Duration::from_secs(3), ws.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("stream ended")
                .expect("websocket error");
            match message {
                Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
                Message::Ping(_) | Message::Pong(_) => continue,
                other => panic!("unexpected message: {:?}", other),
            }
        }
    }

    async fn ws_with_query(addr: SocketAddr, token: &str) -> Ws {
        let (ws, _) = connect_async(format!("ws://{}/ws?token={}", addr, token))
            .await
            .unwrap();
        ws
    }

    async fn ws_with_header(addr: SocketAddr, token: &str) -> Ws {
        let mut request = format!("ws://{}/ws", addr).into_client_request().unwrap();
        request.headers_mut().insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        let (ws, _) = connect_async(request).await.unwrap();
        ws
    }

    async fn ws_with_first_frame(addr: SocketAddr, token: &str) -> Ws {
        let (mut ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
        ws.send(Message::text(
            json!({ "type": "auth", "token": token }).to_string(),
        ))
        .await
        .unwrap();
        ws
    }

    async fn wait_for_connections(node: &RunningNode, expected: usize) {
        for _ in 0..100 {
            if node.connection_count() == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!(
            "expected {} connections, found {}",
            expected,
            node.connection_count()
        );
    }

    #[tokio::test]
    async fn test_review_flow_over_http_and_websocket() {
        let node = start_node().await;
        let addr = node.local_addr();

        let mut verifier_gh = ws_with_query(addr, "gh-token").await;
        let ready = next_json(&mut verifier_gh).await;
        assert_eq!(ready["event"], wire::CONNECTION_READY);
        assert_eq!(ready["data"]["userId"], "verifier-gh");
        let channels: Vec<&str> = ready["data"]["channels"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(channels.contains(&"country:GH"));
        assert!(channels.contains(&"role:verifier"));

        let mut verifier_fr = ws_with_header(addr, "fr-token").await;
        assert_eq!(next_json(&mut verifier_fr).await["event"], wire::CONNECTION_READY);

        let mut contributor = ws_with_first_frame(addr, "contrib-token").await;
        assert_eq!(next_json(&mut contributor).await["event"], wire::CONNECTION_READY);
        wait_for_connections(&node, 3).await;

        // Contributor proposes a Ghanaian source.
        let (status, created) = http(
            addr,
            "POST",
            "/submissions",
            "contrib-token",
            Some(json!({
                "url": "https://news.example.gh/budget-2026",
                "title": "2026 budget statement",
                "publisher": "Ghana News Agency",
                "country": "GH",
                "category": "primary"
            })),
        )
        .await;
        assert_eq!(status, 201, "{}", created);
        let id = created["id"].as_str().unwrap().to_string();

        for ws in [&mut verifier_gh, &mut verifier_fr] {
            let frame = next_json(ws).await;
            assert_eq!(frame["event"], wire::SUBMISSION_CREATED);
            assert_eq!(frame["data"]["submission"]["id"], id.as_str());
        }

        // A French verifier may see it but not decide it.
        let (status, body) = http(
            addr,
            "PATCH",
            &format!("/submissions/{}/approve", id),
            "fr-token",
            None,
        )
        .await;
        assert_eq!(status, 403);
        assert_eq!(body["error"]["kind"], "forbidden");

        let (status, approved) = http(
            addr,
            "PATCH",
            &format!("/submissions/{}/approve", id),
            "gh-token",
            Some(json!({ "notes": "Matches the ministry release" })),
        )
        .await;
        assert_eq!(status, 200, "{}", approved);
        assert_eq!(approved["status"], "approved");
        assert_eq!(approved["credibility"], "high");

        for ws in [&mut contributor, &mut verifier_gh] {
            let frame = next_json(ws).await;
            assert_eq!(frame["event"], wire::SUBMISSION_VERIFIED);
            assert_eq!(frame["data"]["status"], "approved");
            assert_eq!(frame["data"]["notes"], "Matches the ministry release");
        }
        assert!(
            timeout(Duration::from_millis(200), verifier_fr.next())
                .await
                .is_err(),
            "verifier outside GH must not hear about the decision"
        );

        // Application-level keepalive.
        contributor
            .send(Message::text(r#"{"type":"ping"}"#))
            .await
            .unwrap();
        assert_eq!(next_json(&mut contributor).await["event"], wire::PONG);

        node.shutdown().await;
    }

    #[tokio::test]
    async fn test_bad_credential_gets_error_then_close() {
        let node = start_node().await;
        let addr = node.local_addr();

        let mut ws = ws_with_query(addr, "not-a-token").await;
        let frame = next_json(&mut ws).await;
        assert_eq!(frame["event"], wire::ERROR);
        assert_eq!(frame["data"]["kind"], "unauthorized");

        let next = timeout(Duration::from_secs(2), ws.next()).await.unwrap();
        assert!(matches!(next, Some(Ok(Message::Close(_))) | None | Some(Err(_))));
        assert_eq!(node.connection_count(), 0);

        node.shutdown().await;
    }

    #[tokio::test]
    async fn test_silent_client_dropped_after_handshake_window() {
        let node = start_node_with(|config| {
            config.gateway.websocket.handshake_timeout = Duration::from_millis(200);
        })
        .await;
        let addr = node.local_addr();

        // No token on the upgrade and no auth frame afterwards.
        let (mut ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();

        let frame = next_json(&mut ws).await;
        assert_eq!(frame["event"], wire::ERROR);
        assert_eq!(frame["data"]["kind"], "unauthorized");

        let next = timeout(Duration::from_secs(2), ws.next()).await.unwrap();
        assert!(matches!(next, Some(Ok(Message::Close(_))) | None | Some(Err(_))));
        assert_eq!(node.connection_count(), 0);

        node.shutdown().await;
    }

    #[tokio::test]
    async fn test_admin_disconnect_and_notice() {
        let node = start_node().await;
        let addr = node.local_addr();

        let mut first = ws_with_query(addr, "contrib-token").await;
        let mut second = ws_with_query(addr, "contrib-token").await;
        let mut verifier = ws_with_query(addr, "gh-token").await;
        for ws in [&mut first, &mut second, &mut verifier] {
            assert_eq!(next_json(ws).await["event"], wire::CONNECTION_READY);
        }
        wait_for_connections(&node, 3).await;

        let (status, online) = http(addr, "GET", "/admin/users/contributor-1/online", "admin-token", None).await;
        assert_eq!(status, 200);
        assert_eq!(online["connections"], 2);

        let (status, notice) = http(
            addr,
            "POST",
            "/admin/notifications",
            "admin-token",
            Some(json!({ "message": "Read-only mode in 5 minutes", "level": "warning" })),
        )
        .await;
        assert_eq!(status, 202, "{}", notice);
        for ws in [&mut first, &mut second, &mut verifier] {
            let frame = next_json(ws).await;
            assert_eq!(frame["event"], wire::SYSTEM_NOTIFICATION);
            assert_eq!(frame["data"]["message"], "Read-only mode in 5 minutes");
        }

        let (status, closed) = http(addr, "POST", "/admin/users/contributor-1/disconnect", "admin-token", None).await;
        assert_eq!(status, 200);
        assert_eq!(closed["closed"], 2);

        for ws in [&mut first, &mut second] {
            let next = timeout(Duration::from_secs(2), ws.next()).await.unwrap();
            assert!(matches!(next, Some(Ok(Message::Close(_))) | None | Some(Err(_))));
        }
        wait_for_connections(&node, 1).await;

        node.shutdown().await;
    }
}
