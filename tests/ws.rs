//! WebSocket tests against a live listener: resync, broadcast, private errors and the display policy.

use display_hub::auth::{AccountService, TokenVerifier};
use display_hub::config::AccessPolicy;
use display_hub::services::RelayService;
use display_hub::{create_app, AppState};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const SECRET: &str = "ws-test-secret";

fn token() -> String {
    TokenVerifier::new(SECRET.to_string()).issue("admin").unwrap()
}

async fn spawn_server(policy: AccessPolicy) -> (String, AppState) {
    let verifier = TokenVerifier::new(SECRET.to_string());
    let accounts = AccountService::new("admin".to_string(), "1234").unwrap();
    let relay = RelayService::new(1024, Duration::from_secs(2)).unwrap();
    let state = AppState::new(verifier, accounts, relay, policy, None);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_app(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("ws://{}/ws", addr), state)
}

async fn next_json(ws: &mut Socket) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn send_json(ws: &mut Socket, value: Value) {
    ws.send(Message::Text(value.to_string())).await.unwrap();
}

/// Connect and wait until the session is registered; the pong is only sent after the join.
async fn connect_display(url: &str) -> (Socket, Vec<Value>) {
    let (mut ws, _) = connect_async(url).await.unwrap();
    let hello = next_json(&mut ws).await;
    assert_eq!(hello["event"], "connection-established");
    send_json(&mut ws, json!({ "event": "ping" })).await;
    let mut before_pong = Vec::new();
    loop {
        let msg = next_json(&mut ws).await;
        if msg["event"] == "pong" {
            break;
        }
        before_pong.push(msg);
    }
    (ws, before_pong)
}

async fn assert_silent(ws: &mut Socket) {
    let res = tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(res.is_err(), "expected no frame, got {:?}", res);
}

#[tokio::test]
async fn first_frame_carries_session_id() {
    let (url, _) = spawn_server(AccessPolicy::default()).await;
    let (mut ws, _) = connect_async(url.as_str()).await.unwrap();
    let hello = next_json(&mut ws).await;
    assert_eq!(hello["event"], "connection-established");
    let session_id = hello["data"]["sessionId"].as_str().unwrap();
    assert!(session_id.contains('.'));
}

#[tokio::test]
async fn fresh_server_sends_no_resync() {
    let (url, _) = spawn_server(AccessPolicy::default()).await;
    let (_ws, before_pong) = connect_display(&url).await;
    assert!(before_pong.is_empty());
}

#[tokio::test]
async fn send_command_reaches_every_display_and_late_joiner_resyncs() {
    let (url, state) = spawn_server(AccessPolicy::default()).await;
    let (mut operator, _) = connect_display(&url).await;
    let (mut display, _) = connect_display(&url).await;

    send_json(
        &mut operator,
        json!({
            "event": "send-command",
            "data": { "action": "showText", "text": "Welcome", "token": token() }
        }),
    )
    .await;

    let expected = json!({ "event": "command", "data": { "action": "showText", "text": "Welcome" } });
    assert_eq!(next_json(&mut display).await, expected);
    assert_eq!(next_json(&mut operator).await, expected);

    let (_late, before_pong) = connect_display(&url).await;
    assert_eq!(before_pong, vec![expected]);

    let clients = state.distribution().channel().list_sessions().await;
    assert_eq!(clients.len(), 3);
}

#[tokio::test]
async fn rejected_submission_answers_only_the_sender() {
    let (url, state) = spawn_server(AccessPolicy::default()).await;
    let (mut operator, _) = connect_display(&url).await;
    let (mut display, _) = connect_display(&url).await;

    send_json(
        &mut operator,
        json!({
            "event": "send-command",
            "data": { "action": "stopPlaylist", "token": "forged" }
        }),
    )
    .await;
    assert_eq!(
        next_json(&mut operator).await,
        json!({ "event": "command-error", "data": { "error": "invalid token" } })
    );

    send_json(
        &mut operator,
        json!({ "event": "send-command", "data": { "action": "stopPlaylist" } }),
    )
    .await;
    assert_eq!(
        next_json(&mut operator).await,
        json!({ "event": "command-error", "data": { "error": "missing token" } })
    );

    assert_silent(&mut display).await;
    assert_eq!(state.distribution().store().get().await, None);
}

#[tokio::test]
async fn send_command_without_usable_payload_is_answered_privately() {
    let (url, state) = spawn_server(AccessPolicy::default()).await;
    let (mut operator, _) = connect_display(&url).await;
    let (mut display, _) = connect_display(&url).await;

    let missing = json!({ "event": "command-error", "data": { "error": "missing token" } });
    for frame in [
        json!({ "event": "send-command" }),
        json!({ "event": "send-command", "data": null }),
        json!({ "event": "send-command", "data": [1, 2] }),
        json!({ "event": "send-command", "data": "stopPlaylist" }),
    ] {
        send_json(&mut operator, frame).await;
        assert_eq!(next_json(&mut operator).await, missing);
    }

    assert_silent(&mut display).await;
    assert_eq!(state.distribution().store().get().await, None);
}

#[tokio::test]
async fn closed_socket_leaves_the_channel() {
    let (url, state) = spawn_server(AccessPolicy::default()).await;
    let (mut ws, _) = connect_display(&url).await;
    assert_eq!(state.distribution().channel().list_sessions().await.len(), 1);

    ws.close(None).await.unwrap();
    drop(ws);
    for _ in 0..50 {
        if state.distribution().channel().list_sessions().await.is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("session still registered after close");
}

#[tokio::test]
async fn display_policy_rejects_upgrade_without_token() {
    let policy = AccessPolicy {
        status_requires_token: false,
        displays_require_token: true,
    };
    let (url, _) = spawn_server(policy).await;

    match connect_async(url.as_str()).await {
        Err(tokio_tungstenite::tungstenite::Error::Http(res)) => {
            assert_eq!(res.status().as_u16(), 401);
        }
        other => panic!("expected 401, got {:?}", other.map(|_| ())),
    }

    let with_token = format!("{}?token={}", url, token());
    let (mut ws, _) = connect_async(with_token.as_str()).await.unwrap();
    assert_eq!(next_json(&mut ws).await["event"], "connection-established");
}
