//! WebSocket handler: display sessions, resync on connect, and `send-command` submissions.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::pick_token;
use crate::models::{generate_session_id, ClientMessage, ServerMessage, Submission};
use crate::services::channel::SessionSender;

const SEND_COMMAND_EVENT: &str = "send-command";

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    /// Display token, only consulted when the policy requires one.
    pub token: Option<String>,
}

/// Upgrade HTTP to WebSocket. Displays connect without a token unless the policy says otherwise.
pub async fn ws_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    if state.policy.displays_require_token {
        let token = pick_token(&headers, params.token);
        state.verifier().verify_present(token.as_deref())?;
    }
    Ok(ws.on_upgrade(move |socket| handle_socket(state, socket)))
}

fn encode(msg: &ServerMessage) -> Option<String> {
    serde_json::to_string(msg)
        .map_err(|e| warn!(error = %e, "encode server message"))
        .ok()
}

/// A frame naming `send-command` whose payload is missing or not an object.
fn malformed_submission(text: &str) -> Option<Submission> {
    let mut frame: Value = serde_json::from_str(text).ok()?;
    if frame.get("event").and_then(Value::as_str) != Some(SEND_COMMAND_EVENT) {
        return None;
    }
    Some(Submission::from_loose(frame.get_mut("data").map(Value::take)))
}

/// Submit on behalf of a session; failures go back to that session only.
async fn submit_or_reply(
    state: &AppState,
    session_id: &str,
    tx: &SessionSender,
    submission: Submission,
) {
    if let Err(e) = state.distribution().submit(submission).await {
        debug!(session_id = %session_id, error = %e, "send-command rejected");
        let reply = ServerMessage::CommandError {
            error: e.public_message(),
        };
        if let Some(reply) = encode(&reply) {
            let _ = tx.send(reply);
        }
    }
}

async fn handle_socket(state: AppState, socket: WebSocket) {
    let session_id = generate_session_id();
    info!(session_id = %session_id, "ws connected");

    let (mut sender, mut receiver) = socket.split();

    let hello = ServerMessage::ConnectionEstablished {
        session_id: session_id.clone(),
    };
    let Some(hello) = encode(&hello) else { return };
    if sender.send(Message::Text(hello)).await.is_err() {
        return;
    }

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // Resync first, then receive broadcasts.
    if let Err(e) = state.distribution().join(&session_id, tx.clone()).await {
        warn!(session_id = %session_id, error = %e, "join failed");
        send_task.abort();
        return;
    }

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::SendCommand(submission)) => {
                    submit_or_reply(&state, &session_id, &tx, submission).await;
                }
                Ok(ClientMessage::Ping) => {
                    if let Some(pong) = encode(&ServerMessage::Pong) {
                        let _ = tx.send(pong);
                    }
                }
                Err(e) => match malformed_submission(&text) {
                    // A send-command the envelope could not carry still gets an answer.
                    Some(submission) => submit_or_reply(&state, &session_id, &tx, submission).await,
                    None => debug!(session_id = %session_id, error = %e, "ignored frame"),
                },
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.distribution().leave(&session_id).await;
    send_task.abort();
    info!(session_id = %session_id, "ws disconnected");
}
