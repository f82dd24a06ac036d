//! HTTP handlers: command submission, status, client config and health.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use axum_extra::{headers::Host, TypedHeader};
use serde_json::json;

use crate::auth::{AccountService, TokenVerifier};
use crate::config::AccessPolicy;
use crate::error::AppError;
use crate::middleware::{pick_token, Operator};
use crate::models::Submission;
use crate::services::{DistributionService, RelayService};

/// Shared application state for HTTP and WebSocket handlers.
#[derive(Clone)]
pub struct AppState {
    pub distribution: DistributionService,
    pub verifier: TokenVerifier,
    pub accounts: AccountService,
    pub relay: RelayService,
    pub policy: AccessPolicy,
    /// Advertised origin; derived from the request when `None`.
    pub server_url: Option<String>,
}

impl AppState {
    pub fn new(
        verifier: TokenVerifier,
        accounts: AccountService,
        relay: RelayService,
        policy: AccessPolicy,
        server_url: Option<String>,
    ) -> Self {
        Self {
            distribution: DistributionService::new(verifier.clone()),
            verifier,
            accounts,
            relay,
            policy,
            server_url,
        }
    }

    pub fn distribution(&self) -> &DistributionService {
        &self.distribution
    }
    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }
    pub fn accounts(&self) -> &AccountService {
        &self.accounts
    }
    pub fn relay(&self) -> &RelayService {
        &self.relay
    }
}

const HEADER_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// POST /api/send-command — store and broadcast a command.
/// Token from `Authorization: Bearer` or the body `token` field; the header wins.
/// The body is read leniently so a caller without a valid token gets 401 whatever it sent.
pub async fn send_command(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut submission = Submission::from_loose(serde_json::from_slice(&body).ok());
    submission.token = pick_token(&headers, submission.token.take());
    let accepted = state.distribution().submit(submission).await?;

    Ok(Json(json!({
        "ok": true,
        "sent": accepted.command,
        "delivered": accepted.delivered
    })))
}

/// GET /api/status — last accepted command and connected session ids.
pub async fn status(
    State(state): State<AppState>,
    operator: Result<Operator, AppError>,
) -> Result<Json<serde_json::Value>, AppError> {
    if state.policy.status_requires_token {
        operator?;
    }
    let last_command = state.distribution().store().get().await;
    let clients = state.distribution().channel().list_sessions().await;
    Ok(Json(json!({ "lastCommand": last_command, "clients": clients })))
}

/// GET /api/config — origin displays should connect to.
pub async fn client_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    host: Option<TypedHeader<Host>>,
) -> Json<serde_json::Value> {
    let server_url = match &state.server_url {
        Some(url) => url.clone(),
        None => {
            let proto = headers
                .get(HEADER_FORWARDED_PROTO)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "http".to_string());
            let host = host
                .map(|TypedHeader(h)| h.to_string())
                .unwrap_or_else(|| "localhost:3001".to_string());
            format!("{}://{}", proto, host)
        }
    };
    Json(json!({ "serverUrl": server_url }))
}

/// GET /health — liveness probe.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "display-hub" })),
    )
}
