//! GET /relay?url=... — same-origin passthrough for remote media.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::Response,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::services::RelayService;

#[derive(Debug, Deserialize)]
pub struct RelayParams {
    pub url: Option<String>,
}

pub async fn relay(
    State(state): State<AppState>,
    Query(params): Query<RelayParams>,
) -> Result<Response, AppError> {
    let target = RelayService::parse_target(params.url.as_deref())?;
    let relayed = state.relay().fetch(target).await?;

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate");
    if let Some(content_type) = relayed.content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder
        .body(Body::from_stream(relayed.stream))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("relay response: {}", e)))
}
