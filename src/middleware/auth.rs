//! Bearer token extraction and the operator extractor.

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};

use crate::auth::Claims;
use crate::error::AppError;
use crate::handlers::http::AppState;

const BEARER_SCHEME: &str = "bearer ";

/// Token from `Authorization: Bearer <token>`; the scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let scheme = value.get(..BEARER_SCHEME.len())?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }
    Some(value[BEARER_SCHEME.len()..].trim()).filter(|t| !t.is_empty())
}

/// Header token wins over a token carried in the body or query.
pub fn pick_token(headers: &HeaderMap, fallback: Option<String>) -> Option<String> {
    bearer_token(headers).map(String::from).or(fallback)
}

/// Extractor: verified operator claims from the bearer header.
#[derive(Clone, Debug)]
pub struct Operator(pub Claims);

#[async_trait]
impl axum::extract::FromRequestParts<AppState> for Operator {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = state.verifier().verify_present(bearer_token(&parts.headers))?;
        Ok(Operator(claims))
    }
}
