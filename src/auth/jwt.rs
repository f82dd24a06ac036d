//! Bearer token issue and verification.

use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Validity window of an issued token.
pub const TOKEN_TTL_HOURS: i64 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // operator username
    pub exp: i64,
    pub iat: i64,
}

/// Stateless verifier over a shared secret. Expiry is the only invalidation.
#[derive(Clone)]
pub struct TokenVerifier {
    secret: String,
}

impl TokenVerifier {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    pub fn issue(&self, username: &str) -> AppResult<String> {
        let now = Utc::now();
        self.issue_at(username, now.timestamp(), (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp())
    }

    pub(crate) fn issue_at(&self, username: &str, iat: i64, exp: i64) -> AppResult<String> {
        let claims = Claims {
            sub: username.to_string(),
            exp,
            iat,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("token encode: {}", e)))
    }

    /// Every failure (structure, signature, expiry) collapses to the same `Unauthorized`.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            debug!(reason = %e, "token rejected");
            AppError::invalid_token()
        })?;
        Ok(data.claims)
    }

    /// Verify an optional token, distinguishing only "absent" from "invalid".
    pub fn verify_present(&self, token: Option<&str>) -> AppResult<Claims> {
        match token.map(str::trim).filter(|t| !t.is_empty()) {
            None => Err(AppError::missing_token()),
            Some(t) => self.verify(t),
        }
    }
}
