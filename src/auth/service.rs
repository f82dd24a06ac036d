//! Operator account: a single configured username with an argon2-hashed password.

use crate::error::{AppError, AppResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AccountService {
    username: String,
    password_hash: Arc<str>,
}

impl AccountService {
    /// Hash the configured password once; the clear text is not retained.
    pub fn new(username: String, password: &str) -> AppResult<Self> {
        let password_hash = Self::hash_password(password)?;
        Ok(Self {
            username,
            password_hash: password_hash.into(),
        })
    }

    pub fn hash_password(password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("hash: {}", e)))?
            .to_string();
        Ok(hash)
    }

    pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| AppError::Internal(anyhow::anyhow!("parse hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// True when both username and password match the configured operator.
    pub fn authenticate(&self, username: &str, password: &str) -> AppResult<bool> {
        let password_ok = Self::verify_password(password, &self.password_hash)?;
        Ok(password_ok && username == self.username)
    }
}
