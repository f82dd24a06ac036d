//! Request-level auth helpers shared by the HTTP and WebSocket handlers.

pub mod auth;

pub use auth::{bearer_token, pick_token, Operator};
