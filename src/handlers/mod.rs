//! HTTP, WebSocket and relay request handlers.

pub mod http;
pub mod relay;
pub mod ws;

pub use http::*;
pub use relay::relay;
pub use ws::*;
