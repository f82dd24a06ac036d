//! Data contracts: commands, playlist items, wire envelopes and sessions.

pub mod command;
pub mod event;
pub mod session;

pub use command::*;
pub use event::*;
pub use session::*;
