//! Business logic: command store, broadcast channel, distribution and content relay.

pub mod channel;
pub mod distribution;
pub mod relay;
pub mod store;

pub use channel::BroadcastChannel;
pub use distribution::{Accepted, DistributionService};
pub use relay::RelayService;
pub use store::CommandStore;
