//! Broadcast channel: registry of connected display sessions and fan-out to all of them.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

/// Outbound queue of one session; frames are pre-serialized JSON text.
pub type SessionSender = mpsc::UnboundedSender<String>;

/// Registry of connected sessions. Delivery is best-effort per session.
#[derive(Clone, Default)]
pub struct BroadcastChannel {
    sessions: Arc<RwLock<HashMap<String, SessionSender>>>,
}

impl BroadcastChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, session_id: &str, sender: SessionSender) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id.to_string(), sender);
        debug!(session_id = %session_id, total = sessions.len(), "session registered");
    }

    pub async fn unregister(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(session_id).is_some() {
            debug!(session_id = %session_id, total = sessions.len(), "session unregistered");
        }
    }

    /// Queue `payload` to every registered session. Returns how many accepted it.
    ///
    /// A session whose socket is already gone simply misses the frame; it is
    /// resynced from the command store when it registers again.
    pub async fn broadcast(&self, payload: &str) -> usize {
        let sessions = self.sessions.read().await;
        let delivered = sessions
            .values()
            .filter(|tx| tx.send(payload.to_string()).is_ok())
            .count();
        info!(sessions = sessions.len(), delivered, "broadcast");
        delivered
    }

    /// Ids of the connected sessions, sorted for stable output.
    pub async fn list_sessions(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_every_registered_session() {
        let channel = BroadcastChannel::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        channel.register("a", tx_a).await;
        channel.register("b", tx_b).await;

        assert_eq!(channel.broadcast("hello").await, 2);
        assert_eq!(rx_a.recv().await.as_deref(), Some("hello"));
        assert_eq!(rx_b.recv().await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn unregistered_session_receives_nothing() {
        let channel = BroadcastChannel::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        channel.register("a", tx).await;
        channel.unregister("a").await;

        assert_eq!(channel.broadcast("hello").await, 0);
        assert!(rx.try_recv().is_err());
        assert!(channel.list_sessions().await.is_empty());
    }

    #[tokio::test]
    async fn dropped_receiver_is_skipped() {
        let channel = BroadcastChannel::new();
        let (tx_gone, rx_gone) = mpsc::unbounded_channel();
        let (tx_live, mut rx_live) = mpsc::unbounded_channel();
        channel.register("gone", tx_gone).await;
        channel.register("live", tx_live).await;
        drop(rx_gone);

        assert_eq!(channel.broadcast("x").await, 1);
        assert_eq!(rx_live.recv().await.as_deref(), Some("x"));
        assert_eq!(channel.list_sessions().await, vec!["gone", "live"]);
    }
}
