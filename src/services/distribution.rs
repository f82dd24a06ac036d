//! Distribution: authenticate submissions, keep the last command, fan it out, resync joiners.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use crate::auth::TokenVerifier;
use crate::error::{AppError, AppResult};
use crate::models::{Command, ServerMessage, Submission};
use crate::services::channel::{BroadcastChannel, SessionSender};
use crate::services::store::CommandStore;

/// Outcome of an accepted submission.
#[derive(Debug, Clone)]
pub struct Accepted {
    /// The command as stored and broadcast (no token).
    pub command: Command,
    /// Sessions the broadcast was queued to.
    pub delivered: usize,
}

#[derive(Clone)]
pub struct DistributionService {
    verifier: TokenVerifier,
    store: CommandStore,
    channel: BroadcastChannel,
    /// Serializes store+broadcast against register+resync so a joiner never gets a stale resync.
    sequencer: Arc<Mutex<()>>,
}

impl DistributionService {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self {
            verifier,
            store: CommandStore::new(),
            channel: BroadcastChannel::new(),
            sequencer: Arc::new(Mutex::new(())),
        }
    }

    pub fn store(&self) -> &CommandStore {
        &self.store
    }

    pub fn channel(&self) -> &BroadcastChannel {
        &self.channel
    }

    /// Verify, strip the token, store, then broadcast.
    ///
    /// The token is checked before the body is interpreted; on any failure
    /// nothing is stored or broadcast.
    pub async fn submit(&self, submission: Submission) -> AppResult<Accepted> {
        let claims = match self.verifier.verify_present(submission.token.as_deref()) {
            Ok(claims) => claims,
            Err(e) => {
                warn!(error = %e, "submission rejected");
                return Err(e);
            }
        };
        let command = submission
            .into_command()
            .map_err(|e| AppError::InvalidCommand(e.to_string()))?;
        let payload = serde_json::to_string(&ServerMessage::Command(command.clone()))?;

        let _turn = self.sequencer.lock().await;
        self.store.set(command.clone()).await;
        let delivered = self.channel.broadcast(&payload).await;
        info!(operator = %claims.sub, action = command.action(), delivered, "command accepted");
        Ok(Accepted { command, delivered })
    }

    /// Register a session and push it the current command, if any, ahead of any later broadcast.
    pub async fn join(&self, session_id: &str, sender: SessionSender) -> AppResult<()> {
        let _turn = self.sequencer.lock().await;
        if let Some(command) = self.store.get().await {
            let payload = serde_json::to_string(&ServerMessage::Command(command))?;
            let _ = sender.send(payload);
        }
        self.channel.register(session_id, sender).await;
        Ok(())
    }

    pub async fn leave(&self, session_id: &str) {
        self.channel.unregister(session_id).await;
    }

    /// Convenience for callers that own no socket: a fresh session queue.
    pub async fn join_with_queue(
        &self,
        session_id: &str,
    ) -> AppResult<mpsc::UnboundedReceiver<String>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.join(session_id, tx).await?;
        Ok(rx)
    }
}
