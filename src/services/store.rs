//! Holds the single most recently accepted command.

use crate::models::Command;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Last-writer-wins slot for the current command. Never a history.
#[derive(Clone, Default)]
pub struct CommandStore {
    current: Arc<RwLock<Option<Command>>>,
}

impl CommandStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored command unconditionally.
    pub async fn set(&self, command: Command) {
        *self.current.write().await = Some(command);
    }

    pub async fn get(&self) -> Option<Command> {
        self.current.read().await.clone()
    }
}
