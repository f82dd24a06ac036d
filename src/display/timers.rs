//! Virtual-time timer table: at most one pending timer per purpose.

use std::collections::BTreeMap;
use std::time::Duration;

/// Independent timer slots. Ordering breaks ties between timers due at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerPurpose {
    /// Playlist advance or `showText` expiry.
    Advance,
    /// Embedded-page load deadline and its retry.
    PageLoad,
    /// First connection attempt.
    Connect,
}

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    NextItem,
    ShowNoData,
    PageDeadline,
    ReloadPage,
    ConnectTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    due: Duration,
    action: TimerAction,
}

/// Pending timers keyed by purpose. Times are offsets from the machine's start.
#[derive(Debug, Default)]
pub struct TimerTable {
    slots: BTreeMap<TimerPurpose, Pending>,
}

impl TimerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `purpose`, replacing whatever was pending there. Returns true if one was replaced.
    pub fn schedule(&mut self, purpose: TimerPurpose, due: Duration, action: TimerAction) -> bool {
        self.slots.insert(purpose, Pending { due, action }).is_some()
    }

    pub fn cancel(&mut self, purpose: TimerPurpose) -> bool {
        self.slots.remove(&purpose).is_some()
    }

    pub fn pending(&self, purpose: TimerPurpose) -> Option<(Duration, TimerAction)> {
        self.slots.get(&purpose).map(|p| (p.due, p.action))
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.slots.values().map(|p| p.due).min()
    }

    /// Remove and return the earliest timer due at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, TimerPurpose, TimerAction)> {
        let (purpose, pending) = self
            .slots
            .iter()
            .filter(|(_, p)| p.due <= now)
            .min_by_key(|(purpose, p)| (p.due, **purpose))
            .map(|(purpose, p)| (*purpose, *p))?;
        self.slots.remove(&purpose);
        Some((pending.due, purpose, pending.action))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
