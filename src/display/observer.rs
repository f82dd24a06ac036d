//! Observer hook invoked at state-machine transition points.

use tracing::{debug, info, warn};

use super::machine::{Connectivity, DisplayState, LinkEvent};
use super::surface::Notice;
use super::timers::TimerAction;

/// What drove a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    Start,
    Command(&'static str),
    Timer(TimerAction),
    Link(LinkEvent),
    Media,
}

pub trait TransitionObserver {
    fn on_transition(&mut self, _from: &DisplayState, _to: &DisplayState, _cause: Cause) {}
    fn on_notice(&mut self, _notice: Notice, _cause: Cause) {}
    fn on_connectivity(&mut self, _from: Connectivity, _to: Connectivity) {}
}

/// Reports transitions as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TransitionObserver for TracingObserver {
    fn on_transition(&mut self, from: &DisplayState, to: &DisplayState, cause: Cause) {
        info!(?from, ?to, ?cause, "display transition");
    }

    fn on_notice(&mut self, notice: Notice, cause: Cause) {
        match notice {
            Notice::NoData | Notice::NoConnection => debug!(?notice, ?cause, "notice"),
            _ => warn!(?notice, ?cause, "notice"),
        }
    }

    fn on_connectivity(&mut self, from: Connectivity, to: Connectivity) {
        info!(?from, ?to, "connectivity");
    }
}

/// Ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TransitionObserver for NoopObserver {}
