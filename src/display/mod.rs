//! Display client: the playback state machine and what drives it.

pub mod config;
pub mod console;
pub mod machine;
pub mod observer;
pub mod runtime;
pub mod surface;
pub mod timers;
pub mod video;

pub use config::DisplayConfig;
pub use machine::{
    Connectivity, DisplayMachine, DisplayState, Input, LinkEvent, MediaSignal, PlaybackState,
};
pub use observer::{Cause, NoopObserver, TracingObserver, TransitionObserver};
pub use surface::{ImageSource, Notice, RenderId, Sound, Surface, TextStyle};
pub use timers::{TimerAction, TimerPurpose};
