//! Autoplay negotiation for video content.
//!
//! Playback is attempted with sound first. A rejected audible start falls
//! back to muted playback with an "enable sound" control; if muted autoplay is
//! rejected too, a full-surface prompt waits for one pointer interaction.

use super::surface::Sound;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoplayPhase {
    TryingAudible,
    TryingMuted,
    AwaitingTap,
    StartingOnTap,
    Unmuting,
    Playing { audible: bool },
    Failed,
}

/// Requests the negotiation makes of the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoStep {
    Play(Sound),
    UnmuteControl(bool),
    TapPrompt(bool),
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoNegotiation {
    phase: AutoplayPhase,
}

impl VideoNegotiation {
    pub fn start() -> (Self, Vec<VideoStep>) {
        (
            Self {
                phase: AutoplayPhase::TryingAudible,
            },
            vec![VideoStep::Play(Sound::Audible)],
        )
    }

    pub fn phase(&self) -> AutoplayPhase {
        self.phase
    }

    pub fn on_playing(&mut self) -> Vec<VideoStep> {
        match self.phase {
            AutoplayPhase::TryingAudible | AutoplayPhase::StartingOnTap => {
                self.phase = AutoplayPhase::Playing { audible: true };
                vec![]
            }
            AutoplayPhase::TryingMuted => {
                self.phase = AutoplayPhase::Playing { audible: false };
                vec![VideoStep::UnmuteControl(true)]
            }
            AutoplayPhase::Unmuting => {
                self.phase = AutoplayPhase::Playing { audible: true };
                vec![VideoStep::UnmuteControl(false)]
            }
            _ => vec![],
        }
    }

    pub fn on_rejected(&mut self) -> Vec<VideoStep> {
        match self.phase {
            AutoplayPhase::TryingAudible => {
                self.phase = AutoplayPhase::TryingMuted;
                vec![VideoStep::Play(Sound::Muted)]
            }
            AutoplayPhase::TryingMuted => {
                self.phase = AutoplayPhase::AwaitingTap;
                vec![VideoStep::TapPrompt(true)]
            }
            AutoplayPhase::StartingOnTap => {
                self.phase = AutoplayPhase::Failed;
                vec![VideoStep::Fail]
            }
            // Unmute refused: keep playing silently, the control stays.
            AutoplayPhase::Unmuting => {
                self.phase = AutoplayPhase::Playing { audible: false };
                vec![]
            }
            _ => vec![],
        }
    }

    pub fn on_unmute_request(&mut self) -> Vec<VideoStep> {
        match self.phase {
            AutoplayPhase::Playing { audible: false } => {
                self.phase = AutoplayPhase::Unmuting;
                vec![VideoStep::Play(Sound::Audible)]
            }
            _ => vec![],
        }
    }

    /// Consumes the first pointer interaction after the tap prompt appears; later ones are ignored.
    pub fn on_pointer(&mut self) -> Vec<VideoStep> {
        match self.phase {
            AutoplayPhase::AwaitingTap => {
                self.phase = AutoplayPhase::StartingOnTap;
                vec![VideoStep::TapPrompt(false), VideoStep::Play(Sound::Audible)]
            }
            _ => vec![],
        }
    }
}
