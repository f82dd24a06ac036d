//! Presentation commands and playlist items shared by the server and the display client.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Display time applied to playlist items without a usable duration.
pub const DEFAULT_ITEM_SECONDS: f64 = 15.0;

/// One directive from a controller to every display.
///
/// The stored and broadcast form never carries credentials; the bearer token
/// travels beside the command in a submission and is dropped on acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    /// Show a line of text. `None` or a non-positive duration keeps it until replaced.
    ShowText {
        #[serde(default)]
        text: String,
        #[serde(
            default,
            rename = "durationSeconds",
            alias = "duration",
            skip_serializing_if = "Option::is_none"
        )]
        duration_seconds: Option<f64>,
        /// When set, the expiry advances the current playlist instead of falling back to "no data".
        #[serde(
            default,
            rename = "keepPlaylist",
            skip_serializing_if = "std::ops::Not::not"
        )]
        keep_playlist: bool,
    },
    StartPlaylist {
        #[serde(default, alias = "playlist")]
        items: Vec<PlaylistItem>,
        #[serde(default, rename = "loop")]
        looped: bool,
    },
    StopPlaylist,
    OpenUrl {
        #[serde(default)]
        url: String,
    },
}

impl Command {
    pub fn action(&self) -> &'static str {
        match self {
            Command::ShowText { .. } => "showText",
            Command::StartPlaylist { .. } => "startPlaylist",
            Command::StopPlaylist => "stopPlaylist",
            Command::OpenUrl { .. } => "openUrl",
        }
    }

    /// Explicit `showText` expiry; zero, negative, absent or unrepresentable means "stays until replaced".
    pub fn text_expiry(duration_seconds: Option<f64>) -> Option<Duration> {
        duration_seconds
            .filter(|s| s.is_finite() && *s > 0.0)
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
    }
}

/// One playlist entry: what to show and for how long.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistItem {
    #[serde(flatten)]
    pub content: ItemContent,
    #[serde(
        default,
        rename = "durationSeconds",
        alias = "duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_seconds: Option<f64>,
}

impl PlaylistItem {
    pub fn new(content: ItemContent, duration_seconds: Option<f64>) -> Self {
        Self {
            content,
            duration_seconds,
        }
    }

    /// Time the item stays on screen; unset or non-positive falls back to 15 s.
    /// Durations too long to represent saturate at `Duration::MAX`.
    pub fn display_time(&self) -> Duration {
        let secs = self
            .duration_seconds
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(DEFAULT_ITEM_SECONDS);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

/// Content kind of a playlist item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemContent {
    /// Embedded web page.
    Url { url: String },
    Video { url: String },
    Image { url: String },
    Text {
        #[serde(default)]
        text: String,
    },
}

impl ItemContent {
    pub fn kind(&self) -> ContentKind {
        match self {
            ItemContent::Url { .. } => ContentKind::Page,
            ItemContent::Video { .. } => ContentKind::Video,
            ItemContent::Image { .. } => ContentKind::Image,
            ItemContent::Text { .. } => ContentKind::Text,
        }
    }
}

/// The four renderable content kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Page,
    Video,
    Image,
    Text,
}

/// True when `url` is non-empty and uses `http://` or `https://` (scheme case-insensitive).
pub fn is_web_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
