//! Rendering seam between the state machine and whatever draws the screen.

use regex::Regex;
use std::sync::OnceLock;

/// Identity of one rendered piece of content; media signals carry it so stale ones are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RenderId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    Audible,
    Muted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    /// Operator text from `showText` or a text item.
    Headline,
    /// Neutral status message.
    Notice,
    /// Error or "nothing to show" message: larger and bolder.
    Alert,
}

fn alert_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(error|no|failed|invalid|missing)\b").expect("static pattern")
    })
}

impl TextStyle {
    /// Style for a status message, emphasised when it reads as an error or an empty state.
    pub fn for_message(text: &str) -> Self {
        if alert_pattern().is_match(text) {
            TextStyle::Alert
        } else {
            TextStyle::Notice
        }
    }
}

/// Fallback messages the display can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    NoData,
    NoConnection,
    MissingUrl,
    UnsupportedUrl,
    PageLoadFailed,
    VideoFailed,
    ImageFailed,
    PlaybackFailed,
}

impl Notice {
    pub fn text(&self) -> &'static str {
        match self {
            Notice::NoData => "No data",
            Notice::NoConnection => "No connection to server",
            Notice::MissingUrl => "No URL given",
            Notice::UnsupportedUrl => "Invalid URL protocol",
            Notice::PageLoadFailed => "Error loading page (blocked framing or network problem)",
            Notice::VideoFailed => "Error playing video. Check the URL or file format.",
            Notice::ImageFailed => "Error loading image. Check the URL.",
            Notice::PlaybackFailed => "Playback failed",
        }
    }
}

/// Everything drawn on the display goes through here. Each `show_*` replaces the
/// whole surface; load and playback outcomes come back as `Input::Media`.
pub trait Surface {
    fn show_text(&mut self, text: &str, style: TextStyle);
    fn show_page(&mut self, render: RenderId, url: &str);
    fn show_image(&mut self, render: RenderId, url: &str);
    fn show_video(&mut self, render: RenderId, url: &str);
    fn play_video(&mut self, render: RenderId, sound: Sound);
    fn set_unmute_control(&mut self, render: RenderId, visible: bool);
    fn set_tap_prompt(&mut self, render: RenderId, visible: bool);
}

/// Where images are loaded from. Plain-http images behind an https origin go through the relay.
#[derive(Debug, Clone, Default)]
pub struct ImageSource {
    /// `Some(base)` when the display's origin is encrypted; `base` is the relay endpoint.
    relay_base: Option<String>,
}

impl ImageSource {
    pub fn direct() -> Self {
        Self { relay_base: None }
    }

    pub fn relayed(relay_base: impl Into<String>) -> Self {
        Self {
            relay_base: Some(relay_base.into()),
        }
    }

    pub fn resolve(&self, url: &str) -> String {
        match &self.relay_base {
            Some(base) if url.get(..7).is_some_and(|p| p.eq_ignore_ascii_case("http://")) => {
                format!("{}?url={}", base, urlencoding::encode(url))
            }
            _ => url.to_string(),
        }
    }
}
