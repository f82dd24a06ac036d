//! Display state machine.
//!
//! Inputs are commands, connectivity events, media signals and pointer
//! interactions; the only other driver is the machine's own timer table.
//! Time is passed in explicitly as an offset from start, so the same
//! sequence of inputs always produces the same sequence of renders.

use std::time::Duration;

use crate::models::{is_web_url, Command, ContentKind, ItemContent, PlaylistItem};

use super::observer::{Cause, TracingObserver, TransitionObserver};
use super::surface::{ImageSource, Notice, RenderId, Surface, TextStyle};
use super::timers::{TimerAction, TimerPurpose, TimerTable};
use super::video::{VideoNegotiation, VideoStep};

/// Deadline for an embedded page to report a successful load.
pub const PAGE_LOAD_DEADLINE: Duration = Duration::from_secs(5);
/// Pause before the single page reload.
pub const PAGE_RETRY_DELAY: Duration = Duration::from_millis(200);
/// Loads attempted per page before giving up.
pub const PAGE_MAX_ATTEMPTS: u8 = 2;
/// How long the first connection attempt may stay unresolved.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayState {
    /// Default "no data" message.
    NoData,
    ShowingMessage(Notice),
    /// Content outside a playlist: `showText` or `openUrl`.
    ShowingItem(ContentKind),
    PlayingPlaylist { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Connecting,
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    Connected,
    ConnectFailed,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSignal {
    /// Embedded page finished loading.
    Loaded,
    /// Video playback started with the requested sound setting.
    Playing,
    /// The platform refused to start playback.
    PlayRejected,
    /// Media unreachable or undecodable.
    Error,
    /// Viewer pressed the "enable sound" control.
    UnmuteRequested,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Command(Command),
    Link(LinkEvent),
    Media { render: RenderId, signal: MediaSignal },
    /// Any pointer interaction on the display.
    Pointer,
}

/// Current playlist, position and loop flag. The advance timer lives in the timer table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackState {
    pub playlist: Vec<PlaylistItem>,
    pub index: usize,
    pub looped: bool,
}

impl PlaybackState {
    fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Media {
    None,
    Page { url: String, attempt: u8, loaded: bool },
    Image,
    Video(VideoNegotiation),
}

pub struct DisplayMachine<S: Surface, O: TransitionObserver = TracingObserver> {
    surface: S,
    observer: O,
    images: ImageSource,
    now: Duration,
    cause: Cause,
    state: DisplayState,
    link: Connectivity,
    playback: PlaybackState,
    timers: TimerTable,
    render: RenderId,
    media: Media,
}

impl<S: Surface, O: TransitionObserver> DisplayMachine<S, O> {
    pub fn new(surface: S, observer: O, images: ImageSource) -> Self {
        Self {
            surface,
            observer,
            images,
            now: Duration::ZERO,
            cause: Cause::Start,
            state: DisplayState::NoData,
            link: Connectivity::Connecting,
            playback: PlaybackState::default(),
            timers: TimerTable::new(),
            render: RenderId::default(),
            media: Media::None,
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn connectivity(&self) -> Connectivity {
        self.link
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    pub fn timers(&self) -> &TimerTable {
        &self.timers
    }

    pub fn current_render(&self) -> RenderId {
        self.render
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Earliest pending timer, as an offset from start.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_due()
    }

    /// First connection attempt begins: arm the connect timeout.
    pub fn start(&mut self, now: Duration) {
        self.run_until(now);
        self.cause = Cause::Start;
        self.set_link(Connectivity::Connecting);
        self.arm(TimerPurpose::Connect, CONNECT_TIMEOUT, TimerAction::ConnectTimeout);
    }

    /// Fire every timer due at or before `now`, each at its own due time.
    pub fn run_until(&mut self, now: Duration) {
        while let Some((due, _purpose, action)) = self.timers.pop_due(now) {
            self.now = self.now.max(due);
            self.cause = Cause::Timer(action);
            self.fire(action);
        }
        self.now = self.now.max(now);
    }

    /// Apply one input at `now`, after any timers that were already due.
    pub fn handle(&mut self, now: Duration, input: Input) {
        self.run_until(now);
        match input {
            Input::Command(command) => {
                self.cause = Cause::Command(command.action());
                self.apply_command(command);
            }
            Input::Link(event) => {
                self.cause = Cause::Link(event);
                self.apply_link(event);
            }
            Input::Media { render, signal } => {
                if render != self.render {
                    return;
                }
                self.cause = Cause::Media;
                self.apply_media(signal);
            }
            Input::Pointer => {
                self.cause = Cause::Media;
                if let Media::Video(negotiation) = &mut self.media {
                    let steps = negotiation.on_pointer();
                    self.apply_video_steps(steps);
                }
            }
        }
    }

    fn apply_command(&mut self, command: Command) {
        match command {
            Command::ShowText {
                text,
                duration_seconds,
                keep_playlist,
            } => self.show_custom_text(&text, Command::text_expiry(duration_seconds), keep_playlist),
            Command::StartPlaylist { items, looped } => {
                self.timers.cancel(TimerPurpose::Advance);
                if items.is_empty() {
                    self.enter_no_data();
                    return;
                }
                self.playback = PlaybackState {
                    playlist: items,
                    index: 0,
                    looped,
                };
                self.play_current();
            }
            Command::StopPlaylist => self.enter_no_data(),
            Command::OpenUrl { url } => {
                let url = url.trim();
                if url.is_empty() {
                    self.reject(Notice::MissingUrl);
                } else if !is_web_url(url) {
                    self.reject(Notice::UnsupportedUrl);
                } else {
                    self.timers.cancel(TimerPurpose::Advance);
                    self.load_page(url.to_string(), 1);
                    self.set_state(DisplayState::ShowingItem(ContentKind::Page));
                }
            }
        }
    }

    fn apply_link(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Connected => {
                self.timers.cancel(TimerPurpose::Connect);
                self.set_link(Connectivity::Connected);
                // Nothing playing: show the default message until the resync arrives.
                if matches!(
                    self.state,
                    DisplayState::NoData | DisplayState::ShowingMessage(_)
                ) {
                    self.paint_notice(Notice::NoData);
                    self.set_state(DisplayState::NoData);
                }
            }
            LinkEvent::ConnectFailed => {
                self.timers.cancel(TimerPurpose::Connect);
                self.set_link(Connectivity::Disconnected);
                self.show_no_connection();
            }
            LinkEvent::Disconnected => {
                self.set_link(Connectivity::Disconnected);
                self.show_no_connection();
            }
        }
    }

    fn apply_media(&mut self, signal: MediaSignal) {
        match (&mut self.media, signal) {
            (Media::Page { loaded, .. }, MediaSignal::Loaded) => {
                *loaded = true;
                self.timers.cancel(TimerPurpose::PageLoad);
            }
            (Media::Image, MediaSignal::Error) => self.media_failed(Notice::ImageFailed),
            (Media::Video(_), MediaSignal::Error) => self.media_failed(Notice::VideoFailed),
            (Media::Video(negotiation), MediaSignal::Playing) => {
                let steps = negotiation.on_playing();
                self.apply_video_steps(steps);
            }
            (Media::Video(negotiation), MediaSignal::PlayRejected) => {
                let steps = negotiation.on_rejected();
                self.apply_video_steps(steps);
            }
            (Media::Video(negotiation), MediaSignal::UnmuteRequested) => {
                let steps = negotiation.on_unmute_request();
                self.apply_video_steps(steps);
            }
            _ => {}
        }
    }

    fn fire(&mut self, action: TimerAction) {
        match action {
            TimerAction::NextItem => self.advance(),
            TimerAction::ShowNoData => self.enter_no_data(),
            TimerAction::PageDeadline => {
                if let Media::Page { attempt, loaded: false, .. } = self.media {
                    if attempt < PAGE_MAX_ATTEMPTS {
                        self.arm(TimerPurpose::PageLoad, PAGE_RETRY_DELAY, TimerAction::ReloadPage);
                    } else {
                        self.media_failed(Notice::PageLoadFailed);
                    }
                }
            }
            TimerAction::ReloadPage => {
                if let Media::Page { url, attempt, .. } = &self.media {
                    let (url, attempt) = (url.clone(), *attempt + 1);
                    self.load_page(url, attempt);
                }
            }
            TimerAction::ConnectTimeout => {
                if self.link == Connectivity::Connecting {
                    self.show_no_connection();
                }
            }
        }
    }

    fn show_custom_text(&mut self, text: &str, expiry: Option<Duration>, keep_playlist: bool) {
        self.timers.cancel(TimerPurpose::Advance);
        if !keep_playlist {
            self.playback.clear();
        }
        self.begin_render();
        self.surface.show_text(text, TextStyle::Headline);
        self.set_state(DisplayState::ShowingItem(ContentKind::Text));
        if let Some(after) = expiry {
            let action = if keep_playlist {
                TimerAction::NextItem
            } else {
                TimerAction::ShowNoData
            };
            self.arm(TimerPurpose::Advance, after, action);
        }
    }

    /// Render the item at the current index and arm its advance.
    fn play_current(&mut self) {
        let Some(item) = self.playback.playlist.get(self.playback.index).cloned() else {
            self.enter_no_data();
            return;
        };
        self.render_content(&item.content);
        self.arm(TimerPurpose::Advance, item.display_time(), TimerAction::NextItem);
        self.set_state(DisplayState::PlayingPlaylist {
            index: self.playback.index,
        });
    }

    fn advance(&mut self) {
        let next = self.playback.index + 1;
        if next < self.playback.playlist.len() {
            self.playback.index = next;
        } else if self.playback.looped && !self.playback.playlist.is_empty() {
            self.playback.index = 0;
        } else {
            self.enter_no_data();
            return;
        }
        self.play_current();
    }

    fn render_content(&mut self, content: &ItemContent) {
        match content {
            ItemContent::Url { url } => self.load_page(url.clone(), 1),
            ItemContent::Video { url } => {
                let render = self.begin_render();
                self.surface.show_video(render, url);
                let (negotiation, steps) = VideoNegotiation::start();
                self.media = Media::Video(negotiation);
                self.apply_video_steps(steps);
            }
            ItemContent::Image { url } => {
                let render = self.begin_render();
                let source = self.images.resolve(url);
                self.surface.show_image(render, &source);
                self.media = Media::Image;
            }
            ItemContent::Text { text } => {
                self.begin_render();
                self.surface.show_text(text, TextStyle::Headline);
            }
        }
    }

    fn load_page(&mut self, url: String, attempt: u8) {
        let render = self.begin_render();
        self.surface.show_page(render, &url);
        self.media = Media::Page {
            url,
            attempt,
            loaded: false,
        };
        self.arm(TimerPurpose::PageLoad, PAGE_LOAD_DEADLINE, TimerAction::PageDeadline);
    }

    /// Schedule `action` after `delay`. A deadline past the end of the clock never fires.
    fn arm(&mut self, purpose: TimerPurpose, delay: Duration, action: TimerAction) {
        match self.now.checked_add(delay) {
            Some(due) => {
                self.timers.schedule(purpose, due, action);
            }
            None => {
                self.timers.cancel(purpose);
            }
        }
    }

    fn apply_video_steps(&mut self, steps: Vec<VideoStep>) {
        let render = self.render;
        for step in steps {
            match step {
                VideoStep::Play(sound) => self.surface.play_video(render, sound),
                VideoStep::UnmuteControl(visible) => self.surface.set_unmute_control(render, visible),
                VideoStep::TapPrompt(visible) => self.surface.set_tap_prompt(render, visible),
                VideoStep::Fail => {
                    self.media_failed(Notice::PlaybackFailed);
                    return;
                }
            }
        }
    }

    /// New content replaces the old: drop its media tracking and any page deadline.
    fn begin_render(&mut self) -> RenderId {
        self.timers.cancel(TimerPurpose::PageLoad);
        self.media = Media::None;
        self.render = RenderId(self.render.0 + 1);
        self.render
    }

    fn paint_notice(&mut self, notice: Notice) {
        self.begin_render();
        self.surface
            .show_text(notice.text(), TextStyle::for_message(notice.text()));
        self.observer.on_notice(notice, self.cause);
    }

    /// Stop playback, forget the playlist, show the default message.
    fn enter_no_data(&mut self) {
        self.timers.cancel(TimerPurpose::Advance);
        self.playback.clear();
        self.paint_notice(Notice::NoData);
        self.set_state(DisplayState::NoData);
    }

    /// Halt anything scheduled but keep the playlist in memory; only a command restarts playback.
    fn show_no_connection(&mut self) {
        self.timers.cancel(TimerPurpose::Advance);
        self.paint_notice(Notice::NoConnection);
        self.set_state(DisplayState::ShowingMessage(Notice::NoConnection));
    }

    /// Inside a playlist the failure stays on screen until the item's advance fires.
    fn media_failed(&mut self, notice: Notice) {
        self.paint_notice(notice);
        if !matches!(self.state, DisplayState::PlayingPlaylist { .. }) {
            self.set_state(DisplayState::ShowingMessage(notice));
        }
    }

    /// Show a rejection without touching timers, media tracking or playback.
    fn reject(&mut self, notice: Notice) {
        self.surface
            .show_text(notice.text(), TextStyle::for_message(notice.text()));
        self.observer.on_notice(notice, self.cause);
        self.set_state(DisplayState::ShowingMessage(notice));
    }

    fn set_state(&mut self, next: DisplayState) {
        self.observer.on_transition(&self.state, &next, self.cause);
        self.state = next;
    }

    fn set_link(&mut self, next: Connectivity) {
        if self.link != next {
            self.observer.on_connectivity(self.link, next);
            self.link = next;
        }
    }
}
