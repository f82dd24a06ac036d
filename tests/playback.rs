//! Playback behaviour of the display machine on a virtual clock.

use display_hub::display::{
    Connectivity, DisplayMachine, DisplayState, ImageSource, Input, LinkEvent, MediaSignal,
    NoopObserver, Notice, RenderId, Sound, Surface, TextStyle, TimerPurpose,
};
use display_hub::models::{Command, ItemContent, PlaylistItem};
use std::time::Duration;

#[derive(Debug, Default)]
struct Recorder {
    shown: Vec<String>,
    plays: Vec<Sound>,
    tap_prompt: Vec<bool>,
}

impl Recorder {
    fn pages(&self) -> usize {
        self.shown.iter().filter(|s| s.starts_with("page:")).count()
    }

    fn last(&self) -> &str {
        self.shown.last().map(String::as_str).unwrap_or("")
    }
}

impl Surface for Recorder {
    fn show_text(&mut self, text: &str, _style: TextStyle) {
        self.shown.push(format!("text:{}", text));
    }
    fn show_page(&mut self, _render: RenderId, url: &str) {
        self.shown.push(format!("page:{}", url));
    }
    fn show_image(&mut self, _render: RenderId, url: &str) {
        self.shown.push(format!("image:{}", url));
    }
    fn show_video(&mut self, _render: RenderId, url: &str) {
        self.shown.push(format!("video:{}", url));
    }
    fn play_video(&mut self, _render: RenderId, sound: Sound) {
        self.plays.push(sound);
    }
    fn set_unmute_control(&mut self, _render: RenderId, _visible: bool) {}
    fn set_tap_prompt(&mut self, _render: RenderId, visible: bool) {
        self.tap_prompt.push(visible);
    }
}

type Machine = DisplayMachine<Recorder, NoopObserver>;

fn secs(s: f64) -> Duration {
    Duration::from_millis((s * 1000.0).round() as u64)
}

/// A machine that has connected at t=0, with the surface log cleared.
fn connected(images: ImageSource) -> Machine {
    let mut m = DisplayMachine::new(Recorder::default(), NoopObserver, images);
    m.start(Duration::ZERO);
    m.handle(Duration::ZERO, Input::Link(LinkEvent::Connected));
    m.surface_mut().shown.clear();
    m
}

fn text(t: &str, duration: Option<f64>) -> PlaylistItem {
    PlaylistItem::new(ItemContent::Text { text: t.into() }, duration)
}

fn playlist(items: Vec<PlaylistItem>, looped: bool) -> Input {
    Input::Command(Command::StartPlaylist { items, looped })
}

fn open_url(url: &str) -> Input {
    Input::Command(Command::OpenUrl { url: url.into() })
}

fn media(m: &Machine, signal: MediaSignal) -> Input {
    Input::Media {
        render: m.current_render(),
        signal,
    }
}

#[test]
fn empty_looping_playlist_shows_no_data() {
    let mut m = connected(ImageSource::direct());
    m.handle(Duration::ZERO, playlist(vec![], true));
    assert_eq!(m.state(), &DisplayState::NoData);
    assert!(m.playback().playlist.is_empty());
    assert_eq!(m.surface().last(), "text:No data");
    assert!(m.timers().pending(TimerPurpose::Advance).is_none());
}

#[test]
fn items_without_duration_stay_fifteen_seconds() {
    let mut m = connected(ImageSource::direct());
    m.handle(Duration::ZERO, playlist(vec![text("A", None), text("B", Some(0.0))], false));
    m.run_until(secs(14.999));
    assert_eq!(m.state(), &DisplayState::PlayingPlaylist { index: 0 });
    m.run_until(secs(15.0));
    assert_eq!(m.state(), &DisplayState::PlayingPlaylist { index: 1 });
    m.run_until(secs(29.999));
    assert_eq!(m.state(), &DisplayState::PlayingPlaylist { index: 1 });
    m.run_until(secs(30.0));
    assert_eq!(m.state(), &DisplayState::NoData);
}

#[test]
fn explicit_duration_is_honoured() {
    let mut m = connected(ImageSource::direct());
    m.handle(Duration::ZERO, playlist(vec![text("A", Some(5.0)), text("B", None)], false));
    m.run_until(secs(4.9));
    assert_eq!(m.surface().last(), "text:A");
    m.run_until(secs(5.0));
    assert_eq!(m.surface().last(), "text:B");
}

#[test]
fn looping_playlist_wraps_around() {
    let mut m = connected(ImageSource::direct());
    m.handle(Duration::ZERO, playlist(vec![text("A", Some(2.0)), text("B", Some(3.0))], true));
    m.run_until(secs(10.0));
    assert_eq!(
        m.surface().shown,
        vec!["text:A", "text:B", "text:A", "text:B", "text:A"]
    );
}

#[test]
fn finite_playlist_ends_in_no_data() {
    let mut m = connected(ImageSource::direct());
    m.handle(Duration::ZERO, playlist(vec![text("A", Some(2.0)), text("B", Some(3.0))], false));
    m.run_until(secs(60.0));
    assert_eq!(m.surface().shown, vec!["text:A", "text:B", "text:No data"]);
    assert_eq!(m.state(), &DisplayState::NoData);
    assert!(m.timers().is_empty());
}

#[test]
fn rejected_urls_leave_playback_and_timers_alone() {
    let mut m = connected(ImageSource::direct());
    m.handle(Duration::ZERO, playlist(vec![text("A", Some(2.0)), text("B", Some(3.0))], true));
    let advance = m.timers().pending(TimerPurpose::Advance);
    let playback = m.playback().clone();

    m.handle(secs(1.0), open_url("ftp://x"));
    assert_eq!(m.state(), &DisplayState::ShowingMessage(Notice::UnsupportedUrl));
    assert_eq!(m.surface().last(), "text:Invalid URL protocol");
    assert_eq!(m.timers().pending(TimerPurpose::Advance), advance);
    assert_eq!(m.playback(), &playback);

    m.handle(secs(1.5), open_url("   "));
    assert_eq!(m.state(), &DisplayState::ShowingMessage(Notice::MissingUrl));
    assert_eq!(m.timers().pending(TimerPurpose::Advance), advance);
    assert_eq!(m.surface().pages(), 0);
}

#[test]
fn valid_url_replaces_playlist_rendering() {
    let mut m = connected(ImageSource::direct());
    m.handle(Duration::ZERO, playlist(vec![text("A", Some(2.0))], true));
    m.handle(secs(1.0), open_url("HTTPS://example.com"));
    assert_eq!(m.state(), &DisplayState::ShowingItem(display_hub::models::ContentKind::Page));
    assert!(m.timers().pending(TimerPurpose::Advance).is_none());

    let signal = media(&m, MediaSignal::Loaded);
    m.handle(secs(2.0), signal);
    m.run_until(secs(60.0));
    assert_eq!(m.surface().pages(), 1);
    assert!(m.timers().is_empty());
}

#[test]
fn unloaded_page_is_retried_once_then_fails() {
    let mut m = connected(ImageSource::direct());
    m.handle(Duration::ZERO, open_url("https://slow.example"));
    assert_eq!(m.surface().pages(), 1);

    m.run_until(secs(5.199));
    assert_eq!(m.surface().pages(), 1);
    m.run_until(secs(5.2));
    assert_eq!(m.surface().pages(), 2);

    m.run_until(secs(10.2));
    assert_eq!(m.state(), &DisplayState::ShowingMessage(Notice::PageLoadFailed));

    m.run_until(secs(120.0));
    assert_eq!(m.surface().pages(), 2);
    assert!(m.timers().is_empty());
}

#[test]
fn disconnect_halts_playlist_until_next_command() {
    let mut m = connected(ImageSource::direct());
    m.handle(Duration::ZERO, playlist(vec![text("A", Some(2.0)), text("B", Some(3.0))], true));
    m.handle(secs(1.0), Input::Link(LinkEvent::Disconnected));

    assert_eq!(m.connectivity(), Connectivity::Disconnected);
    assert_eq!(m.state(), &DisplayState::ShowingMessage(Notice::NoConnection));
    assert!(m.timers().pending(TimerPurpose::Advance).is_none());
    assert_eq!(m.playback().playlist.len(), 2);

    m.run_until(secs(30.0));
    assert_eq!(m.surface().last(), "text:No connection to server");

    m.handle(secs(30.0), Input::Command(Command::StopPlaylist));
    assert_eq!(m.state(), &DisplayState::NoData);
    assert!(m.playback().playlist.is_empty());
    assert!(m.timers().is_empty());
}

#[test]
fn unresolved_first_connect_times_out_after_four_seconds() {
    let mut m = DisplayMachine::new(Recorder::default(), NoopObserver, ImageSource::direct());
    m.start(Duration::ZERO);
    m.run_until(secs(3.999));
    assert_eq!(m.state(), &DisplayState::NoData);
    assert!(m.surface().shown.is_empty());

    m.run_until(secs(4.0));
    assert_eq!(m.state(), &DisplayState::ShowingMessage(Notice::NoConnection));
}

#[test]
fn connecting_in_time_disarms_the_timeout() {
    let mut m = DisplayMachine::new(Recorder::default(), NoopObserver, ImageSource::direct());
    m.start(Duration::ZERO);
    m.handle(secs(3.0), Input::Link(LinkEvent::Connected));
    m.run_until(secs(10.0));
    assert_eq!(m.state(), &DisplayState::NoData);
    assert_eq!(m.connectivity(), Connectivity::Connected);
    assert_eq!(m.surface().shown, vec!["text:No data"]);
}

#[test]
fn text_with_keep_playlist_resumes_at_next_item() {
    let mut m = connected(ImageSource::direct());
    m.handle(Duration::ZERO, playlist(vec![text("A", Some(10.0)), text("B", Some(10.0))], false));
    m.handle(
        secs(3.0),
        Input::Command(Command::ShowText {
            text: "Break".into(),
            duration_seconds: Some(2.0),
            keep_playlist: true,
        }),
    );
    assert_eq!(m.surface().last(), "text:Break");
    assert_eq!(m.playback().playlist.len(), 2);

    m.run_until(secs(5.0));
    assert_eq!(m.state(), &DisplayState::PlayingPlaylist { index: 1 });
    assert_eq!(m.surface().last(), "text:B");
}

#[test]
fn text_without_keep_playlist_drops_it() {
    let mut m = connected(ImageSource::direct());
    m.handle(Duration::ZERO, playlist(vec![text("A", Some(10.0)), text("B", Some(10.0))], true));
    m.handle(
        secs(3.0),
        Input::Command(Command::ShowText {
            text: "Break".into(),
            duration_seconds: Some(2.0),
            keep_playlist: false,
        }),
    );
    assert!(m.playback().playlist.is_empty());
    m.run_until(secs(5.0));
    assert_eq!(m.state(), &DisplayState::NoData);
    m.run_until(secs(60.0));
    assert_eq!(m.surface().last(), "text:No data");
}

#[test]
fn blocked_autoplay_waits_for_a_single_tap() {
    let mut m = connected(ImageSource::direct());
    let clip = PlaylistItem::new(ItemContent::Video { url: "https://cdn/clip.mp4".into() }, Some(30.0));
    m.handle(Duration::ZERO, playlist(vec![clip], false));
    assert_eq!(m.surface().plays, vec![Sound::Audible]);

    let rejected = media(&m, MediaSignal::PlayRejected);
    m.handle(secs(0.1), rejected.clone());
    assert_eq!(m.surface().plays, vec![Sound::Audible, Sound::Muted]);
    m.handle(secs(0.2), rejected);
    assert_eq!(m.surface().tap_prompt, vec![true]);

    m.handle(secs(1.0), Input::Pointer);
    assert_eq!(m.surface().tap_prompt, vec![true, false]);
    assert_eq!(m.surface().plays.len(), 3);

    m.handle(secs(1.5), Input::Pointer);
    assert_eq!(m.surface().plays.len(), 3);
    assert_eq!(m.state(), &DisplayState::PlayingPlaylist { index: 0 });
}

#[test]
fn plain_http_images_go_through_relay_on_secure_origin() {
    let mut m = connected(ImageSource::relayed("https://hub:3002/relay"));
    let items = vec![
        PlaylistItem::new(ItemContent::Image { url: "http://cdn/a.png".into() }, Some(1.0)),
        PlaylistItem::new(ItemContent::Image { url: "https://cdn/b.png".into() }, Some(1.0)),
    ];
    m.handle(Duration::ZERO, playlist(items, false));
    m.run_until(secs(1.0));
    assert_eq!(
        m.surface().shown,
        vec![
            "image:https://hub:3002/relay?url=http%3A%2F%2Fcdn%2Fa.png",
            "image:https://cdn/b.png",
        ]
    );
}

#[test]
fn same_inputs_render_the_same_sequence() {
    let run = || {
        let mut m = connected(ImageSource::direct());
        m.handle(Duration::ZERO, playlist(vec![text("A", Some(2.0)), text("B", Some(3.0))], true));
        m.handle(secs(4.0), open_url("ftp://nope"));
        m.handle(secs(6.0), Input::Link(LinkEvent::Disconnected));
        m.handle(secs(7.0), Input::Link(LinkEvent::Connected));
        m.handle(secs(8.0), playlist(vec![text("C", None)], false));
        m.run_until(secs(40.0));
        m.surface().shown.clone()
    };
    assert_eq!(run(), run());
}

#[test]
fn oversized_durations_keep_content_on_screen() {
    let mut m = connected(ImageSource::direct());
    let text: Command =
        serde_json::from_str(r#"{"action":"showText","text":"A","durationSeconds":1e30}"#).unwrap();
    m.handle(Duration::ZERO, Input::Command(text));
    assert_eq!(m.surface().last(), "text:A");
    assert!(m.timers().pending(TimerPurpose::Advance).is_none());

    let list: Command = serde_json::from_str(
        r#"{"action":"startPlaylist","loop":true,"items":[
            {"type":"text","text":"B","durationSeconds":1e30},
            {"type":"text","text":"C","durationSeconds":1e18}
        ]}"#,
    )
    .unwrap();
    m.handle(secs(1.0), Input::Command(list));
    m.run_until(secs(86_400.0));
    assert_eq!(m.state(), &DisplayState::PlayingPlaylist { index: 0 });
    assert_eq!(m.surface().last(), "text:B");
    assert!(m.timers().pending(TimerPurpose::Advance).is_none());
}
