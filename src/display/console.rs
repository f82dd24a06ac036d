//! Headless surface: logs what would be on screen and probes media over HTTP.
//!
//! Pages report `Loaded` once they answer with a non-error status, images
//! report `Error` when they cannot be fetched, and videos always start
//! audibly since there is no autoplay policy to negotiate with.

use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::machine::{Input, MediaSignal};
use super::surface::{RenderId, Sound, Surface, TextStyle};

pub struct ConsoleSurface {
    feedback: mpsc::UnboundedSender<Input>,
    client: reqwest::Client,
}

impl ConsoleSurface {
    pub fn new(feedback: mpsc::UnboundedSender<Input>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { feedback, client })
    }

    /// Fetch `url` in the background and report `on_ok` / `on_err` for this render.
    fn probe(&self, render: RenderId, url: &str, on_ok: Option<MediaSignal>, on_err: Option<MediaSignal>) {
        let client = self.client.clone();
        let feedback = self.feedback.clone();
        let url = url.to_string();
        tokio::spawn(async move {
            let ok = match client.get(&url).send().await {
                Ok(res) => res.status().as_u16() < 400,
                Err(e) => {
                    debug!(url = %url, error = %e, "media probe failed");
                    false
                }
            };
            if let Some(signal) = if ok { on_ok } else { on_err } {
                let _ = feedback.send(Input::Media { render, signal });
            }
        });
    }
}

impl Surface for ConsoleSurface {
    fn show_text(&mut self, text: &str, style: TextStyle) {
        info!(?style, "screen: {}", text);
    }

    fn show_page(&mut self, render: RenderId, url: &str) {
        info!(render = render.0, "screen: page {}", url);
        self.probe(render, url, Some(MediaSignal::Loaded), None);
    }

    fn show_image(&mut self, render: RenderId, url: &str) {
        info!(render = render.0, "screen: image {}", url);
        self.probe(render, url, None, Some(MediaSignal::Error));
    }

    fn show_video(&mut self, render: RenderId, url: &str) {
        info!(render = render.0, "screen: video {}", url);
        self.probe(render, url, None, Some(MediaSignal::Error));
    }

    fn play_video(&mut self, render: RenderId, sound: Sound) {
        debug!(render = render.0, ?sound, "video play");
        let _ = self.feedback.send(Input::Media {
            render,
            signal: MediaSignal::Playing,
        });
    }

    fn set_unmute_control(&mut self, render: RenderId, visible: bool) {
        debug!(render = render.0, visible, "unmute control");
    }

    fn set_tap_prompt(&mut self, render: RenderId, visible: bool) {
        debug!(render = render.0, visible, "tap prompt");
    }
}
