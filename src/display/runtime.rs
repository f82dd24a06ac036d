//! Drives a display machine from the server socket, surface feedback and real time.

use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::models::{Command, ServerMessage};

use super::machine::{DisplayMachine, Input, LinkEvent};
use super::observer::TransitionObserver;
use super::surface::Surface;

/// Reachability probe timeout at start-up.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// What the server connection reports, in delivery order.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Link(LinkEvent),
    Command(Command),
}

/// HEAD the origin once; any status below 500 counts as reachable. Never fails.
pub async fn probe_server(origin: &str) -> bool {
    let client = match reqwest::Client::builder().timeout(PROBE_TIMEOUT).build() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "probe client");
            return false;
        }
    };
    match client.head(origin).send().await {
        Ok(res) => res.status().as_u16() < 500,
        Err(e) => {
            debug!(origin = %origin, error = %e, "probe failed");
            false
        }
    }
}

/// Keep a socket to `ws_url` open forever, reconnecting after `reconnect_delay`.
/// Stops once the receiver is dropped.
pub fn spawn_feed(
    ws_url: String,
    reconnect_delay: Duration,
) -> (mpsc::UnboundedReceiver<FeedEvent>, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(feed_loop(ws_url, reconnect_delay, tx));
    (rx, handle)
}

async fn feed_loop(ws_url: String, reconnect_delay: Duration, tx: mpsc::UnboundedSender<FeedEvent>) {
    loop {
        match connect_async(ws_url.as_str()).await {
            Ok((stream, _)) => {
                info!(url = %ws_url, "connected");
                if tx.send(FeedEvent::Link(LinkEvent::Connected)).is_err() {
                    return;
                }
                let (_sink, mut read) = stream.split();
                while let Some(frame) = read.next().await {
                    let text = match frame {
                        Ok(Message::Text(text)) => text,
                        Ok(Message::Close(_)) => break,
                        Ok(_) => continue,
                        Err(e) => {
                            warn!(error = %e, "socket error");
                            break;
                        }
                    };
                    match serde_json::from_str::<ServerMessage>(&text) {
                        Ok(ServerMessage::Command(command)) => {
                            if tx.send(FeedEvent::Command(command)).is_err() {
                                return;
                            }
                        }
                        Ok(ServerMessage::ConnectionEstablished { session_id }) => {
                            info!(session_id = %session_id, "session established");
                        }
                        Ok(_) => {}
                        Err(e) => debug!(error = %e, "ignored frame"),
                    }
                }
                info!("disconnected");
                if tx.send(FeedEvent::Link(LinkEvent::Disconnected)).is_err() {
                    return;
                }
            }
            Err(e) => {
                warn!(url = %ws_url, error = %e, "connect failed");
                if tx.send(FeedEvent::Link(LinkEvent::ConnectFailed)).is_err() {
                    return;
                }
            }
        }
        tokio::time::sleep(reconnect_delay).await;
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Process feed events and surface feedback in arrival order, firing timers as they come due.
/// Returns when the feed closes.
pub async fn run<S, O>(
    machine: &mut DisplayMachine<S, O>,
    mut feed: mpsc::UnboundedReceiver<FeedEvent>,
    mut feedback: mpsc::UnboundedReceiver<Input>,
) where
    S: Surface,
    O: TransitionObserver,
{
    let start = Instant::now();
    machine.start(Duration::ZERO);
    loop {
        // Deadlines beyond what the clock can represent never fire.
        let deadline = machine.next_deadline().and_then(|offset| start.checked_add(offset));
        tokio::select! {
            event = feed.recv() => match event {
                Some(FeedEvent::Command(command)) => machine.handle(start.elapsed(), Input::Command(command)),
                Some(FeedEvent::Link(link)) => machine.handle(start.elapsed(), Input::Link(link)),
                None => break,
            },
            Some(input) = feedback.recv() => machine.handle(start.elapsed(), input),
            _ = sleep_until(deadline) => machine.run_until(start.elapsed()),
        }
    }
}
