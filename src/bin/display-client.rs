//! Headless display: connect to the distribution server and play its commands.

use display_hub::display::console::ConsoleSurface;
use display_hub::display::runtime::{probe_server, run, spawn_feed};
use display_hub::display::{DisplayConfig, DisplayMachine, TracingObserver};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = DisplayConfig::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Start regardless of the answer; the machine shows "no connection" if needed.
    let reachable = probe_server(config.server_url.as_str()).await;
    tracing::info!(origin = %config.server_url, reachable, "server probe");

    let (feedback_tx, feedback_rx) = mpsc::unbounded_channel();
    let surface = ConsoleSurface::new(feedback_tx)?;
    let mut machine = DisplayMachine::new(surface, TracingObserver, config.image_source());

    let (feed, feed_task) = spawn_feed(config.ws_url(), config.reconnect_delay);
    run(&mut machine, feed, feedback_rx).await;
    feed_task.abort();
    Ok(())
}
