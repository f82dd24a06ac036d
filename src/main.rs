//! Entry point: load config, wire dependencies, and run the distribution server.

use display_hub::auth::{AccountService, TokenVerifier};
use display_hub::config::Config;
use display_hub::services::RelayService;
use display_hub::{create_app, AppState};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let verifier = TokenVerifier::new(config.jwt_secret.clone());
    let accounts = AccountService::new(config.admin_username.clone(), &config.admin_password)
        .map_err(|e| anyhow::anyhow!("operator account: {}", e))?;
    let relay = RelayService::new(config.relay_max_bytes, config.relay_timeout)
        .map_err(|e| anyhow::anyhow!("relay client: {}", e))?;

    let state = AppState::new(
        verifier,
        accounts,
        relay,
        config.policy,
        config.server_url.clone(),
    );

    let app = create_app(state)
        // Display pages and controller assets
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(TraceLayer::new_for_http());

    tracing::info!(
        addr = %config.server_addr,
        status_requires_token = config.policy.status_requires_token,
        displays_require_token = config.policy.displays_require_token,
        "listening"
    );
    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
