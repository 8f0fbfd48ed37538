use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use shopify_install::shopify::{ApiVersion, ShopifyClient};
use shopify_install::{api, AppState, Config, SharedState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shopify_install=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    info!("shopify-install v{}", env!("CARGO_PKG_VERSION"));
    info!("Listening on {}:{}", config.host, config.port);

    // Requests are still served with a bad version so /shopify_install can answer 503.
    if let Err(e) = ApiVersion::parse(&config.api_version) {
        warn!("{e}; installs will be refused until SHOPIFY_API_VERSION is fixed");
    }

    let client = ShopifyClient::new(config.api_key.clone(), config.api_secret.clone());
    let state: SharedState = Arc::new(AppState::new(config.clone(), Box::new(client))?);

    match state.store.is_installed().await {
        Ok(true) => info!("Access token present at {}", state.store.path().display()),
        Ok(false) => info!("No access token yet; waiting for install"),
        Err(e) => warn!("Could not read token file: {e}"),
    }

    let app = api::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server ready ✓");
    axum::serve(listener, app).await?;

    Ok(())
}
