use std::sync::Arc;

use deck_server::auth::AuthService;
use deck_server::config::ServerConfig;
use deck_server::mailer::LogMailer;
use deck_server::AppState;
use ptcg_deckbuilder::DeckBuilder;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "deck_server=info,ptcg_deckbuilder=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::load()?;

    let mut builder = DeckBuilder::builder().offline(config.offline);
    if let Some(path) = &config.database {
        builder = builder.database(path);
    }
    if let Some(dir) = &config.cache_dir {
        builder = builder.cache_dir(dir);
    }
    if let Some(key) = &config.api_key {
        builder = builder.api_key(key.clone());
    }
    let sdk = builder.build_async().await?;
    tracing::info!("store ready");

    // Serve immediately; prices resolve to zero until the catalog lands.
    let refresher = sdk.clone();
    tokio::spawn(async move {
        if let Err(e) = refresher.refresh_catalog().await {
            tracing::error!("catalog load failed: {}", e);
        }
    });

    let state = Arc::new(AppState {
        sdk,
        auth: Arc::new(AuthService::new(
            config.jwt_secret.clone(),
            config.jwt_expiration_hours,
        )),
        mailer: Arc::new(LogMailer),
        base_url: config.base_url.clone(),
    });

    let addr = config.socket_addr()?;
    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, deck_server::app(state)).await?;
    Ok(())
}
