use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use paper_feed::{
    api::{create_router, AppState},
    config::Config,
    db::{create_redis_client, KeyValueStore, MemoryStore, RedisStore},
    services::PaperApiClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();

    // Session storage: redis when configured, otherwise process memory
    let backend: Arc<dyn KeyValueStore> = match &config.redis_url {
        Some(redis_url) => {
            let client = create_redis_client(redis_url)?;
            let store = RedisStore::new(client).await?;
            tracing::info!("Session history stored in Redis");
            Arc::new(store)
        }
        None => {
            tracing::warn!("REDIS_URL not set, session history will not survive restarts");
            Arc::new(MemoryStore::new())
        }
    };

    let source = Arc::new(PaperApiClient::new(&config)?);
    let state = AppState::new(
        source,
        backend,
        config.queue_settings(),
        config.lock_duration(),
    );

    // History must be loaded before the first request can touch it
    state.queue().start().await;

    let app = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        upstream = %config.paper_api_url,
        "Paper feed running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.queue().settle().await;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("paper_feed=info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
