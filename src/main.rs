mod config;
mod models;
mod routes;
mod services;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::models::BotStatus;
use crate::services::{
    start_cleanup_task, AggregateStore, CleanupConfig, KvStore, MemoryKvStore, Messenger,
    MovieProcessor, MovieRepository, NoPosterSource, PosterSource, Publisher, RedisKvStore,
    TelegramClient, TmdbPosterSource, UpdatePoller,
};

/// Application state shared across handlers
pub struct AppState {
    pub processor: Arc<MovieProcessor>,
    pub status: Arc<BotStatus>,
    pub start_time: Instant,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movie_update_bot=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let port = config.port;

    tracing::info!("Starting Movie Update Bot v{}", env!("CARGO_PKG_VERSION"));

    // Telegram client
    let client = Arc::new(TelegramClient::new(
        &config.telegram_api_url,
        &config.bot_token,
        config.http_timeout_secs,
    )?);

    let bot_username = match config.bot_username.clone() {
        Some(name) => name,
        None => {
            let me = client.get_me().await?;
            me.username
                .ok_or_else(|| anyhow::anyhow!("bot account has no username"))?
        }
    };
    tracing::info!("Bot identity: @{}", bot_username);

    // Persistent store
    let kv: Arc<dyn KvStore> = match config.redis_url.as_deref() {
        Some(url) => {
            let redis = RedisKvStore::new(url).await?;
            tracing::info!("Redis connected");
            Arc::new(redis)
        }
        None => {
            tracing::warn!("REDIS_URL not set, titles will not survive a restart");
            Arc::new(MemoryKvStore::new())
        }
    };
    let repository = MovieRepository::new(kv);

    // Poster lookup
    let posters: Arc<dyn PosterSource> = match config.tmdb_api_key.as_deref() {
        Some(key) => {
            tracing::info!("TMDB poster lookup enabled");
            Arc::new(TmdbPosterSource::new(
                key,
                &config.tmdb_api_url,
                &config.tmdb_image_url,
                config.http_timeout_secs,
            )?)
        }
        None => {
            tracing::info!("TMDB_API_KEY not set, posts will be text-only");
            Arc::new(NoPosterSource)
        }
    };

    // Pipeline
    let store = Arc::new(AggregateStore::new());
    let messenger: Arc<dyn Messenger> = client.clone();
    let publisher = Arc::new(Publisher::new(
        store.clone(),
        repository.clone(),
        messenger,
        posters,
        config.update_channel_id,
        bot_username.clone(),
    ));
    let processor = Arc::new(MovieProcessor::new(
        store,
        repository,
        publisher,
        Duration::from_secs(config.debounce_secs),
    ));

    if let Err(e) = processor.load_existing().await {
        tracing::warn!("Failed to load existing titles, starting empty: {:#}", e);
    }

    // Start cleanup task (runs in background)
    tokio::spawn(start_cleanup_task(
        processor.clone(),
        CleanupConfig {
            interval_secs: config.sweep_interval_secs,
            retention_hours: config.retention_hours,
        },
    ));

    // Start Telegram poller
    let status = Arc::new(BotStatus::new(bot_username));
    let poller = UpdatePoller::new(
        client,
        processor.clone(),
        status.clone(),
        config.db_channel_id,
        config.poll_timeout_secs,
    );
    tokio::spawn(poller.run());

    // Build application state
    let state = Arc::new(AppState {
        processor,
        status,
        start_time: Instant::now(),
    });

    let app = routes::router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
