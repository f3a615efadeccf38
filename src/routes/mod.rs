pub mod dashboard;
pub mod health;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Dashboard HTTP surface
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health endpoints
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .route("/ready", get(health::ready))
        .route("/live", get(health::live))
        // Dashboard API
        .route("/api/status", get(dashboard::api_status))
        .route("/api/movies", get(dashboard::api_movies))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// State with one tracked title, backed by in-memory fakes
#[cfg(test)]
pub(crate) async fn test_state() -> Arc<AppState> {
    use crate::models::{BotStatus, IngestEvent};
    use crate::services::testing::{RecordingMessenger, StaticPosterSource};
    use crate::services::{AggregateStore, MemoryKvStore, MovieProcessor, MovieRepository, Publisher};
    use std::time::{Duration, Instant};

    let store = Arc::new(AggregateStore::new());
    let repository = MovieRepository::new(Arc::new(MemoryKvStore::new()));
    let publisher = Arc::new(Publisher::new(
        store.clone(),
        repository.clone(),
        Arc::new(RecordingMessenger::new()),
        Arc::new(StaticPosterSource::new(None)),
        -100,
        "MovieBot",
    ));
    let processor = Arc::new(MovieProcessor::new(
        store,
        repository,
        publisher,
        Duration::from_secs(3600),
    ));

    processor
        .ingest(IngestEvent {
            filename: "Leo.2023.720p.Tamil.mkv".to_string(),
            size_bytes: 1024,
            caption: None,
            message_id: 1,
            file_id: "leo-1".to_string(),
        })
        .await;

    Arc::new(AppState {
        processor,
        status: Arc::new(BotStatus::new("MovieBot")),
        start_time: Instant::now(),
    })
}
