//! Read-only JSON API for the status dashboard.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::models::{MovieSummary, StatusResponse};
use crate::AppState;

/// GET /api/status
pub async fn api_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let stats = state.processor.store().stats().await;

    Json(StatusResponse {
        bot_running: state.status.is_running(),
        last_update: state.status.last_update().map(|ts| ts.to_rfc3339()),
        total_movies: stats.movies,
        total_files: stats.files,
        bot_username: state.status.bot_username.clone(),
    })
}

/// GET /api/movies
pub async fn api_movies(State(state): State<Arc<AppState>>) -> Json<Vec<MovieSummary>> {
    Json(state.processor.store().summaries().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentTag;
    use crate::routes::test_state;

    #[tokio::test]
    async fn test_status() {
        let state = test_state().await;
        state.status.set_running(true);
        state.status.mark_update(chrono::Utc::now());

        let Json(status) = api_status(State(state)).await;
        assert!(status.bot_running);
        assert!(status.last_update.is_some());
        assert_eq!(status.total_movies, 1);
        assert_eq!(status.total_files, 1);
        assert_eq!(status.bot_username, "MovieBot");
    }

    #[tokio::test]
    async fn test_movies_listing_shape() {
        let state = test_state().await;
        let Json(movies) = api_movies(State(state)).await;

        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].name, "Leo");
        assert_eq!(movies[0].tag, ContentTag::Movie);

        let json = serde_json::to_value(&movies[0]).unwrap();
        assert_eq!(json["tag"], "#MOVIE");
        assert_eq!(json["file_count"], 1);
        assert_eq!(json["qualities"], serde_json::json!(["720p"]));
        assert_eq!(json["languages"], serde_json::json!(["Tamil"]));
    }
}
