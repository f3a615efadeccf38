//! Retention sweep for expired titles
//!
//! Runs as a background task on startup, then periodically.
//! - Evicts titles whose newest file is older than the retention window
//! - Deletes the channel post and the persisted record along with them

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

use crate::services::processor::{Eviction, MovieProcessor};

/// Configuration for the retention sweep
pub struct CleanupConfig {
    /// How often to run the sweep (in seconds)
    pub interval_secs: u64,
    /// Age after which a title's files are expired (in hours)
    pub retention_hours: i64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600, // Run every hour
            retention_hours: 24,
        }
    }
}

/// Result of a sweep
#[derive(Debug, Default)]
pub struct CleanupResult {
    pub checked: usize,
    pub evicted: usize,
    pub kept: usize,
    pub undated: usize,
    pub errors: Vec<String>,
}

impl CleanupResult {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn total_deleted(&self) -> usize {
        self.evicted
    }
}

/// Run a single sweep relative to `now`
pub async fn run_cleanup(
    processor: &MovieProcessor,
    config: &CleanupConfig,
    now: DateTime<Utc>,
) -> CleanupResult {
    let mut result = CleanupResult::default();
    let cutoff = now - ChronoDuration::hours(config.retention_hours);

    for title in processor.store().titles().await {
        result.checked += 1;
        match processor.evict_if_expired(&title, cutoff).await {
            Eviction::Evicted {
                post_cleared,
                record_deleted,
            } => {
                result.evicted += 1;
                if !post_cleared {
                    result
                        .errors
                        .push(format!("Channel post for '{}' was not deleted", title));
                }
                if !record_deleted {
                    result
                        .errors
                        .push(format!("Stored record for '{}' was not deleted", title));
                }
            }
            Eviction::Kept => result.kept += 1,
            Eviction::Undated => result.undated += 1,
            Eviction::Missing => {}
        }
    }

    if result.evicted > 0 {
        tracing::info!("Cleanup: evicted {} expired titles", result.evicted);
    }

    result
}

/// Start the background retention task
///
/// Runs immediately on startup, then periodically at the configured interval.
/// This should be spawned as a background task using `tokio::spawn`.
pub async fn start_cleanup_task(processor: Arc<MovieProcessor>, config: CleanupConfig) {
    tracing::info!(
        "Starting cleanup task (interval: {}s, retention: {}h)",
        config.interval_secs,
        config.retention_hours
    );

    // Run immediately on startup
    let result = run_cleanup(&processor, &config, Utc::now()).await;
    tracing::info!(
        "Initial cleanup complete: {} checked, {} evicted",
        result.checked,
        result.evicted
    );

    // Then run periodically; first tick one full interval from now
    let period = Duration::from_secs(config.interval_secs.max(1));
    let mut interval = time::interval_at(time::Instant::now() + period, period);

    loop {
        interval.tick().await;

        let result = run_cleanup(&processor, &config, Utc::now()).await;
        if !result.is_success() {
            for error in &result.errors {
                tracing::warn!("Cleanup error: {}", error);
            }
        }
    }
}
