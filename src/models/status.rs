use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use super::ContentTag;

/// GET /api/status
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub bot_running: bool,
    pub last_update: Option<String>,
    pub total_movies: usize,
    pub total_files: usize,
    pub bot_username: String,
}

/// One row of GET /api/movies
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovieSummary {
    pub name: String,
    pub tag: ContentTag,
    pub file_count: usize,
    pub qualities: Vec<String>,
    pub languages: Vec<String>,
}

/// Liveness of the update poller, shared with the dashboard
#[derive(Debug, Default)]
pub struct BotStatus {
    pub bot_username: String,
    running: AtomicBool,
    last_update: RwLock<Option<DateTime<Utc>>>,
}

impl BotStatus {
    pub fn new(bot_username: impl Into<String>) -> Self {
        Self {
            bot_username: bot_username.into(),
            ..Default::default()
        }
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Record activity in the database channel
    pub fn mark_update(&self, at: DateTime<Utc>) {
        let mut last = match self.last_update.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *last = Some(at);
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        match self.last_update.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
