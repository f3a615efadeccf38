//! Typed persistence of movie aggregates on top of a [`KvStore`].

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::models::{MovieAggregate, PersistedRecord};
use crate::services::kv::KvStore;

/// Key prefix of every persisted aggregate
pub const MOVIE_KEY_PREFIX: &str = "movie_";

pub fn movie_key(title: &str) -> String {
    format!("{}{}", MOVIE_KEY_PREFIX, title)
}

#[derive(Clone)]
pub struct MovieRepository {
    kv: Arc<dyn KvStore>,
}

impl MovieRepository {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    pub async fn save(&self, aggregate: &MovieAggregate) -> Result<()> {
        let json = serde_json::to_string(&aggregate.to_persisted())
            .with_context(|| format!("serializing '{}'", aggregate.title))?;
        self.kv.put(&movie_key(&aggregate.title), json).await
    }

    pub async fn delete(&self, title: &str) -> Result<()> {
        self.kv.delete(&movie_key(title)).await
    }

    /// Load every persisted aggregate. Records that fail to parse are
    /// skipped with a warning.
    pub async fn load_all(&self) -> Result<Vec<MovieAggregate>> {
        let entries = self.kv.get_all_with_prefix(MOVIE_KEY_PREFIX).await?;
        let mut aggregates = Vec::with_capacity(entries.len());

        for (key, value) in entries {
            let title = match key.strip_prefix(MOVIE_KEY_PREFIX) {
                Some(title) if !title.is_empty() => title.to_string(),
                _ => continue,
            };

            match serde_json::from_str::<PersistedRecord>(&value) {
                Ok(record) if !record.files.is_empty() => {
                    aggregates.push(MovieAggregate::from_persisted(title, record));
                }
                Ok(_) => {
                    tracing::warn!(title = %title, "Skipping persisted record without files");
                }
                Err(e) => {
                    tracing::warn!(title = %title, error = %e, "Skipping malformed persisted record");
                }
            }
        }

        Ok(aggregates)
    }

    pub async fn ping(&self) -> bool {
        self.kv.ping().await.unwrap_or(false)
    }

    pub fn backend(&self) -> &'static str {
        self.kv.backend()
    }
}
