//! In-memory aggregate store.
//!
//! Maps canonical title to its [`MovieAggregate`]. Mutations for one title
//! are serialized by that title's lock from [`AggregateStore::title_lock`];
//! callers hold it across read-check-write sequences. A title's lock lives
//! only while someone holds or waits on it. The map lock itself is
//! only held for the duration of a single access and never across an await
//! on a collaborator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, Weak};
use tokio::sync::{Mutex, RwLock};

use crate::models::{DuplicateReason, FileRecord, MovieAggregate, MovieSummary};
use crate::services::metrics;

#[derive(Default)]
pub struct AggregateStore {
    aggregates: RwLock<HashMap<String, MovieAggregate>>,
    locks: StdMutex<HashMap<String, Weak<Mutex<()>>>>,
}

/// Totals shown on the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub movies: usize,
    pub files: usize,
}

impl AggregateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-title lock. Every caller gets the same lock while any handle to
    /// it is alive; unused entries are pruned when a new lock is created.
    pub fn title_lock(&self, title: &str) -> Arc<Mutex<()>> {
        let mut locks = self.lock_map();
        if let Some(lock) = locks.get(title).and_then(Weak::upgrade) {
            return lock;
        }

        locks.retain(|_, lock| lock.strong_count() > 0);
        let lock = Arc::new(Mutex::new(()));
        locks.insert(title.to_string(), Arc::downgrade(&lock));
        lock
    }

    /// Number of title locks currently held or awaited
    pub fn live_locks(&self) -> usize {
        self.lock_map()
            .values()
            .filter(|lock| lock.strong_count() > 0)
            .count()
    }

    fn lock_map(&self) -> std::sync::MutexGuard<'_, HashMap<String, Weak<Mutex<()>>>> {
        match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Add `file` to the aggregate for `title`, creating the aggregate if
    /// needed. Returns a snapshot of the updated aggregate, or why the file
    /// was rejected.
    pub async fn add_file(
        &self,
        title: &str,
        file: FileRecord,
    ) -> Result<MovieAggregate, DuplicateReason> {
        let mut aggregates = self.aggregates.write().await;

        if let Some(existing) = aggregates.get(title) {
            if let Some(reason) = existing.duplicate_of(&file) {
                return Err(reason);
            }
        }

        let aggregate = aggregates.entry(title.to_string()).or_insert_with(|| {
            tracing::info!(title = %title, "Tracking new title");
            MovieAggregate::new(title)
        });
        aggregate.absorb(file);
        let snapshot = aggregate.clone();

        metrics::TRACKED_AGGREGATES.set(aggregates.len() as i64);
        Ok(snapshot)
    }

    pub async fn get(&self, title: &str) -> Option<MovieAggregate> {
        self.aggregates.read().await.get(title).cloned()
    }

    /// Record the outcome of a publish. Returns the updated snapshot, or
    /// `None` if the aggregate was evicted meanwhile.
    pub async fn record_publish(
        &self,
        title: &str,
        message_id: i64,
        is_photo: bool,
        poster_attached: bool,
    ) -> Option<MovieAggregate> {
        let mut aggregates = self.aggregates.write().await;
        let aggregate = aggregates.get_mut(title)?;
        aggregate.channel_message_id = Some(message_id);
        aggregate.post_is_photo = is_photo;
        aggregate.poster_attached = aggregate.poster_attached || poster_attached;
        Some(aggregate.clone())
    }

    pub async fn remove(&self, title: &str) -> Option<MovieAggregate> {
        let mut aggregates = self.aggregates.write().await;
        let removed = aggregates.remove(title);
        metrics::TRACKED_AGGREGATES.set(aggregates.len() as i64);
        removed
    }

    /// Insert previously persisted aggregates, returning the new total
    pub async fn restore(&self, loaded: Vec<MovieAggregate>) -> usize {
        let mut aggregates = self.aggregates.write().await;
        for aggregate in loaded {
            aggregates.insert(aggregate.title.clone(), aggregate);
        }
        metrics::TRACKED_AGGREGATES.set(aggregates.len() as i64);
        aggregates.len()
    }

    pub async fn titles(&self) -> Vec<String> {
        self.aggregates.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.aggregates.read().await.len()
    }

    pub async fn stats(&self) -> StoreStats {
        let aggregates = self.aggregates.read().await;
        StoreStats {
            movies: aggregates.len(),
            files: aggregates.values().map(MovieAggregate::file_count).sum(),
        }
    }

    /// Dashboard listing, sorted by title
    pub async fn summaries(&self) -> Vec<MovieSummary> {
        let aggregates = self.aggregates.read().await;
        let mut summaries: Vec<MovieSummary> = aggregates
            .values()
            .map(|agg| MovieSummary {
                name: agg.title.clone(),
                tag: agg.tag,
                file_count: agg.file_count(),
                qualities: agg.qualities.iter().cloned().collect(),
                languages: agg.languages.iter().cloned().collect(),
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }
}
