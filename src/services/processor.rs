//! Ingestion pipeline: extract, deduplicate, aggregate, persist, schedule.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::models::{DuplicateReason, FileRecord, IngestEvent, MovieAggregate};
use crate::services::debounce::Debouncer;
use crate::services::extractor::MetadataExtractor;
use crate::services::metrics;
use crate::services::publisher::Publisher;
use crate::services::repository::MovieRepository;
use crate::services::store::AggregateStore;

/// Titles shorter than this are not worth a post
const MIN_TITLE_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Added { title: String, file_count: usize },
    Duplicate { title: String, reason: DuplicateReason },
    /// Nothing usable could be extracted
    Rejected,
}

/// Result of checking one aggregate against the retention window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eviction {
    Kept,
    /// No file carries a usable timestamp
    Undated,
    Evicted {
        /// No channel post is left behind
        post_cleared: bool,
        record_deleted: bool,
    },
    /// Already gone
    Missing,
}

/// Expiry check for one aggregate. The newest usable file timestamp
/// governs, so an aggregate is kept while any file is fresh.
pub fn is_expired(aggregate: &MovieAggregate, cutoff: DateTime<Utc>) -> Option<bool> {
    for file in aggregate.files.iter().filter(|f| f.timestamp.is_none()) {
        tracing::warn!(
            title = %aggregate.title,
            filename = %file.filename,
            "File has no usable timestamp, ignoring it for retention"
        );
    }
    aggregate.latest_timestamp().map(|latest| latest < cutoff)
}

pub struct MovieProcessor {
    store: Arc<AggregateStore>,
    repository: MovieRepository,
    publisher: Arc<Publisher>,
    debouncer: Debouncer,
    debounce_delay: Duration,
}

impl MovieProcessor {
    pub fn new(
        store: Arc<AggregateStore>,
        repository: MovieRepository,
        publisher: Arc<Publisher>,
        debounce_delay: Duration,
    ) -> Self {
        Self {
            store,
            repository,
            publisher,
            debouncer: Debouncer::new(),
            debounce_delay,
        }
    }

    pub fn store(&self) -> &Arc<AggregateStore> {
        &self.store
    }

    pub fn repository(&self) -> &MovieRepository {
        &self.repository
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    /// Rebuild the in-memory store from persisted records. Titles that were
    /// never posted get a publish scheduled.
    pub async fn load_existing(&self) -> Result<usize> {
        let loaded = self.repository.load_all().await?;
        let count = loaded.len();
        let unpublished: Vec<String> = loaded
            .iter()
            .filter(|aggregate| aggregate.channel_message_id.is_none())
            .map(|aggregate| aggregate.title.clone())
            .collect();

        self.store.restore(loaded).await;
        for title in &unpublished {
            self.schedule_publish(title);
        }

        tracing::info!(
            "Loaded {} existing titles ({} awaiting first post)",
            count,
            unpublished.len()
        );
        Ok(count)
    }

    fn schedule_publish(&self, title: &str) {
        let publisher = self.publisher.clone();
        let publish_title = title.to_string();
        self.debouncer.schedule(title, self.debounce_delay, async move {
            publisher.publish(&publish_title).await;
        });
    }

    /// Process one uploaded file. Never fails; problems are logged.
    pub async fn ingest(&self, event: IngestEvent) -> IngestOutcome {
        self.ingest_at(event, Utc::now()).await
    }

    pub async fn ingest_at(&self, event: IngestEvent, created_at: DateTime<Utc>) -> IngestOutcome {
        let metadata =
            MetadataExtractor::extract(&event.filename, event.size_bytes, event.caption.as_deref());
        let title = metadata.title.clone();

        if title.chars().count() < MIN_TITLE_CHARS {
            tracing::warn!(filename = %event.filename, title = %title, "Title too short, skipping file");
            return IngestOutcome::Rejected;
        }

        let file = FileRecord::new(&event, &metadata, created_at);

        let lock = self.store.title_lock(&title);
        let guard = lock.lock().await;

        let aggregate = match self.store.add_file(&title, file).await {
            Ok(aggregate) => aggregate,
            Err(reason) => {
                metrics::DUPLICATES_SKIPPED.inc();
                tracing::info!(
                    title = %title,
                    filename = %event.filename,
                    file_id = %event.file_id,
                    "Duplicate file skipped ({})",
                    reason
                );
                return IngestOutcome::Duplicate { title, reason };
            }
        };

        metrics::FILES_INGESTED.inc();
        tracing::info!(
            title = %title,
            filename = %event.filename,
            file_id = %event.file_id,
            files = aggregate.file_count(),
            tag = %aggregate.tag,
            "Added file"
        );

        if let Err(e) = self.repository.save(&aggregate).await {
            tracing::warn!(title = %title, "Failed to persist aggregate: {:#}", e);
        }

        self.schedule_publish(&title);
        drop(guard);

        IngestOutcome::Added {
            title,
            file_count: aggregate.file_count(),
        }
    }

    /// Evict `title` if all of its files are older than `cutoff`: delete its
    /// channel post, its persisted record and the in-memory aggregate.
    pub async fn evict_if_expired(&self, title: &str, cutoff: DateTime<Utc>) -> Eviction {
        let lock = self.store.title_lock(title);
        let _guard = lock.lock().await;

        let Some(aggregate) = self.store.get(title).await else {
            return Eviction::Missing;
        };

        match is_expired(&aggregate, cutoff) {
            Some(true) => {}
            Some(false) => return Eviction::Kept,
            None => {
                tracing::warn!(title = %title, "No file timestamps, keeping aggregate");
                return Eviction::Undated;
            }
        }

        self.debouncer.cancel(title);

        let post_cleared = match aggregate.channel_message_id {
            Some(message_id) => match self
                .publisher
                .messenger()
                .delete(self.publisher.channel_id(), message_id)
                .await
            {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(title = %title, message_id, "Failed to delete channel post: {}", e);
                    false
                }
            },
            None => true,
        };

        let record_deleted = match self.repository.delete(title).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(title = %title, "Failed to delete persisted record: {:#}", e);
                false
            }
        };

        self.store.remove(title).await;
        metrics::AGGREGATES_EVICTED.inc();
        tracing::info!(
            title = %title,
            files = aggregate.file_count(),
            "Evicted expired aggregate"
        );

        Eviction::Evicted {
            post_cleared,
            record_deleted,
        }
    }
}
