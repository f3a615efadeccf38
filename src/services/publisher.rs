//! Publishes aggregate summaries to the update channel.

use std::sync::Arc;

use crate::models::MovieAggregate;
use crate::services::formatter::{self, GET_FILE_BUTTON};
use crate::services::metrics;
use crate::services::poster::PosterSource;
use crate::services::repository::MovieRepository;
use crate::services::store::AggregateStore;
use crate::services::telegram::{Messenger, OutgoingPost};

/// Telegram rejects photo captions longer than this
const CAPTION_LIMIT: usize = 1024;

/// What a publish attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// First post for the title
    Sent { message_id: i64, with_poster: bool },
    Edited { message_id: i64 },
    /// The edit failed and a replacement post was sent
    Resent { message_id: i64 },
    /// Aggregate no longer exists
    Skipped,
    Failed,
}

pub struct Publisher {
    store: Arc<AggregateStore>,
    repository: MovieRepository,
    messenger: Arc<dyn Messenger>,
    posters: Arc<dyn PosterSource>,
    channel_id: i64,
    bot_username: String,
}

impl Publisher {
    pub fn new(
        store: Arc<AggregateStore>,
        repository: MovieRepository,
        messenger: Arc<dyn Messenger>,
        posters: Arc<dyn PosterSource>,
        channel_id: i64,
        bot_username: impl Into<String>,
    ) -> Self {
        Self {
            store,
            repository,
            messenger,
            posters,
            channel_id,
            bot_username: bot_username.into(),
        }
    }

    pub fn messenger(&self) -> &Arc<dyn Messenger> {
        &self.messenger
    }

    pub fn channel_id(&self) -> i64 {
        self.channel_id
    }

    /// Build the post for an aggregate, without a photo
    pub fn build_post(&self, aggregate: &MovieAggregate) -> OutgoingPost {
        OutgoingPost::text(formatter::render(aggregate)).with_button(
            GET_FILE_BUTTON,
            &formatter::deep_link(&self.bot_username, &aggregate.title),
        )
    }

    /// Send or update the channel post for `title`.
    ///
    /// Holds the title lock for the whole attempt so one title never has
    /// two publishes in flight and ingests wait for the message id.
    pub async fn publish(&self, title: &str) -> PublishOutcome {
        let lock = self.store.title_lock(title);
        let _guard = lock.lock().await;

        let Some(aggregate) = self.store.get(title).await else {
            tracing::debug!(title = %title, "Aggregate gone before publish");
            return PublishOutcome::Skipped;
        };

        let post = self.build_post(&aggregate);
        let outcome = match aggregate.channel_message_id {
            None => self.send_first(&aggregate, post).await,
            Some(message_id) => self.update_existing(&aggregate, message_id, post).await,
        };

        match outcome {
            PublishOutcome::Sent { message_id, with_poster } => {
                metrics::post_sent();
                self.record(title, message_id, with_poster, with_poster).await;
            }
            PublishOutcome::Edited { .. } => {
                metrics::post_edited();
                self.persist(&aggregate).await;
            }
            PublishOutcome::Resent { message_id } => {
                metrics::post_sent();
                self.record(title, message_id, false, false).await;
            }
            PublishOutcome::Failed => metrics::post_failed(),
            PublishOutcome::Skipped => {}
        }

        outcome
    }

    async fn send_first(&self, aggregate: &MovieAggregate, post: OutgoingPost) -> PublishOutcome {
        let title = &aggregate.title;

        let poster = if aggregate.poster_attached || post.text.chars().count() > CAPTION_LIMIT {
            None
        } else {
            let fetched = self
                .posters
                .fetch(title, aggregate.year(), aggregate.is_series())
                .await;
            metrics::poster_lookup(fetched.is_some());
            fetched
        };

        if let Some(photo) = poster {
            match self.messenger.send(self.channel_id, &post.clone().with_photo(photo)).await {
                Ok(message_id) => {
                    tracing::info!(title = %title, message_id, "Published new post with poster");
                    return PublishOutcome::Sent { message_id, with_poster: true };
                }
                Err(e) => {
                    tracing::warn!(title = %title, "Photo post failed, sending text only: {}", e);
                }
            }
        }

        match self.messenger.send(self.channel_id, &post).await {
            Ok(message_id) => {
                tracing::info!(title = %title, message_id, "Published new post");
                PublishOutcome::Sent { message_id, with_poster: false }
            }
            Err(e) => {
                tracing::error!(title = %title, "Failed to publish post: {}", e);
                PublishOutcome::Failed
            }
        }
    }

    async fn update_existing(
        &self,
        aggregate: &MovieAggregate,
        message_id: i64,
        post: OutgoingPost,
    ) -> PublishOutcome {
        let title = &aggregate.title;

        match self
            .messenger
            .edit(self.channel_id, message_id, &post, aggregate.post_is_photo)
            .await
        {
            Ok(()) => {
                tracing::info!(title = %title, message_id, files = aggregate.file_count(), "Updated post");
                return PublishOutcome::Edited { message_id };
            }
            Err(e) => {
                tracing::warn!(title = %title, message_id, "Edit failed, sending a new post: {}", e);
            }
        }

        match self.messenger.send(self.channel_id, &post).await {
            Ok(new_id) => {
                tracing::info!(title = %title, message_id = new_id, "Replaced post");
                if let Err(e) = self.messenger.delete(self.channel_id, message_id).await {
                    tracing::warn!(title = %title, message_id, "Failed to delete replaced post: {}", e);
                }
                PublishOutcome::Resent { message_id: new_id }
            }
            Err(e) => {
                tracing::error!(title = %title, "Failed to replace post: {}", e);
                PublishOutcome::Failed
            }
        }
    }

    async fn record(&self, title: &str, message_id: i64, is_photo: bool, poster_attached: bool) {
        let Some(updated) = self
            .store
            .record_publish(title, message_id, is_photo, poster_attached)
            .await
        else {
            return;
        };

        self.persist(&updated).await;
    }

    async fn persist(&self, aggregate: &MovieAggregate) {
        if let Err(e) = self.repository.save(aggregate).await {
            tracing::warn!(title = %aggregate.title, "Failed to persist publish state: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileRecord;
    use crate::services::kv::MemoryKvStore;
    use crate::services::testing::{RecordingMessenger, StaticPosterSource};

    struct Fixture {
        store: Arc<AggregateStore>,
        kv: Arc<MemoryKvStore>,
        messenger: Arc<RecordingMessenger>,
        posters: Arc<StaticPosterSource>,
        publisher: Publisher,
    }

    fn fixture(poster: Option<Vec<u8>>) -> Fixture {
        let store = Arc::new(AggregateStore::new());
        let kv = Arc::new(MemoryKvStore::new());
        let messenger = Arc::new(RecordingMessenger::new());
        let posters = Arc::new(StaticPosterSource::new(poster));
        let publisher = Publisher::new(
            store.clone(),
            MovieRepository::new(kv.clone()),
            messenger.clone(),
            posters.clone(),
            -100,
            "MovieBot",
        );
        Fixture {
            store,
            kv,
            messenger,
            posters,
            publisher,
        }
    }

    fn file(name: &str) -> FileRecord {
        FileRecord {
            filename: name.to_string(),
            processed_name: name.to_string(),
            message_id: 1,
            file_id: name.to_string(),
            size_bytes: 10,
            size_display: "10 B".to_string(),
            timestamp: Some(chrono::Utc::now()),
            quality: vec![],
            language: vec![],
            year: Some("2023".to_string()),
            season: None,
            episode: None,
        }
    }

    #[tokio::test]
    async fn test_first_publish_with_poster() {
        let f = fixture(Some(vec![1, 2, 3]));
        f.store.add_file("Leo", file("a.mkv")).await.unwrap();

        let outcome = f.publisher.publish("Leo").await;
        assert!(matches!(outcome, PublishOutcome::Sent { with_poster: true, .. }));

        let sent = f.messenger.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].post.photo, Some(vec![1, 2, 3]));
        assert_eq!(
            sent[0].post.button.as_ref().unwrap().url,
            "https://t.me/MovieBot?start=getfile-Leo"
        );
        assert_eq!(f.posters.calls(), vec![("Leo".to_string(), Some("2023".to_string()), false)]);

        let agg = f.store.get("Leo").await.unwrap();
        assert!(agg.poster_attached);
        assert!(agg.post_is_photo);
        assert!(f.kv.get("movie_Leo").await.is_some());
    }

    #[tokio::test]
    async fn test_second_publish_edits_without_new_poster_fetch() {
        let f = fixture(Some(vec![9]));
        f.store.add_file("Leo", file("a.mkv")).await.unwrap();
        f.publisher.publish("Leo").await;

        f.store.add_file("Leo", file("b.mkv")).await.unwrap();
        let outcome = f.publisher.publish("Leo").await;

        assert!(matches!(outcome, PublishOutcome::Edited { .. }));
        assert_eq!(f.posters.calls().len(), 1);
        let edits = f.messenger.edits();
        assert_eq!(edits.len(), 1);
        assert!(edits[0].is_photo);
        assert!(edits[0].post.text.contains("<b>2</b>"));

        let stored = f.kv.get("movie_Leo").await.unwrap();
        assert!(stored.contains("b.mkv"));
    }

    #[tokio::test]
    async fn test_text_only_when_no_poster() {
        let f = fixture(None);
        f.store.add_file("Leo", file("a.mkv")).await.unwrap();

        let outcome = f.publisher.publish("Leo").await;
        assert!(matches!(outcome, PublishOutcome::Sent { with_poster: false, .. }));
        assert_eq!(f.messenger.sent()[0].post.photo, None);
        assert!(!f.store.get("Leo").await.unwrap().poster_attached);
    }

    #[tokio::test]
    async fn test_photo_failure_falls_back_to_text() {
        let f = fixture(Some(vec![1]));
        f.messenger.fail_photo_sends(true);
        f.store.add_file("Leo", file("a.mkv")).await.unwrap();

        let outcome = f.publisher.publish("Leo").await;
        assert!(matches!(outcome, PublishOutcome::Sent { with_poster: false, .. }));
        let agg = f.store.get("Leo").await.unwrap();
        assert!(agg.channel_message_id.is_some());
        assert!(!agg.post_is_photo);
    }

    #[tokio::test]
    async fn test_edit_failure_sends_replacement() {
        let f = fixture(None);
        f.store.add_file("Leo", file("a.mkv")).await.unwrap();
        f.publisher.publish("Leo").await;
        let first_id = f.store.get("Leo").await.unwrap().channel_message_id;

        f.messenger.fail_edits(true);
        f.store.add_file("Leo", file("b.mkv")).await.unwrap();
        let outcome = f.publisher.publish("Leo").await;

        let PublishOutcome::Resent { message_id } = outcome else {
            panic!("expected resend, got {:?}", outcome);
        };
        assert_ne!(Some(message_id), first_id);
        assert_eq!(f.store.get("Leo").await.unwrap().channel_message_id, Some(message_id));
        assert_eq!(f.messenger.deletes(), vec![(-100, first_id.unwrap())]);
    }

    #[tokio::test]
    async fn test_send_failure_is_not_fatal() {
        let f = fixture(None);
        f.messenger.fail_sends(true);
        f.store.add_file("Leo", file("a.mkv")).await.unwrap();

        assert_eq!(f.publisher.publish("Leo").await, PublishOutcome::Failed);
        assert_eq!(f.store.get("Leo").await.unwrap().channel_message_id, None);
    }

    #[tokio::test]
    async fn test_missing_aggregate_is_skipped() {
        let f = fixture(None);
        assert_eq!(f.publisher.publish("Nothing").await, PublishOutcome::Skipped);
        assert!(f.messenger.sent().is_empty());
    }
}
