//! Long-polling update loop.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use super::types::{Message, Update};
use super::TelegramClient;
use crate::models::{BotStatus, IngestEvent};
use crate::services::formatter::{escape_html, unslug, GET_FILE_PREFIX};
use crate::services::patterns::SUPPORTED_FORMATS;
use crate::services::processor::MovieProcessor;

/// Pause after a failed `getUpdates`
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

pub struct UpdatePoller {
    client: Arc<TelegramClient>,
    processor: Arc<MovieProcessor>,
    status: Arc<BotStatus>,
    db_channel_id: i64,
    poll_timeout_secs: u64,
}

impl UpdatePoller {
    pub fn new(
        client: Arc<TelegramClient>,
        processor: Arc<MovieProcessor>,
        status: Arc<BotStatus>,
        db_channel_id: i64,
        poll_timeout_secs: u64,
    ) -> Self {
        Self {
            client,
            processor,
            status,
            db_channel_id,
            poll_timeout_secs,
        }
    }

    /// Poll forever. Spawn with `tokio::spawn`.
    pub async fn run(self) {
        tracing::info!(
            "Starting update poller (db channel: {}, poll timeout: {}s)",
            self.db_channel_id,
            self.poll_timeout_secs
        );
        self.status.set_running(true);

        let mut offset = 0;
        loop {
            match self.client.get_updates(offset, self.poll_timeout_secs).await {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        self.handle(update).await;
                    }
                }
                Err(e) => {
                    tracing::warn!("getUpdates failed, retrying in {:?}: {}", ERROR_BACKOFF, e);
                    tokio::time::sleep(ERROR_BACKOFF).await;
                }
            }
        }
    }

    async fn handle(&self, update: Update) {
        let Some(message) = update.channel_post.or(update.message) else {
            return;
        };

        if message.chat.id == self.db_channel_id {
            self.status.mark_update(Utc::now());
            match ingest_event(&message) {
                Some(event) => {
                    tracing::info!(
                        filename = %event.filename,
                        message_id = event.message_id,
                        "New file in database channel"
                    );
                    let processor = self.processor.clone();
                    tokio::spawn(async move {
                        processor.ingest(event).await;
                    });
                }
                None => {
                    tracing::debug!(message_id = message.message_id, "Skipping non-video message");
                }
            }
            return;
        }

        if message.chat.kind == "private" {
            if let Some(reply) = message.text.as_deref().and_then(getfile_reply) {
                if let Err(e) = self
                    .client
                    .send_message(message.chat.id, &reply, None, Some(message.message_id))
                    .await
                {
                    tracing::warn!("Failed to answer /start: {}", e);
                }
            }
        }
    }
}

fn is_supported_video(filename: &str, mime_type: Option<&str>) -> bool {
    let lower = filename.to_lowercase();
    SUPPORTED_FORMATS.iter().any(|ext| lower.ends_with(ext))
        || mime_type.map_or(false, |mime| mime.starts_with("video/"))
}

/// Turn a database channel post into an ingestion event, if it carries a
/// named video file
pub fn ingest_event(message: &Message) -> Option<IngestEvent> {
    let attachment = message.document.as_ref().or(message.video.as_ref())?;
    let filename = attachment.file_name.as_deref()?.trim();

    if filename.is_empty() || !is_supported_video(filename, attachment.mime_type.as_deref()) {
        return None;
    }

    Some(IngestEvent {
        filename: filename.to_string(),
        size_bytes: attachment.file_size.unwrap_or(0),
        caption: message.caption.clone().filter(|c| !c.trim().is_empty()),
        message_id: message.message_id,
        file_id: attachment.file_unique_id.clone(),
    })
}

/// Reply to `/start getfile-<slug>` with the title in copyable form
pub fn getfile_reply(text: &str) -> Option<String> {
    let mut parts = text.split_whitespace();
    let command = parts.next()?;
    if command != "/start" && !command.starts_with("/start@") {
        return None;
    }

    let slug = parts.next()?.strip_prefix(GET_FILE_PREFIX)?;
    let title = unslug(slug);
    if title.is_empty() {
        return None;
    }

    Some(format!(
        "🎬 <b>Movie Search:</b>\n\n<code>{}</code>\n\n📋 <b>Tap to copy the movie name above and send it to search for files!</b>",
        escape_html(&title)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::telegram::types::{Chat, FileAttachment};

    fn message(document: Option<FileAttachment>, caption: Option<&str>) -> Message {
        Message {
            message_id: 7,
            chat: Chat {
                id: -100,
                kind: "channel".to_string(),
            },
            text: None,
            caption: caption.map(str::to_string),
            document,
            video: None,
        }
    }

    fn attachment(name: Option<&str>, mime: Option<&str>) -> FileAttachment {
        FileAttachment {
            file_unique_id: "AgAD".to_string(),
            file_name: name.map(str::to_string),
            mime_type: mime.map(str::to_string),
            file_size: Some(2048),
        }
    }

    #[test]
    fn test_ingest_event_from_document() {
        let event = ingest_event(&message(
            Some(attachment(Some("Leo.2023.MKV"), None)),
            Some("#Tamil"),
        ))
        .unwrap();
        assert_eq!(event.filename, "Leo.2023.MKV");
        assert_eq!(event.file_id, "AgAD");
        assert_eq!(event.size_bytes, 2048);
        assert_eq!(event.caption.as_deref(), Some("#Tamil"));
    }

    #[test]
    fn test_ingest_event_filters() {
        // mime type alone is enough
        assert!(ingest_event(&message(
            Some(attachment(Some("Leo.2023.bin"), Some("video/mp4"))),
            None
        ))
        .is_some());
        assert!(ingest_event(&message(Some(attachment(Some("notes.pdf"), None)), None)).is_none());
        assert!(ingest_event(&message(Some(attachment(None, Some("video/mp4"))), None)).is_none());
        assert!(ingest_event(&message(None, Some("text only"))).is_none());

        let blank_caption = ingest_event(&message(
            Some(attachment(Some("a.mp4"), None)),
            Some("  "),
        ))
        .unwrap();
        assert_eq!(blank_caption.caption, None);
    }

    #[test]
    fn test_getfile_reply() {
        let reply = getfile_reply("/start getfile-Spider-Man-No-Way-Home").unwrap();
        assert!(reply.contains("<code>Spider Man No Way Home</code>"));

        assert!(getfile_reply("/start@MovieBot getfile-Leo").is_some());
        assert!(getfile_reply("/start").is_none());
        assert!(getfile_reply("/start hello").is_none());
        assert!(getfile_reply("/help getfile-Leo").is_none());
        assert!(getfile_reply("/start getfile-").is_none());
    }
}
