//! Telegram Bot API Integration
//!
//! - **Client**: JSON and multipart calls to the Bot API
//! - **Messenger**: the publish/edit/delete seam used by the publisher
//!   and the retention sweep
//! - **Poller**: long-polls `getUpdates` and turns database channel uploads
//!   into ingestion events

pub mod client;
pub mod poller;
pub mod types;

use async_trait::async_trait;

pub use client::{TelegramClient, TelegramError};
pub use poller::UpdatePoller;
pub use types::OutgoingPost;

/// Outbound side of the channel bot
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a new post, returning its message id
    async fn send(&self, chat_id: i64, post: &OutgoingPost) -> Result<i64, TelegramError>;

    /// Replace the text (or caption, for photo posts) of an existing post
    async fn edit(
        &self,
        chat_id: i64,
        message_id: i64,
        post: &OutgoingPost,
        is_photo: bool,
    ) -> Result<(), TelegramError>;

    async fn delete(&self, chat_id: i64, message_id: i64) -> Result<(), TelegramError>;
}
