//! Telegram Bot API Types
//!
//! Only the subset of the Bot API objects the bot reads or sends.

use serde::{Deserialize, Serialize};

/// Envelope around every Bot API response
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct User {
    pub username: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub channel_post: Option<Message>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub document: Option<FileAttachment>,
    pub video: Option<FileAttachment>,
}

/// `Document` and `Video` share every field the bot uses
#[derive(Debug, Deserialize, Clone)]
pub struct FileAttachment {
    pub file_unique_id: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub url: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

/// A channel post ready to send: HTML text, optional URL button, optional
/// photo. With a photo the text becomes the caption.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingPost {
    pub text: String,
    pub button: Option<InlineKeyboardButton>,
    pub photo: Option<Vec<u8>>,
}

impl OutgoingPost {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_button(mut self, text: &str, url: &str) -> Self {
        self.button = Some(InlineKeyboardButton {
            text: text.to_string(),
            url: url.to_string(),
        });
        self
    }

    pub fn with_photo(mut self, photo: Vec<u8>) -> Self {
        self.photo = Some(photo);
        self
    }

    pub fn reply_markup(&self) -> Option<InlineKeyboardMarkup> {
        self.button.as_ref().map(|button| InlineKeyboardMarkup {
            inline_keyboard: vec![vec![button.clone()]],
        })
    }
}
