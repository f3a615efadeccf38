//! Telegram Bot API Client
//!
//! HTTP client for the handful of Bot API methods the bot needs.

use super::types::*;
use super::Messenger;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

/// Default request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Description Telegram returns when an edit would not change anything
const NOT_MODIFIED: &str = "message is not modified";

/// Telegram API error types
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    /// Network/connection error
    #[error("Network error: {0}")]
    Network(String),
    /// Non-2xx status without a readable API envelope
    #[error("HTTP error: {0}")]
    Http(u16),
    /// `ok: false` envelope
    #[error("Telegram API error {code}: {description}")]
    Api { code: i64, description: String },
    /// JSON parsing error
    #[error("Parse error: {0}")]
    Parse(String),
}

impl TelegramError {
    pub fn is_not_modified(&self) -> bool {
        matches!(self, TelegramError::Api { description, .. } if description.contains(NOT_MODIFIED))
    }
}

impl From<reqwest::Error> for TelegramError {
    fn from(err: reqwest::Error) -> Self {
        // the request URL carries the bot token
        TelegramError::Network(err.without_url().to_string())
    }
}

#[derive(Serialize)]
struct SendMessageParams<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<i64>,
}

#[derive(Serialize)]
struct EditMessageParams<'a> {
    chat_id: i64,
    message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<&'a str>,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Serialize)]
struct MessageRef {
    chat_id: i64,
    message_id: i64,
}

#[derive(Serialize)]
struct GetUpdatesParams {
    offset: i64,
    timeout: u64,
    allowed_updates: &'static [&'static str],
}

/// Telegram Bot API client
pub struct TelegramClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl TelegramClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `api_url` - Bot API server (e.g., "https://api.telegram.org")
    /// * `token` - Bot token from BotFather
    /// * `timeout_secs` - Per-request timeout; long polls add the poll timeout on top
    pub fn new(api_url: &str, token: &str, timeout_secs: u64) -> Result<Self, TelegramError> {
        let timeout = Duration::from_secs(if timeout_secs == 0 {
            DEFAULT_TIMEOUT_SECS
        } else {
            timeout_secs
        });

        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
            timeout,
        })
    }

    /// POST a JSON-bodied method
    async fn call<T, P>(&self, method: &str, params: &P, timeout: Duration) -> Result<T, TelegramError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        debug!("Telegram API request: {}", method);

        let response = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .timeout(timeout)
            .json(params)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        parse_envelope(method, status, &text)
    }

    /// POST a multipart method (file uploads)
    async fn call_multipart<T: DeserializeOwned>(
        &self,
        method: &str,
        form: Form,
    ) -> Result<T, TelegramError> {
        debug!("Telegram API upload: {}", method);

        let response = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .multipart(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        parse_envelope(method, status, &text)
    }

    // ========================================================================
    // Bot
    // ========================================================================

    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &serde_json::json!({}), self.timeout).await
    }

    /// Long-poll for updates starting at `offset`
    pub async fn get_updates(&self, offset: i64, poll_timeout_secs: u64) -> Result<Vec<Update>, TelegramError> {
        let params = GetUpdatesParams {
            offset,
            timeout: poll_timeout_secs,
            allowed_updates: &["message", "channel_post"],
        };
        let timeout = self.timeout + Duration::from_secs(poll_timeout_secs);
        self.call("getUpdates", &params, timeout).await
    }

    // ========================================================================
    // Messages
    // ========================================================================

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<InlineKeyboardMarkup>,
        reply_to_message_id: Option<i64>,
    ) -> Result<Message, TelegramError> {
        let params = SendMessageParams {
            chat_id,
            text,
            parse_mode: "HTML",
            reply_markup,
            reply_to_message_id,
        };
        self.call("sendMessage", &params, self.timeout).await
    }

    /// Upload a photo with an HTML caption
    pub async fn send_photo(
        &self,
        chat_id: i64,
        photo: Vec<u8>,
        caption: &str,
        reply_markup: Option<InlineKeyboardMarkup>,
    ) -> Result<Message, TelegramError> {
        let part = Part::bytes(photo)
            .file_name("poster.jpg")
            .mime_str("image/jpeg")?;

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .text("parse_mode", "HTML")
            .part("photo", part);

        if let Some(markup) = reply_markup {
            let markup = serde_json::to_string(&markup)
                .map_err(|e| TelegramError::Parse(e.to_string()))?;
            form = form.text("reply_markup", markup);
        }

        self.call_multipart("sendPhoto", form).await
    }

    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        reply_markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError> {
        let params = EditMessageParams {
            chat_id,
            message_id,
            text: Some(text),
            caption: None,
            parse_mode: "HTML",
            reply_markup,
        };
        // result is the edited Message or `true`
        let _: serde_json::Value = self.call("editMessageText", &params, self.timeout).await?;
        Ok(())
    }

    pub async fn edit_message_caption(
        &self,
        chat_id: i64,
        message_id: i64,
        caption: &str,
        reply_markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError> {
        let params = EditMessageParams {
            chat_id,
            message_id,
            text: None,
            caption: Some(caption),
            parse_mode: "HTML",
            reply_markup,
        };
        let _: serde_json::Value = self.call("editMessageCaption", &params, self.timeout).await?;
        Ok(())
    }

    pub async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<bool, TelegramError> {
        self.call("deleteMessage", &MessageRef { chat_id, message_id }, self.timeout)
            .await
    }
}

/// Decode a Bot API envelope
fn parse_envelope<T: DeserializeOwned>(method: &str, status: u16, text: &str) -> Result<T, TelegramError> {
    match serde_json::from_str::<ApiResponse<T>>(text) {
        Ok(envelope) if envelope.ok => envelope
            .result
            .ok_or_else(|| TelegramError::Parse(format!("{}: missing result", method))),
        Ok(envelope) => Err(TelegramError::Api {
            code: envelope.error_code.unwrap_or(i64::from(status)),
            description: envelope.description.unwrap_or_default(),
        }),
        Err(_) if !(200..300).contains(&status) => Err(TelegramError::Http(status)),
        Err(e) => {
            error!("Failed to parse Telegram response for '{}': {}", method, e);
            debug!("Response text: {}", text.chars().take(500).collect::<String>());
            Err(TelegramError::Parse(e.to_string()))
        }
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send(&self, chat_id: i64, post: &OutgoingPost) -> Result<i64, TelegramError> {
        let message = match &post.photo {
            Some(photo) => {
                self.send_photo(chat_id, photo.clone(), &post.text, post.reply_markup())
                    .await?
            }
            None => {
                self.send_message(chat_id, &post.text, post.reply_markup(), None)
                    .await?
            }
        };
        Ok(message.message_id)
    }

    async fn edit(
        &self,
        chat_id: i64,
        message_id: i64,
        post: &OutgoingPost,
        is_photo: bool,
    ) -> Result<(), TelegramError> {
        let result = if is_photo {
            self.edit_message_caption(chat_id, message_id, &post.text, post.reply_markup())
                .await
        } else {
            self.edit_message_text(chat_id, message_id, &post.text, post.reply_markup())
                .await
        };

        match result {
            Err(e) if e.is_not_modified() => Ok(()),
            other => other,
        }
    }

    async fn delete(&self, chat_id: i64, message_id: i64) -> Result<(), TelegramError> {
        self.delete_message(chat_id, message_id).await.map(|_| ())
    }
}
