//! Recording fakes for the messaging and poster seams.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use crate::services::poster::PosterSource;
use crate::services::telegram::{Messenger, OutgoingPost, TelegramError};

#[derive(Debug, Clone)]
pub struct SentPost {
    pub chat_id: i64,
    pub message_id: i64,
    pub post: OutgoingPost,
}

#[derive(Debug, Clone)]
pub struct EditCall {
    pub chat_id: i64,
    pub message_id: i64,
    pub post: OutgoingPost,
    pub is_photo: bool,
}

pub struct RecordingMessenger {
    next_id: AtomicI64,
    sent: Mutex<Vec<SentPost>>,
    edits: Mutex<Vec<EditCall>>,
    deletes: Mutex<Vec<(i64, i64)>>,
    fail_sends: AtomicBool,
    fail_photo_sends: AtomicBool,
    fail_edits: AtomicBool,
    fail_deletes: AtomicBool,
}

fn api_error(description: &str) -> TelegramError {
    TelegramError::Api {
        code: 400,
        description: description.to_string(),
    }
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1000),
            sent: Mutex::new(Vec::new()),
            edits: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            fail_sends: AtomicBool::new(false),
            fail_photo_sends: AtomicBool::new(false),
            fail_edits: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn fail_photo_sends(&self, fail: bool) {
        self.fail_photo_sends.store(fail, Ordering::SeqCst);
    }

    pub fn fail_edits(&self, fail: bool) {
        self.fail_edits.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentPost> {
        self.sent.lock().unwrap().clone()
    }

    pub fn edits(&self) -> Vec<EditCall> {
        self.edits.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<(i64, i64)> {
        self.deletes.lock().unwrap().clone()
    }

    /// Sends plus edits
    pub fn publish_calls(&self) -> usize {
        self.sent().len() + self.edits().len()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, chat_id: i64, post: &OutgoingPost) -> Result<i64, TelegramError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(api_error("Bad Request: chat not found"));
        }
        if post.photo.is_some() && self.fail_photo_sends.load(Ordering::SeqCst) {
            return Err(api_error("Bad Request: IMAGE_PROCESS_FAILED"));
        }

        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(SentPost {
            chat_id,
            message_id,
            post: post.clone(),
        });
        Ok(message_id)
    }

    async fn edit(
        &self,
        chat_id: i64,
        message_id: i64,
        post: &OutgoingPost,
        is_photo: bool,
    ) -> Result<(), TelegramError> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(api_error("Bad Request: message to edit not found"));
        }
        self.edits.lock().unwrap().push(EditCall {
            chat_id,
            message_id,
            post: post.clone(),
            is_photo,
        });
        Ok(())
    }

    async fn delete(&self, chat_id: i64, message_id: i64) -> Result<(), TelegramError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(api_error("Bad Request: message to delete not found"));
        }
        self.deletes.lock().unwrap().push((chat_id, message_id));
        Ok(())
    }
}

/// Returns the same poster for every lookup and records the arguments
pub struct StaticPosterSource {
    poster: Option<Vec<u8>>,
    calls: Mutex<Vec<(String, Option<String>, bool)>>,
}

impl StaticPosterSource {
    pub fn new(poster: Option<Vec<u8>>) -> Self {
        Self {
            poster,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, Option<String>, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PosterSource for StaticPosterSource {
    async fn fetch(&self, title: &str, year: Option<&str>, is_series: bool) -> Option<Vec<u8>> {
        self.calls
            .lock()
            .unwrap()
            .push((title.to_string(), year.map(str::to_string), is_series));
        self.poster.clone()
    }
}
