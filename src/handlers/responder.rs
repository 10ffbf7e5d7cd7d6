use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::clients::telegram_client::{split_message, TelegramClient, MAX_MESSAGE_CHARS};

#[async_trait]
pub trait ChatResponder: Send + Sync {
    async fn send_typing(&self, chat_id: i64);
    async fn reply(&self, chat_id: i64, reply_to: i64, content: &str);
}

pub struct TelegramResponder {
    client: Arc<TelegramClient>,
}

impl TelegramResponder {
    pub fn new(client: Arc<TelegramClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatResponder for TelegramResponder {
    async fn send_typing(&self, chat_id: i64) {
        if let Err(err) = self.client.send_chat_action(chat_id, "typing").await {
            warn!(chat_id, error = %err, "typing indicator failed");
        }
    }

    async fn reply(&self, chat_id: i64, reply_to: i64, content: &str) {
        for chunk in split_message(content, MAX_MESSAGE_CHARS) {
            if let Err(err) = self.client.send_message(chat_id, &chunk, Some(reply_to)).await {
                warn!(chat_id, error = %err, "reply could not be delivered");
                return;
            }
        }
    }
}
