//! Telegram Bot API transport
//!
//! Receives text messages via long-polling (`getUpdates`) and answers with
//! `sendMessage` threaded onto the triggering message. Replies longer than
//! Telegram's limit go out as several messages.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::Channel;
use super::chunk::{TELEGRAM_MAX_LEN, chunk_text};
use crate::types::{
    AppError, BotIdentity, ConversationId, ConversationKind, InboundEvent, InboundMessage, Result,
    UserId,
};
use crate::utils::toml_config::TelegramConfig;

/// Default timeout for Telegram API calls (seconds)
const API_TIMEOUT_SECS: u64 = 30;

/// Pause after a failed poll before trying again
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Telegram channel implementation
#[derive(Clone)]
pub struct TelegramChannel {
    bot_token: String,
    api_base: String,
    polling_timeout: u32,
    client: Client,
    /// Whether polling is active
    polling_active: Arc<AtomicBool>,
    /// Last update ID for long-polling
    last_update_id: Arc<AtomicI64>,
}

impl TelegramChannel {
    /// Create a new Telegram channel
    pub fn new(bot_token: impl Into<String>, config: &TelegramConfig) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            polling_timeout: config.polling_timeout,
            client: Client::new(),
            polling_active: Arc::new(AtomicBool::new(false)),
            last_update_id: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Return current last processed update ID.
    pub fn last_update_id(&self) -> i64 {
        self.last_update_id.load(Ordering::SeqCst)
    }

    pub fn is_polling(&self) -> bool {
        self.polling_active.load(Ordering::SeqCst)
    }

    /// Ask the polling task to stop after the current request.
    pub fn stop_polling(&self) {
        self.polling_active.store(false, Ordering::SeqCst);
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
        timeout: Duration,
    ) -> Result<T> {
        let response = self
            .client
            .post(self.api_url(method))
            .json(&params)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        let body: TelegramResponse<T> = response.json().await.map_err(|e| {
            AppError::Transport(format!("Telegram {} returned HTTP {}: {}", method, status, e))
        })?;

        if !body.ok {
            return Err(AppError::Transport(format!(
                "Telegram API error in {}: {}",
                method,
                body.description.unwrap_or_default()
            )));
        }
        body.result.ok_or_else(|| {
            AppError::Transport(format!("Telegram {} returned ok but no result", method))
        })
    }

    /// Discover the bot's own id and username by calling getMe
    pub async fn get_me(&self) -> Result<BotIdentity> {
        let user: TelegramUser = self
            .call(
                "getMe",
                serde_json::json!({}),
                Duration::from_secs(API_TIMEOUT_SECS),
            )
            .await?;

        Ok(BotIdentity {
            id: UserId(user.id),
            handle: user.username.unwrap_or_default(),
        })
    }

    /// Send message via Telegram API, split into as many messages as the
    /// length limit requires. Only the first one is threaded onto
    /// `reply_to_message_id`.
    pub async fn send_message(
        &self,
        chat_id: ConversationId,
        text: &str,
        reply_to_message_id: Option<i64>,
    ) -> Result<()> {
        let chunks = chunk_text(text, TELEGRAM_MAX_LEN);
        if chunks.len() > 1 {
            debug!(chat = %chat_id, parts = chunks.len(), "Splitting long reply");
        }

        let mut reply_to = reply_to_message_id;
        for chunk in &chunks {
            self.send_chunk(chat_id, chunk, reply_to.take()).await?;
        }
        Ok(())
    }

    async fn send_chunk(
        &self,
        chat_id: ConversationId,
        text: &str,
        reply_to_message_id: Option<i64>,
    ) -> Result<()> {
        let mut params = serde_json::json!({
            "chat_id": chat_id.0,
            "text": text,
        });
        if let Some(id) = reply_to_message_id {
            params["reply_parameters"] = serde_json::json!({
                "message_id": id,
                "allow_sending_without_reply": true,
            });
        }

        let _: serde_json::Value = self
            .call("sendMessage", params, Duration::from_secs(API_TIMEOUT_SECS))
            .await?;
        Ok(())
    }

    /// Poll for updates using long-polling
    pub async fn poll_updates(&self) -> Result<Vec<InboundEvent>> {
        let offset = self.last_update_id.load(Ordering::SeqCst);
        let params = serde_json::json!({
            "offset": if offset > 0 { offset + 1 } else { 0 },
            "timeout": self.polling_timeout,
            "allowed_updates": ["message"],
        });

        let updates: Vec<TelegramUpdate> = self
            .call(
                "getUpdates",
                params,
                Duration::from_secs(self.polling_timeout as u64 + 10),
            )
            .await?;

        if let Some(last) = updates.last() {
            self.last_update_id.store(last.update_id, Ordering::SeqCst);
        }

        Ok(updates
            .into_iter()
            .filter_map(convert_update)
            .map(InboundEvent::from_message)
            .collect())
    }

    /// Spawn the polling task and return the stream of inbound events
    pub fn start_receiving(&self) -> mpsc::UnboundedReceiver<InboundEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let channel = self.clone();

        tokio::spawn(async move {
            channel.polling_active.store(true, Ordering::SeqCst);
            info!("Starting Telegram polling");

            while channel.polling_active.load(Ordering::SeqCst) {
                match channel.poll_updates().await {
                    Ok(events) => {
                        for event in events {
                            debug!(
                                "Received Telegram message {} from {}",
                                event.message().message_id,
                                event.message().sender_id
                            );
                            if tx.send(event).is_err() {
                                warn!("Event receiver dropped, stopping polling");
                                channel.polling_active.store(false, Ordering::SeqCst);
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        error!("Telegram polling error: {}", e);
                        tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                    }
                }
            }

            info!("Telegram polling stopped");
        });

        rx
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    async fn reply(&self, to: &InboundMessage, text: &str) -> Result<()> {
        self.send_message(to.conversation_id, text, Some(to.message_id))
            .await
    }
}

/// Convert a Telegram update into a relay message.
///
/// Non-text updates and messages without an author are dropped.
fn convert_update(update: TelegramUpdate) -> Option<InboundMessage> {
    let message = update.message?;
    let from = message.from?;
    let text = message.text?;

    let conversation_kind = if message.chat.r#type == "private" {
        ConversationKind::Private
    } else {
        ConversationKind::Group
    };

    let sender_display_name = from
        .first_name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .or_else(|| from.username.clone())
        .unwrap_or_else(|| from.id.to_string());

    let reply_to_sender_id = message
        .reply_to_message
        .and_then(|reply| reply.from)
        .map(|author| UserId(author.id));

    Some(InboundMessage {
        message_id: message.message_id,
        conversation_id: ConversationId(message.chat.id),
        conversation_kind,
        sender_id: UserId(from.id),
        sender_display_name,
        text,
        reply_to_sender_id,
    })
}

// ============================================================================
// Telegram API Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramUpdate {
    update_id: i64,
    message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
struct TelegramMessage {
    message_id: i64,
    from: Option<TelegramUser>,
    chat: TelegramChat,
    text: Option<String>,
    reply_to_message: Option<Box<TelegramMessage>>,
}

#[derive(Debug, Deserialize, Clone)]
struct TelegramUser {
    id: i64,
    first_name: Option<String>,
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramChat {
    id: i64,
    r#type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(value: serde_json::Value) -> TelegramUpdate {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_convert_private_text() {
        let msg = convert_update(update(serde_json::json!({
            "update_id": 10,
            "message": {
                "message_id": 5,
                "from": {"id": 7, "is_bot": false, "first_name": "Ден", "username": "den"},
                "chat": {"id": 7, "type": "private"},
                "date": 0,
                "text": "привет"
            }
        })))
        .unwrap();

        assert_eq!(msg.conversation_kind, ConversationKind::Private);
        assert_eq!(msg.sender_display_name, "Ден");
        assert_eq!(msg.conversation_id, ConversationId(7));
        assert_eq!(msg.reply_to_sender_id, None);
    }

    #[test]
    fn test_convert_group_reply() {
        let msg = convert_update(update(serde_json::json!({
            "update_id": 11,
            "message": {
                "message_id": 6,
                "from": {"id": 8, "is_bot": false, "username": "vasya"},
                "chat": {"id": -100500, "type": "supergroup", "title": "Пацаны"},
                "date": 0,
                "text": "а ты что думаешь?",
                "reply_to_message": {
                    "message_id": 4,
                    "from": {"id": 1000, "is_bot": true, "first_name": "Расул"},
                    "chat": {"id": -100500, "type": "supergroup"},
                    "date": 0,
                    "text": "я тут"
                }
            }
        })))
        .unwrap();

        assert_eq!(msg.conversation_kind, ConversationKind::Group);
        assert_eq!(msg.sender_display_name, "vasya");
        assert_eq!(msg.reply_to_sender_id, Some(UserId(1000)));
    }

    #[test]
    fn test_convert_drops_non_text() {
        let dropped = convert_update(update(serde_json::json!({
            "update_id": 12,
            "message": {
                "message_id": 7,
                "from": {"id": 8, "is_bot": false, "first_name": "Вася"},
                "chat": {"id": -1, "type": "group"},
                "date": 0,
                "sticker": {"file_id": "x"}
            }
        })));
        assert!(dropped.is_none());

        let no_message = convert_update(update(serde_json::json!({"update_id": 13})));
        assert!(no_message.is_none());
    }

    #[test]
    fn test_api_url() {
        let channel = TelegramChannel::new(
            "123:ABC",
            &TelegramConfig {
                api_base: "http://localhost:8081/".to_string(),
                ..TelegramConfig::default()
            },
        );
        assert_eq!(
            channel.api_url("getMe"),
            "http://localhost:8081/bot123:ABC/getMe"
        );
        assert!(!channel.is_polling());
    }
}
