//! Response gate: decides whether the persona answers a message at all.
//!
//! The bot always answers in private chats. In groups it answers when it is
//! called by one of its wake-words or `@handle`, or when someone replies to
//! one of its own messages.

use crate::types::{BotIdentity, ConversationKind, InboundMessage};

/// Wake-words used when the configuration does not provide any.
pub const DEFAULT_WAKE_WORDS: &[&str] = &["расул", "заменитель"];

/// Case-insensitive matcher over a fixed wake-word set.
#[derive(Debug, Clone)]
pub struct ResponseGate {
    wake_words: Vec<String>,
}

impl Default for ResponseGate {
    fn default() -> Self {
        Self::new(DEFAULT_WAKE_WORDS.iter().copied())
    }
}

impl ResponseGate {
    /// Build a gate; blank wake-words are dropped.
    pub fn new<I, S>(wake_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wake_words = wake_words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { wake_words }
    }

    pub fn wake_words(&self) -> &[String] {
        &self.wake_words
    }

    /// True when `text` names the bot by wake-word or `@handle`.
    pub fn is_mentioned(&self, text: &str, bot_handle: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let lowered = text.to_lowercase();

        if self.wake_words.iter().any(|w| lowered.contains(w.as_str())) {
            return true;
        }

        let handle = bot_handle.trim().trim_start_matches('@');
        !handle.is_empty() && lowered.contains(&format!("@{}", handle.to_lowercase()))
    }

    /// The raw decision: private OR mentioned OR reply-to-bot.
    pub fn decide(
        &self,
        text: &str,
        kind: ConversationKind,
        is_reply_to_bot: bool,
        bot_handle: &str,
    ) -> bool {
        kind == ConversationKind::Private || is_reply_to_bot || self.is_mentioned(text, bot_handle)
    }

    /// Decision for an inbound message as seen by `bot`.
    pub fn should_respond(&self, message: &InboundMessage, bot: &BotIdentity) -> bool {
        let is_reply_to_bot = message.reply_to_sender_id == Some(bot.id);
        let decision = self.decide(
            &message.text,
            message.conversation_kind,
            is_reply_to_bot,
            &bot.handle,
        );
        tracing::debug!(
            conversation = %message.conversation_id,
            sender = %message.sender_id,
            is_reply_to_bot,
            decision,
            "Response gate evaluated"
        );
        decision
    }
}
