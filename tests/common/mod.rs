#![allow(dead_code)]

pub mod mocks;

use relay::types::{BotIdentity, ConversationId, ConversationKind, InboundMessage, UserId};

pub const BOT_ID: UserId = UserId(1000);
pub const BOT_HANDLE: &str = "rasul_bot";

pub fn bot_identity() -> BotIdentity {
    BotIdentity {
        id: BOT_ID,
        handle: BOT_HANDLE.to_string(),
    }
}

/// A private-chat message from `sender` named `name`.
pub fn private_message(sender: i64, name: &str, text: &str) -> InboundMessage {
    InboundMessage {
        message_id: 1,
        conversation_id: ConversationId(sender),
        conversation_kind: ConversationKind::Private,
        sender_id: UserId(sender),
        sender_display_name: name.to_string(),
        text: text.to_string(),
        reply_to_sender_id: None,
    }
}

/// A group message in chat `chat` from `sender` named `name`.
pub fn group_message(chat: i64, sender: i64, name: &str, text: &str) -> InboundMessage {
    InboundMessage {
        message_id: 2,
        conversation_id: ConversationId(chat),
        conversation_kind: ConversationKind::Group,
        sender_id: UserId(sender),
        sender_display_name: name.to_string(),
        text: text.to_string(),
        reply_to_sender_id: None,
    }
}
