use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============= Identifiers =============

/// Identifier of a chat or channel. Keys conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub i64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a message author. Keys user profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(UserId)
    }
}

// ============= Conversation Types =============

/// Author role of a history entry.
///
/// `Model` is the assistant persona; the name follows the wire vocabulary of
/// the Gemini API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One history entry: a role plus an ordered, non-empty list of text parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    parts: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Build a message from explicit parts. Fails when `parts` is empty.
    pub fn new(role: Role, parts: Vec<String>) -> Result<Self> {
        if parts.is_empty() {
            return Err(AppError::InvalidArgument(
                "message must have at least one part".to_string(),
            ));
        }
        Ok(Self {
            role,
            parts,
            timestamp: Utc::now(),
        })
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::single(Role::User, text.into())
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::single(Role::Model, text.into())
    }

    fn single(role: Role, text: String) -> Self {
        Self {
            role,
            parts: vec![text],
            timestamp: Utc::now(),
        }
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// All parts joined with newlines.
    pub fn text(&self) -> String {
        self.parts.join("\n")
    }
}

/// Whether a conversation is a one-to-one chat with the bot or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Private,
    Group,
}

/// A plain text message delivered by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Transport-level id of the message, used to thread the reply
    pub message_id: i64,
    pub conversation_id: ConversationId,
    pub conversation_kind: ConversationKind,
    pub sender_id: UserId,
    /// First name (or username) of the author as the transport reports it
    pub sender_display_name: String,
    pub text: String,
    /// Author of the message this one replies to, if any
    pub reply_to_sender_id: Option<UserId>,
}

/// The bot's own account on the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: UserId,
    /// Username without the leading `@`
    pub handle: String,
}

/// Everything the transport can hand to the relay.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Message(InboundMessage),
    Command {
        /// Lower-cased command name without the slash or `@bot` suffix
        name: String,
        /// Bot named by an `@bot` suffix, if the command carried one
        target: Option<String>,
        args: Vec<String>,
        message: InboundMessage,
    },
}

impl InboundEvent {
    /// Classify a message as a command (`/name args...`) or plain text.
    pub fn from_message(message: InboundMessage) -> Self {
        let Some(rest) = message.text.trim_start().strip_prefix('/') else {
            return InboundEvent::Message(message);
        };

        let mut tokens = rest.split_whitespace();
        let head = tokens.next().unwrap_or_default();
        let (name, target) = match head.split_once('@') {
            Some((name, target)) => (name, Some(target.to_string())),
            None => (head, None),
        };
        let name = name.to_lowercase();
        if name.is_empty() {
            return InboundEvent::Message(message);
        }
        let args = tokens.map(str::to_string).collect();

        InboundEvent::Command {
            name,
            target,
            args,
            message,
        }
    }

    pub fn message(&self) -> &InboundMessage {
        match self {
            InboundEvent::Message(message) => message,
            InboundEvent::Command { message, .. } => message,
        }
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed user input. The payload is the corrective hint shown to the user.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn inbound(text: &str) -> InboundMessage {
        InboundMessage {
            message_id: 1,
            conversation_id: ConversationId(-100),
            conversation_kind: ConversationKind::Group,
            sender_id: UserId(7),
            sender_display_name: "Ден".to_string(),
            text: text.to_string(),
            reply_to_sender_id: None,
        }
    }

    #[test]
    fn test_message_rejects_empty_parts() {
        assert!(Message::new(Role::User, vec![]).is_err());
        let msg = Message::new(Role::Model, vec!["a".into(), "b".into()]).unwrap();
        assert_eq!(msg.text(), "a\nb");
    }

    #[test]
    fn test_user_id_parse() {
        assert_eq!("42".parse::<UserId>().unwrap(), UserId(42));
        assert_eq!(" -5 ".parse::<UserId>().unwrap(), UserId(-5));
        assert!("abc".parse::<UserId>().is_err());
    }

    #[test]
    fn test_command_parsing_strips_bot_suffix() {
        match InboundEvent::from_message(inbound("/CallMe@rasul_bot Большой Ден")) {
            InboundEvent::Command {
                name, target, args, ..
            } => {
                assert_eq!(name, "callme");
                assert_eq!(target.as_deref(), Some("rasul_bot"));
                assert_eq!(args, vec!["Большой", "Ден"]);
            }
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[test]
    fn test_command_without_suffix_has_no_target() {
        match InboundEvent::from_message(inbound("/help")) {
            InboundEvent::Command { name, target, args, .. } => {
                assert_eq!(name, "help");
                assert_eq!(target, None);
                assert!(args.is_empty());
            }
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_text_is_message() {
        assert!(matches!(
            InboundEvent::from_message(inbound("привет")),
            InboundEvent::Message(_)
        ));
        assert!(matches!(
            InboundEvent::from_message(inbound("/")),
            InboundEvent::Message(_)
        ));
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Model).unwrap(), "\"model\"");
        assert_eq!(Role::User.as_str(), "user");
    }
}
