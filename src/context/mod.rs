//! Context assembly for the generation backend.
//!
//! Composes prior history, an optional reminder of what the bot knows about
//! the sender, and the new message framed with the sender's nickname. Reads
//! only; persisting the outcome is the orchestrator's job.

use crate::memory::{UserProfile, placeholder_nickname};
use crate::types::{Message, UserId};

/// Reminder template used when the configuration does not override it.
/// `{nickname}` and `{facts}` are substituted.
pub const DEFAULT_REMINDER_TEMPLATE: &str = "Вот что ты знаешь про {nickname}: {facts}";

/// Exactly what one exchange sends to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedContext {
    /// Prior history, oldest first
    pub history: Vec<Message>,
    /// In-band reminder of known facts, present only when facts exist
    pub reminder: Option<Message>,
    /// `"{nickname}: {text}"` as a user entry
    pub turn: Message,
    /// The nickname used for framing
    pub nickname: String,
}

impl ComposedContext {
    /// History, then reminder, then the framed turn.
    pub fn messages(&self) -> Vec<Message> {
        let mut messages = self.history.clone();
        messages.extend(self.reminder.clone());
        messages.push(self.turn.clone());
        messages
    }

    /// Text of the framed turn, sent again as the immediate prompt.
    pub fn turn_text(&self) -> String {
        self.turn.text()
    }

    /// Number of entries added on top of the prior history.
    pub fn new_entries(&self) -> usize {
        1 + usize::from(self.reminder.is_some())
    }
}

/// Builds [`ComposedContext`] values.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    reminder_template: String,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_REMINDER_TEMPLATE)
    }
}

impl ContextBuilder {
    pub fn new(reminder_template: impl Into<String>) -> Self {
        Self {
            reminder_template: reminder_template.into(),
        }
    }

    /// Resolve the nickname used to address `sender`.
    ///
    /// Explicit nickname first, then the transport display name, then a
    /// placeholder carrying the id.
    pub fn resolve_nickname(
        profile: Option<&UserProfile>,
        display_name: &str,
        sender: UserId,
    ) -> String {
        let display_name = display_name.trim();
        let fallback = if display_name.is_empty() {
            placeholder_nickname(sender)
        } else {
            display_name.to_string()
        };
        match profile {
            Some(profile) => profile.nickname_or(&fallback).to_string(),
            None => fallback,
        }
    }

    pub fn reminder(&self, nickname: &str, profile: &UserProfile) -> Option<Message> {
        if !profile.has_facts() {
            return None;
        }
        let text = self
            .reminder_template
            .replace("{nickname}", nickname)
            .replace("{facts}", &profile.facts_text());
        Some(Message::user(text))
    }

    pub fn frame(nickname: &str, text: &str) -> Message {
        Message::user(format!("{}: {}", nickname, text))
    }

    pub fn build(
        &self,
        history: Vec<Message>,
        profile: Option<&UserProfile>,
        display_name: &str,
        sender: UserId,
        text: &str,
    ) -> ComposedContext {
        let nickname = Self::resolve_nickname(profile, display_name, sender);
        let reminder = profile.and_then(|p| self.reminder(&nickname, p));
        let turn = Self::frame(&nickname, text);

        ComposedContext {
            history,
            reminder,
            turn,
            nickname,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    const DEN: UserId = UserId(7);

    #[test]
    fn test_build_without_profile_has_single_new_entry() {
        let ctx = ContextBuilder::default().build(vec![], None, "Ден", DEN, "привет");

        assert!(ctx.reminder.is_none());
        assert_eq!(ctx.new_entries(), 1);
        assert_eq!(ctx.turn_text(), "Ден: привет");
        assert_eq!(ctx.messages().len(), 1);
    }

    #[test]
    fn test_build_with_facts_adds_reminder_before_turn() {
        let profile = UserProfile {
            nickname: Some("Денчик".to_string()),
            facts: vec!["ест пельмени".to_string(), "любит самокаты".to_string()],
        };
        let history = vec![Message::user("Вася: йо"), Message::model("здарова")];

        let ctx = ContextBuilder::default().build(history, Some(&profile), "Денис", DEN, "как дела");
        let messages = ctx.messages();

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].text(), "Вася: йо");
        assert_eq!(
            messages[2].text(),
            "Вот что ты знаешь про Денчик: ест пельмени; любит самокаты"
        );
        assert_eq!(messages[2].role, Role::User);
        assert_eq!(messages[3].text(), "Денчик: как дела");
    }

    #[test]
    fn test_profile_without_facts_has_no_reminder() {
        let profile = UserProfile {
            nickname: Some("Ден".to_string()),
            facts: vec![],
        };
        let ctx = ContextBuilder::default().build(vec![], Some(&profile), "Денис", DEN, "йо");
        assert!(ctx.reminder.is_none());
        assert_eq!(ctx.turn_text(), "Ден: йо");
    }

    #[test]
    fn test_nickname_fallbacks() {
        let no_nick = UserProfile::default();
        assert_eq!(
            ContextBuilder::resolve_nickname(Some(&no_nick), "Денис", DEN),
            "Денис"
        );
        assert_eq!(ContextBuilder::resolve_nickname(None, "  ", DEN), "user 7");
    }

    #[test]
    fn test_custom_template() {
        let builder = ContextBuilder::new("{nickname} -> {facts}");
        let profile = UserProfile {
            nickname: None,
            facts: vec!["любит рестораны".to_string()],
        };
        let ctx = builder.build(vec![], Some(&profile), "Ден", DEN, "ну");
        assert_eq!(ctx.reminder.unwrap().text(), "Ден -> любит рестораны");
    }
}
