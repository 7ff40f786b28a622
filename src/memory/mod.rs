//! Process-lifetime memory: per-conversation history and per-user profiles.
//!
//! This module provides:
//! - [`MemoryStore`], the single owner of all relay state
//! - [`UserProfile`] with nickname resolution and fact formatting
//! - Per-conversation locks that serialize exchanges for one chat
//!
//! Nothing here performs I/O. The store is built once at startup and shared
//! by `Arc` with the orchestrator and command handlers.

pub mod history;

pub use history::ConversationHistory;

use crate::types::{AppError, ConversationId, Message, Result, UserId};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Default number of history entries kept per conversation.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Default number of facts kept per user before the oldest are evicted.
pub const DEFAULT_MAX_FACTS: usize = 50;

/// Separator used when facts are rendered into a single line.
pub const FACT_SEPARATOR: &str = "; ";

/// What the bot remembers about one user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProfile {
    /// Explicit nickname set through `/callme`
    pub nickname: Option<String>,
    /// Facts in the order they were remembered
    pub facts: Vec<String>,
}

impl UserProfile {
    /// The explicit nickname, or `fallback` when none was set.
    pub fn nickname_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.nickname.as_deref().unwrap_or(fallback)
    }

    pub fn has_facts(&self) -> bool {
        !self.facts.is_empty()
    }

    /// Facts joined into one line, oldest first.
    pub fn facts_text(&self) -> String {
        self.facts.join(FACT_SEPARATOR)
    }
}

/// Placeholder name for a user the bot has never seen a display name for.
pub fn placeholder_nickname(user_id: UserId) -> String {
    format!("user {}", user_id)
}

/// Limits applied by the store.
#[derive(Debug, Clone, Copy)]
pub struct MemoryLimits {
    pub history_limit: usize,
    pub max_facts: usize,
}

impl Default for MemoryLimits {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            max_facts: DEFAULT_MAX_FACTS,
        }
    }
}

/// Owner of conversation histories and user profiles.
///
/// Map locks are synchronous and never held across an `.await`. Exchanges
/// that read, compose and then write one conversation take the async guard
/// from [`MemoryStore::lock_conversation`] for the whole cycle.
#[derive(Default)]
pub struct MemoryStore {
    limits: MemoryLimits,
    histories: RwLock<HashMap<ConversationId, ConversationHistory>>,
    profiles: RwLock<HashMap<UserId, UserProfile>>,
    conversation_locks: Mutex<HashMap<ConversationId, Arc<AsyncMutex<()>>>>,
}

impl MemoryStore {
    pub fn new(limits: MemoryLimits) -> Self {
        Self {
            limits,
            ..Default::default()
        }
    }

    pub fn limits(&self) -> MemoryLimits {
        self.limits
    }

    /// History of a conversation, oldest first. Empty if unknown.
    pub fn get_history(&self, conversation_id: ConversationId) -> Vec<Message> {
        self.histories
            .read()
            .get(&conversation_id)
            .map(ConversationHistory::get_messages)
            .unwrap_or_default()
    }

    /// Append messages to a conversation and keep only the newest entries.
    ///
    /// There is no deduplication; callers invoke this once per exchange.
    pub fn append_and_trim(&self, conversation_id: ConversationId, messages: Vec<Message>) {
        let limit = self.limits.history_limit;
        self.histories
            .write()
            .entry(conversation_id)
            .or_insert_with(|| ConversationHistory::new(limit))
            .extend(messages);
    }

    pub fn get_profile(&self, user_id: UserId) -> Option<UserProfile> {
        self.profiles.read().get(&user_id).cloned()
    }

    /// Create the profile if needed and overwrite its nickname.
    pub fn set_nickname(&self, user_id: UserId, nickname: &str) -> Result<()> {
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(AppError::InvalidArgument(
                "nickname must not be empty".to_string(),
            ));
        }

        self.profiles.write().entry(user_id).or_default().nickname = Some(nickname.to_string());
        Ok(())
    }

    /// Create the profile if needed and remember one more fact.
    ///
    /// Returns `false` when the exact fact was already known.
    pub fn append_fact(&self, user_id: UserId, fact: &str) -> Result<bool> {
        let fact = fact.trim();
        if fact.is_empty() {
            return Err(AppError::InvalidArgument("fact must not be empty".to_string()));
        }

        let mut profiles = self.profiles.write();
        let profile = profiles.entry(user_id).or_default();
        if profile.facts.iter().any(|known| known == fact) {
            return Ok(false);
        }

        profile.facts.push(fact.to_string());
        if profile.facts.len() > self.limits.max_facts {
            let overflow = profile.facts.len() - self.limits.max_facts;
            profile.facts.drain(..overflow);
        }
        Ok(true)
    }

    /// Serialize exchanges for one conversation.
    ///
    /// The guard is owned so it can live across the backend call.
    pub async fn lock_conversation(&self, conversation_id: ConversationId) -> OwnedMutexGuard<()> {
        let lock = self
            .conversation_locks
            .lock()
            .entry(conversation_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    pub fn conversation_count(&self) -> usize {
        self.histories.read().len()
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAT: ConversationId = ConversationId(-1001);
    const DEN: UserId = UserId(7);

    #[test]
    fn test_get_history_absent_is_empty() {
        let store = MemoryStore::default();
        assert!(store.get_history(CHAT).is_empty());
        assert_eq!(store.conversation_count(), 0);
    }

    #[test]
    fn test_append_and_trim_bounds_history() {
        let store = MemoryStore::default();
        for i in 0..15 {
            store.append_and_trim(
                CHAT,
                vec![Message::user(format!("q{}", i)), Message::model(format!("a{}", i))],
            );
            assert!(store.get_history(CHAT).len() <= DEFAULT_HISTORY_LIMIT);
        }

        let history = store.get_history(CHAT);
        assert_eq!(history.len(), 20);
        assert_eq!(history[0].text(), "q5");
        assert_eq!(history[19].text(), "a14");
    }

    #[test]
    fn test_set_nickname_overwrites() {
        let store = MemoryStore::default();
        store.set_nickname(DEN, "Денчик").unwrap();
        store.set_nickname(DEN, "Ден").unwrap();
        assert_eq!(store.get_profile(DEN).unwrap().nickname.as_deref(), Some("Ден"));
    }

    #[test]
    fn test_set_nickname_rejects_blank() {
        let store = MemoryStore::default();
        let err = store.set_nickname(DEN, "   ").unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
        assert!(store.get_profile(DEN).is_none());
    }

    #[test]
    fn test_append_fact_keeps_insertion_order() {
        let store = MemoryStore::default();
        store.append_fact(DEN, "ест пельмени").unwrap();
        store.append_fact(DEN, "любит самокаты").unwrap();

        let facts = store.get_profile(DEN).unwrap().facts_text();
        let first = facts.find("ест пельмени").unwrap();
        let second = facts.find("любит самокаты").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_append_fact_skips_duplicates() {
        let store = MemoryStore::default();
        assert!(store.append_fact(DEN, "ест пельмени").unwrap());
        assert!(!store.append_fact(DEN, " ест пельмени ").unwrap());
        assert_eq!(store.get_profile(DEN).unwrap().facts.len(), 1);
    }

    #[test]
    fn test_append_fact_evicts_oldest_over_cap() {
        let store = MemoryStore::new(MemoryLimits {
            history_limit: 20,
            max_facts: 2,
        });
        for fact in ["один", "два", "три"] {
            store.append_fact(DEN, fact).unwrap();
        }
        assert_eq!(store.get_profile(DEN).unwrap().facts, vec!["два", "три"]);
    }

    #[test]
    fn test_append_fact_creates_profile_without_nickname() {
        let store = MemoryStore::default();
        store.append_fact(UserId(99), "ходит в рестораны").unwrap();

        let profile = store.get_profile(UserId(99)).unwrap();
        assert!(profile.nickname.is_none());
        assert_eq!(profile.nickname_or("Вася"), "Вася");
        assert_eq!(placeholder_nickname(UserId(99)), "user 99");
    }

    #[tokio::test]
    async fn test_conversation_lock_is_per_conversation() {
        let store = MemoryStore::default();
        let _guard = store.lock_conversation(CHAT).await;

        // A different conversation is not blocked.
        let _other = store.lock_conversation(ConversationId(5)).await;

        // The same conversation is.
        let same = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            store.lock_conversation(CHAT),
        )
        .await;
        assert!(same.is_err());
    }
}
