//! Memory commands
//!
//! Handles `/callme`, `/rememberme` and `/rememberuser`, which write to the
//! memory store directly and answer right away, plus `/start` and `/help`.

use crate::memory::MemoryStore;
use crate::types::{AppError, InboundMessage, Result, UserId};
use tracing::{debug, info};

pub const CALLME_USAGE: &str = "Ну ты кличку-то укажи, братишка. Пример: /callme Ден";
pub const REMEMBERME_USAGE: &str =
    "Напиши, что мне про тебя запомнить. Пример: /rememberme Мы ели пельмени";
pub const REMEMBERUSER_USAGE: &str = "Пиши так: /rememberuser <user_id> <факт>";
pub const REMEMBERUSER_BAD_ID: &str = "user_id должен быть числом, братишка.";
pub const REMEMBERED_SELF: &str = "Записал в блокнотик, братишка 📒";
pub const REMEMBERED_OTHER: &str = "Всё, добавил к истории этого челика.";

const HELP_TEXT: &str = "Я Расул Младший, братишка. Пиши мне в личку или зови по имени в чате.\n\n\
/callme <кличка> — как мне тебя называть\n\
/rememberme <факт> — запомню что-нибудь про тебя\n\
/rememberuser <user_id> <факт> — запомню что-нибудь про другого";

/// A parsed command the relay knows how to run.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetNickname(Vec<String>),
    RememberSelfFact(Vec<String>),
    RememberAboutOther(Vec<String>),
    Help,
}

impl Command {
    /// Map a command name to a handler; `None` for commands this bot ignores.
    pub fn parse(name: &str, args: &[String]) -> Option<Self> {
        let args = args.to_vec();
        match name {
            "callme" => Some(Command::SetNickname(args)),
            "rememberme" => Some(Command::RememberSelfFact(args)),
            "rememberuser" => Some(Command::RememberAboutOther(args)),
            "start" | "help" => Some(Command::Help),
            _ => None,
        }
    }

    /// Run the command against the store and return the confirmation text.
    ///
    /// Validation failures are [`AppError::InvalidArgument`] carrying the
    /// usage hint that should be shown to the user.
    pub fn execute(&self, store: &MemoryStore, sender: UserId) -> Result<String> {
        match self {
            Command::SetNickname(args) => set_nickname(store, sender, args),
            Command::RememberSelfFact(args) => remember_self_fact(store, sender, args),
            Command::RememberAboutOther(args) => remember_about_other(store, args),
            Command::Help => Ok(HELP_TEXT.to_string()),
        }
    }
}

/// `/callme <nickname...>`
pub fn set_nickname(store: &MemoryStore, user: UserId, args: &[String]) -> Result<String> {
    let nickname = args.join(" ");
    if nickname.trim().is_empty() {
        return Err(AppError::InvalidArgument(CALLME_USAGE.to_string()));
    }

    store
        .set_nickname(user, &nickname)
        .map_err(|_| AppError::InvalidArgument(CALLME_USAGE.to_string()))?;
    info!(user = %user, "Nickname updated");
    Ok(format!("Всё, теперь ты у меня {}.", nickname.trim()))
}

/// `/rememberme <fact...>`
pub fn remember_self_fact(store: &MemoryStore, user: UserId, args: &[String]) -> Result<String> {
    let fact = args.join(" ");
    if fact.trim().is_empty() {
        return Err(AppError::InvalidArgument(REMEMBERME_USAGE.to_string()));
    }

    let added = store
        .append_fact(user, &fact)
        .map_err(|_| AppError::InvalidArgument(REMEMBERME_USAGE.to_string()))?;
    info!(user = %user, added, "Self fact remembered");
    Ok(REMEMBERED_SELF.to_string())
}

/// `/rememberuser <user_id> <fact...>`
pub fn remember_about_other(store: &MemoryStore, args: &[String]) -> Result<String> {
    if args.len() < 2 {
        return Err(AppError::InvalidArgument(REMEMBERUSER_USAGE.to_string()));
    }

    let target: UserId = args[0]
        .parse()
        .map_err(|_| AppError::InvalidArgument(REMEMBERUSER_BAD_ID.to_string()))?;
    let fact = args[1..].join(" ");

    let added = store
        .append_fact(target, &fact)
        .map_err(|_| AppError::InvalidArgument(REMEMBERUSER_USAGE.to_string()))?;
    info!(target = %target, added, "Fact about another user remembered");
    Ok(REMEMBERED_OTHER.to_string())
}

/// Run a command and produce the text to send back.
///
/// Returns `None` for unknown commands, which are ignored.
pub fn respond(
    store: &MemoryStore,
    name: &str,
    args: &[String],
    message: &InboundMessage,
) -> Option<Result<String>> {
    let Some(command) = Command::parse(name, args) else {
        debug!(command = name, "Ignoring unknown command");
        return None;
    };
    Some(command.execute(store, message.sender_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEN: UserId = UserId(7);

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn hint(err: AppError) -> String {
        match err {
            AppError::InvalidArgument(hint) => hint,
            other => panic!("expected InvalidArgument, got {:?}", other),
        }
    }

    #[test]
    fn test_callme_sets_nickname() {
        let store = MemoryStore::default();
        let reply = set_nickname(&store, DEN, &args(&["Большой", "Ден"])).unwrap();

        assert_eq!(reply, "Всё, теперь ты у меня Большой Ден.");
        assert_eq!(
            store.get_profile(DEN).unwrap().nickname.as_deref(),
            Some("Большой Ден")
        );
    }

    #[test]
    fn test_callme_without_args_prompts() {
        let store = MemoryStore::default();
        let err = set_nickname(&store, DEN, &[]).unwrap_err();
        assert_eq!(hint(err), CALLME_USAGE);
        assert_eq!(store.profile_count(), 0);
    }

    #[test]
    fn test_rememberme_appends() {
        let store = MemoryStore::default();
        remember_self_fact(&store, DEN, &args(&["ест", "пельмени"])).unwrap();
        remember_self_fact(&store, DEN, &args(&["любит", "самокаты"])).unwrap();

        assert_eq!(
            store.get_profile(DEN).unwrap().facts,
            vec!["ест пельмени", "любит самокаты"]
        );
    }

    #[test]
    fn test_rememberme_without_args_prompts() {
        let store = MemoryStore::default();
        assert_eq!(hint(remember_self_fact(&store, DEN, &[]).unwrap_err()), REMEMBERME_USAGE);
    }

    #[test]
    fn test_rememberuser_rejects_non_numeric_id() {
        let store = MemoryStore::default();
        let err = remember_about_other(&store, &args(&["abc", "fact"])).unwrap_err();

        assert_eq!(hint(err), REMEMBERUSER_BAD_ID);
        assert_eq!(store.profile_count(), 0);
    }

    #[test]
    fn test_rememberuser_requires_two_args() {
        let store = MemoryStore::default();
        let err = remember_about_other(&store, &args(&["42"])).unwrap_err();
        assert_eq!(hint(err), REMEMBERUSER_USAGE);
        assert_eq!(store.profile_count(), 0);
    }

    #[test]
    fn test_rememberuser_appends_to_target() {
        let store = MemoryStore::default();
        let reply =
            remember_about_other(&store, &args(&["42", "любит", "рестораны"])).unwrap();

        assert_eq!(reply, REMEMBERED_OTHER);
        assert_eq!(store.get_profile(UserId(42)).unwrap().facts, vec!["любит рестораны"]);
        assert!(store.get_profile(DEN).is_none());
    }

    #[test]
    fn test_parse_known_and_unknown() {
        assert_eq!(Command::parse("help", &[]), Some(Command::Help));
        assert_eq!(
            Command::parse("callme", &args(&["Ден"])),
            Some(Command::SetNickname(args(&["Ден"])))
        );
        assert_eq!(Command::parse("weather", &[]), None);
    }
}
