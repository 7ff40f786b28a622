//! # relay - Conversational relay bot
//!
//! A Telegram bot that decides when to answer, keeps a bounded per-chat
//! history plus per-user memory, and relays replies from a generative-text
//! backend in the voice of a fixed persona.
//!
//! ## Overview
//!
//! The crate can be used in two ways:
//!
//! 1. **As a standalone bot** - Run the `relay-bot` binary
//! 2. **As a library** - Drive [`Relay`] from your own transport
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use relay::{LLMClientFactory, MemoryStore, Relay, RelayConfigManager};
//! use relay::channel::TelegramChannel;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = Arc::new(RelayConfigManager::new("relay.toml")?);
//!     let config = manager.config();
//!
//!     let store = Arc::new(MemoryStore::new(config.memory_limits()));
//!     let client = LLMClientFactory::from_config(&config)?.create_default().await?;
//!     let channel = Arc::new(TelegramChannel::new(config.bot_token()?, &config.telegram));
//!     let identity = channel.get_me().await?;
//!
//!     let events = channel.start_receiving();
//!     let bot = Arc::new(Relay::new(store, Arc::from(client), manager, identity));
//!     relay::serve(bot, channel, events).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama local inference (default) |
//!
//! Gemini needs no feature; build with `--no-default-features` for a
//! Gemini-only binary.
//!
//! ## Modules
//!
//! - [`memory`] - Per-conversation history and per-user profiles
//! - [`gate`] - Whether a message deserves a reply
//! - [`context`] - Context assembly for the backend
//! - [`relay`] - Exchange orchestration, memory commands, dispatch
//! - [`llm`] - Generation backends (Gemini, Ollama)
//! - [`channel`] - Transports (Telegram)
//! - [`types`] - Common types and error handling
//!
//! ## Architecture
//!
//! All settings live in `relay.toml`; secrets come from environment variables
//! it names. Persona settings hot-reload, memory limits are fixed at startup.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Message transports.
pub mod channel;
/// Command-line interface for the `relay-bot` binary.
pub mod cli;
/// Context assembly (history, reminder, framed turn).
pub mod context;
/// Response gating (wake-words, mentions, replies).
pub mod gate;
/// LLM provider clients and abstractions.
pub mod llm;
/// Conversation history and user profiles.
pub mod memory;
/// Exchange orchestration and command handling.
pub mod relay;
/// Core types (identifiers, messages, errors).
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

// Re-export commonly used types
pub use channel::{Channel, TelegramChannel};
pub use context::{ComposedContext, ContextBuilder};
pub use gate::ResponseGate;
pub use llm::{LLMClient, LLMClientFactory, Provider};
pub use memory::{MemoryLimits, MemoryStore, UserProfile};
pub use relay::{DispatchOutcome, ExchangeOutcome, Relay, serve};
pub use types::{AppError, Result};
pub use utils::toml_config::{RelayConfig, RelayConfigManager};
