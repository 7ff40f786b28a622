//! Exchange orchestration.
//!
//! One inbound message moves through
//! `Idle -> Gated -> Building -> Generating -> Persisting -> Replying -> Idle`.
//! A backend failure takes the `Failed` branch straight to `Replying` with
//! the configured fallback text and leaves the store untouched.
//!
//! The conversation lock is held from `Building` through `Persisting`, so two
//! exchanges in the same chat never interleave their read-compose-write
//! cycle. Replies are sent after the lock is released.

pub mod commands;
pub mod dispatcher;

pub use dispatcher::{DispatchOutcome, serve};

use crate::channel::Channel;
use crate::context::ContextBuilder;
use crate::gate::ResponseGate;
use crate::llm::LLMClient;
use crate::memory::MemoryStore;
use crate::types::{BotIdentity, InboundMessage, Message, Result};
use crate::utils::toml_config::RelayConfigManager;
use std::fmt;
use std::sync::Arc;
use tracing::{Instrument, debug, error, info_span, warn};
use uuid::Uuid;

/// Step of a single exchange, used for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    Gated,
    Building,
    Generating,
    Persisting,
    Failed,
    Replying,
}

impl fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExchangeState::Idle => "idle",
            ExchangeState::Gated => "gated",
            ExchangeState::Building => "building",
            ExchangeState::Generating => "generating",
            ExchangeState::Persisting => "persisting",
            ExchangeState::Failed => "failed",
            ExchangeState::Replying => "replying",
        };
        f.write_str(name)
    }
}

/// How an exchange ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeOutcome {
    /// The gate said no; nothing was sent or stored
    Ignored,
    /// The backend answered; the turn and reply were stored and sent
    Replied { reply: String },
    /// The backend failed; the fallback text was sent and nothing stored
    FellBack { error: String },
}

/// Ties the gate, context builder, backend, store and transport together.
pub struct Relay {
    store: Arc<MemoryStore>,
    client: Arc<dyn LLMClient>,
    config: Arc<RelayConfigManager>,
    identity: BotIdentity,
}

impl Relay {
    pub fn new(
        store: Arc<MemoryStore>,
        client: Arc<dyn LLMClient>,
        config: Arc<RelayConfigManager>,
        identity: BotIdentity,
    ) -> Self {
        Self {
            store,
            client,
            config,
            identity,
        }
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub fn identity(&self) -> &BotIdentity {
        &self.identity
    }

    /// Run one exchange for a plain (non-command) message.
    ///
    /// Returns `Err` only when the transport fails to deliver the reply; the
    /// store already reflects the exchange in that case.
    pub async fn handle_message(
        &self,
        message: &InboundMessage,
        channel: &dyn Channel,
    ) -> Result<ExchangeOutcome> {
        let config = self.config.config();
        let gate = ResponseGate::new(&config.persona.wake_words);
        if !gate.should_respond(message, &self.identity) {
            return Ok(ExchangeOutcome::Ignored);
        }

        let span = info_span!(
            "exchange",
            id = %Uuid::new_v4(),
            conversation = %message.conversation_id,
            sender = %message.sender_id,
        );

        async move {
            debug!(state = %ExchangeState::Gated, "Message accepted");

            let guard = self.store.lock_conversation(message.conversation_id).await;

            debug!(state = %ExchangeState::Building, "Composing context");
            let history = self.store.get_history(message.conversation_id);
            let profile = self.store.get_profile(message.sender_id);
            let context = ContextBuilder::new(config.persona.reminder_template.clone()).build(
                history,
                profile.as_ref(),
                &message.sender_display_name,
                message.sender_id,
                &message.text,
            );

            debug!(
                state = %ExchangeState::Generating,
                model = self.client.model_name(),
                context_len = context.messages().len(),
                "Calling backend"
            );
            let generated = self
                .client
                .generate(&context.messages(), &context.turn_text())
                .await;

            let (reply, outcome) = match generated {
                Ok(reply) => {
                    debug!(state = %ExchangeState::Persisting, "Storing exchange");
                    self.store.append_and_trim(
                        message.conversation_id,
                        vec![context.turn.clone(), Message::model(reply.clone())],
                    );
                    (reply.clone(), ExchangeOutcome::Replied { reply })
                }
                Err(e) => {
                    error!(state = %ExchangeState::Failed, "Generation failed: {}", e);
                    (
                        config.persona.fallback_reply.clone(),
                        ExchangeOutcome::FellBack {
                            error: e.to_string(),
                        },
                    )
                }
            };
            drop(guard);

            debug!(state = %ExchangeState::Replying, "Sending reply");
            if let Err(e) = channel.reply(message, &reply).await {
                warn!("Failed to deliver reply: {}", e);
                return Err(e);
            }

            debug!(state = %ExchangeState::Idle, "Exchange complete");
            Ok(outcome)
        }
        .instrument(span)
        .await
    }
}
