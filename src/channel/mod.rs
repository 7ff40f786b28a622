//! Message transport.
//!
//! The relay only needs one thing from a transport: a way to answer the
//! message that triggered an exchange. Receiving is transport specific; see
//! [`telegram::TelegramChannel::start_receiving`].

pub mod chunk;
pub mod telegram;

pub use telegram::TelegramChannel;

use crate::types::{InboundMessage, Result};
use async_trait::async_trait;

/// Reply sink used by the orchestrator and command handlers.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Send `text` as a reply to `to`. No delivery guarantee.
    async fn reply(&self, to: &InboundMessage, text: &str) -> Result<()>;
}
