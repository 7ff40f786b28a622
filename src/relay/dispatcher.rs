//! Event dispatch and the serve loop.

use super::commands;
use super::{ExchangeOutcome, Relay};
use crate::channel::Channel;
use crate::types::{AppError, InboundEvent, InboundMessage, Result};
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// How long in-flight events may keep running once serving stops
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// What happened to a dispatched event.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// A plain message went through the exchange state machine
    Exchange(ExchangeOutcome),
    /// A known command ran and its confirmation (or usage hint) was sent
    Command { name: String, reply: String },
    /// An unknown command, or one addressed to another bot; nothing was sent
    Ignored,
}

impl Relay {
    /// Route one inbound event to the orchestrator or a command handler.
    pub async fn dispatch(
        &self,
        event: &InboundEvent,
        channel: &dyn Channel,
    ) -> Result<DispatchOutcome> {
        match event {
            InboundEvent::Message(message) => self
                .handle_message(message, channel)
                .await
                .map(DispatchOutcome::Exchange),
            InboundEvent::Command {
                name,
                target,
                args,
                message,
            } => {
                if let Some(target) = target
                    && !target.eq_ignore_ascii_case(&self.identity().handle)
                {
                    debug!(command = %name, target = %target, "Command addressed to another bot");
                    return Ok(DispatchOutcome::Ignored);
                }
                self.handle_command(name, args, message, channel).await
            }
        }
    }

    async fn handle_command(
        &self,
        name: &str,
        args: &[String],
        message: &InboundMessage,
        channel: &dyn Channel,
    ) -> Result<DispatchOutcome> {
        let Some(result) = commands::respond(self.store(), name, args, message) else {
            return Ok(DispatchOutcome::Ignored);
        };

        let reply = match result {
            Ok(reply) => reply,
            Err(AppError::InvalidArgument(hint)) => {
                debug!(command = name, sender = %message.sender_id, "Rejected command arguments");
                hint
            }
            Err(e) => return Err(e),
        };

        channel.reply(message, &reply).await?;
        Ok(DispatchOutcome::Command {
            name: name.to_string(),
            reply,
        })
    }
}

/// Consume inbound events until the stream ends or Ctrl-C arrives.
///
/// Each event runs on its own task; exchanges in the same conversation are
/// serialized by the store's conversation lock. Tasks still running when the
/// loop stops get [`SHUTDOWN_GRACE`] to finish their replies.
pub async fn serve(
    relay: Arc<Relay>,
    channel: Arc<dyn Channel>,
    events: mpsc::UnboundedReceiver<InboundEvent>,
) {
    serve_until(relay, channel, events, shutdown_signal(tokio::signal::ctrl_c())).await
}

async fn serve_until(
    relay: Arc<Relay>,
    channel: Arc<dyn Channel>,
    mut events: mpsc::UnboundedReceiver<InboundEvent>,
    shutdown: impl Future<Output = ()>,
) {
    info!(bot = %relay.identity().handle, "Relay is serving");

    tokio::pin!(shutdown);
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    info!("Event stream closed");
                    break;
                };
                let relay = Arc::clone(&relay);
                let channel = Arc::clone(&channel);
                tasks.spawn(async move {
                    match relay.dispatch(&event, channel.as_ref()).await {
                        Ok(outcome) => debug!(?outcome, "Event handled"),
                        Err(e) => error!(
                            conversation = %event.message().conversation_id,
                            "Failed to handle event: {}", e
                        ),
                    }
                });
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    error!("Event task failed: {}", e);
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    if tasks.is_empty() {
        return;
    }
    info!(pending = tasks.len(), "Waiting for in-flight events");
    let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
        while tasks.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        warn!(pending = tasks.len(), "Abandoning events still in flight");
        tasks.abort_all();
    }
}

/// Resolve when `signal` fires. If the signal cannot be listened for, never
/// resolve, so serving continues until the event stream ends.
async fn shutdown_signal(signal: impl Future<Output = io::Result<()>>) {
    if let Err(e) = signal.await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
