// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation engine for the Giftlist bot.
//!
//! The [`AgentLoop`] is the central coordinator that:
//! - Receives events from a channel adapter
//! - Serializes events of the same user while different users run concurrently
//! - Runs each event through the [`Dialog`] state machine
//! - Delivers replies back through the channel
//! - Drains in-flight events on shutdown

pub mod action;
pub mod dialog;
pub mod notifier;
pub mod parse;
pub mod reminder;
pub mod render;
pub mod session;
pub mod shutdown;

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use giftlist_core::{ChannelAdapter, GiftlistError, InboundEvent, OutboundMessage, UserId};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, error, info, info_span, warn};

pub use action::CallbackAction;
pub use dialog::{Dialog, DialogSettings};
pub use notifier::{NotificationQueue, Notifier};
pub use reminder::{ReminderSweep, SweepReport};
pub use session::{MemorySessionStore, spawn_session_purger};

const GENERIC_FAILURE: &str = "⚠️ Что-то пошло не так. Попробуйте ещё раз чуть позже.";
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// One async mutex per user, so a double tap cannot interleave two flows.
#[derive(Default)]
pub struct UserLocks {
    locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl UserLocks {
    pub async fn acquire(&self, user: UserId) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(user).or_default().clone();
        lock.lock_owned().await
    }

    /// Drops locks nobody holds or waits on.
    pub fn prune(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Pulls events from the channel and runs them through the dialog.
pub struct AgentLoop {
    channel: Arc<dyn ChannelAdapter>,
    dialog: Arc<Dialog>,
    locks: Arc<UserLocks>,
    tasks: TaskTracker,
}

impl AgentLoop {
    pub fn new(channel: Arc<dyn ChannelAdapter>, dialog: Arc<Dialog>) -> Self {
        info!(channel = channel.name(), "agent loop initialized");
        Self {
            channel,
            dialog,
            locks: Arc::new(UserLocks::default()),
            tasks: TaskTracker::new(),
        }
    }

    /// Runs until the cancellation token fires or the channel closes.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), GiftlistError> {
        info!("agent loop running");
        let mut handled: u64 = 0;

        loop {
            tokio::select! {
                event = self.channel.receive() => {
                    match event {
                        Ok(event) => {
                            self.dispatch(event);
                            handled += 1;
                            if handled % 256 == 0 {
                                self.locks.prune();
                            }
                        }
                        Err(e) => {
                            error!(error = %e, "channel receive error");
                            if e.to_string().contains("closed") {
                                break;
                            }
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping agent loop");
                    break;
                }
            }
        }

        shutdown::drain_tasks(&self.tasks, DRAIN_TIMEOUT).await;
        info!(handled, "agent loop stopped");
        Ok(())
    }

    fn dispatch(&self, event: InboundEvent) {
        let channel = self.channel.clone();
        let dialog = self.dialog.clone();
        let locks = self.locks.clone();
        let user = event.from().id;
        let span = info_span!("event", user = %user, kind = event.kind());

        self.tasks.spawn(
            async move {
                let _guard = locks.acquire(user).await;
                handle_event(channel.as_ref(), &dialog, event).await;
            }
            .instrument(span),
        );
    }
}

/// Runs one event through the dialog and delivers the results.
///
/// Infrastructure failures are logged and answered with a generic message.
pub async fn handle_event(channel: &dyn ChannelAdapter, dialog: &Dialog, event: InboundEvent) {
    let chat_id = event.chat_id();
    let callback_id = match &event {
        InboundEvent::Button { callback_id, .. } => Some(callback_id.clone()),
        _ => None,
    };

    match dialog.handle(event).await {
        Ok(outputs) => {
            debug!(count = outputs.len(), "delivering replies");
            for out in outputs {
                if let Err(e) = channel.deliver(out).await {
                    warn!(chat_id, error = %e, "failed to deliver reply");
                }
            }
        }
        Err(e) => {
            error!(chat_id, error = %e, "failed to handle event");
            if let Some(callback_id) = callback_id {
                let answer = giftlist_core::CallbackAnswer {
                    callback_id,
                    text: None,
                };
                let _ = channel.answer_callback(answer).await;
            }
            let msg = OutboundMessage {
                chat_id,
                text: GENERIC_FAILURE.to_string(),
                keyboard: Vec::new(),
            };
            if let Err(e) = channel.send(msg).await {
                warn!(chat_id, error = %e, "failed to send failure notice");
            }
        }
    }
}
