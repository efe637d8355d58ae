// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort owner notifications.
//!
//! The dialog enqueues messages without waiting on the chat platform. A
//! background task drains the bounded queue; delivery failures are logged and
//! never reach the user who triggered them.

use std::sync::Arc;

use giftlist_core::{ChannelAdapter, OutboundMessage, UserId};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<OutboundMessage>,
}

pub struct NotificationQueue {
    rx: mpsc::Receiver<OutboundMessage>,
}

impl Notifier {
    /// Creates a notifier and the queue that feeds the channel.
    pub fn channel(capacity: usize) -> (Notifier, NotificationQueue) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Notifier { tx }, NotificationQueue { rx })
    }

    /// Queues a plain HTML message to `user`'s private chat. Never blocks.
    pub fn notify(&self, user: UserId, text: String) {
        let msg = OutboundMessage {
            chat_id: user.0,
            text,
            keyboard: Vec::new(),
        };
        match self.tx.try_send(msg) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(user = %user, "notification queue full, dropping notification");
            }
            Err(TrySendError::Closed(_)) => {
                debug!(user = %user, "notification queue closed");
            }
        }
    }
}

impl NotificationQueue {
    /// Delivers queued notifications until cancelled, then flushes what is left.
    pub async fn run(mut self, channel: Arc<dyn ChannelAdapter>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                msg = self.rx.recv() => match msg {
                    Some(msg) => deliver(channel.as_ref(), msg).await,
                    None => return,
                },
            }
        }
        self.rx.close();
        while let Ok(msg) = self.rx.try_recv() {
            deliver(channel.as_ref(), msg).await;
        }
        debug!("notification queue drained");
    }

    /// Pops a queued notification without delivering it.
    pub fn try_next(&mut self) -> Option<OutboundMessage> {
        self.rx.try_recv().ok()
    }
}

async fn deliver(channel: &dyn ChannelAdapter, msg: OutboundMessage) {
    let chat_id = msg.chat_id;
    if let Err(e) = channel.send(msg).await {
        warn!(chat_id, error = %e, "owner notification failed");
    }
}
