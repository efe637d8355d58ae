// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound events
//! and captured outbound messages and callback answers for assertion in tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use giftlist_core::GiftlistError;
use giftlist_core::traits::adapter::PluginAdapter;
use giftlist_core::traits::channel::ChannelAdapter;
use giftlist_core::types::{
    AdapterType, CallbackAnswer, HealthStatus, InboundEvent, MessageId, OutboundMessage,
};

/// A mock messaging channel for testing.
///
/// - **inbound**: events injected via `inject()` are returned by `receive()`
/// - **sent**: messages passed to `send()` are retrievable via `sent_messages()`
/// - **answers**: callback answers are retrievable via `answers()`
pub struct MockChannel {
    inbound: Arc<Mutex<VecDeque<InboundEvent>>>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    answers: Arc<Mutex<Vec<CallbackAnswer>>>,
    notify: Arc<Notify>,
    closed: AtomicBool,
    next_id: AtomicU64,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            answers: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            closed: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        }
    }

    /// Queue an inbound event for the next `receive()`.
    pub async fn inject(&self, event: InboundEvent) {
        self.inbound.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// Make `receive()` fail with a "closed" error once the queue is empty.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    /// Messages sent to one chat.
    pub async fn sent_to(&self, chat_id: i64) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn answers(&self) -> Vec<CallbackAnswer> {
        self.answers.lock().await.clone()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
        self.answers.lock().await.clear();
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, GiftlistError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), GiftlistError> {
        self.close();
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn connect(&mut self) -> Result<(), GiftlistError> {
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, GiftlistError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().await.push(msg);
        Ok(MessageId(format!("mock-msg-{id}")))
    }

    async fn answer_callback(&self, answer: CallbackAnswer) -> Result<(), GiftlistError> {
        self.answers.lock().await.push(answer);
        Ok(())
    }

    async fn receive(&self) -> Result<InboundEvent, GiftlistError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
            }
            if self.closed.load(Ordering::SeqCst) {
                return Err(GiftlistError::Channel {
                    message: "mock channel closed".to_string(),
                    source: None,
                });
            }
            self.notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use giftlist_core::UserIdentity;

    fn text(t: &str) -> InboundEvent {
        InboundEvent::Text {
            from: UserIdentity::new(7),
            chat_id: 7,
            text: t.to_string(),
        }
    }

    fn outbound(chat_id: i64, text: &str) -> OutboundMessage {
        OutboundMessage {
            chat_id,
            text: text.to_string(),
            keyboard: Vec::new(),
        }
    }

    #[tokio::test]
    async fn events_come_back_in_order() {
        let channel = MockChannel::new();
        channel.inject(text("first")).await;
        channel.inject(text("second")).await;
        assert_eq!(channel.receive().await.unwrap(), text("first"));
        assert_eq!(channel.receive().await.unwrap(), text("second"));
    }

    #[tokio::test]
    async fn send_and_answer_are_captured() {
        let channel = MockChannel::new();
        let id = channel.send(outbound(1, "hello")).await.unwrap();
        assert!(id.0.starts_with("mock-msg-"));
        channel.send(outbound(2, "other")).await.unwrap();
        channel
            .answer_callback(CallbackAnswer {
                callback_id: "cb".into(),
                text: Some("ok".into()),
            })
            .await
            .unwrap();

        assert_eq!(channel.sent_count().await, 2);
        assert_eq!(channel.sent_to(1).await[0].text, "hello");
        assert_eq!(channel.answers().await[0].text.as_deref(), Some("ok"));

        channel.clear_sent().await;
        assert_eq!(channel.sent_count().await, 0);
        assert!(channel.answers().await.is_empty());
    }

    #[tokio::test]
    async fn receive_waits_for_injection() {
        let channel = Arc::new(MockChannel::new());
        let channel_clone = channel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
            channel_clone.inject(text("delayed")).await;
        });

        let received = tokio::time::timeout(tokio::time::Duration::from_secs(2), channel.receive())
            .await
            .expect("receive timed out")
            .unwrap();
        assert_eq!(received, text("delayed"));
    }

    #[tokio::test]
    async fn closed_channel_reports_closed_after_draining() {
        let channel = MockChannel::new();
        channel.inject(text("last")).await;
        channel.close();
        assert!(channel.receive().await.is_ok());
        let err = channel.receive().await.unwrap_err();
        assert!(err.to_string().contains("closed"));
    }
}
