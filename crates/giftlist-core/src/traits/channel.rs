// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for chat platform integrations.

use async_trait::async_trait;

use crate::error::GiftlistError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CallbackAnswer, InboundEvent, MessageId, Outbound, OutboundMessage};

/// Adapter for a bidirectional chat platform.
///
/// Channel adapters turn platform updates into [`InboundEvent`]s and deliver
/// HTML messages with inline keyboards back.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), GiftlistError>;

    /// Sends a message through the channel.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, GiftlistError>;

    /// Acknowledges a button press, optionally with a toast.
    async fn answer_callback(&self, answer: CallbackAnswer) -> Result<(), GiftlistError>;

    /// Receives the next inbound event from the channel.
    async fn receive(&self) -> Result<InboundEvent, GiftlistError>;

    /// Delivers one dialog output, dispatching on its kind.
    async fn deliver(&self, out: Outbound) -> Result<(), GiftlistError> {
        match out {
            Outbound::Message(msg) => self.send(msg).await.map(|_| ()),
            Outbound::Answer(answer) => self.answer_callback(answer).await,
        }
    }
}
