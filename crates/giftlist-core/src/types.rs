// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Giftlist bot.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Highest priority a gift can carry. Zero means "no priority".
pub const MAX_PRIORITY: u8 = 5;

/// Chat platform user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

/// Identifier of an event (a wishlist).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub i64);

/// Identifier of a gift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GiftId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for GiftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a delivered message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
    Session,
}

// --- Domain entities ---

/// Who sent an inbound event, as reported by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    /// Public handle without the leading `@`.
    pub handle: Option<String>,
    /// Display name.
    pub name: Option<String>,
}

impl UserIdentity {
    pub fn new(id: i64) -> Self {
        Self {
            id: UserId(id),
            handle: None,
            name: None,
        }
    }

    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Human label for a user: `@handle`, then the display name, then `fallback`.
pub fn user_label(handle: Option<&str>, name: Option<&str>, fallback: &str) -> String {
    match (handle, name) {
        (Some(h), _) if !h.is_empty() => format!("@{h}"),
        (_, Some(n)) if !n.is_empty() => n.to_string(),
        _ => fallback.to_string(),
    }
}

/// An owner-curated gift list with its own shareable slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub owner_id: UserId,
    pub title: String,
    pub slug: String,
    pub event_date: Option<NaiveDate>,
    pub remind_days_before: Option<u32>,
    pub reminder_sent_for: Option<NaiveDate>,
    pub created_at: String,
}

/// An event joined with its owner's public identity, as returned by reference resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventWithOwner {
    pub event: Event,
    pub owner_handle: Option<String>,
    pub owner_name: Option<String>,
}

impl EventWithOwner {
    pub fn owner_label(&self, fallback: &str) -> String {
        user_label(
            self.owner_handle.as_deref(),
            self.owner_name.as_deref(),
            fallback,
        )
    }
}

/// A single wished-for item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gift {
    pub id: GiftId,
    pub event_id: EventId,
    pub title: String,
    pub description: Option<String>,
    pub link: Option<String>,
    /// 0 = unset, otherwise 1..=5.
    pub priority: u8,
    pub reserved_by: Option<UserId>,
    pub reserved_by_handle: Option<String>,
    pub reserved_by_name: Option<String>,
    pub created_at: String,
}

impl Gift {
    pub fn is_reserved(&self) -> bool {
        self.reserved_by.is_some()
    }

    pub fn is_reserved_by(&self, user: UserId) -> bool {
        self.reserved_by == Some(user)
    }
}

/// Fields of a gift about to be inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewGift {
    pub title: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub priority: u8,
}

impl NewGift {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial gift update. `None` leaves a field untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GiftPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub link: Option<Option<String>>,
    pub priority: Option<u8>,
}

impl GiftPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.link.is_none()
            && self.priority.is_none()
    }
}

/// Partial event update. `None` leaves a field untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub event_date: Option<Option<NaiveDate>>,
    pub remind_days_before: Option<Option<u32>>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.event_date.is_none() && self.remind_days_before.is_none()
    }
}

/// Gift text fields an owner can edit through a typed reply.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum GiftField {
    Title,
    Description,
    Link,
}

// --- Chat boundary types ---

/// An inbound event received from a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A slash command such as `/start abc` (name without the slash, args trimmed).
    Command {
        from: UserIdentity,
        chat_id: i64,
        name: String,
        args: String,
    },
    /// Free text.
    Text {
        from: UserIdentity,
        chat_id: i64,
        text: String,
    },
    /// An inline button press with its callback payload.
    Button {
        from: UserIdentity,
        chat_id: i64,
        callback_id: String,
        payload: String,
    },
}

impl InboundEvent {
    pub fn from(&self) -> &UserIdentity {
        match self {
            InboundEvent::Command { from, .. }
            | InboundEvent::Text { from, .. }
            | InboundEvent::Button { from, .. } => from,
        }
    }

    pub fn chat_id(&self) -> i64 {
        match self {
            InboundEvent::Command { chat_id, .. }
            | InboundEvent::Text { chat_id, .. }
            | InboundEvent::Button { chat_id, .. } => *chat_id,
        }
    }

    /// Short tag used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::Command { .. } => "command",
            InboundEvent::Text { .. } => "text",
            InboundEvent::Button { .. } => "button",
        }
    }
}

/// A selectable action rendered under a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub payload: String,
}

impl Button {
    pub fn new(label: impl Into<String>, payload: impl ToString) -> Self {
        Self {
            label: label.into(),
            payload: payload.to_string(),
        }
    }
}

/// An outbound HTML message with an optional inline keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Vec<Vec<Button>>,
}

/// Acknowledgement of a button press, optionally shown as a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackAnswer {
    pub callback_id: String,
    pub text: Option<String>,
}

/// Everything the dialog can ask a channel to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Message(OutboundMessage),
    Answer(CallbackAnswer),
}

impl Outbound {
    pub fn as_message(&self) -> Option<&OutboundMessage> {
        match self {
            Outbound::Message(m) => Some(m),
            Outbound::Answer(_) => None,
        }
    }

    pub fn as_answer(&self) -> Option<&CallbackAnswer> {
        match self {
            Outbound::Answer(a) => Some(a),
            Outbound::Message(_) => None,
        }
    }
}
