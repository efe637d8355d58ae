// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user conversation session record.
//!
//! The record keeps orthogonal fields: the event the owner has open, the event
//! a visitor is looking at, and at most one pending expectation for the next
//! free-text message. Entering a sub-flow only touches `pending`.

use serde::{Deserialize, Serialize};

use crate::types::{EventId, GiftField, GiftId};

/// Conversation state of one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSession {
    /// Event the owner is currently working on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_event: Option<EventId>,
    /// Event the user is browsing as a visitor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewing: Option<Viewing>,
    /// What the next free-text message is expected to satisfy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingInput>,
}

impl ConversationSession {
    pub fn is_empty(&self) -> bool {
        self.current_event.is_none() && self.viewing.is_none() && self.pending.is_none()
    }

    /// Removes and returns the pending expectation.
    pub fn take_pending(&mut self) -> Option<PendingInput> {
        self.pending.take()
    }
}

/// Event opened through a shared reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewing {
    pub event_id: EventId,
    /// Owner label captured when the reference was resolved.
    pub owner_label: String,
}

/// Exactly one pending expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingInput {
    /// Visitor is expected to type a slug, handle, or deep link.
    AwaitingReference,
    /// Owner is expected to type the title of a new event.
    AwaitingEventTitle,
    /// Owner is walking through the multi-step add flow.
    AddingGift(GiftDraft),
    /// Owner is replacing one text field of a gift.
    EditingGift {
        gift_id: GiftId,
        event_id: EventId,
        field: GiftField,
        fallback_title: String,
    },
    /// Owner is typing an event date.
    EditingDate { event_id: EventId },
}

/// Step of the add flow the draft is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStep {
    Title,
    Description,
    Link,
    Priority,
}

/// Gift being assembled by the add flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftDraft {
    pub event_id: EventId,
    pub step: DraftStep,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

impl GiftDraft {
    pub fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            step: DraftStep::Title,
            title: String::new(),
            description: None,
            link: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_session_is_empty() {
        assert!(ConversationSession::default().is_empty());
    }

    #[test]
    fn pending_does_not_touch_current_event() {
        let mut s = ConversationSession {
            current_event: Some(EventId(7)),
            ..Default::default()
        };
        s.pending = Some(PendingInput::EditingDate {
            event_id: EventId(7),
        });
        assert_eq!(s.current_event, Some(EventId(7)));
        s.take_pending();
        assert_eq!(s.current_event, Some(EventId(7)));
        assert!(s.pending.is_none());
    }

    #[test]
    fn session_serializes_with_tagged_pending() {
        let s = ConversationSession {
            current_event: Some(EventId(1)),
            viewing: None,
            pending: Some(PendingInput::AddingGift(GiftDraft::new(EventId(1)))),
        };
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"kind\":\"adding_gift\""));
        assert!(!json.contains("viewing"));
        let back: ConversationSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn editing_gift_field_serializes_lowercase() {
        let p = PendingInput::EditingGift {
            gift_id: GiftId(3),
            event_id: EventId(1),
            field: GiftField::Description,
            fallback_title: "Книга".into(),
        };
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"kind\":\"editing_gift\""));
        let back: PendingInput = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
