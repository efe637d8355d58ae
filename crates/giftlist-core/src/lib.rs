// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Giftlist bot.
//!
//! This crate provides the error type, domain and chat boundary types, the
//! conversation session record, and the adapter traits implemented by the
//! storage and channel crates.

pub mod error;
pub mod session;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::GiftlistError;
pub use session::{ConversationSession, DraftStep, GiftDraft, PendingInput, Viewing};
pub use types::{
    AdapterType, Button, CallbackAnswer, Event, EventId, EventPatch, EventWithOwner, Gift,
    GiftField, GiftId, GiftPatch, HealthStatus, InboundEvent, MAX_PRIORITY, MessageId, NewGift,
    Outbound, OutboundMessage, UserId, UserIdentity, user_label,
};

pub use traits::{
    ChannelAdapter, PluginAdapter, SessionStore, StorageAdapter, WishlistStore,
};
