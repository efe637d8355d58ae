// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation session store trait.

use async_trait::async_trait;

use crate::error::GiftlistError;
use crate::session::ConversationSession;
use crate::types::UserId;

/// Keyed, TTL-bounded storage for [`ConversationSession`] records.
///
/// Expired records are invisible to `load`. Every `save` refreshes the TTL.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Loads the user's record, or an empty one when absent or expired.
    async fn load(&self, user: UserId) -> Result<ConversationSession, GiftlistError>;

    /// Stores the record. An empty record is equivalent to `clear`.
    async fn save(&self, user: UserId, session: &ConversationSession)
    -> Result<(), GiftlistError>;

    /// Forgets everything about the user's conversation.
    async fn clear(&self, user: UserId) -> Result<(), GiftlistError>;

    /// Drops expired records, returning how many were removed.
    async fn purge_expired(&self) -> Result<usize, GiftlistError>;
}
