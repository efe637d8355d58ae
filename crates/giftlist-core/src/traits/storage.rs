// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter traits for persistence backends (SQLite, etc.).

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::GiftlistError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Event, EventId, EventPatch, EventWithOwner, Gift, GiftId, GiftPatch, NewGift, UserId,
    UserIdentity,
};

/// Adapter for storage and persistence backends.
///
/// Storage adapters manage the lifecycle of database connections.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, pragmas, etc.).
    async fn initialize(&self) -> Result<(), GiftlistError>;

    /// Closes the storage backend, flushing pending writes and releasing connections.
    async fn close(&self) -> Result<(), GiftlistError>;
}

/// Users, events, gifts, and reservations.
///
/// Scoped operations take both the entity id and its parent (event or owner)
/// and touch nothing when the pair does not match. Boolean results report
/// whether a row actually changed.
#[async_trait]
pub trait WishlistStore: StorageAdapter {
    /// Upserts a user, keeping known handle/name when the incoming value is absent.
    async fn ensure_user(&self, identity: &UserIdentity) -> Result<(), GiftlistError>;

    /// Returns the owner's earliest event, creating one if none exists.
    async fn get_or_create_event(&self, identity: &UserIdentity) -> Result<Event, GiftlistError>;

    /// Always creates a new event with a fresh slug.
    async fn create_event(
        &self,
        identity: &UserIdentity,
        title: &str,
    ) -> Result<Event, GiftlistError>;

    /// Resolves a slug, numeric owner id, or handle to an event.
    async fn resolve_event_reference(
        &self,
        reference: &str,
    ) -> Result<Option<EventWithOwner>, GiftlistError>;

    /// Events of an owner, dated ones first by date, then by creation order.
    async fn list_events_for_owner(&self, owner: UserId) -> Result<Vec<Event>, GiftlistError>;

    async fn get_event(&self, event_id: EventId) -> Result<Option<Event>, GiftlistError>;

    async fn get_event_for_owner(
        &self,
        event_id: EventId,
        owner: UserId,
    ) -> Result<Option<Event>, GiftlistError>;

    async fn update_event(
        &self,
        event_id: EventId,
        owner: UserId,
        patch: EventPatch,
    ) -> Result<bool, GiftlistError>;

    async fn delete_event(&self, event_id: EventId, owner: UserId) -> Result<bool, GiftlistError>;

    /// Gifts of an event with reserver identity, highest priority first.
    async fn get_gifts(&self, event_id: EventId) -> Result<Vec<Gift>, GiftlistError>;

    async fn get_gift(
        &self,
        gift_id: GiftId,
        event_id: EventId,
    ) -> Result<Option<Gift>, GiftlistError>;

    async fn add_gift(&self, event_id: EventId, gift: NewGift) -> Result<GiftId, GiftlistError>;

    async fn update_gift(
        &self,
        gift_id: GiftId,
        event_id: EventId,
        patch: GiftPatch,
    ) -> Result<bool, GiftlistError>;

    async fn delete_gift(&self, gift_id: GiftId, event_id: EventId)
    -> Result<bool, GiftlistError>;

    /// Claims a free gift. Returns `false` when someone already holds it.
    async fn reserve_gift(
        &self,
        gift_id: GiftId,
        identity: &UserIdentity,
    ) -> Result<bool, GiftlistError>;

    /// Releases a reservation held by `user`. Returns `false` otherwise.
    async fn unreserve_gift(&self, gift_id: GiftId, user: UserId) -> Result<bool, GiftlistError>;

    async fn get_event_owner_id(&self, event_id: EventId)
    -> Result<Option<UserId>, GiftlistError>;

    async fn get_user_default_event_id(
        &self,
        owner: UserId,
    ) -> Result<Option<EventId>, GiftlistError>;

    async fn get_share_slug(&self, event_id: EventId) -> Result<Option<String>, GiftlistError>;

    /// Events whose reminder falls on `today` and has not been sent for it yet.
    async fn get_events_due_for_reminder(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<Event>, GiftlistError>;

    async fn mark_reminder_sent(
        &self,
        event_id: EventId,
        today: NaiveDate,
    ) -> Result<(), GiftlistError>;
}
