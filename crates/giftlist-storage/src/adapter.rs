// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter and WishlistStore traits.

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::OnceCell;
use tracing::debug;

use giftlist_config::model::StorageConfig;
use giftlist_core::{
    AdapterType, Event, EventId, EventPatch, EventWithOwner, Gift, GiftId, GiftPatch,
    GiftlistError, HealthStatus, NewGift, PluginAdapter, StorageAdapter, UserId, UserIdentity,
    WishlistStore,
};

use crate::database::Database;
use crate::queries;

const DEFAULT_EVENT_TITLE: &str = "Мой вишлист";

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is opened on the first call to
/// [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    default_event_title: String,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`](StorageAdapter::initialize) is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            default_event_title: DEFAULT_EVENT_TITLE.to_string(),
            db: OnceCell::new(),
        }
    }

    /// Title given to the event created implicitly on an owner's first visit.
    pub fn with_default_event_title(mut self, title: impl Into<String>) -> Self {
        self.default_event_title = title.into();
        self
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, GiftlistError> {
        self.db
            .get()
            .ok_or_else(|| GiftlistError::storage_msg("storage not initialized -- call initialize() first"))
    }

    /// Shared handle to the opened database, for the sqlite session store.
    pub fn database(&self) -> Result<Database, GiftlistError> {
        self.db().cloned()
    }

    pub fn database_path(&self) -> &str {
        &self.config.database_path
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, GiftlistError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), GiftlistError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), GiftlistError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db
            .set(db)
            .map_err(|_| GiftlistError::storage_msg("storage already initialized"))?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), GiftlistError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl WishlistStore for SqliteStorage {
    async fn ensure_user(&self, identity: &UserIdentity) -> Result<(), GiftlistError> {
        queries::users::ensure_user(self.db()?, identity).await
    }

    async fn get_or_create_event(&self, identity: &UserIdentity) -> Result<Event, GiftlistError> {
        queries::events::get_or_create_event(self.db()?, identity, &self.default_event_title).await
    }

    async fn create_event(
        &self,
        identity: &UserIdentity,
        title: &str,
    ) -> Result<Event, GiftlistError> {
        queries::events::create_event(self.db()?, identity, title).await
    }

    async fn resolve_event_reference(
        &self,
        reference: &str,
    ) -> Result<Option<EventWithOwner>, GiftlistError> {
        queries::events::resolve_event_reference(self.db()?, reference).await
    }

    async fn list_events_for_owner(&self, owner: UserId) -> Result<Vec<Event>, GiftlistError> {
        queries::events::list_events_for_owner(self.db()?, owner).await
    }

    async fn get_event(&self, event_id: EventId) -> Result<Option<Event>, GiftlistError> {
        queries::events::get_event(self.db()?, event_id).await
    }

    async fn get_event_for_owner(
        &self,
        event_id: EventId,
        owner: UserId,
    ) -> Result<Option<Event>, GiftlistError> {
        queries::events::get_event_for_owner(self.db()?, event_id, owner).await
    }

    async fn update_event(
        &self,
        event_id: EventId,
        owner: UserId,
        patch: EventPatch,
    ) -> Result<bool, GiftlistError> {
        queries::events::update_event(self.db()?, event_id, owner, patch).await
    }

    async fn delete_event(&self, event_id: EventId, owner: UserId) -> Result<bool, GiftlistError> {
        queries::events::delete_event(self.db()?, event_id, owner).await
    }

    async fn get_gifts(&self, event_id: EventId) -> Result<Vec<Gift>, GiftlistError> {
        queries::gifts::get_gifts(self.db()?, event_id).await
    }

    async fn get_gift(
        &self,
        gift_id: GiftId,
        event_id: EventId,
    ) -> Result<Option<Gift>, GiftlistError> {
        queries::gifts::get_gift(self.db()?, gift_id, event_id).await
    }

    async fn add_gift(&self, event_id: EventId, gift: NewGift) -> Result<GiftId, GiftlistError> {
        queries::gifts::add_gift(self.db()?, event_id, gift).await
    }

    async fn update_gift(
        &self,
        gift_id: GiftId,
        event_id: EventId,
        patch: GiftPatch,
    ) -> Result<bool, GiftlistError> {
        queries::gifts::update_gift(self.db()?, gift_id, event_id, patch).await
    }

    async fn delete_gift(
        &self,
        gift_id: GiftId,
        event_id: EventId,
    ) -> Result<bool, GiftlistError> {
        queries::gifts::delete_gift(self.db()?, gift_id, event_id).await
    }

    async fn reserve_gift(
        &self,
        gift_id: GiftId,
        identity: &UserIdentity,
    ) -> Result<bool, GiftlistError> {
        queries::gifts::reserve_gift(self.db()?, gift_id, identity).await
    }

    async fn unreserve_gift(&self, gift_id: GiftId, user: UserId) -> Result<bool, GiftlistError> {
        queries::gifts::unreserve_gift(self.db()?, gift_id, user).await
    }

    async fn get_event_owner_id(
        &self,
        event_id: EventId,
    ) -> Result<Option<UserId>, GiftlistError> {
        queries::events::get_event_owner_id(self.db()?, event_id).await
    }

    async fn get_user_default_event_id(
        &self,
        owner: UserId,
    ) -> Result<Option<EventId>, GiftlistError> {
        queries::events::get_user_default_event_id(self.db()?, owner).await
    }

    async fn get_share_slug(&self, event_id: EventId) -> Result<Option<String>, GiftlistError> {
        queries::events::get_share_slug(self.db()?, event_id).await
    }

    async fn get_events_due_for_reminder(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<Event>, GiftlistError> {
        queries::reminders::get_events_due_for_reminder(self.db()?, today).await
    }

    async fn mark_reminder_sent(
        &self,
        event_id: EventId,
        today: NaiveDate,
    ) -> Result<(), GiftlistError> {
        queries::reminders::mark_reminder_sent(self.db()?, event_id, today).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init_test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
    }

    #[tokio::test]
    async fn double_initialize_fails() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err(), "second initialize should fail");
    }

    #[tokio::test]
    async fn health_check_reflects_initialization() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("health.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert!(storage.health_check().await.is_err());
        storage.initialize().await.unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn operations_fail_before_initialize() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("uninit.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        let err = storage.get_gifts(EventId(1)).await.unwrap_err();
        assert!(err.to_string().contains("not initialized"));
    }

    #[tokio::test]
    async fn wishlist_lifecycle_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()))
            .with_default_event_title("Список");
        storage.initialize().await.unwrap();

        let owner = UserIdentity::new(1).with_handle("owner");
        let event = storage.get_or_create_event(&owner).await.unwrap();
        assert_eq!(event.title, "Список");

        let gift = storage
            .add_gift(event.id, NewGift::titled("Book"))
            .await
            .unwrap();
        let visitor = UserIdentity::new(2).with_name("Guest");
        assert!(storage.reserve_gift(gift, &visitor).await.unwrap());

        let gifts = storage.get_gifts(event.id).await.unwrap();
        assert_eq!(gifts.len(), 1);
        assert_eq!(gifts[0].reserved_by_name.as_deref(), Some("Guest"));

        let resolved = storage
            .resolve_event_reference(&event.slug)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.event.id, event.id);

        assert!(storage.delete_event(event.id, owner.id).await.unwrap());
        assert!(storage.get_gift(gift, event.id).await.unwrap().is_none());

        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_runs_checkpoint() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("shutdown.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();
        storage.ensure_user(&UserIdentity::new(1)).await.unwrap();
        storage.shutdown().await.unwrap();
    }
}
