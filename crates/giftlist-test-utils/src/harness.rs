// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete dialog stack with a mock channel, a
//! temp SQLite database and the selected session backend. Tests drive it
//! either directly (`press`, `say`, `command`) or through the real
//! [`AgentLoop`] via [`TestHarness::spawn_loop`].

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use giftlist_agent::{AgentLoop, Dialog, DialogSettings, MemorySessionStore, NotificationQueue, Notifier};
use giftlist_agent::action::CallbackAction;
use giftlist_config::model::StorageConfig;
use giftlist_config::SessionBackend;
use giftlist_core::{
    ChannelAdapter, GiftlistError, InboundEvent, Outbound, OutboundMessage, SessionStore,
    StorageAdapter, UserIdentity,
};
use giftlist_storage::{SqliteSessionStore, SqliteStorage};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::mock_channel::MockChannel;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    bot_username: Option<String>,
    session_backend: SessionBackend,
    session_ttl: Duration,
    today: Option<fn() -> NaiveDate>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            bot_username: Some("giftlist_test_bot".to_string()),
            session_backend: SessionBackend::Memory,
            session_ttl: Duration::from_secs(3600),
            today: None,
        }
    }

    /// Bot username for share links; `None` exercises the `/start` fallback.
    pub fn with_bot_username(mut self, name: Option<&str>) -> Self {
        self.bot_username = name.map(str::to_string);
        self
    }

    pub fn with_session_backend(mut self, backend: SessionBackend) -> Self {
        self.session_backend = backend;
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Fixes "today" for date input without a year.
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, GiftlistError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| GiftlistError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage = SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        });
        storage.initialize().await?;
        let storage = Arc::new(storage);

        let sessions: Arc<dyn SessionStore> = match self.session_backend {
            SessionBackend::Memory => Arc::new(MemorySessionStore::new(self.session_ttl)),
            SessionBackend::Sqlite => {
                Arc::new(SqliteSessionStore::new(storage.database()?, self.session_ttl))
            }
        };

        let (notifier, queue) = Notifier::channel(64);
        let settings = DialogSettings {
            bot_username: self.bot_username,
            ..DialogSettings::default()
        };
        let mut dialog = Dialog::new(storage.clone(), sessions.clone(), notifier, settings);
        if let Some(today) = self.today {
            dialog = dialog.with_clock(today);
        }

        Ok(TestHarness {
            mock_channel: Arc::new(MockChannel::new()),
            storage,
            sessions,
            dialog: Arc::new(dialog),
            notifications: Mutex::new(Some(queue)),
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock channel and temp storage.
pub struct TestHarness {
    /// The mock channel adapter.
    pub mock_channel: Arc<MockChannel>,
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    /// Session store selected by the builder.
    pub sessions: Arc<dyn SessionStore>,
    pub dialog: Arc<Dialog>,
    notifications: Mutex<Option<NotificationQueue>>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Runs one event through the dialog and returns its outputs.
    pub async fn handle(&self, event: InboundEvent) -> Result<Vec<Outbound>, GiftlistError> {
        self.dialog.handle(event).await
    }

    pub async fn press(
        &self,
        user: &UserIdentity,
        action: CallbackAction,
    ) -> Result<Vec<Outbound>, GiftlistError> {
        self.handle(InboundEvent::Button {
            from: user.clone(),
            chat_id: user.id.0,
            callback_id: format!("cb-{}", user.id),
            payload: action.to_string(),
        })
        .await
    }

    pub async fn say(&self, user: &UserIdentity, text: &str) -> Result<Vec<Outbound>, GiftlistError> {
        self.handle(InboundEvent::Text {
            from: user.clone(),
            chat_id: user.id.0,
            text: text.to_string(),
        })
        .await
    }

    pub async fn command(
        &self,
        user: &UserIdentity,
        name: &str,
        args: &str,
    ) -> Result<Vec<Outbound>, GiftlistError> {
        self.handle(InboundEvent::Command {
            from: user.clone(),
            chat_id: user.id.0,
            name: name.to_string(),
            args: args.to_string(),
        })
        .await
    }

    /// Notifications queued so far, when the queue is not owned by a running loop.
    pub async fn take_notifications(&self) -> Vec<OutboundMessage> {
        let mut guard = self.notifications.lock().await;
        let mut out = Vec::new();
        if let Some(queue) = guard.as_mut() {
            while let Some(msg) = queue.try_next() {
                out.push(msg);
            }
        }
        out
    }

    /// Starts the agent loop and the notification queue on the mock channel.
    pub async fn spawn_loop(&self, cancel: CancellationToken) -> JoinHandle<Result<(), GiftlistError>> {
        let channel: Arc<dyn ChannelAdapter> = self.mock_channel.clone();
        if let Some(queue) = self.notifications.lock().await.take() {
            tokio::spawn(queue.run(channel.clone(), cancel.clone()));
        }
        let agent = AgentLoop::new(channel, self.dialog.clone());
        tokio::spawn(async move { agent.run(cancel).await })
    }
}

/// Shorthand for a user with a handle.
pub fn user(id: i64, handle: &str) -> UserIdentity {
    UserIdentity::new(id).with_handle(handle)
}

/// Text of the last message among `outputs`.
pub fn last_text(outputs: &[Outbound]) -> Option<String> {
    outputs
        .iter()
        .filter_map(Outbound::as_message)
        .next_back()
        .map(|m| m.text.clone())
}

/// Toast of the callback answer among `outputs`.
pub fn toast(outputs: &[Outbound]) -> Option<String> {
    outputs
        .iter()
        .find_map(Outbound::as_answer)
        .and_then(|a| a.text.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use giftlist_core::WishlistStore;

    #[tokio::test]
    async fn builder_creates_working_environment() {
        let harness = TestHarness::builder().build().await.unwrap();
        let out = harness.command(&user(1, "alice"), "start", "").await.unwrap();
        assert_eq!(out.len(), 1);
    }

    #[tokio::test]
    async fn temp_db_is_unique_per_harness() {
        let h1 = TestHarness::builder().build().await.unwrap();
        let h2 = TestHarness::builder().build().await.unwrap();

        h1.press(&user(1, "alice"), CallbackAction::MenuCreate).await.unwrap();
        let alice = user(1, "alice").id;
        assert_eq!(h1.storage.list_events_for_owner(alice).await.unwrap().len(), 1);
        assert!(h2.storage.list_events_for_owner(alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sqlite_sessions_backend() {
        let harness = TestHarness::builder()
            .with_session_backend(SessionBackend::Sqlite)
            .build()
            .await
            .unwrap();
        let alice = user(1, "alice");
        harness.press(&alice, CallbackAction::MenuCreate).await.unwrap();
        harness.press(&alice, CallbackAction::OwnerAdd).await.unwrap();
        let session = harness.sessions.load(alice.id).await.unwrap();
        assert!(session.pending.is_some());
    }
}
