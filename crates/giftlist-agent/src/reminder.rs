// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily "update your list" reminders for event owners.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use giftlist_core::{ChannelAdapter, GiftlistError, OutboundMessage, WishlistStore};
use giftlist_cron::{ScheduleZone, ScheduledJob};
use tracing::{info, warn};

use crate::render;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub sent: usize,
    pub failed: usize,
}

pub struct ReminderSweep {
    store: Arc<dyn WishlistStore>,
    channel: Arc<dyn ChannelAdapter>,
    zone: ScheduleZone,
}

impl ReminderSweep {
    pub fn new(
        store: Arc<dyn WishlistStore>,
        channel: Arc<dyn ChannelAdapter>,
        zone: ScheduleZone,
    ) -> Self {
        Self {
            store,
            channel,
            zone,
        }
    }

    /// Sends every reminder due on `today`.
    ///
    /// An event is marked only after its message went out, so a failed
    /// delivery is picked up again by any later sweep of the same day.
    pub async fn run_once(&self, today: NaiveDate) -> Result<SweepReport, GiftlistError> {
        let due = self.store.get_events_due_for_reminder(today).await?;
        let mut report = SweepReport::default();
        for event in due {
            let msg = OutboundMessage {
                chat_id: event.owner_id.0,
                text: render::reminder(&event),
                keyboard: render::owner_menu(false),
            };
            match self.channel.send(msg).await {
                Ok(_) => {
                    self.store.mark_reminder_sent(event.id, today).await?;
                    report.sent += 1;
                }
                Err(e) => {
                    warn!(event = %event.id, owner = %event.owner_id, error = %e, "reminder not delivered");
                    report.failed += 1;
                }
            }
        }
        if report.sent + report.failed > 0 {
            info!(%today, sent = report.sent, failed = report.failed, "reminder sweep finished");
        }
        Ok(report)
    }
}

#[async_trait]
impl ScheduledJob for ReminderSweep {
    fn name(&self) -> &str {
        "reminders"
    }

    /// Fails when any reminder was not delivered so the scheduler retries.
    async fn run(&self) -> Result<(), GiftlistError> {
        let report = self.run_once(self.zone.today()).await?;
        if report.failed > 0 {
            return Err(GiftlistError::Channel {
                message: format!("{} reminder(s) not delivered", report.failed),
                source: None,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use giftlist_config::model::StorageConfig;
    use giftlist_core::{
        AdapterType, CallbackAnswer, EventPatch, HealthStatus, InboundEvent, MessageId,
        PluginAdapter, StorageAdapter, UserIdentity,
    };
    use giftlist_storage::SqliteStorage;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Records sent messages; can be told to fail.
    #[derive(Default)]
    struct RecordingChannel {
        sent: Mutex<Vec<OutboundMessage>>,
        failing: AtomicBool,
    }

    #[async_trait]
    impl PluginAdapter for RecordingChannel {
        fn name(&self) -> &str {
            "recording"
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
            Ok(())
        }
    }

    #[async_trait]
    impl ChannelAdapter for RecordingChannel {
        async fn connect(&mut self) -> Result<(), GiftlistError> {
            Ok(())
        }
        async fn send(&self, msg: OutboundMessage) -> Result<MessageId, GiftlistError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(GiftlistError::Channel {
                    message: "blocked by user".into(),
                    source: None,
                });
            }
            self.sent.lock().unwrap().push(msg);
            Ok(MessageId("1".into()))
        }
        async fn answer_callback(&self, _answer: CallbackAnswer) -> Result<(), GiftlistError> {
            Ok(())
        }
        async fn receive(&self) -> Result<InboundEvent, GiftlistError> {
            std::future::pending().await
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn setup() -> (Arc<SqliteStorage>, Arc<RecordingChannel>, ReminderSweep, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStorage::new(StorageConfig {
            database_path: dir.path().join("r.db").to_string_lossy().into_owned(),
            wal_mode: true,
        }));
        store.initialize().await.unwrap();
        let channel = Arc::new(RecordingChannel::default());
        let sweep = ReminderSweep::new(store.clone(), channel.clone(), ScheduleZone::Local);
        (store, channel, sweep, dir)
    }

    async fn dated_event(store: &SqliteStorage, owner: i64, on: NaiveDate, days: u32) {
        let identity = UserIdentity::new(owner).with_handle(format!("owner{owner}"));
        let event = store.get_or_create_event(&identity).await.unwrap();
        let patch = EventPatch {
            event_date: Some(Some(on)),
            remind_days_before: Some(Some(days)),
            ..Default::default()
        };
        assert!(store.update_event(event.id, identity.id, patch).await.unwrap());
    }

    #[tokio::test]
    async fn second_sweep_same_day_sends_nothing() {
        let (store, channel, sweep, _dir) = setup().await;
        dated_event(&store, 1, date(2025, 6, 15), 3).await;
        dated_event(&store, 2, date(2025, 6, 20), 3).await;

        let today = date(2025, 6, 12);
        assert_eq!(sweep.run_once(today).await.unwrap(), SweepReport { sent: 1, failed: 0 });
        assert_eq!(sweep.run_once(today).await.unwrap(), SweepReport::default());

        let sent = channel.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, 1);
        assert!(sent[0].text.contains("Через 3 дн."));
    }

    #[tokio::test]
    async fn failed_delivery_is_retried() {
        let (store, channel, sweep, _dir) = setup().await;
        dated_event(&store, 1, date(2025, 6, 15), 1).await;
        let today = date(2025, 6, 14);

        channel.failing.store(true, Ordering::SeqCst);
        assert_eq!(sweep.run_once(today).await.unwrap(), SweepReport { sent: 0, failed: 1 });

        channel.failing.store(false, Ordering::SeqCst);
        assert_eq!(sweep.run_once(today).await.unwrap().sent, 1);
    }

    #[tokio::test]
    async fn scheduled_run_reports_undelivered_reminders() {
        let (store, channel, sweep, _dir) = setup().await;
        let today = ScheduleZone::Local.today();
        dated_event(&store, 1, today + chrono::Duration::days(2), 2).await;

        channel.failing.store(true, Ordering::SeqCst);
        assert!(matches!(ScheduledJob::run(&sweep).await, Err(GiftlistError::Channel { .. })));

        channel.failing.store(false, Ordering::SeqCst);
        ScheduledJob::run(&sweep).await.unwrap();
        assert_eq!(channel.sent.lock().unwrap().len(), 1);
    }
}
