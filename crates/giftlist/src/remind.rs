// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `giftlist remind` command implementation.
//!
//! Runs a single reminder sweep for today and exits. Suitable for an external
//! scheduler (systemd timer, crontab) when `reminders.enabled = false`.

use std::sync::Arc;

use giftlist_agent::ReminderSweep;
use giftlist_config::model::GiftlistConfig;
use giftlist_core::error::GiftlistError;
use giftlist_core::{ChannelAdapter, StorageAdapter};
use giftlist_cron::ScheduleZone;
use giftlist_telegram::TelegramChannel;
use tracing::{info, warn};

use crate::serve::open_storage;

/// Runs the `giftlist remind` command.
pub async fn run_remind(config: GiftlistConfig) -> Result<(), GiftlistError> {
    let zone = ScheduleZone::from_offset_hours(config.reminders.utc_offset_hours)?;
    // Sending needs no polling, so the channel is never connected.
    let channel: Arc<dyn ChannelAdapter> = Arc::new(TelegramChannel::new(config.telegram.clone())?);
    let storage = open_storage(&config).await?;

    let today = zone.today();
    let sweep = ReminderSweep::new(storage.clone(), channel, zone);
    let report = sweep.run_once(today).await?;
    storage.close().await?;

    info!(%today, sent = report.sent, failed = report.failed, "reminder sweep complete");
    println!("giftlist: {} reminder(s) sent, {} failed", report.sent, report.failed);
    if report.failed > 0 {
        warn!("failed reminders will be retried by the next sweep today");
    }
    Ok(())
}
