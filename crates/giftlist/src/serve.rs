// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `giftlist serve` command implementation.
//!
//! Opens SQLite storage, builds the conversation session store, connects the
//! Telegram channel, and runs the agent loop next to the reminder scheduler,
//! the owner notification queue, and the session purger. Supports graceful
//! shutdown via signal handlers.

use std::sync::Arc;
use std::time::Duration;

use giftlist_agent::{
    AgentLoop, Dialog, DialogSettings, MemorySessionStore, Notifier, ReminderSweep, shutdown,
    spawn_session_purger,
};
use giftlist_config::model::GiftlistConfig;
use giftlist_config::SessionBackend;
use giftlist_core::error::GiftlistError;
use giftlist_core::{ChannelAdapter, PluginAdapter, SessionStore, StorageAdapter, WishlistStore};
use giftlist_cron::{RetryPolicy, Schedule, ScheduleZone, run_scheduled};
use giftlist_storage::{SqliteSessionStore, SqliteStorage};
use giftlist_telegram::TelegramChannel;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Runs the `giftlist serve` command.
pub async fn run_serve(config: GiftlistConfig) -> Result<(), GiftlistError> {
    info!("starting giftlist serve");

    // Resolve the schedule before touching the network so a bad expression
    // fails fast.
    let zone = ScheduleZone::from_offset_hours(config.reminders.utc_offset_hours)?;
    let schedule = if config.reminders.enabled {
        Some(Schedule::parse(&config.reminders.schedule, zone)?)
    } else {
        info!("reminder scheduler disabled by configuration");
        None
    };

    let storage = open_storage(&config).await?;
    let sessions = build_session_store(&config, &storage)?;

    let mut telegram = TelegramChannel::new(config.telegram.clone()).map_err(|e| {
        error!(error = %e, "failed to initialize Telegram channel");
        eprintln!(
            "error: Telegram bot token required. Set telegram.bot_token in giftlist.toml \
             or the GIFTLIST_TELEGRAM_BOT_TOKEN environment variable."
        );
        e
    })?;
    telegram.connect().await?;

    let settings = DialogSettings {
        bot_username: telegram.bot_username().map(String::from),
        new_event_title: config.bot.new_event_title.clone(),
    };
    let channel: Arc<dyn ChannelAdapter> = Arc::new(telegram);
    let store: Arc<dyn WishlistStore> = storage.clone();

    let cancel = shutdown::install_signal_handler();
    let mut background: Vec<(&'static str, JoinHandle<()>)> = Vec::new();

    background.push((
        "session purger",
        spawn_session_purger(
            sessions.clone(),
            Duration::from_secs(config.session.purge_interval_secs),
            cancel.clone(),
        ),
    ));

    let (notifier, queue) = Notifier::channel(config.bot.notify_queue_capacity);
    background.push((
        "notification queue",
        tokio::spawn(queue.run(channel.clone(), cancel.clone())),
    ));

    if let Some(schedule) = schedule {
        let sweep = Arc::new(ReminderSweep::new(store.clone(), channel.clone(), zone));
        let scheduler_cancel = cancel.clone();
        background.push((
            "reminder scheduler",
            tokio::spawn(async move {
                let retry = RetryPolicy::default();
                if let Err(e) = run_scheduled(schedule, sweep, retry, scheduler_cancel).await {
                    error!(error = %e, "reminder scheduler stopped");
                }
            }),
        ));
    }

    let dialog = Arc::new(Dialog::new(store, sessions, notifier, settings));
    let agent_loop = AgentLoop::new(channel.clone(), dialog);
    let result = agent_loop.run(cancel.clone()).await;

    // The loop also ends when the channel closes; stop everything else too.
    cancel.cancel();
    for (name, handle) in background {
        if let Err(e) = handle.await {
            warn!(task = name, error = %e, "background task ended abnormally");
        }
    }

    if let Err(e) = channel.shutdown().await {
        warn!(error = %e, "channel shutdown failed");
    }
    storage.close().await?;

    info!("giftlist serve shutdown complete");
    result
}

/// Opens and migrates the database.
///
/// This is the one fatal startup condition: the operator gets the path and
/// the usual remedies on stderr.
pub(crate) async fn open_storage(
    config: &GiftlistConfig,
) -> Result<Arc<SqliteStorage>, GiftlistError> {
    let storage = SqliteStorage::new(config.storage.clone())
        .with_default_event_title(config.bot.default_event_title.clone());

    if let Err(e) = storage.initialize().await {
        error!(error = %e, path = %config.storage.database_path, "failed to open database");
        eprintln!("error: cannot open the database at {}", config.storage.database_path);
        eprintln!("  cause: {e}");
        eprintln!("  - check that the directory exists and is writable by this user");
        eprintln!("  - check that no other process holds an exclusive lock on the file");
        eprintln!("  - set storage.database_path in giftlist.toml to move it");
        eprintln!("  - run `giftlist doctor` for a full diagnosis");
        return Err(e);
    }

    info!(path = %config.storage.database_path, "storage ready");
    Ok(Arc::new(storage))
}

/// Builds the session store selected by `session.backend`.
fn build_session_store(
    config: &GiftlistConfig,
    storage: &SqliteStorage,
) -> Result<Arc<dyn SessionStore>, GiftlistError> {
    let ttl = Duration::from_secs(config.session.ttl_secs);
    let store: Arc<dyn SessionStore> = match config.session.backend {
        SessionBackend::Memory => Arc::new(MemorySessionStore::new(ttl)),
        SessionBackend::Sqlite => Arc::new(SqliteSessionStore::new(storage.database()?, ttl)),
    };
    info!(backend = ?config.session.backend, ttl_secs = config.session.ttl_secs, "session store ready");
    Ok(store)
}
