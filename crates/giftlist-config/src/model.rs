// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Giftlist bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Giftlist configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GiftlistConfig {
    /// Bot behavior settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Conversation session store settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Event reminder settings.
    #[serde(default)]
    pub reminders: RemindersConfig,
}

/// Bot behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Title of the event created implicitly on first contact.
    #[serde(default = "default_event_title")]
    pub default_event_title: String,

    /// Title used when an owner creates an event without typing one.
    #[serde(default = "default_new_event_title")]
    pub new_event_title: String,

    /// Capacity of the owner notification queue.
    #[serde(default = "default_notify_queue_capacity")]
    pub notify_queue_capacity: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            default_event_title: default_event_title(),
            new_event_title: default_new_event_title(),
            notify_queue_capacity: default_notify_queue_capacity(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_event_title() -> String {
    "Мой вишлист".to_string()
}

fn default_new_event_title() -> String {
    "Новое событие".to_string()
}

fn default_notify_queue_capacity() -> usize {
    256
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required for `serve` and `remind`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Bot username (without `@`) used to build share links.
    /// When unset, the username reported by the Bot API is used.
    #[serde(default)]
    pub bot_username: Option<String>,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("giftlist").join("giftlist.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("giftlist.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Where conversation sessions live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// In-process map; sessions are lost on restart.
    #[default]
    Memory,
    /// `conversation_sessions` table in the main database.
    Sqlite,
}

/// Conversation session store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    #[serde(default)]
    pub backend: SessionBackend,

    /// Seconds a session survives without activity.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Seconds between purges of expired sessions.
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::default(),
            ttl_secs: default_ttl_secs(),
            purge_interval_secs: default_purge_interval_secs(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_purge_interval_secs() -> u64 {
    10 * 60
}

/// Event reminder configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RemindersConfig {
    /// Run the scheduled reminder sweep inside `serve`.
    #[serde(default = "default_reminders_enabled")]
    pub enabled: bool,

    /// Cron expression (5 fields) for the sweep.
    #[serde(default = "default_schedule")]
    pub schedule: String,

    /// Fixed UTC offset in hours for "today". `None` uses the host's local time.
    #[serde(default)]
    pub utc_offset_hours: Option<i32>,
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            enabled: default_reminders_enabled(),
            schedule: default_schedule(),
            utc_offset_hours: None,
        }
    }
}

fn default_reminders_enabled() -> bool {
    true
}

fn default_schedule() -> String {
    "0 9 * * *".to_string()
}
