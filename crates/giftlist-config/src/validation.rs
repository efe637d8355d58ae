// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as known log levels, non-empty paths, positive intervals, and cron shape.

use crate::diagnostic::ConfigError;
use crate::model::GiftlistConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &GiftlistConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |key: &str, message: String| errors.push(ConfigError::validation(key, message));

    let level = config.bot.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        fail("bot.log_level", format!(
            "bot.log_level `{}` is not one of {}",
            config.bot.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.bot.default_event_title.trim().is_empty() {
        fail("bot.default_event_title", "bot.default_event_title must not be empty".to_string());
    }

    if config.bot.new_event_title.trim().is_empty() {
        fail("bot.new_event_title", "bot.new_event_title must not be empty".to_string());
    }

    if config.bot.notify_queue_capacity == 0 {
        fail("bot.notify_queue_capacity", "bot.notify_queue_capacity must be at least 1".to_string());
    }

    if let Some(token) = &config.telegram.bot_token
        && token.trim().is_empty()
    {
        fail("telegram.bot_token", "telegram.bot_token must not be empty when set".to_string());
    }

    if let Some(name) = &config.telegram.bot_username
        && (name.trim().is_empty() || name.starts_with('@'))
    {
        fail("telegram.bot_username", format!(
            "telegram.bot_username `{name}` must be non-empty and given without `@`"
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path", "storage.database_path must not be empty".to_string());
    }

    if config.session.ttl_secs == 0 {
        fail("session.ttl_secs", "session.ttl_secs must be greater than 0".to_string());
    }

    if config.session.purge_interval_secs == 0 {
        fail("session.purge_interval_secs", "session.purge_interval_secs must be greater than 0".to_string());
    }

    let fields = config.reminders.schedule.split_whitespace().count();
    if fields != 5 {
        fail("reminders.schedule", format!(
            "reminders.schedule `{}` must have 5 cron fields, got {fields}",
            config.reminders.schedule
        ));
    }

    if let Some(offset) = config.reminders.utc_offset_hours
        && !(-12..=14).contains(&offset)
    {
        fail("reminders.utc_offset_hours", format!(
            "reminders.utc_offset_hours must be within -12..=14, got {offset}"
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
