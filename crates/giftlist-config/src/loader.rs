// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./giftlist.toml` > `~/.config/giftlist/giftlist.toml` >
//! `/etc/giftlist/giftlist.toml` with environment variable overrides via `GIFTLIST_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::GiftlistConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/giftlist/giftlist.toml` (system-wide)
/// 3. `~/.config/giftlist/giftlist.toml` (user XDG config)
/// 4. `./giftlist.toml` (local directory)
/// 5. `GIFTLIST_*` environment variables
pub fn load_config() -> Result<GiftlistConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<GiftlistConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GiftlistConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<GiftlistConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GiftlistConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(GiftlistConfig::default()))
        .merge(Toml::file("/etc/giftlist/giftlist.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("giftlist/giftlist.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("giftlist.toml"))
        .merge(env_provider())
}

/// Maps `GIFTLIST_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `GIFTLIST_TELEGRAM_BOT_TOKEN`
/// must become `telegram.bot_token`, not `telegram.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("GIFTLIST_").map(|key| map_env_key(key.as_str()).into())
}

/// Replace the first `<section>_` prefix of an env key with `<section>.`.
pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 5] = ["bot", "telegram", "storage", "session", "reminders"];
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
