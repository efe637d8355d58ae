// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `giftlist config` command implementation.

use giftlist_config::GiftlistConfig;
use giftlist_core::GiftlistError;

const REDACTED: &str = "<redacted>";

/// Prints the merged configuration as TOML with the bot token redacted.
pub fn show(config: &GiftlistConfig) -> Result<(), GiftlistError> {
    print!("{}", render(config)?);
    Ok(())
}

fn render(config: &GiftlistConfig) -> Result<String, GiftlistError> {
    let mut redacted = config.clone();
    if redacted.telegram.bot_token.is_some() {
        redacted.telegram.bot_token = Some(REDACTED.to_string());
    }
    toml::to_string_pretty(&redacted)
        .map_err(|e| GiftlistError::Internal(format!("failed to serialize config: {e}")))
}
