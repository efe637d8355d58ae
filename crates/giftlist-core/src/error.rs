// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Giftlist bot.
//!
//! Expected domain outcomes (a gift that is already reserved, a stale edit
//! session, an unparsable date) are not errors: the dialog renders them inline.
//! `GiftlistError` is reserved for infrastructure failures and broken invariants.

use thiserror::Error;

/// The primary error type used across all Giftlist adapter traits and core operations.
#[derive(Debug, Error)]
pub enum GiftlistError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel adapter errors (connection failure, delivery failure, rate limiting).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A referenced entity does not exist (or is not visible to the caller).
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Input rejected by a validating parser.
    #[error("validation error: {0}")]
    Validation(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GiftlistError {
    /// Shorthand for a storage error carrying only a message.
    pub fn storage_msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        GiftlistError::Storage {
            source: message.into(),
        }
    }
}
