// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted conversation sessions.
//!
//! Payloads are opaque JSON strings; expiry is a unix timestamp compared
//! against the caller's clock.

use giftlist_core::{GiftlistError, UserId};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// Load a payload that has not expired at `now` (unix seconds).
pub async fn load_session(
    db: &Database,
    user: UserId,
    now: i64,
) -> Result<Option<String>, GiftlistError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT payload FROM conversation_sessions WHERE user_id = ?1 AND expires_at > ?2",
                params![user.0, now],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or replace the user's payload with a new expiry.
pub async fn save_session(
    db: &Database,
    user: UserId,
    payload: String,
    expires_at: i64,
) -> Result<(), GiftlistError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversation_sessions (user_id, payload, expires_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (user_id) DO UPDATE SET
                    payload = excluded.payload,
                    expires_at = excluded.expires_at,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![user.0, payload, expires_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn delete_session(db: &Database, user: UserId) -> Result<(), GiftlistError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM conversation_sessions WHERE user_id = ?1",
                params![user.0],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete every session expired at `now`, returning the count.
pub async fn purge_expired_sessions(db: &Database, now: i64) -> Result<usize, GiftlistError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM conversation_sessions WHERE expires_at <= ?1",
                params![now],
            )
        })
        .await
        .map_err(map_tr_err)
}
