// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed conversation session store.
//!
//! Keeps in-flight dialog flows across restarts until their TTL runs out.

use std::time::Duration;

use async_trait::async_trait;
use giftlist_core::{ConversationSession, GiftlistError, SessionStore, UserId};
use tracing::warn;

use crate::database::Database;
use crate::queries::sessions;

pub struct SqliteSessionStore {
    db: Database,
    ttl: Duration,
}

impl SqliteSessionStore {
    pub fn new(db: Database, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn load(&self, user: UserId) -> Result<ConversationSession, GiftlistError> {
        let Some(payload) = sessions::load_session(&self.db, user, Self::now()).await? else {
            return Ok(ConversationSession::default());
        };
        match serde_json::from_str(&payload) {
            Ok(session) => Ok(session),
            Err(e) => {
                // Unreadable records (older layout) reset the conversation.
                warn!(user = %user, error = %e, "discarding unreadable session");
                sessions::delete_session(&self.db, user).await?;
                Ok(ConversationSession::default())
            }
        }
    }

    async fn save(
        &self,
        user: UserId,
        session: &ConversationSession,
    ) -> Result<(), GiftlistError> {
        if session.is_empty() {
            return sessions::delete_session(&self.db, user).await;
        }
        let payload = serde_json::to_string(session).map_err(|e| GiftlistError::Storage {
            source: Box::new(e),
        })?;
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let expires_at = Self::now().saturating_add(ttl);
        sessions::save_session(&self.db, user, payload, expires_at).await
    }

    async fn clear(&self, user: UserId) -> Result<(), GiftlistError> {
        sessions::delete_session(&self.db, user).await
    }

    async fn purge_expired(&self) -> Result<usize, GiftlistError> {
        sessions::purge_expired_sessions(&self.db, Self::now()).await
    }
}
