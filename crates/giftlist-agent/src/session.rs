// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory conversation session store and its purge task.
//!
//! Records live in a [`DashMap`] keyed by user id. Each entry carries its own
//! expiry instant; expired entries are invisible to `load` and are removed by
//! [`spawn_session_purger`] or lazily on access.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use giftlist_core::{ConversationSession, GiftlistError, SessionStore, UserId};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

struct Entry {
    session: ConversationSession,
    expires_at: Instant,
}

pub struct MemorySessionStore {
    entries: DashMap<UserId, Entry>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Number of stored records, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, user: UserId) -> Result<ConversationSession, GiftlistError> {
        let now = Instant::now();
        match self.entries.get(&user) {
            Some(entry) if entry.expires_at > now => return Ok(entry.session.clone()),
            Some(_) => {}
            None => return Ok(ConversationSession::default()),
        }
        // Expired. The read guard is released by now.
        self.entries.remove_if(&user, |_, e| e.expires_at <= now);
        Ok(ConversationSession::default())
    }

    async fn save(
        &self,
        user: UserId,
        session: &ConversationSession,
    ) -> Result<(), GiftlistError> {
        if session.is_empty() {
            self.entries.remove(&user);
            return Ok(());
        }
        self.entries.insert(
            user,
            Entry {
                session: session.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(())
    }

    async fn clear(&self, user: UserId) -> Result<(), GiftlistError> {
        self.entries.remove(&user);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, GiftlistError> {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, e| e.expires_at > now);
        Ok(before.saturating_sub(self.entries.len()))
    }
}

/// Runs `purge_expired` every `interval` until `cancel` fires.
pub fn spawn_session_purger(
    store: Arc<dyn SessionStore>,
    interval: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("session purger stopping");
                    break;
                }
                _ = ticker.tick() => {
                    match store.purge_expired().await {
                        Ok(0) => {}
                        Ok(n) => info!(purged = n, "expired conversation sessions removed"),
                        Err(e) => warn!(error = %e, "session purge failed"),
                    }
                }
            }
        }
    })
}
