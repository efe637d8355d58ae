// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reminder bookkeeping for dated events.

use chrono::NaiveDate;
use giftlist_core::{Event, EventId, GiftlistError};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::queries::events::row_to_event;

/// Events whose reminder day is `today` and which were not reminded for it yet.
pub async fn get_events_due_for_reminder(
    db: &Database,
    today: NaiveDate,
) -> Result<Vec<Event>, GiftlistError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT e.id, e.owner_id, e.title, e.slug, e.event_date, \
                        e.remind_days_before, e.reminder_sent_for, e.created_at \
                 FROM events e \
                 WHERE e.event_date IS NOT NULL \
                   AND e.remind_days_before IS NOT NULL \
                   AND e.remind_days_before > 0 \
                   AND date(e.event_date, '-' || e.remind_days_before || ' days') = ?1 \
                   AND (e.reminder_sent_for IS NULL OR e.reminder_sent_for <> ?1) \
                 ORDER BY e.id",
            )?;
            let rows = stmt.query_map(params![today], row_to_event)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Record that the reminder for `today` went out.
pub async fn mark_reminder_sent(
    db: &Database,
    event_id: EventId,
    today: NaiveDate,
) -> Result<(), GiftlistError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE events SET reminder_sent_for = ?1 WHERE id = ?2",
                params![today, event_id.0],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
