// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event (wishlist) operations, slug generation, and reference resolution.

use giftlist_core::{
    Event, EventId, EventPatch, EventWithOwner, GiftlistError, UserId, UserIdentity,
};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params, params_from_iter};
use tracing::debug;

use crate::database::{Database, map_tr_err};
use crate::queries::users::upsert_user;

const EVENT_COLUMNS: &str = "e.id, e.owner_id, e.title, e.slug, e.event_date, \
                             e.remind_days_before, e.reminder_sent_for, e.created_at";

pub(crate) fn row_to_event(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: EventId(row.get(0)?),
        owner_id: UserId(row.get(1)?),
        title: row.get(2)?,
        slug: row.get(3)?,
        event_date: row.get(4)?,
        remind_days_before: row.get(5)?,
        reminder_sent_for: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Base slug for an owner: lower-cased handle with non-word characters stripped,
/// or `id<owner>` when nothing usable remains.
pub fn slug_base(handle: Option<&str>, owner: UserId) -> String {
    let cleaned: String = handle
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if cleaned.is_empty() {
        format!("id{}", owner.0)
    } else {
        cleaned
    }
}

/// First free slug among `base`, `base-2`, `base-3`, ...
fn unique_slug(conn: &Connection, base: &str) -> rusqlite::Result<String> {
    let mut stmt = conn.prepare("SELECT 1 FROM events WHERE slug = ?1")?;
    if !stmt.exists(params![base])? {
        return Ok(base.to_string());
    }
    let mut n: u32 = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if !stmt.exists(params![candidate])? {
            return Ok(candidate);
        }
        n += 1;
    }
}

fn insert_event(
    conn: &Connection,
    identity: &UserIdentity,
    title: &str,
) -> rusqlite::Result<Event> {
    let slug = unique_slug(conn, &slug_base(identity.handle.as_deref(), identity.id))?;
    conn.execute(
        "INSERT INTO events (owner_id, title, slug) VALUES (?1, ?2, ?3)",
        params![identity.id.0, title, slug],
    )?;
    let id = conn.last_insert_rowid();
    conn.query_row(
        &format!("SELECT {EVENT_COLUMNS} FROM events e WHERE e.id = ?1"),
        params![id],
        row_to_event,
    )
}

fn earliest_event(conn: &Connection, owner: UserId) -> rusqlite::Result<Option<Event>> {
    conn.query_row(
        &format!(
            "SELECT {EVENT_COLUMNS} FROM events e WHERE e.owner_id = ?1 \
             ORDER BY e.created_at ASC, e.id ASC LIMIT 1"
        ),
        params![owner.0],
        row_to_event,
    )
    .optional()
}

/// Returns the owner's earliest event, creating one titled `default_title` if none exists.
///
/// Lookup and insert share one immediate transaction on the writer thread, so
/// concurrent first contacts of the same owner yield a single event.
pub async fn get_or_create_event(
    db: &Database,
    identity: &UserIdentity,
    default_title: &str,
) -> Result<Event, GiftlistError> {
    let identity = identity.clone();
    let default_title = default_title.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            upsert_user(&tx, &identity)?;
            let event = match earliest_event(&tx, identity.id)? {
                Some(event) => event,
                None => {
                    let event = insert_event(&tx, &identity, &default_title)?;
                    debug!(owner = %identity.id, slug = %event.slug, "implicit event created");
                    event
                }
            };
            tx.commit()?;
            Ok(event)
        })
        .await
        .map_err(map_tr_err)
}

/// Create a new event with a fresh slug.
pub async fn create_event(
    db: &Database,
    identity: &UserIdentity,
    title: &str,
) -> Result<Event, GiftlistError> {
    let identity = identity.clone();
    let title = title.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            upsert_user(&tx, &identity)?;
            let event = insert_event(&tx, &identity, &title)?;
            tx.commit()?;
            Ok(event)
        })
        .await
        .map_err(map_tr_err)
}

fn event_with_owner(
    conn: &Connection,
    filter: &str,
    value: Value,
) -> rusqlite::Result<Option<EventWithOwner>> {
    conn.query_row(
        &format!(
            "SELECT {EVENT_COLUMNS}, u.handle, u.name FROM events e \
             JOIN users u ON u.id = e.owner_id WHERE {filter} \
             ORDER BY e.created_at ASC, e.id ASC LIMIT 1"
        ),
        params![value],
        |row| {
            Ok(EventWithOwner {
                event: row_to_event(row)?,
                owner_handle: row.get(8)?,
                owner_name: row.get(9)?,
            })
        },
    )
    .optional()
}

/// Resolve a shared reference: exact slug, then numeric owner id, then handle.
///
/// The reference is expected to be normalized already (no deep-link prefix);
/// a leading `@` is ignored for the handle lookup.
pub async fn resolve_event_reference(
    db: &Database,
    reference: &str,
) -> Result<Option<EventWithOwner>, GiftlistError> {
    let reference = reference.trim().to_string();
    if reference.is_empty() {
        return Ok(None);
    }
    db.connection()
        .call(move |conn| {
            if let Some(found) =
                event_with_owner(conn, "e.slug = ?1", Value::Text(reference.clone()))?
            {
                return Ok(Some(found));
            }
            if let Ok(owner) = reference.parse::<i64>()
                && owner.to_string() == reference
                && let Some(found) = event_with_owner(conn, "e.owner_id = ?1", Value::Integer(owner))?
            {
                return Ok(Some(found));
            }
            let handle = reference.trim_start_matches('@');
            if handle.is_empty() {
                return Ok(None);
            }
            event_with_owner(
                conn,
                "lower(u.handle) = lower(?1)",
                Value::Text(handle.to_string()),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Events of an owner: dated ones by date, undated last, then creation order.
pub async fn list_events_for_owner(
    db: &Database,
    owner: UserId,
) -> Result<Vec<Event>, GiftlistError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EVENT_COLUMNS} FROM events e WHERE e.owner_id = ?1 \
                 ORDER BY e.event_date IS NULL, e.event_date ASC, e.created_at ASC, e.id ASC"
            ))?;
            let rows = stmt.query_map(params![owner.0], row_to_event)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_event(db: &Database, event_id: EventId) -> Result<Option<Event>, GiftlistError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM events e WHERE e.id = ?1"),
                params![event_id.0],
                row_to_event,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_event_for_owner(
    db: &Database,
    event_id: EventId,
    owner: UserId,
) -> Result<Option<Event>, GiftlistError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM events e WHERE e.id = ?1 AND e.owner_id = ?2"),
                params![event_id.0, owner.0],
                row_to_event,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Apply a partial update scoped by `(event_id, owner)`.
///
/// Returns `false` for an empty patch or when no row matched. Changing the
/// date re-arms the reminder.
pub async fn update_event(
    db: &Database,
    event_id: EventId,
    owner: UserId,
    patch: EventPatch,
) -> Result<bool, GiftlistError> {
    if patch.is_empty() {
        return Ok(false);
    }

    let mut sets: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();
    if let Some(title) = patch.title {
        sets.push("title = ?");
        values.push(Value::Text(title));
    }
    if let Some(date) = patch.event_date {
        sets.push("event_date = ?");
        values.push(date.map_or(Value::Null, |d| Value::Text(d.format("%Y-%m-%d").to_string())));
        sets.push("reminder_sent_for = NULL");
    }
    if let Some(days) = patch.remind_days_before {
        sets.push("remind_days_before = ?");
        values.push(days.map_or(Value::Null, |d| Value::Integer(i64::from(d))));
    }
    values.push(Value::Integer(event_id.0));
    values.push(Value::Integer(owner.0));

    let sql = format!(
        "UPDATE events SET {} WHERE id = ? AND owner_id = ?",
        sets.join(", ")
    );
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(&sql, params_from_iter(values))?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Owner-scoped delete; gifts go with it.
pub async fn delete_event(
    db: &Database,
    event_id: EventId,
    owner: UserId,
) -> Result<bool, GiftlistError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "DELETE FROM events WHERE id = ?1 AND owner_id = ?2",
                params![event_id.0, owner.0],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_event_owner_id(
    db: &Database,
    event_id: EventId,
) -> Result<Option<UserId>, GiftlistError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT owner_id FROM events WHERE id = ?1",
                params![event_id.0],
                |row| row.get(0).map(UserId),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_user_default_event_id(
    db: &Database,
    owner: UserId,
) -> Result<Option<EventId>, GiftlistError> {
    db.connection()
        .call(move |conn| Ok(earliest_event(conn, owner)?.map(|e| e.id)))
        .await
        .map_err(map_tr_err)
}

pub async fn get_share_slug(
    db: &Database,
    event_id: EventId,
) -> Result<Option<String>, GiftlistError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT slug FROM events WHERE id = ?1",
                params![event_id.0],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
