// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gift CRUD and reservations.
//!
//! Every mutation is scoped by the parent event, and reservations rely on a
//! conditional `UPDATE` so that at most one user ever holds a gift.

use giftlist_core::{
    EventId, Gift, GiftId, GiftPatch, GiftlistError, MAX_PRIORITY, NewGift, UserId, UserIdentity,
};
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, Row, params, params_from_iter};

use crate::database::{Database, map_tr_err};
use crate::queries::users::upsert_user;

const GIFT_SELECT: &str = "SELECT g.id, g.event_id, g.title, g.description, g.link, g.priority, \
                           g.reserved_by, r.handle, r.name, g.created_at \
                           FROM gifts g LEFT JOIN users r ON r.id = g.reserved_by";

fn row_to_gift(row: &Row<'_>) -> rusqlite::Result<Gift> {
    Ok(Gift {
        id: GiftId(row.get(0)?),
        event_id: EventId(row.get(1)?),
        title: row.get(2)?,
        description: row.get(3)?,
        link: row.get(4)?,
        priority: row.get(5)?,
        reserved_by: row.get::<_, Option<i64>>(6)?.map(UserId),
        reserved_by_handle: row.get(7)?,
        reserved_by_name: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Gifts of an event, highest priority first, then oldest first.
pub async fn get_gifts(db: &Database, event_id: EventId) -> Result<Vec<Gift>, GiftlistError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{GIFT_SELECT} WHERE g.event_id = ?1 \
                 ORDER BY g.priority DESC, g.created_at ASC, g.id ASC"
            ))?;
            let rows = stmt.query_map(params![event_id.0], row_to_gift)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_gift(
    db: &Database,
    gift_id: GiftId,
    event_id: EventId,
) -> Result<Option<Gift>, GiftlistError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("{GIFT_SELECT} WHERE g.id = ?1 AND g.event_id = ?2"),
                params![gift_id.0, event_id.0],
                row_to_gift,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a gift. Priority is clamped into `0..=5`.
pub async fn add_gift(
    db: &Database,
    event_id: EventId,
    gift: NewGift,
) -> Result<GiftId, GiftlistError> {
    let priority = gift.priority.min(MAX_PRIORITY);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO gifts (event_id, title, description, link, priority)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![event_id.0, gift.title, gift.description, gift.link, priority],
            )?;
            Ok(GiftId(conn.last_insert_rowid()))
        })
        .await
        .map_err(map_tr_err)
}

/// Apply a partial update scoped by `(gift_id, event_id)`.
///
/// Returns `false` for an empty patch or when no row matched.
pub async fn update_gift(
    db: &Database,
    gift_id: GiftId,
    event_id: EventId,
    patch: GiftPatch,
) -> Result<bool, GiftlistError> {
    if patch.is_empty() {
        return Ok(false);
    }

    let text_or_null = |v: Option<String>| v.map_or(Value::Null, Value::Text);
    let mut sets: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();
    if let Some(title) = patch.title {
        sets.push("title = ?");
        values.push(Value::Text(title));
    }
    if let Some(description) = patch.description {
        sets.push("description = ?");
        values.push(text_or_null(description));
    }
    if let Some(link) = patch.link {
        sets.push("link = ?");
        values.push(text_or_null(link));
    }
    if let Some(priority) = patch.priority {
        sets.push("priority = ?");
        values.push(Value::Integer(i64::from(priority.min(MAX_PRIORITY))));
    }
    values.push(Value::Integer(gift_id.0));
    values.push(Value::Integer(event_id.0));

    let sql = format!(
        "UPDATE gifts SET {} WHERE id = ? AND event_id = ?",
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

pub async fn delete_gift(
    db: &Database,
    gift_id: GiftId,
    event_id: EventId,
) -> Result<bool, GiftlistError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "DELETE FROM gifts WHERE id = ?1 AND event_id = ?2",
                params![gift_id.0, event_id.0],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Claim a free gift for `identity`. Returns `false` if it is taken or missing.
pub async fn reserve_gift(
    db: &Database,
    gift_id: GiftId,
    identity: &UserIdentity,
) -> Result<bool, GiftlistError> {
    let identity = identity.clone();
    db.connection()
        .call(move |conn| {
            upsert_user(conn, &identity)?;
            let changed = conn.execute(
                "UPDATE gifts SET reserved_by = ?1 WHERE id = ?2 AND reserved_by IS NULL",
                params![identity.id.0, gift_id.0],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Release a reservation, only if `user` holds it.
pub async fn unreserve_gift(
    db: &Database,
    gift_id: GiftId,
    user: UserId,
) -> Result<bool, GiftlistError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE gifts SET reserved_by = NULL WHERE id = ?1 AND reserved_by = ?2",
                params![gift_id.0, user.0],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::events::create_event;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    async fn setup_event(db: &Database) -> EventId {
        create_event(db, &UserIdentity::new(1).with_handle("owner"), "Birthday")
            .await
            .unwrap()
            .id
    }

    fn gift(title: &str, priority: u8) -> NewGift {
        NewGift {
            priority,
            ..NewGift::titled(title)
        }
    }

    #[tokio::test]
    async fn add_and_get_gift() {
        let (db, _dir) = setup_db().await;
        let event = setup_event(&db).await;
        let id = add_gift(
            &db,
            event,
            NewGift {
                title: "Headphones".into(),
                description: Some("Over-ear".into()),
                link: Some("https://example.com/h".into()),
                priority: 4,
            },
        )
        .await
        .unwrap();

        let stored = get_gift(&db, id, event).await.unwrap().unwrap();
        assert_eq!(stored.title, "Headphones");
        assert_eq!(stored.description.as_deref(), Some("Over-ear"));
        assert_eq!(stored.priority, 4);
        assert!(!stored.is_reserved());

        assert!(get_gift(&db, id, EventId(event.0 + 1)).await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn priority_is_clamped() {
        let (db, _dir) = setup_db().await;
        let event = setup_event(&db).await;
        let id = add_gift(&db, event, gift("Car", 9)).await.unwrap();
        assert_eq!(get_gift(&db, id, event).await.unwrap().unwrap().priority, 5);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn gifts_ordered_by_priority_then_age() {
        let (db, _dir) = setup_db().await;
        let event = setup_event(&db).await;
        let low = add_gift(&db, event, gift("low", 1)).await.unwrap();
        let high_a = add_gift(&db, event, gift("high a", 5)).await.unwrap();
        let none = add_gift(&db, event, gift("none", 0)).await.unwrap();
        let high_b = add_gift(&db, event, gift("high b", 5)).await.unwrap();

        let order: Vec<GiftId> = get_gifts(&db, event)
            .await
            .unwrap()
            .iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(order, vec![high_a, high_b, low, none]);

        let again: Vec<GiftId> = get_gifts(&db, event)
            .await
            .unwrap()
            .iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(order, again);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_gift_is_event_scoped() {
        let (db, _dir) = setup_db().await;
        let event = setup_event(&db).await;
        let other = create_event(&db, &UserIdentity::new(2), "Other")
            .await
            .unwrap()
            .id;
        let id = add_gift(&db, event, gift("Book", 2)).await.unwrap();

        let patch = GiftPatch {
            title: Some("Hacked".into()),
            ..Default::default()
        };
        assert!(!update_gift(&db, id, other, patch.clone()).await.unwrap());
        assert_eq!(get_gift(&db, id, event).await.unwrap().unwrap().title, "Book");

        assert!(update_gift(&db, id, event, patch).await.unwrap());
        assert!(!update_gift(&db, id, event, GiftPatch::default()).await.unwrap());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_gift_clears_optional_fields() {
        let (db, _dir) = setup_db().await;
        let event = setup_event(&db).await;
        let id = add_gift(
            &db,
            event,
            NewGift {
                description: Some("d".into()),
                link: Some("l".into()),
                ..NewGift::titled("Lamp")
            },
        )
        .await
        .unwrap();
        let patch = GiftPatch {
            description: Some(None),
            link: Some(None),
            priority: Some(3),
            ..Default::default()
        };
        assert!(update_gift(&db, id, event, patch).await.unwrap());
        let stored = get_gift(&db, id, event).await.unwrap().unwrap();
        assert!(stored.description.is_none());
        assert!(stored.link.is_none());
        assert_eq!(stored.priority, 3);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_gift_is_event_scoped() {
        let (db, _dir) = setup_db().await;
        let event = setup_event(&db).await;
        let id = add_gift(&db, event, gift("Mug", 0)).await.unwrap();
        assert!(!delete_gift(&db, id, EventId(event.0 + 100)).await.unwrap());
        assert!(delete_gift(&db, id, event).await.unwrap());
        assert!(!delete_gift(&db, id, event).await.unwrap());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_reserves_have_one_winner() {
        let (db, _dir) = setup_db().await;
        let event = setup_event(&db).await;
        let id = add_gift(&db, event, gift("Bike", 5)).await.unwrap();
        let alice = UserIdentity::new(10).with_handle("alice");
        let bob = UserIdentity::new(11).with_handle("bob");

        let (a, b) = tokio::join!(reserve_gift(&db, id, &alice), reserve_gift(&db, id, &bob));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(a ^ b, "exactly one reserve must succeed");

        let stored = get_gift(&db, id, event).await.unwrap().unwrap();
        let winner = if a { &alice } else { &bob };
        assert!(stored.is_reserved_by(winner.id));
        assert_eq!(stored.reserved_by_handle, winner.handle);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn only_reserver_can_unreserve() {
        let (db, _dir) = setup_db().await;
        let event = setup_event(&db).await;
        let id = add_gift(&db, event, gift("Watch", 3)).await.unwrap();
        let alice = UserIdentity::new(10);
        assert!(reserve_gift(&db, id, &alice).await.unwrap());

        assert!(!unreserve_gift(&db, id, UserId(11)).await.unwrap());
        assert!(get_gift(&db, id, event).await.unwrap().unwrap().is_reserved_by(alice.id));

        assert!(unreserve_gift(&db, id, alice.id).await.unwrap());
        assert!(!get_gift(&db, id, event).await.unwrap().unwrap().is_reserved());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reserving_missing_gift_fails_quietly() {
        let (db, _dir) = setup_db().await;
        assert!(!reserve_gift(&db, GiftId(12345), &UserIdentity::new(1)).await.unwrap());
        db.close().await.unwrap();
    }
}
