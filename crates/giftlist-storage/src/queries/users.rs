// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User upserts.

use giftlist_core::{GiftlistError, UserId, UserIdentity};
use rusqlite::{Connection, OptionalExtension, params};

use crate::database::Database;

/// Upsert a user inside an existing closure. Known handle/name survive a null update.
pub(crate) fn upsert_user(conn: &Connection, identity: &UserIdentity) -> rusqlite::Result<()> {
    let handle = identity
        .handle
        .as_deref()
        .map(|h| h.trim_start_matches('@'))
        .filter(|h| !h.is_empty());
    let name = identity.name.as_deref().filter(|n| !n.is_empty());
    conn.execute(
        "INSERT INTO users (id, handle, name) VALUES (?1, ?2, ?3)
         ON CONFLICT (id) DO UPDATE SET
            handle = COALESCE(excluded.handle, users.handle),
            name = COALESCE(excluded.name, users.name)",
        params![identity.id.0, handle, name],
    )?;
    Ok(())
}

/// Ensure a user row exists and carries the freshest known handle/name.
pub async fn ensure_user(db: &Database, identity: &UserIdentity) -> Result<(), GiftlistError> {
    let identity = identity.clone();
    db.connection()
        .call(move |conn| upsert_user(conn, &identity))
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a user's stored identity.
pub async fn get_user(db: &Database, id: UserId) -> Result<Option<UserIdentity>, GiftlistError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, handle, name FROM users WHERE id = ?1",
                params![id.0],
                |row| {
                    Ok(UserIdentity {
                        id: UserId(row.get(0)?),
                        handle: row.get(1)?,
                        name: row.get(2)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn ensure_user_inserts_then_keeps_known_fields() {
        let (db, _dir) = setup_db().await;
        ensure_user(&db, &UserIdentity::new(1).with_handle("@anna").with_name("Anna"))
            .await
            .unwrap();
        // A later contact without a handle must not erase it.
        ensure_user(&db, &UserIdentity::new(1)).await.unwrap();

        let user = get_user(&db, UserId(1)).await.unwrap().unwrap();
        assert_eq!(user.handle.as_deref(), Some("anna"));
        assert_eq!(user.name.as_deref(), Some("Anna"));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn ensure_user_updates_changed_handle() {
        let (db, _dir) = setup_db().await;
        ensure_user(&db, &UserIdentity::new(2).with_handle("old"))
            .await
            .unwrap();
        ensure_user(&db, &UserIdentity::new(2).with_handle("new"))
            .await
            .unwrap();
        let user = get_user(&db, UserId(2)).await.unwrap().unwrap();
        assert_eq!(user.handle.as_deref(), Some("new"));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn unknown_user_is_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_user(&db, UserId(404)).await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
