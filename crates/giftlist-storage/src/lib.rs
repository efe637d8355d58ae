// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Giftlist bot.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed operations for users,
//! events, gifts, reservations, reminders, and persisted conversation sessions.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;
pub mod session_store;

pub use adapter::SqliteStorage;
pub use database::Database;
pub use session_store::SqliteSessionStore;
