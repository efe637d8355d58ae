// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for operations on storage entities.

pub mod events;
pub mod gifts;
pub mod reminders;
pub mod sessions;
pub mod users;
