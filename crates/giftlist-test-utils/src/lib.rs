// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Giftlist integration tests.
//!
//! Provides a mock channel and a harness that wires the dialog to temp
//! storage, for fast deterministic tests without the chat platform.
//!
//! # Components
//!
//! - [`MockChannel`] - Mock channel with event injection and reply capture
//! - [`TestHarness`] - Dialog stack over a temp SQLite database

pub mod harness;
pub mod mock_channel;

pub use harness::{TestHarness, TestHarnessBuilder, last_text, toast, user};
pub use mock_channel::MockChannel;
