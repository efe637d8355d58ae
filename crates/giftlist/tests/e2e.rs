// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete Giftlist pipeline.
//!
//! Each test creates an isolated TestHarness with a temp SQLite database and a
//! mock channel. Tests are independent and order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use giftlist_agent::{CallbackAction, ReminderSweep};
use giftlist_config::SessionBackend;
use giftlist_core::{ChannelAdapter, EventPatch, SessionStore, WishlistStore};
use giftlist_cron::{RetryPolicy, Schedule, ScheduleZone, run_scheduled};
use giftlist_test_utils::{TestHarness, last_text, toast, user};
use tokio_util::sync::CancellationToken;

fn march_10() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

// ---- Owner and visitor journey ----

#[tokio::test]
async fn owner_builds_list_and_friend_reserves() {
    let harness = TestHarness::builder()
        .with_bot_username(Some("wishlist_bot"))
        .with_today(march_10)
        .build()
        .await
        .unwrap();
    let alice = user(1, "alice");
    let bob = user(2, "bob");

    harness.command(&alice, "start", "").await.unwrap();
    harness.press(&alice, CallbackAction::MenuCreate).await.unwrap();
    harness.press(&alice, CallbackAction::OwnerAdd).await.unwrap();
    harness.say(&alice, "Наушники").await.unwrap();
    harness.press(&alice, CallbackAction::AddSkipDescription).await.unwrap();
    harness.press(&alice, CallbackAction::AddSkipLink).await.unwrap();
    let out = harness.press(&alice, CallbackAction::AddPriority(4)).await.unwrap();
    assert!(last_text(&out).unwrap().contains("<b>Наушники</b> добавлен! ⭐⭐⭐⭐"));

    let event = harness.storage.list_events_for_owner(alice.id).await.unwrap()[0].clone();
    let gifts = harness.storage.get_gifts(event.id).await.unwrap();
    assert_eq!(gifts.len(), 1);
    assert_eq!(gifts[0].description, None);
    assert_eq!(gifts[0].link, None);
    assert_eq!(gifts[0].priority, 4);

    let out = harness.press(&alice, CallbackAction::OwnerShare).await.unwrap();
    let share = last_text(&out).unwrap();
    assert!(share.contains(&format!("https://t.me/wishlist_bot?start={}", event.slug)));

    let out = harness.command(&bob, "start", &event.slug).await.unwrap();
    let list = last_text(&out).unwrap();
    assert!(list.contains("Наушники"));
    assert!(list.contains("@alice"));

    let out = harness
        .press(&bob, CallbackAction::Reserve(gifts[0].id))
        .await
        .unwrap();
    assert!(toast(&out).is_some());
    assert!(last_text(&out).unwrap().contains("подарит @bob"));

    let notifications = harness.take_notifications().await;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].chat_id, 1);
    assert!(notifications[0].text.contains("Наушники"));

    // The owner sees the gift is taken but not by whom.
    let out = harness.press(&alice, CallbackAction::OwnerList).await.unwrap();
    let owner_view = last_text(&out).unwrap();
    assert!(owner_view.contains("будет подарен"));
    assert!(!owner_view.contains("@bob"));
}

#[tokio::test]
async fn unreserve_by_someone_else_changes_nothing() {
    let harness = TestHarness::builder().build().await.unwrap();
    let alice = user(1, "alice");
    let bob = user(2, "bob");
    let carol = user(3, "carol");

    harness.press(&alice, CallbackAction::MenuCreate).await.unwrap();
    let event = harness.storage.list_events_for_owner(alice.id).await.unwrap()[0].clone();
    let gift = harness
        .storage
        .add_gift(event.id, giftlist_core::NewGift::titled("Книга"))
        .await
        .unwrap();

    harness.command(&bob, "start", &event.slug).await.unwrap();
    harness.press(&bob, CallbackAction::Reserve(gift)).await.unwrap();
    harness.command(&carol, "start", &event.slug).await.unwrap();
    harness.press(&carol, CallbackAction::Unreserve(gift)).await.unwrap();

    let stored = harness.storage.get_gift(gift, event.id).await.unwrap().unwrap();
    assert!(stored.is_reserved_by(bob.id));
}

// ---- Deadlines and reminders ----

#[tokio::test]
async fn reminder_goes_out_once_on_its_day() {
    let harness = TestHarness::builder()
        .with_today(march_10)
        .build()
        .await
        .unwrap();
    let alice = user(1, "alice");

    harness.press(&alice, CallbackAction::MenuCreate).await.unwrap();
    let event = harness.storage.list_events_for_owner(alice.id).await.unwrap()[0].clone();
    harness.press(&alice, CallbackAction::SetDate(event.id)).await.unwrap();
    let out = harness.say(&alice, "20.03").await.unwrap();
    assert!(last_text(&out).unwrap().starts_with("✅ Дата события: 20 марта 2025."));
    harness.press(&alice, CallbackAction::Remind(event.id, 3)).await.unwrap();
    harness.mock_channel.clear_sent().await;

    let channel: Arc<dyn ChannelAdapter> = harness.mock_channel.clone();
    let sweep = ReminderSweep::new(harness.storage.clone(), channel, ScheduleZone::Local);

    let early = sweep.run_once(NaiveDate::from_ymd_opt(2025, 3, 16).unwrap()).await.unwrap();
    assert_eq!(early.sent, 0);

    let due = NaiveDate::from_ymd_opt(2025, 3, 17).unwrap();
    let first = sweep.run_once(due).await.unwrap();
    assert_eq!(first.sent, 1);
    let second = sweep.run_once(due).await.unwrap();
    assert_eq!(second.sent, 0);

    let sent = harness.mock_channel.sent_to(1).await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("Напоминание"));
    assert!(sent[0].text.contains("20 марта 2025"));
}

#[tokio::test]
async fn scheduler_started_after_fire_time_still_sends_todays_reminder() {
    let harness = TestHarness::builder().build().await.unwrap();
    let alice = user(1, "alice");
    let today = ScheduleZone::Local.today();

    let event = harness.storage.get_or_create_event(&alice).await.unwrap();
    let patch = EventPatch {
        event_date: Some(Some(today + chrono::Duration::days(3))),
        remind_days_before: Some(Some(3)),
        ..Default::default()
    };
    assert!(harness.storage.update_event(event.id, alice.id, patch).await.unwrap());

    // Midnight has already passed today, so the next occurrence is tomorrow.
    let schedule = Schedule::parse("0 0 * * *", ScheduleZone::Local).unwrap();
    let channel: Arc<dyn ChannelAdapter> = harness.mock_channel.clone();
    let sweep = Arc::new(ReminderSweep::new(harness.storage.clone(), channel, ScheduleZone::Local));
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(run_scheduled(
        schedule,
        sweep.clone(),
        RetryPolicy::none(),
        cancel.clone(),
    ));

    for _ in 0..200 {
        if harness.mock_channel.sent_count().await > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cancel.cancel();
    handle.await.unwrap().unwrap();

    let sent = harness.mock_channel.sent_to(1).await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("Напоминание"));
    assert_eq!(sweep.run_once(today).await.unwrap().sent, 0);
}

// ---- Sessions ----

#[tokio::test]
async fn sqlite_session_backend_records_pending_input() {
    let harness = TestHarness::builder()
        .with_session_backend(SessionBackend::Sqlite)
        .build()
        .await
        .unwrap();
    let alice = user(1, "alice");

    harness.press(&alice, CallbackAction::MenuCreate).await.unwrap();
    harness.press(&alice, CallbackAction::OwnerAdd).await.unwrap();

    let session = harness.sessions.load(alice.id).await.unwrap();
    assert!(session.pending.is_some());
    assert!(session.current_event.is_some());
}

#[tokio::test(start_paused = true)]
async fn expired_session_forgets_pending_input() {
    let harness = TestHarness::builder()
        .with_session_ttl(Duration::from_secs(60))
        .build()
        .await
        .unwrap();
    let alice = user(1, "alice");

    harness.press(&alice, CallbackAction::MenuCreate).await.unwrap();
    harness.press(&alice, CallbackAction::OwnerAdd).await.unwrap();
    tokio::time::advance(Duration::from_secs(61)).await;

    // Without the pending add, free text is not taken as a gift title.
    harness.say(&alice, "Наушники").await.unwrap();
    let event = harness.storage.list_events_for_owner(alice.id).await.unwrap()[0].clone();
    assert!(harness.storage.get_gifts(event.id).await.unwrap().is_empty());
}

// ---- Full loop ----

#[tokio::test]
async fn loop_serves_commands_until_cancelled() {
    let harness = TestHarness::builder().build().await.unwrap();
    let alice = user(1, "alice");
    let cancel = CancellationToken::new();
    let handle = harness.spawn_loop(cancel.clone()).await;

    harness
        .mock_channel
        .inject(giftlist_core::InboundEvent::Command {
            from: alice.clone(),
            chat_id: 1,
            name: "help".into(),
            args: String::new(),
        })
        .await;

    for _ in 0..200 {
        if harness.mock_channel.sent_count().await > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cancel.cancel();
    handle.await.unwrap().unwrap();

    assert_eq!(harness.mock_channel.sent_to(1).await.len(), 1);
}

#[tokio::test]
async fn harness_isolation() {
    let first = TestHarness::builder().build().await.unwrap();
    let second = TestHarness::builder().build().await.unwrap();
    let alice = user(1, "alice");

    first.press(&alice, CallbackAction::MenuCreate).await.unwrap();

    assert_eq!(first.storage.list_events_for_owner(alice.id).await.unwrap().len(), 1);
    assert!(second.storage.list_events_for_owner(alice.id).await.unwrap().is_empty());
}
