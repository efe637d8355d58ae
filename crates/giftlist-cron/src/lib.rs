// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cron scheduling for Giftlist background jobs.
//!
//! A [`Schedule`] pairs a five-field cron expression with the zone it is read
//! in (a fixed UTC offset, or the host's local time). [`run_scheduled`] fires a
//! [`ScheduledJob`] on startup and at every occurrence until its cancellation
//! token fires.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use croner::Cron;
use giftlist_core::GiftlistError;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Work executed on every schedule occurrence.
#[async_trait]
pub trait ScheduledJob: Send + Sync + 'static {
    /// Name used in log fields.
    fn name(&self) -> &str;

    /// Runs one occurrence.
    async fn run(&self) -> Result<(), GiftlistError>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid cron expression `{expression}`: {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("UTC offset {0}h is out of range")]
    InvalidOffset(i32),

    #[error("cron expression `{0}` has no upcoming occurrence")]
    NoOccurrence(String),
}

impl From<ScheduleError> for GiftlistError {
    fn from(e: ScheduleError) -> Self {
        GiftlistError::Config(e.to_string())
    }
}

/// Zone a schedule is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleZone {
    Local,
    Fixed(FixedOffset),
}

impl ScheduleZone {
    /// `None` means the host's local time.
    pub fn from_offset_hours(hours: Option<i32>) -> Result<Self, ScheduleError> {
        match hours {
            None => Ok(ScheduleZone::Local),
            Some(h) => FixedOffset::east_opt(h * 3600)
                .filter(|_| (-12..=14).contains(&h))
                .map(ScheduleZone::Fixed)
                .ok_or(ScheduleError::InvalidOffset(h)),
        }
    }

    /// Calendar date of `now` in this zone.
    pub fn date_of(&self, now: DateTime<Utc>) -> NaiveDate {
        match self {
            ScheduleZone::Local => now.with_timezone(&Local).date_naive(),
            ScheduleZone::Fixed(offset) => now.with_timezone(offset).date_naive(),
        }
    }

    /// Today's date in this zone.
    pub fn today(&self) -> NaiveDate {
        self.date_of(Utc::now())
    }
}

#[derive(Debug, Clone)]
pub struct Schedule {
    expression: String,
    cron: Cron,
    zone: ScheduleZone,
}

impl Schedule {
    pub fn parse(expression: &str, zone: ScheduleZone) -> Result<Self, ScheduleError> {
        let cron = Cron::from_str(expression).map_err(|e| ScheduleError::InvalidExpression {
            expression: expression.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            expression: expression.to_string(),
            cron,
            zone,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn zone(&self) -> ScheduleZone {
        self.zone
    }

    /// First occurrence strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
        let next = match self.zone {
            ScheduleZone::Local => self
                .cron
                .find_next_occurrence(&now.with_timezone(&Local), false)
                .map(|t| t.with_timezone(&Utc)),
            ScheduleZone::Fixed(offset) => self
                .cron
                .find_next_occurrence(&now.with_timezone(&offset), false)
                .map(|t| t.with_timezone(&Utc)),
        };
        next.map_err(|_| ScheduleError::NoOccurrence(self.expression.clone()))
    }
}

/// How a failed run is retried before the scheduler waits for the next
/// occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure.
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(10 * 60),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            attempts: 0,
            delay: Duration::ZERO,
        }
    }
}

/// Runs `job` once right away, then at every occurrence of `schedule` until
/// `cancel` fires.
///
/// The startup run catches up on work whose occurrence passed while the
/// process was down. Failed runs are retried per `retry`; a run that still
/// fails is logged and does not stop the schedule.
pub async fn run_scheduled(
    schedule: Schedule,
    job: Arc<dyn ScheduledJob>,
    retry: RetryPolicy,
    cancel: CancellationToken,
) -> Result<(), GiftlistError> {
    info!(job = job.name(), schedule = schedule.expression(), "scheduler started");
    if cancel.is_cancelled() || !run_with_retry(job.as_ref(), retry, &cancel).await {
        info!(job = job.name(), "scheduler stopping");
        return Ok(());
    }

    loop {
        let now = Utc::now();
        let next = schedule.next_after(now)?;
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        debug!(job = job.name(), next = %next, "next run scheduled");

        tokio::select! {
            _ = cancel.cancelled() => {
                info!(job = job.name(), "scheduler stopping");
                return Ok(());
            }
            _ = tokio::time::sleep(wait) => {}
        }

        if !run_with_retry(job.as_ref(), retry, &cancel).await {
            info!(job = job.name(), "scheduler stopping");
            return Ok(());
        }
    }
}

/// Returns `false` when cancelled while waiting to retry.
async fn run_with_retry(
    job: &dyn ScheduledJob,
    retry: RetryPolicy,
    cancel: &CancellationToken,
) -> bool {
    let mut attempt = 0;
    loop {
        match job.run().await {
            Ok(()) => {
                debug!(job = job.name(), attempt, "scheduled job finished");
                return true;
            }
            Err(e) if attempt >= retry.attempts => {
                error!(job = job.name(), attempt, error = %e, "scheduled job failed, waiting for next occurrence");
                return true;
            }
            Err(e) => {
                warn!(
                    job = job.name(),
                    attempt,
                    retry_in_secs = retry.delay.as_secs(),
                    error = %e,
                    "scheduled job failed, will retry"
                );
            }
        }
        attempt += 1;
        tokio::select! {
            _ = cancel.cancelled() => return false,
            _ = tokio::time::sleep(retry.delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn next_daily_occurrence_in_fixed_zone() {
        let zone = ScheduleZone::from_offset_hours(Some(3)).unwrap();
        let schedule = Schedule::parse("0 9 * * *", zone).unwrap();

        // 05:00 UTC is 08:00 at +03:00, so 09:00 local is 06:00 UTC.
        assert_eq!(schedule.next_after(utc(2025, 6, 1, 5, 0)).unwrap(), utc(2025, 6, 1, 6, 0));
        // Exactly on the occurrence moves to the next day.
        assert_eq!(schedule.next_after(utc(2025, 6, 1, 6, 0)).unwrap(), utc(2025, 6, 2, 6, 0));
    }

    #[test]
    fn date_follows_zone() {
        let east = ScheduleZone::from_offset_hours(Some(14)).unwrap();
        let west = ScheduleZone::from_offset_hours(Some(-12)).unwrap();
        let now = utc(2025, 1, 1, 12, 0);
        assert_eq!(east.date_of(now), NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
        assert_eq!(west.date_of(now), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            ScheduleZone::from_offset_hours(Some(20)),
            Err(ScheduleError::InvalidOffset(20))
        );
        assert!(matches!(
            Schedule::parse("every morning", ScheduleZone::Local),
            Err(ScheduleError::InvalidExpression { .. })
        ));
        let err: GiftlistError = ScheduleError::InvalidOffset(-13).into();
        assert!(matches!(err, GiftlistError::Config(_)));
    }

    /// Counts runs; the first `failures` runs fail.
    struct CountingJob {
        runs: AtomicUsize,
        failures: usize,
    }

    impl CountingJob {
        fn new(failures: usize) -> Arc<Self> {
            Arc::new(Self {
                runs: AtomicUsize::new(0),
                failures,
            })
        }

        fn runs(&self) -> usize {
            self.runs.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ScheduledJob for CountingJob {
        fn name(&self) -> &str {
            "counting"
        }

        async fn run(&self) -> Result<(), GiftlistError> {
            let n = self.runs.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(GiftlistError::Internal("boom".into()))
            } else {
                Ok(())
            }
        }
    }

    /// Lets spawned tasks make progress on the paused test clock.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn cancellation_stops_scheduler() {
        let schedule = Schedule::parse("0 9 * * *", ScheduleZone::Local).unwrap();
        let job = CountingJob::new(0);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_scheduled(schedule, job.clone(), RetryPolicy::none(), cancel.clone()));
        cancel.cancel();
        handle.await.unwrap().unwrap();
        assert_eq!(job.runs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn runs_once_on_startup_before_first_occurrence() {
        // Only fires on 1 January, so the startup run is the only one here.
        let schedule = Schedule::parse("0 0 1 1 *", ScheduleZone::Local).unwrap();
        let job = CountingJob::new(0);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_scheduled(schedule, job.clone(), RetryPolicy::none(), cancel.clone()));

        settle().await;
        assert_eq!(job.runs(), 1);

        cancel.cancel();
        handle.await.unwrap().unwrap();
        assert_eq!(job.runs(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_run_is_retried_after_delay() {
        let schedule = Schedule::parse("0 0 1 1 *", ScheduleZone::Local).unwrap();
        let job = CountingJob::new(2);
        let retry = RetryPolicy {
            attempts: 3,
            delay: Duration::from_secs(60),
        };
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_scheduled(schedule, job.clone(), retry, cancel.clone()));

        settle().await;
        assert_eq!(job.runs(), 1);
        tokio::time::advance(Duration::from_secs(61)).await;
        settle().await;
        assert_eq!(job.runs(), 2);
        tokio::time::advance(Duration::from_secs(61)).await;
        settle().await;
        // Third run succeeds; no further retries.
        assert_eq!(job.runs(), 3);
        tokio::time::advance(Duration::from_secs(600)).await;
        settle().await;
        assert_eq!(job.runs(), 3);

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_retry_wait() {
        let schedule = Schedule::parse("0 0 1 1 *", ScheduleZone::Local).unwrap();
        let job = CountingJob::new(usize::MAX);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_scheduled(schedule, job.clone(), RetryPolicy::default(), cancel.clone()));

        settle().await;
        cancel.cancel();
        handle.await.unwrap().unwrap();
        assert_eq!(job.runs(), 1);
    }
}
