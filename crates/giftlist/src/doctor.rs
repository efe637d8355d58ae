// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `giftlist doctor` command implementation.
//!
//! Runs diagnostic checks against the Giftlist environment: configuration,
//! database reachability, Telegram credentials, and the reminder schedule.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use giftlist_config::model::GiftlistConfig;
use giftlist_core::{GiftlistError, HealthStatus, PluginAdapter};
use giftlist_cron::{Schedule, ScheduleZone};
use giftlist_telegram::TelegramChannel;

/// Status of a diagnostic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed successfully.
    Pass,
    /// Check passed with a warning.
    Warn,
    /// Check failed.
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    /// Human-readable message.
    pub message: String,
    pub duration: Duration,
}

/// Run the `giftlist doctor` command.
///
/// With `--deep`, runs additional intensive checks. With `--plain`, disables
/// colored output.
pub async fn run_doctor(
    config: &GiftlistConfig,
    config_path: Option<&Path>,
    deep: bool,
    plain: bool,
) -> Result<(), GiftlistError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    let mut results = vec![
        check_config(config_path),
        check_database(&config.storage.database_path).await,
        check_telegram(config).await,
        check_reminders(config),
    ];

    if deep {
        results.push(check_db_integrity(&config.storage.database_path).await);
        results.push(check_disk_space(&config.storage.database_path).await);
        results.push(check_memory_baseline().await);
    }

    println!();
    println!("  giftlist doctor");
    println!("  {}", "-".repeat(50));
    for result in &results {
        println!("{}", render_line(result, use_color));
    }
    println!();

    let issues = results
        .iter()
        .filter(|r| r.status != CheckStatus::Pass)
        .count();
    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
        if !deep {
            println!("  Run with --deep for detailed diagnostics.");
        }
    } else {
        println!("  All checks passed.");
    }
    println!();

    Ok(())
}

fn render_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if !use_color {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        return format!(
            "    {tag} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        );
    }

    use colored::Colorize;
    let (symbol, message) = match result.status {
        CheckStatus::Pass => ("✓".green(), result.message.normal()),
        CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
        CheckStatus::Fail => ("✗".red(), result.message.red()),
    };
    format!("    {symbol} {:<20} {message} ({duration_ms}ms)", result.name)
}

/// Check configuration loads without errors.
fn check_config(path: Option<&Path>) -> CheckResult {
    let start = Instant::now();
    let loaded = match path {
        Some(path) => giftlist_config::load_and_validate_path(path),
        None => giftlist_config::load_and_validate(),
    };
    match loaded {
        Ok(_) => CheckResult {
            name: "Configuration".to_string(),
            status: CheckStatus::Pass,
            message: "valid".to_string(),
            duration: start.elapsed(),
        },
        Err(errors) => CheckResult {
            name: "Configuration".to_string(),
            status: CheckStatus::Fail,
            message: format!("{} error(s)", errors.len()),
            duration: start.elapsed(),
        },
    }
}

/// Check database file exists and can be opened.
async fn check_database(db_path: &str) -> CheckResult {
    let start = Instant::now();
    let path = std::path::Path::new(db_path);

    if !path.exists() {
        return CheckResult {
            name: "Database".to_string(),
            status: CheckStatus::Warn,
            message: format!("not found: {db_path} (will be created on first run)"),
            duration: start.elapsed(),
        };
    }

    match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => {
            let query_result = conn
                .call(|conn| -> Result<(i64, i64), rusqlite::Error> {
                    conn.query_row(
                        "SELECT (SELECT COUNT(*) FROM events), (SELECT COUNT(*) FROM gifts)",
                        [],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                })
                .await;

            match query_result {
                Ok((events, gifts)) => CheckResult {
                    name: "Database".to_string(),
                    status: CheckStatus::Pass,
                    message: format!("connected ({events} events, {gifts} gifts)"),
                    duration: start.elapsed(),
                },
                Err(e) => CheckResult {
                    name: "Database".to_string(),
                    status: CheckStatus::Fail,
                    message: format!("query failed: {e}"),
                    duration: start.elapsed(),
                },
            }
        }
        Err(e) => CheckResult {
            name: "Database".to_string(),
            status: CheckStatus::Fail,
            message: format!("open failed: {e}"),
            duration: start.elapsed(),
        },
    }
}

/// Check the bot token is set and accepted by the Bot API.
async fn check_telegram(config: &GiftlistConfig) -> CheckResult {
    let start = Instant::now();
    let name = "Telegram".to_string();

    let channel = match TelegramChannel::new(config.telegram.clone()) {
        Ok(channel) => channel,
        Err(_) => {
            return CheckResult {
                name,
                status: CheckStatus::Fail,
                message: "telegram.bot_token is not set".to_string(),
                duration: start.elapsed(),
            };
        }
    };

    match channel.health_check().await {
        Ok(HealthStatus::Healthy) => CheckResult {
            name,
            status: CheckStatus::Pass,
            message: "bot token accepted".to_string(),
            duration: start.elapsed(),
        },
        Ok(HealthStatus::Degraded(msg)) => CheckResult {
            name,
            status: CheckStatus::Warn,
            message: msg,
            duration: start.elapsed(),
        },
        Ok(HealthStatus::Unhealthy(msg)) => CheckResult {
            name,
            status: CheckStatus::Fail,
            message: msg,
            duration: start.elapsed(),
        },
        Err(e) => CheckResult {
            name,
            status: CheckStatus::Fail,
            message: e.to_string(),
            duration: start.elapsed(),
        },
    }
}

/// Check the reminder schedule and zone parse.
fn check_reminders(config: &GiftlistConfig) -> CheckResult {
    let start = Instant::now();
    let name = "Reminders".to_string();

    if !config.reminders.enabled {
        return CheckResult {
            name,
            status: CheckStatus::Pass,
            message: "scheduler disabled (use `giftlist remind`)".to_string(),
            duration: start.elapsed(),
        };
    }

    let parsed = ScheduleZone::from_offset_hours(config.reminders.utc_offset_hours)
        .and_then(|zone| Schedule::parse(&config.reminders.schedule, zone))
        .and_then(|schedule| schedule.next_after(chrono::Utc::now()));
    match parsed {
        Ok(next) => CheckResult {
            name,
            status: CheckStatus::Pass,
            message: format!("next sweep at {}", next.format("%Y-%m-%d %H:%M UTC")),
            duration: start.elapsed(),
        },
        Err(e) => CheckResult {
            name,
            status: CheckStatus::Fail,
            message: e.to_string(),
            duration: start.elapsed(),
        },
    }
}

/// Deep check: SQLite integrity check.
async fn check_db_integrity(db_path: &str) -> CheckResult {
    let start = Instant::now();
    let path = std::path::Path::new(db_path);

    if !path.exists() {
        return CheckResult {
            name: "DB integrity".to_string(),
            status: CheckStatus::Warn,
            message: "database not found (skipped)".to_string(),
            duration: start.elapsed(),
        };
    }

    match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => {
            let result = conn
                .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                    let mut stmt = conn.prepare("PRAGMA integrity_check")?;
                    let rows: Vec<String> = stmt
                        .query_map([], |row| row.get(0))?
                        .filter_map(|r| r.ok())
                        .collect();
                    Ok(rows)
                })
                .await;

            match result {
                Ok(rows) if rows.len() == 1 && rows[0] == "ok" => CheckResult {
                    name: "DB integrity".to_string(),
                    status: CheckStatus::Pass,
                    message: "ok".to_string(),
                    duration: start.elapsed(),
                },
                Ok(rows) => CheckResult {
                    name: "DB integrity".to_string(),
                    status: CheckStatus::Fail,
                    message: format!("{} issue(s) found", rows.len()),
                    duration: start.elapsed(),
                },
                Err(e) => CheckResult {
                    name: "DB integrity".to_string(),
                    status: CheckStatus::Fail,
                    message: format!("check failed: {e}"),
                    duration: start.elapsed(),
                },
            }
        }
        Err(e) => CheckResult {
            name: "DB integrity".to_string(),
            status: CheckStatus::Fail,
            message: format!("open failed: {e}"),
            duration: start.elapsed(),
        },
    }
}

/// Deep check: available disk space.
async fn check_disk_space(db_path: &str) -> CheckResult {
    let start = Instant::now();
    let path = std::path::Path::new(db_path);
    let check_path = if path.exists() {
        path.to_path_buf()
    } else {
        path.parent()
            .unwrap_or(std::path::Path::new("."))
            .to_path_buf()
    };

    match std::fs::metadata(&check_path) {
        Ok(_) => {
            // On most platforms we can't easily get free disk space from std.
            // Report the DB file size as a heuristic.
            if path.exists() {
                let size = std::fs::metadata(path)
                    .map(|m| m.len())
                    .unwrap_or(0);
                let size_mb = size as f64 / (1024.0 * 1024.0);
                CheckResult {
                    name: "Disk space".to_string(),
                    status: CheckStatus::Pass,
                    message: format!("DB size: {size_mb:.1} MB"),
                    duration: start.elapsed(),
                }
            } else {
                CheckResult {
                    name: "Disk space".to_string(),
                    status: CheckStatus::Pass,
                    message: "directory accessible".to_string(),
                    duration: start.elapsed(),
                }
            }
        }
        Err(e) => CheckResult {
            name: "Disk space".to_string(),
            status: CheckStatus::Warn,
            message: format!("cannot access: {e}"),
            duration: start.elapsed(),
        },
    }
}

/// Deep check: memory baseline via jemalloc.
async fn check_memory_baseline() -> CheckResult {
    let start = Instant::now();

    #[cfg(not(target_env = "msvc"))]
    {
        let _ = tikv_jemalloc_ctl::epoch::advance();
        let allocated = tikv_jemalloc_ctl::stats::allocated::read().unwrap_or(0);
        let resident = tikv_jemalloc_ctl::stats::resident::read().unwrap_or(0);
        let allocated_mb = allocated as f64 / (1024.0 * 1024.0);
        let resident_mb = resident as f64 / (1024.0 * 1024.0);

        CheckResult {
            name: "Memory baseline".to_string(),
            status: CheckStatus::Pass,
            message: format!("heap: {allocated_mb:.1} MB, resident: {resident_mb:.1} MB"),
            duration: start.elapsed(),
        }
    }

    #[cfg(target_env = "msvc")]
    {
        CheckResult {
            name: "Memory baseline".to_string(),
            status: CheckStatus::Warn,
            message: "jemalloc not available on MSVC".to_string(),
            duration: start.elapsed(),
        }
    }
}
