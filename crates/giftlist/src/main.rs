// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Giftlist - a Telegram bot for shared gift lists.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod config_cmd;
mod doctor;
mod remind;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use giftlist_config::{ConfigError, GiftlistConfig};

/// Giftlist - a Telegram bot for shared gift lists.
#[derive(Parser, Debug)]
#[command(name = "giftlist", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot: long polling, dialog, reminders.
    Serve,
    /// Send the reminders due today once and exit.
    Remind,
    /// Diagnose configuration, database, and Telegram connectivity.
    Doctor {
        /// Run intensive checks (database integrity, disk, memory).
        #[arg(long)]
        deep: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Inspect the effective configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the merged configuration as TOML (secrets redacted).
    Show,
    /// Validate the configuration and report problems.
    Validate,
}

fn load(path: Option<&std::path::Path>) -> Result<GiftlistConfig, Vec<ConfigError>> {
    match path {
        Some(path) => giftlist_config::load_and_validate_path(path),
        None => giftlist_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            giftlist_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => {
            init_tracing(&config.bot.log_level);
            serve::run_serve(config).await
        }
        Some(Commands::Remind) => {
            init_tracing(&config.bot.log_level);
            remind::run_remind(config).await
        }
        Some(Commands::Doctor { deep, plain }) => {
            doctor::run_doctor(&config, cli.config.as_deref(), deep, plain).await
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => config_cmd::show(&config),
            ConfigAction::Validate => {
                println!("giftlist: configuration is valid");
                Ok(())
            }
        },
        None => {
            println!("giftlist: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("giftlist={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
