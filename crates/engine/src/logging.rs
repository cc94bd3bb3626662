// Copyright 2025 boxoffice contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Logging initialization for the boxoffice binary
//!
//! Configuration comes from the environment:
//!
//! - `RUST_LOG`: log level filter (default: `info`); can be set per
//!   module, e.g. `RUST_LOG=boxoffice_engine=debug`
//! - `LOG_DIR`: root directory for log files (default:
//!   `{project_root}/logs`); files land in `{LOG_DIR}/boxoffice/`
//! - `LOG_TO_CONSOLE`: set to `true`, `1`, or `yes` to also log to
//!   stderr with ANSI colors
//!
//! File output rotates daily via
//! `tracing_appender::rolling::RollingFileAppender`, producing
//! `boxoffice.YYYY-MM-DD.log` with UTC timestamps, thread IDs, and
//! targets, ANSI disabled.

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::{
    non_blocking,
    rolling::{self, Rotation},
};
use tracing_subscriber::{
    EnvFilter, fmt, layer::SubscriberExt, registry::Registry, util::SubscriberInitExt,
};

use crate::config::{DEFAULT_LOG_LEVEL, DEFAULT_LOG_TO_CONSOLE, LOG_COMPONENT_NAME};

// Store log guard to prevent log loss on program exit
static LOG_GUARD: OnceLock<non_blocking::WorkerGuard> = OnceLock::new();

/// Find the workspace root by walking up from the crate directory,
/// falling back to the current directory.
fn find_project_root() -> std::path::PathBuf {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        let manifest_path = Path::new(&manifest_dir);
        let mut current = manifest_path.to_path_buf();
        loop {
            let cargo_toml = current.join("Cargo.toml");
            if cargo_toml.exists()
                && let Ok(content) = std::fs::read_to_string(&cargo_toml)
                && content.contains("[workspace]")
            {
                return current;
            }
            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }
        return manifest_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| manifest_path.to_path_buf());
    }

    if let Ok(mut current_dir) = env::current_dir() {
        loop {
            if current_dir.join("Cargo.toml").exists() {
                return current_dir;
            }
            if let Some(parent) = current_dir.parent() {
                current_dir = parent.to_path_buf();
            } else {
                break;
            }
        }
    }

    env::current_dir().unwrap_or_else(|_| Path::new(".").to_path_buf())
}

fn get_log_root() -> String {
    env::var("LOG_DIR").unwrap_or_else(|_| {
        let project_root = find_project_root();
        project_root.join("logs").to_string_lossy().to_string()
    })
}

/// Setup the daily-rolling file layer. `tracing-appender` handles the
/// rotation, so long runs switch files when the date changes.
fn setup_file_logging(log_dir: &Path) -> Result<non_blocking::NonBlocking> {
    let file_appender = rolling::RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_COMPONENT_NAME.to_string())
        .filename_suffix("log")
        .build(log_dir)
        .with_context(|| {
            format!(
                "Failed to create rolling file appender in {}",
                log_dir.display()
            )
        })?;

    let (file_writer, guard) = non_blocking(file_appender);
    LOG_GUARD.set(guard).ok();

    Ok(file_writer)
}

/// Initialize logging with file output and optional console output.
pub fn init_logging() -> Result<()> {
    dotenv::dotenv().ok();

    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
    let log_root = get_log_root();

    let log_dir = Path::new(&log_root).join(LOG_COMPONENT_NAME);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let file_writer = setup_file_logging(&log_dir)?;

    let log_to_console = env::var("LOG_TO_CONSOLE")
        .map(|v| v == "true" || v == "1" || v == "yes")
        .unwrap_or(DEFAULT_LOG_TO_CONSOLE);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let subscriber = Registry::default().with(filter).with(
        fmt::layer()
            .with_writer(file_writer)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_thread_ids(true)
            .with_target(true)
            .with_thread_names(false)
            .with_ansi(false),
    );

    if log_to_console {
        subscriber
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_timer(fmt::time::UtcTime::rfc_3339())
                    .with_thread_ids(true)
                    .with_target(true)
                    .with_thread_names(false)
                    .with_ansi(true),
            )
            .init();
    } else {
        subscriber.init();
    }

    info!(target: "server", "Log level: {}", log_level);
    info!(target: "server", "Log directory: {}", log_dir.display());
    info!(
        target: "server",
        "Log file base name: {}.YYYY-MM-DD.log (daily rolling)",
        LOG_COMPONENT_NAME
    );
    if log_to_console {
        info!(target: "server", "Console output: enabled");
    }

    Ok(())
}
