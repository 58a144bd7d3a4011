// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing setup: stderr plus `<root>/logs/relay.log`.

use crate::env;
use jr_storage::RelayPaths;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to install subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Filter from `JR_LOG`, falling back to `info` when unset or invalid.
pub fn filter() -> EnvFilter {
    env::log_filter()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Keep the returned guard alive for the
/// life of the process; dropping it flushes the file writer.
pub fn init(paths: &RelayPaths) -> Result<WorkerGuard, LoggingError> {
    std::fs::create_dir_all(&paths.logs)?;
    let file_name = paths.log_file().file_name().map(|n| n.to_os_string()).unwrap_or_default();
    let appender = tracing_appender::rolling::never(&paths.logs, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_writer(file_writer).with_ansi(false))
        .try_init()?;
    Ok(guard)
}
