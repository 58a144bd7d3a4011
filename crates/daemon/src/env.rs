// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

pub const ROOT: &str = "JR_ROOT";
pub const CONFIG: &str = "JR_CONFIG";
pub const INTAKE_DIR: &str = "JR_INTAKE_DIR";
pub const RESULTS_DIR: &str = "JR_RESULTS_DIR";
pub const ARCHIVE_DIR: &str = "JR_ARCHIVE_DIR";
pub const ENDPOINTS: &str = "JR_ENDPOINTS";
pub const CORE_URL: &str = "JR_CORE_URL";
pub const WORKER_ID: &str = "JR_WORKER_ID";
pub const ENDPOINT: &str = "JR_ENDPOINT";
pub const BACKEND: &str = "JR_BACKEND";
pub const DEBOUNCE_MS: &str = "JR_DEBOUNCE_MS";
pub const LOG: &str = "JR_LOG";

/// Non-empty value of an environment variable.
fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

/// Resolve the relay root: JR_ROOT > $XDG_STATE_HOME/jobrelay > ~/.local/state/jobrelay
pub fn root_dir() -> Option<PathBuf> {
    if let Some(dir) = var(ROOT) {
        return Some(PathBuf::from(dir));
    }
    if let Some(state) = dirs::state_dir() {
        return Some(state.join("jobrelay"));
    }
    dirs::home_dir().map(|home| home.join(".local/state/jobrelay"))
}

/// Explicit config file path.
pub fn config_file() -> Option<PathBuf> {
    var(CONFIG).map(PathBuf::from)
}

pub fn intake_dir() -> Option<PathBuf> {
    var(INTAKE_DIR).map(PathBuf::from)
}

pub fn results_dir() -> Option<PathBuf> {
    var(RESULTS_DIR).map(PathBuf::from)
}

pub fn archive_dir() -> Option<PathBuf> {
    var(ARCHIVE_DIR).map(PathBuf::from)
}

/// Comma-separated DevTools base URLs.
pub fn endpoints() -> Option<Vec<String>> {
    var(ENDPOINTS).map(|s| {
        s.split(',').map(str::trim).filter(|u| !u.is_empty()).map(str::to_string).collect()
    })
}

pub fn core_url() -> Option<String> {
    var(CORE_URL)
}

pub fn worker_id() -> Option<String> {
    var(WORKER_ID)
}

/// Address advertised to the orchestrator on registration.
pub fn advertised_endpoint() -> Option<String> {
    var(ENDPOINT)
}

pub fn backend() -> Option<String> {
    var(BACKEND)
}

/// Intake debounce window override. Unparseable values are ignored.
pub fn debounce() -> Option<Duration> {
    var(DEBOUNCE_MS).and_then(|s| s.trim().parse::<u64>().ok()).map(Duration::from_millis)
}

/// `EnvFilter` directives for logging.
pub fn log_filter() -> Option<String> {
    var(LOG)
}
