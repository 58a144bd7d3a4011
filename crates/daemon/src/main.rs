// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `jrelayd`: watches the intake directory and relays jobs to model
//! front-end sessions.

use jr_daemon::{logging, Config};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("jrelayd: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match logging::init(&config.paths()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("jrelayd: {e}");
            return ExitCode::FAILURE;
        }
    };

    match jr_daemon::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "relay failed");
            ExitCode::FAILURE
        }
    }
}
