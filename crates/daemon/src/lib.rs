// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job relay daemon library
//!
//! Configuration, logging, lifecycle and orchestrator reporting for
//! `jrelayd`.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod env;
pub mod lifecycle;
pub mod logging;
pub mod reporter;

pub use config::{Config, ConfigError};
pub use lifecycle::{run, startup, LifecycleError, Relayd};
pub use reporter::Reporter;
