// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Filesystem side of the job relay: directory layout, audit ledger,
//! result files and the job archive.

mod archive;
mod atomic;
mod error;
mod ledger;
mod paths;
mod results;

pub use archive::Archiver;
pub use error::StoreError;
pub use ledger::{digest, relative_path, Ledger, LedgerError};
pub use paths::RelayPaths;
pub use results::ResultWriter;
