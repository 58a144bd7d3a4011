// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::{atomic, StoreError};
use jr_core::{result_file_name, ResultEnvelope};
use std::path::{Path, PathBuf};

/// Writes `<stem>.result.json` files into the results directory.
pub struct ResultWriter {
    dir: PathBuf,
}

impl ResultWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the result for a job file would be written.
    pub fn path_for(&self, job_file_name: &str) -> PathBuf {
        self.dir.join(result_file_name(job_file_name))
    }

    /// Atomically write the envelope, returning the written path.
    pub fn write(&self, job_file_name: &str, envelope: &ResultEnvelope) -> Result<PathBuf, StoreError> {
        let path = self.path_for(job_file_name);
        atomic::write_json(&path, &envelope.to_json())?;
        Ok(path)
    }
}

#[cfg(test)]
#[path = "results_tests.rs"]
mod tests;
