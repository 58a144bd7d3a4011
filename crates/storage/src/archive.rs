// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::{atomic, StoreError};
use jr_core::ResultEnvelope;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Moves processed job files into the archive, merged with their outcome.
pub struct Archiver {
    dir: PathBuf,
}

impl Archiver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Re-read `source`, add `status` and `result`, write it to the archive
    /// under the same file name and remove the original.
    ///
    /// The original is removed only after the archived copy is written.
    pub fn archive(&self, source: &Path, envelope: &ResultEnvelope) -> Result<PathBuf, StoreError> {
        let name = source.file_name().ok_or_else(|| StoreError::NoFileName(source.to_path_buf()))?;
        let content = fs::read_to_string(source).map_err(|e| StoreError::io(source, e))?;
        let mut document: Value = serde_json::from_str(&content)
            .map_err(|e| StoreError::Json { path: source.to_path_buf(), source: e })?;
        let Some(map) = document.as_object_mut() else {
            return Err(StoreError::NotAnObject(source.to_path_buf()));
        };
        map.insert("status".to_string(), Value::String(envelope.status().to_string()));
        map.insert("result".to_string(), envelope.to_json());

        let dest = self.dir.join(name);
        atomic::write_json(&dest, &document)?;
        fs::remove_file(source).map_err(|e| StoreError::io(source, e))?;
        Ok(dest)
    }
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
