// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-to-temp then rename, so readers never observe a partial file.

use crate::StoreError;
use std::fs;
use std::path::Path;

/// Atomically replace `path` with two-space indented JSON.
///
/// The temp file is hidden (leading dot) so a watcher on the same directory
/// never mistakes it for a job.
pub(crate) fn write_json(path: &Path, value: &serde_json::Value) -> Result<(), StoreError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StoreError::NoFileName(path.to_path_buf()))?;
    let tmp_path = path.with_file_name(format!(".{name}.tmp"));

    let mut json = serde_json::to_string_pretty(value)
        .map_err(|source| StoreError::Json { path: path.to_path_buf(), source })?;
    json.push('\n');

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    fs::write(&tmp_path, json.as_bytes()).map_err(|e| StoreError::io(&tmp_path, e))?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::io(path, e));
    }
    Ok(())
}
