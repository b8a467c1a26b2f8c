// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash-safe file writes: write to a sibling temp file, fsync, then rename
//! over the destination. Used for message content files, task result files,
//! and anything else under the artifact tree that a concurrent reader must
//! never observe half-written.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn io_err(path: &Path, source: std::io::Error) -> FsError {
    FsError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Write `contents` to `path` atomically, creating parent directories as needed.
pub fn atomic_write(path: &Path, contents: &str) -> Result<(), FsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp_path = path.with_extension(format!(
        "{}.tmp",
        path.extension().and_then(|e| e.to_str()).unwrap_or("")
    ));
    {
        let mut f = File::create(&tmp_path).map_err(|e| io_err(&tmp_path, e))?;
        f.write_all(contents.as_bytes())
            .map_err(|e| io_err(&tmp_path, e))?;
        f.sync_all().map_err(|e| io_err(&tmp_path, e))?;
    }
    fs::rename(&tmp_path, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

#[cfg(test)]
#[path = "fsutil_tests.rs"]
mod tests;
