// src/report.rs
// =============================================================================
// Saves confirmed findings to a JSON file.
//
// The whole collection is re-serialized on every save:
//
//   { "results": [ { "url": ..., "outcomes": [...], "has_difference": true } ] }
//
// SnapshotSink does this after every finding, so a crash in the middle of a
// run never loses a finding that was already confirmed.
// =============================================================================

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::error;

use crate::checker::CheckResult;
use crate::pipeline::FindingSink;

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct Report<R> {
    pub results: R,
}

/// Writes `results` to `path`, replacing whatever was there.
///
/// The file is written next to the target first and then renamed over it,
/// so readers never see a half-written snapshot.
pub fn save_results(path: &Path, results: &[CheckResult]) -> Result<()> {
    let json = serde_json::to_string_pretty(&Report { results }).context("serializing results")?;

    let staging = staging_path(path);
    fs::write(&staging, json).with_context(|| format!("writing {}", staging.display()))?;
    fs::rename(&staging, path).with_context(|| format!("replacing {}", path.display()))?;

    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Rewrites the output file with every finding collected so far.
pub struct SnapshotSink {
    path: PathBuf,
}

impl SnapshotSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SnapshotSink { path: path.into() }
    }
}

impl FindingSink for SnapshotSink {
    fn accept(&mut self, _finding: &CheckResult, accumulated: &[CheckResult]) {
        if let Err(e) = save_results(&self.path, accumulated) {
            error!(path = %self.path.display(), error = %format!("{:#}", e), "failed to save results");
        }
    }
}
