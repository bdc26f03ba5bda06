//! Run-summary persistence.
//!
//! Saves each run's summary as timestamped JSON under the platform data
//! directory and supports explicit exports. Persistence failures are never
//! fatal to a run; callers downgrade them to warnings.

use crate::model::RunSummary;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "sangerflow";
const RUNS_DIR: &str = "runs";

fn runs_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir().context("no local data directory on this platform")?;
    Ok(base.join(APP_DIR).join(RUNS_DIR))
}

/// Filesystem-safe variant of an RFC 3339 timestamp.
fn sanitize_timestamp(ts: &str) -> String {
    ts.replace(':', "-")
}

/// Save a run summary to the run-history directory, returning the path.
pub fn save_run(summary: &RunSummary) -> Result<PathBuf> {
    let dir = runs_dir()?;
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let name = format!(
        "run_{}_{}.json",
        sanitize_timestamp(&summary.timestamp_utc),
        summary.run_id
    );
    let path = dir.join(name);
    write_summary(&path, summary)?;
    Ok(path)
}

/// Export a run summary to an explicit path, creating parent directories.
pub fn export_json(path: &Path, summary: &RunSummary) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    write_summary(path, summary)
}

fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}
