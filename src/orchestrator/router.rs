//! Batch result routing.
//!
//! After a batch invocation the engine leaves a flat pile of per-sample files
//! in the scratch landing zone. Each file is claimed by the sample named in
//! its filename prefix and moved into that sample's `Results/` subtree.
//! Engine-internal artifacts stay behind. One bad entry never aborts the
//! pass; failures are collected and judged in aggregate by the controller.

use crate::error::PipelineError;
use crate::layout;
use crate::model::{RoutedEntry, RoutingFailure, RoutingReport};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Filename prefix marking engine-internal aggregate artifacts (e.g. the
/// batch index) that must never leave the scratch zone.
pub const EXCLUSION_PREFIX: &str = "ice.results";

/// Delimiter separating the sample token from the rest of a result filename.
pub const SAMPLE_DELIMITER: char = '.';

/// Derive the sample identity from a result filename: the token before the
/// first delimiter. `None` when the filename carries no delimiter or an
/// empty token; identity is never guessed.
///
/// The prefix convention is fragile by design inheritance. It lives in this
/// one function so a structured identity scheme can replace it without
/// touching the routing pass.
pub fn sample_identity(file_name: &str) -> Option<&str> {
    match file_name.split_once(SAMPLE_DELIMITER) {
        Some((id, _)) if !id.is_empty() => Some(id),
        _ => None,
    }
}

/// Engine-internal files are excluded from routing and left in place.
pub fn is_engine_internal(file_name: &str) -> bool {
    file_name.starts_with(EXCLUSION_PREFIX)
}

/// Strip trailing separators / redundant components so joins downstream never
/// produce doubled separators.
fn normalized(path: &Path) -> PathBuf {
    path.components().collect()
}

/// Drain the scratch landing zone: route every directly contained file into
/// `<outputs_dir>/<sample_id>/Results/`, skipping exclusions and recording
/// per-entry failures. Non-recursive; subdirectories are anomalies.
pub fn route(combined_dir: &Path, outputs_dir: &Path) -> Result<RoutingReport, PipelineError> {
    let combined_dir = normalized(combined_dir);
    let outputs_dir = normalized(outputs_dir);

    let mut report = RoutingReport::default();
    let mut seen: HashSet<String> = HashSet::new();

    let entries = fs::read_dir(&combined_dir).map_err(|source| PipelineError::Io {
        path: combined_dir.clone(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| PipelineError::Io {
            path: combined_dir.clone(),
            source,
        })?;

        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(os) => {
                let lossy = os.to_string_lossy().into_owned();
                warn!("routing error for {lossy}: non-UTF-8 filename");
                report.errors.push(RoutingFailure {
                    file: lossy,
                    reason: "non-UTF-8 filename".into(),
                });
                continue;
            }
        };

        if entry.path().is_dir() {
            // The engine is not expected to produce subdirectories here.
            warn!("unexpected subdirectory in scratch zone, skipping: {name}");
            report.anomalies.push(name);
            continue;
        }

        if is_engine_internal(&name) {
            debug!("leaving engine-internal artifact in place: {name}");
            report.skipped.push(name);
            continue;
        }

        let Some(sample_id) = sample_identity(&name) else {
            warn!("routing error for {name}: no sample delimiter in filename");
            report.errors.push(RoutingFailure {
                file: name,
                reason: "no sample delimiter in filename".into(),
            });
            continue;
        };
        let sample_id = sample_id.to_owned();

        // Lazily build the sample subtree the first time this identity shows up.
        if !seen.contains(&sample_id) {
            layout::ensure_sample_dirs(&outputs_dir, &sample_id)?;
            seen.insert(sample_id.clone());
        }

        let dest = outputs_dir
            .join(&sample_id)
            .join(layout::RESULTS_DIR)
            .join(&name);
        match fs::rename(entry.path(), &dest) {
            Ok(()) => {
                debug!("routed {name} -> {}", dest.display());
                report.routed.push(RoutedEntry {
                    file: name,
                    sample_id,
                    dest,
                });
            }
            Err(e) => {
                warn!("routing error for {name}: move failed: {e}");
                report.errors.push(RoutingFailure {
                    file: name,
                    reason: format!("move failed: {e}"),
                });
            }
        }
    }

    Ok(report)
}
