//! Output tree construction.
//!
//! Creates the mode-appropriate directory skeleton before anything writes into
//! it. Creation is idempotent; a path component that already exists as a
//! non-directory is an error.

use crate::error::PipelineError;
use crate::model::{AnalysisMode, OutputTree};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const OUTPUTS_DIR: &str = "Outputs";
pub const PLOTS_DIR: &str = "Plots";
pub const RESULTS_DIR: &str = "Results";
/// Scratch landing zone for the batch engine's flat output.
pub const COMBINED_DIR: &str = "Combined_Reports";

/// Idempotent recursive directory creation.
pub fn ensure_dir(path: &Path) -> Result<(), PipelineError> {
    if path.exists() && !path.is_dir() {
        return Err(PipelineError::DirectoryCreation {
            path: path.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "path exists and is not a directory",
            ),
        });
    }
    fs::create_dir_all(path).map_err(|source| PipelineError::DirectoryCreation {
        path: path.to_path_buf(),
        source,
    })
}

/// Create the output skeleton for `mode` under `output_root`.
pub fn ensure(mode: AnalysisMode, output_root: &Path) -> Result<OutputTree, PipelineError> {
    let outputs_dir = output_root.join(OUTPUTS_DIR);
    ensure_dir(&outputs_dir)?;

    let tree = match mode {
        AnalysisMode::Single => {
            let plots = outputs_dir.join(PLOTS_DIR);
            let results = outputs_dir.join(RESULTS_DIR);
            ensure_dir(&plots)?;
            ensure_dir(&results)?;
            OutputTree {
                outputs_dir,
                results_dir: Some(results),
                plots_dir: Some(plots),
                combined_dir: None,
            }
        }
        AnalysisMode::Batch => {
            let combined = outputs_dir.join(COMBINED_DIR);
            ensure_dir(&combined)?;
            OutputTree {
                outputs_dir,
                results_dir: None,
                plots_dir: None,
                combined_dir: Some(combined),
            }
        }
    };

    info!("output tree ready under {}", tree.outputs_dir.display());
    Ok(tree)
}

/// Create one sample's `Results`/`Plots` pair and return the `Results` path.
/// Called by the router the first time a sample identity is seen; safe to
/// call again for the same sample.
pub fn ensure_sample_dirs(outputs_dir: &Path, sample_id: &str) -> Result<PathBuf, PipelineError> {
    let sample_dir = outputs_dir.join(sample_id);
    let results = sample_dir.join(RESULTS_DIR);
    ensure_dir(&results)?;
    ensure_dir(&sample_dir.join(PLOTS_DIR))?;
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let first = ensure(AnalysisMode::Batch, tmp.path()).unwrap();
        let second = ensure(AnalysisMode::Batch, tmp.path()).unwrap();
        assert_eq!(first.combined_dir, second.combined_dir);
        assert!(first.combined_dir.unwrap().is_dir());
    }

    #[test]
    fn ensure_creates_single_mode_skeleton() {
        let tmp = tempfile::tempdir().unwrap();
        let tree = ensure(AnalysisMode::Single, tmp.path()).unwrap();
        assert!(tree.results_dir.unwrap().is_dir());
        assert!(tree.plots_dir.unwrap().is_dir());
        assert!(tree.combined_dir.is_none());
    }

    #[test]
    fn ensure_rejects_file_in_the_way() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(OUTPUTS_DIR), b"not a dir").unwrap();
        let err = ensure(AnalysisMode::Single, tmp.path()).unwrap_err();
        assert!(matches!(err, PipelineError::DirectoryCreation { .. }));
    }

    #[test]
    fn sample_dirs_created_once_are_reusable() {
        let tmp = tempfile::tempdir().unwrap();
        let outputs = tmp.path().join(OUTPUTS_DIR);
        let a = ensure_sample_dirs(&outputs, "17").unwrap();
        let b = ensure_sample_dirs(&outputs, "17").unwrap();
        assert_eq!(a, b);
        assert!(outputs.join("17").join(PLOTS_DIR).is_dir());
    }
}
