//! Report rendering driver.
//!
//! Hands each results bundle to the external renderer and files the produced
//! HTML artifact into the output tree. In batch mode every discovered sample
//! is attempted even when an earlier one fails; failures are collected and
//! judged in aggregate by the controller.

use crate::error::PipelineError;
use crate::layout;
use crate::model::{AnalysisMode, OutputTree, PipelineConfig, RenderFailure, RenderReport, RenderedReport};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Fixed artifact name the renderer drops into the results directory before
/// we move it to its final location.
pub const REPORT_ARTIFACT: &str = "analysis_report.html";

/// Sample label the renderer receives for the single-mode report.
const SINGLE_LABEL: &str = "single";

/// Sample subtrees are distinguished from `Combined_Reports` and any other
/// top-level entries by their leading digit. Inherited convention; isolated
/// here so a structured scheme can replace it. Note that it silently drops
/// any sample identity that does not start with a digit.
pub fn is_sample_dir_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Immediate subdirectories of `Outputs/` that look like sample subtrees,
/// in stable name order.
pub fn discover_sample_dirs(outputs_dir: &Path) -> Result<Vec<(String, PathBuf)>, PipelineError> {
    let entries = fs::read_dir(outputs_dir).map_err(|source| PipelineError::Io {
        path: outputs_dir.to_path_buf(),
        source,
    })?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| PipelineError::Io {
            path: outputs_dir.to_path_buf(),
            source,
        })?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_sample_dir_name(&name) {
            dirs.push((name, entry.path()));
        } else {
            debug!("not a sample subtree, skipping: {name}");
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Invoke the renderer once against `results_dir`. Returns the failure
/// reason rather than an error so callers can accumulate.
async fn run_renderer(cfg: &PipelineConfig, results_dir: &Path, sample: &str) -> Result<(), String> {
    let mut cmd = Command::new(&cfg.renderer);
    if let Some(script) = cfg.renderer_script.as_deref() {
        cmd.arg(script);
    }
    cmd.arg("--results-dir")
        .arg(results_dir)
        .arg("--sample")
        .arg(sample);

    let output = cmd
        .output()
        .await
        .map_err(|e| format!("failed to launch '{}': {e}", cfg.renderer))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail = stderr.trim();
        return Err(if tail.is_empty() {
            format!("renderer exited with {}", output.status)
        } else {
            format!("renderer exited with {}: {tail}", output.status)
        });
    }
    Ok(())
}

/// Render into the results directory, then claim the artifact by moving it
/// to its final location in the tree.
async fn render_one(
    cfg: &PipelineConfig,
    results_dir: &Path,
    sample: &str,
    final_path: &Path,
) -> Result<(), String> {
    run_renderer(cfg, results_dir, sample).await?;

    let artifact = results_dir.join(REPORT_ARTIFACT);
    if !artifact.is_file() {
        return Err(format!("renderer produced no {REPORT_ARTIFACT}"));
    }
    fs::rename(&artifact, final_path).map_err(|e| format!("failed to move report into place: {e}"))
}

/// Render one report (single mode) or one per discovered sample subtree
/// (batch mode).
pub async fn render(cfg: &PipelineConfig, tree: &OutputTree) -> Result<RenderReport, PipelineError> {
    let mut report = RenderReport::default();

    match cfg.mode {
        AnalysisMode::Single => {
            let results_dir = tree.results_dir.as_deref().ok_or_else(|| {
                PipelineError::Validation("single mode output tree has no results directory".into())
            })?;
            let final_path = tree.outputs_dir.join(REPORT_ARTIFACT);
            match render_one(cfg, results_dir, SINGLE_LABEL, &final_path).await {
                Ok(()) => {
                    info!("rendered report: {}", final_path.display());
                    report.rendered.push(RenderedReport {
                        sample: SINGLE_LABEL.into(),
                        path: final_path,
                    });
                }
                Err(reason) => {
                    warn!("report rendering failed: {reason}");
                    report.failures.push(RenderFailure {
                        sample: SINGLE_LABEL.into(),
                        reason,
                    });
                }
            }
        }
        AnalysisMode::Batch => {
            for (sample_id, sample_dir) in discover_sample_dirs(&tree.outputs_dir)? {
                let results_dir = sample_dir.join(layout::RESULTS_DIR);
                let final_path: PathBuf =
                    sample_dir.join(format!("{sample_id}_{REPORT_ARTIFACT}"));
                match render_one(cfg, &results_dir, &sample_id, &final_path).await {
                    Ok(()) => {
                        info!("rendered report for sample {sample_id}");
                        report.rendered.push(RenderedReport {
                            sample: sample_id,
                            path: final_path,
                        });
                    }
                    Err(reason) => {
                        warn!("report rendering failed for sample {sample_id}: {reason}");
                        report.failures.push(RenderFailure {
                            sample: sample_id,
                            reason,
                        });
                    }
                }
            }
        }
    }

    Ok(report)
}
