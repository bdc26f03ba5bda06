//! Pipeline controller.
//!
//! The top-level state machine: validate → preflight → layout → engine →
//! route (batch) → render. Strictly sequential; the first fatal failure
//! halts the run with no compensating rollback. Per-entry routing and
//! per-sample rendering failures are non-fatal and judged against the
//! configured failure-rate threshold at the end.

use crate::engine::AnalysisEngine;
use crate::error::PipelineError;
use crate::model::{AnalysisMode, PipelineConfig, RunOutcome, RunSummary};
use crate::orchestrator::router;
use crate::{layout, report};
use std::path::Path;
use tracing::{info, warn};

/// Mode-specific input checks, performed before any side effect.
fn validate(cfg: &PipelineConfig) -> Result<(), PipelineError> {
    match cfg.mode {
        AnalysisMode::Single => {
            let edited = cfg.edited_trace.as_deref().ok_or_else(|| {
                PipelineError::Validation("single mode requires an edited trace".into())
            })?;
            require_file(edited, "edited trace")?;
            if cfg.control_trace.is_none() {
                return Err(PipelineError::Validation(
                    "single mode requires a control trace".into(),
                ));
            }
            if cfg.guide.as_deref().map_or(true, str::is_empty) {
                return Err(PipelineError::Validation(
                    "single mode requires a guide sequence".into(),
                ));
            }
        }
        AnalysisMode::Batch => {
            let manifest = cfg.manifest.as_deref().ok_or_else(|| {
                PipelineError::Validation("batch mode requires a manifest".into())
            })?;
            require_file(manifest, "batch manifest")?;
        }
    }
    Ok(())
}

fn require_file(path: &Path, what: &str) -> Result<(), PipelineError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PipelineError::Validation(format!(
            "{what} not found: {}",
            path.display()
        )))
    }
}

fn over_threshold(failed: usize, attempted: usize, max_rate: f64) -> bool {
    attempted > 0 && failed as f64 / attempted as f64 > max_rate
}

/// Run the whole pipeline for one configuration.
pub async fn run(cfg: &PipelineConfig) -> Result<RunSummary, PipelineError> {
    validate(cfg)?;

    let engine = AnalysisEngine::new(cfg);
    engine.preflight().await?;

    let tree = layout::ensure(cfg.mode, &cfg.output_root)?;
    engine.invoke(&tree).await?;

    let routing = match (cfg.mode, tree.combined_dir.as_deref()) {
        (AnalysisMode::Batch, Some(combined)) => {
            let report = router::route(combined, &tree.outputs_dir)?;
            info!(
                "routing: {} routed, {} excluded, {} errors",
                report.routed.len(),
                report.skipped.len(),
                report.errors.len()
            );
            Some(report)
        }
        _ => None,
    };

    let rendering = report::render(cfg, &tree).await?;
    info!(
        "rendering: {} rendered, {} failed",
        rendering.rendered.len(),
        rendering.failures.len()
    );

    let routing_failed = routing
        .as_ref()
        .is_some_and(|r| over_threshold(r.errors.len(), r.attempted(), cfg.max_failure_rate));
    let rendering_failed =
        over_threshold(rendering.failures.len(), rendering.attempted(), cfg.max_failure_rate);

    let outcome = if routing_failed {
        warn!("per-entry routing failures exceed the tolerated rate");
        RunOutcome::FailedRouting
    } else if rendering_failed {
        warn!("per-sample render failures exceed the tolerated rate");
        RunOutcome::FailedReporting
    } else {
        RunOutcome::Succeeded
    };

    Ok(RunSummary {
        timestamp_utc: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "now".into()),
        run_id: cfg.run_id.clone(),
        mode: cfg.mode,
        comments: cfg.comments.clone(),
        output_root: cfg.output_root.clone(),
        routing,
        rendering,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_judges_failure_fraction() {
        assert!(!over_threshold(0, 10, 0.0));
        assert!(over_threshold(1, 10, 0.0));
        assert!(!over_threshold(1, 10, 0.1));
        assert!(over_threshold(2, 10, 0.1));
        assert!(!over_threshold(0, 0, 0.0));
    }
}
