//! Text summary builder for CLI output.
//!
//! Formats the human-readable per-step lines printed at the end of a run.

use crate::model::{RunOutcome, RunSummary};
use std::collections::BTreeSet;

/// Pre-formatted lines for text output.
pub struct TextSummary {
    pub lines: Vec<String>,
}

/// Build the per-step summary: routing counts, render counts, any per-entry
/// failures, and the overall pass/fail line.
pub fn build(summary: &RunSummary) -> TextSummary {
    let mut lines = Vec::new();

    lines.push(format!(
        "Run {} ({} mode) — {}",
        summary.run_id, summary.mode, summary.timestamp_utc
    ));
    if let Some(comments) = summary.comments.as_deref() {
        if !comments.trim().is_empty() {
            lines.push(format!("Comments: {comments}"));
        }
    }

    if let Some(routing) = summary.routing.as_ref() {
        let samples: BTreeSet<&str> = routing.routed.iter().map(|e| e.sample_id.as_str()).collect();
        lines.push(format!(
            "Routing: {} entries across {} samples, {} engine-internal left in place",
            routing.routed.len(),
            samples.len(),
            routing.skipped.len()
        ));
        for anomaly in &routing.anomalies {
            lines.push(format!("  anomaly (subdirectory skipped): {anomaly}"));
        }
        for err in &routing.errors {
            lines.push(format!("  routing error: {}: {}", err.file, err.reason));
        }
    }

    lines.push(format!(
        "Reports: {} rendered, {} failed",
        summary.rendering.rendered.len(),
        summary.rendering.failures.len()
    ));
    for failure in &summary.rendering.failures {
        lines.push(format!(
            "  render error: sample {}: {}",
            failure.sample, failure.reason
        ));
    }

    lines.push(match summary.outcome {
        RunOutcome::Succeeded => "Result: PASS".to_string(),
        RunOutcome::FailedRouting => "Result: FAIL (routing errors over threshold)".to_string(),
        RunOutcome::FailedReporting => "Result: FAIL (render errors over threshold)".to_string(),
    });

    TextSummary { lines }
}
