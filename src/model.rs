use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which analysis path the pipeline takes. Selected once at startup and
/// threaded read-only through every component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// One edited/control trace pair, one results bundle.
    Single,
    /// A manifest of samples processed in one engine invocation.
    Batch,
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisMode::Single => write!(f, "single"),
            AnalysisMode::Batch => write!(f, "batch"),
        }
    }
}

/// Immutable run configuration. Built once from the CLI and passed by
/// reference into every component; nothing downstream rediscovers paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub run_id: String,
    pub mode: AnalysisMode,
    /// Working directory holding the raw traces (batch data root).
    pub data_dir: PathBuf,
    pub edited_trace: Option<PathBuf>,
    pub control_trace: Option<PathBuf>,
    /// Guide/target nucleotide sequence (single mode).
    pub guide: Option<String>,
    pub output_root: PathBuf,
    pub manifest: Option<PathBuf>,
    /// Container runtime binary used to launch the engine (docker or podman).
    pub runtime: String,
    pub engine_image: String,
    /// Report renderer program and optional script passed as its first argument.
    pub renderer: String,
    pub renderer_script: Option<PathBuf>,
    /// Fraction of per-entry routing/render failures tolerated before the
    /// process exits non-zero.
    pub max_failure_rate: f64,
    #[serde(default)]
    pub comments: Option<String>,
}

/// Directory skeleton created by the layout step, handed to later steps so
/// they never re-derive paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputTree {
    pub outputs_dir: PathBuf,
    /// Single mode only.
    pub results_dir: Option<PathBuf>,
    /// Single mode only.
    pub plots_dir: Option<PathBuf>,
    /// Batch mode only: the engine's flat scratch landing zone.
    pub combined_dir: Option<PathBuf>,
}

/// One scratch-zone file relocated into its per-sample subtree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutedEntry {
    pub file: String,
    pub sample_id: String,
    pub dest: PathBuf,
}

/// A per-entry routing failure. Never fatal on its own; collected and
/// reported in aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingFailure {
    pub file: String,
    pub reason: String,
}

/// Outcome of draining the batch scratch directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingReport {
    pub routed: Vec<RoutedEntry>,
    /// Engine-internal files left in place.
    pub skipped: Vec<String>,
    /// Unexpected subdirectories found in the scratch zone.
    pub anomalies: Vec<String>,
    pub errors: Vec<RoutingFailure>,
}

impl RoutingReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Entries counted against the failure-rate threshold: everything except
    /// deliberate exclusions.
    pub fn attempted(&self) -> usize {
        self.routed.len() + self.errors.len()
    }
}

/// One successfully rendered report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedReport {
    /// Sample identity, or "single" for the single-mode report.
    pub sample: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderFailure {
    pub sample: String,
    pub reason: String,
}

/// Outcome of the report-rendering step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderReport {
    pub rendered: Vec<RenderedReport>,
    pub failures: Vec<RenderFailure>,
}

impl RenderReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.rendered.len() + self.failures.len()
    }
}

/// Terminal state of a run that got past validation and the engine call.
/// Fatal conditions never produce a summary at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Succeeded,
    /// Per-entry routing failures exceeded the configured threshold.
    FailedRouting,
    /// Per-sample render failures exceeded the configured threshold.
    FailedReporting,
}

/// Everything the operator needs to know about one completed run.
/// Serialized for `--json`, exports, and run history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default)]
    pub timestamp_utc: String,
    pub run_id: String,
    pub mode: AnalysisMode,
    #[serde(default)]
    pub comments: Option<String>,
    pub output_root: PathBuf,
    /// Batch mode only.
    pub routing: Option<RoutingReport>,
    pub rendering: RenderReport,
    pub outcome: RunOutcome,
}
