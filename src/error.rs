use std::path::PathBuf;
use thiserror::Error;

/// Fatal pipeline conditions. Per-entry routing and per-sample rendering
/// failures are not errors here; those are collected in their step reports
/// and only become `Routing`/`Reporting` when they exceed the configured
/// threshold.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid mode or a missing required input, detected before any side effect.
    #[error("configuration error: {0}")]
    Validation(String),

    /// The layout step could not create part of the output tree.
    #[error("failed to create output directory {path}: {source}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A filesystem read/move the pipeline cannot proceed without.
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The container runtime is missing or the process may not use it.
    #[error("cannot execute container runtime '{runtime}': {reason}")]
    PermissionDenied { runtime: String, reason: String },

    /// The engine subprocess failed or could not be launched.
    #[error("external analysis engine failed ({stage}): {reason}")]
    ExternalTool { stage: String, reason: String },

    /// Routing failures exceeded the tolerated threshold.
    #[error("routing failed for {failed} of {attempted} entries")]
    Routing { failed: usize, attempted: usize },

    /// Render failures exceeded the tolerated threshold.
    #[error("report rendering failed for {failed} of {attempted} samples")]
    Reporting { failed: usize, attempted: usize },
}

impl PipelineError {
    /// Process exit code for this failure class.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Validation(_) => 2,
            PipelineError::PermissionDenied { .. } => 3,
            PipelineError::ExternalTool { .. } => 4,
            PipelineError::DirectoryCreation { .. } | PipelineError::Io { .. } => 5,
            PipelineError::Routing { .. } => 6,
            PipelineError::Reporting { .. } => 7,
        }
    }
}
