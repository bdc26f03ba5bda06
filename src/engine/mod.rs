//! External analysis engine driver.
//!
//! Wraps exactly one containerized engine run per pipeline execution. The
//! engine's algorithm is a black box; this module only maps host paths to the
//! container roles it expects, waits for it to exit, and classifies failure.
//! There is no retry and no timeout: the engine's side effects on partial
//! failure are not assumed safe to repeat blindly.

pub mod invocation;

use crate::error::PipelineError;
use crate::model::{AnalysisMode, OutputTree, PipelineConfig};
use invocation::ExternalInvocation;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

pub struct AnalysisEngine<'a> {
    cfg: &'a PipelineConfig,
}

impl<'a> AnalysisEngine<'a> {
    pub fn new(cfg: &'a PipelineConfig) -> Self {
        Self { cfg }
    }

    /// Cheap up-front probe that the container runtime is present and this
    /// process may talk to it. Run once per pipeline execution so a
    /// permissions problem surfaces before any pull or invocation.
    pub async fn preflight(&self) -> Result<(), PipelineError> {
        let status = Command::new(&self.cfg.runtime)
            .arg("info")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(s) if s.success() => Ok(()),
            Ok(s) => Err(PipelineError::PermissionDenied {
                runtime: self.cfg.runtime.clone(),
                reason: format!("'{} info' exited with {s}", self.cfg.runtime),
            }),
            Err(e) => Err(PipelineError::PermissionDenied {
                runtime: self.cfg.runtime.clone(),
                reason: e.to_string(),
            }),
        }
    }

    /// Run the engine once for the configured mode. Blocks until the
    /// subprocess exits; engine output streams through to the operator.
    pub async fn invoke(&self, tree: &OutputTree) -> Result<(), PipelineError> {
        let inv = match self.cfg.mode {
            AnalysisMode::Single => ExternalInvocation::single(self.cfg, tree)?,
            AnalysisMode::Batch => ExternalInvocation::batch(self.cfg, tree)?,
        };

        let args = inv.to_args(&self.cfg.engine_image);
        let stage = self.cfg.mode.to_string();
        debug!("engine command: {} {}", self.cfg.runtime, args.join(" "));
        info!("invoking analysis engine ({stage} mode)");

        let status = Command::new(&self.cfg.runtime)
            .args(&args)
            .status()
            .await
            .map_err(|e| PipelineError::ExternalTool {
                stage: stage.clone(),
                reason: format!("failed to launch '{}': {e}", self.cfg.runtime),
            })?;

        if !status.success() {
            return Err(PipelineError::ExternalTool {
                stage,
                reason: format!("engine exited with {status}"),
            });
        }

        info!("analysis engine finished");
        Ok(())
    }
}
