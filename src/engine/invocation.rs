//! Engine invocation values.
//!
//! An [`ExternalInvocation`] captures one container run: the ordered
//! role → host-path bindings plus the mode-specific engine parameters. The
//! engine only ever sees its mapped paths; nothing else on the host leaks in.

use crate::error::PipelineError;
use crate::model::{OutputTree, PipelineConfig};
use std::path::{Path, PathBuf};

/// One logical-role → host-path binding, mounted read-write at `/<role>`
/// inside the container.
#[derive(Debug, Clone)]
pub struct Binding {
    pub role: &'static str,
    pub host: PathBuf,
}

/// A fully described engine call, built fresh per run and never persisted.
#[derive(Debug, Clone)]
pub struct ExternalInvocation {
    pub bindings: Vec<Binding>,
    /// Arguments handed to the engine after the image name.
    pub params: Vec<String>,
}

fn file_name(path: &Path, what: &str) -> Result<String, PipelineError> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| PipelineError::Validation(format!("{what} path has no filename: {}", path.display())))
}

/// Directory a trace/manifest lives in; a bare filename maps to the current
/// directory.
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

impl ExternalInvocation {
    /// Single mode: control/edited trace directories plus the results
    /// directory, with the guide sequence and both trace filenames as
    /// parameters.
    pub fn single(cfg: &PipelineConfig, tree: &OutputTree) -> Result<Self, PipelineError> {
        let edited = cfg
            .edited_trace
            .as_deref()
            .ok_or_else(|| PipelineError::Validation("single mode requires an edited trace".into()))?;
        let control = cfg
            .control_trace
            .as_deref()
            .ok_or_else(|| PipelineError::Validation("single mode requires a control trace".into()))?;
        let guide = cfg
            .guide
            .as_deref()
            .ok_or_else(|| PipelineError::Validation("single mode requires a guide sequence".into()))?;
        let results = tree
            .results_dir
            .as_deref()
            .ok_or_else(|| PipelineError::Validation("single mode output tree has no results directory".into()))?;

        let edited_name = file_name(edited, "edited trace")?;
        let control_name = file_name(control, "control trace")?;

        Ok(Self {
            bindings: vec![
                Binding { role: "control", host: parent_dir(control) },
                Binding { role: "edited", host: parent_dir(edited) },
                Binding { role: "output", host: results.to_path_buf() },
            ],
            params: vec![
                "--control".into(),
                format!("/control/{control_name}"),
                "--edited".into(),
                format!("/edited/{edited_name}"),
                "--target".into(),
                guide.to_owned(),
                "--out".into(),
                "/output".into(),
            ],
        })
    }

    /// Batch mode: the raw-trace root, the manifest's directory and the
    /// scratch landing zone, with the manifest filename as parameter.
    pub fn batch(cfg: &PipelineConfig, tree: &OutputTree) -> Result<Self, PipelineError> {
        let manifest = cfg
            .manifest
            .as_deref()
            .ok_or_else(|| PipelineError::Validation("batch mode requires a manifest".into()))?;
        let combined = tree
            .combined_dir
            .as_deref()
            .ok_or_else(|| PipelineError::Validation("batch mode output tree has no scratch directory".into()))?;

        let manifest_name = file_name(manifest, "manifest")?;

        Ok(Self {
            bindings: vec![
                Binding { role: "data", host: cfg.data_dir.clone() },
                Binding { role: "batch", host: parent_dir(manifest) },
                Binding { role: "output", host: combined.to_path_buf() },
            ],
            params: vec![
                "--manifest".into(),
                format!("/batch/{manifest_name}"),
                "--data".into(),
                "/data".into(),
                "--out".into(),
                "/output".into(),
            ],
        })
    }

    /// Assemble the container-runtime argument list for this invocation.
    pub fn to_args(&self, image: &str) -> Vec<String> {
        let mut args = vec!["run".to_string(), "--rm".to_string()];
        for b in &self.bindings {
            args.push("-v".into());
            args.push(format!("{}:/{}", b.host.display(), b.role));
        }
        args.push(image.to_string());
        args.extend(self.params.iter().cloned());
        args
    }
}
