use crate::model::{AnalysisMode, PipelineConfig, RunOutcome};
use crate::orchestrator::controller;
use crate::{storage, text_summary};
use anyhow::Result;
use clap::Parser;
use rand::RngCore;
use tracing::{info, warn};

#[derive(Debug, Parser, Clone)]
#[command(
    name = "sangerflow",
    version,
    about = "Genome-editing outcome analysis pipeline for Sanger traces"
)]
pub struct Cli {
    /// Analysis mode
    #[arg(long, value_enum)]
    pub mode: AnalysisMode,

    /// Working directory holding the raw trace files
    #[arg(long, default_value = ".")]
    pub data_dir: std::path::PathBuf,

    /// Edited-sample trace file (single mode)
    #[arg(long, required_if_eq("mode", "single"))]
    pub edited: Option<std::path::PathBuf>,

    /// Control trace file (single mode)
    #[arg(long, required_if_eq("mode", "single"))]
    pub control: Option<std::path::PathBuf>,

    /// Guide/target nucleotide sequence (single mode)
    #[arg(long, required_if_eq("mode", "single"))]
    pub guide: Option<String>,

    /// Root under which the Outputs/ tree is created
    #[arg(long, default_value = ".")]
    pub output_root: std::path::PathBuf,

    /// Batch manifest enumerating the sample trace pairs (batch mode)
    #[arg(long, required_if_eq("mode", "batch"))]
    pub manifest: Option<std::path::PathBuf>,

    /// Container runtime used to launch the analysis engine
    #[arg(long, default_value = "docker")]
    pub runtime: String,

    /// Analysis engine container image
    #[arg(long, default_value = "synthego/ice")]
    pub engine_image: String,

    /// Report renderer program
    #[arg(long, default_value = "Rscript")]
    pub renderer: String,

    /// Script passed to the renderer as its first argument
    #[arg(long)]
    pub renderer_script: Option<std::path::PathBuf>,

    /// Tolerated fraction of per-entry routing/render failures before the
    /// run is marked failed
    #[arg(long, default_value_t = 0.0)]
    pub max_failure_rate: f64,

    /// Print the run summary as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Export the run summary as JSON to this path
    #[arg(long)]
    pub export_json: Option<std::path::PathBuf>,

    /// Skip saving the run summary to the run-history directory
    #[arg(long)]
    pub no_save: bool,

    /// Attach custom comments to this run
    #[arg(long)]
    pub comments: Option<String>,
}

/// Generate a random run id.
fn gen_run_id() -> String {
    let mut b = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut b);
    u64::from_le_bytes(b).to_string()
}

/// Build a `PipelineConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> PipelineConfig {
    PipelineConfig {
        run_id: gen_run_id(),
        mode: args.mode,
        data_dir: args.data_dir.clone(),
        edited_trace: args.edited.clone(),
        control_trace: args.control.clone(),
        guide: args.guide.clone(),
        output_root: args.output_root.clone(),
        manifest: args.manifest.clone(),
        runtime: args.runtime.clone(),
        engine_image: args.engine_image.clone(),
        renderer: args.renderer.clone(),
        renderer_script: args.renderer_script.clone(),
        max_failure_rate: args.max_failure_rate,
        comments: args.comments.clone(),
    }
}

/// Run the pipeline and report; returns the process exit code.
pub async fn run(args: Cli) -> Result<i32> {
    let cfg = build_config(&args);
    info!("sangerflow run {} ({} mode)", cfg.run_id, cfg.mode);

    let summary = controller::run(&cfg).await?;

    if let Some(path) = args.export_json.as_deref() {
        storage::export_json(path, &summary)?;
        info!("exported summary: {}", path.display());
    }
    if !args.no_save {
        match storage::save_run(&summary) {
            Ok(path) => info!("saved run summary: {}", path.display()),
            Err(e) => warn!("failed to save run summary: {e:#}"),
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for line in text_summary::build(&summary).lines {
            println!("{line}");
        }
    }

    Ok(match summary.outcome {
        RunOutcome::Succeeded => 0,
        RunOutcome::FailedRouting => 6,
        RunOutcome::FailedReporting => 7,
    })
}
