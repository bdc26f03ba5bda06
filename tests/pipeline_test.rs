//! End-to-end controller tests using stub runtime and renderer scripts in
//! place of the real container engine and report renderer.
#![cfg(unix)]

use sangerflow::error::PipelineError;
use sangerflow::model::{AnalysisMode, PipelineConfig, RunOutcome};
use sangerflow::orchestrator::controller;
use std::fs;
use std::path::{Path, PathBuf};

fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;
    fs::write(path, body).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Runtime stub that accepts both the preflight probe and the engine run.
fn ok_runtime(dir: &Path) -> PathBuf {
    let path = dir.join("runtime-ok.sh");
    write_script(&path, "#!/bin/sh\nexit 0\n");
    path
}

/// Runtime stub that rejects even the preflight probe, like a runtime the
/// operator lacks permission to use.
fn denied_runtime(dir: &Path) -> PathBuf {
    let path = dir.join("runtime-denied.sh");
    write_script(&path, "#!/bin/sh\nexit 1\n");
    path
}

/// Runtime stub whose preflight passes but whose engine run fails.
fn failing_runtime(dir: &Path) -> PathBuf {
    let path = dir.join("runtime-fail.sh");
    write_script(&path, "#!/bin/sh\n[ \"$1\" = \"info\" ] && exit 0\nexit 1\n");
    path
}

/// Renderer stub that drops the expected artifact into the results dir.
fn ok_renderer(dir: &Path) -> PathBuf {
    let path = dir.join("renderer-ok.sh");
    write_script(
        &path,
        concat!(
            "#!/bin/sh\n",
            "while [ \"$#\" -gt 0 ]; do\n",
            "  if [ \"$1\" = \"--results-dir\" ]; then dir=\"$2\"; fi\n",
            "  shift\n",
            "done\n",
            "echo '<html></html>' > \"$dir/analysis_report.html\"\n",
        ),
    );
    path
}

/// Renderer stub that fails for one specific sample.
fn renderer_failing_for(dir: &Path, sample: &str) -> PathBuf {
    let path = dir.join("renderer-partial.sh");
    write_script(
        &path,
        &format!(
            concat!(
                "#!/bin/sh\n",
                "while [ \"$#\" -gt 0 ]; do\n",
                "  case \"$1\" in\n",
                "    --results-dir) dir=\"$2\";;\n",
                "    --sample) sample=\"$2\";;\n",
                "  esac\n",
                "  shift\n",
                "done\n",
                "[ \"$sample\" = \"{sample}\" ] && exit 3\n",
                "echo '<html></html>' > \"$dir/analysis_report.html\"\n",
            ),
            sample = sample
        ),
    );
    path
}

fn base_cfg(root: &Path, mode: AnalysisMode) -> PipelineConfig {
    PipelineConfig {
        run_id: "test".into(),
        mode,
        data_dir: root.join("data"),
        edited_trace: None,
        control_trace: None,
        guide: None,
        output_root: root.to_path_buf(),
        manifest: None,
        runtime: ok_runtime(root).to_string_lossy().into_owned(),
        engine_image: "synthego/ice".into(),
        renderer: ok_renderer(root).to_string_lossy().into_owned(),
        renderer_script: None,
        max_failure_rate: 0.0,
        comments: None,
    }
}

fn seed_scratch(root: &Path, files: &[&str]) -> PathBuf {
    let combined = root.join("Outputs").join("Combined_Reports");
    fs::create_dir_all(&combined).unwrap();
    for f in files {
        fs::write(combined.join(f), b"x").unwrap();
    }
    combined
}

fn batch_cfg(root: &Path) -> PipelineConfig {
    let data = root.join("data");
    fs::create_dir_all(&data).unwrap();
    let manifest = data.join("manifest.xlsx");
    fs::write(&manifest, b"manifest").unwrap();

    let mut cfg = base_cfg(root, AnalysisMode::Batch);
    cfg.manifest = Some(manifest);
    cfg
}

#[tokio::test]
async fn batch_run_routes_and_renders_per_sample() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let cfg = batch_cfg(root);
    // The stub engine produces nothing, so pre-seed the scratch zone with
    // what a real batch run would leave behind.
    let combined = seed_scratch(
        root,
        &[
            "11.report.txt",
            "11.summary.txt",
            "22.report.txt",
            "ice.results.index",
        ],
    );

    let summary = controller::run(&cfg).await.unwrap();
    assert_eq!(summary.outcome, RunOutcome::Succeeded);

    let routing = summary.routing.unwrap();
    assert_eq!(routing.routed.len(), 3);
    assert_eq!(routing.skipped, vec!["ice.results.index"]);
    assert!(routing.errors.is_empty());

    let outputs = root.join("Outputs");
    assert!(outputs
        .join("11")
        .join("Results")
        .join("11.summary.txt")
        .is_file());
    assert!(outputs
        .join("22")
        .join("Results")
        .join("22.report.txt")
        .is_file());
    assert!(combined.join("ice.results.index").is_file());

    assert!(outputs.join("11").join("11_analysis_report.html").is_file());
    assert!(outputs.join("22").join("22_analysis_report.html").is_file());
    assert_eq!(summary.rendering.rendered.len(), 2);
}

#[tokio::test]
async fn single_run_places_one_report_at_top_level() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let data = root.join("data");
    fs::create_dir_all(&data).unwrap();
    let edited = data.join("edited.ab1");
    let control = data.join("control.ab1");
    fs::write(&edited, b"trace").unwrap();
    fs::write(&control, b"trace").unwrap();

    let mut cfg = base_cfg(root, AnalysisMode::Single);
    cfg.edited_trace = Some(edited);
    cfg.control_trace = Some(control);
    cfg.guide = Some("ACGTACGTACGTACGTACGT".into());

    let summary = controller::run(&cfg).await.unwrap();
    assert_eq!(summary.outcome, RunOutcome::Succeeded);
    assert!(summary.routing.is_none());
    assert!(root.join("Outputs").join("analysis_report.html").is_file());
    assert!(root.join("Outputs").join("Plots").is_dir());
}

#[tokio::test]
async fn single_missing_edited_trace_fails_before_any_side_effect() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();

    let mut cfg = base_cfg(root, AnalysisMode::Single);
    cfg.edited_trace = Some(root.join("missing.ab1"));
    cfg.control_trace = Some(root.join("also-missing.ab1"));
    cfg.guide = Some("ACGT".into());

    let err = controller::run(&cfg).await.unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));
    assert!(!root.join("Outputs").exists());
}

#[tokio::test]
async fn unusable_runtime_fails_preflight_and_leaves_filesystem_untouched() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let mut cfg = batch_cfg(root);
    cfg.runtime = denied_runtime(root).to_string_lossy().into_owned();

    let err = controller::run(&cfg).await.unwrap_err();
    assert!(matches!(err, PipelineError::PermissionDenied { .. }));
    // Preflight runs before layout, so no output tree was created.
    assert!(!root.join("Outputs").exists());
}

#[tokio::test]
async fn engine_failure_stops_the_run_before_routing() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let mut cfg = batch_cfg(root);
    cfg.runtime = failing_runtime(root).to_string_lossy().into_owned();
    let combined = seed_scratch(root, &["11.report.txt"]);

    let err = controller::run(&cfg).await.unwrap_err();
    assert!(matches!(err, PipelineError::ExternalTool { .. }));
    // Nothing was routed.
    assert!(combined.join("11.report.txt").is_file());
    assert!(!root.join("Outputs").join("11").exists());
}

#[tokio::test]
async fn one_failed_render_does_not_stop_the_others() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let mut cfg = batch_cfg(root);
    cfg.renderer = renderer_failing_for(root, "13")
        .to_string_lossy()
        .into_owned();
    seed_scratch(root, &["13.report.txt", "24.report.txt"]);

    let summary = controller::run(&cfg).await.unwrap();
    assert_eq!(summary.outcome, RunOutcome::FailedReporting);
    assert_eq!(summary.rendering.rendered.len(), 1);
    assert_eq!(summary.rendering.failures.len(), 1);
    assert_eq!(summary.rendering.failures[0].sample, "13");
    assert!(root
        .join("Outputs")
        .join("24")
        .join("24_analysis_report.html")
        .is_file());
}

#[tokio::test]
async fn tolerant_threshold_passes_a_mostly_good_batch() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let mut cfg = batch_cfg(root);
    cfg.max_failure_rate = 0.5;
    seed_scratch(root, &["31.report.txt", "42.report.txt", "nodots"]);

    let summary = controller::run(&cfg).await.unwrap();
    // One unroutable entry out of three attempted stays under the 50% gate.
    assert_eq!(summary.outcome, RunOutcome::Succeeded);
    let routing = summary.routing.unwrap();
    assert_eq!(routing.errors.len(), 1);
    assert_eq!(routing.routed.len(), 2);
}
