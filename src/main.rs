use clap::Parser;
use sangerflow::{cli, error::PipelineError, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init();
    let args = cli::Cli::parse();

    match cli::run(args).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            let code = e
                .downcast_ref::<PipelineError>()
                .map(PipelineError::exit_code)
                .unwrap_or(1);
            tracing::error!("run failed: {e:#}");
            std::process::exit(code);
        }
    }
}
