//! Pixelperfect - prompt-driven image editing CLI.

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pixelperfect::cli::Cli;
use pixelperfect::config::{self, Config};
use pixelperfect::context::ServiceContext;
use pixelperfect::error::EditError;
use pixelperfect::model::{resolve_model, validate_model};
use pixelperfect::output::{resolve_output_path, save_png};
use pixelperfect::pipeline::{run_tracked_edit, EditPipeline};
use pixelperfect::session::{Commit, RequestState, SessionStore};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("pixelperfect=debug")
    } else {
        EnvFilter::try_from_env("PIXELPERFECT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode, EditError> {
    let config_path = config::discover_config_path(cli.config.as_deref());
    let config = Config::load(&config_path).map_err(EditError::Config)?;

    let prompt = cli.resolve_prompt().map_err(|e| EditError::InvalidArgument(e.to_string()))?;

    let requested_model = cli.model.as_deref().unwrap_or(&config.defaults.model);
    let model = resolve_model(requested_model);
    validate_model(&model).map_err(EditError::InvalidArgument)?;
    let timeout = Duration::from_secs(cli.timeout.unwrap_or(config.defaults.timeout_secs));
    tracing::info!(%model, requested = requested_model, timeout_secs = timeout.as_secs(), "resolved model");

    let store = SessionStore::new();
    store.upload_file(&cli.image).await?;
    store.set_prompt(prompt.as_str());

    // Live, recording or replaying
    let replay_path = std::env::var("PIXELPERFECT_REPLAY").ok();
    let is_recording = std::env::var("PIXELPERFECT_REC").is_ok_and(|v| v == "true" || v == "1");

    let (ctx, recording_session) = if let Some(ref cassette_path) = replay_path {
        tracing::info!(cassette = %cassette_path, "replaying");
        (ServiceContext::replaying(Path::new(cassette_path))?, None)
    } else if is_recording {
        tracing::info!("recording mode enabled");
        let (ctx, session) = ServiceContext::recording(&config)?;
        (ctx, Some(session))
    } else {
        (ServiceContext::live(&config)?, None)
    };

    let pipeline = EditPipeline::new(ctx.editor, model).with_timeout(timeout);
    let commit = run_tracked_edit(&store, &pipeline).await?;
    drop(pipeline);

    if let Some(session) = recording_session {
        match session.finish() {
            Ok(path) => eprintln!("Cassette saved: {}", path.display()),
            Err(e) => tracing::warn!("failed to save cassette: {e}"),
        }
    }

    let state = store.snapshot();
    match (commit, state.request_state, state.last_result) {
        (Commit::Applied, RequestState::Succeeded, Some(result)) => {
            let output_path = resolve_output_path(cli.output.as_deref(), &prompt);
            save_png(&result.image_bytes()?, &output_path)?;
            eprintln!("Saved: {}", output_path.display());
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            let message = state.last_error.unwrap_or_else(|| "edit did not complete".into());
            eprintln!("Error: {message}");
            Ok(ExitCode::FAILURE)
        }
    }
}
