use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use triad_experiment::{ExperimentConfig, RunPlan};
use triad_timing::HighPrecisionTimer;

mod app;
mod cli;
mod presenter;

use app::{App, Outcome};
use presenter::TerminalPresenter;

fn main() {
    if let Err(error) = run() {
        eprintln!("triad error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = cli::Args::parse();
    init_tracing(args.verbose)?;

    let mut config = match &args.config {
        Some(path) => ExperimentConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ExperimentConfig::default(),
    };
    args.apply(&mut config);

    let plan = RunPlan::from_config(&config, args.output.clone())
        .context("experiment could not be set up")?;
    let seed = plan.seed;
    let controller = plan.into_controller(HighPrecisionTimer::new())?;

    let mut app = App::new(controller, TerminalPresenter::stdio());
    let outcome = app.run()?;

    let experiment = app.experiment();
    if experiment.missing_timer_count() > 0 {
        info!(
            count = experiment.missing_timer_count(),
            "responses recorded without reaction time"
        );
    }
    match outcome {
        Outcome::Completed => info!(seed, "session completed"),
        Outcome::Aborted => {
            let progress = experiment.progress();
            info!(
                seed,
                completed = progress.main_completed,
                total = progress.main_total,
                output = ?experiment.output_path(),
                "session ended early; completed trials are saved"
            );
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
