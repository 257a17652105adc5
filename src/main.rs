use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod controller;
mod datasource;
mod deferred;
mod domain;
mod filter;
mod i18n;
mod inputter;
mod jobs;
mod model;
mod sort;
mod ui;

use controller::Controller;
use datasource::FileJobSource;
use domain::{JobtvConfig, JobtvError};
use filter::JsonFileStore;
use model::{Model, Status};
use ui::JobsUI;

/// A tui based viewer for job tables with persistent filters.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Job data file (CSV or Parquet with id, user, startTime, endTime,
    /// duration columns).
    data_file: String,

    /// View identifier under which filters are persisted.
    #[arg(long, default_value = "jobs")]
    view: String,

    /// Filter store location.
    #[arg(long, default_value = "~/.jobtv_filters.json")]
    store: String,

    /// Write a trace log to this file (filtered via RUST_LOG).
    #[arg(long)]
    log: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_path) = &cli.log
        && let Err(e) = init_logging(log_path)
    {
        eprintln!("Could not open log file: {e:?}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Err(e) => {
            ratatui::restore();
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => {
            ratatui::restore();
            ExitCode::SUCCESS
        }
    }
}

fn init_logging(path: &PathBuf) -> Result<(), JobtvError> {
    let log_file = std::fs::File::create(path)?;
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(log_file))
                .with_ansi(false),
        )
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn run(cli: Cli) -> Result<(), JobtvError> {
    info!("Starting jobtv!");

    let data_path = shellexpand::full(&cli.data_file)
        .map_err(|e| JobtvError::LoadingFailed(e.to_string()))?;
    let store_path = shellexpand::full(&cli.store)
        .map_err(|e| JobtvError::LoadingFailed(e.to_string()))?;

    let source = FileJobSource::load(PathBuf::from(data_path.as_ref()))?;
    let store = JsonFileStore::new(PathBuf::from(store_path.as_ref()));

    let config = JobtvConfig::default();
    let mut model = Model::init(&config, Box::new(store), Box::new(source), cli.view);
    model.initialize();

    let controller = Controller::new(&config);
    let ui = JobsUI;

    let mut terminal = ratatui::init();

    while model.status != Status::QUITTING {
        terminal.draw(|frame| ui.draw(model.get_uidata(), frame))?;
        let message = controller.handle_event(&model)?;
        model.update(message)?;
    }
    model.destroy();

    Ok(())
}
