use std::io::stdout;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ratatui::DefaultTerminal;
use ratatui::crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use ratatui::crossterm::execute;
use tracing::{error, info};

mod controller;
mod domain;
mod inputter;
mod logging;
mod model;
mod record;
mod source;
mod table;
mod ui;

use controller::Controller;
use domain::{DEFAULT_EVENT_POLL_TIME, DTConfig, DTError};
use model::{Model, Status};
use source::{FileRecords, RecordSource, SampleRecords};

/// A terminal data table with search, role filter, sorting and pagination.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// csv, parquet or arrow file with id, name, age and role columns.
    /// The built-in sample records are shown if omitted.
    file: Option<String>,

    /// Milliseconds to wait for terminal events per loop
    #[arg(long, default_value_t = DEFAULT_EVENT_POLL_TIME)]
    poll: u64,

    /// Where to write logs, filtered by RUST_LOG
    #[arg(long)]
    log_file: Option<String>,
}

fn expand_path(path: &str) -> Result<PathBuf, DTError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| DTError::LoadingFailed(format!("Could not expand {path}: {e}")))
}

impl Args {
    fn into_config(self) -> Result<DTConfig, DTError> {
        let mut cfg = DTConfig::default().with_event_poll_time(self.poll);
        if let Some(file) = self.file {
            cfg = cfg.with_data_file(expand_path(&file)?);
        }
        if let Some(log_file) = self.log_file {
            cfg = cfg.with_log_file(expand_path(&log_file)?);
        }
        Ok(cfg)
    }
}

fn main() -> ExitCode {
    let cfg = match Args::parse().into_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logging::init_tracing(&cfg) {
        eprintln!("Could not open log file {}: {e}", cfg.log_file.display());
        return ExitCode::FAILURE;
    }

    match run(&cfg) {
        Err(e) => {
            error!("Exiting with error: {e:?}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run(cfg: &DTConfig) -> Result<(), DTError> {
    info!("Starting dt with {:?}", cfg);

    let source: Box<dyn RecordSource> = match &cfg.data_file {
        Some(path) => Box::new(FileRecords::new(path.clone())),
        None => Box::new(SampleRecords),
    };

    // Load before taking over the terminal so errors are printed normally
    let (width, height) = ratatui::crossterm::terminal::size()?;
    let mut model = Model::init(source.as_ref(), width, height)?;
    let controller = Controller::new(cfg);

    let mut terminal = ratatui::init();
    let result = execute!(stdout(), EnableMouseCapture)
        .map_err(DTError::from)
        .and_then(|_| event_loop(&mut terminal, &mut model, &controller));

    if let Err(e) = execute!(stdout(), DisableMouseCapture) {
        error!("Could not disable mouse capture: {e}");
    }
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    model: &mut Model,
    controller: &Controller,
) -> Result<(), DTError> {
    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui::draw(model, f))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(model)? {
            model.update(Some(message))?;
        };
    }
    info!("Quitting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_args() {
        let cfg = Args::try_parse_from(["dt"]).unwrap().into_config().unwrap();
        assert_eq!(cfg.event_poll_time, DEFAULT_EVENT_POLL_TIME);
        assert_eq!(cfg.data_file, None);
        assert!(cfg.log_file.ends_with(domain::DEFAULT_LOG_FILE));
    }

    #[test]
    fn file_and_options() {
        let cfg = Args::try_parse_from([
            "dt",
            "--poll",
            "50",
            "--log-file",
            "/tmp/dt-test.log",
            "people.csv",
        ])
        .unwrap()
        .into_config()
        .unwrap();
        assert_eq!(cfg.event_poll_time, 50);
        assert_eq!(cfg.data_file, Some(PathBuf::from("people.csv")));
        assert_eq!(cfg.log_file, PathBuf::from("/tmp/dt-test.log"));
    }

    #[test]
    fn rejects_non_numeric_poll() {
        assert!(Args::try_parse_from(["dt", "--poll", "soon"]).is_err());
    }

    #[test]
    fn unknown_variable_in_path() {
        let err = expand_path("$DT_SURELY_UNSET_VARIABLE/people.csv").unwrap_err();
        assert!(matches!(err, DTError::LoadingFailed(_)));
    }
}
