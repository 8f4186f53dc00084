use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::domain::{DTConfig, DTError};

pub const DEFAULT_LOG_FILTER: &str = "info";

/// The terminal belongs to the ui, so logs go to `config.log_file`.
pub fn init_tracing(config: &DTConfig) -> Result<(), DTError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .init();
    Ok(())
}
