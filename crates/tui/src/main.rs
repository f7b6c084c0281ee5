mod app;
mod globe;

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    sync::{Arc, Mutex},
};

use eventglobe_core::{
    config::{self, AppConfig},
    EventRepository,
};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config_path = config::ensure_default_config()?;
    let config = AppConfig::load_from(&config_path)?;

    let repository = match &config.data_path {
        Some(path) => EventRepository::load(path)
            .with_context(|| format!("failed to load events from {}", path.display()))?,
        None => EventRepository::bundled().context("bundled dataset is invalid")?,
    };
    info!(
        config = %config_path.display(),
        events = repository.len(),
        auto_start = config.auto_start,
        "Starting event globe"
    );

    let mut app = app::GlobeApp::new(Arc::new(repository), config);
    app.run().await
}

/// Logs go to a file only; anything on stdout would corrupt the
/// alternate screen.
fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("eventglobe.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
