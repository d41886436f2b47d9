mod app;
mod cli;

use std::{
    fs::{self, OpenOptions},
    io,
    sync::Mutex,
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};

use swgplan_core::{
    config::{self, AppConfig},
    CatalogSource,
};

use crate::{app::App, cli::Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();

    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config, cli.verbose)?;

    let app = App::new(config, cli.json);
    if let Some(path) = cli.catalog {
        app.use_catalog(CatalogSource::File(path));
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    app.run(cli.command, &mut out)
}

/// Compact logs to stderr, filtered by `-v`, plus a full log file under the data dir.
fn init_logging(config: &AppConfig, verbose: u8) -> Result<()> {
    let log_dir = config.log_dir();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;
    let log_path = log_dir.join("swgplan.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    let console_level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(io::stderr)
        .with_filter(console_level);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file))
        .with_filter(file_filter);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
