mod app;
mod client;
mod config;
mod error;
mod ui;

use std::{fs::OpenOptions, sync::Mutex};

use crate::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;
    init_tracing(&config)?;
    tracing::info!(base_url = %config.base_url, timezone = %config.timezone, "starting");

    let mut app = app::App::new(config)?;
    let result = app.run().await;
    if let Err(err) = &result {
        tracing::error!("terminated with error: {err}");
    }
    result
}

/// The terminal belongs to the UI, so logs go to a file.
fn init_tracing(config: &config::AppConfig) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "budget_tui={level},engine={level}",
            level = config.log_level
        ))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
