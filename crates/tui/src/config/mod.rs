use clap::Parser;
use serde::Deserialize;

use crate::error::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/budget_tui.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub timezone: String,
    pub status_interval_secs: u64,
    pub log_level: String,
    pub log_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8888/.netlify/functions/".to_string(),
            timezone: "Europe/Kyiv".to_string(),
            status_interval_secs: 30,
            log_level: "info".to_string(),
            log_file: "budget_tui.log".to_string(),
        }
    }
}

impl AppConfig {
    pub fn tz(&self) -> Result<chrono_tz::Tz> {
        self.timezone
            .parse()
            .map_err(|err| AppError::InvalidSetting(format!("timezone {}: {err}", self.timezone)))
    }
}

#[derive(Debug, Parser)]
#[command(name = "budget_tui", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override base URL of the budget endpoints.
    #[arg(long)]
    base_url: Option<String>,
    /// Override timezone (IANA name) used to pick the current week.
    #[arg(long)]
    timezone: Option<String>,
    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
    /// Override log file path.
    #[arg(long)]
    log_file: Option<String>,
}

pub fn load() -> Result<AppConfig> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("BUDGET_TUI"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(timezone) = args.timezone {
        settings.timezone = timezone;
    }
    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }
    if let Some(log_file) = args.log_file {
        settings.log_file = log_file;
    }

    Ok(settings)
}
