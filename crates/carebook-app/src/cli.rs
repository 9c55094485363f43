//! CLI argument definitions for the Carebook terminal driver.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Carebook: book a clinic appointment by describing your symptoms.
#[derive(Parser, Debug)]
#[command(name = "carebook", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// JSON script of collaborator responses. Uses the built-in demo when omitted.
    #[arg(short = 's', long = "script")]
    pub script: Option<PathBuf>,

    /// Patient identifier passed to the booking service.
    #[arg(long = "patient-id", default_value = "demo-patient")]
    pub patient_id: String,

    /// Name used in the greeting.
    #[arg(short = 'n', long = "name")]
    pub name: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CAREBOOK_CONFIG env var > ~/.carebook/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CAREBOOK_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        match self.log_level.as_deref() {
            Some(level) if !level.trim().is_empty() => level.to_string(),
            _ => config_level.to_string(),
        }
    }
}

/// Default config file path.
fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".carebook").join("config.toml");
    }
    PathBuf::from("config.toml")
}
