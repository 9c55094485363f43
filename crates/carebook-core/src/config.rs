use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CarebookError, Result};

/// Top-level configuration for Carebook.
///
/// Loaded from `~/.carebook/config.toml` by default. Every section falls back
/// to its defaults when absent from the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarebookConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub messages: MessagesConfig,
}

impl CarebookConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CarebookConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CarebookError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Booking session behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Clarification streak at which the multi-field hint is appended.
    pub clarify_hint_threshold: u32,
    /// Maximum user message length in characters.
    pub max_message_length: usize,
    /// Upper bound on each triage and slot search call, in seconds. 0 waits
    /// forever. Booking commits are never bounded.
    pub service_timeout_secs: u64,
    /// Most recent entries sent to triage as history. 0 sends everything.
    pub history_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            clarify_hint_threshold: 3,
            max_message_length: 2000,
            service_timeout_secs: 30,
            history_limit: 0,
        }
    }
}

impl SessionConfig {
    /// The bounded wait for collaborator calls, if one is configured.
    pub fn service_timeout(&self) -> Option<Duration> {
        (self.service_timeout_secs > 0).then(|| Duration::from_secs(self.service_timeout_secs))
    }
}

/// Wording used in assistant-authored entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    /// Name the assistant uses for the practice in its greeting.
    pub clinic_name: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            clinic_name: "the clinic".to_string(),
        }
    }
}
