//! Configuration management for receiptfold.
//!
//! Settings come from an optional TOML file with environment variable
//! overrides on top; every field has a serde default so a missing file is
//! a fully working local setup (Ollama on localhost, log-only
//! notifications).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm::LlmConfig;
use crate::notify::NotifyConfig;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "receiptfold.toml";

/// Top-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Extraction model client configuration.
    pub llm: LlmConfig,
    /// Notification delivery configuration.
    pub notify: NotifyConfig,
}

impl Settings {
    /// Load settings from a TOML file, falling back to defaults when the
    /// file does not exist, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

        let mut settings = if path.exists() {
            debug!(path = %path.display(), "loading settings");
            let raw = fs::read_to_string(path)?;
            toml::from_str(&raw)?
        } else {
            Settings::default()
        };

        settings.apply_env();
        Ok(settings)
    }

    /// Environment overrides for deployment without a config file.
    fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var("RECEIPTFOLD_LLM_ENDPOINT") {
            self.llm.endpoint = endpoint;
        }
        if let Ok(model) = std::env::var("RECEIPTFOLD_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(key) = std::env::var("RECEIPTFOLD_LLM_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("RECEIPTFOLD_WEBHOOK_URL") {
            self.notify.webhook_url = Some(url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let settings = Settings::load(Some(Path::new("/nonexistent/receiptfold.toml"))).unwrap();
        assert!(settings.llm.enabled);
        assert!(settings.notify.webhook_url.is_none());
    }

    #[test]
    fn partial_toml_fills_remaining_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [llm]
            model = "qwen2.5:7b"
            "#,
        )
        .unwrap();
        assert_eq!(settings.llm.model, "qwen2.5:7b");
        assert_eq!(settings.llm.endpoint, "http://localhost:11434");
    }
}
