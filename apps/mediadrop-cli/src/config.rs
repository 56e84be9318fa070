//! CLI configuration.
//!
//! Read from `~/.config/mediadrop/config.json` unless `--config` points
//! elsewhere. Every field is optional; a missing file yields defaults.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use mediadrop_protocol::constants::{
    DEFAULT_BATCH_DELAY, DEFAULT_CONCURRENCY, DEFAULT_HIDE_PROGRESS_DELAY,
};
use mediadrop_transfer::ValidationConfig;
use mediadrop_transport::{Base64Config, FormConfig};
use mediadrop_upload_pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};

/// Which transport carries the upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Single JSON post with the base64 content, answered with an analysis.
    #[default]
    Base64,
    /// Multipart form upload with byte progress.
    Form,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub strategy: Strategy,
    pub form: FormConfig,
    pub base64: Base64Config,
    pub validation: ValidationConfig,
    pub batch_delay_ms: u64,
    pub hide_progress_delay_ms: u64,
    pub concurrency: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            form: FormConfig::default(),
            base64: Base64Config::default(),
            validation: ValidationConfig::default(),
            batch_delay_ms: DEFAULT_BATCH_DELAY.as_millis() as u64,
            hide_progress_delay_ms: DEFAULT_HIDE_PROGRESS_DELAY.as_millis() as u64,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl AppConfig {
    /// Loads `path`, or the default location when `None`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Self::load_from(&default_config_path()),
        }
    }

    /// Loads a config file. A missing file yields defaults; an unparseable
    /// one is reported and ignored.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    /// Endpoint of the selected strategy.
    pub fn endpoint(&self) -> &str {
        match self.strategy {
            Strategy::Base64 => &self.base64.endpoint,
            Strategy::Form => &self.form.endpoint,
        }
    }

    /// Overrides the endpoint of the selected strategy.
    pub fn set_endpoint(&mut self, endpoint: String) {
        match self.strategy {
            Strategy::Base64 => self.base64.endpoint = endpoint,
            Strategy::Form => self.form.endpoint = endpoint,
        }
    }

    pub fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let concurrency =
            NonZeroUsize::new(self.concurrency).context("concurrency must be at least 1")?;
        Ok(PipelineConfig {
            validation: self.validation.clone(),
            batch_delay: Duration::from_millis(self.batch_delay_ms),
            hide_progress_delay: Duration::from_millis(self.hide_progress_delay_ms),
            concurrency,
        })
    }
}

/// `~/.config/mediadrop/config.json`.
pub fn default_config_path() -> PathBuf {
    config_base_dir().join("mediadrop").join("config.json")
}

fn config_base_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata)
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home).join(".config")
    }
}
