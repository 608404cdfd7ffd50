use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::file_utils::FileManager;
use crate::render_job::RendererConfig;
use crate::style::{PositionSettings, StyleConfig};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Directory rendered caption images are written to and read back from
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,

    /// Frame rate timestamps are converted against
    #[serde(default = "default_fps")]
    pub fps: f64,

    /// External renderer invocation
    #[serde(default)]
    pub renderer: RendererConfig,

    /// Document-wide position defaults
    #[serde(default)]
    pub default_settings: PositionSettings,

    /// Document-wide style defaults
    #[serde(default)]
    pub default_styles: StyleConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_dir: default_image_dir(),
            fps: default_fps(),
            renderer: RendererConfig::default(),
            default_settings: PositionSettings::default(),
            default_styles: StyleConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        FileManager::write_to_file(path, &content)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            anyhow::bail!("fps must be a positive number, got {}", self.fps);
        }
        if self.image_dir.as_os_str().is_empty() {
            anyhow::bail!("image_dir must not be empty");
        }
        if self.renderer.program.is_empty() {
            anyhow::bail!("renderer.program must not be empty");
        }
        Ok(())
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("captions")
}

fn default_fps() -> f64 {
    24.0
}
