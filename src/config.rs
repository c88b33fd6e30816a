//! Configuration management for the award prediction pipeline

use crate::models::logistic::LogisticParams;
use crate::models::preprocessor::DEFAULT_MIN_FREQUENCY;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the model artifact path
pub const MODEL_PATH_ENV: &str = "PROUNI_MODEL_PATH";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub training: TrainingConfig,
    pub serving: ServingConfig,
    pub logging: LoggingConfig,
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Bundle location, read at startup and written by training
    pub path: PathBuf,
    /// Grant year assumed for conversational requests
    pub reference_year: i32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/prouni_2020.json"),
            reference_year: 2020,
        }
    }
}

/// Training procedure configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Share of each class held out for evaluation
    pub test_size: f64,
    /// Seed for the stratified split
    pub seed: u64,
    /// Categories seen fewer times than this share one infrequent column
    pub min_frequency: usize,
    pub max_iter: usize,
    /// Gradient-norm stopping threshold
    pub tolerance: f64,
    /// Inverse L2 regularization strength
    pub c: f64,
}

impl TrainingConfig {
    pub fn logistic_params(&self) -> LogisticParams {
        LogisticParams {
            c: self.c,
            max_iter: self.max_iter,
            tolerance: self.tolerance,
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        let params = LogisticParams::default();
        Self {
            test_size: 0.2,
            seed: 42,
            min_frequency: DEFAULT_MIN_FREQUENCY,
            max_iter: params.max_iter,
            tolerance: params.tolerance,
            c: params.c,
        }
    }
}

/// Serving loop configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServingConfig {
    /// Maximum in-flight predictions
    pub workers: usize,
    /// Seconds between metrics reports (0 disables periodic reports)
    pub report_interval_secs: u64,
}

impl Default for ServingConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            report_interval_secs: 0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path.
    ///
    /// The file is optional. `PROUNI_`-prefixed variables overlay it
    /// (`PROUNI_SERVING__WORKERS=8`), and `PROUNI_MODEL_PATH` wins over both
    /// for the model path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix("PROUNI")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("model.path", std::env::var(MODEL_PATH_ENV).ok())
            .context("Failed to apply model path override")?
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
