use std::{path::PathBuf, time::Duration};

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub page_snapshot_path: PathBuf,
    pub settings_path: Option<PathBuf>,
    pub gemini: GeminiConfig,
    pub pipeline: PipelineConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub scan_interval: Duration,
    pub drain_interval: Duration,
    pub batch_size: usize,
    pub max_identity_len: usize,
    pub min_content_len: usize,
    pub requeue_failed: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_millis(3_000),
            drain_interval: Duration::from_millis(7_000),
            batch_size: 4,
            max_identity_len: 30,
            min_content_len: 2,
            requeue_failed: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub data_dir: String,
    pub db_filename: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
