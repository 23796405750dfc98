use std::{env, path::PathBuf, str::FromStr, time::Duration};

use super::env::{
    AppConfig, ConfigError, DirectoryConfig, GeminiConfig, LoggingConfig, PipelineConfig,
};
use crate::ai::inference::{DEFAULT_API_BASE, DEFAULT_MODEL};

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let page_snapshot_path = env::var("PAGE_SNAPSHOT_PATH")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing("PAGE_SNAPSHOT_PATH"))?;

        let settings_path = non_empty("SETTINGS_PATH").map(PathBuf::from);

        let gemini = GeminiConfig {
            api_key: non_empty("GEMINI_API_KEY"),
            api_base: non_empty("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: non_empty("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_millis(parse_or("CLASSIFY_TIMEOUT_MS", 30_000u64)?),
        };

        let defaults = PipelineConfig::default();
        let pipeline = PipelineConfig {
            scan_interval: positive_millis("SCAN_INTERVAL_MS", defaults.scan_interval)?,
            drain_interval: positive_millis("DRAIN_INTERVAL_MS", defaults.drain_interval)?,
            batch_size: positive("BATCH_SIZE", defaults.batch_size)?,
            max_identity_len: positive("MAX_IDENTITY_LEN", defaults.max_identity_len)?,
            min_content_len: parse_or("MIN_CONTENT_LEN", defaults.min_content_len)?,
            requeue_failed: parse_bool("REQUEUE_FAILED")?.unwrap_or(defaults.requeue_failed),
        };

        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            db_filename: env::var("DB_FILENAME").unwrap_or_else(|_| "scanner_cache.db".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        Ok(Self {
            page_snapshot_path,
            settings_path,
            gemini,
            pipeline,
            directories,
            logging,
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match non_empty(key) {
        Some(value) => value.trim().parse::<T>().map_err(|err| ConfigError::Invalid {
            key,
            reason: err.to_string(),
        }),
        None => Ok(default),
    }
}

fn positive(key: &'static str, default: usize) -> Result<usize, ConfigError> {
    let value = parse_or(key, default)?;
    if value == 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn positive_millis(key: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    let millis = parse_or(key, default.as_millis() as u64)?;
    if millis == 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_millis(millis))
}

fn parse_bool(key: &'static str) -> Result<Option<bool>, ConfigError> {
    let Some(value) = non_empty(key) else {
        return Ok(None);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        other => Err(ConfigError::Invalid {
            key,
            reason: format!("expected a boolean, got {other:?}"),
        }),
    }
}
