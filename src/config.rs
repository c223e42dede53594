use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{AppError, AppResult};
use crate::uploader::dialect::PlatformDialect;

/// Connection settings for the chat bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSettings {
    #[serde(rename = "type")]
    pub platform_type: String,
    pub http_host: String,
    pub http_port: u16,
    pub api_token: String,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            platform_type: PlatformDialect::NapCat.identifier().to_string(),
            http_host: "127.0.0.1".to_string(),
            http_port: 3000,
            api_token: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    pub worker_count: usize,
    pub file_extension: String,
    pub case_insensitive_match: bool,
    /// Fail instead of uploading to the group root when a folder can't be resolved
    pub strict_folder_resolution: bool,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            worker_count: 1,
            file_extension: "pdf".to_string(),
            case_insensitive_match: false,
            strict_folder_resolution: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub platform: PlatformSettings,
    pub upload: UploadSettings,
    pub log_level: String,
}

pub const MAX_WORKER_COUNT: usize = 16;

/// Where a loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    /// The file didn't exist and defaults were written to it
    CreatedDefault,
}

pub fn get_config_path() -> AppResult<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| AppError::Config("Could not find config directory".to_string()))?
        .join("chat-file-uploader");

    fs::create_dir_all(&config_dir)?;
    Ok(config_dir.join("config.json"))
}

/// Load the config from the user's config directory
pub fn load_config() -> AppResult<Config> {
    let config_path = get_config_path()?;
    load_config_from(&config_path)
}

/// Load and validate a config file, writing defaults when it doesn't exist
pub fn load_config_from(config_path: &Path) -> AppResult<Config> {
    load_or_create_config(config_path).map(|(config, _)| config)
}

/// Like [`load_config_from`], also reporting whether defaults were written.
///
/// Nothing is logged here so callers can load the config before the logger
/// is set up.
pub fn load_or_create_config(config_path: &Path) -> AppResult<(Config, ConfigSource)> {
    if config_path.exists() {
        let config_str = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_str).map_err(|e| {
            AppError::Config(format!(
                "Failed to parse {}: {}",
                config_path.display(),
                e
            ))
        })?;

        validate_config(&config)?;
        Ok((config, ConfigSource::File))
    } else {
        let default_config = Config::default_with_log_level();
        save_config(&default_config, config_path)?;
        Ok((default_config, ConfigSource::CreatedDefault))
    }
}

pub fn save_config(config: &Config, config_path: &Path) -> AppResult<()> {
    validate_config(config)?;

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let config_str = serde_json::to_string_pretty(config)?;
    fs::write(config_path, config_str)?;

    log::debug!("Configuration saved to {}", config_path.display());
    Ok(())
}

impl Config {
    fn default_with_log_level() -> Self {
        Self {
            log_level: "info".to_string(),
            ..Self::default()
        }
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

pub fn validate_config(config: &Config) -> AppResult<()> {
    // Unknown platforms are a configuration error, never a silent default
    config.platform.platform_type.parse::<PlatformDialect>()?;

    if config.platform.http_host.trim().is_empty() {
        return Err(AppError::validation("platform.http_host", "Must not be empty"));
    }

    if config.platform.http_port == 0 {
        return Err(AppError::validation("platform.http_port", "Must be greater than 0"));
    }

    if config.upload.worker_count == 0 || config.upload.worker_count > MAX_WORKER_COUNT {
        return Err(AppError::validation(
            "upload.worker_count",
            &format!("Must be between 1 and {}", MAX_WORKER_COUNT),
        ));
    }

    let extension = &config.upload.file_extension;
    if extension.is_empty() || extension.contains('.') || extension.contains('/') {
        return Err(AppError::validation(
            "upload.file_extension",
            "Must be a bare extension such as 'pdf'",
        ));
    }

    if !config.log_level.is_empty() {
        let valid_log_levels = ["off", "error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&config.log_level.as_str()) {
            return Err(AppError::validation("log_level", "Must be a valid log level"));
        }
    }

    Ok(())
}
