// SiteVault - Content-addressed storage for website scan assets
// Copyright (C) 2025 SiteVault Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Configuration loading
//!
//! Loads configuration files (TOML or JSON, by extension), applies the
//! `SITEVAULT_DATABASE_URL` environment override, and validates the result.

use crate::error::{ConfigError, ConfigResult};
use crate::schema::Config;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// Environment variable overriding `database.url`
pub const DATABASE_URL_ENV: &str = "SITEVAULT_DATABASE_URL";

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML file (`.toml`)
    Toml,
    /// JSON file (`.json`)
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::InvalidPath(path.to_path_buf())),
        }
    }
}

/// Configuration loader
pub struct ConfigLoader {
    validate: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        ConfigLoader { validate: true }
    }

    /// Create a loader without validation
    pub fn without_validation() -> Self {
        ConfigLoader { validate: false }
    }

    /// Load configuration from a file
    pub async fn load_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Config> {
        let path = path.as_ref();
        debug!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).await?;
        let format = ConfigFormat::from_path(path)?;

        let mut config: Config = match format {
            ConfigFormat::Toml => toml::from_str(&content)?,
            ConfigFormat::Json => serde_json::from_str(&content)?,
        };

        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            debug!("Overriding database.url from {}", DATABASE_URL_ENV);
            config.database.url = url;
        }

        if self.validate {
            config.validate()?;
        }

        info!(
            path = %path.display(),
            retention_days = config.retention.window_days,
            compression = config.compression.enabled,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Load defaults, with the environment override applied
    ///
    /// Used when no configuration file is present.
    pub fn load_default(&self) -> ConfigResult<Config> {
        let mut config = Config::default();
        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            config.database.url = url;
        }
        if self.validate {
            config.validate()?;
        }
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        ConfigLoader::new()
    }
}
