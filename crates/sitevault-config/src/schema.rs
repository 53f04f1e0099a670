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

//! Configuration schema
//!
//! Knobs consumed by the dedup store: database location and pool size,
//! compression policy, and the garbage-collection retention window.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use sitevault_compression::{
    BrotliCompressor, CompressionLevel, CompressionPolicy, Compressor, ZstdCompressor,
};
use std::sync::Arc;

/// Top-level configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Database connection settings
    pub database: DatabaseConfig,

    /// Compression settings
    pub compression: CompressionConfig,

    /// Garbage-collection retention settings
    pub retention: RetentionConfig,
}

impl Config {
    /// Validate semantic constraints that serde cannot express
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.url.is_empty() {
            return Err(ConfigError::invalid_value(
                "database.url",
                "must not be empty",
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::invalid_value(
                "database.max_connections",
                "must be at least 1",
            ));
        }
        if self.retention.window_days == 0 {
            return Err(ConfigError::invalid_value(
                "retention.window_days",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Build the compression policy the store applies on the write path
    pub fn compression_policy(&self) -> CompressionPolicy {
        CompressionPolicy::new(
            self.compression.enabled,
            self.compression.min_size_bytes as usize,
        )
    }

    /// Build the configured compressor implementation
    pub fn build_compressor(&self) -> Arc<dyn Compressor> {
        match self.compression.codec {
            CompressionCodec::Zstd => Arc::new(ZstdCompressor::new(self.compression.level)),
            CompressionCodec::Brotli => Arc::new(BrotliCompressor::new(self.compression.level)),
        }
    }

    /// Retention window as a chrono duration
    pub fn retention_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.retention.window_days))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: DatabaseConfig::default(),
            compression: CompressionConfig::default(),
            retention: RetentionConfig::default(),
        }
    }
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    pub url: String,

    /// Maximum pooled connections
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            url: "sqlite://sitevault.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Compression codec selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompressionCodec {
    /// Zstd: fast, good ratios (default)
    Zstd,
    /// Brotli: higher ratios, slower
    Brotli,
}

/// Compression settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompressionConfig {
    /// Enable compression on the write path
    pub enabled: bool,

    /// Codec applied to payloads that pass the policy
    pub codec: CompressionCodec,

    /// Compression level
    pub level: CompressionLevel,

    /// Payloads below this size are stored raw
    pub min_size_bytes: u64,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        CompressionConfig {
            enabled: true,
            codec: CompressionCodec::Zstd,
            level: CompressionLevel::Default,
            min_size_bytes: 1024,
        }
    }
}

/// Garbage-collection retention settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetentionConfig {
    /// Minimum idle days before an orphaned blob becomes collectable
    pub window_days: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        RetentionConfig { window_days: 90 }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.retention.window_days, 90);
        assert_eq!(config.database.max_connections, 5);
        assert!(config.compression.enabled);
        assert_eq!(config.compression.codec, CompressionCodec::Zstd);
        config.validate().unwrap();
    }

    #[test]
    fn test_zero_retention_rejected() {
        let mut config = Config::default();
        config.retention.window_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_url_rejected() {
        let mut config = Config::default();
        config.database.url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_connections_rejected() {
        let mut config = Config::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retention_window_duration() {
        let config = Config::default();
        assert_eq!(config.retention_window(), chrono::Duration::days(90));
    }

    #[test]
    fn test_policy_mirrors_compression_settings() {
        let mut config = Config::default();
        config.compression.min_size_bytes = 512;
        let policy = config.compression_policy();
        assert!(policy.enabled);
        assert_eq!(policy.min_size, 512);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let parsed: Config = toml::from_str("[retention]\nwindow_days = 30\n").unwrap();
        assert_eq!(parsed.retention.window_days, 30);
        assert_eq!(parsed.database, DatabaseConfig::default());
    }
}
