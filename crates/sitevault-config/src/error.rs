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

//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error reading the configuration file
    #[error("IO error reading configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse failure
    #[error("failed to parse TOML configuration: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// JSON parse failure
    #[error("failed to parse JSON configuration: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A field holds a semantically invalid value
    #[error("invalid configuration value for field '{field}': {reason}")]
    InvalidValue {
        /// Dotted path of the offending field
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// File extension does not map to a supported format
    #[error("unsupported configuration format: {0}. Supported formats: toml, json")]
    UnsupportedFormat(String),

    /// Configuration file does not exist
    #[error("configuration file not found at path: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Path has no usable extension
    #[error("invalid configuration path: {}", .0.display())]
    InvalidPath(PathBuf),
}

impl ConfigError {
    /// Create an InvalidValue error
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_display() {
        let err = ConfigError::invalid_value("retention.window_days", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "invalid configuration value for field 'retention.window_days': must be at least 1"
        );
    }

    #[test]
    fn test_file_not_found_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/etc/sitevault.toml"));
        assert!(err.to_string().contains("/etc/sitevault.toml"));
    }
}
