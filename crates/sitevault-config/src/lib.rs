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

//! Configuration management for the SiteVault dedup store
//!
//! The store consumes (but does not own) a small configuration surface:
//! database location and pool size, compression policy (codec, level,
//! minimum payload size), and the garbage-collection retention window.
//! Files are TOML or JSON; `SITEVAULT_DATABASE_URL` overrides the
//! database URL for deployments that inject it through the environment.

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigFormat, ConfigLoader, DATABASE_URL_ENV};
pub use schema::{
    CompressionCodec, CompressionConfig, Config, DatabaseConfig, RetentionConfig,
};
