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

//! Compression capability for the SiteVault dedup store
//!
//! Stored payloads (stylesheet text, rendered screenshots) are compressed
//! before persistence when it pays off. This crate provides:
//! - **Zstd compression**: Fast, good ratios (default for screenshots)
//! - **Brotli compression**: Higher ratios, slower (well suited to CSS text)
//! - **Auto-detection**: Each codec identifies its own output by magic bytes
//! - **Policy**: A size threshold deciding when compression applies at all
//!
//! # Quick Start
//!
//! ```rust
//! use sitevault_compression::{Compressor, CompressionLevel, ZstdCompressor};
//!
//! fn main() -> anyhow::Result<()> {
//!     let compressor = ZstdCompressor::new(CompressionLevel::Default);
//!
//!     let original = b"body { margin: 0; } body { margin: 0; }";
//!     let compressed = compressor.compress(original)?;
//!     let decompressed = compressor.decompress(&compressed)?;
//!
//!     assert_eq!(original, &decompressed[..]);
//!     Ok(())
//! }
//! ```

pub mod brotli_compressor;
pub mod error;
pub mod policy;
pub mod zstd_compressor;

use std::fmt::Debug;

pub use brotli_compressor::BrotliCompressor;
pub use error::{CompressionError, CompressionResult};
pub use policy::CompressionPolicy;
pub use zstd_compressor::ZstdCompressor;

/// Compression level configuration
///
/// Balances compression speed vs compression ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// Fast compression, larger output (level 1 for zstd, 4 for brotli)
    Fast,
    /// Default balance (level 3 for zstd, 9 for brotli)
    Default,
    /// Best compression, slower (level 19 for zstd, 11 for brotli)
    Best,
}

impl CompressionLevel {
    /// Convert to zstd compression level
    pub fn to_zstd_level(self) -> i32 {
        match self {
            CompressionLevel::Fast => 1,
            CompressionLevel::Default => 3,
            CompressionLevel::Best => 19,
        }
    }

    /// Convert to brotli compression level (0-11)
    pub fn to_brotli_level(self) -> u32 {
        match self {
            CompressionLevel::Fast => 4,
            CompressionLevel::Default => 9,
            CompressionLevel::Best => 11,
        }
    }
}

/// Compression algorithm identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionAlgorithm {
    /// No compression (raw payload)
    None,
    /// Zstd compression
    Zstd,
    /// Brotli compression
    Brotli,
}

impl CompressionAlgorithm {
    /// Detect compression algorithm from a payload prefix
    pub fn detect(data: &[u8]) -> Self {
        if data.len() >= 4 {
            if data.starts_with(b"\x28\xb5\x2f\xfd") {
                return CompressionAlgorithm::Zstd;
            }
            if data.starts_with(b"BRT\x01") {
                return CompressionAlgorithm::Brotli;
            }
        }
        CompressionAlgorithm::None
    }
}

/// Compressor trait for pluggable compression implementations
///
/// The dedup store treats compression as a capability: `compress` produces
/// a self-identifying payload, `decompress` transparently handles payloads
/// that were never compressed.
pub trait Compressor: Send + Sync + Debug {
    /// Compress data, prefixing the output with algorithm identification
    ///
    /// # Errors
    ///
    /// Returns `CompressionError` if the underlying codec fails
    fn compress(&self, data: &[u8]) -> CompressionResult<Vec<u8>>;

    /// Decompress data, detecting the algorithm from the payload prefix
    ///
    /// Payloads without a recognized prefix are returned verbatim.
    ///
    /// # Errors
    ///
    /// Returns `CompressionError` if the payload claims to be compressed
    /// but cannot be decoded
    fn decompress(&self, data: &[u8]) -> CompressionResult<Vec<u8>>;
}
