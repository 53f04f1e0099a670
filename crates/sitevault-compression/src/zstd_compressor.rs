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

//! Zstd compression implementation
//!
//! Fast compression and decompression with good ratios. The default codec
//! for screenshot payloads, which are read back frequently.

use crate::error::{CompressionError, CompressionResult};
use crate::{CompressionLevel, Compressor};
use std::fmt;

/// Zstd compressor implementation
///
/// Zstd frames are self-identifying via their magic bytes, so `decompress`
/// passes through payloads that were stored raw.
#[derive(Clone)]
pub struct ZstdCompressor {
    level: CompressionLevel,
}

impl ZstdCompressor {
    /// Create a new Zstd compressor with the given compression level
    pub fn new(level: CompressionLevel) -> Self {
        ZstdCompressor { level }
    }

    /// Create a Zstd compressor with default compression
    pub fn default_level() -> Self {
        ZstdCompressor::new(CompressionLevel::Default)
    }

    /// Create a Zstd compressor with best compression
    pub fn best() -> Self {
        ZstdCompressor::new(CompressionLevel::Best)
    }
}

impl fmt::Debug for ZstdCompressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZstdCompressor")
            .field("level", &self.level)
            .finish()
    }
}

impl Compressor for ZstdCompressor {
    fn compress(&self, data: &[u8]) -> CompressionResult<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        zstd::encode_all(data, self.level.to_zstd_level()).map_err(|e| {
            CompressionError::compression_failed(format!("zstd encode failed: {}", e))
        })
    }

    fn decompress(&self, data: &[u8]) -> CompressionResult<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        // Zstd frame magic identifies compressed payloads
        if data.len() >= 4 && data.starts_with(b"\x28\xb5\x2f\xfd") {
            zstd::decode_all(data).map_err(|e| {
                CompressionError::decompression_failed(format!("zstd decode failed: {}", e))
            })
        } else {
            // Stored raw, return as-is
            Ok(data.to_vec())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zstd_compress_decompress() {
        let compressor = ZstdCompressor::new(CompressionLevel::Default);
        let original = b".hero { color: #fff; background: url(/img/hero.png); }";

        let compressed = compressor.compress(original).unwrap();
        let decompressed = compressor.decompress(&compressed).unwrap();

        assert_eq!(original, &decompressed[..]);
    }

    #[test]
    fn test_zstd_compress_empty() {
        let compressor = ZstdCompressor::new(CompressionLevel::Default);
        let compressed = compressor.compress(b"").unwrap();
        assert_eq!(compressed.len(), 0);
    }

    #[test]
    fn test_zstd_decompress_empty() {
        let compressor = ZstdCompressor::new(CompressionLevel::Default);
        let decompressed = compressor.decompress(b"").unwrap();
        assert_eq!(decompressed.len(), 0);
    }

    #[test]
    fn test_zstd_decompress_uncompressed_data() {
        let compressor = ZstdCompressor::new(CompressionLevel::Default);
        let data = b"raw stylesheet text, never compressed";
        let result = compressor.decompress(data).unwrap();
        assert_eq!(result, data);
    }

    #[test]
    fn test_zstd_compression_levels() {
        let data = b".card { border-radius: 4px; padding: 8px; } ".repeat(100);

        let fast = ZstdCompressor::new(CompressionLevel::Fast)
            .compress(&data)
            .unwrap();
        let default = ZstdCompressor::default_level().compress(&data).unwrap();
        let best = ZstdCompressor::best().compress(&data).unwrap();

        assert!(best.len() <= default.len());
        assert!(default.len() <= fast.len() || fast.len() < 100);

        let decompressor = ZstdCompressor::default_level();
        assert_eq!(decompressor.decompress(&fast).unwrap(), data);
        assert_eq!(decompressor.decompress(&default).unwrap(), data);
        assert_eq!(decompressor.decompress(&best).unwrap(), data);
    }

    #[test]
    fn test_zstd_large_repetitive_data() {
        let compressor = ZstdCompressor::new(CompressionLevel::Default);
        // Screenshot-like payload: long runs of identical bytes
        let original = vec![0x42u8; 1024 * 1024];

        let compressed = compressor.compress(&original).unwrap();
        let decompressed = compressor.decompress(&compressed).unwrap();

        assert_eq!(original, decompressed);
        assert!(compressed.len() < original.len() / 100);
    }

    #[test]
    fn test_zstd_incompressible_data() {
        let compressor = ZstdCompressor::new(CompressionLevel::Default);
        let original = (0..1000).map(|i| (i * 7 % 251) as u8).collect::<Vec<_>>();

        let compressed = compressor.compress(&original).unwrap();
        let decompressed = compressor.decompress(&compressed).unwrap();

        assert_eq!(original, decompressed);
    }

    proptest! {
        #[test]
        fn prop_zstd_round_trip(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
            let compressor = ZstdCompressor::new(CompressionLevel::Default);
            let compressed = compressor.compress(&data).unwrap();
            prop_assert_eq!(compressor.decompress(&compressed).unwrap(), data);
        }
    }
}
