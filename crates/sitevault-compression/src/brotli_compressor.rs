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

//! Brotli compression implementation
//!
//! Higher compression ratios at slower compression speed. Well suited to
//! stylesheet text, which is written once and read rarely.

use crate::error::{CompressionError, CompressionResult};
use crate::{CompressionLevel, Compressor};
use std::fmt;
use std::io::Write;

/// Brotli compressor implementation
///
/// Brotli streams carry no magic bytes of their own, so output is prefixed
/// with a `BRT\x01` marker for detection on the read path.
#[derive(Clone)]
pub struct BrotliCompressor {
    level: CompressionLevel,
}

impl BrotliCompressor {
    /// Create a new Brotli compressor with the given compression level
    pub fn new(level: CompressionLevel) -> Self {
        BrotliCompressor { level }
    }

    /// Create a Brotli compressor with default compression
    pub fn default_level() -> Self {
        BrotliCompressor::new(CompressionLevel::Default)
    }
}

impl fmt::Debug for BrotliCompressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrotliCompressor")
            .field("level", &self.level)
            .finish()
    }
}

impl Compressor for BrotliCompressor {
    fn compress(&self, data: &[u8]) -> CompressionResult<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let level = self.level.to_brotli_level();
        let mut output = Vec::with_capacity(data.len() / 2);
        output.extend_from_slice(b"BRT\x01");

        {
            let mut writer = brotli::CompressorWriter::new(&mut output, 4096, level, 22);

            writer.write_all(data).map_err(|e| {
                CompressionError::compression_failed(format!("brotli encode failed: {}", e))
            })?;
            writer.flush().map_err(|e| {
                CompressionError::compression_failed(format!("brotli flush failed: {}", e))
            })?;
        } // writer dropped here, releasing the borrow on output

        Ok(output)
    }

    fn decompress(&self, data: &[u8]) -> CompressionResult<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        if data.len() >= 4 && data.starts_with(b"BRT\x01") {
            let mut output = Vec::with_capacity(data.len() * 2);
            brotli::BrotliDecompress(&mut std::io::Cursor::new(&data[4..]), &mut output)
                .map_err(|e| {
                    CompressionError::decompression_failed(format!(
                        "brotli decode failed: {}",
                        e
                    ))
                })?;
            Ok(output)
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
    fn test_brotli_compress_decompress() {
        let compressor = BrotliCompressor::new(CompressionLevel::Default);
        let original = b"@media (max-width: 768px) { .nav { display: none; } }";

        let compressed = compressor.compress(original).unwrap();
        let decompressed = compressor.decompress(&compressed).unwrap();

        assert_eq!(original, &decompressed[..]);
    }

    #[test]
    fn test_brotli_has_marker() {
        let compressor = BrotliCompressor::new(CompressionLevel::Default);
        let compressed = compressor.compress(b"stylesheet body").unwrap();
        assert!(compressed.starts_with(b"BRT\x01"));
    }

    #[test]
    fn test_brotli_compress_empty() {
        let compressor = BrotliCompressor::new(CompressionLevel::Default);
        let compressed = compressor.compress(b"").unwrap();
        assert_eq!(compressed.len(), 0);
    }

    #[test]
    fn test_brotli_decompress_uncompressed_data() {
        let compressor = BrotliCompressor::new(CompressionLevel::Default);
        let data = b"never compressed payload";
        let result = compressor.decompress(data).unwrap();
        assert_eq!(result, data);
    }

    #[test]
    fn test_brotli_large_repetitive_data() {
        let compressor = BrotliCompressor::new(CompressionLevel::Default);
        let original = b".btn { cursor: pointer; } ".repeat(4000);

        let compressed = compressor.compress(&original).unwrap();
        let decompressed = compressor.decompress(&compressed).unwrap();

        assert_eq!(original, decompressed);
        assert!(compressed.len() < original.len() / 50);
    }

    proptest! {
        #[test]
        fn prop_brotli_round_trip(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
            let compressor = BrotliCompressor::new(CompressionLevel::Default);
            let compressed = compressor.compress(&data).unwrap();
            prop_assert_eq!(compressor.decompress(&compressed).unwrap(), data);
        }
    }
}
