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

//! Compression policy
//!
//! Decides whether a payload is worth compressing before persistence.
//! Small payloads are stored raw (codec overhead dominates), and a
//! compressed form that fails to shrink the payload is discarded.

use crate::error::CompressionResult;
use crate::Compressor;

/// Policy deciding when compression applies to a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionPolicy {
    /// Master switch; when false every payload is stored raw
    pub enabled: bool,
    /// Payloads smaller than this many bytes are stored raw
    pub min_size: usize,
}

impl CompressionPolicy {
    /// Create a policy with an explicit size threshold
    pub fn new(enabled: bool, min_size: usize) -> Self {
        CompressionPolicy { enabled, min_size }
    }

    /// Policy that never compresses
    pub fn disabled() -> Self {
        CompressionPolicy {
            enabled: false,
            min_size: 0,
        }
    }

    /// Whether this policy would attempt compression for a payload of `len` bytes
    pub fn applies_to(&self, len: usize) -> bool {
        self.enabled && len >= self.min_size
    }

    /// Apply the policy to a payload
    ///
    /// Returns `Some(compressed)` when compression was applied and paid off,
    /// `None` when the payload should be persisted raw.
    pub fn apply(
        &self,
        compressor: &dyn Compressor,
        data: &[u8],
    ) -> CompressionResult<Option<Vec<u8>>> {
        if !self.applies_to(data.len()) {
            return Ok(None);
        }

        let compressed = compressor.compress(data)?;
        if compressed.len() < data.len() {
            Ok(Some(compressed))
        } else {
            // Incompressible payload, keep the raw bytes
            tracing::debug!(
                original = data.len(),
                compressed = compressed.len(),
                "Compression did not shrink payload, storing raw"
            );
            Ok(None)
        }
    }
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        CompressionPolicy {
            enabled: true,
            min_size: 1024,
        }
    }
}
