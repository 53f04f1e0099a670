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

//! Store error types
//!
//! `NotFound` and `Database` are operational conditions the caller decides
//! how to handle. `MissingContent`, `RefCountUnderflow`, and `Corrupt` are
//! internal-consistency faults: they indicate a caller ordering bug or
//! damaged data, are logged loudly at the point of detection, and are
//! rejected rather than clamped.

use crate::fingerprint::Fingerprint;
use sitevault_compression::CompressionError;
use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during dedup store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// No content row exists for the fingerprint (dangling reference)
    #[error("content not found: {0}")]
    NotFound(Fingerprint),

    /// An attach targeted a fingerprint that was never stored
    #[error("attach targets missing content: {0}")]
    MissingContent(Fingerprint),

    /// A decrement would have driven a reference count negative
    #[error("reference count underflow for content: {0}")]
    RefCountUnderflow(String),

    /// Stored payload no longer hashes to its fingerprint
    #[error("content corrupt: expected {expected}, computed {actual}")]
    Corrupt {
        /// Fingerprint the content was stored under
        expected: Fingerprint,
        /// Fingerprint recomputed from the payload read back
        actual: Fingerprint,
    },

    /// A fingerprint string failed to parse
    #[error("invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    /// Compression or decompression failed
    #[error("compression error: {0}")]
    Compression(#[from] CompressionError),

    /// Underlying database failure (treated as transient; no internal retry)
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Check if this error signals an internal-consistency fault
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            StoreError::MissingContent(_)
                | StoreError::RefCountUnderflow(_)
                | StoreError::Corrupt { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let err = StoreError::NotFound(Fingerprint::hash(b"gone"));
        assert!(err.is_not_found());
        assert!(!err.is_invariant_violation());
    }

    #[test]
    fn test_invariant_classification() {
        let err = StoreError::MissingContent(Fingerprint::hash(b"never stored"));
        assert!(err.is_invariant_violation());

        let err = StoreError::RefCountUnderflow("abc123".to_string());
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_display_includes_fingerprint() {
        let fp = Fingerprint::hash(b"x");
        let err = StoreError::NotFound(fp);
        assert!(err.to_string().contains(&fp.to_hex()));
    }
}
