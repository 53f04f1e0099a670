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

//! Content fingerprint for the dedup store
//!
//! A fingerprint is the SHA-256 hash of the *uncompressed* payload bytes.
//! It is the content's identity: identical bytes produce identical
//! fingerprints, and the content table is keyed by it.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Content fingerprint - SHA-256 hash of the original payload
///
/// 32 bytes, displayed as 64 hex characters. Collisions are treated as
/// negligible; a fingerprint is never reused for different content.
///
/// # Examples
///
/// ```
/// use sitevault_store::Fingerprint;
///
/// let css = b"body { margin: 0; }";
/// let fp = Fingerprint::hash(css);
/// assert_eq!(fp.to_hex().len(), 64);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Create a fingerprint by hashing the given payload
    pub fn hash(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&result);
        Fingerprint(bytes)
    }

    /// Create a fingerprint from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Fingerprint(bytes)
    }

    /// Get the raw bytes of the fingerprint
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to a 64-character hex string (the persisted key form)
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a fingerprint from its hex string form
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidFingerprint` unless the input is exactly
    /// 64 hex characters
    pub fn from_hex(s: &str) -> StoreResult<Self> {
        if s.len() != 64 {
            return Err(StoreError::InvalidFingerprint(format!(
                "expected 64 hex characters, got {}",
                s.len()
            )));
        }

        let bytes = hex::decode(s)
            .map_err(|e| StoreError::InvalidFingerprint(format!("invalid hex: {}", e)))?;

        let mut fp_bytes = [0u8; 32];
        fp_bytes.copy_from_slice(&bytes);
        Ok(Fingerprint(fp_bytes))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl From<[u8; 32]> for Fingerprint {
    fn from(bytes: [u8; 32]) -> Self {
        Fingerprint(bytes)
    }
}

impl From<Fingerprint> for [u8; 32] {
    fn from(fp: Fingerprint) -> Self {
        fp.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hash_deterministic() {
        let data = b".nav { display: flex; }";
        let fp1 = Fingerprint::hash(data);
        let fp2 = Fingerprint::hash(data);
        assert_eq!(fp1, fp2, "Same content should produce same fingerprint");
    }

    #[test]
    fn test_hash_different_content() {
        let fp1 = Fingerprint::hash(b"body { margin: 0 }");
        let fp2 = Fingerprint::hash(b"body { margin: 1px }");
        assert_ne!(fp1, fp2);
    }

    #[test]
    fn test_hex_roundtrip() {
        let fp1 = Fingerprint::hash(b"screenshot bytes");
        let fp2 = Fingerprint::from_hex(&fp1.to_hex()).unwrap();
        assert_eq!(fp1, fp2);
    }

    #[test]
    fn test_invalid_hex() {
        assert!(Fingerprint::from_hex("too_short").is_err());
        assert!(Fingerprint::from_hex(&"z".repeat(64)).is_err());
    }

    #[test]
    fn test_display() {
        let fp = Fingerprint::hash(b"test");
        let display = format!("{}", fp);
        assert_eq!(display.len(), 64);
        assert!(display.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_empty_payload_has_fingerprint() {
        // Known SHA-256 of the empty string
        assert_eq!(
            Fingerprint::hash(b"").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    proptest! {
        #[test]
        fn prop_hex_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let fp = Fingerprint::hash(&data);
            prop_assert_eq!(Fingerprint::from_hex(&fp.to_hex()).unwrap(), fp);
        }
    }
}
