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

//! Record types for the content and reference tables
//!
//! Public records carry parsed fingerprints and UTC timestamps; the raw
//! row structs mirror the persisted columns (hex keys, epoch seconds) and
//! convert via `into_record()`.

use crate::fingerprint::Fingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the content table: the single stored copy of a unique payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Digest of the uncompressed payload; the primary key
    pub fingerprint: Fingerprint,
    /// Size of the original uncompressed payload
    pub byte_size: u64,
    /// Size actually persisted
    pub compressed_size: u64,
    /// Whether the persisted payload is compressed
    pub is_compressed: bool,
    /// Number of reference rows currently pointing at this content
    pub reference_count: u64,
    /// Creation time, immutable
    pub created_at: DateTime<Utc>,
    /// Updated on every successful read; gates garbage collection
    pub last_accessed: DateTime<Utc>,
}

/// One row of the reference table: a logical pointer from an owning entity
/// (a scan's stylesheet slot, a site+viewport pair) to a content row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    /// The owning logical object
    pub entity_id: String,
    /// Distinguishes sibling references of the same entity (source index,
    /// viewport name, ...)
    pub discriminator: String,
    /// Content this reference points at
    pub fingerprint: Fingerprint,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// One entry of a batch resolve: the reference's discriminator plus its
/// content bytes, or `None` when the content row is missing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    /// Discriminator of the resolved reference
    pub discriminator: String,
    /// Decompressed content, absent for dangling references
    pub bytes: Option<Vec<u8>>,
}

/// Deduplication and storage-efficiency metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupStats {
    /// Reference rows across the store
    pub total_references: u64,
    /// Distinct content rows
    pub unique_content: u64,
    /// Percentage of references sharing content with another reference
    pub dedup_rate: u8,
    /// Logical bytes as if nothing were deduplicated (each reference's
    /// uncompressed size, counted once per reference)
    pub total_bytes: u64,
    /// Bytes actually persisted across distinct content rows
    pub unique_bytes: u64,
    /// Percentage of logical bytes saved by dedup plus compression
    pub storage_efficiency: u8,
}

impl DedupStats {
    /// Compute metrics from raw table aggregates
    ///
    /// Rates are defined as 0 when their denominator is 0. Orphaned content
    /// awaiting garbage collection can push `unique_content` above
    /// `total_references`; rates floor at 0 rather than going negative.
    pub fn compute(
        total_references: u64,
        unique_content: u64,
        total_bytes: u64,
        unique_bytes: u64,
    ) -> Self {
        DedupStats {
            total_references,
            unique_content,
            dedup_rate: percentage_saved(total_references, unique_content),
            total_bytes,
            unique_bytes,
            storage_efficiency: percentage_saved(total_bytes, unique_bytes),
        }
    }
}

fn percentage_saved(total: u64, actual: u64) -> u8 {
    if total == 0 || actual >= total {
        return 0;
    }
    let saved = (total - actual) as f64 / total as f64 * 100.0;
    saved.round() as u8
}

/// Raw content row as persisted
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ContentRow {
    pub fingerprint: String,
    pub byte_size: i64,
    pub compressed_size: i64,
    pub is_compressed: bool,
    pub reference_count: i64,
    pub created_at: i64,
    pub last_accessed: i64,
}

impl ContentRow {
    pub(crate) fn into_record(self) -> Option<ContentRecord> {
        Some(ContentRecord {
            fingerprint: Fingerprint::from_hex(&self.fingerprint).ok()?,
            byte_size: u64::try_from(self.byte_size).ok()?,
            compressed_size: u64::try_from(self.compressed_size).ok()?,
            is_compressed: self.is_compressed,
            reference_count: u64::try_from(self.reference_count).ok()?,
            created_at: DateTime::from_timestamp(self.created_at, 0)?,
            last_accessed: DateTime::from_timestamp(self.last_accessed, 0)?,
        })
    }
}

/// Raw reference row as persisted
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ReferenceRow {
    pub entity_id: String,
    pub discriminator: String,
    pub fingerprint: String,
    pub created_at: i64,
}

impl ReferenceRow {
    pub(crate) fn into_record(self) -> Option<ReferenceRecord> {
        Some(ReferenceRecord {
            entity_id: self.entity_id,
            discriminator: self.discriminator,
            fingerprint: Fingerprint::from_hex(&self.fingerprint).ok()?,
            created_at: DateTime::from_timestamp(self.created_at, 0)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_empty_store() {
        let stats = DedupStats::compute(0, 0, 0, 0);
        assert_eq!(stats.dedup_rate, 0);
        assert_eq!(stats.storage_efficiency, 0);
    }

    #[test]
    fn test_stats_two_refs_one_blob() {
        let stats = DedupStats::compute(2, 1, 2048, 1024);
        assert_eq!(stats.dedup_rate, 50);
        assert_eq!(stats.storage_efficiency, 50);
    }

    #[test]
    fn test_stats_no_sharing() {
        let stats = DedupStats::compute(3, 3, 3000, 3000);
        assert_eq!(stats.dedup_rate, 0);
        assert_eq!(stats.storage_efficiency, 0);
    }

    #[test]
    fn test_stats_rounding() {
        // 2 of 3 references share content: (3 - 2) / 3 = 33.3% -> 33
        let stats = DedupStats::compute(3, 2, 0, 0);
        assert_eq!(stats.dedup_rate, 33);
    }

    #[test]
    fn test_stats_orphans_floor_at_zero() {
        // More content rows than references (orphans pending GC)
        let stats = DedupStats::compute(1, 3, 100, 300);
        assert_eq!(stats.dedup_rate, 0);
        assert_eq!(stats.storage_efficiency, 0);
    }

    #[test]
    fn test_content_row_conversion() {
        let fp = Fingerprint::hash(b"payload");
        let row = ContentRow {
            fingerprint: fp.to_hex(),
            byte_size: 512,
            compressed_size: 128,
            is_compressed: true,
            reference_count: 2,
            created_at: 1_700_000_000,
            last_accessed: 1_700_000_100,
        };
        let record = row.into_record().expect("valid row");
        assert_eq!(record.fingerprint, fp);
        assert_eq!(record.reference_count, 2);
        assert!(record.last_accessed > record.created_at);
    }

    #[test]
    fn test_malformed_row_rejected() {
        let row = ContentRow {
            fingerprint: "not-hex".to_string(),
            byte_size: 0,
            compressed_size: 0,
            is_compressed: false,
            reference_count: 0,
            created_at: 0,
            last_accessed: 0,
        };
        assert!(row.into_record().is_none());
    }
}
