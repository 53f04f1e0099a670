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

//! Content-addressed deduplication store for scanned site assets
//!
//! Scan pipelines produce two large, highly repetitive asset classes:
//! stylesheet text and rendered screenshots. Byte-identical content shows
//! up again and again across sites, scans, and viewports. This crate
//! stores each unique payload exactly once:
//!
//! - **Fingerprinting**: SHA-256 of the uncompressed bytes identifies
//!   content; identical bytes always map to the same stored row
//! - **Reference counting**: any number of logical references (a scan's
//!   stylesheet slot, a site+viewport pair) point at one stored copy
//! - **Garbage collection**: orphaned content is reclaimed only after a
//!   retention window of idleness, never while referenced
//! - **Stats**: dedup rate and storage-efficiency metrics from the two
//!   tables
//!
//! Producers call [`DedupStore::put`] then [`DedupStore::attach`]; readers
//! call [`DedupStore::get`] or [`DedupStore::resolve_all`]; an external
//! scheduler drives [`DedupStore::collect`].

pub mod error;
pub mod fingerprint;
pub mod record;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use fingerprint::Fingerprint;
pub use record::{ContentRecord, DedupStats, ReferenceRecord, ResolvedAsset};
pub use store::DedupStore;
