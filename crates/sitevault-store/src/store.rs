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

//! Deduplicated content store
//!
//! One content row per unique payload, any number of reference rows
//! pointing at it. All invariants are enforced with atomic SQL (upsert on
//! the fingerprint key, guarded increments/decrements, conditional
//! deletes) so concurrent producers, readers, and the garbage collector
//! need no in-process coordination. Authoritative state lives entirely in
//! the database; restarts are transparent.

use crate::error::{StoreError, StoreResult};
use crate::fingerprint::Fingerprint;
use crate::record::{
    ContentRecord, ContentRow, DedupStats, ReferenceRecord, ReferenceRow, ResolvedAsset,
};
use chrono::{Duration, Utc};
use futures::future::join_all;
use sitevault_compression::{CompressionPolicy, Compressor};
use sitevault_config::Config;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS content_blobs (
    fingerprint     TEXT PRIMARY KEY,
    payload         BLOB NOT NULL,
    is_compressed   INTEGER NOT NULL,
    byte_size       INTEGER NOT NULL,
    compressed_size INTEGER NOT NULL,
    reference_count INTEGER NOT NULL DEFAULT 0,
    created_at      INTEGER NOT NULL,
    last_accessed   INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS content_refs (
    entity_id     TEXT NOT NULL,
    discriminator TEXT NOT NULL,
    fingerprint   TEXT NOT NULL,
    created_at    INTEGER NOT NULL,
    PRIMARY KEY (entity_id, discriminator)
);
CREATE INDEX IF NOT EXISTS idx_refs_fingerprint ON content_refs (fingerprint);
";

/// Content-addressed deduplication store
///
/// Producers follow the sequence `let fp = store.put(bytes).await?;
/// store.attach(entity, discriminator, &fp).await?;`. The window between
/// the two calls is harmless: a zero-reference content row is only
/// collected after its retention window has elapsed.
///
/// Cloning is cheap (pool handle plus shared compressor) and clones
/// operate on the same database.
///
/// # Examples
///
/// ```no_run
/// use sitevault_store::DedupStore;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let store = DedupStore::connect(&sitevault_config::Config::default()).await?;
///
///     let fp = store.put(b"body { margin: 0; }").await?;
///     store.attach("scan-42", "stylesheet-0", &fp).await?;
///
///     let bytes = store.get(&fp).await?;
///     assert_eq!(bytes, b"body { margin: 0; }");
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct DedupStore {
    pool: SqlitePool,
    compressor: Arc<dyn Compressor>,
    policy: CompressionPolicy,
    retention: Duration,
}

impl std::fmt::Debug for DedupStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupStore")
            .field("policy", &self.policy)
            .field("retention_days", &self.retention.num_days())
            .finish()
    }
}

impl DedupStore {
    /// Open the store described by a configuration
    ///
    /// Creates the database file if missing and applies the schema
    /// idempotently.
    pub async fn connect(config: &Config) -> StoreResult<Self> {
        let options =
            SqliteConnectOptions::from_str(&config.database.url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect_with(options)
            .await?;

        info!(
            url = %config.database.url,
            retention_days = config.retention.window_days,
            compression = config.compression.enabled,
            "Opening dedup store"
        );

        Self::initialize(
            pool,
            config.build_compressor(),
            config.compression_policy(),
            config.retention_window(),
        )
        .await
    }

    /// Open an in-memory store (testing and ephemeral use)
    pub async fn in_memory() -> StoreResult<Self> {
        let config = Config::default();
        // A single connection keeps every caller on the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::initialize(
            pool,
            config.build_compressor(),
            config.compression_policy(),
            config.retention_window(),
        )
        .await
    }

    async fn initialize(
        pool: SqlitePool,
        compressor: Arc<dyn Compressor>,
        policy: CompressionPolicy,
        retention: Duration,
    ) -> StoreResult<Self> {
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(DedupStore {
            pool,
            compressor,
            policy,
            retention,
        })
    }

    /// Store a payload, deduplicating against existing content
    ///
    /// Computes the fingerprint of `raw` and inserts a content row unless
    /// one already exists. The reference count is untouched either way;
    /// `put` is idempotent and the caller completes the association with
    /// [`attach`](Self::attach).
    ///
    /// Safe under concurrent identical-content writers: the insert is an
    /// upsert keyed by fingerprint, so a losing racer observes "already
    /// exists" and succeeds without double-storing.
    pub async fn put(&self, raw: &[u8]) -> StoreResult<Fingerprint> {
        let fingerprint = Fingerprint::hash(raw);
        let hex = fingerprint.to_hex();

        let compressed = self.policy.apply(self.compressor.as_ref(), raw)?;
        let (payload, is_compressed) = match &compressed {
            Some(bytes) => (bytes.as_slice(), true),
            None => (raw, false),
        };
        let now = Utc::now().timestamp();

        let result = sqlx::query(
            "INSERT INTO content_blobs
             (fingerprint, payload, is_compressed, byte_size, compressed_size,
              reference_count, created_at, last_accessed)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6)
             ON CONFLICT(fingerprint) DO NOTHING",
        )
        .bind(&hex)
        .bind(payload)
        .bind(is_compressed)
        .bind(raw.len() as i64)
        .bind(payload.len() as i64)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(fingerprint = %fingerprint, "Content already stored (deduplicated)");
        } else {
            info!(
                fingerprint = %fingerprint,
                byte_size = raw.len(),
                stored_size = payload.len(),
                compressed = is_compressed,
                "Stored new content"
            );
        }

        Ok(fingerprint)
    }

    /// Point a reference at stored content, replacing any previous target
    ///
    /// In one transaction: increments the new fingerprint's count,
    /// decrements the old one's if the reference is being reassigned, and
    /// upserts the reference row. Pointing a reference at the fingerprint
    /// it already targets is a no-op.
    ///
    /// # Errors
    ///
    /// `MissingContent` when `fingerprint` was never stored (`attach`
    /// called before `put` completed); `RefCountUnderflow` when the
    /// replaced fingerprint's count was already zero. Both indicate a
    /// caller ordering bug and leave the database untouched.
    pub async fn attach(
        &self,
        entity_id: &str,
        discriminator: &str,
        fingerprint: &Fingerprint,
    ) -> StoreResult<()> {
        let new_hex = fingerprint.to_hex();
        let mut tx = self.pool.begin().await?;

        let existing: Option<String> = sqlx::query_scalar(
            "SELECT fingerprint FROM content_refs
             WHERE entity_id = ?1 AND discriminator = ?2",
        )
        .bind(entity_id)
        .bind(discriminator)
        .fetch_optional(&mut *tx)
        .await?;

        if existing.as_deref() == Some(new_hex.as_str()) {
            debug!(entity_id, discriminator, "Reference already points at content");
            return Ok(());
        }

        let bumped = sqlx::query(
            "UPDATE content_blobs SET reference_count = reference_count + 1
             WHERE fingerprint = ?1",
        )
        .bind(&new_hex)
        .execute(&mut *tx)
        .await?;

        if bumped.rows_affected() == 0 {
            error!(
                entity_id,
                discriminator,
                fingerprint = %fingerprint,
                "Attach targets content that was never stored"
            );
            return Err(StoreError::MissingContent(*fingerprint));
        }

        if let Some(old_hex) = &existing {
            let dropped = sqlx::query(
                "UPDATE content_blobs SET reference_count = reference_count - 1
                 WHERE fingerprint = ?1 AND reference_count > 0",
            )
            .bind(old_hex)
            .execute(&mut *tx)
            .await?;

            if dropped.rows_affected() == 0 {
                error!(
                    entity_id,
                    discriminator,
                    fingerprint = %old_hex,
                    "Reference count would go negative on reassignment"
                );
                return Err(StoreError::RefCountUnderflow(old_hex.clone()));
            }
        }

        sqlx::query(
            "INSERT INTO content_refs (entity_id, discriminator, fingerprint, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(entity_id, discriminator) DO UPDATE SET
                 fingerprint = excluded.fingerprint,
                 created_at = excluded.created_at",
        )
        .bind(entity_id)
        .bind(discriminator)
        .bind(&new_hex)
        .bind(Utc::now().timestamp())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            entity_id,
            discriminator,
            fingerprint = %fingerprint,
            reassigned = existing.is_some(),
            "Reference attached"
        );
        Ok(())
    }

    /// Remove a reference, decrementing its content's reference count
    ///
    /// Returns `false` when no reference existed for the key (no-op).
    /// Content is never deleted here; orphaned rows wait for the garbage
    /// collector.
    pub async fn detach(&self, entity_id: &str, discriminator: &str) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<String> = sqlx::query_scalar(
            "SELECT fingerprint FROM content_refs
             WHERE entity_id = ?1 AND discriminator = ?2",
        )
        .bind(entity_id)
        .bind(discriminator)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(old_hex) = existing else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM content_refs WHERE entity_id = ?1 AND discriminator = ?2")
            .bind(entity_id)
            .bind(discriminator)
            .execute(&mut *tx)
            .await?;

        let dropped = sqlx::query(
            "UPDATE content_blobs SET reference_count = reference_count - 1
             WHERE fingerprint = ?1 AND reference_count > 0",
        )
        .bind(&old_hex)
        .execute(&mut *tx)
        .await?;

        if dropped.rows_affected() == 0 {
            error!(
                entity_id,
                discriminator,
                fingerprint = %old_hex,
                "Reference count would go negative on detach"
            );
            return Err(StoreError::RefCountUnderflow(old_hex));
        }

        tx.commit().await?;

        debug!(entity_id, discriminator, fingerprint = %old_hex, "Reference detached");
        Ok(true)
    }

    /// Read content back by fingerprint
    ///
    /// Bumps `last_accessed` best-effort (a failed bump is logged, never
    /// surfaced: staleness only affects GC grace-period accuracy), then
    /// decompresses if needed and verifies the payload still hashes to its
    /// fingerprint.
    ///
    /// # Errors
    ///
    /// `NotFound` when no content row exists (the caller's reference is
    /// dangling); `Corrupt` when the payload fails verification.
    pub async fn get(&self, fingerprint: &Fingerprint) -> StoreResult<Vec<u8>> {
        let hex = fingerprint.to_hex();

        let row: Option<(Vec<u8>, bool)> = sqlx::query_as(
            "SELECT payload, is_compressed FROM content_blobs WHERE fingerprint = ?1",
        )
        .bind(&hex)
        .fetch_optional(&self.pool)
        .await?;

        let Some((payload, is_compressed)) = row else {
            warn!(fingerprint = %fingerprint, "Content not found (dangling reference)");
            return Err(StoreError::NotFound(*fingerprint));
        };

        let touch = sqlx::query(
            "UPDATE content_blobs SET last_accessed = ?1 WHERE fingerprint = ?2",
        )
        .bind(Utc::now().timestamp())
        .bind(&hex)
        .execute(&self.pool)
        .await;
        if let Err(e) = touch {
            warn!(fingerprint = %fingerprint, error = %e, "Failed to bump last_accessed");
        }

        let data = if is_compressed {
            self.compressor.decompress(&payload)?
        } else {
            payload
        };

        let computed = Fingerprint::hash(&data);
        if computed != *fingerprint {
            error!(
                expected = %fingerprint,
                computed = %computed,
                "Content integrity check failed"
            );
            return Err(StoreError::Corrupt {
                expected: *fingerprint,
                actual: computed,
            });
        }

        Ok(data)
    }

    /// List the reference rows owned by an entity, ordered by discriminator
    pub async fn references(&self, entity_id: &str) -> StoreResult<Vec<ReferenceRecord>> {
        let rows: Vec<ReferenceRow> = sqlx::query_as(
            "SELECT entity_id, discriminator, fingerprint, created_at
             FROM content_refs WHERE entity_id = ?1 ORDER BY discriminator",
        )
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let discriminator = row.discriminator.clone();
            match row.into_record() {
                Some(record) => records.push(record),
                None => {
                    warn!(entity_id, discriminator, "Skipping malformed reference row");
                }
            }
        }
        Ok(records)
    }

    /// Resolve every reference of an entity to its content
    ///
    /// Fingerprints are fetched concurrently. A dangling reference yields
    /// an entry with `bytes: None` instead of failing the batch; any other
    /// failure (database unavailable, corrupt payload) aborts the call.
    pub async fn resolve_all(&self, entity_id: &str) -> StoreResult<Vec<ResolvedAsset>> {
        let refs = self.references(entity_id).await?;

        let lookups = refs.into_iter().map(|reference| async move {
            match self.get(&reference.fingerprint).await {
                Ok(bytes) => Ok(ResolvedAsset {
                    discriminator: reference.discriminator,
                    bytes: Some(bytes),
                }),
                Err(StoreError::NotFound(fp)) => {
                    warn!(
                        entity_id = %reference.entity_id,
                        discriminator = %reference.discriminator,
                        fingerprint = %fp,
                        "Dangling reference while resolving entity"
                    );
                    Ok(ResolvedAsset {
                        discriminator: reference.discriminator,
                        bytes: None,
                    })
                }
                Err(e) => Err(e),
            }
        });

        join_all(lookups).await.into_iter().collect()
    }

    /// Check whether content exists for a fingerprint
    pub async fn exists(&self, fingerprint: &Fingerprint) -> StoreResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM content_blobs WHERE fingerprint = ?1")
                .bind(fingerprint.to_hex())
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    /// Fetch a content row's metadata without touching `last_accessed`
    pub async fn record(&self, fingerprint: &Fingerprint) -> StoreResult<Option<ContentRecord>> {
        let row: Option<ContentRow> = sqlx::query_as(
            "SELECT fingerprint, byte_size, compressed_size, is_compressed,
                    reference_count, created_at, last_accessed
             FROM content_blobs WHERE fingerprint = ?1",
        )
        .bind(fingerprint.to_hex())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let record = row.into_record();
        if record.is_none() {
            warn!(fingerprint = %fingerprint, "Content row is malformed; treating as absent");
        }
        Ok(record)
    }

    /// Garbage-collect orphaned content, returning the number of rows deleted
    ///
    /// Eligible rows have a zero reference count and were last accessed
    /// before the retention window. Each delete independently re-checks
    /// both conditions, so a reference attached between selection and
    /// deletion keeps its content, and a row whose delete fails simply
    /// stays eligible for the next pass. Running with nothing eligible
    /// deletes nothing.
    pub async fn collect(&self) -> StoreResult<u64> {
        let cutoff = (Utc::now() - self.retention).timestamp();

        let candidates: Vec<String> = sqlx::query_scalar(
            "SELECT fingerprint FROM content_blobs
             WHERE reference_count = 0 AND last_accessed < ?1",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        let mut deleted = 0u64;
        for hex in &candidates {
            let result = sqlx::query(
                "DELETE FROM content_blobs
                 WHERE fingerprint = ?1 AND reference_count = 0 AND last_accessed < ?2",
            )
            .bind(hex)
            .bind(cutoff)
            .execute(&self.pool)
            .await;

            match result {
                Ok(res) => deleted += res.rows_affected(),
                Err(e) => {
                    warn!(
                        fingerprint = %hex,
                        error = %e,
                        "Failed to delete orphaned content; eligible again next pass"
                    );
                }
            }
        }

        info!(
            candidates = candidates.len(),
            deleted, "Garbage collection pass complete"
        );
        Ok(deleted)
    }

    /// Compute deduplication and storage-efficiency metrics
    ///
    /// Read-only: mutates neither reference counts nor access timestamps.
    pub async fn stats(&self) -> StoreResult<DedupStats> {
        // Counted without a join so dangling references still show up
        let total_references: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM content_refs")
            .fetch_one(&self.pool)
            .await?;

        let total_bytes: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(b.byte_size), 0)
             FROM content_refs r
             JOIN content_blobs b ON b.fingerprint = r.fingerprint",
        )
        .fetch_one(&self.pool)
        .await?;

        let (unique_content, unique_bytes): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(compressed_size), 0) FROM content_blobs",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DedupStats::compute(
            total_references.max(0) as u64,
            unique_content.max(0) as u64,
            total_bytes.max(0) as u64,
            unique_bytes.max(0) as u64,
        ))
    }
}
