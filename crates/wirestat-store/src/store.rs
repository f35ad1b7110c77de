//! SampleStore — redb-backed sample persistence for wirestat.
//!
//! Append-only: the collector writes one row per successful reading, nothing
//! ever updates or deletes rows. Values are JSON-serialized into redb's
//! `&[u8]` value column. The store supports both on-disk and in-memory
//! backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, WriteTransaction};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StoreError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StoreError::$variant(e.to_string())
    };
}

/// Thread-safe sample store backed by redb.
#[derive(Clone)]
pub struct SampleStore {
    db: Arc<Database>,
}

impl SampleStore {
    /// Open (or create) a persistent sample store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "sample store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory sample store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory sample store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(SAMPLES).map_err(map_err!(Table))?;
        txn.open_table(META).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Writes ─────────────────────────────────────────────────────

    /// Append a single sample.
    pub fn append(&self, sample: &Sample) -> StoreResult<()> {
        let key = sample.table_key();
        let value = serde_json::to_vec(sample).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(SAMPLES).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        bump_latest(&txn, sample.timestamp)?;
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, "sample stored");
        Ok(())
    }

    /// Append a batch of samples in one transaction (one poll of one metric
    /// group). Returns the number written.
    pub fn append_batch(&self, samples: &[Sample]) -> StoreResult<u32> {
        if samples.is_empty() {
            return Ok(0);
        }
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(SAMPLES).map_err(map_err!(Table))?;
            for sample in samples {
                let key = sample.table_key();
                let value = serde_json::to_vec(sample).map_err(map_err!(Serialize))?;
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(map_err!(Write))?;
            }
        }
        let newest = samples.iter().map(|s| s.timestamp).max().unwrap_or(0);
        bump_latest(&txn, newest)?;
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(
            metric = %samples[0].metric_name,
            count = samples.len(),
            "sample batch stored"
        );
        Ok(samples.len() as u32)
    }

    // ── Queries ────────────────────────────────────────────────────

    /// All samples for a metric with `from_ts <= timestamp <= to_ts`, in
    /// ascending timestamp order (ties ordered by oid).
    pub fn samples_in_range(
        &self,
        metric: &str,
        from_ts: u64,
        to_ts: u64,
    ) -> StoreResult<Vec<Sample>> {
        // Keys are timestamp-major, so the window is one key range. The upper
        // bound is the first key of the following second, exclusive.
        let lo = format!("{metric}:{from_ts:020}");
        let hi = format!("{metric}:{:020}", to_ts.saturating_add(1));
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SAMPLES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table
            .range::<&str>(lo.as_str()..hi.as_str())
            .map_err(map_err!(Read))?
        {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let sample: Sample =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(sample);
        }
        Ok(results)
    }

    /// Newest timestamp across all metrics, if any sample was ever written.
    ///
    /// This anchors query windows: "the last hour" means the hour before the
    /// newest stored sample, not the hour before whenever the query runs.
    pub fn latest_timestamp(&self) -> StoreResult<Option<u64>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(META).map_err(map_err!(Table))?;
        Ok(table
            .get(LATEST_SAMPLE_KEY)
            .map_err(map_err!(Read))?
            .map(|guard| guard.value()))
    }

    /// Number of stored samples for a metric (by key prefix scan).
    pub fn count_samples(&self, metric: &str) -> StoreResult<u64> {
        let prefix = format!("{metric}:");
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SAMPLES).map_err(map_err!(Table))?;
        let mut count = 0u64;
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, _) = entry.map_err(map_err!(Read))?;
            if key.value().starts_with(&prefix) {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Raise the stored latest-sample timestamp if `ts` is newer.
fn bump_latest(txn: &WriteTransaction, ts: u64) -> StoreResult<()> {
    let mut meta = txn.open_table(META).map_err(map_err!(Table))?;
    let current = meta
        .get(LATEST_SAMPLE_KEY)
        .map_err(map_err!(Read))?
        .map(|guard| guard.value());
    match current {
        Some(cur) if cur >= ts => {}
        _ => {
            meta.insert(LATEST_SAMPLE_KEY, ts).map_err(map_err!(Write))?;
        }
    }
    Ok(())
}
