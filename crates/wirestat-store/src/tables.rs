//! redb table definitions for the wirestat sample store.
//!
//! The samples table uses `&str` keys and `&[u8]` values (JSON-serialized
//! [`Sample`](crate::types::Sample) rows). Keys are timestamp-major within a
//! metric so chronological range scans fall out of redb's key order.

use redb::TableDefinition;

/// Samples keyed by `{metric}:{timestamp:020}:{oid}`.
pub const SAMPLES: TableDefinition<&str, &[u8]> = TableDefinition::new("samples");

/// Store-wide bookkeeping, currently just the newest sample timestamp.
pub const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

/// Meta key holding the maximum timestamp ever appended.
pub const LATEST_SAMPLE_KEY: &str = "latest_sample";
