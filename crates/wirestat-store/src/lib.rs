//! wirestat-store — embedded sample store for wirestat.
//!
//! Backed by [redb](https://docs.rs/redb), persists every successful poll of
//! a monitored device as an immutable [`Sample`] row and answers the
//! time-window queries the rate engine is built on.
//!
//! # Architecture
//!
//! Samples are JSON-serialized into redb's `&[u8]` value column under the
//! composite key `{metric}:{timestamp:020}:{oid}`. The zero-padded timestamp
//! makes redb's lexicographic key order the chronological order within a
//! metric, so "everything for Bandwidth In over the last hour" is a single
//! range scan. A meta row tracks the newest timestamp ever written, which
//! anchors query windows without scanning the table.
//!
//! The `SampleStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks: one collector task appends while any
//! number of API handlers read.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use store::SampleStore;
pub use types::*;
