//! wirestat-collector — the write side of wirestat.
//!
//! # Architecture
//!
//! ```text
//!              ┌─────────────────────┐
//!   catalog ──>│  Collector<R>.run   │── Sample batches ──> SampleStore
//!              │  (tick every 60s)   │
//!              └─────────────────────┘
//!              ┌─────────────────────┐
//!              │ SummaryRefresher<R> │── DeviceSummary ──> watch channel
//!              └─────────────────────┘
//! ```
//!
//! The [`MetricCatalog`] is the static registry of metric groups and the
//! oids each fans out to. The [`Collector`] polls every catalog oid on a
//! fixed cadence, isolating failures per (metric, oid). The
//! [`SummaryRefresher`] keeps a device identity snapshot current with a
//! single writer and any number of `watch` readers.

pub mod catalog;
pub mod poller;
pub mod summary;

pub use catalog::{BANDWIDTH_IN, BANDWIDTH_OUT, CatalogError, MetricCatalog, MetricDef};
pub use poller::{Collector, PollConfig, TickOutcome};
pub use summary::{DeviceStatus, DeviceSummary, SummaryRefresher};
