//! wirestat-rates — turns stored counter samples into per-second rates.
//!
//! Counters on a device only ever grow; the quantity worth charting is the
//! per-second rate between consecutive polls. This crate owns that
//! derivation plus the query window around it:
//!
//! ```text
//!   SampleStore ──range scan──▶ per-oid series ──rate_series──▶ RatePoints ──Stats::over──▶ report
//! ```
//!
//! Query windows anchor to the newest *stored* timestamp rather than the
//! wall clock, so a stalled collector yields the same report on every query
//! instead of one that drains toward empty.

pub mod derive;
pub mod error;
pub mod query;
pub mod window;

pub use derive::{RatePoint, SeriesPoint, positive_samples, rate_series};
pub use error::{QueryError, QueryResult};
pub use query::{RateReport, SeriesReport, raw_series, rate_report};
pub use window::{Scale, Stats};
