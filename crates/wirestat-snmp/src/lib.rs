//! wirestat-snmp — the device reading boundary.
//!
//! wirestat treats the management-protocol client as a black box: anything
//! that can resolve one oid on one target to one tagged value implements
//! [`MetricReader`]. The collector never learns how the bytes moved.
//!
//! # Architecture
//!
//! ```text
//!   collector ──> read_with_retry ──> MetricReader ──> device
//!                 (deadline +          (trait)
//!                  bounded retry)
//! ```
//!
//! The crate ships one implementation, [`SimulatedAgent`]: a deterministic
//! in-process device used by the test suites and by `wirestatd --simulate`.
//! A real SNMP client is wired in by implementing `MetricReader` over it.

pub mod reader;
pub mod sim;

pub use reader::{MetricReader, ReadError, ReadValue, Reading, ReaderConfig, Target, read_with_retry};
pub use sim::SimulatedAgent;
