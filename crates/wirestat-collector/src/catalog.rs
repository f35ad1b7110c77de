//! Static catalog of metric groups and the oids they fan out to.
//!
//! Built once at startup from configuration (or the stock device profile)
//! and never mutated afterwards; registering metrics at runtime is not a
//! thing. Validation happens at build time so a bad config fails the daemon
//! before the first poll.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Metric name the inbound traffic endpoints aggregate.
pub const BANDWIDTH_IN: &str = "Bandwidth In";
/// Metric name the outbound traffic endpoints aggregate.
pub const BANDWIDTH_OUT: &str = "Bandwidth Out";

/// Errors raised while building or querying the catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown metric: {0}")]
    UnknownMetric(String),

    #[error("duplicate metric name: {0}")]
    DuplicateMetric(String),

    #[error("metric {0} has no oids")]
    EmptyOids(String),

    #[error("metric name {0:?} may not contain ':'")]
    InvalidName(String),
}

/// One metric group: a name, the oids polled for it, and how the query path
/// treats its values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricDef {
    pub name: String,
    pub oids: Vec<String>,
    /// Multiplier applied to derived deltas (8.0 turns octets into bits).
    pub scale_factor: f64,
    /// Drop non-positive raw values before differencing, so idle interfaces
    /// vanish from cumulative byte-counter series.
    pub strictly_positive: bool,
}

impl MetricDef {
    /// Single-oid metric with no scaling.
    pub fn scalar(name: &str, oid: &str) -> Self {
        Self {
            name: name.to_string(),
            oids: vec![oid.to_string()],
            scale_factor: 1.0,
            strictly_positive: false,
        }
    }

    /// Metric fanned out over `count` instance indexes of `base`.
    pub fn fan_out(name: &str, base: &str, count: u32) -> Self {
        Self {
            name: name.to_string(),
            oids: expand_oids(base, count),
            scale_factor: 1.0,
            strictly_positive: false,
        }
    }

    pub fn with_scale_factor(mut self, factor: f64) -> Self {
        self.scale_factor = factor;
        self
    }

    pub fn with_positive_filter(mut self) -> Self {
        self.strictly_positive = true;
        self
    }
}

/// Deterministic fan-out: `base.i` for each instance index 1..=count.
pub fn expand_oids(base: &str, count: u32) -> Vec<String> {
    (1..=count).map(|i| format!("{base}.{i}")).collect()
}

/// Immutable registry of metric groups, iterated in registration order.
#[derive(Debug, Clone)]
pub struct MetricCatalog {
    metrics: Vec<MetricDef>,
    index: HashMap<String, usize>,
}

impl MetricCatalog {
    /// Build a catalog, validating every definition.
    pub fn build(metrics: Vec<MetricDef>) -> Result<Self, CatalogError> {
        let mut index = HashMap::new();
        for (i, def) in metrics.iter().enumerate() {
            // ':' is the sample key separator.
            if def.name.contains(':') {
                return Err(CatalogError::InvalidName(def.name.clone()));
            }
            if def.oids.is_empty() {
                return Err(CatalogError::EmptyOids(def.name.clone()));
            }
            if index.insert(def.name.clone(), i).is_some() {
                return Err(CatalogError::DuplicateMetric(def.name.clone()));
            }
        }
        Ok(Self { metrics, index })
    }

    /// The nine metric groups of the stock device profile: per-interface
    /// octet and error counters over ten interfaces, plus system scalars.
    pub fn default_device() -> Self {
        let metrics = vec![
            MetricDef::fan_out(BANDWIDTH_IN, "1.3.6.1.2.1.2.2.1.10", 10)
                .with_scale_factor(8.0)
                .with_positive_filter(),
            MetricDef::fan_out(BANDWIDTH_OUT, "1.3.6.1.2.1.2.2.1.16", 10)
                .with_scale_factor(8.0)
                .with_positive_filter(),
            MetricDef::fan_out("Input Errors", "1.3.6.1.2.1.2.2.1.14", 10),
            MetricDef::fan_out("Output Errors", "1.3.6.1.2.1.2.2.1.20", 10),
            MetricDef::scalar("System Uptime", "1.3.6.1.2.1.1.3.0"),
            MetricDef::scalar("IP Packets Received", "1.3.6.1.2.1.4.3.0"),
            MetricDef::scalar("UDP Datagrams Sent", "1.3.6.1.2.1.7.4.0"),
            MetricDef::scalar("TCP Connections", "1.3.6.1.2.1.6.9.0"),
            MetricDef::scalar("Incoming IP Errors", "1.3.6.1.2.1.4.5.0"),
        ];
        let index = metrics
            .iter()
            .enumerate()
            .map(|(i, def)| (def.name.clone(), i))
            .collect();
        Self { metrics, index }
    }

    /// Look up a metric group by name.
    pub fn get(&self, name: &str) -> Result<&MetricDef, CatalogError> {
        self.index
            .get(name)
            .map(|&i| &self.metrics[i])
            .ok_or_else(|| CatalogError::UnknownMetric(name.to_string()))
    }

    /// Ordered oids polled for a metric group.
    pub fn identifiers_for(&self, name: &str) -> Result<&[String], CatalogError> {
        self.get(name).map(|def| def.oids.as_slice())
    }

    /// Metric groups in registration order.
    pub fn metrics(&self) -> &[MetricDef] {
        &self.metrics
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}
