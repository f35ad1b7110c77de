//! Domain types for the wirestat sample store.
//!
//! A [`Sample`] is one successful reading of one object on the monitored
//! device. Samples are immutable once written, retained indefinitely, and
//! carry the device's own value typing as a [`ValueKind`] tag so the query
//! path can reject non-numeric readings by matching instead of guessing.

use serde::{Deserialize, Serialize};

/// How the reader classified the value a device returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Monotonically increasing count; drops back toward zero when the
    /// device restarts or the counter wraps.
    Counter,
    /// Point-in-time numeric reading.
    Gauge,
    /// Free-form text (sysDescr and friends).
    Text,
    /// Anything the reader could not classify.
    Unknown,
}

/// One reading of one object identifier, stamped at observation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sample {
    /// Catalog metric this reading belongs to (e.g. "Bandwidth In").
    pub metric_name: String,
    /// Object identifier that was read (e.g. "1.3.6.1.2.1.2.2.1.10.3").
    pub oid: String,
    /// Text-encoded value as returned by the device.
    pub value: String,
    /// Value classification reported by the reader.
    pub kind: ValueKind,
    /// Device the reading came from, as `ip:port`.
    pub source: String,
    /// Unix timestamp (seconds) at observation.
    pub timestamp: u64,
}

impl Sample {
    /// Build the composite key for the samples table.
    ///
    /// Timestamp-major within a metric; the oid component keeps keys unique
    /// across a device's interfaces. Two readings of the same oid in the same
    /// second collapse to one row (last write wins), which whole-second poll
    /// cadences never produce.
    pub fn table_key(&self) -> String {
        format!("{}:{:020}:{}", self.metric_name, self.timestamp, self.oid)
    }

    /// Numeric view of the value, if the kind carries a number.
    pub fn numeric_value(&self) -> Option<f64> {
        match self.kind {
            ValueKind::Counter | ValueKind::Gauge => self.value.trim().parse().ok(),
            ValueKind::Text | ValueKind::Unknown => None,
        }
    }

    /// Numeric view restricted to counter readings (the only kind the rate
    /// engine will difference).
    pub fn counter_value(&self) -> Option<f64> {
        match self.kind {
            ValueKind::Counter => self.value.trim().parse().ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(kind: ValueKind, value: &str) -> Sample {
        Sample {
            metric_name: "Bandwidth In".to_string(),
            oid: "1.3.6.1.2.1.2.2.1.10.1".to_string(),
            value: value.to_string(),
            kind,
            source: "192.0.2.10:161".to_string(),
            timestamp: 1000,
        }
    }

    #[test]
    fn table_key_pads_timestamp() {
        let s = sample(ValueKind::Counter, "42");
        assert_eq!(
            s.table_key(),
            "Bandwidth In:00000000000000001000:1.3.6.1.2.1.2.2.1.10.1"
        );
    }

    #[test]
    fn key_order_is_time_order() {
        let mut early = sample(ValueKind::Counter, "1");
        let mut late = sample(ValueKind::Counter, "2");
        early.timestamp = 999;
        late.timestamp = 10_000;
        // Without padding "10000" would sort before "999".
        assert!(early.table_key() < late.table_key());
    }

    #[test]
    fn numeric_value_parses_counter_and_gauge() {
        assert_eq!(sample(ValueKind::Counter, "1500").numeric_value(), Some(1500.0));
        assert_eq!(sample(ValueKind::Gauge, " 7.5 ").numeric_value(), Some(7.5));
    }

    #[test]
    fn numeric_value_rejects_text_kinds() {
        assert_eq!(sample(ValueKind::Text, "1500").numeric_value(), None);
        assert_eq!(sample(ValueKind::Unknown, "1500").numeric_value(), None);
    }

    #[test]
    fn counter_value_rejects_gauges() {
        assert_eq!(sample(ValueKind::Gauge, "1500").counter_value(), None);
        assert_eq!(sample(ValueKind::Counter, "1500").counter_value(), Some(1500.0));
    }

    #[test]
    fn unparseable_numeric_is_none() {
        assert_eq!(sample(ValueKind::Counter, "not-a-number").counter_value(), None);
    }

    #[test]
    fn kind_round_trips_through_json() {
        let s = sample(ValueKind::Gauge, "3");
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"gauge\""));
        let back: Sample = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
