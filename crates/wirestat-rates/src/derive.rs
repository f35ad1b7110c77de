//! Pairwise rate derivation over one identifier's sample series.

use serde::Serialize;
use wirestat_store::Sample;

/// One numeric reading on a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub timestamp: u64,
    pub value: f64,
}

impl SeriesPoint {
    /// Numeric view of a counter or gauge sample. Text and unknown kinds
    /// have no place on a value axis and yield `None`.
    pub fn from_sample(sample: &Sample) -> Option<Self> {
        sample.numeric_value().map(|value| Self {
            timestamp: sample.timestamp,
            value,
        })
    }

    /// Counter-only view, the input to rate derivation. Gauges are already
    /// instantaneous and must not be differenced.
    pub fn from_counter_sample(sample: &Sample) -> Option<Self> {
        sample.counter_value().map(|value| Self {
            timestamp: sample.timestamp,
            value,
        })
    }
}

/// One derived per-second rate, stamped with the later reading's timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatePoint {
    pub timestamp: u64,
    pub rate: f64,
}

/// Difference consecutive readings of one counter into per-second rates.
///
/// `points` must belong to a single identifier and be in ascending time
/// order. Pairs with no elapsed time are skipped rather than divided by
/// zero. A value drop is read as a counter reset and the later reading is
/// taken as growth from zero, which understates the true rate for at most
/// one interval after a device reboot.
pub fn rate_series(points: &[SeriesPoint], scale_factor: f64) -> Vec<RatePoint> {
    let mut rates = Vec::with_capacity(points.len().saturating_sub(1));
    for pair in points.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        let elapsed = curr.timestamp as i64 - prev.timestamp as i64;
        if elapsed <= 0 {
            continue;
        }
        let mut delta = curr.value - prev.value;
        if delta < 0.0 {
            delta = curr.value;
        }
        rates.push(RatePoint {
            timestamp: curr.timestamp,
            rate: delta * scale_factor / elapsed as f64,
        });
    }
    rates
}

/// Keep only points with a strictly positive value.
///
/// Applied before differencing on bandwidth-style series, where a zero
/// reading means the poll raced an interface coming up and would otherwise
/// trip the reset heuristic.
pub fn positive_samples(points: &[SeriesPoint]) -> Vec<SeriesPoint> {
    points.iter().copied().filter(|p| p.value > 0.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wirestat_store::ValueKind;

    fn pts(raw: &[(u64, f64)]) -> Vec<SeriesPoint> {
        raw.iter()
            .map(|&(timestamp, value)| SeriesPoint { timestamp, value })
            .collect()
    }

    fn sample(kind: ValueKind, value: &str, timestamp: u64) -> Sample {
        Sample {
            metric_name: "Bandwidth In".to_string(),
            oid: "1.3.6.1.2.1.2.2.1.10.1".to_string(),
            value: value.to_string(),
            kind,
            source: "192.0.2.10:161".to_string(),
            timestamp,
        }
    }

    #[test]
    fn steady_growth_yields_constant_rate() {
        let series = pts(&[(0, 1000.0), (30, 1500.0), (60, 2000.0)]);
        let rates = rate_series(&series, 8.0);

        assert_eq!(rates.len(), 2);
        for point in &rates {
            // 500 counted units over 30 s, times 8 bits per byte.
            assert!((point.rate - 400.0 / 3.0).abs() < 1e-9);
        }
        assert_eq!(rates[0].timestamp, 30);
        assert_eq!(rates[1].timestamp, 60);
    }

    #[test]
    fn counter_reset_reads_as_growth_from_zero() {
        let series = pts(&[(0, 5000.0), (60, 200.0)]);
        let rates = rate_series(&series, 8.0);

        assert_eq!(rates.len(), 1);
        assert!((rates[0].rate - 80.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn zero_elapsed_pair_is_skipped() {
        let series = pts(&[(100, 10.0), (100, 20.0), (130, 50.0)]);
        let rates = rate_series(&series, 1.0);

        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].timestamp, 130);
        assert!((rates[0].rate - 1.0).abs() < 1e-9);
    }

    #[test]
    fn backwards_pair_is_skipped() {
        let series = pts(&[(100, 10.0), (90, 20.0), (120, 30.0)]);
        let rates = rate_series(&series, 1.0);

        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].timestamp, 120);
        assert!((rates[0].rate - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn short_series_yields_no_rates() {
        assert!(rate_series(&[], 8.0).is_empty());
        assert!(rate_series(&pts(&[(0, 1000.0)]), 8.0).is_empty());
    }

    #[test]
    fn flat_series_yields_zero_rates() {
        let series = pts(&[(0, 100.0), (60, 100.0), (120, 100.0)]);
        let rates = rate_series(&series, 8.0);

        assert_eq!(rates.len(), 2);
        assert!(rates.iter().all(|p| p.rate == 0.0));
    }

    #[test]
    fn scale_factor_multiplies_linearly() {
        let series = pts(&[(0, 0.0), (10, 100.0)]);
        let unscaled = rate_series(&series, 1.0);
        let scaled = rate_series(&series, 8.0);

        assert!((unscaled[0].rate - 10.0).abs() < 1e-9);
        assert!((scaled[0].rate - 80.0).abs() < 1e-9);
    }

    #[test]
    fn positive_filter_keeps_only_positive_values() {
        let series = pts(&[(0, 0.0), (10, -5.0), (20, 3.0), (30, 0.0)]);
        let kept = positive_samples(&series);

        assert_eq!(kept, pts(&[(20, 3.0)]));
    }

    #[test]
    fn sample_conversion_accepts_counters_and_gauges() {
        let counter = sample(ValueKind::Counter, "1500", 30);
        let gauge = sample(ValueKind::Gauge, "12.5", 30);
        let text = sample(ValueKind::Text, "up", 30);

        assert_eq!(
            SeriesPoint::from_sample(&counter),
            Some(SeriesPoint { timestamp: 30, value: 1500.0 })
        );
        assert_eq!(
            SeriesPoint::from_sample(&gauge),
            Some(SeriesPoint { timestamp: 30, value: 12.5 })
        );
        assert_eq!(SeriesPoint::from_sample(&text), None);
    }

    #[test]
    fn counter_conversion_rejects_gauges() {
        let counter = sample(ValueKind::Counter, "1500", 30);
        let gauge = sample(ValueKind::Gauge, "12.5", 30);

        assert!(SeriesPoint::from_counter_sample(&counter).is_some());
        assert!(SeriesPoint::from_counter_sample(&gauge).is_none());
    }

    #[test]
    fn unparseable_counter_text_is_dropped() {
        let bad = sample(ValueKind::Counter, "No Such Instance", 30);
        assert_eq!(SeriesPoint::from_sample(&bad), None);
        assert_eq!(SeriesPoint::from_counter_sample(&bad), None);
    }
}
