//! Query glue: window selection, per-identifier derivation, report assembly.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use wirestat_collector::MetricCatalog;
use wirestat_store::{Sample, SampleStore};

use crate::derive::{self, RatePoint, SeriesPoint};
use crate::error::{QueryError, QueryResult};
use crate::window::{Scale, Stats};

/// Raw values for one metric over a window, no derivation applied.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeriesReport {
    pub points: Vec<SeriesPoint>,
    pub stats: Stats,
}

/// Derived per-second rates for one metric over a window.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RateReport {
    pub points: Vec<RatePoint>,
    pub stats: Stats,
}

/// Samples for `metric` in `[latest - scale, latest]`, anchored to the
/// newest stored timestamp. An empty store yields an empty vec.
fn window_samples(store: &SampleStore, metric: &str, scale: Scale) -> QueryResult<Vec<Sample>> {
    let Some(latest) = store.latest_timestamp()? else {
        return Ok(Vec::new());
    };
    let from = latest.saturating_sub(scale.secs());
    let samples = store.samples_in_range(metric, from, latest)?;
    debug!(
        %metric,
        scale = scale.as_str(),
        from,
        to = latest,
        count = samples.len(),
        "window scan"
    );
    Ok(samples)
}

/// Raw values for `metric` over the selected window, across all of its
/// identifiers, in ascending time order.
pub fn raw_series(
    store: &SampleStore,
    catalog: &MetricCatalog,
    metric: &str,
    scale: Scale,
) -> QueryResult<SeriesReport> {
    catalog
        .get(metric)
        .map_err(|_| QueryError::UnknownMetric(metric.to_string()))?;

    let samples = window_samples(store, metric, scale)?;
    let points: Vec<SeriesPoint> = samples.iter().filter_map(SeriesPoint::from_sample).collect();
    let stats = Stats::over(points.iter().map(|p| p.value));
    Ok(SeriesReport { points, stats })
}

/// Derived rates for `metric` over the selected window.
///
/// Samples are grouped by identifier before differencing, so consecutive
/// readings of two different interfaces are never paired. The surviving
/// points merge back into one ascending-time series for the response.
pub fn rate_report(
    store: &SampleStore,
    catalog: &MetricCatalog,
    metric: &str,
    scale: Scale,
) -> QueryResult<RateReport> {
    let def = catalog
        .get(metric)
        .map_err(|_| QueryError::UnknownMetric(metric.to_string()))?;

    let samples = window_samples(store, metric, scale)?;

    let mut by_oid: BTreeMap<&str, Vec<SeriesPoint>> = BTreeMap::new();
    for sample in &samples {
        if let Some(point) = SeriesPoint::from_counter_sample(sample) {
            by_oid.entry(sample.oid.as_str()).or_default().push(point);
        }
    }

    let mut points = Vec::new();
    for series in by_oid.values() {
        let rates = if def.strictly_positive {
            derive::rate_series(&derive::positive_samples(series), def.scale_factor)
        } else {
            derive::rate_series(series, def.scale_factor)
        };
        points.extend(rates);
    }
    points.sort_by_key(|p| p.timestamp);

    let stats = Stats::over(points.iter().map(|p| p.rate));
    Ok(RateReport { points, stats })
}
