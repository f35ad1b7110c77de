//! The poll loop — one tick reads every catalog oid and appends samples.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use wirestat_snmp::{MetricReader, ReadError, ReaderConfig, Target, read_with_retry};
use wirestat_store::{Sample, SampleStore};

use crate::catalog::MetricCatalog;

/// Cadence and per-read limits for the collector.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Pause between the end of one tick and the start of the next.
    pub interval: Duration,
    /// Deadline and retry budget applied to each oid read.
    pub reader: ReaderConfig,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            reader: ReaderConfig::default(),
        }
    }
}

/// Outcome counts for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Samples appended to the store.
    pub recorded: u32,
    /// Readings lost to read or write failures.
    pub skipped: u32,
}

/// Polls one device's catalog on a fixed cadence and appends the readings.
pub struct Collector<R: MetricReader> {
    store: SampleStore,
    reader: R,
    target: Target,
    catalog: Arc<MetricCatalog>,
    config: PollConfig,
}

impl<R: MetricReader> Collector<R> {
    pub fn new(
        store: SampleStore,
        reader: R,
        target: Target,
        catalog: Arc<MetricCatalog>,
        config: PollConfig,
    ) -> Self {
        Self {
            store,
            reader,
            target,
            catalog,
            config,
        }
    }

    /// Poll every oid of every catalog metric once.
    ///
    /// Failures stay contained to their (metric, oid) pair: a failed read or
    /// a failed batch write is logged and skipped, everything else proceeds.
    pub async fn tick(&self) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        let source = self.target.source();

        for def in self.catalog.metrics() {
            let mut batch = Vec::with_capacity(def.oids.len());
            for oid in &def.oids {
                match read_with_retry(&self.reader, &self.target, oid, &self.config.reader).await {
                    Ok(reading) => {
                        let (value, kind) = reading.value.into_parts();
                        batch.push(Sample {
                            metric_name: def.name.clone(),
                            oid: reading.oid,
                            value,
                            kind,
                            source: source.clone(),
                            timestamp: epoch_secs(),
                        });
                    }
                    Err(ReadError::Timeout) => {
                        outcome.skipped += 1;
                        warn!(metric = %def.name, %oid, "read timed out, skipping");
                    }
                    Err(err @ ReadError::NoSuchObject { .. }) => {
                        outcome.skipped += 1;
                        debug!(metric = %def.name, %oid, error = %err, "object absent, skipping");
                    }
                    Err(err) => {
                        outcome.skipped += 1;
                        warn!(metric = %def.name, %oid, error = %err, "read failed, skipping");
                    }
                }
            }
            match self.store.append_batch(&batch) {
                Ok(written) => outcome.recorded += written,
                Err(err) => {
                    outcome.skipped += batch.len() as u32;
                    warn!(metric = %def.name, error = %err, "store write failed, tick continues");
                }
            }
        }

        debug!(
            recorded = outcome.recorded,
            skipped = outcome.skipped,
            "poll tick finished"
        );
        outcome
    }

    /// Run tick/sleep until the shutdown signal flips.
    ///
    /// The first tick runs immediately. Both the in-flight tick and the
    /// sleep race the signal, so cancellation lands within one read
    /// deadline rather than one interval.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            target = %self.target.source(),
            metric_groups = self.catalog.len(),
            "collector started"
        );

        loop {
            tokio::select! {
                outcome = self.tick() => {
                    if outcome.skipped > 0 {
                        info!(
                            recorded = outcome.recorded,
                            skipped = outcome.skipped,
                            "poll tick had skipped readings"
                        );
                    }
                }
                _ = shutdown.changed() => {
                    info!("collector shutting down, abandoning in-flight poll");
                    break;
                }
            }
            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                _ = shutdown.changed() => {
                    info!("collector shutting down");
                    break;
                }
            }
        }
    }
}

pub(crate) fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MetricDef;
    use wirestat_snmp::SimulatedAgent;
    use wirestat_store::ValueKind;

    fn target() -> Target {
        Target::new("192.0.2.10", 161, "public")
    }

    fn small_catalog() -> Arc<MetricCatalog> {
        Arc::new(
            MetricCatalog::build(vec![
                MetricDef::fan_out("Bandwidth In", "1.3.6.1.2.1.2.2.1.10", 3)
                    .with_scale_factor(8.0)
                    .with_positive_filter(),
                MetricDef::scalar("System Uptime", "1.3.6.1.2.1.1.3.0"),
                MetricDef::scalar("TCP Connections", "1.3.6.1.2.1.6.9.0"),
            ])
            .unwrap(),
        )
    }

    fn fast_config() -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(10),
            reader: ReaderConfig {
                timeout: Duration::from_millis(20),
                retries: 0,
            },
        }
    }

    fn wired_agent() -> SimulatedAgent {
        let agent = SimulatedAgent::with_manual_clock();
        for i in 1..=3 {
            agent.set_counter(&format!("1.3.6.1.2.1.2.2.1.10.{i}"), 1000.0 * i as f64, 0.0);
        }
        agent.set_counter("1.3.6.1.2.1.1.3.0", 4500.0, 0.0);
        agent.set_gauge("1.3.6.1.2.1.6.9.0", 12.0);
        agent
    }

    #[tokio::test]
    async fn tick_records_one_sample_per_oid() {
        let store = SampleStore::open_in_memory().unwrap();
        let collector = Collector::new(
            store.clone(),
            wired_agent(),
            target(),
            small_catalog(),
            fast_config(),
        );

        let outcome = collector.tick().await;
        assert_eq!(outcome, TickOutcome { recorded: 5, skipped: 0 });
        assert_eq!(store.count_samples("Bandwidth In").unwrap(), 3);
        assert_eq!(store.count_samples("System Uptime").unwrap(), 1);
        assert_eq!(store.count_samples("TCP Connections").unwrap(), 1);
    }

    #[tokio::test]
    async fn samples_carry_source_and_value_typing() {
        let store = SampleStore::open_in_memory().unwrap();
        let collector = Collector::new(
            store.clone(),
            wired_agent(),
            target(),
            small_catalog(),
            fast_config(),
        );

        collector.tick().await;

        let bandwidth = store.samples_in_range("Bandwidth In", 0, u64::MAX / 2).unwrap();
        assert!(bandwidth.iter().all(|s| s.kind == ValueKind::Counter));
        assert!(bandwidth.iter().all(|s| s.source == "192.0.2.10:161"));
        assert_eq!(bandwidth[0].value, "1000");

        let tcp = store.samples_in_range("TCP Connections", 0, u64::MAX / 2).unwrap();
        assert_eq!(tcp[0].kind, ValueKind::Gauge);
        assert_eq!(tcp[0].value, "12");
    }

    #[tokio::test]
    async fn failing_oid_does_not_poison_the_tick() {
        let agent = wired_agent();
        agent.fail_with(
            "1.3.6.1.2.1.2.2.1.10.2",
            ReadError::Protocol("genErr".into()),
        );

        let store = SampleStore::open_in_memory().unwrap();
        let collector = Collector::new(
            store.clone(),
            agent,
            target(),
            small_catalog(),
            fast_config(),
        );

        let outcome = collector.tick().await;
        assert_eq!(outcome, TickOutcome { recorded: 4, skipped: 1 });
        // The two healthy interfaces and both scalars still landed.
        assert_eq!(store.count_samples("Bandwidth In").unwrap(), 2);
        assert_eq!(store.count_samples("System Uptime").unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_object_is_skipped_quietly() {
        let agent = wired_agent();
        agent.remove_oid("1.3.6.1.2.1.6.9.0");

        let store = SampleStore::open_in_memory().unwrap();
        let collector = Collector::new(
            store.clone(),
            agent,
            target(),
            small_catalog(),
            fast_config(),
        );

        let outcome = collector.tick().await;
        assert_eq!(outcome, TickOutcome { recorded: 4, skipped: 1 });
        assert_eq!(store.count_samples("TCP Connections").unwrap(), 0);
    }

    #[tokio::test]
    async fn timed_out_oid_is_skipped_after_deadline() {
        let agent = wired_agent();
        agent.stall("1.3.6.1.2.1.1.3.0");

        let store = SampleStore::open_in_memory().unwrap();
        let collector = Collector::new(
            store.clone(),
            agent,
            target(),
            small_catalog(),
            fast_config(),
        );

        let outcome = collector.tick().await;
        assert_eq!(outcome, TickOutcome { recorded: 4, skipped: 1 });
    }

    #[tokio::test]
    async fn consecutive_ticks_append() {
        let store = SampleStore::open_in_memory().unwrap();
        let agent = wired_agent();
        let collector = Collector::new(
            store.clone(),
            agent,
            target(),
            small_catalog(),
            fast_config(),
        );

        collector.tick().await;
        // Distinct wall-clock seconds keep the second tick's keys distinct.
        tokio::time::sleep(Duration::from_millis(1100)).await;
        collector.tick().await;

        assert_eq!(store.count_samples("System Uptime").unwrap(), 2);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_signal() {
        let store = SampleStore::open_in_memory().unwrap();
        let collector = Collector::new(
            store.clone(),
            wired_agent(),
            target(),
            small_catalog(),
            fast_config(),
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move { collector.run(shutdown_rx).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("collector should stop promptly")
            .unwrap();
        assert!(store.count_samples("System Uptime").unwrap() >= 1);
    }

    #[tokio::test]
    async fn shutdown_interrupts_inflight_tick() {
        let agent = wired_agent();
        agent.stall("1.3.6.1.2.1.1.3.0");

        let store = SampleStore::open_in_memory().unwrap();
        let config = PollConfig {
            interval: Duration::from_secs(600),
            // Deadline long enough that only the shutdown signal can end
            // the tick within the test budget.
            reader: ReaderConfig {
                timeout: Duration::from_secs(30),
                retries: 0,
            },
        };
        let collector = Collector::new(store, agent, target(), small_catalog(), config);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move { collector.run(shutdown_rx).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("in-flight tick should be abandoned")
            .unwrap();
    }
}
