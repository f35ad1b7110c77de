//! Device identity refresher.
//!
//! Reads the three identity objects (sysName, sysDescr, UCD total RAM) on a
//! slow cadence and publishes a [`DeviceSummary`] snapshot through a watch
//! channel. Readers borrow the latest snapshot without touching the wire.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use wirestat_snmp::{MetricReader, ReadValue, ReaderConfig, Target, read_with_retry};

use crate::poller::epoch_secs;

pub const SYS_DESCR_OID: &str = "1.3.6.1.2.1.1.1.0";
pub const SYS_NAME_OID: &str = "1.3.6.1.2.1.1.5.0";
/// UCD-SNMP memTotalReal, reported in KiB.
pub const MEM_TOTAL_REAL_OID: &str = "1.3.6.1.4.1.2021.4.6.0";

/// Reachability verdict from the last refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    /// At least one identity object answered.
    Clear,
    /// Every identity read failed.
    Unreachable,
    /// No refresh has completed yet.
    Unknown,
}

/// Point-in-time identity snapshot of the monitored device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSummary {
    pub ip_address: String,
    pub dns_name: String,
    pub description: String,
    pub status: DeviceStatus,
    pub device_type: String,
    pub vendor: String,
    pub category: String,
    /// Total real memory in MB, when the device exposes it.
    pub ram_mb: Option<f64>,
    pub monitored_via: String,
    /// Epoch seconds of the refresh that produced this snapshot.
    pub last_refresh: u64,
}

impl DeviceSummary {
    /// Snapshot published before the first refresh completes.
    pub fn placeholder(ip_address: &str) -> Self {
        Self {
            ip_address: ip_address.to_string(),
            dns_name: "N/A".to_string(),
            description: "N/A".to_string(),
            status: DeviceStatus::Unknown,
            device_type: "Unknown".to_string(),
            vendor: "Unknown".to_string(),
            category: "Unknown".to_string(),
            ram_mb: None,
            monitored_via: "SNMP".to_string(),
            last_refresh: 0,
        }
    }
}

/// Map a sysDescr string to (device type, vendor, category).
fn classify(description: &str) -> (&'static str, &'static str, &'static str) {
    if description.contains("Windows") {
        ("Windows Server", "Microsoft", "Server")
    } else if description.contains("Linux") {
        ("Linux Server", "net-snmp", "Server")
    } else {
        ("Unknown", "Unknown", "Unknown")
    }
}

/// Periodically rebuilds the device summary and publishes it.
pub struct SummaryRefresher<R: MetricReader> {
    reader: R,
    target: Target,
    interval: Duration,
    reader_config: ReaderConfig,
    tx: watch::Sender<DeviceSummary>,
}

impl<R: MetricReader> SummaryRefresher<R> {
    pub fn new(reader: R, target: Target, interval: Duration, reader_config: ReaderConfig) -> Self {
        let (tx, _rx) = watch::channel(DeviceSummary::placeholder(&target.host));
        Self {
            reader,
            target,
            interval,
            reader_config,
            tx,
        }
    }

    /// Hand out a receiver for the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<DeviceSummary> {
        self.tx.subscribe()
    }

    async fn read_text(&self, oid: &str) -> Option<String> {
        match read_with_retry(&self.reader, &self.target, oid, &self.reader_config).await {
            Ok(reading) => {
                let (text, _kind) = reading.value.into_parts();
                Some(text)
            }
            Err(err) => {
                debug!(%oid, error = %err, "identity read failed");
                None
            }
        }
    }

    async fn read_numeric(&self, oid: &str) -> Option<f64> {
        match read_with_retry(&self.reader, &self.target, oid, &self.reader_config).await {
            Ok(reading) => match reading.value {
                ReadValue::Counter(v) | ReadValue::Gauge(v) => Some(v),
                other => {
                    debug!(%oid, value = ?other, "identity object is not numeric");
                    None
                }
            },
            Err(err) => {
                debug!(%oid, error = %err, "identity read failed");
                None
            }
        }
    }

    /// Read the identity objects once and build a fresh snapshot.
    pub async fn refresh(&self) -> DeviceSummary {
        let dns_name = self.read_text(SYS_NAME_OID).await;
        let description = self.read_text(SYS_DESCR_OID).await;
        let ram_kb = self.read_numeric(MEM_TOTAL_REAL_OID).await;

        let status = if dns_name.is_none() && description.is_none() && ram_kb.is_none() {
            DeviceStatus::Unreachable
        } else {
            DeviceStatus::Clear
        };

        let description = description.unwrap_or_else(|| "N/A".to_string());
        let (device_type, vendor, category) = classify(&description);

        DeviceSummary {
            ip_address: self.target.host.clone(),
            dns_name: dns_name.unwrap_or_else(|| "N/A".to_string()),
            description,
            status,
            device_type: device_type.to_string(),
            vendor: vendor.to_string(),
            category: category.to_string(),
            ram_mb: ram_kb.map(|kb| kb / 1024.0),
            monitored_via: "SNMP".to_string(),
            last_refresh: epoch_secs(),
        }
    }

    /// Refresh immediately, then on the configured cadence, until shutdown.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            target = %self.target.source(),
            "summary refresher started"
        );

        loop {
            tokio::select! {
                summary = self.refresh() => {
                    if summary.status == DeviceStatus::Unreachable {
                        warn!(target = %self.target.source(), "device summary refresh found device unreachable");
                    }
                    self.tx.send_replace(summary);
                }
                _ = shutdown.changed() => {
                    info!("summary refresher shutting down, abandoning in-flight refresh");
                    break;
                }
            }
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.changed() => {
                    info!("summary refresher shutting down");
                    break;
                }
            }
        }
    }
}
