//! wirestat.toml configuration parser.
//!
//! Every section is optional; an empty file yields a working config that
//! polls the default device profile. CLI flags override file values in
//! `main`.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use wirestat_collector::{MetricCatalog, MetricDef, PollConfig};
use wirestat_snmp::{ReaderConfig, Target};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WirestatConfig {
    pub device: DeviceConfig,
    pub poll: PollSettings,
    pub store: StoreConfig,
    pub api: ApiConfig,
    #[serde(rename = "metric")]
    pub metrics: Vec<MetricEntry>,
}

/// The monitored device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub address: String,
    pub port: u16,
    pub community: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 161,
            community: "public".to_string(),
        }
    }
}

/// Poll cadence and per-read limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub interval_secs: u64,
    pub timeout_secs: u64,
    pub retries: u32,
    pub summary_interval_secs: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            timeout_secs: 5,
            retries: 3,
            summary_interval_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Sample database file. The parent directory is created on startup.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/var/lib/wirestat/samples.redb"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub listen: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

/// One `[[metric]]` table: either a single `oid`, or `base_oid` fanned out
/// over `instances` interface indexes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricEntry {
    pub name: String,
    pub oid: Option<String>,
    pub base_oid: Option<String>,
    pub instances: Option<u32>,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
    #[serde(default)]
    pub positive_only: bool,
}

fn default_scale_factor() -> f64 {
    1.0
}

impl MetricEntry {
    fn to_def(&self) -> anyhow::Result<MetricDef> {
        let mut def = match (&self.oid, &self.base_oid, self.instances) {
            (Some(oid), None, None) => MetricDef::scalar(&self.name, oid),
            (None, Some(base), Some(count)) => MetricDef::fan_out(&self.name, base, count),
            _ => anyhow::bail!(
                "metric {:?} must set either `oid` or `base_oid` with `instances`",
                self.name
            ),
        };
        def = def.with_scale_factor(self.scale_factor);
        if self.positive_only {
            def = def.with_positive_filter();
        }
        Ok(def)
    }
}

impl WirestatConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: WirestatConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Build the metric catalog, falling back to the default device profile
    /// when no `[[metric]]` tables are present.
    pub fn catalog(&self) -> anyhow::Result<MetricCatalog> {
        if self.metrics.is_empty() {
            return Ok(MetricCatalog::default_device());
        }
        let defs = self
            .metrics
            .iter()
            .map(MetricEntry::to_def)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(MetricCatalog::build(defs)?)
    }

    pub fn target(&self) -> Target {
        Target::new(
            self.device.address.as_str(),
            self.device.port,
            self.device.community.as_str(),
        )
    }

    pub fn reader_config(&self) -> ReaderConfig {
        ReaderConfig {
            timeout: Duration::from_secs(self.poll.timeout_secs),
            retries: self.poll.retries,
        }
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(self.poll.interval_secs),
            reader: self.reader_config(),
        }
    }

    pub fn summary_interval(&self) -> Duration {
        Duration::from_secs(self.poll.summary_interval_secs)
    }
}
