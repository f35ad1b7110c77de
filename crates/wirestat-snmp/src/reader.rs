//! Reader trait, value taxonomy, and the deadline/retry wrapper.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use wirestat_store::ValueKind;

/// Device to poll, with the community string presented on each request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub community: String,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16, community: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            community: community.into(),
        }
    }

    /// Source tag recorded on every sample, as `ip:port`.
    pub fn source(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A value as the device reports it, tagged with the device's own typing.
///
/// The tag survives into storage (see [`ValueKind`]) so the query path can
/// reject non-numeric readings by matching instead of guessing.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadValue {
    /// Monotonically increasing count (Counter32/64, TimeTicks).
    Counter(f64),
    /// Point-in-time numeric reading (Gauge32, Integer).
    Gauge(f64),
    /// Printable string (OctetString).
    Text(String),
    /// Unrecognized type, carried as its textual rendering.
    Unknown(String),
}

impl ReadValue {
    /// Text encoding plus kind tag, the form samples are persisted in.
    pub fn into_parts(self) -> (String, ValueKind) {
        match self {
            ReadValue::Counter(v) => (v.to_string(), ValueKind::Counter),
            ReadValue::Gauge(v) => (v.to_string(), ValueKind::Gauge),
            ReadValue::Text(s) => (s, ValueKind::Text),
            ReadValue::Unknown(s) => (s, ValueKind::Unknown),
        }
    }
}

/// One successful resolution of one oid.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// The oid the device actually answered for.
    pub oid: String,
    pub value: ReadValue,
}

/// Ways a single read can fail.
///
/// The collector's skip policy matches on these: a failing oid is logged and
/// skipped for the tick, nothing else.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReadError {
    /// No response within the configured deadline.
    #[error("read timed out")]
    Timeout,

    /// The device answered but does not expose the requested object.
    #[error("no such object: {oid}")]
    NoSuchObject { oid: String },

    /// The device answered with a protocol-level error status.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The request could not be sent or the reply never arrived intact.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Per-attempt deadline and retry budget for one read.
#[derive(Debug, Clone, Copy)]
pub struct ReaderConfig {
    pub timeout: Duration,
    /// Extra attempts after the first.
    pub retries: u32,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            retries: 3,
        }
    }
}

/// One-oid-at-a-time read capability against a single device.
pub trait MetricReader: Send + Sync {
    /// Read one object from the target.
    fn read(
        &self,
        target: &Target,
        oid: &str,
    ) -> impl Future<Output = Result<Reading, ReadError>> + Send;
}

impl<R: MetricReader> MetricReader for std::sync::Arc<R> {
    fn read(
        &self,
        target: &Target,
        oid: &str,
    ) -> impl Future<Output = Result<Reading, ReadError>> + Send {
        (**self).read(target, oid)
    }
}

/// Read one oid with a per-attempt deadline and bounded retries.
///
/// `Timeout` and `Transport` failures are retried; `NoSuchObject` and
/// `Protocol` are definitive answers from the device and fail immediately.
pub async fn read_with_retry<R: MetricReader>(
    reader: &R,
    target: &Target,
    oid: &str,
    config: &ReaderConfig,
) -> Result<Reading, ReadError> {
    let mut last = ReadError::Timeout;
    for attempt in 0..=config.retries {
        let result = match tokio::time::timeout(config.timeout, reader.read(target, oid)).await {
            Ok(inner) => inner,
            Err(_) => Err(ReadError::Timeout),
        };
        match result {
            Ok(reading) => return Ok(reading),
            Err(definitive @ (ReadError::NoSuchObject { .. } | ReadError::Protocol(_))) => {
                return Err(definitive);
            }
            Err(e) => {
                debug!(oid, attempt, error = %e, "read attempt failed");
                last = e;
            }
        }
    }
    Err(last)
}
