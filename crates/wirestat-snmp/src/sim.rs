//! Deterministic in-process device for tests and `wirestatd --simulate`.
//!
//! The agent answers reads instantly from a table of per-oid behaviors.
//! Counters advance against a clock: wall time in the daemon's simulate
//! mode, a manually advanced clock in tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::reader::{MetricReader, ReadError, ReadValue, Reading, Target};

/// Behavior of one oid on the simulated device.
#[derive(Debug, Clone)]
enum OidBehavior {
    /// `base + rate * elapsed_secs`, wrapped at `wrap_at` when set.
    Counter {
        base: f64,
        rate: f64,
        wrap_at: Option<f64>,
    },
    Gauge(f64),
    Text(String),
    /// Every read fails with this error.
    Failing(ReadError),
    /// Every read outlasts any sane deadline.
    Stalled,
}

enum SimClock {
    Wall(Instant),
    Manual(Mutex<f64>),
}

impl SimClock {
    fn now_secs(&self) -> f64 {
        match self {
            SimClock::Wall(start) => start.elapsed().as_secs_f64(),
            SimClock::Manual(secs) => *lock(secs),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-process device agent with scriptable per-oid behaviors.
pub struct SimulatedAgent {
    oids: Mutex<HashMap<String, OidBehavior>>,
    /// Per-oid budget of injected failures consumed before the base behavior.
    transient: Mutex<HashMap<String, (u32, ReadError)>>,
    reads: Mutex<HashMap<String, u32>>,
    clock: SimClock,
}

impl SimulatedAgent {
    /// Empty device whose counters advance with wall time.
    pub fn new() -> Self {
        Self {
            oids: Mutex::new(HashMap::new()),
            transient: Mutex::new(HashMap::new()),
            reads: Mutex::new(HashMap::new()),
            clock: SimClock::Wall(Instant::now()),
        }
    }

    /// Empty device whose clock only moves via [`advance_secs`](Self::advance_secs).
    pub fn with_manual_clock() -> Self {
        Self {
            oids: Mutex::new(HashMap::new()),
            transient: Mutex::new(HashMap::new()),
            reads: Mutex::new(HashMap::new()),
            clock: SimClock::Manual(Mutex::new(0.0)),
        }
    }

    /// Ten-interface device with the oid layout the default catalog polls.
    ///
    /// Interfaces 1 and 2 carry traffic; the rest sit idle at zero so the
    /// strictly-positive filtering on bandwidth series has something to drop.
    pub fn default_device() -> Self {
        let agent = Self::new();
        for i in 1..=10u32 {
            // Octet rates in bytes per second.
            let (in_rate, out_rate) = match i {
                1 => (150_000.0, 40_000.0),
                2 => (12_500.0, 6_000.0),
                _ => (0.0, 0.0),
            };
            agent.set_counter(&format!("1.3.6.1.2.1.2.2.1.10.{i}"), 0.0, in_rate);
            agent.set_counter(&format!("1.3.6.1.2.1.2.2.1.16.{i}"), 0.0, out_rate);
            agent.set_counter(&format!("1.3.6.1.2.1.2.2.1.14.{i}"), 0.0, 0.0);
            agent.set_counter(&format!("1.3.6.1.2.1.2.2.1.20.{i}"), 0.0, 0.0);
        }
        // TimeTicks run at 100 per second.
        agent.set_counter("1.3.6.1.2.1.1.3.0", 0.0, 100.0);
        agent.set_counter("1.3.6.1.2.1.4.3.0", 0.0, 120.0);
        agent.set_counter("1.3.6.1.2.1.7.4.0", 0.0, 45.0);
        agent.set_gauge("1.3.6.1.2.1.6.9.0", 12.0);
        agent.set_counter("1.3.6.1.2.1.4.5.0", 0.0, 0.0);
        agent.set_text("1.3.6.1.2.1.1.5.0", "sim-device");
        agent.set_text(
            "1.3.6.1.2.1.1.1.0",
            "Linux sim-device 6.1.0-sim #1 SMP x86_64",
        );
        // UCD memTotalReal, in KiB.
        agent.set_gauge("1.3.6.1.4.1.2021.4.6.0", 16_384_000.0);
        agent
    }

    /// Advance the manual clock. No effect on a wall-clock agent.
    pub fn advance_secs(&self, secs: f64) {
        if let SimClock::Manual(clock) = &self.clock {
            *lock(clock) += secs;
        }
    }

    pub fn set_counter(&self, oid: &str, base: f64, rate: f64) {
        lock(&self.oids).insert(
            oid.to_string(),
            OidBehavior::Counter {
                base,
                rate,
                wrap_at: None,
            },
        );
    }

    /// Counter that wraps back past zero at `wrap_at`, like a 32-bit octet
    /// counter on a busy link.
    pub fn set_counter_wrapping(&self, oid: &str, base: f64, rate: f64, wrap_at: f64) {
        lock(&self.oids).insert(
            oid.to_string(),
            OidBehavior::Counter {
                base,
                rate,
                wrap_at: Some(wrap_at),
            },
        );
    }

    pub fn set_gauge(&self, oid: &str, value: f64) {
        lock(&self.oids).insert(oid.to_string(), OidBehavior::Gauge(value));
    }

    pub fn set_text(&self, oid: &str, text: &str) {
        lock(&self.oids).insert(oid.to_string(), OidBehavior::Text(text.to_string()));
    }

    /// Every future read of `oid` fails with `err`.
    pub fn fail_with(&self, oid: &str, err: ReadError) {
        lock(&self.oids).insert(oid.to_string(), OidBehavior::Failing(err));
    }

    /// Every future read of `oid` hangs until the caller's deadline fires.
    pub fn stall(&self, oid: &str) {
        lock(&self.oids).insert(oid.to_string(), OidBehavior::Stalled);
    }

    /// The next `count` reads of `oid` fail with `err`, then the configured
    /// behavior resumes.
    pub fn fail_next_reads(&self, oid: &str, count: u32, err: ReadError) {
        lock(&self.transient).insert(oid.to_string(), (count, err));
    }

    pub fn remove_oid(&self, oid: &str) {
        lock(&self.oids).remove(oid);
    }

    /// How many reads `oid` has served (successful or not).
    pub fn read_count(&self, oid: &str) -> u32 {
        lock(&self.reads).get(oid).copied().unwrap_or(0)
    }
}

impl Default for SimulatedAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricReader for SimulatedAgent {
    async fn read(&self, _target: &Target, oid: &str) -> Result<Reading, ReadError> {
        *lock(&self.reads).entry(oid.to_string()).or_insert(0) += 1;

        {
            let mut transient = lock(&self.transient);
            if let Some(entry) = transient.get_mut(oid)
                && entry.0 > 0
            {
                entry.0 -= 1;
                let err = entry.1.clone();
                if entry.0 == 0 {
                    transient.remove(oid);
                }
                return Err(err);
            }
        }

        let behavior = lock(&self.oids).get(oid).cloned();
        match behavior {
            None => Err(ReadError::NoSuchObject {
                oid: oid.to_string(),
            }),
            Some(OidBehavior::Counter {
                base,
                rate,
                wrap_at,
            }) => {
                let mut value = base + rate * self.clock.now_secs();
                if let Some(wrap) = wrap_at {
                    value %= wrap;
                }
                Ok(Reading {
                    oid: oid.to_string(),
                    value: ReadValue::Counter(value.floor()),
                })
            }
            Some(OidBehavior::Gauge(value)) => Ok(Reading {
                oid: oid.to_string(),
                value: ReadValue::Gauge(value),
            }),
            Some(OidBehavior::Text(text)) => Ok(Reading {
                oid: oid.to_string(),
                value: ReadValue::Text(text),
            }),
            Some(OidBehavior::Failing(err)) => Err(err),
            Some(OidBehavior::Stalled) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ReadError::Timeout)
            }
        }
    }
}
