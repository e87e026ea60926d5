//! Single-core event support test
//!
//! The kernel may accept a raw event code it has no hardware for and count
//! nothing, so a successful `perf_event_open` proves little. An event counts
//! as supported on a core only when a counter pinned there reads non-zero
//! after the worker's workload.

use std::io;
use std::thread;

use log::{debug, warn};

use super::worker::{run_worker, ProbeContext};
use crate::catalog::EventType;
use crate::domain::CpuId;
use crate::perf::{default_attr, CounterBackend};

/// Outcome of probing one event on one core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    /// Counter read non-zero
    Supported,
    /// Counter read zero: the event may not exist, or never fired
    MaySupported,
    /// Counter could not be opened or read
    Unsupported,
}

/// Fold a counter reading into a [`Support`] verdict
#[must_use]
pub fn classify(reading: &io::Result<u64>) -> Support {
    match reading {
        Ok(0) => Support::MaySupported,
        Ok(_) => Support::Supported,
        Err(_) => Support::Unsupported,
    }
}

/// Runs one probe worker per test against a counter backend
pub struct SupportTester<'a> {
    counters: &'a dyn CounterBackend,
}

impl<'a> SupportTester<'a> {
    #[must_use]
    pub fn new(counters: &'a dyn CounterBackend) -> Self {
        Self { counters }
    }

    /// Probe `event` on `cpu`
    ///
    /// Never fails: every error path ends in [`Support::Unsupported`].
    /// Blocks for one worker lifetime.
    #[must_use]
    pub fn test_on_cpu(&self, event: &EventType, cpu: CpuId) -> Support {
        let ctx = ProbeContext::new(cpu);
        let reading = thread::scope(|s| {
            let worker = thread::Builder::new()
                .name(format!("pmuscan-probe-{}", cpu.0))
                .spawn_scoped(s, || run_worker(&ctx))?;

            let tid = ctx.wait_for_tid();
            let attr = default_attr(event);
            let counter = self.counters.open_counter(&attr, tid, Some(cpu), &event.name);

            // Counter is live (or failed) before the workload may run
            ctx.signal_start();
            if worker.join().is_err() {
                warn!("Probe worker for {} on {cpu} panicked", event.name);
            }

            counter?.read_value()
        });

        if let Err(err) = &reading {
            debug!("{} on {cpu}: unsupported ({err})", event.name);
        }
        classify(&reading)
    }
}
