//! Probe worker pinned to one core
//!
//! The worker exists to give the tester a thread id it can open a counter
//! against. It pins itself, publishes its tid, waits for the go signal and
//! then does a little file I/O for the event to count.
//!
//! ```text
//!   tester                           worker
//!   ──────                           ──────
//!   spawn ─────────────────────────▶ pin to cpu
//!   wait_for_tid ◀────────────────── publish_tid
//!   open counter(tid, cpu)
//!   signal_start ──────────────────▶ wait_for_start returns
//!   join ◀────────────────────────── workload, exit
//! ```

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread;
use std::time::Duration;

use log::debug;
use nix::sched::{sched_setaffinity, CpuSet};
use nix::unistd::Pid;
use tempfile::NamedTempFile;

use crate::domain::{CpuId, Tid};

/// Poll interval for both one-shot flags
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Lines written by the workload
const WORKLOAD_LINES: usize = 10;

/// Marker for "worker has not published its tid yet"
const TID_UNKNOWN: u32 = 0;

/// State shared by one tester and one worker
#[derive(Debug)]
pub struct ProbeContext {
    cpu: CpuId,
    tid: AtomicU32,
    start: AtomicBool,
}

impl ProbeContext {
    #[must_use]
    pub fn new(cpu: CpuId) -> Self {
        Self { cpu, tid: AtomicU32::new(TID_UNKNOWN), start: AtomicBool::new(false) }
    }

    #[must_use]
    pub fn cpu(&self) -> CpuId {
        self.cpu
    }

    pub fn publish_tid(&self, tid: Tid) {
        self.tid.store(tid.0, Ordering::Release);
    }

    #[must_use]
    pub fn published_tid(&self) -> Option<Tid> {
        match self.tid.load(Ordering::Acquire) {
            TID_UNKNOWN => None,
            tid => Some(Tid(tid)),
        }
    }

    /// Poll until the worker has published its tid
    #[must_use]
    pub fn wait_for_tid(&self) -> Tid {
        loop {
            if let Some(tid) = self.published_tid() {
                return tid;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    pub fn signal_start(&self) {
        self.start.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.start.load(Ordering::Acquire)
    }

    /// Poll until the tester raises the start signal
    pub fn wait_for_start(&self) {
        while !self.is_started() {
            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Restrict the calling thread to a single cpu
///
/// # Errors
/// Returns the OS error, e.g. when the cpu is offline
pub fn pin_current_thread(cpu: CpuId) -> io::Result<()> {
    let mut mask = CpuSet::new();
    mask.set(cpu.0 as usize)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("{cpu} out of range")))?;
    // pid 0 is the calling thread
    sched_setaffinity(Pid::from_raw(0), &mask)?;
    Ok(())
}

/// Something for the counted event to observe
fn run_workload() -> io::Result<()> {
    let mut file = NamedTempFile::new()?;
    for _ in 0..WORKLOAD_LINES {
        writeln!(file, "output some data")?;
    }
    file.flush()
}

/// Body of the probe thread
///
/// A failed pin or workload is only logged: the tester sees a zero or
/// missing count and classifies accordingly.
pub fn run_worker(ctx: &ProbeContext) {
    if let Err(err) = pin_current_thread(ctx.cpu()) {
        debug!("Probe worker could not pin to {}: {err}", ctx.cpu());
    }
    ctx.publish_tid(Tid::current());
    ctx.wait_for_start();
    if let Err(err) = run_workload() {
        debug!("Probe workload on {} failed: {err}", ctx.cpu());
    }
}
