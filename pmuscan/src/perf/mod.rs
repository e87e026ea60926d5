//! Kernel counter access
//!
//! - [`CounterBackend`]: open a counter for (attr, thread, cpu) and read it
//! - [`KernelCounters`]: the `perf_event_open(2)` implementation
//! - [`features`]: boolean capability queries for `--show-features`
//!
//! The probe and listing layers only talk to the traits, so tests can swap in
//! a backend whose readings are scripted per cpu.

pub mod features;
pub mod kernel;

use std::io;

use pmuscan_common::{
    PerfEventAttr, ATTR_FLAG_COMM, ATTR_FLAG_FREQ, ATTR_FLAG_MMAP, ATTR_FLAG_SAMPLE_ID_ALL,
    DEFAULT_READ_FORMAT, DEFAULT_SAMPLE_FREQ, DEFAULT_SAMPLE_TYPE, PERF_TYPE_TRACEPOINT,
};

use crate::catalog::EventType;
use crate::domain::{CpuId, Tid};

pub use features::{FeatureProbe, KernelFeatures};
pub use kernel::KernelCounters;

/// An open counter
pub trait Counter {
    /// Accumulated event count
    ///
    /// # Errors
    /// Returns the OS error if the counter cannot be read
    fn read_value(&self) -> io::Result<u64>;
}

/// Opens counters
pub trait CounterBackend {
    /// Open a counter for `attr` on thread `tid`, restricted to `cpu` when given
    ///
    /// # Errors
    /// Returns the OS error when the kernel rejects the configuration
    fn open_counter(
        &self,
        attr: &PerfEventAttr,
        tid: Tid,
        cpu: Option<CpuId>,
        name: &str,
    ) -> io::Result<Box<dyn Counter>>;

    /// Can the calling thread open `attr` at all?
    fn is_attr_supported(&self, attr: &PerfEventAttr, name: &str) -> bool {
        self.open_counter(attr, Tid::current(), None, name).is_ok()
    }
}

/// Counting/sampling configuration used for every event pmuscan opens
///
/// Tracepoints sample every hit; everything else samples by frequency.
#[must_use]
pub fn default_attr(event: &EventType) -> PerfEventAttr {
    let mut attr = PerfEventAttr::new(event.perf_type, event.config);
    attr.read_format = DEFAULT_READ_FORMAT;
    attr.sample_type = DEFAULT_SAMPLE_TYPE;
    attr.set_flag(ATTR_FLAG_MMAP, true);
    attr.set_flag(ATTR_FLAG_COMM, true);
    attr.set_flag(ATTR_FLAG_SAMPLE_ID_ALL, true);
    if event.perf_type == PERF_TYPE_TRACEPOINT {
        attr.sample_period_or_freq = 1;
    } else {
        attr.set_flag(ATTR_FLAG_FREQ, true);
        attr.sample_period_or_freq = DEFAULT_SAMPLE_FREQ;
    }
    attr
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmuscan_common::{ATTR_FLAG_DISABLED, PERF_ATTR_SIZE_VER6, PERF_TYPE_RAW};

    #[test]
    fn test_default_attr_counts_immediately() {
        let attr = default_attr(&EventType::new("raw-cpu-cycles", PERF_TYPE_RAW, 0x11));
        assert_eq!(attr.size, PERF_ATTR_SIZE_VER6);
        assert_eq!(attr.type_, PERF_TYPE_RAW);
        assert_eq!(attr.config, 0x11);
        assert!(!attr.has_flag(ATTR_FLAG_DISABLED));
        assert!(attr.has_flag(ATTR_FLAG_FREQ));
        assert_eq!(attr.sample_period_or_freq, DEFAULT_SAMPLE_FREQ);
        assert_eq!(attr.read_format, DEFAULT_READ_FORMAT);
    }

    #[test]
    fn test_default_attr_tracepoint_period() {
        let attr = default_attr(&EventType::new("sched:sched_switch", PERF_TYPE_TRACEPOINT, 316));
        assert!(!attr.has_flag(ATTR_FLAG_FREQ));
        assert_eq!(attr.sample_period_or_freq, 1);
    }
}
