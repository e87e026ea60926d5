//! Feature queries reported by `--show-features`
//!
//! Each query opens a throwaway counter on the calling thread with the
//! attribute combination the feature depends on; the kernel's answer is the
//! result.

use std::path::PathBuf;

use pmuscan_common::{
    ATTR_FLAG_EXCLUDE_CALLCHAIN_USER, ATTR_FLAG_USE_CLOCKID, PERF_COUNT_SW_CPU_CLOCK,
    PERF_SAMPLE_CALLCHAIN, PERF_SAMPLE_REGS_USER, PERF_SAMPLE_STACK_USER, PERF_TYPE_SOFTWARE,
    PERF_TYPE_TRACEPOINT,
};

use super::{default_attr, CounterBackend};
use crate::catalog::{sysfs, EventType};

/// Bytes of user stack requested when testing dwarf call graphs
const DWARF_STACK_DUMP_SIZE: u32 = 8192;

/// Boolean capability queries
pub trait FeatureProbe {
    fn dwarf_call_graph_supported(&self) -> bool;
    fn trace_offcpu_supported(&self) -> bool;
    fn set_clockid_supported(&self) -> bool;
}

/// User register mask covering the general purpose registers of this target
#[must_use]
pub fn user_regs_mask() -> Option<u64> {
    if cfg!(target_arch = "x86_64") {
        // AX..GS plus R8..R15, without the segment registers 64-bit rejects
        Some(((1u64 << 24) - 1) & !(0xf << 12))
    } else if cfg!(target_arch = "x86") {
        Some((1u64 << 16) - 1)
    } else if cfg!(target_arch = "aarch64") {
        Some((1u64 << 33) - 1)
    } else if cfg!(target_arch = "arm") {
        Some((1u64 << 16) - 1)
    } else if cfg!(target_arch = "riscv64") {
        Some((1u64 << 32) - 1)
    } else {
        None
    }
}

/// Feature queries answered by the running kernel
pub struct KernelFeatures<'a> {
    counters: &'a dyn CounterBackend,
    tracefs: Option<PathBuf>,
}

impl<'a> KernelFeatures<'a> {
    #[must_use]
    pub fn new(counters: &'a dyn CounterBackend, tracefs: Option<PathBuf>) -> Self {
        Self { counters, tracefs }
    }

    fn cpu_clock() -> EventType {
        EventType::new("cpu-clock", PERF_TYPE_SOFTWARE, PERF_COUNT_SW_CPU_CLOCK)
    }
}

impl FeatureProbe for KernelFeatures<'_> {
    fn dwarf_call_graph_supported(&self) -> bool {
        let Some(regs) = user_regs_mask() else {
            return false;
        };
        let mut attr = default_attr(&Self::cpu_clock());
        attr.sample_type |= PERF_SAMPLE_CALLCHAIN | PERF_SAMPLE_REGS_USER | PERF_SAMPLE_STACK_USER;
        attr.set_flag(ATTR_FLAG_EXCLUDE_CALLCHAIN_USER, true);
        attr.sample_regs_user = regs;
        attr.sample_stack_user = DWARF_STACK_DUMP_SIZE;
        self.counters.is_attr_supported(&attr, "cpu-clock")
    }

    fn trace_offcpu_supported(&self) -> bool {
        let (Some(regs), Some(tracefs)) = (user_regs_mask(), self.tracefs.as_deref()) else {
            return false;
        };
        let Some(id) = sysfs::tracepoint_id(tracefs, "sched", "sched_switch") else {
            return false;
        };
        let mut attr = default_attr(&EventType::new("sched:sched_switch", PERF_TYPE_TRACEPOINT, id));
        attr.sample_type |= PERF_SAMPLE_REGS_USER;
        attr.sample_regs_user = regs;
        self.counters.is_attr_supported(&attr, "sched:sched_switch")
    }

    fn set_clockid_supported(&self) -> bool {
        let mut attr = default_attr(&Self::cpu_clock());
        attr.set_flag(ATTR_FLAG_USE_CLOCKID, true);
        attr.clockid = libc::CLOCK_MONOTONIC;
        self.counters.is_attr_supported(&attr, "cpu-clock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CpuId, Tid};
    use crate::perf::Counter;
    use pmuscan_common::PerfEventAttr;
    use std::cell::RefCell;
    use std::io;

    /// Accepts everything and remembers what it was asked
    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<PerfEventAttr>>,
    }

    struct Zero;

    impl Counter for Zero {
        fn read_value(&self) -> io::Result<u64> {
            Ok(0)
        }
    }

    impl CounterBackend for Recorder {
        fn open_counter(
            &self,
            attr: &PerfEventAttr,
            _tid: Tid,
            _cpu: Option<CpuId>,
            _name: &str,
        ) -> io::Result<Box<dyn Counter>> {
            self.seen.borrow_mut().push(*attr);
            Ok(Box::new(Zero))
        }
    }

    #[test]
    fn test_set_clockid_requests_monotonic_clock() {
        let backend = Recorder::default();
        let features = KernelFeatures::new(&backend, None);
        assert!(features.set_clockid_supported());
        let seen = backend.seen.borrow();
        assert!(seen[0].has_flag(ATTR_FLAG_USE_CLOCKID));
        assert_eq!(seen[0].clockid, libc::CLOCK_MONOTONIC);
    }

    #[test]
    fn test_trace_offcpu_needs_tracefs() {
        let backend = Recorder::default();
        let features = KernelFeatures::new(&backend, None);
        assert!(!features.trace_offcpu_supported());
        assert!(backend.seen.borrow().is_empty());
    }

    #[test]
    fn test_trace_offcpu_uses_sched_switch_id() {
        let tracefs = tempfile::tempdir().unwrap();
        let dir = tracefs.path().join("events/sched/sched_switch");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("id"), "316\n").unwrap();

        let backend = Recorder::default();
        let features = KernelFeatures::new(&backend, Some(tracefs.path().to_path_buf()));
        assert_eq!(features.trace_offcpu_supported(), user_regs_mask().is_some());
        if user_regs_mask().is_some() {
            let seen = backend.seen.borrow();
            assert_eq!(seen[0].type_, PERF_TYPE_TRACEPOINT);
            assert_eq!(seen[0].config, 316);
        }
    }

    #[test]
    fn test_dwarf_requests_stack_dump() {
        let backend = Recorder::default();
        let features = KernelFeatures::new(&backend, None);
        if !features.dwarf_call_graph_supported() {
            return;
        }
        let seen = backend.seen.borrow();
        assert_eq!(seen[0].sample_stack_user, DWARF_STACK_DUMP_SIZE);
        assert_ne!(seen[0].sample_type & PERF_SAMPLE_STACK_USER, 0);
    }
}
