//! Lazily computed host capabilities
//!
//! Each answer is computed on first use and then fixed for the lifetime of
//! the owning [`Capabilities`]. A fresh instance starts from scratch, which
//! keeps tests independent of each other.

#![allow(unsafe_code)] // uname() requires unsafe

use std::cell::OnceCell;
use std::ffi::CStr;
use std::path::Path;

use log::debug;
use pmuscan_common::ATTR_FLAG_EXCLUDE_KERNEL;

use crate::catalog::EventCatalog;
use crate::domain::{Arch, Tid};
use crate::perf::{default_attr, CounterBackend};

#[derive(Debug, Default)]
pub struct Capabilities {
    in_native_abi: OnceCell<bool>,
    has_hardware_counter: OnceCell<bool>,
    has_pmu_counter: OnceCell<bool>,
    has_tracepoint_events: OnceCell<bool>,
}

/// `uname -m`
fn machine_name() -> Option<String> {
    // SAFETY: utsname is plain data and uname fills it with NUL-terminated strings.
    unsafe {
        let mut uts: libc::utsname = std::mem::zeroed();
        if libc::uname(&mut uts) != 0 {
            return None;
        }
        Some(CStr::from_ptr(uts.machine.as_ptr()).to_string_lossy().into_owned())
    }
}

/// Open `instructions` on this thread and check it counts something
fn has_nonzero_instruction_count(catalog: &dyn EventCatalog, counters: &dyn CounterBackend) -> bool {
    let Some(event) = catalog.find_by_name("instructions") else {
        return false;
    };
    let attr = default_attr(&event);
    let Ok(counter) = counters.open_counter(&attr, Tid::current(), None, &event.name) else {
        return false;
    };
    let mut acc = 0u64;
    for i in 0..100_000u64 {
        acc = acc.wrapping_add(std::hint::black_box(i));
    }
    std::hint::black_box(acc);
    counter.read_value().is_ok_and(|value| value != 0)
}

impl Capabilities {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Is the kernel's machine the architecture this binary was built for?
    ///
    /// False when running under a binary translator (e.g. x86 code on arm).
    pub fn in_native_abi(&self) -> bool {
        *self.in_native_abi.get_or_init(|| {
            let native = machine_name().map_or(true, |m| Arch::current().matches_machine(&m));
            debug!("native abi: {native}");
            native
        })
    }

    /// Can hardware counters be used at all?
    ///
    /// VMs and emulators (likely on x86, or under translation) often have no
    /// PMU, so cpu-cycles is tried directly. On 32-bit arm the PMU may be
    /// present but gated off by the debug signal, which shows up as a zero
    /// instruction count.
    pub fn has_hardware_counter(
        &self,
        catalog: &dyn EventCatalog,
        counters: &dyn CounterBackend,
    ) -> bool {
        *self.has_hardware_counter.get_or_init(|| {
            let has = if Arch::current() == Arch::X86 || !self.in_native_abi() {
                catalog.find_by_name("cpu-cycles").is_some_and(|event| {
                    let mut attr = default_attr(&event);
                    attr.set_flag(ATTR_FLAG_EXCLUDE_KERNEL, true);
                    counters.is_attr_supported(&attr, &event.name)
                })
            } else if cfg!(target_arch = "arm") {
                has_nonzero_instruction_count(catalog, counters)
            } else {
                true
            };
            debug!("hardware counters: {has}");
            has
        })
    }

    /// Does the catalog contain any PMU-exported event?
    pub fn has_pmu_counter(&self, catalog: &dyn EventCatalog) -> bool {
        *self.has_pmu_counter.get_or_init(|| {
            let mut found = false;
            catalog.for_each_event(&mut |event| {
                found = event.is_pmu_event();
                !found
            });
            found
        })
    }

    /// Is tracefs mounted with an events directory?
    pub fn has_tracepoint_events(&self, tracefs: Option<&Path>) -> bool {
        *self
            .has_tracepoint_events
            .get_or_init(|| tracefs.is_some_and(|dir| dir.join("events").is_dir()))
    }
}
