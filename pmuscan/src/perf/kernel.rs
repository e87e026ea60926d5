//! `perf_event_open(2)` backed counters

#![allow(unsafe_code)] // perf_event_open has no libc wrapper

use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{FromRawFd, RawFd};

use log::debug;
use pmuscan_common::{CounterValue, PerfEventAttr, PERF_FLAG_FD_CLOEXEC};

use super::{Counter, CounterBackend};
use crate::domain::{CpuId, Tid};

/// Counter backend talking to the running kernel
#[derive(Debug, Default, Clone, Copy)]
pub struct KernelCounters;

/// Open perf event file descriptor, closed on drop
#[derive(Debug)]
pub struct PerfCounter {
    file: File,
}

impl Counter for PerfCounter {
    fn read_value(&self) -> io::Result<u64> {
        let mut buf = [0u8; std::mem::size_of::<CounterValue>()];
        (&self.file).read_exact(&mut buf)?;
        let mut value = [0u8; 8];
        value.copy_from_slice(&buf[..8]);
        Ok(u64::from_ne_bytes(value))
    }
}

fn perf_event_open(attr: &PerfEventAttr, pid: libc::pid_t, cpu: libc::c_int) -> io::Result<File> {
    let group_fd: libc::c_int = -1;
    // SAFETY: attr points to a live, correctly sized perf_event_attr for the
    // duration of the call; the kernel does not keep the pointer.
    let fd = unsafe {
        libc::syscall(
            libc::SYS_perf_event_open,
            std::ptr::from_ref(attr),
            pid,
            cpu,
            group_fd,
            PERF_FLAG_FD_CLOEXEC as libc::c_ulong,
        )
    };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    #[allow(clippy::cast_possible_truncation)]
    let fd = fd as RawFd;
    // SAFETY: the syscall returned a fresh descriptor that nothing else owns.
    Ok(unsafe { File::from_raw_fd(fd) })
}

impl CounterBackend for KernelCounters {
    fn open_counter(
        &self,
        attr: &PerfEventAttr,
        tid: Tid,
        cpu: Option<CpuId>,
        name: &str,
    ) -> io::Result<Box<dyn Counter>> {
        let raw_cpu = cpu.map_or(-1, CpuId::as_raw);
        match perf_event_open(attr, tid.as_raw(), raw_cpu) {
            Ok(file) => Ok(Box::new(PerfCounter { file })),
            Err(err) => {
                debug!(
                    "perf_event_open failed for {name} (type {}, config {:#x}) on {tid} cpu {raw_cpu}: {err}",
                    attr.type_, attr.config
                );
                Err(err)
            }
        }
    }
}
