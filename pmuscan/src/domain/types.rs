//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep a kernel thread id from being passed where a
//! CPU number is expected, which matters because `perf_event_open(2)` takes
//! both as bare integers.

use std::fmt;

/// Thread ID
///
/// Kernel thread id as returned by `gettid(2)`. Zero is never a valid thread
/// id for another thread, so the probe uses it as "not yet published".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tid(pub u32);

impl Tid {
    /// Thread id of the calling thread
    #[must_use]
    #[allow(unsafe_code, clippy::cast_sign_loss)]
    pub fn current() -> Self {
        // SAFETY: gettid has no preconditions and cannot fail.
        let tid = unsafe { libc::syscall(libc::SYS_gettid) };
        Tid(tid as u32)
    }

    /// Value for the `pid` argument of `perf_event_open(2)`
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn as_raw(self) -> libc::pid_t {
        self.0 as libc::pid_t
    }
}

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TID:{}", self.0)
    }
}

/// CPU ID
///
/// Logical CPU number (0, 1, 2, ...) as used by sysfs and `sched_setaffinity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CpuId(pub u32);

impl CpuId {
    /// Value for the `cpu` argument of `perf_event_open(2)`
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn as_raw(self) -> libc::c_int {
        self.0 as libc::c_int
    }
}

impl fmt::Display for CpuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CPU:{}", self.0)
    }
}

/// CPU architecture family
///
/// Event tables restrict some descriptors to one family (ARM raw event
/// numbers mean nothing on x86), and the user register masks used by the
/// feature probes differ per family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    Arm,
    X86,
    Riscv,
    Other,
}

impl Arch {
    /// Architecture this binary was compiled for
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(any(target_arch = "arm", target_arch = "aarch64")) {
            Arch::Arm
        } else if cfg!(any(target_arch = "x86", target_arch = "x86_64")) {
            Arch::X86
        } else if cfg!(target_arch = "riscv64") {
            Arch::Riscv
        } else {
            Arch::Other
        }
    }

    /// Parse the `limited_arch` tag used by event tables ("arm", "x86", ...)
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "arm" | "arm64" | "aarch64" => Arch::Arm,
            "x86" | "x86_64" => Arch::X86,
            "riscv" | "riscv64" => Arch::Riscv,
            _ => Arch::Other,
        }
    }

    /// Does `uname -m` output belong to this family?
    #[must_use]
    pub fn matches_machine(self, machine: &str) -> bool {
        match self {
            Arch::Arm => machine.contains("arm") || machine.contains("aarch64"),
            Arch::X86 => machine.contains("86"),
            Arch::Riscv => machine.contains("riscv"),
            Arch::Other => true,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Arch::Arm => "arm",
            Arch::X86 => "x86",
            Arch::Riscv => "riscv",
            Arch::Other => "other",
        };
        f.write_str(name)
    }
}
