//! # Kernel perf ABI shared by pmuscan
//!
//! Constants and the `perf_event_attr` layout used when asking the kernel to
//! open a counter. Everything here mirrors `include/uapi/linux/perf_event.h`
//! and uses `#[repr(C)]` so the struct can be handed to `perf_event_open(2)`
//! directly.
//!
//! ## Key Types
//!
//! - [`PerfEventAttr`] - event configuration passed to the syscall
//! - [`CounterValue`] - layout returned by `read(2)` with [`DEFAULT_READ_FORMAT`]

#![no_std]

// ============================================================================
// Event Types (perf_event_attr.type)
// ============================================================================

/// Generalized hardware events (`cpu-cycles`, `instructions`, ...)
pub const PERF_TYPE_HARDWARE: u32 = 0;
/// Kernel software counters (`cpu-clock`, `page-faults`, ...)
pub const PERF_TYPE_SOFTWARE: u32 = 1;
/// Tracepoints; config is the tracefs event id
pub const PERF_TYPE_TRACEPOINT: u32 = 2;
/// Generalized hardware cache events
pub const PERF_TYPE_HW_CACHE: u32 = 3;
/// Model-specific raw PMU event codes
pub const PERF_TYPE_RAW: u32 = 4;

// ============================================================================
// Hardware Event Ids (config for PERF_TYPE_HARDWARE)
// ============================================================================

pub const PERF_COUNT_HW_CPU_CYCLES: u64 = 0;
pub const PERF_COUNT_HW_INSTRUCTIONS: u64 = 1;
pub const PERF_COUNT_HW_CACHE_REFERENCES: u64 = 2;
pub const PERF_COUNT_HW_CACHE_MISSES: u64 = 3;
pub const PERF_COUNT_HW_BRANCH_INSTRUCTIONS: u64 = 4;
pub const PERF_COUNT_HW_BRANCH_MISSES: u64 = 5;
pub const PERF_COUNT_HW_BUS_CYCLES: u64 = 6;
pub const PERF_COUNT_HW_STALLED_CYCLES_FRONTEND: u64 = 7;
pub const PERF_COUNT_HW_STALLED_CYCLES_BACKEND: u64 = 8;

// ============================================================================
// Software Event Ids (config for PERF_TYPE_SOFTWARE)
// ============================================================================

pub const PERF_COUNT_SW_CPU_CLOCK: u64 = 0;
pub const PERF_COUNT_SW_TASK_CLOCK: u64 = 1;
pub const PERF_COUNT_SW_PAGE_FAULTS: u64 = 2;
pub const PERF_COUNT_SW_CONTEXT_SWITCHES: u64 = 3;
pub const PERF_COUNT_SW_CPU_MIGRATIONS: u64 = 4;
pub const PERF_COUNT_SW_PAGE_FAULTS_MIN: u64 = 5;
pub const PERF_COUNT_SW_PAGE_FAULTS_MAJ: u64 = 6;
pub const PERF_COUNT_SW_ALIGNMENT_FAULTS: u64 = 7;
pub const PERF_COUNT_SW_EMULATION_FAULTS: u64 = 8;

// ============================================================================
// Hardware Cache Ids (config = cache | op << 8 | result << 16)
// ============================================================================

pub const PERF_COUNT_HW_CACHE_L1D: u64 = 0;
pub const PERF_COUNT_HW_CACHE_L1I: u64 = 1;
pub const PERF_COUNT_HW_CACHE_LL: u64 = 2;
pub const PERF_COUNT_HW_CACHE_DTLB: u64 = 3;
pub const PERF_COUNT_HW_CACHE_ITLB: u64 = 4;
pub const PERF_COUNT_HW_CACHE_BPU: u64 = 5;
pub const PERF_COUNT_HW_CACHE_NODE: u64 = 6;

pub const PERF_COUNT_HW_CACHE_OP_READ: u64 = 0;
pub const PERF_COUNT_HW_CACHE_OP_WRITE: u64 = 1;
pub const PERF_COUNT_HW_CACHE_OP_PREFETCH: u64 = 2;

pub const PERF_COUNT_HW_CACHE_RESULT_ACCESS: u64 = 0;
pub const PERF_COUNT_HW_CACHE_RESULT_MISS: u64 = 1;

/// Compose a `PERF_TYPE_HW_CACHE` config value
#[must_use]
pub const fn hw_cache_config(cache: u64, op: u64, result: u64) -> u64 {
    cache | (op << 8) | (result << 16)
}

// ============================================================================
// sample_type / read_format Bits
// ============================================================================

pub const PERF_SAMPLE_IP: u64 = 1 << 0;
pub const PERF_SAMPLE_TID: u64 = 1 << 1;
pub const PERF_SAMPLE_TIME: u64 = 1 << 2;
pub const PERF_SAMPLE_CALLCHAIN: u64 = 1 << 5;
pub const PERF_SAMPLE_ID: u64 = 1 << 6;
pub const PERF_SAMPLE_CPU: u64 = 1 << 7;
pub const PERF_SAMPLE_PERIOD: u64 = 1 << 8;
pub const PERF_SAMPLE_REGS_USER: u64 = 1 << 12;
pub const PERF_SAMPLE_STACK_USER: u64 = 1 << 13;

pub const PERF_FORMAT_TOTAL_TIME_ENABLED: u64 = 1 << 0;
pub const PERF_FORMAT_TOTAL_TIME_RUNNING: u64 = 1 << 1;
pub const PERF_FORMAT_ID: u64 = 1 << 2;

/// Read format used for every counter pmuscan opens
///
/// A `read(2)` on such a counter returns exactly one [`CounterValue`].
pub const DEFAULT_READ_FORMAT: u64 =
    PERF_FORMAT_TOTAL_TIME_ENABLED | PERF_FORMAT_TOTAL_TIME_RUNNING | PERF_FORMAT_ID;

/// Sample type used for every counter pmuscan opens
pub const DEFAULT_SAMPLE_TYPE: u64 = PERF_SAMPLE_IP
    | PERF_SAMPLE_TID
    | PERF_SAMPLE_TIME
    | PERF_SAMPLE_PERIOD
    | PERF_SAMPLE_CPU
    | PERF_SAMPLE_ID;

/// Sampling frequency for non-tracepoint events
pub const DEFAULT_SAMPLE_FREQ: u64 = 4000;

// ============================================================================
// perf_event_attr Flag Bits
// ============================================================================
//
// The kernel declares these as a run of 1-bit fields in a u64; on every
// supported target bit N of `flags` is `1 << N`.

pub const ATTR_FLAG_DISABLED: u64 = 1 << 0;
pub const ATTR_FLAG_EXCLUDE_KERNEL: u64 = 1 << 5;
pub const ATTR_FLAG_MMAP: u64 = 1 << 8;
pub const ATTR_FLAG_COMM: u64 = 1 << 9;
pub const ATTR_FLAG_FREQ: u64 = 1 << 10;
pub const ATTR_FLAG_SAMPLE_ID_ALL: u64 = 1 << 18;
pub const ATTR_FLAG_EXCLUDE_CALLCHAIN_USER: u64 = 1 << 22;
pub const ATTR_FLAG_USE_CLOCKID: u64 = 1 << 25;

/// `PERF_FLAG_FD_CLOEXEC` for the syscall's `flags` argument
pub const PERF_FLAG_FD_CLOEXEC: u64 = 1 << 3;

/// `sizeof(struct perf_event_attr)` for ABI version 6
pub const PERF_ATTR_SIZE_VER6: u32 = 120;

// ============================================================================
// Shared Data Structures
// ============================================================================

/// Event configuration handed to `perf_event_open(2)`
///
/// **Memory Layout**: `#[repr(C)]`, matches `PERF_ATTR_SIZE_VER6`.
/// Unions in the kernel header are flattened to the member pmuscan uses.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerfEventAttr {
    /// Major event type (`PERF_TYPE_*` or a dynamic PMU type)
    pub type_: u32,
    /// Size of this struct, for ABI versioning
    pub size: u32,
    /// Type-specific event config
    pub config: u64,
    /// `sample_period`, or `sample_freq` when [`ATTR_FLAG_FREQ`] is set
    pub sample_period_or_freq: u64,
    pub sample_type: u64,
    pub read_format: u64,
    /// Packed 1-bit fields (`ATTR_FLAG_*`)
    pub flags: u64,
    pub wakeup_events: u32,
    pub bp_type: u32,
    pub config1: u64,
    pub config2: u64,
    pub branch_sample_type: u64,
    /// Register mask dumped with `PERF_SAMPLE_REGS_USER`
    pub sample_regs_user: u64,
    /// Bytes of user stack dumped with `PERF_SAMPLE_STACK_USER`
    pub sample_stack_user: u32,
    /// Clock used for timestamps when [`ATTR_FLAG_USE_CLOCKID`] is set
    pub clockid: i32,
    pub sample_regs_intr: u64,
    pub aux_watermark: u32,
    pub sample_max_stack: u16,
    #[allow(clippy::pub_underscore_fields)]
    pub _reserved_2: u16,
    pub aux_sample_size: u32,
    #[allow(clippy::pub_underscore_fields)]
    pub _reserved_3: u32,
}

impl PerfEventAttr {
    /// Zeroed attr for the given type/config with `size` filled in
    #[must_use]
    pub fn new(type_: u32, config: u64) -> Self {
        Self { type_, size: PERF_ATTR_SIZE_VER6, config, ..Self::default() }
    }

    /// Set or clear one of the `ATTR_FLAG_*` bits
    pub fn set_flag(&mut self, flag: u64, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    #[must_use]
    pub fn has_flag(&self, flag: u64) -> bool {
        self.flags & flag != 0
    }
}

/// Layout of a single counter read with [`DEFAULT_READ_FORMAT`]
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterValue {
    /// Accumulated event count
    pub value: u64,
    pub time_enabled: u64,
    pub time_running: u64,
    /// Kernel-assigned event id
    pub id: u64,
}
