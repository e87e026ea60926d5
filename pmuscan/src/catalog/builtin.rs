//! Events every perf-capable kernel knows by name

use pmuscan_common::{
    hw_cache_config, PERF_COUNT_HW_BRANCH_INSTRUCTIONS, PERF_COUNT_HW_BRANCH_MISSES,
    PERF_COUNT_HW_BUS_CYCLES, PERF_COUNT_HW_CACHE_BPU, PERF_COUNT_HW_CACHE_DTLB,
    PERF_COUNT_HW_CACHE_ITLB, PERF_COUNT_HW_CACHE_L1D, PERF_COUNT_HW_CACHE_L1I,
    PERF_COUNT_HW_CACHE_LL, PERF_COUNT_HW_CACHE_MISSES, PERF_COUNT_HW_CACHE_NODE,
    PERF_COUNT_HW_CACHE_OP_PREFETCH, PERF_COUNT_HW_CACHE_OP_READ, PERF_COUNT_HW_CACHE_OP_WRITE,
    PERF_COUNT_HW_CACHE_REFERENCES, PERF_COUNT_HW_CACHE_RESULT_ACCESS,
    PERF_COUNT_HW_CACHE_RESULT_MISS, PERF_COUNT_HW_CPU_CYCLES, PERF_COUNT_HW_INSTRUCTIONS,
    PERF_COUNT_HW_STALLED_CYCLES_BACKEND, PERF_COUNT_HW_STALLED_CYCLES_FRONTEND,
    PERF_COUNT_SW_ALIGNMENT_FAULTS, PERF_COUNT_SW_CONTEXT_SWITCHES, PERF_COUNT_SW_CPU_CLOCK,
    PERF_COUNT_SW_CPU_MIGRATIONS, PERF_COUNT_SW_EMULATION_FAULTS, PERF_COUNT_SW_PAGE_FAULTS,
    PERF_COUNT_SW_PAGE_FAULTS_MAJ, PERF_COUNT_SW_PAGE_FAULTS_MIN, PERF_COUNT_SW_TASK_CLOCK,
    PERF_TYPE_HARDWARE, PERF_TYPE_HW_CACHE, PERF_TYPE_SOFTWARE,
};

use super::raw_table::bundled_arm64_events;
use super::EventType;

const HARDWARE_EVENTS: &[(&str, u64)] = &[
    ("cpu-cycles", PERF_COUNT_HW_CPU_CYCLES),
    ("instructions", PERF_COUNT_HW_INSTRUCTIONS),
    ("cache-references", PERF_COUNT_HW_CACHE_REFERENCES),
    ("cache-misses", PERF_COUNT_HW_CACHE_MISSES),
    ("branch-instructions", PERF_COUNT_HW_BRANCH_INSTRUCTIONS),
    ("branch-misses", PERF_COUNT_HW_BRANCH_MISSES),
    ("bus-cycles", PERF_COUNT_HW_BUS_CYCLES),
    ("stalled-cycles-frontend", PERF_COUNT_HW_STALLED_CYCLES_FRONTEND),
    ("stalled-cycles-backend", PERF_COUNT_HW_STALLED_CYCLES_BACKEND),
];

const SOFTWARE_EVENTS: &[(&str, u64)] = &[
    ("cpu-clock", PERF_COUNT_SW_CPU_CLOCK),
    ("task-clock", PERF_COUNT_SW_TASK_CLOCK),
    ("page-faults", PERF_COUNT_SW_PAGE_FAULTS),
    ("context-switches", PERF_COUNT_SW_CONTEXT_SWITCHES),
    ("cpu-migrations", PERF_COUNT_SW_CPU_MIGRATIONS),
    ("minor-faults", PERF_COUNT_SW_PAGE_FAULTS_MIN),
    ("major-faults", PERF_COUNT_SW_PAGE_FAULTS_MAJ),
    ("alignment-faults", PERF_COUNT_SW_ALIGNMENT_FAULTS),
    ("emulation-faults", PERF_COUNT_SW_EMULATION_FAULTS),
];

const CACHES: &[(&str, u64)] = &[
    ("L1-dcache", PERF_COUNT_HW_CACHE_L1D),
    ("L1-icache", PERF_COUNT_HW_CACHE_L1I),
    ("LLC", PERF_COUNT_HW_CACHE_LL),
    ("dTLB", PERF_COUNT_HW_CACHE_DTLB),
    ("iTLB", PERF_COUNT_HW_CACHE_ITLB),
    ("branch", PERF_COUNT_HW_CACHE_BPU),
    ("node", PERF_COUNT_HW_CACHE_NODE),
];

/// (name used for accesses, name used for misses, op id)
const CACHE_OPS: &[(&str, &str, u64)] = &[
    ("loads", "load", PERF_COUNT_HW_CACHE_OP_READ),
    ("stores", "store", PERF_COUNT_HW_CACHE_OP_WRITE),
    ("prefetches", "prefetch", PERF_COUNT_HW_CACHE_OP_PREFETCH),
];

/// `L1-dcache-loads`, `L1-dcache-load-misses`, ...
fn hw_cache_events() -> impl Iterator<Item = EventType> {
    CACHES.iter().flat_map(|&(cache, cache_id)| {
        CACHE_OPS.iter().flat_map(move |&(op_access, op_miss, op_id)| {
            [
                EventType::new(
                    format!("{cache}-{op_access}"),
                    PERF_TYPE_HW_CACHE,
                    hw_cache_config(cache_id, op_id, PERF_COUNT_HW_CACHE_RESULT_ACCESS),
                ),
                EventType::new(
                    format!("{cache}-{op_miss}-misses"),
                    PERF_TYPE_HW_CACHE,
                    hw_cache_config(cache_id, op_id, PERF_COUNT_HW_CACHE_RESULT_MISS),
                ),
            ]
        })
    })
}

/// Hardware, software, hw-cache and bundled raw events
///
/// Raw events keep their `limited_arch` tag; the catalog filters them.
#[must_use]
pub fn builtin_events() -> Vec<EventType> {
    let hardware =
        HARDWARE_EVENTS.iter().map(|&(name, id)| EventType::new(name, PERF_TYPE_HARDWARE, id));
    let software =
        SOFTWARE_EVENTS.iter().map(|&(name, id)| EventType::new(name, PERF_TYPE_SOFTWARE, id));

    hardware.chain(software).chain(hw_cache_events()).chain(bundled_arm64_events()).collect()
}
