//! End-to-end listing against scripted collaborators

mod common;

use common::{cpus, FakeCounters, FakeFeatures, FakeModels, NoCpuInfo, NO_FEATURES};
use pmuscan::catalog::{Catalog, EventType};
use pmuscan::domain::{Arch, ListError};
use pmuscan::listing::{EventLister, ListRequest};
use pmuscan::probe::RawEventSupportChecker;
use pmuscan_common::{PERF_TYPE_HARDWARE, PERF_TYPE_RAW, PERF_TYPE_SOFTWARE};

fn request(tokens: &[&str]) -> ListRequest {
    ListRequest { categories: tokens.iter().map(ToString::to_string).collect(), show_features: false }
}

fn catalog() -> Catalog {
    Catalog::from_events(vec![
        EventType::new("cpu-cycles", PERF_TYPE_HARDWARE, 0),
        EventType::new("instructions", PERF_TYPE_HARDWARE, 1),
        EventType::new("task-clock", PERF_TYPE_SOFTWARE, 1),
        EventType::new("raw-inst-retired", PERF_TYPE_RAW, 0x08)
            .with_description("Instruction architecturally executed"),
        EventType::new("raw-l1d-cache", PERF_TYPE_RAW, 0x04),
    ])
}

fn list(
    lister: &EventLister<'_>,
    request: &ListRequest,
) -> (Result<(), ListError>, String) {
    let mut out = Vec::new();
    let result = lister.run(request, &mut out);
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn test_big_little_raw_listing() {
    // Model {0,1} counts, model {2,3} opens but reads zero
    let catalog = Catalog::from_events(vec![
        EventType::new("cpu-cycles", PERF_TYPE_HARDWARE, 0),
        EventType::new("raw-inst-retired", PERF_TYPE_RAW, 0x08),
    ]);
    let models = FakeModels::new(&[&[0, 1], &[2, 3]]);
    let counters = FakeCounters::with_readings(&[(0, 1500), (2, 0)]).accepting(&["cpu-cycles"]);
    let lister = EventLister::new(&catalog, &models, &counters, &NO_FEATURES).with_arch(Arch::Other);

    let (result, output) = list(&lister, &request(&["hw", "raw"]));
    result.unwrap();
    assert_eq!(
        output,
        "List of hardware events:\n  cpu-cycles\n\n\
         List of raw events provided by cpu pmu:\n  \
         raw-inst-retired (supported on cpu 0-1, may supported on cpu 2-3)\n\n"
    );

    // Each raw probe is pinned to the first core of its model
    let opens = counters.opens.borrow();
    let pinned: Vec<_> = opens.iter().filter_map(|(_, cpu)| *cpu).collect();
    assert_eq!(pinned, cpus(&[0, 2]));
}

#[test]
fn test_model_that_rejects_event_is_not_annotated() {
    let catalog = Catalog::from_events(vec![EventType::new("raw-inst-retired", PERF_TYPE_RAW, 0x08)]);
    let models = FakeModels::new(&[&[0, 1], &[2, 3]]);
    let counters = FakeCounters::with_readings(&[(0, 1500)]);
    let lister = EventLister::new(&catalog, &models, &counters, &NO_FEATURES).with_arch(Arch::Other);

    let (result, output) = list(&lister, &request(&["raw"]));
    result.unwrap();
    assert!(output.contains("  raw-inst-retired (supported on cpu 0-1)\n"));
    assert!(!output.contains("may supported"));
}

#[test]
fn test_raw_descriptions_follow_annotation() {
    let catalog = catalog();
    let models = FakeModels::new(&[&[0, 1, 2, 3]]);
    let counters = FakeCounters::with_readings(&[(0, 3)]);
    let lister = EventLister::new(&catalog, &models, &counters, &NO_FEATURES).with_arch(Arch::Other);

    let (result, output) = list(&lister, &request(&["raw"]));
    result.unwrap();
    assert_eq!(
        output,
        "List of raw events provided by cpu pmu:\n  \
         raw-inst-retired (supported on cpu 0-3)\t\t# Instruction architecturally executed\n  \
         raw-l1d-cache (supported on cpu 0-3)\n\n"
    );
}

#[test]
fn test_raw_event_unsupported_everywhere_is_omitted() {
    let catalog = catalog();
    let models = FakeModels::new(&[&[0, 1], &[2, 3]]);
    let counters = FakeCounters::default();
    let lister = EventLister::new(&catalog, &models, &counters, &NO_FEATURES).with_arch(Arch::Other);

    let checker = RawEventSupportChecker::new(&counters, &models).unwrap();
    assert!(checker
        .support_status(&EventType::new("raw-l1d-cache", PERF_TYPE_RAW, 0x04))
        .is_empty());

    let (result, output) = list(&lister, &request(&["raw"]));
    result.unwrap();
    assert_eq!(output, "List of raw events provided by cpu pmu:\n\n");
}

#[test]
fn test_unknown_category_aborts_without_output() {
    let catalog = catalog();
    let models = FakeModels::new(&[&[0]]);
    let counters = FakeCounters::default().accepting(&["cpu-cycles"]);
    let lister = EventLister::new(&catalog, &models, &counters, &NO_FEATURES);

    let (result, output) = list(&lister, &request(&["hw", "bogus"]));
    assert!(matches!(result, Err(ListError::UnknownCategory(ref t)) if t == "bogus"));
    assert!(output.is_empty());
    assert!(counters.opens.borrow().is_empty());
}

#[test]
fn test_category_filtering_and_direct_checks() {
    let catalog = catalog();
    let models = FakeModels::new(&[&[0]]);
    let counters = FakeCounters::default().accepting(&["instructions", "task-clock"]);
    let lister = EventLister::new(&catalog, &models, &counters, &NO_FEATURES).with_arch(Arch::Other);

    let (result, output) = list(&lister, &request(&["sw", "hw"]));
    result.unwrap();
    // Token order is kept; cpu-cycles fails its direct check
    assert_eq!(
        output,
        "List of software events:\n  task-clock\n\nList of hardware events:\n  instructions\n\n"
    );
    // Direct checks never pin to a cpu
    assert!(counters.opens.borrow().iter().all(|(_, cpu)| cpu.is_none()));
}

#[test]
fn test_no_tokens_lists_every_category_in_name_order() {
    let catalog = catalog();
    let models = FakeModels::new(&[&[0]]);
    let counters = FakeCounters::default();
    let lister = EventLister::new(&catalog, &models, &counters, &NO_FEATURES).with_arch(Arch::Other);

    let (result, output) = list(&lister, &request(&[]));
    result.unwrap();
    let headers: Vec<_> = output.lines().filter(|l| l.starts_with("List of")).collect();
    assert_eq!(
        headers,
        [
            "List of hw-cache events:",
            "List of coresight etm events:",
            "List of hardware events:",
            "List of pmu events:",
            "List of raw events provided by cpu pmu:",
            "List of software events:",
            "List of tracepoint events:",
        ]
    );
}

#[test]
fn test_pmu_events_are_listed_without_opening() {
    let catalog = Catalog::from_events(vec![
        EventType::new("armv8_pmuv3_0/cpu_cycles/", 8, 0x11),
        EventType::new("cs_etm/autofdo/", 9, 0),
    ]);
    let models = FakeModels::new(&[&[0]]);
    let counters = FakeCounters::default();
    let lister = EventLister::new(&catalog, &models, &counters, &NO_FEATURES)
        .with_arch(Arch::Other)
        .with_etm_type(Some(9));

    let (result, output) = list(&lister, &request(&["pmu", "cs-etm"]));
    result.unwrap();
    assert_eq!(
        output,
        "List of pmu events:\n  armv8_pmuv3_0/cpu_cycles/\n  cs_etm/autofdo/\n\n\
         List of coresight etm events:\n  cs_etm/autofdo/\n\n"
    );
    assert!(counters.opens.borrow().is_empty());
}

#[test]
fn test_cpu_model_failure_skips_raw_only() {
    let catalog = catalog();
    let counters = FakeCounters::with_readings(&[(0, 10)]).accepting(&["task-clock"]);
    let lister = EventLister::new(&catalog, &NoCpuInfo, &counters, &NO_FEATURES).with_arch(Arch::Other);

    let (result, output) = list(&lister, &request(&["raw", "sw"]));
    result.unwrap();
    assert_eq!(
        output,
        "List of raw events provided by cpu pmu:\nList of software events:\n  task-clock\n\n"
    );
}

#[test]
fn test_arm_header_notes() {
    let catalog = catalog();
    let models = FakeModels::new(&[&[0]]);
    let counters = FakeCounters::default();
    let lister = EventLister::new(&catalog, &models, &counters, &NO_FEATURES).with_arch(Arch::Arm);

    let (result, output) = list(&lister, &request(&["cache", "raw"]));
    result.unwrap();
    let lines: Vec<_> = output.lines().collect();
    assert_eq!(lines[0], "List of hw-cache events:");
    assert_eq!(lines[1], "  # More cache events are available in `pmuscan raw`.");
    assert_eq!(lines[2], "");
    assert_eq!(lines[3], "List of raw events provided by cpu pmu:");
    assert!(lines[4..8].iter().all(|l| l.starts_with("  # ")));
    assert!(lines[7].contains("https://developer.arm.com/documentation/ddi0487"));
}

#[test]
fn test_show_features_bypasses_listing() {
    let catalog = catalog();
    let models = FakeModels::new(&[&[0]]);
    let counters = FakeCounters::default().accepting(&["cpu-cycles"]);
    let features = FakeFeatures { dwarf: true, offcpu: false, clockid: true };
    let lister = EventLister::new(&catalog, &models, &counters, &features);

    let request = ListRequest { categories: Vec::new(), show_features: true };
    let (result, output) = list(&lister, &request);
    result.unwrap();
    assert_eq!(output, "dwarf-based-call-graph\nset-clockid\n");
    assert!(counters.opens.borrow().is_empty());
}
