//! Category listing
//!
//! Resolves category tokens, walks the catalog once per category and prints
//! each event the device can use. Non-raw events get one direct open check on
//! the calling thread; raw events go through the per-core-model checker.
//!
//! Output layout:
//!
//! ```text
//! List of hardware events:
//!   cpu-cycles
//!   instructions
//!
//! List of raw events provided by cpu pmu:
//!   raw-l1d-cache (supported on cpu 0-3, may supported on cpu 4-7)		# Level 1 data cache access
//!
//! ```

pub mod capabilities;
pub mod categories;

use std::io::{self, Write};
use std::path::PathBuf;

use log::{debug, info, warn};
use pmuscan_common::ATTR_FLAG_EXCLUDE_KERNEL;

use crate::catalog::{EventCatalog, EventType};
use crate::domain::{Arch, ListError};
use crate::perf::{default_attr, CounterBackend, FeatureProbe};
use crate::probe::{format_cpu_list, CpuModelSource, RawEventSupportChecker, SupportStatus};

pub use capabilities::Capabilities;
pub use categories::{category_table, check_tokens, Category};

const ARM_RAW_HEADER: &[&str] = &[
    "  # Event numbers follow \"PMU common architectural and microarchitectural event numbers\"",
    "  # and \"ARM recommendations for IMPLEMENTATION DEFINED event numbers\" in the",
    "  # ARMv9 architecture reference manual.",
    "  # A possible link is https://developer.arm.com/documentation/ddi0487.",
];

const ARM_CACHE_NOTE: &str = "  # More cache events are available in `pmuscan raw`.";

/// What the operator asked for
#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    /// Category tokens; empty means every category
    pub categories: Vec<String>,
    /// Print feature flags instead of events
    pub show_features: bool,
}

/// `  name (annotation)\t\t# description` for a raw event
#[must_use]
pub fn raw_event_line(event: &EventType, status: &SupportStatus) -> String {
    let mut annotation = Vec::with_capacity(2);
    if !status.supported_cpus.is_empty() {
        annotation.push(format!("supported on cpu {}", format_cpu_list(&status.supported_cpus)));
    }
    if !status.may_supported_cpus.is_empty() {
        annotation.push(format!(
            "may supported on cpu {}",
            format_cpu_list(&status.may_supported_cpus)
        ));
    }
    let mut line = format!("  {} ({})", event.name, annotation.join(", "));
    push_description(&mut line, event);
    line
}

/// `  name\t\t# description` for any other event
#[must_use]
pub fn event_line(event: &EventType) -> String {
    let mut line = format!("  {}", event.name);
    push_description(&mut line, event);
    line
}

fn push_description(line: &mut String, event: &EventType) {
    if !event.description.is_empty() {
        line.push_str("\t\t# ");
        line.push_str(&event.description);
    }
}

/// Lists events of the requested categories
pub struct EventLister<'a> {
    catalog: &'a dyn EventCatalog,
    cpu_models: &'a dyn CpuModelSource,
    counters: &'a dyn CounterBackend,
    features: &'a dyn FeatureProbe,
    categories: Vec<Category>,
    arch: Arch,
    tracefs: Option<PathBuf>,
    capabilities: Capabilities,
}

impl<'a> EventLister<'a> {
    #[must_use]
    pub fn new(
        catalog: &'a dyn EventCatalog,
        cpu_models: &'a dyn CpuModelSource,
        counters: &'a dyn CounterBackend,
        features: &'a dyn FeatureProbe,
    ) -> Self {
        Self {
            catalog,
            cpu_models,
            counters,
            features,
            categories: category_table(None),
            arch: Arch::current(),
            tracefs: None,
            capabilities: Capabilities::new(),
        }
    }

    /// Dynamic type of the coresight ETM PMU, if the device has one
    #[must_use]
    pub fn with_etm_type(mut self, etm_type: Option<u32>) -> Self {
        self.categories = category_table(etm_type);
        self
    }

    /// Architecture whose header notes are printed
    #[must_use]
    pub fn with_arch(mut self, arch: Arch) -> Self {
        self.arch = arch;
        self
    }

    #[must_use]
    pub fn with_tracefs(mut self, tracefs: Option<PathBuf>) -> Self {
        self.tracefs = tracefs;
        self
    }

    #[must_use]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Serve one request
    ///
    /// Every token is resolved before anything is written, so an unknown
    /// token produces no partial listing.
    ///
    /// # Errors
    /// [`ListError::UnknownCategory`] for an unrecognised token,
    /// [`ListError::Io`] when `out` fails.
    pub fn run(&self, request: &ListRequest, out: &mut dyn Write) -> Result<(), ListError> {
        let selected = self.resolve(&request.categories)?;
        if request.show_features {
            self.show_features(out)?;
            return Ok(());
        }
        for category in selected {
            if category.is_raw() {
                self.print_raw_events(category, out)?;
            } else {
                self.print_events(category, out)?;
            }
        }
        Ok(())
    }

    fn resolve(&self, tokens: &[String]) -> Result<Vec<&Category>, ListError> {
        if tokens.is_empty() {
            return Ok(self.categories.iter().collect());
        }
        tokens
            .iter()
            .map(|token| {
                self.categories
                    .iter()
                    .find(|c| c.name == token.as_str())
                    .ok_or_else(|| ListError::UnknownCategory(token.clone()))
            })
            .collect()
    }

    fn show_features(&self, out: &mut dyn Write) -> io::Result<()> {
        let features = [
            ("dwarf-based-call-graph", self.features.dwarf_call_graph_supported()),
            ("trace-offcpu", self.features.trace_offcpu_supported()),
            ("set-clockid", self.features.set_clockid_supported()),
        ];
        for (name, supported) in features {
            if supported {
                writeln!(out, "{name}")?;
            }
        }
        Ok(())
    }

    /// Direct check on the calling thread, kernel excluded
    ///
    /// PMU-sourced descriptors come from the kernel itself and are taken as
    /// supported.
    fn is_event_supported(&self, event: &EventType) -> bool {
        if event.is_pmu_event() {
            return true;
        }
        let mut attr = default_attr(event);
        attr.set_flag(ATTR_FLAG_EXCLUDE_KERNEL, true);
        self.counters.is_attr_supported(&attr, &event.name)
    }

    fn advise(&self, category: &Category) {
        match category.name {
            "hw" | "cache" if !self.capabilities.has_hardware_counter(self.catalog, self.counters) => {
                info!("No hardware counters detected, {} may be empty", category.description);
            }
            "pmu" if !self.capabilities.has_pmu_counter(self.catalog) => {
                debug!("No PMU-exported events in the catalog");
            }
            "tracepoint" if !self.capabilities.has_tracepoint_events(self.tracefs.as_deref()) => {
                info!("tracefs not found, tracepoint events are unavailable");
            }
            _ => {}
        }
    }

    fn print_events(&self, category: &Category, out: &mut dyn Write) -> io::Result<()> {
        self.advise(category);
        writeln!(out, "List of {}:", category.description)?;
        if self.arch == Arch::Arm && category.name == "cache" {
            writeln!(out, "{ARM_CACHE_NOTE}")?;
        }

        let mut result = Ok(());
        self.catalog.for_each_event(&mut |event| {
            if !category.matches(event) || !self.is_event_supported(event) {
                return true;
            }
            result = writeln!(out, "{}", event_line(event));
            result.is_ok()
        });
        result?;
        writeln!(out)
    }

    fn print_raw_events(&self, category: &Category, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "List of {}:", category.description)?;
        if self.arch == Arch::Arm {
            for line in ARM_RAW_HEADER {
                writeln!(out, "{line}")?;
            }
        }
        if !self.capabilities.in_native_abi() {
            warn!("Not running in the native ABI, raw event results may be unreliable");
        }

        // Setup failure is already logged; the other categories still print
        let Ok(checker) = RawEventSupportChecker::new(self.counters, self.cpu_models) else {
            return Ok(());
        };

        let mut result = Ok(());
        self.catalog.for_each_event(&mut |event| {
            if !category.matches(event) {
                return true;
            }
            let status = checker.support_status(event);
            if status.is_empty() {
                return true;
            }
            result = writeln!(out, "{}", raw_event_line(event, &status));
            result.is_ok()
        });
        result?;
        writeln!(out)
    }
}
