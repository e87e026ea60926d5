//! # Event catalog
//!
//! Named event descriptors and their enumeration. The listing never owns or
//! mutates descriptors; it walks them through [`EventCatalog::for_each_event`].
//!
//! Sources, in enumeration order:
//! - `builtin`: hardware, software and hw-cache events known to every kernel,
//!   plus the ARM architectural raw events
//! - `raw_table`: extra raw events from a JSON event table
//! - `sysfs`: PMU events from `/sys/bus/event_source` and tracepoints from tracefs

pub mod builtin;
pub mod raw_table;
pub mod sysfs;

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::domain::{Arch, CatalogError};

/// A named performance event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventType {
    pub name: String,
    /// `perf_event_attr.type` (`PERF_TYPE_*` or a dynamic PMU type)
    pub perf_type: u32,
    pub config: u64,
    /// Human description, may be empty
    pub description: String,
    /// Architecture the event is restricted to, if any
    pub limited_arch: Option<Arch>,
}

impl EventType {
    #[must_use]
    pub fn new(name: impl Into<String>, perf_type: u32, config: u64) -> Self {
        Self {
            name: name.into(),
            perf_type,
            config,
            description: String::new(),
            limited_arch: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn limited_to(mut self, arch: Arch) -> Self {
        self.limited_arch = Some(arch);
        self
    }

    /// Events exported by a kernel PMU driver are named `<pmu>/<event>/`
    #[must_use]
    pub fn is_pmu_event(&self) -> bool {
        self.name.contains('/')
    }

    /// Usable on `arch`: unrestricted, or restricted to `arch` itself
    #[must_use]
    pub fn applies_to(&self, arch: Arch) -> bool {
        self.limited_arch.map_or(true, |limited| limited == arch)
    }
}

/// Callback-driven traversal over known events
pub trait EventCatalog {
    /// Call `f` on each event until it returns `false`.
    fn for_each_event(&self, f: &mut dyn FnMut(&EventType) -> bool);

    fn find_by_name(&self, name: &str) -> Option<EventType> {
        let mut found = None;
        self.for_each_event(&mut |event| {
            if event.name == name {
                found = Some(event.clone());
                return false;
            }
            true
        });
        found
    }
}

/// Where to look for events beyond the builtin tables
#[derive(Debug, Clone)]
pub struct CatalogOptions {
    pub arch: Arch,
    /// Extra JSON raw event table
    pub raw_table: Option<PathBuf>,
    /// Root of the sysfs tree (`/sys`)
    pub sysfs_root: PathBuf,
    /// tracefs mount; `None` when tracing is unavailable
    pub tracefs: Option<PathBuf>,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            arch: Arch::current(),
            raw_table: None,
            sysfs_root: PathBuf::from("/sys"),
            tracefs: sysfs::find_tracefs(),
        }
    }
}

/// In-memory event table
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    events: Vec<EventType>,
}

impl Catalog {
    /// Build the catalog from every source named in `options`
    ///
    /// Events limited to another architecture are dropped here.
    ///
    /// # Errors
    /// Returns an error if the raw event table cannot be read or parsed
    pub fn load(options: &CatalogOptions) -> Result<Self, CatalogError> {
        let mut events = builtin::builtin_events();
        events.retain(|e| e.applies_to(options.arch));
        if let Some(path) = &options.raw_table {
            let table = raw_table::load_raw_table(path)?;
            let total = table.len();
            let table: Vec<_> = table.into_iter().filter(|e| e.applies_to(options.arch)).collect();
            if table.len() < total {
                warn!(
                    "{} of {total} events in {} are not for {}, skipped",
                    total - table.len(),
                    path.display(),
                    options.arch
                );
            }
            info!("Loaded {} raw events from {}", table.len(), path.display());
            merge_by_name(&mut events, table);
        }

        let pmu_events = sysfs::pmu_events(&options.sysfs_root);
        debug!("Found {} pmu events under {}", pmu_events.len(), options.sysfs_root.display());
        events.extend(pmu_events);

        if let Some(tracefs) = &options.tracefs {
            let tracepoints = sysfs::tracepoint_events(tracefs);
            debug!("Found {} tracepoint events under {}", tracepoints.len(), tracefs.display());
            events.extend(tracepoints);
        }

        Ok(Self { events })
    }

    #[must_use]
    pub fn from_events(events: Vec<EventType>) -> Self {
        Self { events }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Append `extra`, replacing any event that already has the same name
fn merge_by_name(events: &mut Vec<EventType>, extra: Vec<EventType>) {
    for event in extra {
        match events.iter_mut().find(|e| e.name == event.name) {
            Some(existing) => {
                debug!("{} redefined by event table", event.name);
                *existing = event;
            }
            None => events.push(event),
        }
    }
}

impl EventCatalog for Catalog {
    fn for_each_event(&self, f: &mut dyn FnMut(&EventType) -> bool) {
        for event in &self.events {
            if !f(event) {
                break;
            }
        }
    }
}

/// Type id of the coresight ETM PMU, if the device has one
#[must_use]
pub fn etm_event_type(sysfs_root: &Path) -> Option<u32> {
    sysfs::pmu_type(sysfs_root, "cs_etm")
}
