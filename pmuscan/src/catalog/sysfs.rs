//! Events discovered at runtime from sysfs and tracefs
//!
//! Unreadable entries are skipped: a PMU driver that hides an attribute from
//! unprivileged users should not stop the rest of the listing.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use super::EventType;
use pmuscan_common::PERF_TYPE_TRACEPOINT;

const TRACEFS_CANDIDATES: &[&str] = &["/sys/kernel/tracing", "/sys/kernel/debug/tracing"];

/// PMUs whose events are already covered by the builtin tables or tracefs
const SKIPPED_PMUS: &[&str] = &["software", "tracepoint", "breakpoint", "kprobe", "uprobe"];

fn event_source_dir(sysfs_root: &Path) -> PathBuf {
    sysfs_root.join("bus/event_source/devices")
}

/// Locate a mounted tracefs
#[must_use]
pub fn find_tracefs() -> Option<PathBuf> {
    TRACEFS_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|dir| dir.join("events").is_dir())
}

/// Dynamic type id of a PMU (`/sys/bus/event_source/devices/<pmu>/type`)
#[must_use]
pub fn pmu_type(sysfs_root: &Path, pmu: &str) -> Option<u32> {
    let path = event_source_dir(sysfs_root).join(pmu).join("type");
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Sorted subdirectory names, empty when `dir` is unreadable
fn sorted_entries(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> =
        entries.flatten().map(|e| e.file_name().to_string_lossy().into_owned()).collect();
    names.sort();
    names
}

fn parse_number(text: &str) -> Option<u64> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// Bit ranges of a format file like `config:0-7,32-35`
///
/// Returns `None` for fields other than `config`.
fn parse_format(format: &str) -> Option<Vec<(u32, u32)>> {
    let (field, ranges) = format.trim().split_once(':')?;
    if field != "config" {
        return None;
    }
    ranges
        .split(',')
        .map(|range| match range.split_once('-') {
            Some((lo, hi)) => Some((lo.parse().ok()?, hi.parse().ok()?)),
            None => {
                let bit = range.parse().ok()?;
                Some((bit, bit))
            }
        })
        .collect()
}

/// Scatter `value` across `ranges`, low bits first
fn place_bits(value: u64, ranges: &[(u32, u32)]) -> u64 {
    let mut config = 0u64;
    let mut remaining = value;
    for &(lo, hi) in ranges {
        if hi < lo || hi >= 64 {
            continue;
        }
        let width = hi - lo + 1;
        let mask = if width == 64 { u64::MAX } else { (1u64 << width) - 1 };
        config |= (remaining & mask) << lo;
        remaining = if width == 64 { 0 } else { remaining >> width };
    }
    config
}

/// Assemble `config` from an event file like `event=0x11,umask=0x2`
fn event_config(pmu_dir: &Path, spec: &str) -> Option<u64> {
    let mut config = 0u64;
    for term in spec.trim().split(',').filter(|t| !t.is_empty()) {
        let (name, value) = match term.split_once('=') {
            Some((name, value)) => (name, parse_number(value)?),
            None => (term, 1),
        };
        if name == "config" {
            config |= value;
            continue;
        }
        let format = fs::read_to_string(pmu_dir.join("format").join(name)).ok()?;
        match parse_format(&format) {
            Some(ranges) => config |= place_bits(value, &ranges),
            None => debug!("{}: term {name} is not part of config", pmu_dir.display()),
        }
    }
    Some(config)
}

/// Events exported by kernel PMU drivers, named `<pmu>/<event>/`
#[must_use]
pub fn pmu_events(sysfs_root: &Path) -> Vec<EventType> {
    let devices = event_source_dir(sysfs_root);
    let mut events = Vec::new();

    for pmu in sorted_entries(&devices) {
        if SKIPPED_PMUS.contains(&pmu.as_str()) {
            continue;
        }
        let Some(perf_type) = pmu_type(sysfs_root, &pmu) else {
            continue;
        };
        let pmu_dir = devices.join(&pmu);
        for name in sorted_entries(&pmu_dir.join("events")) {
            // `<event>.scale` and `<event>.unit` describe an event, they aren't one
            if name.contains('.') {
                continue;
            }
            let Ok(spec) = fs::read_to_string(pmu_dir.join("events").join(&name)) else {
                continue;
            };
            match event_config(&pmu_dir, &spec) {
                Some(config) => events.push(EventType::new(format!("{pmu}/{name}/"), perf_type, config)),
                None => debug!("Skipping {pmu}/{name}/: cannot decode {:?}", spec.trim()),
            }
        }
    }
    events
}

/// Tracepoints under `<tracefs>/events/<system>/<name>/id`, named `system:name`
#[must_use]
pub fn tracepoint_events(tracefs: &Path) -> Vec<EventType> {
    let events_dir = tracefs.join("events");
    let mut events = Vec::new();

    for system in sorted_entries(&events_dir) {
        let system_dir = events_dir.join(&system);
        if !system_dir.is_dir() {
            continue;
        }
        for name in sorted_entries(&system_dir) {
            let id_path = system_dir.join(&name).join("id");
            let Some(id) = fs::read_to_string(id_path).ok().and_then(|s| parse_number(&s)) else {
                continue;
            };
            events.push(EventType::new(format!("{system}:{name}"), PERF_TYPE_TRACEPOINT, id));
        }
    }
    events
}

/// Tracepoint id for `system:name`, if tracefs exposes it
#[must_use]
pub fn tracepoint_id(tracefs: &Path, system: &str, name: &str) -> Option<u64> {
    let path = tracefs.join("events").join(system).join(name).join("id");
    parse_number(&fs::read_to_string(path).ok()?)
}
