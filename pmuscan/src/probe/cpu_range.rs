//! CPU list utilities
//!
//! Converts between sorted CPU id lists and the compact range syntax used by
//! sysfs (`0-3,8-11`). The same syntax annotates raw events in the listing.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::domain::CpuId;

const ONLINE_CPUS_PATH: &str = "/sys/devices/system/cpu/online";

/// Render a non-decreasing list of distinct CPU ids as ranges
///
/// Consecutive runs of two or more ids become `first-last`, lone ids stay
/// single numbers, runs are joined with commas in input order.
///
/// ```
/// use pmuscan::domain::CpuId;
/// use pmuscan::probe::format_cpu_list;
///
/// let cpus: Vec<CpuId> = [0, 1, 2, 4, 6, 7].into_iter().map(CpuId).collect();
/// assert_eq!(format_cpu_list(&cpus), "0-2,4,6-7");
/// ```
#[must_use]
pub fn format_cpu_list(cpus: &[CpuId]) -> String {
    let mut out = String::new();
    let Some((first, rest)) = cpus.split_first() else {
        return out;
    };

    let (mut start, mut last) = (first.0, first.0);
    for cpu in rest {
        if last.checked_add(1) == Some(cpu.0) {
            last = cpu.0;
            continue;
        }
        push_run(&mut out, start, last);
        start = cpu.0;
        last = cpu.0;
    }
    push_run(&mut out, start, last);
    out
}

fn push_run(out: &mut String, start: u32, last: u32) {
    if !out.is_empty() {
        out.push(',');
    }
    if start == last {
        out.push_str(&start.to_string());
    } else {
        out.push_str(&format!("{start}-{last}"));
    }
}

/// Parse a CPU list like "0-3" or "0-3,8-11" into explicit ids
///
/// # Errors
/// Returns an error if a range bound is not a number or a range is reversed
pub fn parse_cpu_list(content: &str) -> Result<Vec<CpuId>> {
    let mut cpus = Vec::new();
    let content = content.trim();
    if content.is_empty() {
        return Ok(cpus);
    }

    for range in content.split(',') {
        let range = range.trim();
        if let Some((start, end)) = range.split_once('-') {
            // Range like "0-3"
            let start: u32 = start.parse().with_context(|| format!("Bad cpu range: {range}"))?;
            let end: u32 = end.parse().with_context(|| format!("Bad cpu range: {range}"))?;
            if end < start {
                anyhow::bail!("Reversed cpu range: {range}");
            }
            cpus.extend((start..=end).map(CpuId));
        } else {
            // Single CPU like "5"
            let cpu: u32 = range.parse().with_context(|| format!("Bad cpu id: {range}"))?;
            cpus.push(CpuId(cpu));
        }
    }

    Ok(cpus)
}

/// Get list of online CPU IDs from /sys/devices/system/cpu/online
///
/// # Errors
/// Returns an error if the sysfs file is missing or malformed
pub fn online_cpus() -> Result<Vec<CpuId>> {
    online_cpus_from(Path::new(ONLINE_CPUS_PATH))
}

pub(crate) fn online_cpus_from(path: &Path) -> Result<Vec<CpuId>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_cpu_list(&content)
}
