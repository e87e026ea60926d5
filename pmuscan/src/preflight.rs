//! Pre-flight checks for pmuscan
//!
//! Makes sure unprivileged `perf_event_open` is allowed at all before any
//! event is probed, with an actionable message when it isn't.

#![allow(unsafe_code)] // geteuid() requires unsafe

use anyhow::{bail, Context, Result};
use log::warn;
use std::path::Path;

/// Kernel knob restricting unprivileged perf use
pub const PERF_EVENT_PARANOID: &str = "/proc/sys/kernel/perf_event_paranoid";

/// Run all pre-flight checks before listing
pub fn run_preflight_checks() -> Result<()> {
    if unsafe { libc::geteuid() } == 0 {
        return Ok(());
    }
    check_perf_event_paranoid(Path::new(PERF_EVENT_PARANOID))
}

/// Check the paranoid level stored at `path`
///
/// Levels up to 1 allow everything pmuscan does. Level 2 hides kernel events,
/// which listing excludes anyway. Level 3 and above (a distro patch) forbid
/// unprivileged counters entirely.
pub fn check_perf_event_paranoid(path: &Path) -> Result<()> {
    let level = match read_paranoid_level(path) {
        Ok(level) => level,
        Err(e) => {
            warn!("Can't check perf limits: {e:#}");
            return Ok(());
        }
    };

    match level {
        ..=1 => Ok(()),
        2 => {
            warn!(
                "perf_event_paranoid is 2: kernel events are hidden, \
                 user-space events are listed only"
            );
            Ok(())
        }
        _ => bail!(
            "Permission denied: perf_event_paranoid is {level}, unprivileged perf is disabled.\n\n\
             Run as root, or allow it with:\n  \
             sudo sysctl kernel.perf_event_paranoid=1"
        ),
    }
}

fn read_paranoid_level(path: &Path) -> Result<i32> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    text.trim()
        .parse()
        .with_context(|| format!("Unexpected content in {}: {:?}", path.display(), text.trim()))
}
