//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use crate::listing::ListRequest;

#[derive(Parser, Debug)]
#[command(
    name = "pmuscan",
    about = "List perf event types supported on this device",
    after_help = "\
TYPES:
    hw            hardware events
    sw            software events
    cache         hw-cache events
    raw           raw events provided by cpu pmu, probed on every core model
    tracepoint    tracepoint events
    pmu           pmu events
    cs-etm        coresight etm events

EXAMPLES:
    pmuscan                                  List every category
    pmuscan hw raw                           Hardware and raw events only
    pmuscan --show-features                  Print supported perf features
    pmuscan raw --raw-table vendor.json      Probe extra raw event numbers"
)]
pub struct Args {
    /// Event categories to list (default: all)
    #[arg(value_name = "TYPES")]
    pub types: Vec<String>,

    /// Print features the kernel supports instead of events
    #[arg(long)]
    pub show_features: bool,

    /// Additional raw events as a JSON event table
    #[arg(long, value_name = "FILE")]
    pub raw_table: Option<PathBuf>,

    /// tracefs mount point (auto-detected if omitted)
    #[arg(long, value_name = "DIR")]
    pub tracefs: Option<PathBuf>,
}

impl Args {
    #[must_use]
    pub fn list_request(&self) -> ListRequest {
        ListRequest { categories: self.types.clone(), show_features: self.show_features }
    }
}
