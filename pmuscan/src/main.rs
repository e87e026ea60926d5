//! # pmuscan - Main Entry Point
//!
//! Loads the event catalog, runs the pre-flight check and hands the request
//! to the lister, which writes to stdout.

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use std::io::{self, Write};

use pmuscan::catalog::{etm_event_type, Catalog, CatalogOptions};
use pmuscan::cli::Args;
use pmuscan::domain::ListError;
use pmuscan::listing::{check_tokens, EventLister};
use pmuscan::perf::{KernelCounters, KernelFeatures};
use pmuscan::preflight::run_preflight_checks;
use pmuscan::probe::DeviceCpuModels;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_NOPERM: i32 = 77;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if matches!(err.downcast_ref::<ListError>(), Some(ListError::UnknownCategory(_))) {
        return EXIT_USAGE;
    }
    let msg = err.to_string().to_lowercase();
    if msg.contains("permission denied") {
        EXIT_NOPERM
    } else {
        EXIT_ERROR
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    check_tokens(&args.types)?;
    run_preflight_checks()?;

    let mut options = CatalogOptions { raw_table: args.raw_table.clone(), ..CatalogOptions::default() };
    if args.tracefs.is_some() {
        options.tracefs.clone_from(&args.tracefs);
    }
    debug!("tracefs: {:?}", options.tracefs);

    let catalog = Catalog::load(&options).context("Failed to load event catalog")?;
    debug!("{} events in catalog", catalog.len());

    let counters = KernelCounters;
    let features = KernelFeatures::new(&counters, options.tracefs.clone());
    let cpu_models = DeviceCpuModels::default();
    let lister = EventLister::new(&catalog, &cpu_models, &counters, &features)
        .with_etm_type(etm_event_type(&options.sysfs_root))
        .with_tracefs(options.tracefs.clone());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    lister.run(&args.list_request(), &mut out)?;
    out.flush()?;
    Ok(())
}
