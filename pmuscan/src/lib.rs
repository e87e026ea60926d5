//! # pmuscan - perf event capability discovery
//!
//! pmuscan lists the perf events a Linux device can actually count. Generic
//! hardware, software, cache and tracepoint events are checked with a single
//! `perf_event_open` on the calling thread. Raw PMU events are probed on
//! every core model: on big.LITTLE parts the little and big cores implement
//! different event sets, and the kernel will happily open a raw event code
//! the core has no counter for.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    listing::EventLister                     │
//! │  resolve categories ──▶ walk catalog ──▶ print supported    │
//! └──────────┬──────────────────────────────┬───────────────────┘
//!            │ non-raw                      │ raw
//!            ▼                              ▼
//! ┌──────────────────────┐   ┌──────────────────────────────────┐
//! │  direct open check   │   │  probe::RawEventSupportChecker   │
//! │  (calling thread,    │   │  one model at a time             │
//! │   kernel excluded)   │   └───────────────┬──────────────────┘
//! └──────────┬───────────┘                   ▼
//!            │               ┌──────────────────────────────────┐
//!            │               │  probe::SupportTester            │
//!            │               │  worker pinned to the model's    │
//!            │               │  first core, counter on its tid  │
//!            │               └───────────────┬──────────────────┘
//!            ▼                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              perf::CounterBackend (perf_event_open)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`catalog`]: event descriptors (builtin tables, JSON raw tables, sysfs
//!   PMU events, tracepoints) and their enumeration
//! - [`perf`]: counter backend over `perf_event_open(2)` and the
//!   `--show-features` queries
//! - [`probe`]: cpu list formatting, core models, the pinned worker, the
//!   single-core tester and the per-model checker
//! - [`listing`]: categories, the capability cache and the orchestrator
//! - [`preflight`]: `perf_event_paranoid` check
//! - [`cli`]: command-line arguments
//! - [`domain`]: newtypes (Tid, CpuId, Arch) and error types
//!
//! ## Support Verdicts
//!
//! A raw event is reported per core:
//! - **supported**: the pinned counter read non-zero after the workload
//! - **may supported**: it opened but read zero; the event might exist and
//!   simply never fired
//! - nothing: open or read failed on that core
//!
//! ## Typical Usage
//!
//! ```bash
//! pmuscan                  # every category
//! pmuscan raw              # raw events with per-core annotations
//! pmuscan --show-features  # dwarf-based-call-graph, trace-offcpu, set-clockid
//! RUST_LOG=debug pmuscan raw
//! ```

pub mod catalog;
pub mod cli;
pub mod domain;
pub mod listing;
pub mod perf;
pub mod preflight;
pub mod probe;
