//! Raw event probing
//!
//! - `cpu_range`: CPU list formatting (`0-2,4,6-7`) and parsing
//! - `cpu_models`: core models of the device (big.LITTLE clusters)
//! - `worker`: short-lived thread pinned to the core under test
//! - `tester`: one event on one core, classified as supported / may / not
//! - `checker`: one event across every core model

pub mod checker;
pub mod cpu_models;
pub mod cpu_range;
pub mod tester;
pub mod worker;

pub use checker::{RawEventSupportChecker, SupportStatus};
pub use cpu_models::{CpuModel, CpuModelSource, DeviceCpuModels};
pub use cpu_range::{format_cpu_list, online_cpus, parse_cpu_list};
pub use tester::{Support, SupportTester};
pub use worker::ProbeContext;
