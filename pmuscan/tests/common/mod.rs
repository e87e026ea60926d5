//! In-memory collaborators for listing tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::io;

use anyhow::{bail, Result};
use pmuscan::domain::{CpuId, Tid};
use pmuscan::perf::{Counter, CounterBackend, FeatureProbe};
use pmuscan::probe::{CpuModel, CpuModelSource};
use pmuscan_common::PerfEventAttr;

pub fn cpus(raw: &[u32]) -> Vec<CpuId> {
    raw.iter().copied().map(CpuId).collect()
}

pub struct FakeModels(pub Vec<CpuModel>);

impl FakeModels {
    pub fn new(groups: &[&[u32]]) -> Self {
        Self(
            groups
                .iter()
                .enumerate()
                .map(|(i, g)| CpuModel::new(format!("model-{i}"), cpus(g)).unwrap())
                .collect(),
        )
    }
}

impl CpuModelSource for FakeModels {
    fn cpu_models(&self) -> Result<Vec<CpuModel>> {
        Ok(self.0.clone())
    }
}

pub struct NoCpuInfo;

impl CpuModelSource for NoCpuInfo {
    fn cpu_models(&self) -> Result<Vec<CpuModel>> {
        bail!("cpuinfo unreadable")
    }
}

struct Fixed(u64);

impl Counter for Fixed {
    fn read_value(&self) -> io::Result<u64> {
        Ok(self.0)
    }
}

/// Scripted kernel
///
/// Pinned opens (raw probes) read the value listed for their cpu and fail
/// on any other cpu. Unpinned opens (direct checks) succeed only for the
/// names in `accepted`.
#[derive(Default)]
pub struct FakeCounters {
    pub readings: Vec<(CpuId, u64)>,
    pub accepted: Vec<&'static str>,
    pub opens: RefCell<Vec<(String, Option<CpuId>)>>,
}

impl FakeCounters {
    pub fn with_readings(readings: &[(u32, u64)]) -> Self {
        Self {
            readings: readings.iter().map(|&(cpu, v)| (CpuId(cpu), v)).collect(),
            ..Self::default()
        }
    }

    pub fn accepting(mut self, names: &[&'static str]) -> Self {
        self.accepted = names.to_vec();
        self
    }
}

impl CounterBackend for FakeCounters {
    fn open_counter(
        &self,
        _attr: &PerfEventAttr,
        _tid: Tid,
        cpu: Option<CpuId>,
        name: &str,
    ) -> io::Result<Box<dyn Counter>> {
        self.opens.borrow_mut().push((name.to_string(), cpu));
        let rejected = || io::Error::from_raw_os_error(libc::ENOENT);
        match cpu {
            Some(cpu) => self
                .readings
                .iter()
                .find(|(c, _)| *c == cpu)
                .map(|&(_, v)| Box::new(Fixed(v)) as Box<dyn Counter>)
                .ok_or_else(rejected),
            None if self.accepted.iter().any(|a| *a == name) => Ok(Box::new(Fixed(1))),
            None => Err(rejected()),
        }
    }
}

pub struct FakeFeatures {
    pub dwarf: bool,
    pub offcpu: bool,
    pub clockid: bool,
}

impl FeatureProbe for FakeFeatures {
    fn dwarf_call_graph_supported(&self) -> bool {
        self.dwarf
    }

    fn trace_offcpu_supported(&self) -> bool {
        self.offcpu
    }

    fn set_clockid_supported(&self) -> bool {
        self.clockid
    }
}

pub const NO_FEATURES: FakeFeatures = FakeFeatures { dwarf: false, offcpu: false, clockid: false };
