//! CPU core models
//!
//! Groups cores that are expected to share PMU behaviour. On ARM big.LITTLE
//! devices that is one group per (implementer, part, variant) triple from
//! `/proc/cpuinfo`; elsewhere all online cores form a single model.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use log::debug;

use super::cpu_range::online_cpus_from;
use crate::domain::{Arch, CpuId};

/// Cores believed to have identical PMUs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuModel {
    label: String,
    cpus: Vec<CpuId>,
}

impl CpuModel {
    /// Returns `None` for an empty core list
    #[must_use]
    pub fn new(label: impl Into<String>, mut cpus: Vec<CpuId>) -> Option<Self> {
        if cpus.is_empty() {
            return None;
        }
        cpus.sort_unstable();
        cpus.dedup();
        Some(Self { label: label.into(), cpus })
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Sorted core ids, never empty
    #[must_use]
    pub fn cpus(&self) -> &[CpuId] {
        &self.cpus
    }

    /// Core the probe runs on for this model
    #[must_use]
    pub fn representative(&self) -> CpuId {
        self.cpus[0]
    }
}

/// Supplies the core models of the current device
pub trait CpuModelSource {
    /// # Errors
    /// Returns an error when the device topology cannot be read
    fn cpu_models(&self) -> Result<Vec<CpuModel>>;
}

/// Core models read from procfs/sysfs
#[derive(Debug, Clone)]
pub struct DeviceCpuModels {
    arch: Arch,
    cpuinfo: PathBuf,
    online: PathBuf,
}

impl Default for DeviceCpuModels {
    fn default() -> Self {
        Self {
            arch: Arch::current(),
            cpuinfo: PathBuf::from("/proc/cpuinfo"),
            online: PathBuf::from("/sys/devices/system/cpu/online"),
        }
    }
}

impl DeviceCpuModels {
    /// Read from alternate locations, for fixtures
    #[must_use]
    pub fn with_paths(arch: Arch, cpuinfo: PathBuf, online: PathBuf) -> Self {
        Self { arch, cpuinfo, online }
    }
}

impl CpuModelSource for DeviceCpuModels {
    fn cpu_models(&self) -> Result<Vec<CpuModel>> {
        if self.arch == Arch::Arm {
            let cpuinfo = fs::read_to_string(&self.cpuinfo)
                .with_context(|| format!("Failed to read {}", self.cpuinfo.display()))?;
            return Ok(parse_arm_cpu_models(&cpuinfo));
        }
        let cpus = online_cpus_from(&self.online)?;
        Ok(CpuModel::new("all", cpus).into_iter().collect())
    }
}

#[derive(Default)]
struct ProcessorEntry {
    cpu: Option<u32>,
    implementer: Option<String>,
    part: Option<String>,
    variant: Option<String>,
}

impl ProcessorEntry {
    fn model_key(&self) -> Option<String> {
        let implementer = self.implementer.as_deref()?;
        let part = self.part.as_deref()?;
        let variant = self.variant.as_deref().unwrap_or("0x0");
        Some(format!("{implementer}/{part}/{variant}"))
    }
}

/// Group `/proc/cpuinfo` processors by (implementer, part, variant)
///
/// Models come out in the order their first core appears.
#[must_use]
pub fn parse_arm_cpu_models(cpuinfo: &str) -> Vec<CpuModel> {
    let mut entries: Vec<ProcessorEntry> = Vec::new();

    for line in cpuinfo.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if key == "processor" {
            entries.push(ProcessorEntry { cpu: value.parse().ok(), ..ProcessorEntry::default() });
            continue;
        }
        let Some(entry) = entries.last_mut() else {
            continue;
        };
        match key {
            "CPU implementer" => entry.implementer = Some(value.to_string()),
            "CPU part" => entry.part = Some(value.to_string()),
            "CPU variant" => entry.variant = Some(value.to_string()),
            _ => {}
        }
    }

    let mut groups: Vec<(String, Vec<CpuId>)> = Vec::new();
    for entry in &entries {
        let (Some(cpu), Some(key)) = (entry.cpu, entry.model_key()) else {
            debug!("Skipping cpuinfo entry without cpu id or part number");
            continue;
        };
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, cpus)) => cpus.push(CpuId(cpu)),
            None => groups.push((key, vec![CpuId(cpu)])),
        }
    }

    groups.into_iter().filter_map(|(key, cpus)| CpuModel::new(key, cpus)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BIG_LITTLE: &str = "\
processor\t: 0
BogoMIPS\t: 38.40
CPU implementer\t: 0x41
CPU architecture: 8
CPU variant\t: 0x1
CPU part\t: 0xd05
CPU revision\t: 0

processor\t: 1
CPU implementer\t: 0x41
CPU variant\t: 0x1
CPU part\t: 0xd05

processor\t: 2
CPU implementer\t: 0x41
CPU variant\t: 0x1
CPU part\t: 0xd0d

processor\t: 3
CPU implementer\t: 0x41
CPU variant\t: 0x1
CPU part\t: 0xd0d

Hardware\t: Some SoC
";

    fn ids(raw: &[u32]) -> Vec<CpuId> {
        raw.iter().copied().map(CpuId).collect()
    }

    #[test]
    fn test_parse_big_little() {
        let models = parse_arm_cpu_models(BIG_LITTLE);
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].label(), "0x41/0xd05/0x1");
        assert_eq!(models[0].cpus(), ids(&[0, 1]).as_slice());
        assert_eq!(models[1].cpus(), ids(&[2, 3]).as_slice());
        assert_eq!(models[1].representative(), CpuId(2));
    }

    #[test]
    fn test_interleaved_cores_group_together() {
        let cpuinfo = "\
processor : 0\nCPU implementer : 0x41\nCPU part : 0xd05\n
processor : 1\nCPU implementer : 0x41\nCPU part : 0xd41\n
processor : 2\nCPU implementer : 0x41\nCPU part : 0xd05\n";
        let models = parse_arm_cpu_models(cpuinfo);
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].cpus(), ids(&[0, 2]).as_slice());
        assert_eq!(models[1].cpus(), ids(&[1]).as_slice());
    }

    #[test]
    fn test_x86_style_cpuinfo_has_no_models() {
        let cpuinfo = "processor\t: 0\nvendor_id\t: GenuineIntel\nmodel name\t: Some CPU\n";
        assert!(parse_arm_cpu_models(cpuinfo).is_empty());
    }

    #[test]
    fn test_empty_model_is_rejected() {
        assert!(CpuModel::new("none", Vec::new()).is_none());
    }

    #[test]
    fn test_device_models_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let cpuinfo = dir.path().join("cpuinfo");
        let online = dir.path().join("online");
        fs::write(&cpuinfo, BIG_LITTLE).unwrap();
        fs::write(&online, "0-5\n").unwrap();

        let arm = DeviceCpuModels::with_paths(Arch::Arm, cpuinfo.clone(), online.clone());
        assert_eq!(arm.cpu_models().unwrap().len(), 2);

        let x86 = DeviceCpuModels::with_paths(Arch::X86, cpuinfo, online);
        let models = x86.cpu_models().unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].cpus(), ids(&[0, 1, 2, 3, 4, 5]).as_slice());
    }

    #[test]
    fn test_missing_cpuinfo_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = DeviceCpuModels::with_paths(
            Arch::Arm,
            dir.path().join("missing"),
            dir.path().join("missing-online"),
        );
        assert!(source.cpu_models().is_err());
    }
}
