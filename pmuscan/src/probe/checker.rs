//! Per-core-model raw event support
//!
//! Probes one representative core per model, strictly one model at a time:
//! counters are a scarce shared resource and concurrent probes would skew
//! each other's readings.

use log::{debug, error};

use super::cpu_models::{CpuModel, CpuModelSource};
use super::tester::{Support, SupportTester};
use crate::catalog::EventType;
use crate::domain::{CpuId, ListError};
use crate::perf::CounterBackend;

/// Cores on which one raw event counted, or might count
///
/// Both lists are sorted and no core appears in both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupportStatus {
    pub supported_cpus: Vec<CpuId>,
    pub may_supported_cpus: Vec<CpuId>,
}

impl SupportStatus {
    /// Neither confirmed nor possible anywhere
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.supported_cpus.is_empty() && self.may_supported_cpus.is_empty()
    }

    /// Record the verdict for every core of `model`
    pub fn add(&mut self, model: &CpuModel, support: Support) {
        match support {
            Support::Supported => {
                self.may_supported_cpus.retain(|cpu| !model.cpus().contains(cpu));
                self.supported_cpus.extend_from_slice(model.cpus());
            }
            Support::MaySupported => {
                let new = model.cpus().iter().filter(|cpu| !self.supported_cpus.contains(*cpu));
                self.may_supported_cpus.extend(new);
            }
            Support::Unsupported => {}
        }
    }

    fn normalize(&mut self) {
        for cpus in [&mut self.supported_cpus, &mut self.may_supported_cpus] {
            cpus.sort_unstable();
            cpus.dedup();
        }
    }
}

/// Raw event checker bound to the device's core models
pub struct RawEventSupportChecker<'a> {
    tester: SupportTester<'a>,
    models: Vec<CpuModel>,
}

impl<'a> RawEventSupportChecker<'a> {
    /// Resolve the device's core models
    ///
    /// # Errors
    /// [`ListError::CpuModelsUnavailable`] when the model list cannot be read
    /// or is empty; no raw event can be probed in that case.
    pub fn new(
        counters: &'a dyn CounterBackend,
        source: &dyn CpuModelSource,
    ) -> Result<Self, ListError> {
        let models = match source.cpu_models() {
            Ok(models) => models,
            Err(err) => {
                error!("can't get device cpu info: {err:#}");
                return Err(ListError::CpuModelsUnavailable);
            }
        };
        if models.is_empty() {
            error!("can't get device cpu info: no cpu models found");
            return Err(ListError::CpuModelsUnavailable);
        }
        for model in &models {
            debug!("cpu model {}: {} cores", model.label(), model.cpus().len());
        }
        Ok(Self { tester: SupportTester::new(counters), models })
    }

    /// Probe `event` on every core model, one after another
    #[must_use]
    pub fn support_status(&self, event: &EventType) -> SupportStatus {
        let mut status = SupportStatus::default();
        for model in &self.models {
            let support = self.tester.test_on_cpu(event, model.representative());
            debug!("{} on model {}: {support:?}", event.name, model.label());
            status.add(model, support);
        }
        status.normalize();
        status
    }
}
