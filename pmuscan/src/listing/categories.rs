//! Event categories selectable on the command line

use std::fmt;

use pmuscan_common::{
    PERF_TYPE_HARDWARE, PERF_TYPE_HW_CACHE, PERF_TYPE_RAW, PERF_TYPE_SOFTWARE, PERF_TYPE_TRACEPOINT,
};

use crate::catalog::EventType;
use crate::domain::ListError;

/// Token selecting raw events; probed per core model instead of checked once
pub const RAW_CATEGORY: &str = "raw";

/// A named filter over the catalog
pub struct Category {
    pub name: &'static str,
    pub description: &'static str,
    filter: Box<dyn Fn(&EventType) -> bool>,
}

impl Category {
    fn new(
        name: &'static str,
        description: &'static str,
        filter: impl Fn(&EventType) -> bool + 'static,
    ) -> Self {
        Self { name, description, filter: Box::new(filter) }
    }

    #[must_use]
    pub fn matches(&self, event: &EventType) -> bool {
        (self.filter)(event)
    }

    #[must_use]
    pub fn is_raw(&self) -> bool {
        self.name == RAW_CATEGORY
    }
}

impl fmt::Debug for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Category")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// All categories, sorted by name
///
/// `etm_type` is the dynamic type of the coresight ETM PMU; without one the
/// `cs-etm` category matches nothing.
#[must_use]
pub fn category_table(etm_type: Option<u32>) -> Vec<Category> {
    vec![
        Category::new("cache", "hw-cache events", |e| e.perf_type == PERF_TYPE_HW_CACHE),
        Category::new("cs-etm", "coresight etm events", move |e| Some(e.perf_type) == etm_type),
        Category::new("hw", "hardware events", |e| e.perf_type == PERF_TYPE_HARDWARE),
        Category::new("pmu", "pmu events", EventType::is_pmu_event),
        Category::new(RAW_CATEGORY, "raw events provided by cpu pmu", |e| e.perf_type == PERF_TYPE_RAW),
        Category::new("sw", "software events", |e| e.perf_type == PERF_TYPE_SOFTWARE),
        Category::new("tracepoint", "tracepoint events", |e| e.perf_type == PERF_TYPE_TRACEPOINT),
    ]
}

/// Fail on the first token that names no category
///
/// # Errors
/// [`ListError::UnknownCategory`] carrying the offending token
pub fn check_tokens(tokens: &[String]) -> Result<(), ListError> {
    let table = category_table(None);
    match tokens.iter().find(|t| !table.iter().any(|c| c.name == t.as_str())) {
        Some(token) => Err(ListError::UnknownCategory(token.clone())),
        None => Ok(()),
    }
}
