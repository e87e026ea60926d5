//! JSON raw event tables
//!
//! Format: `{"arm64": {"events": [[number, "NAME", "description"], ...]}}`.
//! The number may be a JSON integer or a hex string such as `"0x11"`.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::catalog::EventType;
use crate::domain::{Arch, CatalogError};
use pmuscan_common::PERF_TYPE_RAW;

/// ARMv8 common architectural and microarchitectural event numbers
const ARM64_EVENTS_JSON: &str = include_str!("../../data/arm64_events.json");

#[derive(Deserialize)]
struct RawEventTable {
    arm64: ArchSection,
}

#[derive(Deserialize)]
struct ArchSection {
    events: Vec<(EventNumber, String, String)>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EventNumber {
    Int(u64),
    Text(String),
}

impl EventNumber {
    fn value(&self) -> Result<u64, CatalogError> {
        match self {
            EventNumber::Int(n) => Ok(*n),
            EventNumber::Text(s) => {
                let trimmed = s.trim();
                let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
                    Some(hex) => u64::from_str_radix(hex, 16),
                    None => trimmed.parse(),
                };
                parsed.map_err(|_| CatalogError::InvalidEventNumber(s.clone()))
            }
        }
    }
}

/// `INST_RETIRED` -> `raw-inst-retired`
fn raw_event_name(name: &str) -> String {
    format!("raw-{}", name.to_lowercase().replace('_', "-"))
}

/// Parse a raw event table from JSON text
///
/// # Errors
/// Returns an error on malformed JSON or an unparseable event number
pub fn parse_raw_table(json: &str) -> Result<Vec<EventType>, CatalogError> {
    let table: RawEventTable = serde_json::from_str(json)?;
    table
        .arm64
        .events
        .iter()
        .map(|(number, name, description)| {
            Ok(EventType::new(raw_event_name(name), PERF_TYPE_RAW, number.value()?)
                .with_description(description.as_str())
                .limited_to(Arch::Arm))
        })
        .collect()
}

/// Load a raw event table file
///
/// # Errors
/// Returns an error if the file cannot be read or is not a valid table
pub fn load_raw_table(path: &Path) -> Result<Vec<EventType>, CatalogError> {
    let json = fs::read_to_string(path)
        .map_err(|source| CatalogError::TableRead { path: path.to_path_buf(), source })?;
    parse_raw_table(&json).map_err(|err| match err {
        CatalogError::Json(source) => CatalogError::TableParse { path: path.to_path_buf(), source },
        other => other,
    })
}

/// Raw events bundled with pmuscan
///
/// The bundled table is checked by the tests below, so a parse failure here
/// can only come from a broken build; it yields no raw events.
pub(crate) fn bundled_arm64_events() -> Vec<EventType> {
    parse_raw_table(ARM64_EVENTS_JSON).unwrap_or_else(|err| {
        log::error!("bundled arm64 event table is invalid: {err}");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_table_parses() {
        let events = parse_raw_table(ARM64_EVENTS_JSON).unwrap();
        assert!(!events.is_empty());
        let cycles = events.iter().find(|e| e.name == "raw-cpu-cycles").unwrap();
        assert_eq!(cycles.config, 0x11);
        assert_eq!(cycles.perf_type, PERF_TYPE_RAW);
        assert_eq!(cycles.limited_arch, Some(Arch::Arm));
        assert!(!cycles.description.is_empty());
    }

    #[test]
    fn test_number_formats() {
        let json = r#"{"arm64": {"events": [
            [8, "INST_RETIRED", "Instruction architecturally executed"],
            ["0x1B", "INST_SPEC", "Operation speculatively executed"]
        ]}}"#;
        let events = parse_raw_table(json).unwrap();
        assert_eq!(events[0].name, "raw-inst-retired");
        assert_eq!(events[0].config, 8);
        assert_eq!(events[1].name, "raw-inst-spec");
        assert_eq!(events[1].config, 0x1b);
    }

    #[test]
    fn test_bad_number_is_rejected() {
        let json = r#"{"arm64": {"events": [["0xZZ", "BAD", ""]]}}"#;
        assert!(matches!(parse_raw_table(json), Err(CatalogError::InvalidEventNumber(_))));
    }

    #[test]
    fn test_load_reports_path_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_raw_table(&path).unwrap_err();
        assert!(matches!(err, CatalogError::TableParse { .. }));
        assert!(err.to_string().contains("table.json"));
    }
}
