//! Shared test utilities for sketchport integration tests.
//!
//! Plan builders, pinned export options and report checks used by every
//! test crate via `mod common;`.

#![allow(dead_code)]

pub mod builders;

use chrono::{TimeZone, Utc};
use sketchport::{export, CompatibilityReport, ExportOptions, FloorPlanData, TargetFormat};

// ===========================================================================
// Export helpers
// ===========================================================================

/// Export options with a fixed timestamp so output is reproducible.
pub fn pinned_options() -> ExportOptions {
    ExportOptions::default()
        .with_title("Integration Test")
        .with_timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
}

/// Export `plan` and return the main payload bytes.
pub fn export_bytes(plan: &FloorPlanData, target: TargetFormat) -> Vec<u8> {
    export(plan, target, &pinned_options())
        .unwrap_or_else(|e| panic!("{} export failed: {}", target, e))
        .data
}

/// Export a text format and return it as a string.
pub fn export_text(plan: &FloorPlanData, target: TargetFormat) -> String {
    String::from_utf8(export_bytes(plan, target)).expect("text payload is UTF-8")
}

/// Group code / value pairs of an ASCII DXF payload.
pub fn dxf_pairs(text: &str) -> Vec<(i32, String)> {
    let lines: Vec<&str> = text.lines().collect();
    lines
        .chunks(2)
        .filter(|c| c.len() == 2)
        .map(|c| {
            let code = c[0].trim().parse::<i32>().expect("group code line");
            (code, c[1].to_string())
        })
        .collect()
}

/// Count the entities of one type in an ASCII DXF payload.
pub fn count_dxf_entities(text: &str, entity: &str) -> usize {
    dxf_pairs(text)
        .iter()
        .filter(|(code, value)| *code == 0 && value == entity)
        .count()
}

/// Count IFC instances of one entity type, e.g. `IFCWALLSTANDARDCASE`.
pub fn count_ifc_entities(text: &str, entity: &str) -> usize {
    let needle = format!("={}(", entity);
    text.lines().filter(|l| l.contains(&needle)).count()
}

// ===========================================================================
// Report checks
// ===========================================================================

/// Totals and rate agree with the per-kind counters.
pub fn assert_report_consistent(report: &CompatibilityReport) {
    assert_eq!(report.total_converted, report.converted.total());
    assert_eq!(report.total_skipped, report.skipped.total());
    assert_eq!(
        report.total_entities_in_source,
        report.total_converted + report.total_skipped
    );
    assert!(report.conversion_rate <= 100);
    if report.total_entities_in_source == 0 {
        assert_eq!(report.conversion_rate, 100);
    } else {
        let expected = (report.total_converted as f64 / report.total_entities_in_source as f64
            * 100.0)
            .round() as u32;
        assert_eq!(report.conversion_rate, expected);
    }
}

/// Compare two floats to a tolerance, with a readable failure.
pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {} within {} of {}",
        actual,
        tolerance,
        expected
    );
}
