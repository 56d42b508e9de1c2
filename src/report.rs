//! Compatibility reporting for imports.
//!
//! Every import returns a [`CompatibilityReport`] next to the plan. It counts
//! what was converted and what was skipped per category, and carries
//! severity-tagged notes explaining each loss. Nothing an importer drops may
//! go unrecorded here.
//!
//! The report is filled while parsing and sealed with
//! [`CompatibilityReport::finalize`], which derives the totals and the
//! conversion rate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::detect::FileFormat;

/// Severity of a report item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// What a report item is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportCategory {
    /// File header, version, encoding, units
    Metadata,
    Layers,
    Blocks,
    Geometry,
    Walls,
    Rooms,
    Openings,
    Dimensions,
    Annotations,
    Materials,
    TradeLayers,
    /// Import summary
    Summary,
}

impl fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Metadata => "metadata",
            Self::Layers => "layers",
            Self::Blocks => "blocks",
            Self::Geometry => "geometry",
            Self::Walls => "walls",
            Self::Rooms => "rooms",
            Self::Openings => "openings",
            Self::Dimensions => "dimensions",
            Self::Annotations => "annotations",
            Self::Materials => "materials",
            Self::TradeLayers => "tradeLayers",
            Self::Summary => "summary",
        };
        f.write_str(s)
    }
}

/// A single human-readable note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportItem {
    pub severity: Severity,
    pub category: ReportCategory,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_count: Option<usize>,
}

impl ReportItem {
    pub fn new(severity: Severity, category: ReportCategory, message: impl Into<String>) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            entity_count: None,
        }
    }

    /// Builder: attach an entity count
    pub fn with_count(mut self, count: usize) -> Self {
        self.entity_count = Some(count);
        self
    }
}

impl fmt::Display for ReportItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.severity, self.category, self.message)?;
        if let Some(n) = self.entity_count {
            write!(f, " ({})", n)?;
        }
        Ok(())
    }
}

/// Converted entity counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedCounts {
    pub walls: usize,
    pub rooms: usize,
    pub doors: usize,
    pub windows: usize,
    pub fixtures: usize,
    pub labels: usize,
    pub dimensions: usize,
    pub trade_layers: usize,
}

impl ConvertedCounts {
    pub fn total(&self) -> usize {
        self.walls
            + self.rooms
            + self.doors
            + self.windows
            + self.fixtures
            + self.labels
            + self.dimensions
            + self.trade_layers
    }
}

/// Skipped entity counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedCounts {
    pub blocks: usize,
    pub hatches: usize,
    #[serde(rename = "threeDSolids")]
    pub three_d_solids: usize,
    pub custom_layers: usize,
    pub materials: usize,
    pub annotations: usize,
    pub other: usize,
}

impl SkippedCounts {
    pub fn total(&self) -> usize {
        self.blocks
            + self.hatches
            + self.three_d_solids
            + self.custom_layers
            + self.materials
            + self.annotations
            + self.other
    }
}

/// Converted counter selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Converted {
    Walls,
    Rooms,
    Doors,
    Windows,
    Fixtures,
    Labels,
    Dimensions,
    TradeLayers,
}

/// Skipped counter selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Skipped {
    Blocks,
    Hatches,
    ThreeDSolids,
    CustomLayers,
    Materials,
    Annotations,
    Other,
}

/// The per-import honesty record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityReport {
    pub source_format: FileFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_version: Option<String>,
    pub file_name: String,
    pub imported_at: DateTime<Utc>,
    pub converted: ConvertedCounts,
    pub skipped: SkippedCounts,
    pub items: Vec<ReportItem>,
    pub total_entities_in_source: usize,
    pub total_converted: usize,
    pub total_skipped: usize,
    pub conversion_rate: u32,
}

impl CompatibilityReport {
    /// Create an empty report for one import.
    pub fn new(source_format: FileFormat, file_name: impl Into<String>) -> Self {
        Self {
            source_format,
            source_version: None,
            file_name: file_name.into(),
            imported_at: Utc::now(),
            converted: ConvertedCounts::default(),
            skipped: SkippedCounts::default(),
            items: Vec::new(),
            total_entities_in_source: 0,
            total_converted: 0,
            total_skipped: 0,
            conversion_rate: 100,
        }
    }

    /// Count one converted entity.
    pub fn convert(&mut self, counter: Converted) {
        self.convert_n(counter, 1);
    }

    /// Count `n` converted entities.
    pub fn convert_n(&mut self, counter: Converted, n: usize) {
        let c = &mut self.converted;
        let slot = match counter {
            Converted::Walls => &mut c.walls,
            Converted::Rooms => &mut c.rooms,
            Converted::Doors => &mut c.doors,
            Converted::Windows => &mut c.windows,
            Converted::Fixtures => &mut c.fixtures,
            Converted::Labels => &mut c.labels,
            Converted::Dimensions => &mut c.dimensions,
            Converted::TradeLayers => &mut c.trade_layers,
        };
        *slot += n;
    }

    /// Count one skipped entity.
    pub fn skip(&mut self, counter: Skipped) {
        self.skip_n(counter, 1);
    }

    /// Count `n` skipped entities.
    pub fn skip_n(&mut self, counter: Skipped, n: usize) {
        let s = &mut self.skipped;
        let slot = match counter {
            Skipped::Blocks => &mut s.blocks,
            Skipped::Hatches => &mut s.hatches,
            Skipped::ThreeDSolids => &mut s.three_d_solids,
            Skipped::CustomLayers => &mut s.custom_layers,
            Skipped::Materials => &mut s.materials,
            Skipped::Annotations => &mut s.annotations,
            Skipped::Other => &mut s.other,
        };
        *slot += n;
    }

    /// Record a note.
    pub fn push(&mut self, item: ReportItem) {
        self.items.push(item);
    }

    pub fn info(&mut self, category: ReportCategory, message: impl Into<String>) {
        self.push(ReportItem::new(Severity::Info, category, message));
    }

    pub fn warning(&mut self, category: ReportCategory, message: impl Into<String>) {
        self.push(ReportItem::new(Severity::Warning, category, message));
    }

    pub fn error(&mut self, category: ReportCategory, message: impl Into<String>) {
        self.push(ReportItem::new(Severity::Error, category, message));
    }

    /// Seal the report: compute totals and the conversion rate.
    ///
    /// The rate is `round(converted / total * 100)`, or 100 when the source
    /// held no entities. Calling it again recomputes from the counters.
    pub fn finalize(mut self) -> Self {
        self.total_converted = self.converted.total();
        self.total_skipped = self.skipped.total();
        self.total_entities_in_source = self.total_converted + self.total_skipped;
        self.conversion_rate = if self.total_entities_in_source == 0 {
            100
        } else {
            (self.total_converted as f64 / self.total_entities_in_source as f64 * 100.0).round()
                as u32
        };
        self
    }

    /// Items of one severity.
    pub fn of_severity(&self, severity: Severity) -> Vec<&ReportItem> {
        self.items.iter().filter(|i| i.severity == severity).collect()
    }

    /// Whether any item of the given severity exists.
    pub fn has_severity(&self, severity: Severity) -> bool {
        self.items.iter().any(|i| i.severity == severity)
    }

    /// Items about one category.
    pub fn in_category(&self, category: ReportCategory) -> Vec<&ReportItem> {
        self.items.iter().filter(|i| i.category == category).collect()
    }

    /// Iterate over all items.
    pub fn iter(&self) -> std::slice::Iter<'_, ReportItem> {
        self.items.iter()
    }
}

impl<'a> IntoIterator for &'a CompatibilityReport {
    type Item = &'a ReportItem;
    type IntoIter = std::slice::Iter<'a, ReportItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> CompatibilityReport {
        CompatibilityReport::new(FileFormat::Dxf, "plan.dxf")
    }

    #[test]
    fn test_empty_report_is_100() {
        let r = report().finalize();
        assert_eq!(r.total_entities_in_source, 0);
        assert_eq!(r.conversion_rate, 100);
    }

    #[test]
    fn test_rate_rounding() {
        let mut r = report();
        r.convert_n(Converted::Walls, 2);
        r.skip(Skipped::Hatches);
        let r = r.finalize();
        assert_eq!(r.total_converted, 2);
        assert_eq!(r.total_skipped, 1);
        assert_eq!(r.total_entities_in_source, 3);
        assert_eq!(r.conversion_rate, 67);
    }

    #[test]
    fn test_all_skipped_is_zero() {
        let mut r = report();
        r.skip_n(Skipped::Blocks, 5);
        assert_eq!(r.finalize().conversion_rate, 0);
    }

    #[test]
    fn test_queries() {
        let mut r = report();
        r.info(ReportCategory::Layers, "3 layers");
        r.warning(ReportCategory::Blocks, "blocks skipped");
        r.push(ReportItem::new(Severity::Warning, ReportCategory::Geometry, "splines").with_count(2));
        assert_eq!(r.of_severity(Severity::Warning).len(), 2);
        assert!(!r.has_severity(Severity::Error));
        assert_eq!(r.in_category(ReportCategory::Layers).len(), 1);
        assert_eq!(r.iter().count(), 3);
    }

    #[test]
    fn test_item_display() {
        let item = ReportItem::new(Severity::Warning, ReportCategory::Geometry, "splines skipped").with_count(4);
        assert_eq!(item.to_string(), "[warning/geometry] splines skipped (4)");
    }

    #[test]
    fn test_serialized_keys() {
        let mut r = report();
        r.skip(Skipped::ThreeDSolids);
        let json = serde_json::to_value(r.finalize()).unwrap();
        assert_eq!(json["skipped"]["threeDSolids"], 1);
        assert_eq!(json["conversionRate"], 0);
        assert_eq!(json["sourceFormat"], "dxf");
    }
}
