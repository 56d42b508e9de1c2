//! Per-call import state
//!
//! Every import owns one [`ImportContext`]: the plan under construction, its
//! report, and the id counters. Nothing here outlives the call, so two imports
//! never share counters and repeated imports of the same content produce the
//! same ids.

use ahash::AHashMap;
use indexmap::IndexMap;
use tracing::{debug, info};

use super::options::ImportConfiguration;
use super::ImportResult;
use crate::detect::FileFormat;
use crate::geometry::detect_rooms;
use crate::model::{DimensionLine, FloorPlanData, Label, Wall};
use crate::report::{
    CompatibilityReport, Converted, ReportCategory, ReportItem, Severity, Skipped,
};
use crate::types::Point;

/// How one kind of unsupported source entity is accounted for
#[derive(Debug, Clone, Copy)]
pub(crate) struct SkipRule {
    pub counter: Skipped,
    pub severity: Severity,
    pub category: ReportCategory,
    pub reason: &'static str,
}

impl SkipRule {
    pub const fn new(
        counter: Skipped,
        severity: Severity,
        category: ReportCategory,
        reason: &'static str,
    ) -> Self {
        Self {
            counter,
            severity,
            category,
            reason,
        }
    }
}

/// Zero-length or non-finite segments
pub(crate) const DEGENERATE_SEGMENT: SkipRule = SkipRule::new(
    Skipped::Other,
    Severity::Info,
    ReportCategory::Geometry,
    "zero-length or non-finite segments are not walls",
);

/// Synthetic ids `<prefix>-<kind>-<n>`, numbered per kind from 1
#[derive(Debug)]
pub(crate) struct IdGenerator {
    prefix: &'static str,
    counters: AHashMap<&'static str, usize>,
}

impl IdGenerator {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            counters: AHashMap::new(),
        }
    }

    pub fn next(&mut self, kind: &'static str) -> String {
        let n = self.counters.entry(kind).or_insert(0);
        *n += 1;
        format!("{}-{}-{}", self.prefix, kind, n)
    }
}

pub(crate) struct ImportContext<'a> {
    pub plan: FloorPlanData,
    pub report: CompatibilityReport,
    pub config: &'a ImportConfiguration,
    ids: IdGenerator,
    skips: IndexMap<String, (SkipRule, usize)>,
}

impl<'a> ImportContext<'a> {
    pub fn new(
        format: FileFormat,
        id_prefix: &'static str,
        file_name: &str,
        config: &'a ImportConfiguration,
    ) -> Self {
        Self {
            plan: FloorPlanData::new(),
            report: CompatibilityReport::new(format, file_name),
            config,
            ids: IdGenerator::new(id_prefix),
            skips: IndexMap::new(),
        }
    }

    pub fn next_id(&mut self, kind: &'static str) -> String {
        self.ids.next(kind)
    }

    /// Account for one unsupported source entity of `kind`
    pub fn skip(&mut self, kind: impl Into<String>, rule: SkipRule) {
        self.skip_n(kind, rule, 1);
    }

    pub fn skip_n(&mut self, kind: impl Into<String>, rule: SkipRule, n: usize) {
        if n == 0 {
            return;
        }
        let kind = kind.into();
        debug!(kind = %kind, count = n, reason = rule.reason, "skipping source entities");
        self.report.skip_n(rule.counter, n);
        self.skips.entry(kind).or_insert((rule, 0)).1 += n;
    }

    /// Add a wall with the default height; degenerate segments are skipped
    pub fn add_wall(&mut self, start: Point, end: Point, thickness: f64) -> bool {
        if !start.is_finite() || !end.is_finite() || start.distance(&end) < crate::geometry::DEGENERATE_LENGTH {
            self.skip("degenerate segment", DEGENERATE_SEGMENT);
            return false;
        }
        let id = self.next_id("w");
        self.plan.walls.push(Wall {
            id,
            start,
            end,
            thickness,
            height: self.config.default_wall_height,
        });
        self.report.convert(Converted::Walls);
        true
    }

    /// Walls along consecutive points, closing back to the first when asked
    pub fn add_polyline(&mut self, points: &[Point], closed: bool, thickness: f64) -> usize {
        let mut added = points
            .windows(2)
            .filter(|pair| self.add_wall(pair[0], pair[1], thickness))
            .count();
        if closed && points.len() >= 3 {
            if let (Some(&last), Some(&first)) = (points.last(), points.first()) {
                if self.add_wall(last, first, thickness) {
                    added += 1;
                }
            }
        }
        added
    }

    pub fn add_label(&mut self, position: Point, text: &str, font_size: f64, rotation: f64) {
        let id = self.next_id("l");
        let mut label = Label::new(id, position, text);
        label.font_size = font_size;
        label.rotation = if rotation.is_finite() { rotation } else { 0.0 };
        self.plan.labels.push(label);
        self.report.convert(Converted::Labels);
    }

    pub fn add_dimension(&mut self, start: Point, end: Point) {
        let id = self.next_id("d");
        let mut dim = DimensionLine::new(id, start, end);
        dim.offset = self.config.dimension_offset;
        self.plan.dimensions.push(dim);
        self.report.convert(Converted::Dimensions);
    }

    /// Seal the import
    ///
    /// Emits one report item per skipped kind, optionally derives rooms from
    /// the imported walls, and finalizes the counters. Derived rooms are not
    /// source entities and are reported as an info item only.
    pub fn finish(mut self, derive_rooms: bool) -> ImportResult {
        for (kind, (rule, count)) in std::mem::take(&mut self.skips) {
            self.report.push(
                ReportItem::new(
                    rule.severity,
                    rule.category,
                    format!("{} {} skipped: {}", count, kind, rule.reason),
                )
                .with_count(count),
            );
        }

        if derive_rooms && self.config.detect_rooms && self.plan.rooms.is_empty() {
            let rooms = detect_rooms(&self.plan.walls, &self.config.room_detection);
            if !rooms.is_empty() {
                self.report.push(
                    ReportItem::new(
                        Severity::Info,
                        ReportCategory::Rooms,
                        format!("Detected {} room(s) from closed wall cycles", rooms.len()),
                    )
                    .with_count(rooms.len()),
                );
                self.plan.rooms = rooms;
            }
        }

        let plan = &self.plan;
        self.report.info(
            ReportCategory::Summary,
            format!(
                "Import complete: {} walls, {} rooms, {} doors, {} windows, {} labels, {} dimensions",
                plan.walls.len() + plan.arc_walls.len(),
                plan.rooms.len(),
                plan.doors.len(),
                plan.windows.len(),
                plan.labels.len(),
                plan.dimensions.len()
            ),
        );

        let report = self.report.finalize();
        info!(
            format = %report.source_format,
            file = %report.file_name,
            walls = self.plan.walls.len(),
            converted = report.total_converted,
            skipped = report.total_skipped,
            rate = report.conversion_rate,
            "import finished"
        );
        ImportResult {
            plan: self.plan,
            report,
        }
    }

    /// Structural failure: an empty plan and a single error item
    pub fn fail(self, message: impl Into<String>) -> ImportResult {
        let message = message.into();
        tracing::warn!(format = %self.report.source_format, error = %message, "import failed");
        let mut report =
            CompatibilityReport::new(self.report.source_format, self.report.file_name.clone());
        report.source_version = self.report.source_version;
        report.error(ReportCategory::Metadata, message);
        ImportResult {
            plan: FloorPlanData::new(),
            report: report.finalize(),
        }
    }
}
