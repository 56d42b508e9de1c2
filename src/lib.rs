//! # sketchport
//!
//! A floor-plan interchange engine. One canonical plan model
//! ([`FloorPlanData`]) is converted to and from DXF, SVG, OBJ, glTF/GLB, IFC
//! and the SketchPlan round-trip format.
//!
//! Every import returns the converted plan together with a
//! [`CompatibilityReport`] that accounts for each source entity that could
//! not be carried over. Imports never fail on malformed content; exports
//! always produce a complete payload.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sketchport::{export, import, ExportOptions, ImportConfiguration, TargetFormat};
//!
//! let content = std::fs::read("plan.dxf")?;
//! let result = import(&content, "plan.dxf", &ImportConfiguration::default())?;
//! println!("{} walls, {}% converted", result.plan.walls.len(), result.report.conversion_rate);
//!
//! let payload = export(&result.plan, TargetFormat::Ifc, &ExportOptions::default())?;
//! std::fs::write("plan.ifc", payload.data)?;
//! # Ok::<(), sketchport::error::PlanError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`geometry`] - pure coordinate math and room detection
//! - [`detect`] - content sniffing
//! - [`io`] - one importer and one exporter per format
//! - [`report`] - the per-import compatibility record

#![allow(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod detect;
pub mod error;
pub mod geometry;
pub mod io;
pub mod model;
pub mod report;
pub mod types;

pub use detect::{detect_format, Confidence, FileFormat, FormatDetection};
pub use error::{PlanError, Result};
pub use geometry::{detect_rooms, RoomDetectionConfig};
pub use io::{
    export, import, ExportOptions, ExportPayload, ImportConfiguration, ImportResult,
    PlanExporter, TargetFormat,
};
pub use model::{
    ArcWall, DimensionLine, Door, Fixture, FloorPlanData, Label, MeasurementUnit, Opening, Room,
    TradeLayer, TradeLayerType, Wall, Window,
};
pub use report::{CompatibilityReport, ReportCategory, ReportItem, Severity};
pub use types::{BoundingBox2D, Color, Point};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_sketch_round_trip_through_dispatch() {
        let mut plan = FloorPlanData::new();
        plan.walls.push(Wall::new("w1", Point::ZERO, Point::new(96.0, 0.0)));
        let payload = export(&plan, TargetFormat::SketchPlan, &ExportOptions::default()).unwrap();
        let result = import(&payload.data, "plan.splan", &ImportConfiguration::default()).unwrap();
        assert_eq!(result.plan.walls, plan.walls);
        assert_eq!(result.report.conversion_rate, 100);
    }
}
