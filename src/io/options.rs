//! Import and export configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::RoomDetectionConfig;
use crate::model::{DEFAULT_DIMENSION_OFFSET, DEFAULT_FONT_SIZE, DEFAULT_SILL_HEIGHT};
use crate::model::{DEFAULT_WALL_HEIGHT, DEFAULT_WALL_THICKNESS};

/// Inches per metre
pub const INCHES_PER_METRE: f64 = 39.3701;

/// Configuration shared by every importer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportConfiguration {
    /// Thickness given to walls created from bare segments
    pub default_wall_thickness: f64,
    /// Height given to walls created from 2D geometry
    pub default_wall_height: f64,
    /// Thickness of walls approximating circles (columns, pipes)
    pub circle_wall_thickness: f64,
    /// Source text height → label font size factor
    pub text_height_factor: f64,
    /// Font size for text without a usable height
    pub default_font_size: f64,
    /// Offset given to imported dimension lines
    pub dimension_offset: f64,
    /// Scale drafting coordinates to inches using the file's declared units
    pub apply_source_units: bool,
    /// Mesh (OBJ) units → inches
    pub mesh_unit_scale: f64,
    /// Scene (glTF) units → inches; scenes are authored in metres
    pub scene_unit_scale: f64,
    /// Doors and windows farther than this from every wall become labels
    pub opening_snap_tolerance: f64,
    /// Decimal places used when keying mesh edges for de-duplication
    pub edge_key_precision: u32,
    /// Derive rooms from closed wall cycles after geometry-only imports
    pub detect_rooms: bool,
    pub room_detection: RoomDetectionConfig,
}

impl Default for ImportConfiguration {
    fn default() -> Self {
        Self {
            default_wall_thickness: DEFAULT_WALL_THICKNESS,
            default_wall_height: DEFAULT_WALL_HEIGHT,
            circle_wall_thickness: 4.0,
            text_height_factor: 4.0,
            default_font_size: DEFAULT_FONT_SIZE,
            dimension_offset: DEFAULT_DIMENSION_OFFSET,
            apply_source_units: true,
            mesh_unit_scale: 1.0,
            scene_unit_scale: INCHES_PER_METRE,
            opening_snap_tolerance: 24.0,
            edge_key_precision: 2,
            detect_rooms: true,
            room_detection: RoomDetectionConfig::default(),
        }
    }
}

impl ImportConfiguration {
    /// Builder: turn room detection on or off
    pub fn with_room_detection(mut self, enabled: bool) -> Self {
        self.detect_rooms = enabled;
        self
    }
}

/// Cosmetic and dimensional options for the exporters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    pub project_title: String,
    pub company_name: String,
    pub building_name: String,
    pub floor_name: String,
    /// Base name of companion files, e.g. the mesh material library
    pub file_stem: String,
    /// Pixel width of vector output
    pub svg_width: f64,
    /// Padding around the plan bounds, in drawing units
    pub svg_padding: f64,
    /// Fixed timestamp for reproducible output; `None` uses the current time
    pub timestamp: Option<DateTime<Utc>>,
    pub door_height: f64,
    pub window_height: f64,
    /// Sill height for windows that do not carry their own
    pub default_sill_height: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            project_title: "Floor Plan".to_string(),
            company_name: String::new(),
            building_name: "Building".to_string(),
            floor_name: "Ground Floor".to_string(),
            file_stem: "floorplan".to_string(),
            svg_width: 1200.0,
            svg_padding: 24.0,
            timestamp: None,
            door_height: 80.0,
            window_height: 48.0,
            default_sill_height: DEFAULT_SILL_HEIGHT,
        }
    }
}

impl ExportOptions {
    /// Builder: set the project title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.project_title = title.into();
        self
    }

    /// Builder: pin the timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// The pinned timestamp or now
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp.unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: ImportConfiguration =
            serde_json::from_str(r#"{"defaultWallThickness": 8, "detectRooms": false}"#).unwrap();
        assert_eq!(cfg.default_wall_thickness, 8.0);
        assert!(!cfg.detect_rooms);
        assert_eq!(cfg.default_wall_height, 96.0);
        assert_eq!(cfg.room_detection.snap_epsilon, 0.5);
    }

    #[test]
    fn test_export_defaults() {
        let opts = ExportOptions::default();
        assert_eq!(opts.svg_width, 1200.0);
        assert_eq!(opts.door_height, 80.0);
        assert!(opts.timestamp.is_none());
    }
}
