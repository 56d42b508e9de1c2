//! Structural walls

use serde::{Deserialize, Serialize};

use crate::geometry;
use crate::types::Point;

/// Default wall thickness in inches
pub const DEFAULT_WALL_THICKNESS: f64 = 6.0;

/// Default wall height in inches (8 ft)
pub const DEFAULT_WALL_HEIGHT: f64 = 96.0;

/// A straight structural segment
///
/// Walls are owned by the plan's wall list; openings and rooms refer to them
/// by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wall {
    pub id: String,
    pub start: Point,
    pub end: Point,
    /// Thickness in inches
    pub thickness: f64,
    /// Height in inches
    pub height: f64,
}

impl Wall {
    /// Create a wall with default thickness and height
    pub fn new(id: impl Into<String>, start: Point, end: Point) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            thickness: DEFAULT_WALL_THICKNESS,
            height: DEFAULT_WALL_HEIGHT,
        }
    }

    /// Builder: set thickness
    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness = thickness;
        self
    }

    /// Builder: set height
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    pub fn length(&self) -> f64 {
        geometry::wall_length(self)
    }

    pub fn angle(&self) -> f64 {
        geometry::wall_angle(self)
    }

    /// Zero-length walls are omitted by every exporter
    pub fn is_degenerate(&self) -> bool {
        self.length() < geometry::DEGENERATE_LENGTH
    }
}

/// A curved wall following a quadratic Bézier through `control_point`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcWall {
    pub id: String,
    pub start: Point,
    pub end: Point,
    pub control_point: Point,
    pub thickness: f64,
    pub height: f64,
}

/// Segments used when an arc wall has to be written as straight geometry
pub const ARC_WALL_SEGMENTS: usize = 16;

impl ArcWall {
    pub fn new(id: impl Into<String>, start: Point, control_point: Point, end: Point) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            control_point,
            thickness: DEFAULT_WALL_THICKNESS,
            height: DEFAULT_WALL_HEIGHT,
        }
    }

    /// Polyline approximation with `segments + 1` points
    pub fn flatten(&self, segments: usize) -> Vec<Point> {
        geometry::quadratic_points(self.start, self.control_point, self.end, segments)
    }

    /// Chord walls approximating the curve, ids `<id>-<n>`
    pub fn to_chord_walls(&self) -> Vec<Wall> {
        self.flatten(ARC_WALL_SEGMENTS)
            .windows(2)
            .enumerate()
            .map(|(i, pair)| Wall {
                id: format!("{}-{}", self.id, i + 1),
                start: pair[0],
                end: pair[1],
                thickness: self.thickness,
                height: self.height,
            })
            .collect()
    }
}
