//! Canonical floor-plan model
//!
//! [`FloorPlanData`] is the single unit every importer produces and every
//! exporter consumes. Walls are owned by the plan; openings and rooms refer to
//! them by id.

mod annotation;
mod opening;
mod room;
mod trade;
mod wall;

pub use annotation::{DimensionLine, Fixture, Label, DEFAULT_DIMENSION_OFFSET, DEFAULT_FONT_SIZE};
pub use opening::{
    clamp_position, Door, DoorSwing, DoorType, Opening, Window, WindowType, DEFAULT_DOOR_WIDTH,
    DEFAULT_SILL_HEIGHT, DEFAULT_WINDOW_WIDTH,
};
pub use room::Room;
pub use trade::{DamageZone, TradeElement, TradeLayer, TradeLayerType, TradePath};
pub use wall::{ArcWall, Wall, ARC_WALL_SEGMENTS, DEFAULT_WALL_HEIGHT, DEFAULT_WALL_THICKNESS};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PlanError;
use crate::geometry::{self, RoomDetectionConfig};
use crate::types::{BoundingBox2D, Point};

/// Display unit system; coordinates are always stored in inches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementUnit {
    #[default]
    Imperial,
    Metric,
}

opening::string_enum!(MeasurementUnit {
    Imperial => "imperial",
    Metric => "metric",
});

/// Default plan scale (screen pixels per inch in the editor)
pub const DEFAULT_SCALE: f64 = 4.0;

/// The aggregate root of a floor plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorPlanData {
    pub scale: f64,
    pub units: MeasurementUnit,
    #[serde(default)]
    pub walls: Vec<Wall>,
    #[serde(default)]
    pub arc_walls: Vec<ArcWall>,
    #[serde(default)]
    pub doors: Vec<Door>,
    #[serde(default)]
    pub windows: Vec<Window>,
    #[serde(default)]
    pub fixtures: Vec<Fixture>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub dimensions: Vec<DimensionLine>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub trade_layers: Vec<TradeLayer>,
}

impl Default for FloorPlanData {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            units: MeasurementUnit::Imperial,
            walls: Vec::new(),
            arc_walls: Vec::new(),
            doors: Vec::new(),
            windows: Vec::new(),
            fixtures: Vec::new(),
            rooms: Vec::new(),
            dimensions: Vec::new(),
            labels: Vec::new(),
            trade_layers: Vec::new(),
        }
    }
}

/// A reference from an opening or room to a wall that is not in the plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityIssue {
    /// e.g. `door d1`
    pub entity: String,
    pub wall_id: String,
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} refers to missing wall {}", self.entity, self.wall_id)
    }
}

impl From<IntegrityIssue> for PlanError {
    fn from(issue: IntegrityIssue) -> Self {
        PlanError::InvalidReference {
            entity: issue.entity,
            wall_id: issue.wall_id,
        }
    }
}

impl FloorPlanData {
    /// Create an empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a wall by id
    pub fn wall(&self, id: &str) -> Option<&Wall> {
        self.walls.iter().find(|w| w.id == id)
    }

    /// Id → wall lookup for exporters resolving many references
    pub fn wall_index(&self) -> AHashMap<&str, &Wall> {
        self.walls.iter().map(|w| (w.id.as_str(), w)).collect()
    }

    /// True when the plan holds no entities at all
    pub fn is_empty(&self) -> bool {
        self.entity_count() == 0
    }

    /// Number of entities across every list
    pub fn entity_count(&self) -> usize {
        self.walls.len()
            + self.arc_walls.len()
            + self.doors.len()
            + self.windows.len()
            + self.fixtures.len()
            + self.rooms.len()
            + self.dimensions.len()
            + self.labels.len()
            + self.trade_layers.len()
    }

    /// Every dangling wall reference held by an opening or room
    pub fn integrity_issues(&self) -> Vec<IntegrityIssue> {
        let index = self.wall_index();
        let mut issues = Vec::new();
        for door in &self.doors {
            if !index.contains_key(door.wall_id.as_str()) {
                issues.push(IntegrityIssue {
                    entity: format!("door {}", door.id),
                    wall_id: door.wall_id.clone(),
                });
            }
        }
        for window in &self.windows {
            if !index.contains_key(window.wall_id.as_str()) {
                issues.push(IntegrityIssue {
                    entity: format!("window {}", window.id),
                    wall_id: window.wall_id.clone(),
                });
            }
        }
        for room in &self.rooms {
            for wall_id in &room.wall_ids {
                if !index.contains_key(wall_id.as_str()) {
                    issues.push(IntegrityIssue {
                        entity: format!("room {}", room.id),
                        wall_id: wall_id.clone(),
                    });
                }
            }
        }
        issues
    }

    /// Strict validation: the first dangling reference as an error
    pub fn validate(&self) -> crate::error::Result<()> {
        match self.integrity_issues().into_iter().next() {
            Some(issue) => Err(issue.into()),
            None => Ok(()),
        }
    }

    /// Replace `rooms` with rooms re-derived from the current walls
    pub fn recompute_rooms(&mut self, config: &RoomDetectionConfig) {
        self.rooms = geometry::detect_rooms(&self.walls, config);
    }

    /// Extents of the structural geometry
    ///
    /// Walls and arc walls define the bounds; a plan without walls falls back
    /// to its annotations and trade geometry.
    pub fn bounds(&self) -> Option<BoundingBox2D> {
        let structural: Vec<Point> = self
            .walls
            .iter()
            .flat_map(|w| [w.start, w.end])
            .chain(
                self.arc_walls
                    .iter()
                    .flat_map(|a| a.flatten(ARC_WALL_SEGMENTS)),
            )
            .collect();
        if let Some(bb) = BoundingBox2D::from_points(&structural) {
            return Some(bb);
        }

        let loose: Vec<Point> = self
            .fixtures
            .iter()
            .map(|f| f.position)
            .chain(self.labels.iter().map(|l| l.position))
            .chain(self.dimensions.iter().flat_map(|d| [d.start, d.end]))
            .chain(self.trade_layers.iter().flat_map(|layer| {
                layer
                    .elements
                    .iter()
                    .map(|e| e.position)
                    .chain(layer.paths.iter().flat_map(|p| p.points.iter().copied()))
                    .chain(
                        layer
                            .damage_zones
                            .iter()
                            .flat_map(|z| z.points.iter().copied()),
                    )
                    .collect::<Vec<_>>()
            }))
            .collect();
        BoundingBox2D::from_points(&loose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_plan() -> FloorPlanData {
        let mut plan = FloorPlanData::new();
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(120.0, 0.0),
            Point::new(120.0, 120.0),
            Point::new(0.0, 120.0),
        ];
        for i in 0..4 {
            plan.walls
                .push(Wall::new(format!("w{}", i + 1), pts[i], pts[(i + 1) % 4]));
        }
        plan
    }

    #[test]
    fn test_empty_plan_defaults() {
        let plan = FloorPlanData::new();
        assert_eq!(plan.scale, 4.0);
        assert_eq!(plan.units, MeasurementUnit::Imperial);
        assert!(plan.is_empty());
        assert!(plan.bounds().is_none());
    }

    #[test]
    fn test_integrity_issues() {
        let mut plan = square_plan();
        plan.doors.push(Door::new("d1", "w1", 0.5, 32.0));
        plan.doors.push(Door::new("d2", "ghost", 0.5, 32.0));
        let issues = plan.integrity_issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].wall_id, "ghost");
        assert!(matches!(
            plan.validate(),
            Err(PlanError::InvalidReference { .. })
        ));
    }

    #[test]
    fn test_recompute_rooms() {
        let mut plan = square_plan();
        plan.recompute_rooms(&RoomDetectionConfig::default());
        assert_eq!(plan.rooms.len(), 1);
        assert!((plan.rooms[0].area - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounds_from_walls() {
        let plan = square_plan();
        let bb = plan.bounds().unwrap();
        assert_eq!(bb.max, Point::new(120.0, 120.0));
    }

    #[test]
    fn test_serde_camel_case() {
        let plan = square_plan();
        let json = serde_json::to_value(&plan).unwrap();
        assert!(json.get("arcWalls").is_some());
        assert!(json.get("tradeLayers").is_some());
        let back: FloorPlanData = serde_json::from_value(json).unwrap();
        assert_eq!(back, plan);
    }
}
