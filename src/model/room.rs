//! Rooms derived from closed wall cycles

use serde::{Deserialize, Serialize};

use crate::types::Point;

/// A room enclosed by a cycle of walls
///
/// The boundary is implied by `wall_ids`; the room stores no polygon of its
/// own. `area` is in square feet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub name: String,
    pub wall_ids: Vec<String>,
    pub center: Point,
    pub area: f64,
}

impl Room {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            wall_ids: Vec::new(),
            center: Point::ZERO,
            area: 0.0,
        }
    }

    /// True when the room boundary references `wall_id`
    pub fn uses_wall(&self, wall_id: &str) -> bool {
        self.wall_ids.iter().any(|id| id == wall_id)
    }
}
