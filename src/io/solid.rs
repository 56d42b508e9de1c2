//! Extruded plan geometry for the mesh and scene exporters
//!
//! Plan coordinates map to `(x, height, y)`: the plan lies on the ground
//! plane and heights grow along +Y. Units stay in inches; exporters scale.

use crate::geometry::{fan_triangulate, room_polygon, RoomDetectionConfig};
use crate::io::ExportOptions;
use crate::model::{FloorPlanData, Opening, Wall, ARC_WALL_SEGMENTS};
use crate::types::{Color, Point};

/// Clearance kept between an opening and the top of its wall
const HEAD_CLEARANCE: f64 = 4.0;

/// Named surface finishes shared by every 3D export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Surface {
    Wall,
    Floor,
    Door,
    Window,
}

impl Surface {
    pub const ALL: [Surface; 4] = [Surface::Wall, Surface::Floor, Surface::Door, Surface::Window];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Wall => "wall",
            Self::Floor => "floor",
            Self::Door => "door",
            Self::Window => "window",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Wall => Color::from_hex(0xF5F5F5),
            Self::Floor => Color::from_hex(0xE8DCC8),
            Self::Door => Color::from_hex(0x8B6914),
            Self::Window => Color::from_hex(0x88CCEE),
        }
    }

    pub fn opacity(&self) -> f64 {
        match self {
            Self::Window => 0.5,
            _ => 1.0,
        }
    }
}

/// Vertices and polygonal faces of one surface
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SurfaceMesh {
    pub surface: Surface,
    pub vertices: Vec<[f64; 3]>,
    /// Counter-clockwise vertex indices, three or four per face
    pub faces: Vec<Vec<u32>>,
}

impl SurfaceMesh {
    fn new(surface: Surface) -> Self {
        Self {
            surface,
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    fn push_vertices(&mut self, vertices: &[[f64; 3]]) -> u32 {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(vertices);
        base
    }

    /// Eight corners and six quads around a wall segment
    fn add_box(&mut self, start: Point, end: Point, thickness: f64, height: f64) {
        let length = start.distance(&end);
        if length < crate::geometry::DEGENERATE_LENGTH || !length.is_finite() {
            return;
        }
        let normal = (end - start).perpendicular().normalize() * (thickness / 2.0);
        let footprint = [start + normal, end + normal, end - normal, start - normal];
        let mut corners = [[0.0; 3]; 8];
        for (i, p) in footprint.iter().enumerate() {
            corners[i] = [p.x, 0.0, p.y];
            corners[i + 4] = [p.x, height, p.y];
        }
        let b = self.push_vertices(&corners);
        for quad in [
            [0, 3, 2, 1],
            [4, 5, 6, 7],
            [0, 1, 5, 4],
            [1, 2, 6, 5],
            [2, 3, 7, 6],
            [3, 0, 4, 7],
        ] {
            self.faces.push(quad.iter().map(|i| b + i).collect());
        }
    }

    /// Vertical rectangle between two plan points
    fn add_plane(&mut self, a: Point, b: Point, bottom: f64, top: f64) {
        if top <= bottom {
            return;
        }
        let base = self.push_vertices(&[
            [a.x, bottom, a.y],
            [b.x, bottom, b.y],
            [b.x, top, b.y],
            [a.x, top, a.y],
        ]);
        self.faces.push(vec![base, base + 1, base + 2, base + 3]);
    }

    fn add_floor(&mut self, polygon: &[Point]) {
        let ring: Vec<[f64; 3]> = polygon.iter().map(|p| [p.x, 0.0, p.y]).collect();
        let base = self.push_vertices(&ring);
        for [a, b, c] in fan_triangulate(polygon.len()) {
            self.faces
                .push(vec![base + a as u32, base + b as u32, base + c as u32]);
        }
    }

    /// Faces split into triangles
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        self.faces
            .iter()
            .flat_map(|face| (1..face.len().saturating_sub(1)).map(move |i| [face[0], face[i], face[i + 1]]))
            .collect()
    }
}

fn opening_height(wall: &Wall, wanted: f64, bottom: f64) -> f64 {
    wanted.min(wall.height - bottom - HEAD_CLEARANCE)
}

/// Surfaces of the whole plan, one mesh per [`Surface`] in [`Surface::ALL`] order
///
/// Openings whose wall is missing are left out.
pub(crate) fn plan_surfaces(plan: &FloorPlanData, options: &ExportOptions) -> Vec<SurfaceMesh> {
    let mut walls = SurfaceMesh::new(Surface::Wall);
    let mut floors = SurfaceMesh::new(Surface::Floor);
    let mut doors = SurfaceMesh::new(Surface::Door);
    let mut windows = SurfaceMesh::new(Surface::Window);

    for wall in &plan.walls {
        walls.add_box(wall.start, wall.end, wall.thickness, wall.height);
    }
    for arc in &plan.arc_walls {
        for pair in arc.flatten(ARC_WALL_SEGMENTS).windows(2) {
            walls.add_box(pair[0], pair[1], arc.thickness, arc.height);
        }
    }

    let snap = RoomDetectionConfig::default().snap_epsilon;
    for room in &plan.rooms {
        if let Some(polygon) = room_polygon(room, &plan.walls, snap) {
            floors.add_floor(&polygon);
        }
    }

    let index = plan.wall_index();
    for door in &plan.doors {
        let Some(wall) = index.get(door.wall_id.as_str()) else {
            continue;
        };
        if let Some((a, b)) = door.span(wall) {
            doors.add_plane(a, b, 0.0, opening_height(wall, options.door_height, 0.0));
        }
    }
    for window in &plan.windows {
        let Some(wall) = index.get(window.wall_id.as_str()) else {
            continue;
        };
        if let Some((a, b)) = window.span(wall) {
            let sill = window.sill_height.unwrap_or(options.default_sill_height);
            let top = sill + opening_height(wall, options.window_height, sill);
            windows.add_plane(a, b, sill, top);
        }
    }

    vec![walls, floors, doors, windows]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Door, Window};

    fn plan_with_wall() -> FloorPlanData {
        let mut plan = FloorPlanData::new();
        plan.walls
            .push(Wall::new("w1", Point::new(0.0, 0.0), Point::new(120.0, 0.0)));
        plan
    }

    #[test]
    fn test_wall_box() {
        let surfaces = plan_surfaces(&plan_with_wall(), &ExportOptions::default());
        let walls = &surfaces[0];
        assert_eq!(walls.surface, Surface::Wall);
        assert_eq!(walls.vertices.len(), 8);
        assert_eq!(walls.faces.len(), 6);
        assert_eq!(walls.triangles().len(), 12);
        assert_eq!(walls.vertices[4], [0.0, 96.0, 3.0]);
        assert!(surfaces[1].is_empty());
    }

    #[test]
    fn test_openings_fit_their_wall() {
        let mut plan = plan_with_wall();
        plan.doors.push(Door::new("d1", "w1", 0.5, 32.0));
        plan.doors.push(Door::new("d2", "nope", 0.5, 32.0));
        let mut window = Window::new("n1", "w1", 0.25, 24.0);
        window.sill_height = Some(60.0);
        plan.windows.push(window);
        let surfaces = plan_surfaces(&plan, &ExportOptions::default());

        let doors = &surfaces[2];
        assert_eq!(doors.faces.len(), 1);
        assert_eq!(doors.vertices[2][1], 80.0);

        // 96 - 60 - 4 leaves 32 of the requested 48
        let windows = &surfaces[3];
        assert_eq!(windows.vertices[0][1], 60.0);
        assert_eq!(windows.vertices[2][1], 92.0);
    }
}
