//! Geometry kernel
//!
//! Pure coordinate math used by the model, the importers, and the exporters.
//! Every function here is deterministic and free of side effects.

mod arc;
mod format;
mod intersect;
mod polygon;
mod rooms;
mod snap;

pub use arc::{
    arc_points, arc_segment_count, circle_points, circle_segment_count, ellipse_points,
    MARKUP_CIRCLE_SEGMENTS,
};
pub use format::{format_area, format_feet_inches, format_fixed, format_length};
pub use intersect::{distance_point_to_segment, find_nearest_wall, line_intersect, point_in_polygon};
pub use polygon::{
    fan_triangulate, polygon_area_sq_ft, polygon_centroid, polygon_perimeter, signed_area,
};
pub use rooms::{detect_rooms, room_polygon, RoomDetectionConfig};
pub use snap::{snap_angle, snap_direction, snap_endpoint, snap_to_grid};

use crate::model::Wall;
use crate::types::Point;

/// Segments shorter than this are treated as zero-length
pub const DEGENERATE_LENGTH: f64 = 1e-6;

/// Distance between two points
pub fn distance(a: Point, b: Point) -> f64 {
    a.distance(&b)
}

pub fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Linear interpolation from `a` (t = 0) to `b` (t = 1)
pub fn lerp(a: Point, b: Point, t: f64) -> Point {
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

pub fn wall_length(wall: &Wall) -> f64 {
    distance(wall.start, wall.end)
}

/// Direction of the wall from start to end, radians in (-π, π]
pub fn wall_angle(wall: &Wall) -> f64 {
    (wall.end.y - wall.start.y).atan2(wall.end.x - wall.start.x)
}

/// Point at parametric position `t` along the wall; `t` is clamped to [0, 1]
pub fn position_on_wall(wall: &Wall, t: f64) -> Point {
    lerp(wall.start, wall.end, crate::model::clamp_position(t))
}

/// Parametric position of the projection of `pt` onto the wall, clamped
///
/// Returns 0.5 for a zero-length wall.
pub fn project_onto_wall(pt: Point, wall: &Wall) -> f64 {
    let d = wall.end - wall.start;
    let len_sq = d.length_squared();
    if len_sq < 0.001 {
        return 0.5;
    }
    ((pt - wall.start).dot(&d) / len_sq).clamp(0.0, 1.0)
}

/// Points along the quadratic Bézier `p0 → p2` with control `p1`
pub fn quadratic_points(p0: Point, p1: Point, p2: Point, segments: usize) -> Vec<Point> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| {
            let t = i as f64 / segments as f64;
            let u = 1.0 - t;
            p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
        })
        .collect()
}
