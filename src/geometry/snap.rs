//! Angle, endpoint, and grid snapping

use crate::types::Point;

/// Round `angle` (radians) to the nearest multiple of `increment_deg`
///
/// A non-positive increment leaves the angle unchanged.
pub fn snap_angle(angle: f64, increment_deg: f64) -> f64 {
    if increment_deg <= 0.0 || !increment_deg.is_finite() {
        return angle;
    }
    let step = increment_deg.to_radians();
    (angle / step).round() * step
}

/// Move `end` so the direction `start → end` snaps to `increment_deg`
///
/// The length is preserved. Segments shorter than one unit are not snapped.
pub fn snap_direction(start: Point, end: Point, increment_deg: f64) -> Point {
    let d = end - start;
    let len = d.length();
    if len < 1.0 {
        return end;
    }
    let snapped = snap_angle(d.y.atan2(d.x), increment_deg);
    Point::new(start.x + len * snapped.cos(), start.y + len * snapped.sin())
}

/// Nearest candidate strictly within `threshold`, or `point` itself
pub fn snap_endpoint(point: Point, candidates: &[Point], threshold: f64) -> Point {
    let mut best = point;
    let mut best_dist = threshold;
    for candidate in candidates {
        let d = point.distance(candidate);
        if d < best_dist {
            best_dist = d;
            best = *candidate;
        }
    }
    best
}

/// Round both coordinates to the nearest multiple of `grid_size`
pub fn snap_to_grid(point: Point, grid_size: f64) -> Point {
    if grid_size <= 0.0 {
        return point;
    }
    Point::new(
        (point.x / grid_size).round() * grid_size,
        (point.y / grid_size).round() * grid_size,
    )
}
