//! Room detection from connected walls
//!
//! Wall endpoints closer than the snap epsilon are merged into one graph node.
//! For every wall edge the shortest path (by wall length) between its two
//! nodes that avoids the edge itself closes the smallest cycle through that
//! edge. Distinct cycles become rooms once their enclosed area clears the
//! minimum.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::polygon::{polygon_area_sq_ft, polygon_centroid};
use super::DEGENERATE_LENGTH;
use crate::model::{Room, Wall};
use crate::types::Point;

/// Configuration for room detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomDetectionConfig {
    /// Endpoints within this distance are the same graph node
    pub snap_epsilon: f64,
    /// Cycles enclosing this many square feet or less are discarded
    pub min_area_sq_ft: f64,
    /// Longest wall cycle considered a room
    pub max_cycle_walls: usize,
    /// Drawing units per foot (12 for inches)
    pub units_per_foot: f64,
}

impl Default for RoomDetectionConfig {
    fn default() -> Self {
        Self {
            snap_epsilon: 0.5,
            min_area_sq_ft: 1.0,
            max_cycle_walls: 64,
            units_per_foot: 12.0,
        }
    }
}

struct WallGraph<'a> {
    nodes: Vec<Point>,
    /// (node a, node b, wall)
    edges: Vec<(usize, usize, &'a Wall)>,
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl<'a> WallGraph<'a> {
    fn build(walls: &'a [Wall], epsilon: f64) -> Self {
        let cell = epsilon.max(1e-9);
        let mut grid: AHashMap<(i64, i64), Vec<usize>> = AHashMap::new();
        let mut nodes: Vec<Point> = Vec::new();

        let mut node_for = |p: Point, nodes: &mut Vec<Point>| -> usize {
            let key = ((p.x / cell).floor() as i64, (p.y / cell).floor() as i64);
            for dx in -1..=1 {
                for dy in -1..=1 {
                    if let Some(ids) = grid.get(&(key.0 + dx, key.1 + dy)) {
                        if let Some(&id) = ids.iter().find(|&&id| nodes[id].distance(&p) <= epsilon) {
                            return id;
                        }
                    }
                }
            }
            nodes.push(p);
            let id = nodes.len() - 1;
            grid.entry(key).or_default().push(id);
            id
        };

        let mut edges = Vec::new();
        for wall in walls {
            if !wall.start.is_finite() || !wall.end.is_finite() {
                continue;
            }
            if wall.start.distance(&wall.end) < DEGENERATE_LENGTH {
                continue;
            }
            let a = node_for(wall.start, &mut nodes);
            let b = node_for(wall.end, &mut nodes);
            if a != b {
                edges.push((a, b, wall));
            }
        }

        let mut adjacency = vec![Vec::new(); nodes.len()];
        for (i, &(a, b, _)) in edges.iter().enumerate() {
            adjacency[a].push((b, i));
            adjacency[b].push((a, i));
        }

        Self { nodes, edges, adjacency }
    }

    /// Shortest path `from → to` skipping `excluded`, as (nodes, edges)
    fn shortest_path(
        &self,
        from: usize,
        to: usize,
        excluded: usize,
        max_edges: usize,
    ) -> Option<(Vec<usize>, Vec<usize>)> {
        let n = self.nodes.len();
        let mut dist = vec![f64::INFINITY; n];
        let mut hops = vec![0usize; n];
        let mut prev: Vec<Option<(usize, usize)>> = vec![None; n];
        let mut heap = BinaryHeap::new();

        dist[from] = 0.0;
        heap.push(State { cost: 0.0, node: from });

        while let Some(State { cost, node }) = heap.pop() {
            if node == to {
                break;
            }
            if cost > dist[node] {
                continue;
            }
            for &(next, edge) in &self.adjacency[node] {
                if edge == excluded || hops[node] + 1 > max_edges {
                    continue;
                }
                let next_cost = cost + self.edges[edge].2.length();
                if next_cost < dist[next] {
                    dist[next] = next_cost;
                    hops[next] = hops[node] + 1;
                    prev[next] = Some((node, edge));
                    heap.push(State { cost: next_cost, node: next });
                }
            }
        }

        if !dist[to].is_finite() {
            return None;
        }

        let mut path_nodes = vec![to];
        let mut path_edges = Vec::new();
        let mut cursor = to;
        while let Some((p, e)) = prev[cursor] {
            path_edges.push(e);
            path_nodes.push(p);
            cursor = p;
        }
        path_nodes.reverse();
        path_edges.reverse();
        Some((path_nodes, path_edges))
    }
}

#[derive(Debug, Clone, Copy)]
struct State {
    cost: f64,
    node: usize,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

impl Ord for State {
    // Reversed: BinaryHeap is a max-heap
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Detect rooms as minimal closed wall cycles
///
/// Dangling walls produce no cycle; disjoint wall groups produce independent
/// rooms. Rooms are named `Room 1`, `Room 2`, ... in discovery order, which
/// follows the wall order.
pub fn detect_rooms(walls: &[Wall], config: &RoomDetectionConfig) -> Vec<Room> {
    if walls.len() < 3 {
        return Vec::new();
    }
    let graph = WallGraph::build(walls, config.snap_epsilon);
    let mut seen: AHashSet<Vec<usize>> = AHashSet::new();
    let mut rooms = Vec::new();

    for (edge_idx, &(a, b, _)) in graph.edges.iter().enumerate() {
        let max_path = config.max_cycle_walls.saturating_sub(1);
        let Some((path_nodes, path_edges)) = graph.shortest_path(b, a, edge_idx, max_path) else {
            continue;
        };
        if path_edges.len() + 1 < 3 {
            continue;
        }

        let mut key: Vec<usize> = path_edges.clone();
        key.push(edge_idx);
        key.sort_unstable();
        if !seen.insert(key) {
            continue;
        }

        let points: Vec<Point> = path_nodes.iter().map(|&n| graph.nodes[n]).collect();
        let area = polygon_area_sq_ft(&points, config.units_per_foot);
        if area <= config.min_area_sq_ft {
            continue;
        }

        let index = rooms.len() + 1;
        let mut wall_ids = vec![graph.edges[edge_idx].2.id.clone()];
        wall_ids.extend(path_edges.iter().map(|&e| graph.edges[e].2.id.clone()));
        rooms.push(Room {
            id: format!("room_{}", index),
            name: format!("Room {}", index),
            wall_ids,
            center: polygon_centroid(&points),
            area,
        });
    }

    rooms
}

/// Ordered boundary of a room, chained from its walls
///
/// Returns `None` when a referenced wall is missing, when the room has fewer
/// than three walls, or when the walls do not chain end to end.
pub fn room_polygon(room: &Room, walls: &[Wall], epsilon: f64) -> Option<Vec<Point>> {
    if room.wall_ids.len() < 3 {
        return None;
    }
    let by_id: AHashMap<&str, &Wall> = walls.iter().map(|w| (w.id.as_str(), w)).collect();
    let mut remaining: Vec<&Wall> = room
        .wall_ids
        .iter()
        .map(|id| by_id.get(id.as_str()).copied())
        .collect::<Option<Vec<_>>>()?;

    let first = remaining.remove(0);
    let mut points = vec![first.start, first.end];
    while !remaining.is_empty() {
        let tail = *points.last()?;
        let pos = remaining
            .iter()
            .position(|w| w.start.distance(&tail) <= epsilon || w.end.distance(&tail) <= epsilon)?;
        let wall = remaining.remove(pos);
        let next = if wall.start.distance(&tail) <= epsilon {
            wall.end
        } else {
            wall.start
        };
        points.push(next);
    }

    // The last wall returns to the first point
    let closing = points.pop()?;
    if closing.distance(&points[0]) > epsilon {
        return None;
    }
    Some(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_walls(w: f64, h: f64) -> Vec<Wall> {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        ];
        (0..4)
            .map(|i| Wall::new(format!("w{}", i + 1), pts[i], pts[(i + 1) % 4]))
            .collect()
    }

    #[test]
    fn test_rectangle_is_one_room() {
        let rooms = detect_rooms(&rect_walls(144.0, 120.0), &RoomDetectionConfig::default());
        assert_eq!(rooms.len(), 1);
        assert!((rooms[0].area - 120.0).abs() < 1e-9);
        assert_eq!(rooms[0].wall_ids.len(), 4);
        assert_eq!(rooms[0].center, Point::new(72.0, 60.0));
        assert_eq!(rooms[0].name, "Room 1");
    }

    #[test]
    fn test_open_polyline_has_no_room() {
        let mut walls = rect_walls(120.0, 120.0);
        walls.pop();
        assert!(detect_rooms(&walls, &RoomDetectionConfig::default()).is_empty());
    }

    #[test]
    fn test_reversed_walls_and_snap_gaps() {
        let mut walls = rect_walls(120.0, 120.0);
        let w = &mut walls[1];
        std::mem::swap(&mut w.start, &mut w.end);
        walls[2].start.x += 0.2;
        let rooms = detect_rooms(&walls, &RoomDetectionConfig::default());
        assert_eq!(rooms.len(), 1);
    }

    #[test]
    fn test_split_rectangle_is_two_rooms() {
        let mut walls = vec![
            Wall::new("a", Point::new(0.0, 0.0), Point::new(120.0, 0.0)),
            Wall::new("b", Point::new(120.0, 0.0), Point::new(240.0, 0.0)),
            Wall::new("c", Point::new(240.0, 0.0), Point::new(240.0, 120.0)),
            Wall::new("d", Point::new(240.0, 120.0), Point::new(120.0, 120.0)),
            Wall::new("e", Point::new(120.0, 120.0), Point::new(0.0, 120.0)),
            Wall::new("f", Point::new(0.0, 120.0), Point::new(0.0, 0.0)),
        ];
        walls.push(Wall::new("mid", Point::new(120.0, 0.0), Point::new(120.0, 120.0)));
        let rooms = detect_rooms(&walls, &RoomDetectionConfig::default());
        assert_eq!(rooms.len(), 2);
        for room in &rooms {
            assert!((room.area - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_disjoint_groups_and_dangling_walls() {
        let mut walls = rect_walls(120.0, 120.0);
        let far: Vec<Wall> = rect_walls(60.0, 60.0)
            .into_iter()
            .map(|mut w| {
                w.id = format!("far-{}", w.id);
                w.start.x += 1000.0;
                w.end.x += 1000.0;
                w
            })
            .collect();
        walls.extend(far);
        walls.push(Wall::new("stub", Point::new(60.0, 60.0), Point::new(80.0, 80.0)));
        walls.push(Wall::new("zero", Point::new(5.0, 5.0), Point::new(5.0, 5.0)));
        let rooms = detect_rooms(&walls, &RoomDetectionConfig::default());
        assert_eq!(rooms.len(), 2);
    }

    #[test]
    fn test_tiny_cycle_discarded() {
        let rooms = detect_rooms(&rect_walls(6.0, 6.0), &RoomDetectionConfig::default());
        assert!(rooms.is_empty());
    }

    #[test]
    fn test_room_polygon_chains_walls() {
        let walls = rect_walls(120.0, 120.0);
        let rooms = detect_rooms(&walls, &RoomDetectionConfig::default());
        let poly = room_polygon(&rooms[0], &walls, 0.5).unwrap();
        assert_eq!(poly.len(), 4);
        assert!((polygon_area_sq_ft(&poly, 12.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_room_polygon_missing_wall() {
        let walls = rect_walls(120.0, 120.0);
        let mut room = Room::new("r", "R");
        room.wall_ids = vec!["w1".into(), "w2".into(), "ghost".into()];
        assert!(room_polygon(&room, &walls, 0.5).is_none());
    }
}
