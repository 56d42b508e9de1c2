//! Top-down projection of mesh edges into walls
//!
//! Mesh importers feed every face edge through an [`EdgeCollector`]. Edges are
//! projected onto the ground plane, keyed on rounded coordinates regardless of
//! direction, and only the first occurrence of each key becomes a wall.

use ahash::AHashSet;

use super::context::ImportContext;
use crate::report::ReportCategory;
use crate::types::Point;

type EdgeKey = ((i64, i64), (i64, i64));

pub(crate) struct EdgeCollector {
    factor: f64,
    seen: AHashSet<EdgeKey>,
    duplicates: usize,
    collapsed: usize,
}

impl EdgeCollector {
    /// Keys round to `precision` decimal places
    pub fn new(precision: u32) -> Self {
        Self {
            factor: 10f64.powi(precision.min(9) as i32),
            seen: AHashSet::new(),
            duplicates: 0,
            collapsed: 0,
        }
    }

    fn key(&self, p: Point) -> (i64, i64) {
        ((p.x * self.factor).round() as i64, (p.y * self.factor).round() as i64)
    }

    /// Offer one projected edge; returns true when it became a wall
    pub fn add(&mut self, ctx: &mut ImportContext<'_>, a: Point, b: Point) -> bool {
        if !a.is_finite() || !b.is_finite() {
            return false;
        }
        let (ka, kb) = (self.key(a), self.key(b));
        if ka == kb {
            self.collapsed += 1;
            return false;
        }
        let key = if ka <= kb { (ka, kb) } else { (kb, ka) };
        if !self.seen.insert(key) {
            self.duplicates += 1;
            return false;
        }
        let thickness = ctx.config.default_wall_thickness;
        ctx.add_wall(a, b, thickness)
    }

    pub fn unique(&self) -> usize {
        self.seen.len()
    }

    /// Note merged and collapsed edges in the report
    pub fn report(&self, ctx: &mut ImportContext<'_>) {
        if self.duplicates > 0 {
            ctx.report.info(
                ReportCategory::Geometry,
                format!("{} duplicate edge(s) merged", self.duplicates),
            );
        }
        if self.collapsed > 0 {
            ctx.report.info(
                ReportCategory::Geometry,
                format!(
                    "{} vertical edge(s) collapsed to a point in plan view",
                    self.collapsed
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::FileFormat;
    use crate::io::ImportConfiguration;

    #[test]
    fn test_reversed_edges_are_duplicates() {
        let cfg = ImportConfiguration::default();
        let mut ctx = ImportContext::new(FileFormat::Obj, "obj", "a.obj", &cfg);
        let mut edges = EdgeCollector::new(2);
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!(edges.add(&mut ctx, a, b));
        assert!(!edges.add(&mut ctx, b, a));
        assert!(!edges.add(&mut ctx, Point::new(0.001, 0.0), Point::new(10.0, 0.004)));
        assert!(!edges.add(&mut ctx, a, Point::new(0.001, 0.001)));
        assert_eq!(edges.unique(), 1);
        assert_eq!(ctx.plan.walls.len(), 1);
    }
}
