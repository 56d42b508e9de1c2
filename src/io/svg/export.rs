//! Vector markup export

use std::fmt::Write as _;
use std::io::Write;

use tracing::debug;

use crate::error::Result;
use crate::geometry::{format_fixed, format_feet_inches, midpoint, room_polygon, RoomDetectionConfig};
use crate::io::xml::{escape_attr, escape_text};
use crate::io::{ExportOptions, PlanExporter};
use crate::model::{FloorPlanData, Opening};
use crate::types::{BoundingBox2D, Point};

/// Digits after the decimal point of every coordinate
const SVG_DECIMALS: usize = 4;

const ROOM_FILL: &str = "#e8dcc8";
const ROOM_FILL_OPACITY: f64 = 0.35;
const WALL_STROKE: &str = "#333333";
const WINDOW_STROKE: &str = "#88ccee";
const DIMENSION_STROKE: &str = "#666666";
const BACKGROUND: &str = "#ffffff";

/// Plan extent used when there is nothing to draw
const EMPTY_EXTENT: f64 = 240.0;

const TRADE_SYMBOL_RADIUS: f64 = 4.0;

fn n(value: f64) -> String {
    format_fixed(value, SVG_DECIMALS)
}

fn pt(p: Point) -> String {
    format!("{},{}", n(p.x), n(p.y))
}

/// Writes a plan as a standalone SVG document
pub struct SvgExporter<'a> {
    plan: &'a FloorPlanData,
    options: &'a ExportOptions,
}

impl<'a> SvgExporter<'a> {
    pub fn new(plan: &'a FloorPlanData, options: &'a ExportOptions) -> Self {
        Self { plan, options }
    }

    /// Drawing area in plan units
    pub fn view_box(&self) -> BoundingBox2D {
        let padding = self.options.svg_padding.max(0.0);
        let bounds = self.plan.bounds().unwrap_or_else(|| {
            BoundingBox2D::new(Point::ZERO, Point::new(EMPTY_EXTENT, EMPTY_EXTENT))
        });
        let mut padded = bounds.padded(padding);
        // a single straight wall still needs an area
        if padded.width() <= 0.0 {
            padded.max.x = padded.min.x + 1.0;
        }
        if padded.height() <= 0.0 {
            padded.max.y = padded.min.y + 1.0;
        }
        padded
    }

    fn render(&self) -> Result<String> {
        let plan = self.plan;
        let vb = self.view_box();
        let width = if self.options.svg_width > 0.0 {
            self.options.svg_width
        } else {
            ExportOptions::default().svg_width
        };
        let height = width * vb.height() / vb.width();

        let mut out = String::new();
        writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{}" height="{}" viewBox="{} {} {} {}">"#,
            n(width),
            n(height),
            n(vb.min.x),
            n(vb.min.y),
            n(vb.width()),
            n(vb.height())
        )?;
        writeln!(out, "  <title>{}</title>", escape_text(&self.options.project_title))?;
        writeln!(
            out,
            r#"  <rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
            n(vb.min.x),
            n(vb.min.y),
            n(vb.width()),
            n(vb.height()),
            BACKGROUND
        )?;

        self.write_rooms(&mut out)?;
        self.write_walls(&mut out)?;
        self.write_openings(&mut out)?;
        self.write_fixtures(&mut out)?;
        self.write_dimensions(&mut out)?;
        self.write_labels(&mut out)?;
        self.write_trade_layers(&mut out)?;

        writeln!(out, "</svg>")?;
        debug!(walls = plan.walls.len(), rooms = plan.rooms.len(), "rendered SVG");
        Ok(out)
    }

    fn write_rooms(&self, out: &mut String) -> Result<()> {
        let snap = RoomDetectionConfig::default().snap_epsilon;
        writeln!(out, r#"  <g id="rooms">"#)?;
        for room in &self.plan.rooms {
            let Some(polygon) = room_polygon(room, &self.plan.walls, snap) else {
                continue;
            };
            let points: Vec<String> = polygon.iter().map(|p| pt(*p)).collect();
            writeln!(
                out,
                r#"    <polygon id="{}" points="{}" fill="{}" fill-opacity="{}" stroke="none"/>"#,
                escape_attr(&room.id),
                points.join(" "),
                ROOM_FILL,
                n(ROOM_FILL_OPACITY)
            )?;
            writeln!(
                out,
                r#"    <text x="{}" y="{}" font-size="10" text-anchor="middle" fill="{}">{}</text>"#,
                n(room.center.x),
                n(room.center.y),
                WALL_STROKE,
                escape_text(&room.name)
            )?;
        }
        writeln!(out, "  </g>")?;
        Ok(())
    }

    fn write_walls(&self, out: &mut String) -> Result<()> {
        writeln!(
            out,
            r#"  <g id="walls" stroke="{}" stroke-linecap="square" fill="none">"#,
            WALL_STROKE
        )?;
        for wall in self.plan.walls.iter().filter(|w| !w.is_degenerate()) {
            writeln!(
                out,
                r#"    <line x1="{}" y1="{}" x2="{}" y2="{}" stroke-width="{}"/>"#,
                n(wall.start.x),
                n(wall.start.y),
                n(wall.end.x),
                n(wall.end.y),
                n(wall.thickness)
            )?;
        }
        for arc in &self.plan.arc_walls {
            writeln!(
                out,
                r#"    <path d="M{} Q{} {}" stroke-width="{}"/>"#,
                pt(arc.start),
                pt(arc.control_point),
                pt(arc.end),
                n(arc.thickness)
            )?;
        }
        writeln!(out, "  </g>")?;
        Ok(())
    }

    fn write_openings(&self, out: &mut String) -> Result<()> {
        let walls = self.plan.wall_index();
        writeln!(out, r#"  <g id="openings" fill="none">"#)?;
        for door in &self.plan.doors {
            let Some(wall) = walls.get(door.wall_id.as_str()) else {
                continue;
            };
            let Some((a, b)) = door.span(wall) else {
                continue;
            };
            // clear the wall stroke under the opening
            writeln!(
                out,
                r#"    <line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}"/>"#,
                n(a.x),
                n(a.y),
                n(b.x),
                n(b.y),
                BACKGROUND,
                n(wall.thickness + 1.0)
            )?;
            if let Some(swing) = door.swing(wall) {
                writeln!(
                    out,
                    r#"    <line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="1.5000"/>"#,
                    n(swing.hinge.x),
                    n(swing.hinge.y),
                    n(swing.leaf_end.x),
                    n(swing.leaf_end.y),
                    WALL_STROKE
                )?;
                let point_at = |deg: f64| {
                    let rad = deg.to_radians();
                    swing.hinge + Point::new(rad.cos(), rad.sin()) * swing.radius
                };
                let large_arc = if swing.end_angle - swing.start_angle > 180.0 { 1 } else { 0 };
                writeln!(
                    out,
                    r#"    <path d="M{} A{} {} 0 {} 1 {}" stroke="{}" stroke-width="0.7500" stroke-dasharray="4 2"/>"#,
                    pt(point_at(swing.start_angle)),
                    n(swing.radius),
                    n(swing.radius),
                    large_arc,
                    pt(point_at(swing.end_angle)),
                    WALL_STROKE
                )?;
            }
        }
        for window in &self.plan.windows {
            let Some(wall) = walls.get(window.wall_id.as_str()) else {
                continue;
            };
            let Some((a, b)) = window.span(wall) else {
                continue;
            };
            writeln!(
                out,
                r#"    <line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}"/>"#,
                n(a.x),
                n(a.y),
                n(b.x),
                n(b.y),
                WINDOW_STROKE,
                n(wall.thickness)
            )?;
        }
        writeln!(out, "  </g>")?;
        Ok(())
    }

    fn write_fixtures(&self, out: &mut String) -> Result<()> {
        writeln!(out, r#"  <g id="fixtures" fill="none" stroke="{}">"#, WALL_STROKE)?;
        for fixture in &self.plan.fixtures {
            let w = fixture.width.filter(|w| *w > 0.0).unwrap_or(24.0);
            let d = fixture.depth.filter(|d| *d > 0.0).unwrap_or(24.0);
            writeln!(
                out,
                r#"    <rect x="{}" y="{}" width="{}" height="{}" transform="rotate({} {} {})"><title>{}</title></rect>"#,
                n(fixture.position.x - w / 2.0),
                n(fixture.position.y - d / 2.0),
                n(w),
                n(d),
                n(fixture.rotation),
                n(fixture.position.x),
                n(fixture.position.y),
                escape_text(&fixture.fixture_type)
            )?;
        }
        writeln!(out, "  </g>")?;
        Ok(())
    }

    fn write_dimensions(&self, out: &mut String) -> Result<()> {
        writeln!(out, r#"  <g id="dimensions" stroke="{}" fill="{}">"#, DIMENSION_STROKE, DIMENSION_STROKE)?;
        for dim in &self.plan.dimensions {
            if dim.length() < crate::geometry::DEGENERATE_LENGTH {
                continue;
            }
            let (a, b) = dim.offset_endpoints();
            let mid = midpoint(a, b);
            writeln!(
                out,
                r#"    <line x1="{}" y1="{}" x2="{}" y2="{}" stroke-width="0.5000"/>"#,
                n(a.x),
                n(a.y),
                n(b.x),
                n(b.y)
            )?;
            writeln!(
                out,
                r#"    <text x="{}" y="{}" font-size="8" text-anchor="middle" stroke="none">{}</text>"#,
                n(mid.x),
                n(mid.y),
                escape_text(&format_feet_inches(dim.length()))
            )?;
        }
        writeln!(out, "  </g>")?;
        Ok(())
    }

    fn write_labels(&self, out: &mut String) -> Result<()> {
        writeln!(out, r#"  <g id="labels" fill="{}">"#, WALL_STROKE)?;
        for label in self.plan.labels.iter().filter(|l| !l.text.trim().is_empty()) {
            writeln!(
                out,
                r#"    <text x="{}" y="{}" font-size="{}" transform="rotate({} {} {})">{}</text>"#,
                n(label.position.x),
                n(label.position.y),
                n(label.font_size / 4.0),
                n(label.rotation),
                n(label.position.x),
                n(label.position.y),
                escape_text(&label.text)
            )?;
        }
        writeln!(out, "  </g>")?;
        Ok(())
    }

    fn write_trade_layers(&self, out: &mut String) -> Result<()> {
        for layer in self.plan.trade_layers.iter().filter(|l| l.visible) {
            let color = layer.layer_type.color().to_css();
            writeln!(
                out,
                r#"  <g id="{}" class="{}" opacity="{}">"#,
                escape_attr(&layer.id),
                layer.layer_type.layer_name(),
                n(layer.opacity.clamp(0.0, 1.0))
            )?;
            for zone in layer.damage_zones.iter().filter(|z| z.points.len() >= 3) {
                let points: Vec<String> = zone.points.iter().map(|p| pt(*p)).collect();
                writeln!(
                    out,
                    r#"    <polygon points="{}" fill="{}" fill-opacity="0.2500" stroke="{}"/>"#,
                    points.join(" "),
                    color,
                    color
                )?;
            }
            for path in layer.paths.iter().filter(|p| p.points.len() >= 2) {
                let points: Vec<String> = path.points.iter().map(|p| pt(*p)).collect();
                writeln!(
                    out,
                    r#"    <polyline points="{}" fill="none" stroke="{}" stroke-width="{}"/>"#,
                    points.join(" "),
                    color,
                    n(path.stroke_width)
                )?;
            }
            for element in &layer.elements {
                writeln!(
                    out,
                    r#"    <circle cx="{}" cy="{}" r="{}" fill="{}"><title>{}</title></circle>"#,
                    n(element.position.x),
                    n(element.position.y),
                    n(TRADE_SYMBOL_RADIUS),
                    color,
                    escape_text(element.label.as_deref().unwrap_or(&element.symbol))
                )?;
            }
            writeln!(out, "  </g>")?;
        }
        Ok(())
    }
}

impl PlanExporter for SvgExporter<'_> {
    fn write_to_writer<W: Write>(&self, mut writer: W) -> Result<()> {
        let document = self.render()?;
        writer.write_all(document.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Door, Room, TradeLayer, TradeLayerType, Wall, Window};

    fn square() -> FloorPlanData {
        let mut plan = FloorPlanData::new();
        let c = [
            Point::new(0.0, 0.0),
            Point::new(120.0, 0.0),
            Point::new(120.0, 120.0),
            Point::new(0.0, 120.0),
        ];
        for i in 0..4 {
            plan.walls.push(Wall::new(format!("w{}", i + 1), c[i], c[(i + 1) % 4]));
        }
        let mut room = Room::new("r1", "Den & Study");
        room.wall_ids = vec!["w1".into(), "w2".into(), "w3".into(), "w4".into()];
        room.center = Point::new(60.0, 60.0);
        plan.rooms.push(room);
        plan
    }

    fn render(plan: &FloorPlanData) -> String {
        let options = ExportOptions::default();
        String::from_utf8(SvgExporter::new(plan, &options).write_to_vec().unwrap()).unwrap()
    }

    #[test]
    fn test_view_box_is_padded_bounds() {
        let plan = square();
        let options = ExportOptions::default();
        let vb = SvgExporter::new(&plan, &options).view_box();
        assert_eq!(vb.min, Point::new(-24.0, -24.0));
        assert_eq!(vb.max, Point::new(144.0, 144.0));

        let svg = render(&plan);
        assert!(svg.contains(r#"viewBox="-24.0000 -24.0000 168.0000 168.0000""#));
        assert!(svg.contains(r#"width="1200.0000" height="1200.0000""#));
    }

    #[test]
    fn test_rooms_under_walls_and_escaped() {
        let svg = render(&square());
        let rooms = svg.find(r#"<g id="rooms">"#).unwrap();
        let walls = svg.find(r#"<g id="walls""#).unwrap();
        assert!(rooms < walls);
        assert!(svg.contains("Den &amp; Study"));
        assert_eq!(svg.matches("<line ").count(), 4);
    }

    #[test]
    fn test_openings() {
        let mut plan = square();
        plan.doors.push(Door::new("d1", "w1", 0.5, 32.0));
        plan.doors.push(Door::new("d2", "missing", 0.5, 32.0));
        plan.windows.push(Window::new("win1", "w2", 0.5, 36.0));
        let svg = render(&plan);
        // gap + leaf for the door, one window line, four walls
        assert_eq!(svg.matches("<line ").count(), 7);
        assert_eq!(svg.matches(" A32.0000 32.0000 0 0 1 ").count(), 1);
        assert!(svg.contains(WINDOW_STROKE));
    }

    #[test]
    fn test_invisible_trade_layers_are_not_rendered() {
        let mut plan = square();
        let mut shown = TradeLayer::new("t1", TradeLayerType::Plumbing);
        shown.opacity = 0.5;
        let mut hidden = TradeLayer::new("t2", TradeLayerType::Electrical);
        hidden.visible = false;
        plan.trade_layers.push(shown);
        plan.trade_layers.push(hidden);
        let svg = render(&plan);
        assert!(svg.contains(r#"<g id="t1" class="TRADE-PLUMBING" opacity="0.5000">"#));
        assert!(!svg.contains(r#"id="t2""#));
    }

    #[test]
    fn test_empty_plan_is_complete() {
        let svg = render(&FloorPlanData::new());
        assert!(svg.starts_with("<?xml"));
        assert!(svg.trim_end().ends_with("</svg>"));
        crate::io::xml::parse_document(&svg).unwrap();
    }
}
