//! SketchPlan export

use std::fmt::{self, Write as _};
use std::io::Write;

use super::SKETCH_FORMAT_VERSION;
use crate::detect::SKETCH_ROOT_TAG;
use crate::error::Result;
use crate::geometry::format_fixed;
use crate::io::xml::{escape_attr, escape_text};
use crate::io::PlanExporter;
use crate::model::FloorPlanData;
use crate::types::Point;

const SKETCH_DECIMALS: usize = 4;

fn n(value: f64) -> String {
    format_fixed(value, SKETCH_DECIMALS)
}

fn points_attr(points: &[Point]) -> String {
    let pairs: Vec<String> = points.iter().map(|p| format!("{},{}", n(p.x), n(p.y))).collect();
    pairs.join(" ")
}

/// Start tag attributes as name/value pairs; values are escaped on display
struct Attrs(Vec<(&'static str, String)>);

impl Attrs {
    fn new() -> Self {
        Self(Vec::new())
    }

    fn text(mut self, name: &'static str, value: &str) -> Self {
        self.0.push((name, value.to_string()));
        self
    }

    fn num(self, name: &'static str, value: f64) -> Self {
        self.text(name, &n(value))
    }

    fn point(self, x: &'static str, y: &'static str, p: Point) -> Self {
        self.num(x, p.x).num(y, p.y)
    }

    fn opt_num(self, name: &'static str, value: Option<f64>) -> Self {
        match value {
            Some(v) => self.num(name, v),
            None => self,
        }
    }

    fn opt_text(self, name: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.text(name, v),
            None => self,
        }
    }

    fn flag(self, name: &'static str, value: bool) -> Self {
        self.text(name, if value { "true" } else { "false" })
    }
}

impl fmt::Display for Attrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.0 {
            write!(f, " {}=\"{}\"", name, escape_attr(value))?;
        }
        Ok(())
    }
}

/// Writes a plan in the SketchPlan round-trip format
pub struct SketchExporter<'a> {
    plan: &'a FloorPlanData,
}

impl<'a> SketchExporter<'a> {
    pub fn new(plan: &'a FloorPlanData) -> Self {
        Self { plan }
    }

    fn render(&self) -> Result<String> {
        let plan = self.plan;
        let mut out = String::new();
        writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        let root = Attrs::new()
            .text("version", SKETCH_FORMAT_VERSION)
            .num("scale", plan.scale)
            .text("units", plan.units.as_str());
        writeln!(out, "<{}{}>", SKETCH_ROOT_TAG, root)?;

        writeln!(out, "  <Walls>")?;
        for wall in &plan.walls {
            let a = Attrs::new()
                .text("id", &wall.id)
                .point("x1", "y1", wall.start)
                .point("x2", "y2", wall.end)
                .num("thickness", wall.thickness)
                .num("height", wall.height);
            writeln!(out, "    <Wall{}/>", a)?;
        }
        writeln!(out, "  </Walls>")?;

        writeln!(out, "  <ArcWalls>")?;
        for arc in &plan.arc_walls {
            let a = Attrs::new()
                .text("id", &arc.id)
                .point("x1", "y1", arc.start)
                .point("cx", "cy", arc.control_point)
                .point("x2", "y2", arc.end)
                .num("thickness", arc.thickness)
                .num("height", arc.height);
            writeln!(out, "    <ArcWall{}/>", a)?;
        }
        writeln!(out, "  </ArcWalls>")?;

        // openings and rooms on missing walls are left out
        let walls = plan.wall_index();
        let placed = |wall_id: &str| walls.contains_key(wall_id);

        writeln!(out, "  <Doors>")?;
        for door in plan.doors.iter().filter(|d| placed(&d.wall_id)) {
            let a = Attrs::new()
                .text("id", &door.id)
                .text("wallId", &door.wall_id)
                .num("position", door.position)
                .num("width", door.width)
                .text("type", door.door_type.as_str())
                .opt_num("swingAngle", door.swing_angle);
            let a = match door.flip_side {
                Some(flip) => a.flag("flipSide", flip),
                None => a,
            };
            writeln!(out, "    <Door{}/>", a)?;
        }
        writeln!(out, "  </Doors>")?;

        writeln!(out, "  <Windows>")?;
        for window in plan.windows.iter().filter(|w| placed(&w.wall_id)) {
            let a = Attrs::new()
                .text("id", &window.id)
                .text("wallId", &window.wall_id)
                .num("position", window.position)
                .num("width", window.width)
                .text("type", window.window_type.as_str())
                .opt_num("sillHeight", window.sill_height);
            writeln!(out, "    <Window{}/>", a)?;
        }
        writeln!(out, "  </Windows>")?;

        writeln!(out, "  <Fixtures>")?;
        for fixture in &plan.fixtures {
            let a = Attrs::new()
                .text("id", &fixture.id)
                .point("x", "y", fixture.position)
                .text("type", &fixture.fixture_type)
                .num("rotation", fixture.rotation)
                .opt_num("width", fixture.width)
                .opt_num("depth", fixture.depth);
            writeln!(out, "    <Fixture{}/>", a)?;
        }
        writeln!(out, "  </Fixtures>")?;

        writeln!(out, "  <Rooms>")?;
        for room in plan.rooms.iter().filter(|r| r.wall_ids.iter().all(|id| placed(id))) {
            let a = Attrs::new()
                .text("id", &room.id)
                .text("name", &room.name)
                .point("cx", "cy", room.center)
                .num("area", room.area);
            writeln!(out, "    <Room{}>", a)?;
            for wall_id in &room.wall_ids {
                writeln!(out, "      <WallRef{}/>", Attrs::new().text("id", wall_id))?;
            }
            writeln!(out, "    </Room>")?;
        }
        writeln!(out, "  </Rooms>")?;

        writeln!(out, "  <Dimensions>")?;
        for dim in &plan.dimensions {
            let a = Attrs::new()
                .text("id", &dim.id)
                .point("x1", "y1", dim.start)
                .point("x2", "y2", dim.end)
                .num("offset", dim.offset)
                .flag("auto", dim.is_auto);
            writeln!(out, "    <Dimension{}/>", a)?;
        }
        writeln!(out, "  </Dimensions>")?;

        writeln!(out, "  <Labels>")?;
        for label in &plan.labels {
            let a = Attrs::new()
                .text("id", &label.id)
                .point("x", "y", label.position)
                .num("fontSize", label.font_size)
                .num("rotation", label.rotation);
            writeln!(out, "    <Label{}>{}</Label>", a, escape_text(&label.text))?;
        }
        writeln!(out, "  </Labels>")?;

        writeln!(out, "  <TradeLayers>")?;
        for layer in &plan.trade_layers {
            let a = Attrs::new()
                .text("id", &layer.id)
                .text("type", layer.layer_type.as_str())
                .text("name", &layer.name)
                .flag("visible", layer.visible)
                .flag("locked", layer.locked)
                .num("opacity", layer.opacity);
            writeln!(out, "    <TradeLayer{}>", a)?;
            for element in &layer.elements {
                let a = Attrs::new()
                    .text("id", &element.id)
                    .text("type", &element.symbol)
                    .point("x", "y", element.position)
                    .num("rotation", element.rotation)
                    .opt_text("label", element.label.as_deref());
                writeln!(out, "      <Element{}/>", a)?;
            }
            for path in &layer.paths {
                let a = Attrs::new()
                    .text("id", &path.id)
                    .text("type", &path.path_type)
                    .num("strokeWidth", path.stroke_width)
                    .text("points", &points_attr(&path.points));
                writeln!(out, "      <Path{}/>", a)?;
            }
            for zone in &layer.damage_zones {
                let a = Attrs::new()
                    .text("id", &zone.id)
                    .text("damageClass", &zone.damage_class)
                    .text("iicrcCategory", &zone.iicrc_category)
                    .opt_text("label", zone.label.as_deref())
                    .text("points", &points_attr(&zone.points));
                writeln!(out, "      <DamageZone{}/>", a)?;
            }
            writeln!(out, "    </TradeLayer>")?;
        }
        writeln!(out, "  </TradeLayers>")?;

        writeln!(out, "</{}>", SKETCH_ROOT_TAG)?;
        Ok(out)
    }
}

impl PlanExporter for SketchExporter<'_> {
    fn write_to_writer<W: Write>(&self, mut writer: W) -> Result<()> {
        let document = self.render()?;
        writer.write_all(document.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}
