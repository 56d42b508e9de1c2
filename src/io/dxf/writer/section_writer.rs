//! HEADER, TABLES, and ENTITIES sections of an exported drawing

use tracing::debug;

use super::stream_writer::{DxfStreamWriter, DxfStreamWriterExt};
use crate::error::Result;
use crate::geometry::{
    format_area, format_feet_inches, polygon_area_sq_ft, room_polygon, RoomDetectionConfig,
};
use crate::model::{FloorPlanData, Opening, TradeLayerType, ARC_WALL_SEGMENTS};
use crate::types::{BoundingBox2D, Handle, HandleSeed, Point};

/// Drawing version written to `$ACADVER` (AutoCAD 2000)
pub const DXF_VERSION: &str = "AC1015";

pub const LAYER_WALLS: &str = "WALLS";
pub const LAYER_ROOMS: &str = "ROOMS";
pub const LAYER_DOORS: &str = "DOORS";
pub const LAYER_WINDOWS: &str = "WINDOWS";
pub const LAYER_DIMENSIONS: &str = "DIMENSIONS";
pub const LAYER_LABELS: &str = "LABELS";
pub const LAYER_FIXTURES: &str = "FIXTURES";

/// A layer table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DxfLayer {
    pub name: String,
    /// ACI color
    pub color: i16,
}

impl DxfLayer {
    fn new(name: &str, color: i16) -> Self {
        Self {
            name: name.to_string(),
            color,
        }
    }
}

/// Fixed layers plus one per trade type present in the plan
pub fn plan_layers(plan: &FloorPlanData) -> Vec<DxfLayer> {
    let mut layers = vec![
        DxfLayer::new("0", 7),
        DxfLayer::new(LAYER_WALLS, 7),
        DxfLayer::new(LAYER_ROOMS, 3),
        DxfLayer::new(LAYER_DOORS, 4),
        DxfLayer::new(LAYER_WINDOWS, 5),
        DxfLayer::new(LAYER_DIMENSIONS, 1),
        DxfLayer::new(LAYER_LABELS, 2),
        DxfLayer::new(LAYER_FIXTURES, 6),
    ];
    for trade in TradeLayerType::ALL {
        if plan.trade_layers.iter().any(|l| l.layer_type == trade) {
            layers.push(DxfLayer::new(trade.layer_name(), trade.aci()));
        }
    }
    layers
}

/// Distance of the area text below the room name
const ROOM_AREA_OFFSET: f64 = 12.0;
const ROOM_TEXT_HEIGHT: f64 = 6.0;
const DIMENSION_TEXT_HEIGHT: f64 = 4.0;
const FIXTURE_RADIUS: f64 = 6.0;
const TRADE_SYMBOL_RADIUS: f64 = 4.0;

pub struct SectionWriter<'w, W: DxfStreamWriter> {
    writer: &'w mut W,
    handles: &'w mut HandleSeed,
}

impl<'w, W: DxfStreamWriter> SectionWriter<'w, W> {
    pub fn new(writer: &'w mut W, handles: &'w mut HandleSeed) -> Self {
        Self { writer, handles }
    }

    pub fn write_header(&mut self, extents: BoundingBox2D, handseed: Handle) -> Result<()> {
        let w = &mut *self.writer;
        w.write_section_start("HEADER")?;
        w.write_variable("$ACADVER")?;
        w.write_string(1, DXF_VERSION)?;
        w.write_variable("$HANDSEED")?;
        w.write_handle(5, handseed)?;
        w.write_variable("$EXTMIN")?;
        w.write_point(10, extents.min)?;
        w.write_variable("$EXTMAX")?;
        w.write_point(10, extents.max)?;
        w.write_variable("$INSUNITS")?;
        w.write_i16(70, 1)?;
        w.write_variable("$MEASUREMENT")?;
        w.write_i16(70, 0)?;
        w.write_section_end()
    }

    fn table_start(&mut self, name: &str, count: usize) -> Result<()> {
        let handle = self.handles.next();
        let w = &mut *self.writer;
        w.write_string(0, "TABLE")?;
        w.write_string(2, name)?;
        w.write_handle(5, handle)?;
        w.write_subclass("AcDbSymbolTable")?;
        w.write_i16(70, i16::try_from(count).unwrap_or(i16::MAX))
    }

    fn table_record(&mut self, record_type: &str, subclass: &str, name: &str) -> Result<()> {
        let handle = self.handles.next();
        let w = &mut *self.writer;
        w.write_string(0, record_type)?;
        w.write_handle(5, handle)?;
        w.write_subclass("AcDbSymbolTableRecord")?;
        w.write_subclass(subclass)?;
        w.write_string(2, name)?;
        w.write_i16(70, 0)
    }

    pub fn write_tables(&mut self, layers: &[DxfLayer]) -> Result<()> {
        self.writer.write_section_start("TABLES")?;

        self.table_start("LTYPE", 1)?;
        self.table_record("LTYPE", "AcDbLinetypeTableRecord", "CONTINUOUS")?;
        self.writer.write_string(3, "Solid line")?;
        self.writer.write_i16(72, 65)?;
        self.writer.write_i16(73, 0)?;
        self.writer.write_double(40, 0.0)?;
        self.writer.write_string(0, "ENDTAB")?;

        self.table_start("LAYER", layers.len())?;
        for layer in layers {
            self.table_record("LAYER", "AcDbLayerTableRecord", &layer.name)?;
            self.writer.write_i16(62, layer.color)?;
            self.writer.write_string(6, "CONTINUOUS")?;
        }
        self.writer.write_string(0, "ENDTAB")?;

        self.table_start("STYLE", 1)?;
        self.table_record("STYLE", "AcDbTextStyleTableRecord", "Standard")?;
        self.writer.write_double(40, 0.0)?;
        self.writer.write_double(41, 1.0)?;
        self.writer.write_double(50, 0.0)?;
        self.writer.write_i16(71, 0)?;
        self.writer.write_double(42, 2.5)?;
        self.writer.write_string(3, "txt")?;
        self.writer.write_string(4, "")?;
        self.writer.write_string(0, "ENDTAB")?;

        self.writer.write_section_end()
    }

    pub fn write_entities(&mut self, plan: &FloorPlanData) -> Result<()> {
        self.writer.write_section_start("ENTITIES")?;
        let walls = plan.wall_index();
        let snap = RoomDetectionConfig::default().snap_epsilon;

        for wall in plan.walls.iter().filter(|w| !w.is_degenerate()) {
            self.line(LAYER_WALLS, wall.start, wall.end)?;
        }
        for arc in &plan.arc_walls {
            self.lwpolyline(LAYER_WALLS, &arc.flatten(ARC_WALL_SEGMENTS), false)?;
        }

        for room in &plan.rooms {
            let Some(polygon) = room_polygon(room, &plan.walls, snap) else {
                debug!(room = %room.id, "room boundary does not close, skipped");
                continue;
            };
            self.lwpolyline(LAYER_ROOMS, &polygon, true)?;
            self.text(LAYER_ROOMS, room.center, ROOM_TEXT_HEIGHT, &room.name, 0.0)?;
            let area = if room.area > 0.0 {
                room.area
            } else {
                polygon_area_sq_ft(&polygon, 12.0)
            };
            let below = Point::new(room.center.x, room.center.y - ROOM_AREA_OFFSET);
            self.text(LAYER_ROOMS, below, ROOM_TEXT_HEIGHT * 0.75, &format_area(area, plan.units), 0.0)?;
        }

        for door in &plan.doors {
            let Some(wall) = walls.get(door.wall_id.as_str()) else {
                continue;
            };
            match door.swing(wall) {
                Some(swing) => {
                    self.line(LAYER_DOORS, swing.hinge, swing.leaf_end)?;
                    self.arc(LAYER_DOORS, swing.hinge, swing.radius, swing.start_angle, swing.end_angle)?;
                }
                None => {
                    if let Some((a, b)) = door.span(wall) {
                        self.line(LAYER_DOORS, a, b)?;
                    }
                }
            }
        }

        for window in &plan.windows {
            let Some(wall) = walls.get(window.wall_id.as_str()) else {
                continue;
            };
            let Some((a, b)) = window.span(wall) else {
                continue;
            };
            // two sash lines inside the wall thickness
            let normal = (b - a).perpendicular().normalize() * (wall.thickness / 4.0);
            self.line(LAYER_WINDOWS, a + normal, b + normal)?;
            self.line(LAYER_WINDOWS, a - normal, b - normal)?;
        }

        for dim in &plan.dimensions {
            if dim.length() < crate::geometry::DEGENERATE_LENGTH {
                continue;
            }
            let (a, b) = dim.offset_endpoints();
            self.line(LAYER_DIMENSIONS, a, b)?;
            let mid = crate::geometry::midpoint(a, b);
            let angle = (b.y - a.y).atan2(b.x - a.x).to_degrees();
            self.text(
                LAYER_DIMENSIONS,
                mid,
                DIMENSION_TEXT_HEIGHT,
                &format_feet_inches(dim.length()),
                readable_angle(angle),
            )?;
        }

        for label in &plan.labels {
            if label.text.trim().is_empty() {
                continue;
            }
            self.text(LAYER_LABELS, label.position, label.font_size / 4.0, &label.text, label.rotation)?;
        }

        for fixture in &plan.fixtures {
            let radius = match (fixture.width, fixture.depth) {
                (Some(w), Some(d)) if w > 0.0 && d > 0.0 => w.min(d) / 2.0,
                _ => FIXTURE_RADIUS,
            };
            self.circle(LAYER_FIXTURES, fixture.position, radius)?;
            self.text(
                LAYER_FIXTURES,
                Point::new(fixture.position.x + radius, fixture.position.y),
                DIMENSION_TEXT_HEIGHT,
                &fixture.fixture_type,
                fixture.rotation,
            )?;
        }

        for layer in &plan.trade_layers {
            let name = layer.layer_type.layer_name();
            for element in &layer.elements {
                self.circle(name, element.position, TRADE_SYMBOL_RADIUS)?;
                if let Some(label) = element.label.as_deref().filter(|l| !l.is_empty()) {
                    let at = Point::new(element.position.x + TRADE_SYMBOL_RADIUS * 1.5, element.position.y);
                    self.text(name, at, DIMENSION_TEXT_HEIGHT * 0.75, label, 0.0)?;
                }
            }
            for path in layer.paths.iter().filter(|p| p.points.len() >= 2) {
                self.lwpolyline(name, &path.points, false)?;
            }
            for zone in layer.damage_zones.iter().filter(|z| z.points.len() >= 3) {
                self.lwpolyline(name, &zone.points, true)?;
            }
        }

        self.writer.write_section_end()
    }

    fn entity_header(&mut self, entity_type: &str, layer: &str) -> Result<()> {
        let handle = self.handles.next();
        let w = &mut *self.writer;
        w.write_entity_type(entity_type)?;
        w.write_handle(5, handle)?;
        w.write_subclass("AcDbEntity")?;
        w.write_string(8, layer)
    }

    fn line(&mut self, layer: &str, start: Point, end: Point) -> Result<()> {
        if !start.is_finite() || !end.is_finite() || start.distance(&end) < crate::geometry::DEGENERATE_LENGTH {
            return Ok(());
        }
        self.entity_header("LINE", layer)?;
        self.writer.write_subclass("AcDbLine")?;
        self.writer.write_point(10, start)?;
        self.writer.write_point(11, end)
    }

    fn lwpolyline(&mut self, layer: &str, points: &[Point], closed: bool) -> Result<()> {
        if points.len() < 2 {
            return Ok(());
        }
        self.entity_header("LWPOLYLINE", layer)?;
        self.writer.write_subclass("AcDbPolyline")?;
        self.writer
            .write_i32(90, i32::try_from(points.len()).unwrap_or(i32::MAX))?;
        self.writer.write_i16(70, if closed { 1 } else { 0 })?;
        self.writer.write_double(43, 0.0)?;
        for p in points {
            self.writer.write_point2d(10, *p)?;
        }
        Ok(())
    }

    fn arc(&mut self, layer: &str, center: Point, radius: f64, start_deg: f64, end_deg: f64) -> Result<()> {
        self.entity_header("ARC", layer)?;
        self.writer.write_subclass("AcDbCircle")?;
        self.writer.write_point(10, center)?;
        self.writer.write_double(40, radius)?;
        self.writer.write_subclass("AcDbArc")?;
        self.writer.write_double(50, start_deg.rem_euclid(360.0))?;
        self.writer.write_double(51, end_deg.rem_euclid(360.0))
    }

    fn circle(&mut self, layer: &str, center: Point, radius: f64) -> Result<()> {
        self.entity_header("CIRCLE", layer)?;
        self.writer.write_subclass("AcDbCircle")?;
        self.writer.write_point(10, center)?;
        self.writer.write_double(40, radius)
    }

    fn text(&mut self, layer: &str, at: Point, height: f64, value: &str, rotation: f64) -> Result<()> {
        self.entity_header("TEXT", layer)?;
        self.writer.write_subclass("AcDbText")?;
        self.writer.write_point(10, at)?;
        self.writer.write_double(40, if height > 0.0 { height } else { 1.0 })?;
        self.writer.write_string(1, value)?;
        self.writer.write_double(50, rotation)?;
        self.writer.write_subclass("AcDbText")
    }
}

/// Keep dimension text upright
fn readable_angle(angle: f64) -> f64 {
    if angle > 90.0 {
        angle - 180.0
    } else if angle <= -90.0 {
        angle + 180.0
    } else {
        angle
    }
}

/// `$EXTMIN`/`$EXTMAX`; an empty plan has zero extents
pub fn drawing_extents(plan: &FloorPlanData) -> BoundingBox2D {
    plan.bounds()
        .unwrap_or_else(|| BoundingBox2D::new(Point::ZERO, Point::ZERO))
}
