//! Section readers: layer table, block definitions, and drawing entities
//!
//! Entities are gathered as flat records (every pair up to the next `0`) and
//! converted in one place, so an unknown entity type never desynchronizes the
//! stream.

use bitflags::bitflags;
use tracing::debug;

use super::stream_reader::{DxfCodePair, DxfStreamReader};
use super::text_reader::DxfTextReader;
use crate::error::{PlanError, Result};
use crate::geometry::{arc_points, circle_points, circle_segment_count};
use crate::io::context::{ImportContext, SkipRule};
use crate::report::{ReportCategory, Severity, Skipped};
use crate::types::Point;

bitflags! {
    /// Group 70 of POLYLINE and LWPOLYLINE
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PolylineFlags: i16 {
        const CLOSED = 1;
        const CURVE_FIT = 2;
        const SPLINE_FIT = 4;
        const POLYLINE_3D = 8;
        const POLYGON_MESH = 16;
        const MESH_CLOSED_N = 32;
        const POLYFACE_MESH = 64;
        const PLINEGEN = 128;
    }
}

const MALFORMED: SkipRule = SkipRule::new(
    Skipped::Other,
    Severity::Warning,
    ReportCategory::Geometry,
    "required coordinates are missing or invalid",
);
const CORRUPT: SkipRule = SkipRule::new(
    Skipped::Other,
    Severity::Warning,
    ReportCategory::Geometry,
    "invalid group codes; reading resumed at the next entity",
);
const POINT_MARKER: SkipRule = SkipRule::new(
    Skipped::Other,
    Severity::Info,
    ReportCategory::Geometry,
    "point markers carry no wall geometry",
);
const BLOCK_INSERT: SkipRule = SkipRule::new(
    Skipped::Blocks,
    Severity::Warning,
    ReportCategory::Blocks,
    "block references are not expanded",
);
const BLOCK_DEFINITION: SkipRule = SkipRule::new(
    Skipped::Blocks,
    Severity::Warning,
    ReportCategory::Blocks,
    "block contents (furniture, symbols, title blocks) are not imported",
);
const SOLID: SkipRule = SkipRule::new(
    Skipped::ThreeDSolids,
    Severity::Warning,
    ReportCategory::Geometry,
    "3D and filled solids are not imported",
);
const HATCH: SkipRule = SkipRule::new(
    Skipped::Hatches,
    Severity::Warning,
    ReportCategory::Geometry,
    "hatch fills are not imported",
);
const CURVE: SkipRule = SkipRule::new(
    Skipped::Other,
    Severity::Warning,
    ReportCategory::Geometry,
    "splines and ellipses are not approximated",
);
const LEADER: SkipRule = SkipRule::new(
    Skipped::Annotations,
    Severity::Info,
    ReportCategory::Annotations,
    "leaders and tolerance frames are not imported",
);
const EMPTY_TEXT: SkipRule = SkipRule::new(
    Skipped::Annotations,
    Severity::Info,
    ReportCategory::Annotations,
    "text without content",
);
const DIMENSION_POINTS: SkipRule = SkipRule::new(
    Skipped::Annotations,
    Severity::Warning,
    ReportCategory::Dimensions,
    "dimension has no measurement points",
);
const EMBEDDED: SkipRule = SkipRule::new(
    Skipped::Other,
    Severity::Warning,
    ReportCategory::Geometry,
    "raster images and embedded objects are not imported",
);
const UNSUPPORTED: SkipRule = SkipRule::new(
    Skipped::Other,
    Severity::Info,
    ReportCategory::Geometry,
    "entity type is not supported",
);

/// Every pair of one entity, up to the next `0` marker
#[derive(Debug, Clone)]
pub(crate) struct EntityRecord {
    pub name: String,
    pub pairs: Vec<DxfCodePair>,
}

impl EntityRecord {
    fn first(&self, code: i32) -> Option<&DxfCodePair> {
        self.pairs.iter().find(|p| p.code == code)
    }

    pub fn double(&self, code: i32) -> Option<f64> {
        self.first(code).and_then(DxfCodePair::as_double)
    }

    pub fn flags(&self) -> PolylineFlags {
        self.first(70)
            .and_then(DxfCodePair::as_i16)
            .map(PolylineFlags::from_bits_truncate)
            .unwrap_or_else(PolylineFlags::empty)
    }

    pub fn text(&self, code: i32) -> Option<&str> {
        self.first(code).map(DxfCodePair::as_str)
    }

    /// Point from `x_code` and `x_code + 10`
    pub fn point(&self, x_code: i32) -> Option<Point> {
        match (self.double(x_code), self.double(x_code + 10)) {
            (Some(x), Some(y)) => Some(Point::new(x, y)),
            _ => None,
        }
    }

    /// Repeated 10/20 vertices in order (LWPOLYLINE)
    pub fn vertices(&self) -> Vec<Point> {
        let mut points = Vec::new();
        let mut x = None;
        for pair in &self.pairs {
            match pair.code {
                10 => x = pair.as_double(),
                20 => {
                    if let (Some(px), Some(py)) = (x.take(), pair.as_double()) {
                        points.push(Point::new(px, py));
                    }
                }
                _ => {}
            }
        }
        points
    }
}

pub(super) struct SectionReader<'r, 'a> {
    reader: &'r mut DxfTextReader<'a>,
    /// Drawing units → inches
    scale: f64,
}

impl<'r, 'a> SectionReader<'r, 'a> {
    pub fn new(reader: &'r mut DxfTextReader<'a>, scale: f64) -> Self {
        Self { reader, scale }
    }

    pub fn skip_section(&mut self) -> Result<()> {
        while let Some(pair) = self.reader.read_pair()? {
            if pair.is_marker("ENDSEC") {
                return Ok(());
            }
        }
        Err(truncated("section"))
    }

    /// Pairs following a `0 <name>` marker, leaving the next marker unread
    fn read_record(&mut self, name: &str) -> Result<EntityRecord> {
        let mut pairs = Vec::new();
        while let Some(pair) = self.reader.read_pair()? {
            if pair.code == 0 {
                self.reader.push_back(pair);
                break;
            }
            pairs.push(pair);
        }
        Ok(EntityRecord {
            name: name.to_string(),
            pairs,
        })
    }

    /// Next `0` marker, skipping stray pairs
    fn next_marker(&mut self, section: &str) -> Result<String> {
        while let Some(pair) = self.reader.read_pair()? {
            if pair.code == 0 {
                return Ok(pair.value);
            }
        }
        Err(truncated(section))
    }

    /// Report the layer names of the LAYER table
    pub fn read_tables(&mut self, ctx: &mut ImportContext<'_>) -> Result<()> {
        let mut current_table = String::new();
        let mut layers = Vec::new();
        loop {
            let marker = self.next_marker("TABLES")?;
            match marker.as_str() {
                "ENDSEC" => break,
                "TABLE" => {
                    let record = self.read_record(&marker)?;
                    current_table = record.text(2).unwrap_or_default().to_string();
                }
                "ENDTAB" => current_table.clear(),
                "LAYER" if current_table == "LAYER" => {
                    let record = self.read_record(&marker)?;
                    if let Some(name) = record.text(2) {
                        layers.push(name.to_string());
                    }
                }
                _ => {
                    self.read_record(&marker)?;
                }
            }
        }

        if !layers.is_empty() {
            let shown: Vec<&str> = layers.iter().take(10).map(String::as_str).collect();
            let more = if layers.len() > shown.len() { ", ..." } else { "" };
            ctx.report.push(
                crate::report::ReportItem::new(
                    Severity::Info,
                    ReportCategory::Layers,
                    format!(
                        "Found {} layer(s): {}{}; layer assignments are not preserved",
                        layers.len(),
                        shown.join(", "),
                        more
                    ),
                )
                .with_count(layers.len()),
            );
        }
        Ok(())
    }

    /// Count user block definitions; their contents are never merged
    pub fn read_blocks(&mut self, ctx: &mut ImportContext<'_>) -> Result<()> {
        let mut definitions = 0;
        loop {
            let marker = self.next_marker("BLOCKS")?;
            match marker.as_str() {
                "ENDSEC" => break,
                "BLOCK" => {
                    let record = self.read_record(&marker)?;
                    let name = record.text(2).unwrap_or_default();
                    if !name.starts_with('*') {
                        debug!(block = name, "skipping block definition");
                        definitions += 1;
                    }
                }
                _ => {
                    self.read_record(&marker)?;
                }
            }
        }
        ctx.skip_n("block definition(s)", BLOCK_DEFINITION, definitions);
        Ok(())
    }

    /// Convert drawing entities; an unreadable entity is dropped and reading
    /// resumes at the next marker
    pub fn read_entities(&mut self, ctx: &mut ImportContext<'_>) -> Result<()> {
        loop {
            match self.read_entity(ctx) {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(PlanError::Parse(message)) => {
                    if !self.reader.skip_to_marker() {
                        return Err(PlanError::Parse(message));
                    }
                    debug!(line = self.reader.line_number(), error = %message, "resynchronized DXF entity stream");
                    ctx.skip("unreadable entity", CORRUPT);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// One entity; true at the end of the section
    fn read_entity(&mut self, ctx: &mut ImportContext<'_>) -> Result<bool> {
        let marker = self.next_marker("ENTITIES")?;
        match marker.as_str() {
            "ENDSEC" => return Ok(true),
            "POLYLINE" => {
                let header = self.read_record(&marker)?;
                let vertices = self.read_vertices()?;
                self.convert_polyline(ctx, &header, &vertices);
            }
            _ => {
                let record = self.read_record(&marker)?;
                self.convert_entity(ctx, &record);
            }
        }
        Ok(false)
    }

    /// VERTEX records up to and including SEQEND
    fn read_vertices(&mut self) -> Result<Vec<Point>> {
        let mut vertices = Vec::new();
        while let Some(pair) = self.reader.read_pair()? {
            if pair.is_marker("VERTEX") {
                let record = self.read_record(&pair.value)?;
                if let Some(p) = record.point(10) {
                    vertices.push(p);
                }
            } else if pair.is_marker("SEQEND") {
                self.read_record(&pair.value)?;
                break;
            } else {
                self.reader.push_back(pair);
                break;
            }
        }
        Ok(vertices)
    }

    fn scaled(&self, p: Point) -> Point {
        p * self.scale
    }

    fn convert_polyline(&self, ctx: &mut ImportContext<'_>, header: &EntityRecord, vertices: &[Point]) {
        let flags = header.flags();
        if flags.intersects(PolylineFlags::POLYGON_MESH | PolylineFlags::POLYFACE_MESH) {
            ctx.skip("POLYLINE mesh", SOLID);
            return;
        }
        if vertices.len() < 2 {
            ctx.skip("POLYLINE", MALFORMED);
            return;
        }
        let points: Vec<Point> = vertices.iter().map(|&p| self.scaled(p)).collect();
        let thickness = ctx.config.default_wall_thickness;
        ctx.add_polyline(&points, flags.contains(PolylineFlags::CLOSED), thickness);
    }

    fn convert_entity(&self, ctx: &mut ImportContext<'_>, record: &EntityRecord) {
        let thickness = ctx.config.default_wall_thickness;
        match record.name.as_str() {
            "LINE" => match (record.point(10), record.point(11)) {
                (Some(a), Some(b)) => {
                    ctx.add_wall(self.scaled(a), self.scaled(b), thickness);
                }
                _ => ctx.skip("LINE", MALFORMED),
            },
            "LWPOLYLINE" => {
                let points: Vec<Point> =
                    record.vertices().into_iter().map(|p| self.scaled(p)).collect();
                if points.len() < 2 {
                    ctx.skip("LWPOLYLINE", MALFORMED);
                    return;
                }
                let closed = record.flags().contains(PolylineFlags::CLOSED);
                ctx.add_polyline(&points, closed, thickness);
            }
            "ARC" => {
                let (Some(center), Some(radius)) = (record.point(10), record.double(40)) else {
                    ctx.skip("ARC", MALFORMED);
                    return;
                };
                if radius <= 0.0 || !radius.is_finite() {
                    ctx.skip("ARC", MALFORMED);
                    return;
                }
                let start = record.double(50).unwrap_or(0.0).to_radians();
                let end = record.double(51).unwrap_or(360.0).to_radians();
                let points = arc_points(self.scaled(center), radius * self.scale, start, end);
                ctx.add_polyline(&points, false, thickness);
            }
            "CIRCLE" => {
                let (Some(center), Some(radius)) = (record.point(10), record.double(40)) else {
                    ctx.skip("CIRCLE", MALFORMED);
                    return;
                };
                if radius <= 0.0 || !radius.is_finite() {
                    ctx.skip("CIRCLE", MALFORMED);
                    return;
                }
                let r = radius * self.scale;
                let ring = circle_points(self.scaled(center), r, circle_segment_count(r));
                let ring_thickness = ctx.config.circle_wall_thickness;
                ctx.add_polyline(&ring, true, ring_thickness);
            }
            "TEXT" | "MTEXT" => self.convert_text(ctx, record),
            "DIMENSION" => {
                let points = match (record.point(13), record.point(14)) {
                    (Some(a), Some(b)) => Some((a, b)),
                    _ => record.point(10).zip(record.point(11)),
                };
                match points {
                    Some((a, b)) => ctx.add_dimension(self.scaled(a), self.scaled(b)),
                    None => ctx.skip("DIMENSION", DIMENSION_POINTS),
                }
            }
            "POINT" => ctx.skip("POINT", POINT_MARKER),
            "INSERT" => ctx.skip("INSERT", BLOCK_INSERT),
            "SOLID" | "3DFACE" | "3DSOLID" | "BODY" | "REGION" | "MESH" | "SURFACE" => {
                ctx.skip(record.name.clone(), SOLID)
            }
            "HATCH" => ctx.skip("HATCH", HATCH),
            "SPLINE" | "ELLIPSE" => ctx.skip(record.name.clone(), CURVE),
            "LEADER" | "MLEADER" | "MULTILEADER" | "TOLERANCE" => {
                ctx.skip(record.name.clone(), LEADER)
            }
            "IMAGE" | "WIPEOUT" | "OLE2FRAME" | "UNDERLAY" => ctx.skip(record.name.clone(), EMBEDDED),
            other => ctx.skip(other.to_string(), UNSUPPORTED),
        }
    }

    fn convert_text(&self, ctx: &mut ImportContext<'_>, record: &EntityRecord) {
        let raw = if record.name == "MTEXT" {
            // long MTEXT values arrive as 3-chunks followed by the final 1
            let mut s: String = record
                .pairs
                .iter()
                .filter(|p| p.code == 3)
                .map(DxfCodePair::as_str)
                .collect();
            s.push_str(record.text(1).unwrap_or_default());
            clean_mtext(&s)
        } else {
            clean_special_codes(record.text(1).unwrap_or_default())
        };
        let text = raw.trim();
        let Some(position) = record.point(10).or_else(|| record.point(11)) else {
            ctx.skip(record.name.clone(), MALFORMED);
            return;
        };
        if text.is_empty() {
            ctx.skip(format!("empty {}", record.name), EMPTY_TEXT);
            return;
        }

        let font_size = match record.double(40) {
            Some(h) if h > 0.0 => h * self.scale * ctx.config.text_height_factor,
            _ => ctx.config.default_font_size,
        };
        let rotation = match record.double(50) {
            Some(deg) => deg,
            // MTEXT may give its direction as an x-axis vector instead
            None => match record.point(11) {
                Some(dir) if record.name == "MTEXT" => dir.y.atan2(dir.x).to_degrees(),
                _ => 0.0,
            },
        };
        ctx.add_label(self.scaled(position), text, font_size, rotation);
    }
}

fn truncated(section: &str) -> PlanError {
    PlanError::Parse(format!("unexpected end of file inside the {} section", section))
}

/// `%%d`, `%%p`, `%%c` symbols and `%%u`/`%%o` toggles of single-line text
fn clean_special_codes(text: &str) -> String {
    if !text.contains("%%") {
        return text.to_string();
    }
    text.replace("%%d", "\u{00B0}")
        .replace("%%D", "\u{00B0}")
        .replace("%%p", "\u{00B1}")
        .replace("%%P", "\u{00B1}")
        .replace("%%c", "\u{2300}")
        .replace("%%C", "\u{2300}")
        .replace("%%u", "")
        .replace("%%U", "")
        .replace("%%o", "")
        .replace("%%O", "")
        .replace("%%%", "%")
}

/// Strip MTEXT inline formatting, keeping the visible characters
fn clean_mtext(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' | '}' => {}
            '\\' => match chars.next() {
                Some('P') | Some('X') => out.push('\n'),
                Some('~') => out.push(' '),
                Some(escaped @ ('\\' | '{' | '}')) => out.push(escaped),
                // codes with an argument run to the next ';'
                Some('A' | 'C' | 'c' | 'F' | 'f' | 'H' | 'h' | 'Q' | 'q' | 'T' | 't' | 'W' | 'w' | 'p') => {
                    for arg in chars.by_ref() {
                        if arg == ';' {
                            break;
                        }
                    }
                }
                Some('S') => {
                    // stacked fraction "num^den;" or "num/den;" or "num#den;"
                    for arg in chars.by_ref() {
                        match arg {
                            ';' => break,
                            '^' | '#' => out.push('/'),
                            other => out.push(other),
                        }
                    }
                }
                Some('L' | 'l' | 'O' | 'o' | 'K' | 'k' | 'N') => {}
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            },
            other => out.push(other),
        }
    }
    clean_special_codes(&out)
}
