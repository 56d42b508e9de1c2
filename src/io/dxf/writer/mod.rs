//! DXF export

mod section_writer;
mod stream_writer;
mod text_writer;

pub use section_writer::{
    plan_layers, DxfLayer, SectionWriter, DXF_VERSION, LAYER_DIMENSIONS, LAYER_DOORS,
    LAYER_FIXTURES, LAYER_LABELS, LAYER_ROOMS, LAYER_WALLS, LAYER_WINDOWS,
};
pub use stream_writer::{DxfStreamWriter, DxfStreamWriterExt};
pub use text_writer::{DxfTextWriter, DXF_DECIMALS};

use std::io::Write;

use tracing::info;

use crate::error::Result;
use crate::io::{ExportOptions, PlanExporter};
use crate::model::FloorPlanData;
use crate::types::HandleSeed;

/// Writes a plan as an ASCII DXF drawing
///
/// Tables and entities are written to a buffer first so the header can carry
/// the final `$HANDSEED`.
pub struct DxfExporter<'a> {
    plan: &'a FloorPlanData,
    options: &'a ExportOptions,
}

impl<'a> DxfExporter<'a> {
    pub fn new(plan: &'a FloorPlanData, options: &'a ExportOptions) -> Self {
        Self { plan, options }
    }
}

impl PlanExporter for DxfExporter<'_> {
    fn write_to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut handles = HandleSeed::default();
        let layers = plan_layers(self.plan);

        let mut body = DxfTextWriter::new(Vec::new());
        {
            let mut sections = SectionWriter::new(&mut body, &mut handles);
            sections.write_tables(&layers)?;
            sections.write_entities(self.plan)?;
        }
        let body = body.into_inner();

        let mut out = DxfTextWriter::new(writer);
        {
            let mut seed = handles.clone();
            let mut header = SectionWriter::new(&mut out, &mut seed);
            header.write_header(section_writer::drawing_extents(self.plan), handles.peek())?;
        }
        let mut writer = out.into_inner();
        writer.write_all(&body)?;

        let mut out = DxfTextWriter::new(writer);
        out.write_eof()?;
        out.flush()?;

        info!(
            title = %self.options.project_title,
            layers = layers.len(),
            handles = handles.peek().value() - HandleSeed::default().peek().value(),
            "DXF export written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Door, Wall};
    use crate::types::Point;

    #[test]
    fn test_empty_plan_is_a_complete_drawing() {
        let plan = FloorPlanData::new();
        let opts = ExportOptions::default();
        let text = String::from_utf8(DxfExporter::new(&plan, &opts).write_to_vec().unwrap()).unwrap();
        assert!(text.starts_with("  0\nSECTION\n  2\nHEADER\n"));
        assert!(text.contains("$ACADVER\n  1\nAC1015\n"));
        assert!(text.ends_with("  0\nEOF\n"));
    }

    #[test]
    fn test_handseed_follows_last_handle() {
        let mut plan = FloorPlanData::new();
        plan.walls.push(Wall::new("w1", Point::ZERO, Point::new(120.0, 0.0)));
        let opts = ExportOptions::default();
        let text = String::from_utf8(DxfExporter::new(&plan, &opts).write_to_vec().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        let seed_at = lines.iter().position(|l| *l == "$HANDSEED").unwrap();
        let seed = u64::from_str_radix(lines[seed_at + 2], 16).unwrap();

        let mut handles = Vec::new();
        for pair in lines.chunks(2).skip_while(|p| p[1] != "TABLES") {
            if pair[0].trim() == "5" {
                handles.push(u64::from_str_radix(pair[1], 16).unwrap());
            }
        }
        let max = *handles.iter().max().unwrap();
        assert_eq!(seed, max + 1);
        let mut sorted = handles.clone();
        sorted.dedup();
        assert_eq!(sorted.len(), handles.len());
    }

    #[test]
    fn test_dangling_door_is_omitted() {
        let mut plan = FloorPlanData::new();
        plan.walls.push(Wall::new("w1", Point::ZERO, Point::new(120.0, 0.0)));
        plan.doors.push(Door::new("d1", "missing", 0.5, 32.0));
        let opts = ExportOptions::default();
        let text = String::from_utf8(DxfExporter::new(&plan, &opts).write_to_vec().unwrap()).unwrap();
        assert!(!text.contains("\n  8\nDOORS\n"));
    }

    #[test]
    fn test_door_swing_entities() {
        let mut plan = FloorPlanData::new();
        plan.walls.push(Wall::new("w1", Point::ZERO, Point::new(120.0, 0.0)));
        plan.doors.push(Door::new("d1", "w1", 0.5, 32.0));
        let opts = ExportOptions::default();
        let text = String::from_utf8(DxfExporter::new(&plan, &opts).write_to_vec().unwrap()).unwrap();
        assert!(text.contains("  0\nARC\n"));
        assert_eq!(text.matches("\n  8\nDOORS\n").count(), 2);
    }
}
