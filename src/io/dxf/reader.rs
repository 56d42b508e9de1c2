//! DXF import

mod section_reader;
mod stream_reader;
mod text_reader;

pub use section_reader::PolylineFlags;
pub use stream_reader::{DxfCodePair, DxfStreamReader, GroupValueKind};
pub use text_reader::DxfTextReader;

use section_reader::SectionReader;
use tracing::debug;

use super::code_page::encoding_from_code_page;
use crate::detect::{FileFormat, BINARY_DXF_SENTINEL};
use crate::error::Result;
use crate::io::context::ImportContext;
use crate::io::{ImportConfiguration, ImportResult, INCHES_PER_METRE};
use crate::report::ReportCategory;

/// First version whose text is always UTF-8 (AutoCAD 2007)
const UTF8_VERSION: &str = "AC1021";

/// Header variables that affect how the rest of the file is read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DxfHeader {
    /// `$ACADVER`, e.g. `AC1015`
    pub version: Option<String>,
    /// `$DWGCODEPAGE`, e.g. `ANSI_1252`
    pub code_page: Option<String>,
    /// `$INSUNITS`
    pub insunits: Option<i16>,
}

impl DxfHeader {
    /// Inches per drawing unit and the unit name, for units with a fixed size
    pub fn unit_scale(&self) -> Option<(f64, &'static str)> {
        match self.insunits? {
            1 => Some((1.0, "inches")),
            2 => Some((12.0, "feet")),
            3 => Some((63_360.0, "miles")),
            4 => Some((1.0 / 25.4, "millimeters")),
            5 => Some((1.0 / 2.54, "centimeters")),
            6 => Some((INCHES_PER_METRE, "meters")),
            8 => Some((1e-6, "microinches")),
            9 => Some((0.001, "mils")),
            10 => Some((36.0, "yards")),
            14 => Some((INCHES_PER_METRE / 10.0, "decimeters")),
            _ => None,
        }
    }

    /// Pre-2007 drawings store text in the header code page
    fn legacy_encoding(&self) -> Option<&'static encoding_rs::Encoding> {
        let legacy = match &self.version {
            Some(v) => v.as_str() < UTF8_VERSION,
            None => true,
        };
        if !legacy {
            return None;
        }
        self.code_page.as_deref().and_then(encoding_from_code_page)
    }
}

/// ASCII DXF reader feeding an import
pub struct DxfReader<'a> {
    reader: DxfTextReader<'a>,
    header: DxfHeader,
}

impl<'a> DxfReader<'a> {
    pub fn new(content: &'a [u8]) -> Self {
        Self {
            reader: DxfTextReader::new(content),
            header: DxfHeader::default(),
        }
    }

    pub fn header(&self) -> &DxfHeader {
        &self.header
    }

    /// Pre-scan the HEADER section and rewind
    ///
    /// Sets the fallback text encoding for pre-2007 drawings.
    pub fn read_header(&mut self) -> Result<&DxfHeader> {
        let mut header = DxfHeader::default();
        'sections: while let Some(pair) = self.reader.read_pair()? {
            if !pair.is_marker("SECTION") {
                continue;
            }
            match self.reader.read_pair()? {
                Some(name) if name.code == 2 && name.value == "HEADER" => {}
                // the header always comes first when present
                _ => break,
            }
            let mut variable = String::new();
            while let Some(pair) = self.reader.read_pair()? {
                match pair.code {
                    0 if pair.value == "ENDSEC" => break 'sections,
                    9 => variable = pair.value,
                    1 if variable == "$ACADVER" => header.version = Some(pair.value),
                    3 if variable == "$DWGCODEPAGE" => header.code_page = Some(pair.value),
                    70 if variable == "$INSUNITS" => header.insunits = pair.as_i16(),
                    _ => {}
                }
            }
            break;
        }

        if let Some(encoding) = header.legacy_encoding() {
            self.reader.set_encoding(encoding);
        }
        self.reader.reset();
        self.header = header;
        Ok(&self.header)
    }

    /// Convert every section into `ctx`; returns the number of sections seen
    pub(crate) fn read_into(&mut self, ctx: &mut ImportContext<'_>) -> Result<usize> {
        self.read_header()?;
        self.report_header(ctx);
        let scale = match self.header.unit_scale() {
            Some((scale, _)) if ctx.config.apply_source_units => scale,
            _ => 1.0,
        };

        let mut sections = 0;
        while let Some(pair) = self.reader.read_pair()? {
            if pair.is_marker("EOF") {
                break;
            }
            if !pair.is_marker("SECTION") {
                continue;
            }
            let name = match self.reader.read_pair()? {
                Some(p) if p.code == 2 => p.value,
                Some(p) => {
                    self.reader.push_back(p);
                    continue;
                }
                None => break,
            };
            sections += 1;
            debug!(section = %name, line = self.reader.line_number(), "reading DXF section");
            let mut section = SectionReader::new(&mut self.reader, scale);
            match name.as_str() {
                "TABLES" => section.read_tables(ctx)?,
                "BLOCKS" => section.read_blocks(ctx)?,
                "ENTITIES" => section.read_entities(ctx)?,
                _ => section.skip_section()?,
            }
        }
        Ok(sections)
    }

    fn report_header(&self, ctx: &mut ImportContext<'_>) {
        let header = &self.header;
        if let Some(version) = &header.version {
            ctx.report.source_version = Some(version.clone());
            ctx.report
                .info(ReportCategory::Metadata, format!("DXF version {}", version));
        }
        if let (Some(_), Some(page)) = (header.legacy_encoding(), &header.code_page) {
            ctx.report.info(
                ReportCategory::Metadata,
                format!("Non-UTF-8 text decoded with code page {}", page),
            );
        }
        match (header.insunits, header.unit_scale()) {
            (Some(_), Some((_, unit))) if unit == "inches" => {}
            (Some(_), Some((_, unit))) if ctx.config.apply_source_units => ctx.report.info(
                ReportCategory::Metadata,
                format!("Drawing units are {}; coordinates scaled to inches", unit),
            ),
            (Some(_), Some((_, unit))) => ctx.report.info(
                ReportCategory::Metadata,
                format!("Drawing units are {}; coordinates kept unscaled", unit),
            ),
            (Some(code), None) if code != 0 => ctx.report.warning(
                ReportCategory::Metadata,
                format!("Unsupported drawing unit code {}; coordinates kept unscaled", code),
            ),
            _ => {}
        }
    }
}

/// Import ASCII DXF content
pub fn import_dxf(content: &[u8], file_name: &str, config: &ImportConfiguration) -> ImportResult {
    let mut ctx = ImportContext::new(FileFormat::Dxf, "dxf", file_name, config);
    if content.starts_with(BINARY_DXF_SENTINEL) {
        return ctx.fail("Binary DXF is not supported; save the drawing as ASCII DXF");
    }

    let mut reader = DxfReader::new(content);
    match reader.read_into(&mut ctx) {
        Ok(0) => ctx.fail("No DXF sections found"),
        Ok(_) => ctx.finish(true),
        Err(err) if ctx.report.converted.total() == 0 => {
            ctx.fail(format!("DXF could not be parsed: {}", err))
        }
        Err(err) => {
            ctx.report.error(
                ReportCategory::Geometry,
                format!("DXF parsing stopped early, entities read so far were kept: {}", err),
            );
            ctx.finish(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Severity;

    fn header_bytes(vars: &str) -> Vec<u8> {
        format!("0\nSECTION\n2\nHEADER\n{}0\nENDSEC\n0\nEOF\n", vars).into_bytes()
    }

    #[test]
    fn test_header_prescan() {
        let bytes = header_bytes("9\n$ACADVER\n1\nAC1015\n9\n$DWGCODEPAGE\n3\nANSI_1251\n9\n$INSUNITS\n70\n4\n");
        let mut reader = DxfReader::new(&bytes);
        let header = reader.read_header().unwrap();
        assert_eq!(header.version.as_deref(), Some("AC1015"));
        assert_eq!(header.code_page.as_deref(), Some("ANSI_1251"));
        assert_eq!(header.unit_scale().map(|(_, u)| u), Some("millimeters"));
        assert_eq!(header.legacy_encoding(), Some(encoding_rs::WINDOWS_1251));
    }

    #[test]
    fn test_modern_versions_ignore_code_page() {
        let bytes = header_bytes("9\n$ACADVER\n1\nAC1032\n9\n$DWGCODEPAGE\n3\nANSI_1251\n");
        let mut reader = DxfReader::new(&bytes);
        reader.read_header().unwrap();
        assert_eq!(reader.header().legacy_encoding(), None);
    }

    #[test]
    fn test_units_scale_coordinates() {
        let bytes = b"0\nSECTION\n2\nHEADER\n9\n$INSUNITS\n70\n2\n0\nENDSEC\n\
0\nSECTION\n2\nENTITIES\n0\nLINE\n8\n0\n10\n0\n20\n0\n11\n10\n21\n0\n0\nENDSEC\n0\nEOF\n";
        let result = import_dxf(bytes, "feet.dxf", &ImportConfiguration::default());
        assert_eq!(result.plan.walls.len(), 1);
        assert!((result.plan.walls[0].end.x - 120.0).abs() < 1e-9);

        let mut raw = ImportConfiguration::default();
        raw.apply_source_units = false;
        let result = import_dxf(bytes, "feet.dxf", &raw);
        assert!((result.plan.walls[0].end.x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_binary_is_reported() {
        let result = import_dxf(b"AutoCAD Binary DXF\r\n\x1a\x00", "b.dxf", &ImportConfiguration::default());
        assert!(result.plan.is_empty());
        assert!(result.report.has_severity(Severity::Error));
    }

    #[test]
    fn test_corrupt_entity_is_dropped_and_reading_resumes() {
        let line = |x: f64| format!("0\nLINE\n8\n0\n10\n{x}\n20\n0\n11\n{x}\n21\n96\n");
        let content = format!(
            "0\nSECTION\n2\nENTITIES\n{}0\nLINE\n8\n0\nxx\nbogus\n10\n5\n{}{}0\nENDSEC\n0\nEOF\n",
            line(0.0),
            line(120.0),
            line(240.0)
        );
        let result = import_dxf(content.as_bytes(), "corrupt.dxf", &ImportConfiguration::default());
        assert_eq!(result.plan.walls.len(), 3);
        assert_eq!(result.plan.walls[2].start.x, 240.0);
        assert_eq!(result.report.skipped.other, 1);
        assert!(!result.report.has_severity(Severity::Error));
        assert!(result
            .report
            .of_severity(Severity::Warning)
            .iter()
            .any(|item| item.message.starts_with("1 unreadable entity skipped")));
    }

    #[test]
    fn test_corruption_at_end_of_file_keeps_earlier_entities() {
        let content = b"0\nSECTION\n2\nENTITIES\n0\nLINE\n8\n0\n10\n0\n20\n0\n11\n96\n21\n0\n0\nLINE\nxx\n";
        let result = import_dxf(content, "cut.dxf", &ImportConfiguration::default());
        assert_eq!(result.plan.walls.len(), 1);
        assert!(result.report.has_severity(Severity::Error));
    }

    #[test]
    fn test_no_sections_fails() {
        let result = import_dxf(b"999\ncomment only\n", "c.dxf", &ImportConfiguration::default());
        assert!(result.plan.is_empty());
        assert_eq!(result.report.items.len(), 1);
    }
}
