//! Format detection
//!
//! Sniffs raw content (and optionally the file name) to decide which importer
//! applies. Detection never fails: content nobody recognizes comes back as
//! [`FileFormat::Unknown`] with `can_import == false`.

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use std::fmt;

/// `glTF` read as a little-endian u32
pub const GLB_MAGIC: u32 = 0x4654_6C67;

/// Sentinel at the start of binary DXF files
pub const BINARY_DXF_SENTINEL: &[u8] = b"AutoCAD Binary DXF";

/// Root element of the round-trip format
pub const SKETCH_ROOT_TAG: &str = "SketchPlan";

/// How much of a text file is inspected
const SNIFF_LIMIT: usize = 64 * 1024;

/// File formats the engine knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FileFormat {
    /// Drafting exchange (group-code ASCII)
    Dxf,
    /// Vector markup
    Svg,
    /// Wavefront mesh
    Obj,
    /// Scene description, JSON variant
    Gltf,
    /// Scene description, binary variant
    Glb,
    /// STEP entity graph
    Ifc,
    /// Round-trip XML
    SketchPlan,
    Unknown,
}

impl FileFormat {
    /// Conventional file extension (without the dot)
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Dxf => "dxf",
            Self::Svg => "svg",
            Self::Obj => "obj",
            Self::Gltf => "gltf",
            Self::Glb => "glb",
            Self::Ifc => "ifc",
            Self::SketchPlan => "splan",
            Self::Unknown => "",
        }
    }

    /// Guess from a file name's extension
    pub fn from_file_name(name: &str) -> Self {
        let ext = match name.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return Self::Unknown,
        };
        match ext.as_str() {
            "dxf" => Self::Dxf,
            "svg" => Self::Svg,
            "obj" => Self::Obj,
            "gltf" => Self::Gltf,
            "glb" => Self::Glb,
            "ifc" => Self::Ifc,
            "splan" | "xml" => Self::SketchPlan,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Dxf => "DXF",
            Self::Svg => "SVG",
            Self::Obj => "OBJ",
            Self::Gltf => "glTF",
            Self::Glb => "GLB",
            Self::Ifc => "IFC",
            Self::SketchPlan => "SketchPlan",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// How sure the detector is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Result of [`detect_format`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatDetection {
    pub format: FileFormat,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub can_import: bool,
}

impl FormatDetection {
    fn new(format: FileFormat, confidence: Confidence, version: Option<String>) -> Self {
        Self {
            format,
            confidence,
            version,
            can_import: format != FileFormat::Unknown,
        }
    }

    fn unknown() -> Self {
        Self::new(FileFormat::Unknown, Confidence::Low, None)
    }
}

/// Identify the format of `content`
///
/// Order: binary signatures, then structural text sniffing, then the file
/// name's extension with lowered confidence.
pub fn detect_format(content: &[u8], file_name: Option<&str>) -> FormatDetection {
    if let Some(found) = detect_binary(content) {
        return found;
    }
    if let Some(found) = detect_text(content) {
        return found;
    }
    match file_name.map(FileFormat::from_file_name) {
        Some(FileFormat::Unknown) | None => FormatDetection::unknown(),
        Some(format) => FormatDetection::new(format, Confidence::Low, None),
    }
}

fn detect_binary(content: &[u8]) -> Option<FormatDetection> {
    if content.len() >= 12 && LittleEndian::read_u32(&content[0..4]) == GLB_MAGIC {
        let version = LittleEndian::read_u32(&content[4..8]);
        return Some(FormatDetection::new(
            FileFormat::Glb,
            Confidence::High,
            Some(version.to_string()),
        ));
    }
    if content.starts_with(BINARY_DXF_SENTINEL) {
        let mut found = FormatDetection::new(FileFormat::Dxf, Confidence::High, None);
        found.can_import = false;
        return Some(found);
    }
    None
}

fn detect_text(content: &[u8]) -> Option<FormatDetection> {
    let head = &content[..content.len().min(SNIFF_LIMIT)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}');
    let trimmed = text.trim_start();

    if let Some(version) = sniff_dxf(trimmed) {
        return Some(FormatDetection::new(FileFormat::Dxf, Confidence::High, version));
    }
    if trimmed.starts_with("ISO-10303-21") {
        return Some(FormatDetection::new(
            FileFormat::Ifc,
            Confidence::High,
            ifc_schema(text),
        ));
    }
    if let Some(tag) = find_tag(text, SKETCH_ROOT_TAG) {
        return Some(FormatDetection::new(
            FileFormat::SketchPlan,
            Confidence::High,
            attribute(tag, "version"),
        ));
    }
    if let Some(tag) = find_tag(text, "svg") {
        let confidence = if tag.contains("xmlns") {
            Confidence::High
        } else {
            Confidence::Medium
        };
        return Some(FormatDetection::new(
            FileFormat::Svg,
            confidence,
            attribute(tag, "version"),
        ));
    }
    if trimmed.starts_with('{') && text.contains("\"asset\"") && text.contains("\"version\"") {
        return Some(match gltf_version(content) {
            Some(v) => FormatDetection::new(FileFormat::Gltf, Confidence::High, Some(v)),
            None => FormatDetection::new(FileFormat::Gltf, Confidence::Medium, None),
        });
    }
    sniff_obj(text)
}

/// `0 / SECTION` as the first group pair, skipping `999` comments
fn sniff_dxf(text: &str) -> Option<Option<String>> {
    let mut lines = text.lines().map(str::trim);
    loop {
        let code = lines.next()?;
        let value = lines.next()?;
        match code {
            "999" => continue,
            "0" if value == "SECTION" => break,
            _ => return None,
        }
    }

    let mut lines = text.lines().map(str::trim);
    while let Some(line) = lines.next() {
        if line == "$ACADVER" {
            let _code = lines.next();
            return Some(lines.next().map(str::to_string));
        }
        if line == "ENDSEC" {
            break;
        }
    }
    Some(None)
}

fn sniff_obj(text: &str) -> Option<FormatDetection> {
    let mut vertices = false;
    let mut faces = false;
    for line in text
        .lines()
        .map(str::trim_start)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .take(2000)
    {
        if line.starts_with("v ") {
            vertices = true;
        } else if line.starts_with("f ") {
            faces = true;
        }
        if vertices && faces {
            return Some(FormatDetection::new(FileFormat::Obj, Confidence::High, None));
        }
    }
    vertices.then(|| FormatDetection::new(FileFormat::Obj, Confidence::Medium, None))
}

/// Opening tag `<name ...>` (attributes included)
fn find_tag<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<{}", name);
    let mut from = 0;
    while let Some(pos) = text[from..].find(&open) {
        let start = from + pos;
        let after = text[start + open.len()..].chars().next();
        if matches!(after, Some(c) if c.is_whitespace() || c == '>' || c == '/') {
            let end = text[start..].find('>').map_or(text.len(), |e| start + e);
            return Some(&text[start..end]);
        }
        from = start + open.len();
    }
    None
}

fn attribute(tag: &str, name: &str) -> Option<String> {
    crate::io::xml::attribute_value(tag, name)
}

fn ifc_schema(text: &str) -> Option<String> {
    let pos = text.find("FILE_SCHEMA")?;
    let rest = &text[pos..];
    let open = rest.find('\'')?;
    let close = rest[open + 1..].find('\'')?;
    Some(rest[open + 1..open + 1 + close].to_string())
}

fn gltf_version(content: &[u8]) -> Option<String> {
    let json: serde_json::Value = serde_json::from_slice(content).ok()?;
    json.get("asset")?
        .get("version")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glb_magic() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"glTF");
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&12u32.to_le_bytes());
        let d = detect_format(&bytes, None);
        assert_eq!(d.format, FileFormat::Glb);
        assert_eq!(d.confidence, Confidence::High);
        assert_eq!(d.version.as_deref(), Some("2"));
        assert!(d.can_import);
    }

    #[test]
    fn test_dxf_with_version() {
        let text = "  0\nSECTION\n  2\nHEADER\n  9\n$ACADVER\n  1\nAC1015\n  0\nENDSEC\n  0\nEOF\n";
        let d = detect_format(text.as_bytes(), None);
        assert_eq!(d.format, FileFormat::Dxf);
        assert_eq!(d.version.as_deref(), Some("AC1015"));
    }

    #[test]
    fn test_binary_dxf_not_importable() {
        let mut bytes = BINARY_DXF_SENTINEL.to_vec();
        bytes.extend_from_slice(b"\r\n\x1a\0");
        let d = detect_format(&bytes, Some("a.dxf"));
        assert_eq!(d.format, FileFormat::Dxf);
        assert!(!d.can_import);
    }

    #[test]
    fn test_svg_confidence() {
        let with_ns = r#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg" version="1.1"></svg>"#;
        let d = detect_format(with_ns.as_bytes(), None);
        assert_eq!(d.format, FileFormat::Svg);
        assert_eq!(d.confidence, Confidence::High);
        assert_eq!(d.version.as_deref(), Some("1.1"));

        let bare = "<svg width=\"10\"></svg>";
        assert_eq!(detect_format(bare.as_bytes(), None).confidence, Confidence::Medium);
    }

    #[test]
    fn test_sketch_plan() {
        let xml = r#"<?xml version="1.0"?><SketchPlan version="1" scale="4"></SketchPlan>"#;
        let d = detect_format(xml.as_bytes(), None);
        assert_eq!(d.format, FileFormat::SketchPlan);
        assert_eq!(d.version.as_deref(), Some("1"));
    }

    #[test]
    fn test_gltf_json() {
        let json = r#"{"asset":{"version":"2.0"},"scenes":[]}"#;
        let d = detect_format(json.as_bytes(), None);
        assert_eq!(d.format, FileFormat::Gltf);
        assert_eq!(d.version.as_deref(), Some("2.0"));
    }

    #[test]
    fn test_obj() {
        let obj = "# cube\nv 0 0 0\nv 1 0 0\nv 1 1 0\nf 1 2 3\n";
        let d = detect_format(obj.as_bytes(), None);
        assert_eq!(d.format, FileFormat::Obj);
        assert_eq!(d.confidence, Confidence::High);
    }

    #[test]
    fn test_ifc_schema() {
        let ifc = "ISO-10303-21;\nHEADER;\nFILE_SCHEMA(('IFC2X3'));\nENDSEC;\n";
        let d = detect_format(ifc.as_bytes(), None);
        assert_eq!(d.format, FileFormat::Ifc);
        assert_eq!(d.version.as_deref(), Some("IFC2X3"));
    }

    #[test]
    fn test_extension_fallback() {
        let d = detect_format(b"garbage", Some("plan.IFC"));
        assert_eq!(d.format, FileFormat::Ifc);
        assert_eq!(d.confidence, Confidence::Low);
    }

    #[test]
    fn test_unknown_never_fails() {
        let d = detect_format(&[0xff, 0x00, 0x13], None);
        assert_eq!(d.format, FileFormat::Unknown);
        assert!(!d.can_import);
        let d = detect_format(b"", Some("notes.txt"));
        assert!(!d.can_import);
    }
}
