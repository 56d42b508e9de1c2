//! Import dispatch, per-format conversion and compatibility reports

mod common;

use common::assert_report_consistent;
use sketchport::{
    detect_format, import, Confidence, FileFormat, ImportConfiguration, PlanError, ReportCategory,
    Severity,
};

fn config() -> ImportConfiguration {
    ImportConfiguration::default()
}

// ===========================================================================
// Fixtures
// ===========================================================================

const DXF_ROOM: &str = "  0
SECTION
  2
HEADER
  9
$ACADVER
  1
AC1015
  9
$INSUNITS
 70
1
  0
ENDSEC
  0
SECTION
  2
ENTITIES
  0
LINE
  8
WALLS
 10
0.0
 20
0.0
 11
144.0
 21
0.0
  0
LINE
  8
WALLS
 10
144.0
 20
0.0
 11
144.0
 21
120.0
  0
LINE
  8
WALLS
 10
144.0
 20
120.0
 11
0.0
 21
120.0
  0
LINE
  8
WALLS
 10
0.0
 20
120.0
 11
0.0
 21
0.0
  0
TEXT
  8
LABELS
 10
72.0
 20
60.0
 40
3.0
  1
Kitchen
  0
INSERT
  8
FURNITURE
  2
SOFA
 10
10.0
 20
10.0
  0
HATCH
  8
FLOOR
  0
ENDSEC
  0
EOF
";

const SVG_ROOM: &str = r#"<?xml version="1.0"?>
<svg xmlns="http://www.w3.org/2000/svg" version="1.1" viewBox="0 0 300 300">
  <rect x="10" y="10" width="144" height="120"/>
  <text x="80" y="70" font-size="4">Den</text>
  <image href="logo.png"/>
</svg>"#;

const OBJ_BOX_TOP: &str = "# top face of a box
v 0 0 0
v 144 0 0
v 144 0 120
v 0 0 120
vt 0 0
f 1 2 3 4
";

const IFC_WALL: &str = "ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('wall.ifc','2024-03-01T12:00:00',(''),(''),'','','');
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCCARTESIANPOINT((0.,0.,0.));
#2=IFCDIRECTION((0.,0.,1.));
#3=IFCDIRECTION((1.,0.,0.));
#4=IFCAXIS2PLACEMENT3D(#1,#2,#3);
#5=IFCLOCALPLACEMENT($,#4);
#6=IFCCARTESIANPOINT((60.,0.));
#7=IFCAXIS2PLACEMENT2D(#6,$);
#8=IFCRECTANGLEPROFILEDEF(.AREA.,$,#7,120.,6.);
#9=IFCEXTRUDEDAREASOLID(#8,#4,#2,96.);
#10=IFCSHAPEREPRESENTATION($,'Body','SweptSolid',(#9));
#11=IFCPRODUCTDEFINITIONSHAPE($,$,(#10));
#12=IFCWALLSTANDARDCASE('0abcdefghijklmnopqrstu',$,'Wall',$,$,#5,#11,$);
#13=IFCSLAB('1abcdefghijklmnopqrstu',$,'Floor',$,$,#5,$,$,.FLOOR.);
#14=IFCMATERIAL('Concrete');
ENDSEC;
END-ISO-10303-21;
";

// ===========================================================================
// Per-format imports
// ===========================================================================

#[test]
fn test_dxf_import() {
    let result = import(DXF_ROOM.as_bytes(), "room.dxf", &config()).unwrap();
    let report = &result.report;

    assert_eq!(result.plan.walls.len(), 4);
    assert_eq!(result.plan.labels.len(), 1);
    assert_eq!(result.plan.labels[0].text, "Kitchen");
    assert_eq!(result.plan.rooms.len(), 1);

    assert_eq!(report.source_format, FileFormat::Dxf);
    assert_eq!(report.source_version.as_deref(), Some("AC1015"));
    assert_eq!(report.skipped.blocks, 1);
    assert_eq!(report.skipped.hatches, 1);
    // 4 walls + 1 label of 7 entities
    assert_eq!(report.total_entities_in_source, 7);
    assert_eq!(report.conversion_rate, 71);
    assert_report_consistent(report);
}

#[test]
fn test_svg_import() {
    let result = import(SVG_ROOM.as_bytes(), "room.svg", &config()).unwrap();
    assert_eq!(result.plan.walls.len(), 4);
    assert_eq!(result.plan.rooms.len(), 1);
    assert_eq!(result.plan.labels[0].text, "Den");
    assert_eq!(result.report.skipped.other, 1);
    assert!(result.report.has_severity(Severity::Warning));
    assert_report_consistent(&result.report);
}

#[test]
fn test_obj_import() {
    let result = import(OBJ_BOX_TOP.as_bytes(), "box.obj", &config()).unwrap();
    assert_eq!(result.plan.walls.len(), 4);
    assert_eq!(result.plan.rooms.len(), 1);
    assert_eq!(result.report.skipped.other, 1);
    assert_report_consistent(&result.report);
}

#[test]
fn test_ifc_import() {
    let result = import(IFC_WALL.as_bytes(), "wall.ifc", &config()).unwrap();
    let report = &result.report;

    assert_eq!(result.plan.walls.len(), 1);
    let wall = &result.plan.walls[0];
    assert!((wall.length() - 120.0).abs() < 1e-6);
    assert_eq!(wall.thickness, 6.0);
    assert_eq!(wall.height, 96.0);

    assert_eq!(report.source_version.as_deref(), Some("IFC2X3"));
    assert_eq!(report.skipped.three_d_solids, 1);
    assert_eq!(report.skipped.materials, 1);
    assert_report_consistent(report);
}

#[test]
fn test_report_serializes_camel_case() {
    let result = import(DXF_ROOM.as_bytes(), "room.dxf", &config()).unwrap();
    let json = serde_json::to_value(&result.report).unwrap();
    assert_eq!(json["sourceFormat"], "dxf");
    assert_eq!(json["conversionRate"], 71);
    assert_eq!(json["skipped"]["blocks"], 1);
    assert!(json["items"].as_array().unwrap().len() >= 2);
}

// ===========================================================================
// Failures and edge cases
// ===========================================================================

#[test]
fn test_malformed_content_yields_a_single_error() {
    let cases: [(&[u8], &str); 5] = [
        (b"  0\nSECTION\n  2\nENTITIES\n 10\n", "broken.dxf"),
        (b"<svg xmlns=\"http://www.w3.org/2000/svg\"><g></svg>", "broken.svg"),
        (b"{\"asset\": {\"version\": \"2.0\"}, \"meshes\": [", "broken.gltf"),
        (b"ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\nENDSEC;\n", "empty.ifc"),
        (b"<SketchPlan version=\"1\"><Walls></SketchPlan>", "broken.splan"),
    ];
    for (content, name) in cases {
        let result = import(content, name, &config()).unwrap();
        assert!(result.plan.is_empty(), "{}", name);
        assert_eq!(result.report.items.len(), 1, "{}", name);
        assert_eq!(result.report.items[0].severity, Severity::Error, "{}", name);
        assert_eq!(result.report.conversion_rate, 100, "{}", name);
    }
}

#[test]
fn test_unknown_content_is_rejected() {
    let err = import(b"\x89PNG\r\n\x1a\n\x00\x00", "photo.png", &config()).unwrap_err();
    assert!(matches!(err, PlanError::UnsupportedFormat(_)));
}

#[test]
fn test_binary_dxf_is_not_importable() {
    let err = import(b"AutoCAD Binary DXF\r\n\x1a\x00", "plan.dxf", &config()).unwrap_err();
    assert!(matches!(err, PlanError::UnsupportedFormat(_)));
}

#[test]
fn test_room_detection_can_be_disabled() {
    let result = import(
        DXF_ROOM.as_bytes(),
        "room.dxf",
        &config().with_room_detection(false),
    )
    .unwrap();
    assert_eq!(result.plan.walls.len(), 4);
    assert!(result.plan.rooms.is_empty());
    assert!(result.report.in_category(ReportCategory::Rooms).is_empty());
}

#[test]
fn test_skips_are_aggregated_per_kind() {
    let mut dxf = DXF_ROOM.replace("  0\nENDSEC\n  0\nEOF\n", "");
    for _ in 0..3 {
        dxf.push_str("  0\nINSERT\n  8\n0\n  2\nCHAIR\n 10\n0.0\n 20\n0.0\n");
    }
    dxf.push_str("  0\nENDSEC\n  0\nEOF\n");

    let result = import(dxf.as_bytes(), "chairs.dxf", &config()).unwrap();
    assert_eq!(result.report.skipped.blocks, 4);
    let blocks = result.report.in_category(ReportCategory::Blocks);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].entity_count, Some(4));
    assert!(blocks[0].message.starts_with("4 INSERT skipped"));
}

#[test]
fn test_corrupt_dxf_entity_does_not_end_the_section() {
    let corrupt = "  0\nLINE\n  8\nWALLS\nxx\nbogus\n 10\n7.0\n";
    let dxf = DXF_ROOM.replacen("  0\nTEXT\n", &format!("{}  0\nTEXT\n", corrupt), 1);

    let result = import(dxf.as_bytes(), "corrupt.dxf", &config()).unwrap();
    assert_eq!(result.plan.walls.len(), 4);
    assert_eq!(result.plan.labels.len(), 1);
    assert_eq!(result.plan.rooms.len(), 1);
    assert_eq!(result.report.skipped.other, 1);
    assert_eq!(result.report.skipped.blocks, 1);
    assert!(!result.report.has_severity(Severity::Error));
    assert_report_consistent(&result.report);
}

// ===========================================================================
// Detection
// ===========================================================================

#[test]
fn test_detect_by_content() {
    let dxf = detect_format(DXF_ROOM.as_bytes(), None);
    assert_eq!(dxf.format, FileFormat::Dxf);
    assert_eq!(dxf.confidence, Confidence::High);
    assert_eq!(dxf.version.as_deref(), Some("AC1015"));

    let svg = detect_format(SVG_ROOM.as_bytes(), None);
    assert_eq!(svg.format, FileFormat::Svg);
    assert_eq!(svg.version.as_deref(), Some("1.1"));

    let ifc = detect_format(IFC_WALL.as_bytes(), None);
    assert_eq!(ifc.format, FileFormat::Ifc);
    assert_eq!(ifc.version.as_deref(), Some("IFC2X3"));

    let obj = detect_format(OBJ_BOX_TOP.as_bytes(), None);
    assert_eq!(obj.format, FileFormat::Obj);
    assert_eq!(obj.confidence, Confidence::High);

    let sketch = detect_format(br#"<SketchPlan version="1" scale="4"/>"#, None);
    assert_eq!(sketch.format, FileFormat::SketchPlan);
    assert_eq!(sketch.version.as_deref(), Some("1"));
}

#[test]
fn test_detect_falls_back_to_extension() {
    let by_name = detect_format(b"", Some("floor.IFC"));
    assert_eq!(by_name.format, FileFormat::Ifc);
    assert_eq!(by_name.confidence, Confidence::Low);

    let unknown = detect_format(b"plain words", Some("notes.txt"));
    assert_eq!(unknown.format, FileFormat::Unknown);
    assert!(!unknown.can_import);
}

#[test]
fn test_detection_serializes() {
    let detection = detect_format(IFC_WALL.as_bytes(), Some("wall.ifc"));
    let json = serde_json::to_value(&detection).unwrap();
    assert_eq!(json["format"], "ifc");
    assert_eq!(json["canImport"], true);
}
