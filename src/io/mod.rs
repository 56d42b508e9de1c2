//! Import converters and export generators
//!
//! Every importer has the same contract: raw content in, an [`ImportResult`]
//! out, never an error for malformed content. Every exporter implements
//! [`PlanExporter`] and writes a complete payload or fails only on sink I/O.

pub mod dxf;
pub mod gltf;
pub mod ifc;
pub mod obj;
pub mod sketch;
pub mod svg;
pub mod xml;

mod context;
mod mesh;
mod options;
mod solid;

pub use dxf::{import_dxf, DxfExporter, DxfReader};
pub use gltf::{import_gltf, GltfExporter};
pub use ifc::{import_ifc, IfcExporter};
pub use obj::{import_obj, ObjExporter};
pub use options::{ExportOptions, ImportConfiguration, INCHES_PER_METRE};
pub use sketch::{import_sketch, SketchExporter};
pub use svg::{import_svg, SvgExporter};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use tracing::info;

use crate::detect::{detect_format, FileFormat};
use crate::error::{PlanError, Result};
use crate::model::FloorPlanData;
use crate::report::CompatibilityReport;

/// A converted plan and the record of what the conversion lost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    pub plan: FloorPlanData,
    pub report: CompatibilityReport,
}

/// Detect the format of `content` and run the matching importer
///
/// Fails with [`PlanError::UnsupportedFormat`] when the detector reports the
/// content as not importable; malformed content of a known format still
/// yields a result with report items.
pub fn import(
    content: &[u8],
    file_name: &str,
    config: &ImportConfiguration,
) -> Result<ImportResult> {
    let detection = detect_format(content, Some(file_name));
    if !detection.can_import {
        return Err(PlanError::UnsupportedFormat(format!(
            "{} ({} content cannot be imported)",
            file_name, detection.format
        )));
    }
    let result = match detection.format {
        FileFormat::Dxf => import_dxf(content, file_name, config),
        FileFormat::Svg => import_svg(content, file_name, config),
        FileFormat::Obj => import_obj(content, file_name, config),
        FileFormat::Gltf | FileFormat::Glb => import_gltf(content, file_name, config),
        FileFormat::Ifc => import_ifc(content, file_name, config),
        FileFormat::SketchPlan => import_sketch(content, file_name, config),
        FileFormat::Unknown => {
            return Err(PlanError::UnsupportedFormat(file_name.to_string()));
        }
    };
    Ok(result)
}

/// Writes a plan in one target format
pub trait PlanExporter {
    /// Write the complete payload to `writer`
    fn write_to_writer<W: Write>(&self, writer: W) -> Result<()>;

    /// Write to a byte vector
    fn write_to_vec(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_to_writer(&mut buffer)?;
        Ok(buffer)
    }
}

/// Export targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetFormat {
    Dxf,
    Svg,
    Obj,
    Gltf,
    Ifc,
    SketchPlan,
}

impl TargetFormat {
    pub const ALL: [TargetFormat; 6] = [
        TargetFormat::Dxf,
        TargetFormat::Svg,
        TargetFormat::Obj,
        TargetFormat::Gltf,
        TargetFormat::Ifc,
        TargetFormat::SketchPlan,
    ];

    /// File extension of the main payload
    pub fn extension(&self) -> &'static str {
        self.file_format().extension()
    }

    pub fn file_format(&self) -> FileFormat {
        match self {
            Self::Dxf => FileFormat::Dxf,
            Self::Svg => FileFormat::Svg,
            Self::Obj => FileFormat::Obj,
            Self::Gltf => FileFormat::Gltf,
            Self::Ifc => FileFormat::Ifc,
            Self::SketchPlan => FileFormat::SketchPlan,
        }
    }

    /// Target for an output file name
    pub fn from_file_name(name: &str) -> Option<Self> {
        match FileFormat::from_file_name(name) {
            FileFormat::Dxf => Some(Self::Dxf),
            FileFormat::Svg => Some(Self::Svg),
            FileFormat::Obj => Some(Self::Obj),
            FileFormat::Gltf => Some(Self::Gltf),
            FileFormat::Ifc => Some(Self::Ifc),
            FileFormat::SketchPlan => Some(Self::SketchPlan),
            FileFormat::Glb | FileFormat::Unknown => None,
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.file_format().fmt(f)
    }
}

/// Output of [`export`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub format: TargetFormat,
    pub data: Vec<u8>,
    /// Companion file, e.g. the mesh material library
    pub companion: Option<Vec<u8>>,
}

/// Serialize `plan` into `target`
pub fn export(
    plan: &FloorPlanData,
    target: TargetFormat,
    options: &ExportOptions,
) -> Result<ExportPayload> {
    let (data, companion) = match target {
        TargetFormat::Dxf => (DxfExporter::new(plan, options).write_to_vec()?, None),
        TargetFormat::Svg => (SvgExporter::new(plan, options).write_to_vec()?, None),
        TargetFormat::Obj => {
            let exporter = ObjExporter::new(plan, options);
            (exporter.write_to_vec()?, Some(exporter.material_library_to_vec()?))
        }
        TargetFormat::Gltf => (GltfExporter::new(plan, options).write_to_vec()?, None),
        TargetFormat::Ifc => (IfcExporter::new(plan, options).write_to_vec()?, None),
        TargetFormat::SketchPlan => (SketchExporter::new(plan).write_to_vec()?, None),
    };
    info!(format = %target, bytes = data.len(), "export finished");
    Ok(ExportPayload {
        format: target,
        data,
        companion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_rejects_unknown() {
        let err = import(b"\x00\x01\x02", "notes.bin", &ImportConfiguration::default());
        assert!(matches!(err, Err(PlanError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_target_from_file_name() {
        assert_eq!(TargetFormat::from_file_name("a.DXF"), Some(TargetFormat::Dxf));
        assert_eq!(TargetFormat::from_file_name("a.splan"), Some(TargetFormat::SketchPlan));
        assert_eq!(TargetFormat::from_file_name("a.glb"), None);
    }

    #[test]
    fn test_export_empty_plan_everywhere() {
        let plan = FloorPlanData::new();
        let opts = ExportOptions::default();
        for target in TargetFormat::ALL {
            let payload = export(&plan, target, &opts).unwrap();
            assert!(!payload.data.is_empty(), "{} payload empty", target);
            assert_eq!(payload.companion.is_some(), target == TargetFormat::Obj);
        }
    }
}
