//! OBJ import

use tracing::debug;

use crate::detect::FileFormat;
use crate::io::context::{ImportContext, SkipRule};
use crate::io::mesh::EdgeCollector;
use crate::io::{ImportConfiguration, ImportResult};
use crate::report::{ReportCategory, Severity, Skipped};
use crate::types::Point;

const TEXTURE_COORDINATE: SkipRule = SkipRule::new(
    Skipped::Other,
    Severity::Info,
    ReportCategory::Geometry,
    "texture coordinates have no plan equivalent",
);

const VERTEX_NORMAL: SkipRule = SkipRule::new(
    Skipped::Other,
    Severity::Info,
    ReportCategory::Geometry,
    "vertex normals have no plan equivalent",
);

const MATERIAL_DIRECTIVE: SkipRule = SkipRule::new(
    Skipped::Materials,
    Severity::Info,
    ReportCategory::Materials,
    "materials are not applied to plan geometry",
);

const BAD_ELEMENT: SkipRule = SkipRule::new(
    Skipped::Other,
    Severity::Warning,
    ReportCategory::Geometry,
    "malformed statements or out-of-range vertex indices",
);

const UNSUPPORTED_DIRECTIVE: SkipRule = SkipRule::new(
    Skipped::Other,
    Severity::Warning,
    ReportCategory::Geometry,
    "free-form and point elements are not converted",
);

/// Resolve a 1-based or negative (relative) index against `count` vertices
fn resolve_index(token: &str, count: usize) -> Option<usize> {
    let raw = token.split('/').next()?.parse::<i64>().ok()?;
    let index = match raw {
        0 => return None,
        n if n > 0 => (n - 1) as usize,
        n => count.checked_sub(n.unsigned_abs() as usize)?,
    };
    (index < count).then_some(index)
}

struct ObjImport<'c, 'a> {
    ctx: &'c mut ImportContext<'a>,
    edges: EdgeCollector,
    /// Projected vertices; malformed ones keep their slot
    vertices: Vec<Option<Point>>,
    faces: usize,
    lines: usize,
}

impl ObjImport<'_, '_> {
    fn vertex(&mut self, args: &[&str]) {
        let coords: Option<Vec<f64>> = args.iter().take(3).map(|s| s.parse::<f64>().ok()).collect();
        match coords {
            Some(c) if c.len() == 3 && c.iter().all(|v| v.is_finite()) => {
                let scale = self.ctx.config.mesh_unit_scale;
                self.vertices.push(Some(Point::new(c[0] * scale, c[2] * scale)));
            }
            _ => {
                self.vertices.push(None);
                self.ctx.skip("vertex", BAD_ELEMENT);
            }
        }
    }

    /// Connect consecutive vertices, closing the loop for faces
    fn element(&mut self, kind: &'static str, args: &[&str], closed: bool) {
        let count = self.vertices.len();
        let points: Option<Vec<Point>> = args
            .iter()
            .map(|t| resolve_index(t, count).and_then(|i| self.vertices[i]))
            .collect();
        let points = match points {
            Some(p) if p.len() >= 2 => p,
            _ => {
                self.ctx.skip(kind, BAD_ELEMENT);
                return;
            }
        };
        for pair in points.windows(2) {
            self.edges.add(self.ctx, pair[0], pair[1]);
        }
        if closed && points.len() >= 3 {
            if let (Some(&last), Some(&first)) = (points.last(), points.first()) {
                self.edges.add(self.ctx, last, first);
            }
        }
    }
}

/// Import an OBJ mesh as a top-down wall plan
pub fn import_obj(content: &[u8], file_name: &str, config: &ImportConfiguration) -> ImportResult {
    let mut ctx = ImportContext::new(FileFormat::Obj, "obj", file_name, config);
    let text = String::from_utf8_lossy(content);

    let mut import = ObjImport {
        ctx: &mut ctx,
        edges: EdgeCollector::new(config.edge_key_precision),
        vertices: Vec::new(),
        faces: 0,
        lines: 0,
    };

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let Some(directive) = tokens.next() else {
            continue;
        };
        let args: Vec<&str> = tokens.collect();
        match directive {
            "v" => import.vertex(&args),
            "f" => {
                import.faces += 1;
                import.element("face", &args, true);
            }
            "l" => {
                import.lines += 1;
                import.element("line", &args, false);
            }
            "vt" => import.ctx.skip("texture coordinate", TEXTURE_COORDINATE),
            "vn" => import.ctx.skip("vertex normal", VERTEX_NORMAL),
            "usemtl" | "mtllib" => import.ctx.skip(directive.to_string(), MATERIAL_DIRECTIVE),
            // grouping and smoothing do not change the outline
            "o" | "g" | "s" => {}
            other => import.ctx.skip(format!("'{}' statement", other), UNSUPPORTED_DIRECTIVE),
        }
    }

    let ObjImport {
        edges,
        vertices,
        faces,
        lines,
        ..
    } = import;
    if vertices.is_empty() {
        return ctx.fail("No vertices found in OBJ content");
    }
    debug!(vertices = vertices.len(), faces, lines, "parsed OBJ");
    ctx.report.info(
        ReportCategory::Geometry,
        format!(
            "Parsed {} vertices, {} faces and {} line elements; {} unique edges projected to plan view",
            vertices.len(),
            faces,
            lines,
            edges.unique()
        ),
    );
    edges.report(&mut ctx);
    ctx.finish(true)
}
