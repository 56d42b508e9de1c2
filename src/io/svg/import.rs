//! Vector markup import

use nalgebra::Matrix3;
use tracing::debug;

use super::path::{apply, parse_transform, path_runs, rotation_degrees};
use crate::detect::FileFormat;
use crate::geometry::{ellipse_points, MARKUP_CIRCLE_SEGMENTS};
use crate::io::context::{ImportContext, SkipRule};
use crate::io::xml::{parse_document, parse_number, XmlElement};
use crate::io::{ImportConfiguration, ImportResult};
use crate::report::{ReportCategory, Severity, Skipped};
use crate::types::Point;

const EMPTY_SHAPE: SkipRule = SkipRule::new(
    Skipped::Other,
    Severity::Info,
    ReportCategory::Geometry,
    "shapes without extent produce no walls",
);

const EMPTY_TEXT: SkipRule = SkipRule::new(
    Skipped::Annotations,
    Severity::Info,
    ReportCategory::Annotations,
    "text elements without content",
);

const RASTER_IMAGE: SkipRule = SkipRule::new(
    Skipped::Other,
    Severity::Warning,
    ReportCategory::Materials,
    "embedded raster images cannot be converted to plan geometry",
);

const SYMBOL_REFERENCE: SkipRule = SkipRule::new(
    Skipped::Blocks,
    Severity::Warning,
    ReportCategory::Blocks,
    "symbol references are not expanded",
);

const BAD_TRANSFORM: SkipRule = SkipRule::new(
    Skipped::Other,
    Severity::Warning,
    ReportCategory::Geometry,
    "unreadable transform attributes were ignored",
);

/// Markup font size assumed for text that declares none
const MARKUP_FONT_SIZE: f64 = 14.0;

/// Elements whose children are walked
const CONTAINERS: [&str; 8] = ["svg", "g", "defs", "clipPath", "symbol", "a", "switch", "mask"];

/// Elements with nothing to convert
const IGNORED: [&str; 5] = ["style", "title", "desc", "metadata", "script"];

/// Import vector markup
pub fn import_svg(content: &[u8], file_name: &str, config: &ImportConfiguration) -> ImportResult {
    let mut ctx = ImportContext::new(FileFormat::Svg, "svg", file_name, config);
    let text = String::from_utf8_lossy(content);
    let root = match parse_document(&text) {
        Ok(root) => root,
        Err(err) => return ctx.fail(format!("SVG parse error: {}", err)),
    };
    if root.local_name() != "svg" {
        return ctx.fail("No <svg> root element found");
    }

    if let Some(version) = root.attr("version") {
        ctx.report.source_version = Some(version.to_string());
    }
    if let Some(view_box) = root.attr("viewBox") {
        ctx.report
            .info(ReportCategory::Metadata, format!("SVG viewBox: {}", view_box));
    }

    let mut walker = ShapeWalker { ctx: &mut ctx };
    let matrix = walker.element_matrix(&root, &Matrix3::identity());
    walker.walk_children(&root, &matrix);
    ctx.finish(true)
}

struct ShapeWalker<'c, 'a> {
    ctx: &'c mut ImportContext<'a>,
}

impl ShapeWalker<'_, '_> {
    /// Current transform of `element`: the parent transform times its own
    fn element_matrix(&mut self, element: &XmlElement, parent: &Matrix3<f64>) -> Matrix3<f64> {
        match element.attr("transform") {
            None => *parent,
            Some(value) => match parse_transform(value) {
                Some(own) => parent * own,
                None => {
                    self.ctx.skip("transform", BAD_TRANSFORM);
                    *parent
                }
            },
        }
    }

    fn walk_children(&mut self, element: &XmlElement, matrix: &Matrix3<f64>) {
        for child in element.elements() {
            self.visit(child, matrix);
        }
    }

    fn visit(&mut self, element: &XmlElement, parent: &Matrix3<f64>) {
        let name = element.local_name();
        if IGNORED.contains(&name) {
            return;
        }
        let matrix = self.element_matrix(element, parent);
        let thickness = self.ctx.config.default_wall_thickness;

        match name {
            "line" => {
                let a = Point::new(num(element, "x1"), num(element, "y1"));
                let b = Point::new(num(element, "x2"), num(element, "y2"));
                self.ctx.add_wall(apply(&matrix, a), apply(&matrix, b), thickness);
            }
            "polyline" | "polygon" => {
                let points: Vec<Point> = parse_points(element.attr("points").unwrap_or(""))
                    .into_iter()
                    .map(|p| apply(&matrix, p))
                    .collect();
                if points.len() < 2 {
                    self.ctx.skip(name, EMPTY_SHAPE);
                } else {
                    self.ctx.add_polyline(&points, name == "polygon", thickness);
                }
            }
            "rect" => {
                let (x, y) = (num(element, "x"), num(element, "y"));
                let (w, h) = (num(element, "width"), num(element, "height"));
                if w <= 0.0 || h <= 0.0 {
                    self.ctx.skip("rect", EMPTY_SHAPE);
                } else {
                    let corners = [
                        Point::new(x, y),
                        Point::new(x + w, y),
                        Point::new(x + w, y + h),
                        Point::new(x, y + h),
                    ]
                    .map(|p| apply(&matrix, p));
                    self.ctx.add_polyline(&corners, true, thickness);
                }
            }
            "path" => {
                let runs = path_runs(element.attr("d").unwrap_or(""));
                if runs.is_empty() {
                    self.ctx.skip("path", EMPTY_SHAPE);
                }
                for run in runs {
                    let points: Vec<Point> = run.into_iter().map(|p| apply(&matrix, p)).collect();
                    self.ctx.add_polyline(&points, false, thickness);
                }
            }
            "circle" | "ellipse" => self.visit_ellipse(element, &matrix),
            "text" => self.visit_text(element, &matrix),
            "image" => self.ctx.skip("image", RASTER_IMAGE),
            "use" => self.ctx.skip("use", SYMBOL_REFERENCE),
            _ if CONTAINERS.contains(&name) || element.elements().next().is_some() => {
                self.walk_children(element, &matrix)
            }
            _ => debug!(element = name, "ignoring SVG element"),
        }
    }

    fn visit_ellipse(&mut self, element: &XmlElement, matrix: &Matrix3<f64>) {
        let name = element.local_name();
        let center = Point::new(num(element, "cx"), num(element, "cy"));
        let (rx, ry) = if name == "circle" {
            let r = num(element, "r");
            (r, r)
        } else {
            (num(element, "rx"), num(element, "ry"))
        };
        if rx <= 0.0 || ry <= 0.0 {
            self.ctx.skip(name.to_string(), EMPTY_SHAPE);
            return;
        }
        let ring: Vec<Point> = ellipse_points(center, rx, ry, MARKUP_CIRCLE_SEGMENTS)
            .into_iter()
            .map(|p| apply(matrix, p))
            .collect();
        let ring_thickness = self.ctx.config.circle_wall_thickness;
        self.ctx.add_polyline(&ring, true, ring_thickness);
    }

    fn visit_text(&mut self, element: &XmlElement, matrix: &Matrix3<f64>) {
        let text = element.text();
        let text = text.trim();
        if text.is_empty() {
            self.ctx.skip("text", EMPTY_TEXT);
            return;
        }
        let config = self.ctx.config;
        let declared = element
            .attr("font-size")
            .or_else(|| style_property(element.attr("style")?, "font-size"));
        let font_size = match declared {
            None => MARKUP_FONT_SIZE * config.text_height_factor,
            Some(value) => parse_number(value)
                .filter(|s| *s > 0.0)
                .map_or(config.default_font_size, |s| s * config.text_height_factor),
        };
        let position = apply(matrix, Point::new(num(element, "x"), num(element, "y")));
        self.ctx
            .add_label(position, text, font_size, rotation_degrees(matrix));
    }
}

fn num(element: &XmlElement, name: &str) -> f64 {
    element.attr_f64(name).unwrap_or(0.0)
}

/// `name: value` from an inline style declaration
fn style_property<'s>(style: &'s str, name: &str) -> Option<&'s str> {
    style.split(';').find_map(|decl| {
        let (key, value) = decl.split_once(':')?;
        (key.trim() == name).then(|| value.trim())
    })
}

/// Coordinate pairs of a `points` attribute; a trailing odd number is dropped
fn parse_points(value: &str) -> Vec<Point> {
    let numbers: Vec<f64> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .filter_map(parse_number)
        .collect();
    numbers
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Severity;

    fn import(markup: &str) -> ImportResult {
        import_svg(markup.as_bytes(), "plan.svg", &ImportConfiguration::default())
    }

    #[test]
    fn test_rect_becomes_room() {
        let result = import(
            r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" viewBox="0 0 200 200">
                 <rect x="0" y="0" width="120" height="120"/>
               </svg>"#,
        );
        assert_eq!(result.plan.walls.len(), 4);
        assert_eq!(result.plan.rooms.len(), 1);
        assert_eq!(result.report.source_version.as_deref(), Some("1.1"));
        assert!(result.report.items.iter().any(|i| i.message == "SVG viewBox: 0 0 200 200"));
        assert_eq!(result.plan.walls[0].id, "svg-w-1");
    }

    #[test]
    fn test_group_transforms_compose() {
        let result = import(
            r#"<svg xmlns="http://www.w3.org/2000/svg">
                 <g transform="translate(100,0)">
                   <line x1="0" y1="0" x2="10" y2="0" transform="scale(2)"/>
                 </g>
               </svg>"#,
        );
        let wall = &result.plan.walls[0];
        assert_eq!(wall.start, Point::new(100.0, 0.0));
        assert_eq!(wall.end, Point::new(120.0, 0.0));
    }

    #[test]
    fn test_shapes_and_text() {
        let result = import(
            r#"<svg xmlns="http://www.w3.org/2000/svg">
                 <polyline points="0,0 50,0 50,50"/>
                 <polygon points="100 100 150 100 150 150"/>
                 <path d="M200 0 h10 v10"/>
                 <circle cx="0" cy="0" r="5"/>
                 <text x="5" y="6" font-size="3">Kitchen</text>
                 <text x="5" y="6"> </text>
               </svg>"#,
        );
        // 2 + 3 + 2 + 12
        assert_eq!(result.plan.walls.len(), 19);
        assert_eq!(result.plan.labels.len(), 1);
        assert_eq!(result.plan.labels[0].text, "Kitchen");
        assert_eq!(result.plan.labels[0].font_size, 12.0);
        assert_eq!(result.report.skipped.annotations, 1);
        assert_eq!(result.plan.walls[18].thickness, 4.0);
    }

    #[test]
    fn test_images_and_symbols_are_reported() {
        let result = import(
            r##"<svg xmlns="http://www.w3.org/2000/svg">
                 <image href="photo.png"/>
                 <use href="#door"/>
                 <use href="#door"/>
               </svg>"##,
        );
        assert_eq!(result.report.skipped.other, 1);
        assert_eq!(result.report.skipped.blocks, 2);
        assert_eq!(result.report.of_severity(Severity::Warning).len(), 2);
        let use_item = result
            .report
            .in_category(ReportCategory::Blocks)
            .into_iter()
            .next()
            .unwrap();
        assert_eq!(use_item.entity_count, Some(2));
    }

    #[test]
    fn test_structural_failures() {
        let bad = import("<svg><g></svg>");
        assert!(bad.plan.is_empty());
        assert!(bad.report.items[0].message.starts_with("SVG parse error"));

        let wrong_root = import("<html><body/></html>");
        assert_eq!(wrong_root.report.items[0].message, "No <svg> root element found");
    }

    #[test]
    fn test_style_font_size() {
        let result = import(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><text style="fill:red; font-size: 2px">A</text></svg>"#,
        );
        assert_eq!(result.plan.labels[0].font_size, 8.0);
    }

    #[test]
    fn test_text_font_size_fallbacks() {
        let result = import(
            r#"<svg xmlns="http://www.w3.org/2000/svg">
                 <text x="0" y="0">Plain</text>
                 <text x="0" y="0" font-size="large">Named</text>
               </svg>"#,
        );
        assert_eq!(result.plan.labels[0].font_size, 56.0);
        assert_eq!(result.plan.labels[1].font_size, 14.0);
    }
}
