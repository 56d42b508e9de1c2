//! Vector markup (SVG) import and export
//!
//! Import walks the element tree with the accumulated transform and turns
//! straight geometry into walls; curves are reduced to their end points.
//! Export renders rooms, walls, openings, annotations and visible trade
//! layers into a single document whose `viewBox` is the padded plan extent.

mod export;
mod import;
mod path;

pub use export::SvgExporter;
pub use import::import_svg;
