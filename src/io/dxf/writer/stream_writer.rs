//! DXF pair-writing trait and the structural helpers built on it

use crate::error::Result;
use crate::types::{Handle, Point};

/// A sink for code/value pairs
pub trait DxfStreamWriter {
    fn write_string(&mut self, code: i32, value: &str) -> Result<()>;

    fn write_i16(&mut self, code: i32, value: i16) -> Result<()>;

    fn write_i32(&mut self, code: i32, value: i32) -> Result<()>;

    /// Coordinates and other reals, always at fixed precision
    fn write_double(&mut self, code: i32, value: f64) -> Result<()>;

    fn write_handle(&mut self, code: i32, handle: Handle) -> Result<()>;

    fn flush(&mut self) -> Result<()>;
}

/// Structural helpers for every stream writer
pub trait DxfStreamWriterExt: DxfStreamWriter {
    /// `x_code`, `x_code + 10`, and a zero `x_code + 20`
    fn write_point(&mut self, x_code: i32, point: Point) -> Result<()> {
        self.write_double(x_code, point.x)?;
        self.write_double(x_code + 10, point.y)?;
        self.write_double(x_code + 20, 0.0)
    }

    /// `x_code` and `x_code + 10` only (LWPOLYLINE vertices)
    fn write_point2d(&mut self, x_code: i32, point: Point) -> Result<()> {
        self.write_double(x_code, point.x)?;
        self.write_double(x_code + 10, point.y)
    }

    fn write_entity_type(&mut self, entity_type: &str) -> Result<()> {
        self.write_string(0, entity_type)
    }

    fn write_subclass(&mut self, marker: &str) -> Result<()> {
        self.write_string(100, marker)
    }

    fn write_variable(&mut self, name: &str) -> Result<()> {
        self.write_string(9, name)
    }

    fn write_section_start(&mut self, section_name: &str) -> Result<()> {
        self.write_string(0, "SECTION")?;
        self.write_string(2, section_name)
    }

    fn write_section_end(&mut self) -> Result<()> {
        self.write_string(0, "ENDSEC")
    }

    fn write_eof(&mut self) -> Result<()> {
        self.write_string(0, "EOF")
    }
}

impl<T: DxfStreamWriter> DxfStreamWriterExt for T {}
