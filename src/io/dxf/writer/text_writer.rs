//! ASCII DXF writer

use std::io::Write;

use super::stream_writer::DxfStreamWriter;
use crate::error::Result;
use crate::geometry::format_fixed;
use crate::types::Handle;

/// Digits after the decimal point of every real value
pub const DXF_DECIMALS: usize = 4;

/// Writes pairs as right-aligned code lines followed by value lines
pub struct DxfTextWriter<W: Write> {
    writer: W,
}

impl<W: Write> DxfTextWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_code(&mut self, code: i32) -> Result<()> {
        writeln!(self.writer, "{:>3}", code)?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DxfStreamWriter for DxfTextWriter<W> {
    fn write_string(&mut self, code: i32, value: &str) -> Result<()> {
        self.write_code(code)?;
        // a raw line break would end the value line
        if value.contains(['\n', '\r', '\t']) {
            let escaped = value
                .replace("\r\n", "^J")
                .replace('\n', "^J")
                .replace('\r', "^J")
                .replace('\t', "^I");
            writeln!(self.writer, "{}", escaped)?;
        } else {
            writeln!(self.writer, "{}", value)?;
        }
        Ok(())
    }

    fn write_i16(&mut self, code: i32, value: i16) -> Result<()> {
        self.write_code(code)?;
        writeln!(self.writer, "{}", value)?;
        Ok(())
    }

    fn write_i32(&mut self, code: i32, value: i32) -> Result<()> {
        self.write_code(code)?;
        writeln!(self.writer, "{}", value)?;
        Ok(())
    }

    fn write_double(&mut self, code: i32, value: f64) -> Result<()> {
        self.write_code(code)?;
        writeln!(self.writer, "{}", format_fixed(value, DXF_DECIMALS))?;
        Ok(())
    }

    fn write_handle(&mut self, code: i32, handle: Handle) -> Result<()> {
        self.write_code(code)?;
        writeln!(self.writer, "{:X}", handle)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::stream_writer::DxfStreamWriterExt;
    use super::*;
    use crate::types::Point;

    fn written(f: impl FnOnce(&mut DxfTextWriter<&mut Vec<u8>>)) -> String {
        let mut buf = Vec::new();
        {
            let mut writer = DxfTextWriter::new(&mut buf);
            f(&mut writer);
        }
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_codes_are_right_aligned() {
        let out = written(|w| {
            w.write_string(0, "LINE").unwrap();
            w.write_i16(62, 7).unwrap();
            w.write_subclass("AcDbEntity").unwrap();
        });
        assert_eq!(out, "  0\nLINE\n 62\n7\n100\nAcDbEntity\n");
    }

    #[test]
    fn test_doubles_have_four_decimals() {
        let out = written(|w| w.write_point(10, Point::new(1.0, -2.123456)).unwrap());
        assert_eq!(out, " 10\n1.0000\n 20\n-2.1235\n 30\n0.0000\n");
    }

    #[test]
    fn test_handles_are_hex() {
        let out = written(|w| w.write_handle(5, Handle::new(255)).unwrap());
        assert_eq!(out, "  5\nFF\n");
    }

    #[test]
    fn test_line_breaks_are_escaped() {
        let out = written(|w| w.write_string(1, "Unit 4\nKitchen").unwrap());
        assert_eq!(out, "  1\nUnit 4^JKitchen\n");
    }
}
