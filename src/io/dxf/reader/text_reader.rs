//! ASCII DXF pair reader over an in-memory buffer

use encoding_rs::Encoding;

use super::stream_reader::{DxfCodePair, DxfStreamReader};
use crate::error::{PlanError, Result};

/// Reads code/value line pairs from ASCII DXF content
pub struct DxfTextReader<'a> {
    data: &'a [u8],
    pos: usize,
    line_number: usize,
    peeked: Option<DxfCodePair>,
    /// Decoder for non-UTF-8 lines; `None` decodes as Latin-1
    encoding: Option<&'static Encoding>,
}

impl<'a> DxfTextReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        // a UTF-8 byte order mark would corrupt the first group code
        let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
        Self {
            data,
            pos: 0,
            line_number: 0,
            peeked: None,
            encoding: None,
        }
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    fn read_line(&mut self) -> Option<String> {
        if self.pos >= self.data.len() {
            return None;
        }
        let rest = &self.data[self.pos..];
        let (raw, advance) = match rest.iter().position(|&b| b == b'\n') {
            Some(end) => (&rest[..end], end + 1),
            None => (rest, rest.len()),
        };
        self.pos += advance;
        self.line_number += 1;

        let line = match std::str::from_utf8(raw) {
            Ok(s) => s.to_string(),
            Err(_) => match self.encoding {
                Some(enc) => enc.decode_without_bom_handling(raw).0.into_owned(),
                None => raw.iter().map(|&b| b as char).collect(),
            },
        };
        Some(line.trim().to_string())
    }

    fn read_pair_internal(&mut self) -> Result<Option<DxfCodePair>> {
        let code_line = loop {
            match self.read_line() {
                // tolerate blank lines between pairs
                Some(line) if line.is_empty() => continue,
                Some(line) => break line,
                None => return Ok(None),
            }
        };
        let code = code_line.parse::<i32>().map_err(|_| {
            PlanError::Parse(format!(
                "invalid group code at line {}: '{}'",
                self.line_number, code_line
            ))
        })?;
        let value = self.read_line().ok_or_else(|| {
            PlanError::Parse(format!(
                "unexpected end of file after group code {} at line {}",
                code, self.line_number
            ))
        })?;
        Ok(Some(DxfCodePair::new(code, unescape_control(&value))))
    }
}

/// Plausible value of a `0` structure marker: `LINE`, `3DFACE`, `ENDSEC`
fn is_marker_name(line: &str) -> bool {
    !line.is_empty()
        && line.bytes().any(|b| b.is_ascii_alphabetic())
        && line.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
        && line.parse::<f64>().is_err()
}

/// Expand the caret escapes used for control characters in string values
fn unescape_control(value: &str) -> String {
    if !value.contains('^') {
        return value.to_string();
    }
    value
        .replace("^J", "\n")
        .replace("^M", "\r")
        .replace("^I", "\t")
        .replace("^ ", "^")
}

impl DxfStreamReader for DxfTextReader<'_> {
    fn read_pair(&mut self) -> Result<Option<DxfCodePair>> {
        if let Some(pair) = self.peeked.take() {
            return Ok(Some(pair));
        }
        self.read_pair_internal()
    }

    fn peek_code(&mut self) -> Result<Option<i32>> {
        if let Some(pair) = &self.peeked {
            return Ok(Some(pair.code));
        }
        match self.read_pair_internal()? {
            Some(pair) => {
                let code = pair.code;
                self.peeked = Some(pair);
                Ok(Some(code))
            }
            None => Ok(None),
        }
    }

    fn push_back(&mut self, pair: DxfCodePair) {
        self.peeked = Some(pair);
    }

    fn skip_to_marker(&mut self) -> bool {
        self.peeked = None;
        while let Some(line) = self.read_line() {
            if line != "0" {
                continue;
            }
            let (pos, line_number) = (self.pos, self.line_number);
            match self.read_line() {
                Some(name) if is_marker_name(&name) => {
                    self.peeked = Some(DxfCodePair::new(0, name));
                    return true;
                }
                // a value line of "0"; the following line may itself be a code
                Some(_) => {
                    self.pos = pos;
                    self.line_number = line_number;
                }
                None => return false,
            }
        }
        false
    }

    fn reset(&mut self) {
        self.pos = 0;
        self.line_number = 0;
        self.peeked = None;
    }

    fn set_encoding(&mut self, encoding: &'static Encoding) {
        self.encoding = Some(encoding);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_pairs() {
        let mut reader = DxfTextReader::new(b"  0\r\nSECTION\r\n  2\r\nHEADER\r\n");
        let first = reader.read_pair().unwrap().unwrap();
        assert!(first.is_marker("SECTION"));
        assert_eq!(reader.peek_code().unwrap(), Some(2));
        let second = reader.read_pair().unwrap().unwrap();
        assert_eq!(second.as_str(), "HEADER");
        assert!(reader.read_pair().unwrap().is_none());
    }

    #[test]
    fn test_bad_code_is_an_error() {
        let mut reader = DxfTextReader::new(b"zero\nSECTION\n");
        assert!(reader.read_pair().is_err());
    }

    #[test]
    fn test_truncated_pair_is_an_error() {
        let mut reader = DxfTextReader::new(b"0\n");
        assert!(reader.read_pair().is_err());
    }

    #[test]
    fn test_caret_escapes() {
        let mut reader = DxfTextReader::new(b"1\nKitchen^JNorth\n");
        let pair = reader.read_pair().unwrap().unwrap();
        assert_eq!(pair.as_str(), "Kitchen\nNorth");
    }

    #[test]
    fn test_code_page_fallback() {
        // 0xC4 is "Ä" in Windows-1252 and "Д" in Windows-1251
        let data = b"1\n\xC4\n";
        let mut latin = DxfTextReader::new(data);
        assert_eq!(latin.read_pair().unwrap().unwrap().as_str(), "\u{00C4}");

        let mut cyrillic = DxfTextReader::new(data);
        cyrillic.set_encoding(encoding_rs::WINDOWS_1251);
        assert_eq!(cyrillic.read_pair().unwrap().unwrap().as_str(), "\u{0414}");
    }

    #[test]
    fn test_skip_to_marker_after_bad_code() {
        let mut reader = DxfTextReader::new(b"xx\nbogus\n8\n0\n0\n0\n10\n5\n  0\nLINE\n8\nWALLS\n");
        assert!(reader.read_pair().is_err());
        assert!(reader.skip_to_marker());
        assert!(reader.read_pair().unwrap().unwrap().is_marker("LINE"));
        assert_eq!(reader.read_pair().unwrap().unwrap().as_str(), "WALLS");
        assert!(!reader.skip_to_marker());
    }

    #[test]
    fn test_marker_names() {
        assert!(is_marker_name("LWPOLYLINE"));
        assert!(is_marker_name("3DFACE"));
        assert!(is_marker_name("ACAD_PROXY_ENTITY"));
        assert!(!is_marker_name("10"));
        assert!(!is_marker_name("1E5"));
        assert!(!is_marker_name("Kitchen"));
        assert!(!is_marker_name(""));
    }

    #[test]
    fn test_reset_rewinds() {
        let mut reader = DxfTextReader::new(b"0\nEOF\n");
        reader.read_pair().unwrap();
        reader.reset();
        assert!(reader.read_pair().unwrap().unwrap().is_marker("EOF"));
        assert_eq!(reader.line_number(), 2);
    }
}
