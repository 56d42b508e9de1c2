//! Group-code pairs and the pair-stream abstraction

use crate::error::Result;

/// Value type implied by a group code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupValueKind {
    Text,
    Double,
    Integer,
    Handle,
}

impl GroupValueKind {
    /// Classify a group code by the ranges of the DXF reference
    pub fn from_code(code: i32) -> Self {
        match code {
            5 | 105 | 320..=369 | 390..=399 | 480..=481 | 1005 => Self::Handle,
            10..=59 | 110..=149 | 210..=239 | 460..=469 | 1010..=1059 => Self::Double,
            60..=99 | 160..=179 | 270..=299 | 370..=389 | 400..=409 | 420..=459 | 1060..=1071 => {
                Self::Integer
            }
            _ => Self::Text,
        }
    }
}

/// One group code and its value line
#[derive(Debug, Clone, PartialEq)]
pub struct DxfCodePair {
    pub code: i32,
    pub kind: GroupValueKind,
    pub value: String,
    double: Option<f64>,
    int: Option<i64>,
}

impl DxfCodePair {
    pub fn new(code: i32, value: impl Into<String>) -> Self {
        let value = value.into();
        let kind = GroupValueKind::from_code(code);
        let trimmed = value.trim();
        let double = match kind {
            GroupValueKind::Double | GroupValueKind::Integer => trimmed.parse::<f64>().ok(),
            _ => None,
        };
        let int = match kind {
            // some writers emit integers as "1.0"
            GroupValueKind::Integer => trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| double.filter(|d| d.fract() == 0.0).map(|d| d as i64)),
            _ => None,
        };
        Self {
            code,
            kind,
            value,
            double,
            int,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn as_double(&self) -> Option<f64> {
        self.double
    }

    pub fn as_int(&self) -> Option<i64> {
        self.int
    }

    pub fn as_i16(&self) -> Option<i16> {
        self.int.and_then(|v| i16::try_from(v).ok())
    }

    /// Hexadecimal handle value
    pub fn as_handle(&self) -> Option<u64> {
        u64::from_str_radix(self.value.trim(), 16).ok()
    }

    /// True for `0 <name>` structure markers
    pub fn is_marker(&self, name: &str) -> bool {
        self.code == 0 && self.value == name
    }
}

/// A source of code/value pairs with one pair of look-ahead
pub trait DxfStreamReader {
    /// Next pair, or `None` at end of input
    fn read_pair(&mut self) -> Result<Option<DxfCodePair>>;

    /// Code of the next pair without consuming it
    fn peek_code(&mut self) -> Result<Option<i32>>;

    /// Make `pair` the next pair returned
    fn push_back(&mut self, pair: DxfCodePair);

    /// Drop lines up to the next `0 <name>` marker after unreadable input
    ///
    /// Returns false when the input ends first.
    fn skip_to_marker(&mut self) -> bool;

    /// Rewind to the first pair
    fn reset(&mut self);

    /// Decoder for value lines that are not valid UTF-8
    fn set_encoding(&mut self, encoding: &'static encoding_rs::Encoding);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kinds() {
        assert_eq!(GroupValueKind::from_code(0), GroupValueKind::Text);
        assert_eq!(GroupValueKind::from_code(5), GroupValueKind::Handle);
        assert_eq!(GroupValueKind::from_code(21), GroupValueKind::Double);
        assert_eq!(GroupValueKind::from_code(70), GroupValueKind::Integer);
        assert_eq!(GroupValueKind::from_code(1000), GroupValueKind::Text);
    }

    #[test]
    fn test_typed_values() {
        let pair = DxfCodePair::new(10, " 12.5 ");
        assert_eq!(pair.as_double(), Some(12.5));
        assert_eq!(pair.as_int(), None);

        let flags = DxfCodePair::new(70, "1.0");
        assert_eq!(flags.as_i16(), Some(1));

        let handle = DxfCodePair::new(5, "1F");
        assert_eq!(handle.as_handle(), Some(0x1F));
        assert!(DxfCodePair::new(0, "EOF").is_marker("EOF"));
    }
}
