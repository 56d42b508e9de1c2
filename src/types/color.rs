//! Color representation for exported layers and materials

use std::fmt;

/// A color as used by the exporters
///
/// DXF layers need an AutoCAD Color Index; SVG, MTL and glTF need RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// AutoCAD Color Index (1-255)
    Index(u8),
    /// True color with RGB values
    Rgb { r: u8, g: u8, b: u8 },
}

impl Color {
    /// Common color constants
    pub const RED: Color = Color::Index(1);
    pub const YELLOW: Color = Color::Index(2);
    pub const GREEN: Color = Color::Index(3);
    pub const CYAN: Color = Color::Index(4);
    pub const BLUE: Color = Color::Index(5);
    pub const MAGENTA: Color = Color::Index(6);
    pub const WHITE: Color = Color::Index(7);
    pub const GRAY: Color = Color::Index(8);
    pub const LIGHT_GRAY: Color = Color::Index(9);

    /// Create a true color from RGB values
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb { r, g, b }
    }

    /// Create a true color from a packed `0xRRGGBB` value
    pub const fn from_hex(value: u32) -> Self {
        Color::Rgb {
            r: ((value >> 16) & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: (value & 0xFF) as u8,
        }
    }

    /// ACI index; true colors map to the closest of the nine standard indices
    pub fn aci(&self) -> i16 {
        match self {
            Color::Index(i) => *i as i16,
            Color::Rgb { .. } => {
                let (r, g, b) = self.rgb();
                let brightness = (r as u16 + g as u16 + b as u16) / 3;
                if brightness < 32 {
                    8
                } else if brightness > 224 {
                    7
                } else if r > g && r > b {
                    1
                } else if g > r && g > b {
                    3
                } else if b > r && b > g {
                    5
                } else {
                    7
                }
            }
        }
    }

    /// RGB components; the first nine ACI indices use their standard palette
    pub fn rgb(&self) -> (u8, u8, u8) {
        match *self {
            Color::Rgb { r, g, b } => (r, g, b),
            Color::Index(i) => match i {
                1 => (255, 0, 0),
                2 => (255, 255, 0),
                3 => (0, 255, 0),
                4 => (0, 255, 255),
                5 => (0, 0, 255),
                6 => (255, 0, 255),
                8 => (128, 128, 128),
                9 => (192, 192, 192),
                _ => (255, 255, 255),
            },
        }
    }

    /// `#rrggbb` form for SVG
    pub fn to_css(&self) -> String {
        let (r, g, b) = self.rgb();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }

    /// Components scaled to 0..1 for MTL and glTF materials
    pub fn to_unit_rgb(&self) -> [f64; 3] {
        let (r, g, b) = self.rgb();
        [r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Index(i) => write!(f, "Index({})", i),
            Color::Rgb { r, g, b } => write!(f, "RGB({}, {}, {})", r, g, b),
        }
    }
}
