//! Doors and windows placed on walls

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::Wall;
use crate::error::PlanError;
use crate::types::Point;

/// Standard interior door width in inches
pub const DEFAULT_DOOR_WIDTH: f64 = 32.0;

/// Standard window width in inches
pub const DEFAULT_WINDOW_WIDTH: f64 = 36.0;

/// Standard window sill height in inches
pub const DEFAULT_SILL_HEIGHT: f64 = 36.0;

/// Behavior shared by everything that sits at a parametric position on a wall
pub trait Opening {
    fn id(&self) -> &str;

    /// Id of the host wall
    fn wall_id(&self) -> &str;

    /// Parametric position along the host wall, clamped to [0, 1]
    fn position(&self) -> f64;

    /// Opening width in inches
    fn width(&self) -> f64;

    /// Jamb endpoints on the host wall, centered on the position
    ///
    /// `None` for a zero-length host wall.
    fn span(&self, wall: &Wall) -> Option<(Point, Point)> {
        let length = wall.length();
        if wall.is_degenerate() {
            return None;
        }
        let dir = (wall.end - wall.start) / length;
        let center = wall.start + dir * (length * self.position());
        let half = dir * (self.width().min(length) / 2.0);
        Some((center - half, center + half))
    }
}

/// Clamp a parametric wall position; NaN maps to the wall midpoint
pub fn clamp_position(t: f64) -> f64 {
    if t.is_nan() {
        0.5
    } else {
        t.clamp(0.0, 1.0)
    }
}

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Name used in serialized plans
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = PlanError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(PlanError::Parse(format!(
                        "unknown {}: {}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

pub(crate) use string_enum;

/// Door styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DoorType {
    #[default]
    Single,
    Double,
    Sliding,
    Pocket,
    Bifold,
    Barn,
    French,
    RollUp,
    Overhead,
    StorefrontGlass,
    CurtainWall,
    RevolvingDoor,
    RollDownSecurity,
    DriveThruWindow,
    BulletResistantWindow,
}

string_enum!(DoorType {
    Single => "single",
    Double => "double",
    Sliding => "sliding",
    Pocket => "pocket",
    Bifold => "bifold",
    Barn => "barn",
    French => "french",
    RollUp => "rollUp",
    Overhead => "overhead",
    StorefrontGlass => "storefrontGlass",
    CurtainWall => "curtainWall",
    RevolvingDoor => "revolvingDoor",
    RollDownSecurity => "rollDownSecurity",
    DriveThruWindow => "driveThruWindow",
    BulletResistantWindow => "bulletResistantWindow",
});

impl DoorType {
    /// Doors drawn with a swing arc in plan view
    pub fn swings(&self) -> bool {
        matches!(self, Self::Single | Self::Double | Self::French)
    }
}

/// Window styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowType {
    #[default]
    Standard,
    Bay,
    Skylight,
}

string_enum!(WindowType {
    Standard => "standard",
    Bay => "bay",
    Skylight => "skylight",
});

/// A door placed on a wall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Door {
    pub id: String,
    pub wall_id: String,
    pub position: f64,
    pub width: f64,
    #[serde(rename = "type")]
    pub door_type: DoorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swing_angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flip_side: Option<bool>,
}

impl Door {
    pub fn new(id: impl Into<String>, wall_id: impl Into<String>, position: f64, width: f64) -> Self {
        Self {
            id: id.into(),
            wall_id: wall_id.into(),
            position: clamp_position(position),
            width,
            door_type: DoorType::Single,
            swing_angle: None,
            flip_side: None,
        }
    }

    /// Swing angle in degrees (90 unless overridden)
    pub fn swing_degrees(&self) -> f64 {
        self.swing_angle.unwrap_or(90.0)
    }

    /// Plan-view leaf and swing arc, for door types that swing
    pub fn swing(&self, wall: &Wall) -> Option<DoorSwing> {
        if !self.door_type.swings() {
            return None;
        }
        let (hinge, latch) = self.span(wall)?;
        let radius = hinge.distance(&latch);
        let closed = (latch.y - hinge.y).atan2(latch.x - hinge.x).to_degrees();
        let sweep = self.swing_degrees();
        let (start_angle, end_angle, open) = if self.flip_side.unwrap_or(false) {
            (closed - sweep, closed, closed - sweep)
        } else {
            (closed, closed + sweep, closed + sweep)
        };
        let leaf_end = hinge + Point::new(open.to_radians().cos(), open.to_radians().sin()) * radius;
        Some(DoorSwing {
            hinge,
            radius,
            start_angle,
            end_angle,
            leaf_end,
        })
    }
}

/// Door leaf and swing arc; angles in degrees, counter-clockwise
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoorSwing {
    pub hinge: Point,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    /// Free end of the open leaf
    pub leaf_end: Point,
}

impl Opening for Door {
    fn id(&self) -> &str {
        &self.id
    }

    fn wall_id(&self) -> &str {
        &self.wall_id
    }

    fn position(&self) -> f64 {
        clamp_position(self.position)
    }

    fn width(&self) -> f64 {
        self.width
    }
}

/// A window placed on a wall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    pub id: String,
    pub wall_id: String,
    pub position: f64,
    pub width: f64,
    #[serde(rename = "type")]
    pub window_type: WindowType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sill_height: Option<f64>,
}

impl Window {
    pub fn new(id: impl Into<String>, wall_id: impl Into<String>, position: f64, width: f64) -> Self {
        Self {
            id: id.into(),
            wall_id: wall_id.into(),
            position: clamp_position(position),
            width,
            window_type: WindowType::Standard,
            sill_height: None,
        }
    }

    pub fn sill(&self) -> f64 {
        self.sill_height.unwrap_or(DEFAULT_SILL_HEIGHT)
    }
}

impl Opening for Window {
    fn id(&self) -> &str {
        &self.id
    }

    fn wall_id(&self) -> &str {
        &self.wall_id
    }

    fn position(&self) -> f64 {
        clamp_position(self.position)
    }

    fn width(&self) -> f64 {
        self.width
    }
}
