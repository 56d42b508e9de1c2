//! Trade overlays (electrical, plumbing, HVAC, damage, fire)
//!
//! Trade layers share the plan's coordinate space but are independent of the
//! walls: nothing on a trade layer references a wall id.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::opening::string_enum;
use crate::error::PlanError;
use crate::types::{Color, Point};

/// Kind of trade overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TradeLayerType {
    Electrical,
    Plumbing,
    Hvac,
    Damage,
    Fire,
}

string_enum!(TradeLayerType {
    Electrical => "electrical",
    Plumbing => "plumbing",
    Hvac => "hvac",
    Damage => "damage",
    Fire => "fire",
});

impl TradeLayerType {
    pub const ALL: [TradeLayerType; 5] = [
        TradeLayerType::Electrical,
        TradeLayerType::Plumbing,
        TradeLayerType::Hvac,
        TradeLayerType::Damage,
        TradeLayerType::Fire,
    ];

    /// Display color used by the vector and mesh exporters
    pub fn color(&self) -> Color {
        match self {
            Self::Electrical => Color::from_hex(0x3B82F6),
            Self::Plumbing => Color::from_hex(0xEF4444),
            Self::Hvac => Color::from_hex(0x10B981),
            Self::Damage => Color::from_hex(0xF59E0B),
            Self::Fire => Color::from_hex(0xDC2626),
        }
    }

    /// Fixed ACI color of the drafting layer
    pub fn aci(&self) -> i16 {
        match self {
            Self::Electrical => 5,
            Self::Plumbing => 1,
            Self::Hvac => 3,
            Self::Damage => 30,
            Self::Fire => 6,
        }
    }

    /// Drafting layer name
    pub fn layer_name(&self) -> &'static str {
        match self {
            Self::Electrical => "TRADE-ELECTRICAL",
            Self::Plumbing => "TRADE-PLUMBING",
            Self::Hvac => "TRADE-HVAC",
            Self::Damage => "TRADE-DAMAGE",
            Self::Fire => "TRADE-FIRE",
        }
    }
}

/// A trade symbol (outlet, valve, register, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeElement {
    pub id: String,
    #[serde(rename = "type")]
    pub symbol: String,
    pub position: Point,
    pub rotation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A routed run (wire, pipe, duct)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradePath {
    pub id: String,
    #[serde(rename = "type")]
    pub path_type: String,
    pub points: Vec<Point>,
    pub stroke_width: f64,
}

/// A water-damage area with its IICRC classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageZone {
    pub id: String,
    pub points: Vec<Point>,
    /// Damage class, `1`..`4`
    pub damage_class: String,
    /// IICRC water category, `1`..`3`
    pub iicrc_category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// One overlay layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeLayer {
    pub id: String,
    #[serde(rename = "type")]
    pub layer_type: TradeLayerType,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    /// Opacity 0..1
    pub opacity: f64,
    #[serde(default)]
    pub elements: Vec<TradeElement>,
    #[serde(default)]
    pub paths: Vec<TradePath>,
    #[serde(default)]
    pub damage_zones: Vec<DamageZone>,
}

impl TradeLayer {
    pub fn new(id: impl Into<String>, layer_type: TradeLayerType) -> Self {
        let name = match layer_type {
            TradeLayerType::Hvac => "HVAC".to_string(),
            other => {
                let s = other.as_str();
                let mut chars = s.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        };
        Self {
            id: id.into(),
            layer_type,
            name,
            visible: true,
            locked: false,
            opacity: 1.0,
            elements: Vec::new(),
            paths: Vec::new(),
            damage_zones: Vec::new(),
        }
    }

    /// Total number of drawable items on the layer
    pub fn item_count(&self) -> usize {
        self.elements.len() + self.paths.len() + self.damage_zones.len()
    }
}
