//! `SimulationBody`: a massive point body and its JSON wire format.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::vec2::Vec2;

/// A massive, point-like body. Bodies are value types: any edit replaces
/// the stored record rather than mutating it in place (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BodyWire", into = "BodyWire")]
pub struct SimulationBody {
    pub id: String,
    pub mass: f64,
    pub radius: f64,
    pub position: Vec2,
    pub velocity: Vec2,
    pub color_value: u32,
    pub label: Option<String>,
    pub kind: Option<String>,
    pub alive: bool,
}

impl SimulationBody {
    pub fn new(id: impl Into<String>, mass: f64, radius: f64, position: Vec2, velocity: Vec2) -> Self {
        SimulationBody {
            id: id.into(),
            mass,
            radius,
            position,
            velocity,
            color_value: 0xFFFFFFFF,
            label: None,
            kind: None,
            alive: true,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::new("body id must be non-empty"));
        }
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(ValidationError::new(format!(
                "body '{}': mass must be finite and > 0",
                self.id
            )));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ValidationError::new(format!(
                "body '{}': radius must be finite and > 0",
                self.id
            )));
        }
        if !self.position.is_finite() {
            return Err(ValidationError::new(format!(
                "body '{}': position must be finite",
                self.id
            )));
        }
        if !self.velocity.is_finite() {
            return Err(ValidationError::new(format!(
                "body '{}': velocity must be finite",
                self.id
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BodyWire {
    id: String,
    mass: f64,
    radius: f64,
    position: Vec2,
    velocity: Vec2,
    #[serde(default = "default_alive")]
    alive: bool,
    #[serde(default)]
    metadata: BodyMetadataWire,
}

fn default_alive() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct BodyMetadataWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default = "default_color")]
    color: String,
}

fn default_color() -> String {
    "#FFFFFFFF".to_string()
}

impl TryFrom<BodyWire> for SimulationBody {
    type Error = String;

    fn try_from(wire: BodyWire) -> Result<Self, Self::Error> {
        let color_value = decode_color(&wire.metadata.color)?;
        Ok(SimulationBody {
            id: wire.id,
            mass: wire.mass,
            radius: wire.radius,
            position: wire.position,
            velocity: wire.velocity,
            color_value,
            label: wire.metadata.label,
            kind: wire.metadata.kind,
            alive: wire.alive,
        })
    }
}

impl From<SimulationBody> for BodyWire {
    fn from(body: SimulationBody) -> Self {
        BodyWire {
            id: body.id,
            mass: body.mass,
            radius: body.radius,
            position: body.position,
            velocity: body.velocity,
            alive: body.alive,
            metadata: BodyMetadataWire {
                label: body.label,
                kind: body.kind,
                color: encode_color(body.color_value),
            },
        }
    }
}

/// Decodes an 8-hex-digit ARGB color, optionally prefixed with `#`.
pub fn decode_color(text: &str) -> Result<u32, String> {
    let trimmed = text.strip_prefix('#').unwrap_or(text);
    u32::from_str_radix(trimmed, 16)
        .map_err(|e| format!("invalid color '{text}': {e}"))
}

pub fn encode_color(value: u32) -> String {
    format!("#{value:08X}")
}
