//! `BodyEdit`: the runtime edit protocol (§3, §4.5, §6).
//!
//! Implemented as a tagged sum type rather than a class hierarchy; the
//! derived serde representation already matches the wire form exactly,
//! since serde's default external enum tagging produces `{"create": ...}`,
//! `{"update": {...}}`, `{"delete": {...}}` for free.

use serde::{Deserialize, Serialize};

use crate::body::{decode_color, SimulationBody};
use crate::vec2::Vec2;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEdit {
    Create(SimulationBody),
    Update(BodyUpdate),
    Delete(BodyDelete),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyUpdate {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<Vec2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataPatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl MetadataPatch {
    /// Decodes `color`, if present, from its hex wire form into an ARGB u32.
    pub fn color_value(&self) -> Result<Option<u32>, String> {
        self.color.as_deref().map(decode_color).transpose()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyDelete {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_round_trips_as_tagged_create() {
        let body = SimulationBody::new("a", 1.0, 1.0, Vec2::ZERO, Vec2::ZERO);
        let edit = BodyEdit::Create(body);
        let json = serde_json::to_value(&edit).unwrap();
        assert!(json.get("create").is_some());
        let back: BodyEdit = serde_json::from_value(json).unwrap();
        matches!(back, BodyEdit::Create(_));
    }

    #[test]
    fn update_wire_shape() {
        let json = serde_json::json!({
            "update": { "id": "a", "mass": 5.0, "metadata": { "color": "#FF00FF00" } }
        });
        let edit: BodyEdit = serde_json::from_value(json).unwrap();
        match edit {
            BodyEdit::Update(u) => {
                assert_eq!(u.id, "a");
                assert_eq!(u.mass, Some(5.0));
                assert_eq!(u.metadata.unwrap().color_value().unwrap(), Some(0xFF00FF00));
            }
            _ => panic!("expected update"),
        }
    }

    #[test]
    fn delete_wire_shape() {
        let json = serde_json::json!({ "delete": { "id": "a" } });
        let edit: BodyEdit = serde_json::from_value(json).unwrap();
        match edit {
            BodyEdit::Delete(d) => assert_eq!(d.id, "a"),
            _ => panic!("expected delete"),
        }
    }
}
