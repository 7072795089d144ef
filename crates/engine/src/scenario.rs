//! Scenario and snapshot documents, schema validation, and migration
//! (§4.6, §6).

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use simcore::{SimulationBody, SimulationConfig, ValidationIssue};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioModel {
    pub schema_version: String,
    pub metadata: ScenarioMetadata,
    pub engine_config: SimulationConfig,
    pub bodies: Vec<SimulationBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotModel {
    pub schema_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub tick: u64,
    pub sim_time: f64,
    pub config_hash: String,
    pub bodies: Vec<SimulationBody>,
}

/// Validates a raw scenario document, returning every issue found (empty
/// means the document is accepted). Operates on the untyped JSON value
/// rather than a strongly-typed struct so malformed documents can be
/// reported field-by-field instead of failing on the first bad field.
pub fn validate_scenario(doc: &Value) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let Some(obj) = doc.as_object() else {
        issues.push(ValidationIssue::new("", "scenario document must be a JSON object"));
        return issues;
    };

    match obj.get("schemaVersion").and_then(Value::as_str) {
        None => issues.push(ValidationIssue::new("schemaVersion", "required")),
        Some(v) if !v.starts_with("1.") => issues.push(ValidationIssue::new(
            "schemaVersion",
            format!("unsupported schema version '{v}', expected a '1.x' document"),
        )),
        Some(_) => {}
    }

    match obj.get("metadata").and_then(Value::as_object) {
        None => issues.push(ValidationIssue::new("metadata", "required object")),
        Some(metadata) => {
            match metadata.get("name").and_then(Value::as_str) {
                Some(name) if !name.trim().is_empty() => {}
                _ => issues.push(ValidationIssue::new("metadata.name", "required non-empty string")),
            }
            match metadata.get("createdAt").and_then(Value::as_str) {
                Some(created) if !created.trim().is_empty() => {}
                _ => issues.push(ValidationIssue::new(
                    "metadata.createdAt",
                    "required non-empty string",
                )),
            }
        }
    }

    match obj.get("engineConfig") {
        None => issues.push(ValidationIssue::new("engineConfig", "required object")),
        Some(value) => match serde_json::from_value::<SimulationConfig>(value.clone()) {
            Err(e) => issues.push(ValidationIssue::new("engineConfig", e.to_string())),
            Ok(config) => {
                if let Err(e) = config.validate() {
                    issues.push(ValidationIssue::new("engineConfig", e.0));
                }
            }
        },
    }

    match obj.get("bodies").and_then(Value::as_array) {
        None => issues.push(ValidationIssue::new("bodies", "required array")),
        Some(bodies) if bodies.is_empty() => {
            issues.push(ValidationIssue::new("bodies", "must be non-empty"))
        }
        Some(bodies) => {
            let mut seen_ids: HashSet<String> = HashSet::new();
            for (i, raw_body) in bodies.iter().enumerate() {
                let path = format!("bodies[{i}]");
                match serde_json::from_value::<SimulationBody>(raw_body.clone()) {
                    Err(e) => issues.push(ValidationIssue::new(path, e.to_string())),
                    Ok(body) => {
                        if let Err(e) = body.validate() {
                            issues.push(ValidationIssue::new(path.clone(), e.0));
                        }
                        if !seen_ids.insert(body.id.clone()) {
                            issues.push(ValidationIssue::new(
                                format!("{path}.id"),
                                format!("duplicate body id '{}'", body.id),
                            ));
                        }
                    }
                }
            }
        }
    }

    issues
}

/// Migrates a raw scenario document toward schema `"1.0"` (§4.6).
///
/// - Missing or `"0."`-prefixed `schemaVersion`: legacy path. Synthesizes
///   metadata, normalizes `engineConfig` field aliases, and fills config
///   defaults.
/// - `"1."`-prefixed: passed through, coercing `schemaVersion` to `"1.0"`.
/// - Anything else: returned unchanged.
pub fn migrate_to_latest(doc: Value) -> Value {
    let schema_version = doc
        .get("schemaVersion")
        .and_then(Value::as_str)
        .map(str::to_string);

    match schema_version {
        Some(ref v) if v.starts_with("1.") => {
            let mut migrated = doc;
            if let Some(obj) = migrated.as_object_mut() {
                obj.insert("schemaVersion".to_string(), json!("1.0"));
            }
            migrated
        }
        None => migrate_legacy(doc),
        Some(ref v) if v.starts_with("0.") => migrate_legacy(doc),
        Some(_) => doc,
    }
}

fn migrate_legacy(doc: Value) -> Value {
    let obj = doc.as_object().cloned().unwrap_or_default();

    let metadata = obj.get("metadata").and_then(Value::as_object).cloned();
    let name = metadata
        .as_ref()
        .and_then(|m| m.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| "Imported Scenario".to_string());
    let created_at = metadata
        .as_ref()
        .and_then(|m| m.get("createdAt"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| Utc::now().to_rfc3339());
    let description = metadata
        .as_ref()
        .and_then(|m| m.get("description"))
        .cloned();
    let author = metadata.as_ref().and_then(|m| m.get("author")).cloned();
    let tags = metadata
        .as_ref()
        .and_then(|m| m.get("tags"))
        .cloned()
        .or_else(|| obj.get("tags").cloned())
        .unwrap_or_else(|| json!([]));

    let mut new_metadata = serde_json::Map::new();
    new_metadata.insert("name".to_string(), json!(name));
    new_metadata.insert("createdAt".to_string(), json!(created_at));
    if let Some(description) = description {
        new_metadata.insert("description".to_string(), description);
    }
    if let Some(author) = author {
        new_metadata.insert("author".to_string(), author);
    }
    new_metadata.insert("tags".to_string(), tags);

    let raw_config = obj.get("engineConfig").and_then(Value::as_object).cloned();
    let new_config = normalize_legacy_config(raw_config.unwrap_or_default());

    let bodies = obj.get("bodies").cloned().unwrap_or_else(|| json!([]));

    json!({
        "schemaVersion": "1.0",
        "metadata": new_metadata,
        "engineConfig": new_config,
        "bodies": bodies,
    })
}

fn normalize_legacy_config(raw: serde_json::Map<String, Value>) -> Value {
    let alias = |primary: &str, legacy: &str| -> Option<Value> {
        raw.get(primary).or_else(|| raw.get(legacy)).cloned()
    };

    json!({
        "gravityConstant": alias("gravityConstant", "gravity").unwrap_or(json!(1.0)),
        "softeningEpsilon": alias("softeningEpsilon", "epsilon").unwrap_or(json!(1e-3)),
        "dt": raw.get("dt").cloned().unwrap_or(json!(0.005)),
        "dtPolicy": raw.get("dtPolicy").cloned().unwrap_or(json!("fixed")),
        "integrator": raw.get("integrator").cloned().unwrap_or(json!("velocityVerlet")),
        "collisionMode": raw.get("collisionMode").cloned().unwrap_or(json!("inelasticMerge")),
        "deterministic": raw.get("deterministic").cloned().unwrap_or(json!(true)),
        "gravitySolver": raw.get("gravitySolver").cloned().unwrap_or(json!("auto")),
        "barnesHutTheta": raw.get("barnesHutTheta").cloned().unwrap_or(json!(0.6)),
        "barnesHutThreshold": raw.get("barnesHutThreshold").cloned().unwrap_or(json!(256)),
    })
}
