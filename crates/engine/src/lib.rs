//! Engine orchestrator and scenario/snapshot schema (§4.5, §4.6).

pub mod orchestrator;
pub mod scenario;

pub use orchestrator::EngineOrchestrator;
pub use scenario::{migrate_to_latest, validate_scenario, ScenarioMetadata, ScenarioModel, SnapshotModel};
