//! `EngineOrchestrator`: the state machine that owns a simulation's bodies,
//! config, and clock, and drives the stepping pipeline (§4.5).

use std::time::Instant;

use chrono::Utc;

use mechanics::{integrate, resolve_collisions, resolve_dt};
use simcore::{
    BodyEdit, EngineError, SimulationBody, SimulationConfig, SimulationState, SolverMode,
    StepSummary, ValidationIssue,
};

use crate::scenario::{ScenarioModel, SnapshotModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Uninitialized,
    Active,
    Disposed,
}

/// Owns the single mutable body list and tick/time counters for one
/// simulation run. `getState`, `snapshot`, and `saveScenario` hand out deep
/// clones so callers can never alias internal storage.
pub struct EngineOrchestrator {
    status: Status,
    config: SimulationConfig,
    bodies: Vec<SimulationBody>,
    tick: u64,
    sim_time: f64,
}

impl Default for EngineOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineOrchestrator {
    pub fn new() -> Self {
        EngineOrchestrator {
            status: Status::Uninitialized,
            config: SimulationConfig::default(),
            bodies: Vec::new(),
            tick: 0,
            sim_time: 0.0,
        }
    }

    fn require_active(&self) -> Result<(), EngineError> {
        match self.status {
            Status::Active => Ok(()),
            Status::Uninitialized => Err(EngineError::invalid_state("engine is not initialized")),
            Status::Disposed => Err(EngineError::invalid_state("engine has been disposed")),
        }
    }

    fn require_not_disposed(&self) -> Result<(), EngineError> {
        if self.status == Status::Disposed {
            Err(EngineError::invalid_state("engine has been disposed"))
        } else {
            Ok(())
        }
    }

    /// Transitions `Uninitialized`/`Active` to `Active` with a freshly
    /// validated config and body set, resetting tick and sim time to zero.
    pub fn initialize(
        &mut self,
        config: SimulationConfig,
        bodies: Vec<SimulationBody>,
    ) -> Result<SimulationState, EngineError> {
        self.require_not_disposed()?;
        config.validate()?;
        validate_body_set(&bodies)?;

        self.config = config;
        self.bodies = bodies;
        self.tick = 0;
        self.sim_time = 0.0;
        self.status = Status::Active;
        self.get_state()
    }

    pub fn set_config(&mut self, config: SimulationConfig) -> Result<(), EngineError> {
        self.require_active()?;
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn apply_edit(&mut self, edit: BodyEdit) -> Result<(), EngineError> {
        self.require_active()?;
        match edit {
            BodyEdit::Create(body) => {
                if self.bodies.iter().any(|b| b.id == body.id) {
                    return Err(EngineError::invalid_state(format!(
                        "duplicate body id '{}'",
                        body.id
                    )));
                }
                body.validate()?;
                self.bodies.push(body);
            }
            BodyEdit::Update(update) => {
                let idx = self
                    .bodies
                    .iter()
                    .position(|b| b.id == update.id)
                    .ok_or_else(|| {
                        EngineError::invalid_state(format!("unknown body id '{}'", update.id))
                    })?;

                let mut candidate = self.bodies[idx].clone();
                if let Some(mass) = update.mass {
                    candidate.mass = mass;
                }
                if let Some(radius) = update.radius {
                    candidate.radius = radius;
                }
                if let Some(position) = update.position {
                    candidate.position = position;
                }
                if let Some(velocity) = update.velocity {
                    candidate.velocity = velocity;
                }
                if let Some(alive) = update.alive {
                    candidate.alive = alive;
                }
                if let Some(metadata) = update.metadata {
                    if let Some(label) = metadata.label {
                        candidate.label = Some(label);
                    }
                    if let Some(kind) = metadata.kind {
                        candidate.kind = Some(kind);
                    }
                    if let Some(color_value) = metadata
                        .color_value()
                        .map_err(simcore::ValidationError::new)?
                    {
                        candidate.color_value = color_value;
                    }
                }

                candidate.validate()?;
                self.bodies[idx] = candidate;
            }
            BodyEdit::Delete(delete) => {
                let idx = self
                    .bodies
                    .iter()
                    .position(|b| b.id == delete.id)
                    .ok_or_else(|| {
                        EngineError::invalid_state(format!("unknown body id '{}'", delete.id))
                    })?;
                self.bodies.remove(idx);
            }
        }
        Ok(())
    }

    /// Runs `n` substeps, each of which resolves `dt`, integrates, resolves
    /// collisions, and advances the clock. `n <= 0` is a zero-work no-op.
    /// On numerical instability the engine's state is left at the last
    /// completed substep.
    pub fn step(&mut self, n: i64) -> Result<StepSummary, EngineError> {
        self.require_active()?;
        if n <= 0 {
            return Ok(StepSummary::zero_work(self.tick, self.sim_time));
        }

        let started_at = Instant::now();
        let mut ticks_applied: u64 = 0;
        let mut collision_events: u64 = 0;
        let mut merged_events: u64 = 0;
        let mut pairwise_ticks: u64 = 0;
        let mut barnes_hut_ticks: u64 = 0;
        let mut max_body_count = self.bodies.len();
        let mut last_solver_mode: Option<SolverMode> = None;

        for _ in 0..n {
            // Snapshot the pre-substep bodies so a numerical-instability
            // failure can roll back to them: tick/simTime/bodies must all
            // stay at the last fully-completed substep's result together.
            let pre_substep_bodies = self.bodies.clone();

            let dt_used = resolve_dt(&self.bodies, &self.config);
            let result = integrate(&self.bodies, &self.config, dt_used);

            for (i, body) in self.bodies.iter_mut().enumerate() {
                if body.alive {
                    body.position = result.positions[i];
                    body.velocity = result.velocities[i];
                }
            }

            let outcome = resolve_collisions(&mut self.bodies, &self.config);
            if outcome.merged_events > 0 {
                log::debug!(
                    "tick {}: {} merge(s), {} body/bodies remaining",
                    self.tick + 1,
                    outcome.merged_events,
                    self.bodies.len()
                );
            }

            if let Some(unstable) = self
                .bodies
                .iter()
                .find(|b| b.alive && !(b.position.is_finite() && b.velocity.is_finite()))
            {
                let detail = format!("body '{}' became non-finite during integration", unstable.id);
                log::warn!("step aborted after {ticks_applied} substep(s): {detail}");
                self.bodies = pre_substep_bodies;
                return Err(EngineError::NumericalInstability {
                    completed_ticks: ticks_applied,
                    detail,
                });
            }

            collision_events += outcome.collision_events;
            merged_events += outcome.merged_events;

            self.tick += 1;
            self.sim_time += dt_used;
            ticks_applied += 1;
            max_body_count = max_body_count.max(self.bodies.len());

            let solver_mode = result.solver_modes[0];
            match solver_mode {
                SolverMode::Pairwise => pairwise_ticks += 1,
                SolverMode::BarnesHut => barnes_hut_ticks += 1,
            }
            last_solver_mode = Some(solver_mode);
        }

        let step_wall_time_micros = started_at.elapsed().as_micros() as u64;
        Ok(StepSummary {
            ticks_applied,
            final_tick: self.tick,
            sim_time: self.sim_time,
            collision_events,
            merged_events,
            warnings: Vec::new(),
            pairwise_ticks,
            barnes_hut_ticks,
            step_wall_time_micros,
            average_tick_micros: step_wall_time_micros as f64 / ticks_applied as f64,
            max_body_count,
            last_solver_mode,
        })
    }

    pub fn get_state(&self) -> Result<SimulationState, EngineError> {
        self.require_active()?;
        Ok(SimulationState {
            tick: self.tick,
            sim_time: self.sim_time,
            config: self.config,
            bodies: self.bodies.clone(),
        })
    }

    /// Replaces config and bodies wholesale and resets tick/simTime to zero.
    /// Accepts only `schemaVersion` prefixed `"1"`.
    pub fn load_scenario(&mut self, scenario: ScenarioModel) -> Result<SimulationState, EngineError> {
        self.require_not_disposed()?;
        if !scenario.schema_version.starts_with('1') {
            return Err(EngineError::Schema(vec![ValidationIssue::new(
                "schemaVersion",
                format!(
                    "unsupported schema version '{}'",
                    scenario.schema_version
                ),
            )]));
        }
        scenario.engine_config.validate()?;
        validate_body_set(&scenario.bodies)?;

        self.config = scenario.engine_config;
        self.bodies = scenario.bodies;
        self.tick = 0;
        self.sim_time = 0.0;
        self.status = Status::Active;
        self.get_state()
    }

    /// Emits schema `"1.0"`, name `"Untitled"`, the current config, and a
    /// deep clone of the active bodies.
    pub fn save_scenario(&self) -> Result<ScenarioModel, EngineError> {
        self.require_active()?;
        Ok(ScenarioModel {
            schema_version: "1.0".to_string(),
            metadata: crate::scenario::ScenarioMetadata {
                name: "Untitled".to_string(),
                description: None,
                author: None,
                created_at: Utc::now().to_rfc3339(),
                tags: Vec::new(),
            },
            engine_config: self.config,
            bodies: self.bodies.clone(),
        })
    }

    /// Captures tick, simTime, and a deterministic config hash, but not the
    /// config itself.
    pub fn snapshot(&self) -> Result<SnapshotModel, EngineError> {
        self.require_active()?;
        Ok(SnapshotModel {
            schema_version: "1.0".to_string(),
            created_at: Some(Utc::now().to_rfc3339()),
            tick: self.tick,
            sim_time: self.sim_time,
            config_hash: self.config.config_hash(),
            bodies: self.bodies.clone(),
        })
    }

    /// Overwrites tick, simTime, and the body list. The current config is
    /// left untouched: snapshots carry only a hash of the config they were
    /// taken against, not the config itself.
    pub fn restore_snapshot(&mut self, snapshot: SnapshotModel) -> Result<SimulationState, EngineError> {
        self.require_not_disposed()?;
        if !snapshot.schema_version.starts_with('1') {
            return Err(EngineError::Schema(vec![ValidationIssue::new(
                "schemaVersion",
                format!(
                    "unsupported schema version '{}'",
                    snapshot.schema_version
                ),
            )]));
        }
        validate_body_set(&snapshot.bodies)?;

        self.bodies = snapshot.bodies;
        self.tick = snapshot.tick;
        self.sim_time = snapshot.sim_time;
        self.status = Status::Active;
        self.get_state()
    }

    /// Always succeeds, including when already disposed.
    pub fn dispose(&mut self) {
        self.status = Status::Disposed;
    }
}

fn validate_body_set(bodies: &[SimulationBody]) -> Result<(), EngineError> {
    let mut seen = std::collections::HashSet::new();
    for body in bodies {
        body.validate()?;
        if !seen.insert(body.id.as_str()) {
            return Err(EngineError::Validation(simcore::ValidationError::new(
                format!("duplicate body id '{}'", body.id),
            )));
        }
    }
    Ok(())
}
