//! `SimulationState` and `StepSummary` (§3).

use serde::{Deserialize, Serialize};

use crate::body::SimulationBody;
use crate::config::SimulationConfig;

/// The full observable state of a simulation at a point in time.
/// Equal-by-value: two states with the same tick, time, config and body
/// sequence compare equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationState {
    pub tick: u64,
    pub sim_time: f64,
    pub config: SimulationConfig,
    pub bodies: Vec<SimulationBody>,
}

/// Which solver actually ran a given substep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverMode {
    Pairwise,
    BarnesHut,
}

/// Aggregate report for a `step(n)` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSummary {
    pub ticks_applied: u64,
    pub final_tick: u64,
    pub sim_time: f64,
    pub collision_events: u64,
    pub merged_events: u64,
    pub warnings: Vec<String>,
    pub pairwise_ticks: u64,
    pub barnes_hut_ticks: u64,
    pub step_wall_time_micros: u64,
    pub average_tick_micros: f64,
    pub max_body_count: usize,
    pub last_solver_mode: Option<SolverMode>,
}

impl StepSummary {
    /// The zero-work summary returned by `step(n)` when `n <= 0`.
    pub fn zero_work(current_tick: u64, current_sim_time: f64) -> Self {
        StepSummary {
            ticks_applied: 0,
            final_tick: current_tick,
            sim_time: current_sim_time,
            collision_events: 0,
            merged_events: 0,
            warnings: Vec::new(),
            pairwise_ticks: 0,
            barnes_hut_ticks: 0,
            step_wall_time_micros: 0,
            average_tick_micros: 0.0,
            max_body_count: 0,
            last_solver_mode: None,
        }
    }
}
