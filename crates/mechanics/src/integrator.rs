//! Integrator family: semi-implicit Euler, velocity Verlet, and classical
//! RK4, each advancing `(position, velocity)` by one `dt` over the shared
//! force computation (§4.2).

use simcore::config::IntegratorKind;
use simcore::{SimulationBody, SimulationConfig, SolverMode, Vec2};

use crate::force::compute_accelerations;

pub struct IntegrationResult {
    pub positions: Vec<Vec2>,
    pub velocities: Vec<Vec2>,
    /// One entry per force evaluation performed this step (1 for
    /// semi-implicit Euler, 2 for velocity Verlet, 4 for RK4).
    pub solver_modes: Vec<SolverMode>,
}

/// Advances every body by one tick of `dt` under `config.integrator`.
pub fn integrate(bodies: &[SimulationBody], config: &SimulationConfig, dt: f64) -> IntegrationResult {
    match config.integrator {
        IntegratorKind::SemiImplicitEuler => semi_implicit_euler(bodies, config, dt),
        IntegratorKind::VelocityVerlet => velocity_verlet(bodies, config, dt),
        IntegratorKind::Rk4 => rk4(bodies, config, dt),
    }
}

fn current_positions(bodies: &[SimulationBody]) -> Vec<Vec2> {
    bodies.iter().map(|b| b.position).collect()
}

fn current_velocities(bodies: &[SimulationBody]) -> Vec<Vec2> {
    bodies.iter().map(|b| b.velocity).collect()
}

fn semi_implicit_euler(bodies: &[SimulationBody], config: &SimulationConfig, dt: f64) -> IntegrationResult {
    let n = bodies.len();
    let p0 = current_positions(bodies);
    let v0 = current_velocities(bodies);

    let force = compute_accelerations(bodies, &p0, config);

    let mut positions = vec![Vec2::ZERO; n];
    let mut velocities = vec![Vec2::ZERO; n];
    for i in 0..n {
        if !bodies[i].alive {
            positions[i] = p0[i];
            velocities[i] = v0[i];
            continue;
        }
        velocities[i] = v0[i] + force.accelerations[i] * dt;
        positions[i] = p0[i] + velocities[i] * dt;
    }

    IntegrationResult {
        positions,
        velocities,
        solver_modes: vec![force.solver_mode],
    }
}

fn velocity_verlet(bodies: &[SimulationBody], config: &SimulationConfig, dt: f64) -> IntegrationResult {
    let n = bodies.len();
    let p0 = current_positions(bodies);
    let v0 = current_velocities(bodies);

    let force0 = compute_accelerations(bodies, &p0, config);

    let mut p1 = vec![Vec2::ZERO; n];
    for i in 0..n {
        p1[i] = if bodies[i].alive {
            p0[i] + v0[i] * dt + force0.accelerations[i] * (0.5 * dt * dt)
        } else {
            p0[i]
        };
    }

    let force1 = compute_accelerations(bodies, &p1, config);

    let mut v1 = vec![Vec2::ZERO; n];
    for i in 0..n {
        v1[i] = if bodies[i].alive {
            v0[i] + (force0.accelerations[i] + force1.accelerations[i]) * (0.5 * dt)
        } else {
            v0[i]
        };
    }

    IntegrationResult {
        positions: p1,
        velocities: v1,
        solver_modes: vec![force0.solver_mode, force1.solver_mode],
    }
}

fn rk4(bodies: &[SimulationBody], config: &SimulationConfig, dt: f64) -> IntegrationResult {
    let n = bodies.len();
    let p0 = current_positions(bodies);
    let v0 = current_velocities(bodies);

    let stage_positions = |derivative: &[Vec2], scale: f64| -> Vec<Vec2> {
        (0..n)
            .map(|i| {
                if bodies[i].alive {
                    p0[i] + derivative[i] * scale
                } else {
                    p0[i]
                }
            })
            .collect()
    };

    // k1: evaluated at the current state.
    let f1 = compute_accelerations(bodies, &p0, config);

    // k2: evaluated at p0 + 0.5*dt*v0 (k1p = v0).
    let p_stage2 = stage_positions(&v0, 0.5 * dt);
    let f2 = compute_accelerations(bodies, &p_stage2, config);

    // k3: evaluated at p0 + 0.5*dt*(v0 + 0.5*dt*a1) (k2p).
    let k2p: Vec<Vec2> = (0..n).map(|i| v0[i] + f1.accelerations[i] * (0.5 * dt)).collect();
    let p_stage3 = stage_positions(&k2p, 0.5 * dt);
    let f3 = compute_accelerations(bodies, &p_stage3, config);

    // k4: evaluated at p0 + dt*(v0 + 0.5*dt*a2) (k3p).
    let k3p: Vec<Vec2> = (0..n).map(|i| v0[i] + f2.accelerations[i] * (0.5 * dt)).collect();
    let p_stage4 = stage_positions(&k3p, dt);
    let f4 = compute_accelerations(bodies, &p_stage4, config);

    let mut positions = vec![Vec2::ZERO; n];
    let mut velocities = vec![Vec2::ZERO; n];
    let sixth = dt / 6.0;
    for i in 0..n {
        if !bodies[i].alive {
            positions[i] = p0[i];
            velocities[i] = v0[i];
            continue;
        }
        let k1p = v0[i];
        let k1v = f1.accelerations[i];
        let k2p_i = k2p[i];
        let k2v = f2.accelerations[i];
        let k3p_i = k3p[i];
        let k3v = f3.accelerations[i];
        let k4p = v0[i] + f3.accelerations[i] * dt;
        let k4v = f4.accelerations[i];

        positions[i] = p0[i] + (k1p + k2p_i * 2.0 + k3p_i * 2.0 + k4p) * sixth;
        velocities[i] = v0[i] + (k1v + k2v * 2.0 + k3v * 2.0 + k4v) * sixth;
    }

    IntegrationResult {
        positions,
        velocities,
        solver_modes: vec![
            f1.solver_mode,
            f2.solver_mode,
            f3.solver_mode,
            f4.solver_mode,
        ],
    }
}
