//! Adaptive timestep policy (§4.3).

use simcore::config::DtPolicy;
use simcore::{SimulationBody, SimulationConfig};

/// Resolves the `dt` to use for the next substep.
///
/// Under `Fixed` this is always `config.dt`. Under `Adaptive` it is
/// `clamp(0.05 * d_min / v_max, 0.05 * dt, dt)`, falling back to
/// `config.dt` whenever `v_max` or `d_min` are non-finite or `v_max <= 0`.
pub fn resolve_dt(bodies: &[SimulationBody], config: &SimulationConfig) -> f64 {
    if config.dt_policy == DtPolicy::Fixed {
        return config.dt;
    }

    let live: Vec<&SimulationBody> = bodies.iter().filter(|b| b.alive).collect();

    let v_max = live
        .iter()
        .map(|b| b.velocity.norm())
        .fold(0.0_f64, f64::max);

    let mut d_min = f64::INFINITY;
    for i in 0..live.len() {
        for j in (i + 1)..live.len() {
            let d = (live[j].position - live[i].position).norm();
            if d > 0.0 && d < d_min {
                d_min = d;
            }
        }
    }

    if !v_max.is_finite() || v_max <= 0.0 || !d_min.is_finite() {
        return config.dt;
    }

    let candidate = 0.05 * d_min / v_max;
    candidate.clamp(0.05 * config.dt, config.dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use simcore::config::{CollisionMode, GravitySolver, IntegratorKind};
    use simcore::Vec2;

    fn config() -> SimulationConfig {
        SimulationConfig {
            gravity_constant: 1.0,
            softening_epsilon: 0.0,
            dt: 1.0,
            dt_policy: DtPolicy::Adaptive,
            integrator: IntegratorKind::VelocityVerlet,
            collision_mode: CollisionMode::Ignore,
            deterministic: false,
            gravity_solver: GravitySolver::Pairwise,
            barnes_hut_theta: 0.5,
            barnes_hut_threshold: 256,
        }
    }

    #[test]
    fn fixed_policy_always_returns_configured_dt() {
        let mut cfg = config();
        cfg.dt_policy = DtPolicy::Fixed;
        let bodies = vec![SimulationBody::new(
            "a",
            1.0,
            1.0,
            Vec2::ZERO,
            Vec2::new(100.0, 0.0),
        )];
        assert_eq!(resolve_dt(&bodies, &cfg), cfg.dt);
    }

    #[test]
    fn adaptive_clamps_into_bounds() {
        let cfg = config();
        let bodies = vec![
            SimulationBody::new("a", 1.0, 1.0, Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)),
            SimulationBody::new("b", 1.0, 1.0, Vec2::new(1.0, 0.0), Vec2::ZERO),
        ];
        let dt_used = resolve_dt(&bodies, &cfg);
        assert!(dt_used >= 0.05 * cfg.dt - 1e-12);
        assert!(dt_used <= cfg.dt + 1e-12);
    }

    #[test]
    fn falls_back_when_all_bodies_are_stationary() {
        let cfg = config();
        let bodies = vec![
            SimulationBody::new("a", 1.0, 1.0, Vec2::new(0.0, 0.0), Vec2::ZERO),
            SimulationBody::new("b", 1.0, 1.0, Vec2::new(1.0, 0.0), Vec2::ZERO),
        ];
        assert_eq!(resolve_dt(&bodies, &cfg), cfg.dt);
    }

    #[test]
    fn falls_back_with_fewer_than_two_live_bodies() {
        let cfg = config();
        let bodies = vec![SimulationBody::new(
            "a",
            1.0,
            1.0,
            Vec2::ZERO,
            Vec2::new(5.0, 0.0),
        )];
        assert_eq!(resolve_dt(&bodies, &cfg), cfg.dt);
    }

    #[test]
    fn never_exceeds_ceiling_even_for_very_close_slow_bodies() {
        let cfg = config();
        let bodies = vec![
            SimulationBody::new("a", 1.0, 1.0, Vec2::new(0.0, 0.0), Vec2::new(1e-9, 0.0)),
            SimulationBody::new("b", 1.0, 1.0, Vec2::new(1e6, 0.0), Vec2::ZERO),
        ];
        assert_eq!(resolve_dt(&bodies, &cfg), cfg.dt);
    }
}
