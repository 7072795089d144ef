//! Collision resolver: detection plus the elastic/inelastic/ignore
//! response policies (§4.4).

use simcore::config::CollisionMode;
use simcore::{SimulationBody, SimulationConfig, Vec2};

/// Positional separation margin applied after an elastic collision to
/// prevent immediate re-entry. Part of the contract, not a tunable.
const ELASTIC_SEPARATION_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionOutcome {
    pub collision_events: u64,
    pub merged_events: u64,
}

/// Runs one collision pass over `bodies`, mutating velocities/positions in
/// place (and, under `InelasticMerge`, compacting dead bodies out of the
/// list afterward). Pairs are processed in ascending `(i, j)` order; a body
/// already dead within this pass is skipped, so cascading merges resolve
/// left to right.
pub fn resolve_collisions(bodies: &mut Vec<SimulationBody>, config: &SimulationConfig) -> CollisionOutcome {
    let mut outcome = CollisionOutcome::default();
    let n = bodies.len();

    for i in 0..n {
        if !bodies[i].alive {
            continue;
        }
        for j in (i + 1)..n {
            if !bodies[j].alive {
                continue;
            }

            let d = (bodies[j].position - bodies[i].position).norm();
            let overlap = bodies[i].radius + bodies[j].radius - d;
            if overlap < 0.0 {
                continue;
            }

            outcome.collision_events += 1;
            match config.collision_mode {
                CollisionMode::Ignore => {}
                CollisionMode::Elastic => {
                    apply_elastic(bodies, i, j, d, overlap);
                }
                CollisionMode::InelasticMerge => {
                    merge_bodies(bodies, i, j);
                    outcome.merged_events += 1;
                }
            }
        }
    }

    if config.collision_mode == CollisionMode::InelasticMerge {
        bodies.retain(|b| b.alive);
    }

    outcome
}

fn apply_elastic(bodies: &mut [SimulationBody], i: usize, j: usize, d: f64, overlap: f64) {
    let (left, right) = bodies.split_at_mut(j);
    let bi = &mut left[i];
    let bj = &mut right[0];

    let n = if d > 0.0 {
        (bj.position - bi.position) / d
    } else {
        Vec2::new(1.0, 0.0)
    };

    let v_n = (bj.velocity - bi.velocity).dot(n);
    if v_n <= 0.0 {
        let impulse = -2.0 * v_n / (1.0 / bi.mass + 1.0 / bj.mass);
        bi.velocity = bi.velocity - n * (impulse / bi.mass);
        bj.velocity = bj.velocity + n * (impulse / bj.mass);
    }

    let push = overlap * 0.5 + ELASTIC_SEPARATION_EPSILON;
    bi.position = bi.position - n * push;
    bj.position = bj.position + n * push;
}

fn merge_bodies(bodies: &mut [SimulationBody], i: usize, j: usize) {
    let absorbed = bodies[j].clone();
    let surviving = &mut bodies[i];

    let total_mass = surviving.mass + absorbed.mass;
    surviving.position =
        (surviving.position * surviving.mass + absorbed.position * absorbed.mass) / total_mass;
    surviving.velocity =
        (surviving.velocity * surviving.mass + absorbed.velocity * absorbed.mass) / total_mass;
    surviving.radius = (surviving.radius * surviving.radius + absorbed.radius * absorbed.radius).sqrt();
    surviving.mass = total_mass;

    bodies[j].alive = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use simcore::config::{DtPolicy, GravitySolver, IntegratorKind};

    fn config(mode: CollisionMode) -> SimulationConfig {
        SimulationConfig {
            gravity_constant: 1.0,
            softening_epsilon: 0.0,
            dt: 0.1,
            dt_policy: DtPolicy::Fixed,
            integrator: IntegratorKind::VelocityVerlet,
            collision_mode: mode,
            deterministic: true,
            gravity_solver: GravitySolver::Pairwise,
            barnes_hut_theta: 0.5,
            barnes_hut_threshold: 256,
        }
    }

    fn head_on_pair() -> Vec<SimulationBody> {
        vec![
            SimulationBody::new("a", 1.0, 1.0, Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0)),
            SimulationBody::new("b", 1.0, 1.0, Vec2::new(1.0, 0.0), Vec2::new(-1.0, 0.0)),
        ]
    }

    #[test]
    fn ignore_counts_but_does_not_mutate() {
        let mut bodies = head_on_pair();
        let before = bodies.clone();
        let outcome = resolve_collisions(&mut bodies, &config(CollisionMode::Ignore));
        assert_eq!(outcome.collision_events, 1);
        assert_eq!(outcome.merged_events, 0);
        assert_eq!(bodies, before);
    }

    #[test]
    fn elastic_swaps_velocities_for_equal_masses() {
        let mut bodies = head_on_pair();
        let outcome = resolve_collisions(&mut bodies, &config(CollisionMode::Elastic));
        assert_eq!(outcome.collision_events, 1);
        assert_eq!(outcome.merged_events, 0);
        assert!((bodies[0].velocity - Vec2::new(-1.0, 0.0)).norm() < 1e-9);
        assert!((bodies[1].velocity - Vec2::new(1.0, 0.0)).norm() < 1e-9);
        assert_eq!(bodies.len(), 2);
    }

    #[test]
    fn inelastic_merge_preserves_momentum_and_mass() {
        let mut bodies = head_on_pair();
        let outcome = resolve_collisions(&mut bodies, &config(CollisionMode::InelasticMerge));
        assert_eq!(outcome.collision_events, 1);
        assert_eq!(outcome.merged_events, 1);
        assert_eq!(bodies.len(), 1);
        assert!((bodies[0].mass - 2.0).abs() < 1e-12);
        assert!((bodies[0].position - Vec2::new(0.0, 0.0)).norm() < 1e-12);
        assert!((bodies[0].velocity - Vec2::new(0.0, 0.0)).norm() < 1e-12);
        assert!((bodies[0].radius - std::f64::consts::SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn merged_body_keeps_slot_i_identity() {
        let mut bodies = head_on_pair();
        bodies[0].label = Some("Keeper".to_string());
        bodies[0].color_value = 0xFF00FF00;
        resolve_collisions(&mut bodies, &config(CollisionMode::InelasticMerge));
        assert_eq!(bodies[0].id, "a");
        assert_eq!(bodies[0].label.as_deref(), Some("Keeper"));
        assert_eq!(bodies[0].color_value, 0xFF00FF00);
    }

    #[test]
    fn cascading_merges_resolve_left_to_right() {
        let mut bodies = vec![
            SimulationBody::new("a", 1.0, 1.0, Vec2::new(0.0, 0.0), Vec2::ZERO),
            SimulationBody::new("b", 1.0, 1.0, Vec2::new(0.5, 0.0), Vec2::ZERO),
            SimulationBody::new("c", 1.0, 1.0, Vec2::new(1.0, 0.0), Vec2::ZERO),
        ];
        let outcome = resolve_collisions(&mut bodies, &config(CollisionMode::InelasticMerge));
        assert_eq!(outcome.merged_events, 2);
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].id, "a");
        assert!((bodies[0].mass - 3.0).abs() < 1e-12);
    }

    #[test]
    fn non_overlapping_bodies_are_not_counted() {
        let mut bodies = vec![
            SimulationBody::new("a", 1.0, 1.0, Vec2::new(0.0, 0.0), Vec2::ZERO),
            SimulationBody::new("b", 1.0, 1.0, Vec2::new(10.0, 0.0), Vec2::ZERO),
        ];
        let outcome = resolve_collisions(&mut bodies, &config(CollisionMode::Elastic));
        assert_eq!(outcome.collision_events, 0);
    }
}
