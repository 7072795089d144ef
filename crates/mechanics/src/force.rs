//! Force solver: pairwise direct summation and the Barnes–Hut
//! approximation, with `auto` selection between them (§4.1).

use simcore::config::GravitySolver;
use simcore::{SimulationBody, SimulationConfig, SolverMode, Vec2};

pub struct ForceResult {
    pub accelerations: Vec<Vec2>,
    pub solver_mode: SolverMode,
}

/// Computes per-body accelerations from `positions`, which need not match
/// the bodies' currently stored positions (integrators call this with
/// provisional positions for intermediate stages).
pub fn compute_accelerations(
    bodies: &[SimulationBody],
    positions: &[Vec2],
    config: &SimulationConfig,
) -> ForceResult {
    let live_count = bodies.iter().filter(|b| b.alive).count() as u32;
    let mode = match config.gravity_solver {
        GravitySolver::Pairwise => SolverMode::Pairwise,
        GravitySolver::BarnesHut => SolverMode::BarnesHut,
        GravitySolver::Auto => {
            if live_count >= config.barnes_hut_threshold {
                SolverMode::BarnesHut
            } else {
                SolverMode::Pairwise
            }
        }
    };
    let accelerations = match mode {
        SolverMode::Pairwise => pairwise_accelerations(bodies, positions, config),
        SolverMode::BarnesHut => barnes_hut_accelerations(bodies, positions, config),
    };
    ForceResult {
        accelerations,
        solver_mode: mode,
    }
}

fn softened_contribution(r: Vec2, mass: f64, g: f64, eps2: f64) -> Option<Vec2> {
    let d2 = r.norm_squared() + eps2;
    if d2 <= 0.0 {
        return None;
    }
    let d = d2.sqrt();
    let d3 = d2 * d;
    Some(r * (g * mass / d3))
}

/// O(N^2) direct summation, iterated in fixed ascending `(i, j)` order so
/// floating-point accumulation order is deterministic.
fn pairwise_accelerations(
    bodies: &[SimulationBody],
    positions: &[Vec2],
    config: &SimulationConfig,
) -> Vec<Vec2> {
    let n = bodies.len();
    let mut acc = vec![Vec2::ZERO; n];
    let eps2 = config.softening_epsilon * config.softening_epsilon;
    let g = config.gravity_constant;

    for i in 0..n {
        if !bodies[i].alive {
            continue;
        }
        for j in (i + 1)..n {
            if !bodies[j].alive {
                continue;
            }
            let r = positions[j] - positions[i];
            if let Some(contribution_on_i) = softened_contribution(r, bodies[j].mass, g, eps2) {
                acc[i] = acc[i] + contribution_on_i;
                let contribution_on_j =
                    softened_contribution(r, bodies[i].mass, g, eps2).unwrap();
                acc[j] = acc[j] - contribution_on_j;
            }
        }
    }
    acc
}

const QUADRANT_NE: usize = 0;
const QUADRANT_NW: usize = 1;
const QUADRANT_SW: usize = 2;
const QUADRANT_SE: usize = 3;
const MIN_HALF_SIZE: f64 = 1e-9;

struct QuadNode {
    center: Vec2,
    half_size: f64,
    mass: f64,
    center_of_mass: Vec2,
    body_index: Option<usize>,
    children: Option<Box<[QuadNode; 4]>>,
}

impl QuadNode {
    fn empty(center: Vec2, half_size: f64) -> Self {
        QuadNode {
            center,
            half_size,
            mass: 0.0,
            center_of_mass: Vec2::ZERO,
            body_index: None,
            children: None,
        }
    }

    /// Canonical corner order: NE, NW, SW, SE — fixed so tree traversal is
    /// deterministic given deterministic insertion order.
    fn quadrant_of(&self, pos: Vec2) -> usize {
        let east = pos.x() >= self.center.x();
        let north = pos.y() >= self.center.y();
        match (east, north) {
            (true, true) => QUADRANT_NE,
            (false, true) => QUADRANT_NW,
            (false, false) => QUADRANT_SW,
            (true, false) => QUADRANT_SE,
        }
    }

    fn child_center(&self, quadrant: usize) -> Vec2 {
        let q = self.half_size / 2.0;
        match quadrant {
            QUADRANT_NE => Vec2::new(self.center.x() + q, self.center.y() + q),
            QUADRANT_NW => Vec2::new(self.center.x() - q, self.center.y() + q),
            QUADRANT_SW => Vec2::new(self.center.x() - q, self.center.y() - q),
            QUADRANT_SE => Vec2::new(self.center.x() + q, self.center.y() - q),
            _ => unreachable!("quadrant index is always in 0..4"),
        }
    }

    fn make_children(&self) -> Box<[QuadNode; 4]> {
        let half = self.half_size / 2.0;
        Box::new([
            QuadNode::empty(self.child_center(QUADRANT_NE), half),
            QuadNode::empty(self.child_center(QUADRANT_NW), half),
            QuadNode::empty(self.child_center(QUADRANT_SW), half),
            QuadNode::empty(self.child_center(QUADRANT_SE), half),
        ])
    }

    fn insert(&mut self, idx: usize, pos: Vec2, mass: f64) {
        if self.children.is_none() && self.body_index.is_none() && self.mass == 0.0 {
            self.body_index = Some(idx);
            self.mass = mass;
            self.center_of_mass = pos;
            return;
        }

        if self.half_size < MIN_HALF_SIZE {
            // Bodies coincide (or nearly so) at the resolution this tree
            // can subdivide to; fold into this node's aggregate rather
            // than recursing forever.
            let total = self.mass + mass;
            self.center_of_mass = (self.center_of_mass * self.mass + pos * mass) / total;
            self.mass = total;
            self.body_index = None;
            return;
        }

        if self.children.is_none() {
            let existing_idx = self.body_index.take().unwrap();
            let existing_pos = self.center_of_mass;
            let existing_mass = self.mass;
            self.children = Some(self.make_children());
            let q = self.quadrant_of(existing_pos);
            self.children.as_mut().unwrap()[q].insert(existing_idx, existing_pos, existing_mass);
        }

        let q = self.quadrant_of(pos);
        self.children.as_mut().unwrap()[q].insert(idx, pos, mass);

        let total = self.mass + mass;
        self.center_of_mass = (self.center_of_mass * self.mass + pos * mass) / total;
        self.mass = total;
    }

    fn accumulate(
        &self,
        query_pos: Vec2,
        exclude_idx: usize,
        theta: f64,
        g: f64,
        eps2: f64,
        out: &mut Vec2,
    ) {
        if self.mass <= 0.0 {
            return;
        }
        match &self.children {
            None => {
                if self.body_index == Some(exclude_idx) {
                    return;
                }
                let r = self.center_of_mass - query_pos;
                if let Some(contribution) = softened_contribution(r, self.mass, g, eps2) {
                    *out = *out + contribution;
                }
            }
            Some(children) => {
                let r = self.center_of_mass - query_pos;
                let d = r.norm();
                let size = self.half_size * 2.0;
                if d > 0.0 && size / d < theta {
                    if let Some(contribution) = softened_contribution(r, self.mass, g, eps2) {
                        *out = *out + contribution;
                    }
                } else {
                    // Fixed NE, NW, SW, SE traversal order.
                    for child in children.iter() {
                        child.accumulate(query_pos, exclude_idx, theta, g, eps2, out);
                    }
                }
            }
        }
    }
}

struct QuadTree {
    root: QuadNode,
}

impl QuadTree {
    /// Builds a tree over the bounding box of `positions` at `live_indices`,
    /// recomputed from the live extremes with a small padding epsilon.
    /// Bodies are inserted in ascending index order for determinism.
    fn build(live_indices: &[usize], positions: &[Vec2], bodies: &[SimulationBody]) -> Self {
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for &i in live_indices {
            let p = positions[i];
            min_x = min_x.min(p.x());
            max_x = max_x.max(p.x());
            min_y = min_y.min(p.y());
            max_y = max_y.max(p.y());
        }

        const PADDING: f64 = 1e-6;
        let center = Vec2::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
        let half_size = ((max_x - min_x).max(max_y - min_y) / 2.0 + PADDING).max(1.0);

        let mut root = QuadNode::empty(center, half_size);
        for &i in live_indices {
            root.insert(i, positions[i], bodies[i].mass);
        }
        QuadTree { root }
    }

    fn accumulate(
        &self,
        query_pos: Vec2,
        exclude_idx: usize,
        theta: f64,
        g: f64,
        eps2: f64,
        out: &mut Vec2,
    ) {
        self.root
            .accumulate(query_pos, exclude_idx, theta, g, eps2, out);
    }
}

fn barnes_hut_accelerations(
    bodies: &[SimulationBody],
    positions: &[Vec2],
    config: &SimulationConfig,
) -> Vec<Vec2> {
    let n = bodies.len();
    let mut acc = vec![Vec2::ZERO; n];
    let live_indices: Vec<usize> = (0..n).filter(|&i| bodies[i].alive).collect();
    if live_indices.is_empty() {
        return acc;
    }

    let tree = QuadTree::build(&live_indices, positions, bodies);
    let eps2 = config.softening_epsilon * config.softening_epsilon;
    for &i in &live_indices {
        let mut a = Vec2::ZERO;
        tree.accumulate(
            positions[i],
            i,
            config.barnes_hut_theta,
            config.gravity_constant,
            eps2,
            &mut a,
        );
        acc[i] = a;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use simcore::config::{CollisionMode, DtPolicy, IntegratorKind};

    fn two_body_config(solver: GravitySolver) -> SimulationConfig {
        SimulationConfig {
            gravity_constant: 1.0,
            softening_epsilon: 0.0,
            dt: 0.01,
            dt_policy: DtPolicy::Fixed,
            integrator: IntegratorKind::VelocityVerlet,
            collision_mode: CollisionMode::Ignore,
            deterministic: true,
            gravity_solver: solver,
            barnes_hut_theta: 0.5,
            barnes_hut_threshold: 1,
        }
    }

    fn body(id: &str, mass: f64, x: f64, y: f64) -> SimulationBody {
        SimulationBody::new(id, mass, 1.0, Vec2::new(x, y), Vec2::ZERO)
    }

    #[test]
    fn pairwise_accelerations_are_equal_and_opposite() {
        let bodies = vec![body("a", 2.0, 0.0, 0.0), body("b", 3.0, 4.0, 0.0)];
        let positions: Vec<Vec2> = bodies.iter().map(|b| b.position).collect();
        let config = two_body_config(GravitySolver::Pairwise);
        let result = compute_accelerations(&bodies, &positions, &config);
        // a_i * m_i == -a_j * m_j (Newton's third law)
        let pi = result.accelerations[0] * bodies[0].mass;
        let pj = result.accelerations[1] * bodies[1].mass;
        assert!((pi.x() + pj.x()).abs() < 1e-12);
        assert!((pi.y() + pj.y()).abs() < 1e-12);
        assert!(result.accelerations[0].x() > 0.0);
        assert!(result.accelerations[1].x() < 0.0);
    }

    #[test]
    fn dead_bodies_contribute_and_receive_zero_force() {
        let mut bodies = vec![body("a", 2.0, 0.0, 0.0), body("b", 3.0, 4.0, 0.0)];
        bodies[1].alive = false;
        let positions: Vec<Vec2> = bodies.iter().map(|b| b.position).collect();
        let config = two_body_config(GravitySolver::Pairwise);
        let result = compute_accelerations(&bodies, &positions, &config);
        assert_eq!(result.accelerations[0], Vec2::ZERO);
        assert_eq!(result.accelerations[1], Vec2::ZERO);
    }

    #[test]
    fn auto_selects_pairwise_below_threshold_and_barnes_hut_above() {
        let mut config = two_body_config(GravitySolver::Auto);
        config.barnes_hut_threshold = 3;
        let bodies = vec![body("a", 1.0, 0.0, 0.0), body("b", 1.0, 1.0, 0.0)];
        let positions: Vec<Vec2> = bodies.iter().map(|b| b.position).collect();
        let result = compute_accelerations(&bodies, &positions, &config);
        assert_eq!(result.solver_mode, SolverMode::Pairwise);

        let bodies3 = vec![
            body("a", 1.0, 0.0, 0.0),
            body("b", 1.0, 1.0, 0.0),
            body("c", 1.0, -1.0, 2.0),
        ];
        let positions3: Vec<Vec2> = bodies3.iter().map(|b| b.position).collect();
        let result3 = compute_accelerations(&bodies3, &positions3, &config);
        assert_eq!(result3.solver_mode, SolverMode::BarnesHut);
    }

    #[test]
    fn barnes_hut_matches_pairwise_within_tolerance_on_a_cluster() {
        let mut bodies = Vec::new();
        let mut seed: u64 = 88172645463325252;
        let mut next = || {
            // xorshift64 for a reproducible pseudo-random cluster
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            (seed as f64 / u64::MAX as f64) * 2.0 - 1.0
        };
        for i in 0..40 {
            let x = next() * 50.0;
            let y = next() * 50.0;
            bodies.push(body(&format!("b{i}"), 1.0 + next().abs() * 5.0, x, y));
        }
        let positions: Vec<Vec2> = bodies.iter().map(|b| b.position).collect();

        let mut pairwise_cfg = two_body_config(GravitySolver::Pairwise);
        pairwise_cfg.softening_epsilon = 0.1;
        let mut bh_cfg = two_body_config(GravitySolver::BarnesHut);
        bh_cfg.softening_epsilon = 0.1;
        bh_cfg.barnes_hut_theta = 0.6;

        let pairwise = compute_accelerations(&bodies, &positions, &pairwise_cfg);
        let bh = compute_accelerations(&bodies, &positions, &bh_cfg);

        for i in 0..bodies.len() {
            let pw = pairwise.accelerations[i];
            let approx = bh.accelerations[i];
            let scale = pw.norm().max(1e-9);
            assert!(
                (pw - approx).norm() / scale < 0.05,
                "body {i} diverged: pairwise={pw:?} barnes_hut={approx:?}"
            );
        }
    }
}
