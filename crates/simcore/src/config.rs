//! Simulation configuration: integrator/collision/solver selection and the
//! numeric knobs that drive them.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DtPolicy {
    Fixed,
    Adaptive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IntegratorKind {
    SemiImplicitEuler,
    VelocityVerlet,
    Rk4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollisionMode {
    Elastic,
    InelasticMerge,
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GravitySolver {
    Pairwise,
    BarnesHut,
    Auto,
}

/// Tunable parameters governing one simulation run.
///
/// `validate` enforces the cross-field invariants from §3: `deterministic`
/// implies fixed-dt, and every positive-only field is actually positive and
/// finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    pub gravity_constant: f64,
    pub softening_epsilon: f64,
    pub dt: f64,
    pub dt_policy: DtPolicy,
    pub integrator: IntegratorKind,
    pub collision_mode: CollisionMode,
    pub deterministic: bool,
    pub gravity_solver: GravitySolver,
    pub barnes_hut_theta: f64,
    pub barnes_hut_threshold: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            gravity_constant: 1.0,
            softening_epsilon: 1e-3,
            dt: 0.005,
            dt_policy: DtPolicy::Fixed,
            integrator: IntegratorKind::VelocityVerlet,
            collision_mode: CollisionMode::InelasticMerge,
            deterministic: true,
            gravity_solver: GravitySolver::Auto,
            barnes_hut_theta: 0.6,
            barnes_hut_threshold: 256,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.gravity_constant.is_finite() && self.gravity_constant > 0.0) {
            return Err(ValidationError::new("gravityConstant must be finite and > 0"));
        }
        if !(self.softening_epsilon.is_finite() && self.softening_epsilon >= 0.0) {
            return Err(ValidationError::new("softeningEpsilon must be finite and >= 0"));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ValidationError::new("dt must be finite and > 0"));
        }
        if !(self.barnes_hut_theta.is_finite()
            && self.barnes_hut_theta > 0.0
            && self.barnes_hut_theta <= 2.0)
        {
            return Err(ValidationError::new("barnesHutTheta must be in (0, 2]"));
        }
        if self.barnes_hut_threshold < 1 {
            return Err(ValidationError::new("barnesHutThreshold must be >= 1"));
        }
        if self.deterministic && self.dt_policy != DtPolicy::Fixed {
            return Err(ValidationError::new(
                "deterministic mode requires dtPolicy = fixed; adaptive is incompatible with deterministic replay",
            ));
        }
        Ok(())
    }

    /// A deterministic textual hash of every config field, joined with `|`
    /// and floats formatted in a fixed 12-digit decimal-exponent form so
    /// the same config hashes identically across implementations.
    ///
    /// Any two configs that hash equal are behaviorally identical within
    /// the integrator; this is a pure function of `self`, never of field
    /// insertion order in a JSON document.
    pub fn config_hash(&self) -> String {
        let parts = [
            fmt_f64(self.gravity_constant),
            fmt_f64(self.softening_epsilon),
            fmt_f64(self.dt),
            dt_policy_tag(self.dt_policy).to_string(),
            integrator_tag(self.integrator).to_string(),
            collision_mode_tag(self.collision_mode).to_string(),
            self.deterministic.to_string(),
            gravity_solver_tag(self.gravity_solver).to_string(),
            fmt_f64(self.barnes_hut_theta),
            self.barnes_hut_threshold.to_string(),
        ];
        parts.join("|")
    }
}

/// Formats `value` as a 12-fraction-digit decimal-exponent string, matching
/// C's `"%.12e"` byte-for-byte: a signless mantissa, then `e`, then an
/// explicitly signed, zero-padded (minimum 2 digit) exponent.
///
/// Rust's own `{:.12e}` gets the mantissa right but omits the exponent's
/// sign and zero-padding (e.g. `"6.000000000000e-1"` instead of
/// `"6.000000000000e-01"`), which would make a hash computed here diverge
/// from one computed by another implementation reading the same config.
pub fn fmt_f64(value: f64) -> String {
    let formatted = format!("{:.12e}", value);
    let (mantissa, exponent) = formatted
        .split_once('e')
        .expect("Rust's exponential format always contains 'e'");
    let exp: i32 = exponent
        .parse()
        .expect("Rust's exponent is always a valid integer");
    format!("{mantissa}e{exp:+03}")
}

fn dt_policy_tag(p: DtPolicy) -> &'static str {
    match p {
        DtPolicy::Fixed => "fixed",
        DtPolicy::Adaptive => "adaptive",
    }
}

fn integrator_tag(i: IntegratorKind) -> &'static str {
    match i {
        IntegratorKind::SemiImplicitEuler => "semiImplicitEuler",
        IntegratorKind::VelocityVerlet => "velocityVerlet",
        IntegratorKind::Rk4 => "rk4",
    }
}

fn collision_mode_tag(c: CollisionMode) -> &'static str {
    match c {
        CollisionMode::Elastic => "elastic",
        CollisionMode::InelasticMerge => "inelasticMerge",
        CollisionMode::Ignore => "ignore",
    }
}

fn gravity_solver_tag(g: GravitySolver) -> &'static str {
    match g {
        GravitySolver::Pairwise => "pairwise",
        GravitySolver::BarnesHut => "barnesHut",
        GravitySolver::Auto => "auto",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn adaptive_deterministic_is_rejected() {
        let mut cfg = SimulationConfig::default();
        cfg.dt_policy = DtPolicy::Adaptive;
        cfg.deterministic = true;
        let err = cfg.validate().unwrap_err();
        assert!(err.0.contains("adaptive") || err.0.to_lowercase().contains("deterministic"));
    }

    #[test]
    fn adaptive_non_deterministic_is_allowed() {
        let mut cfg = SimulationConfig::default();
        cfg.dt_policy = DtPolicy::Adaptive;
        cfg.deterministic = false;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn hash_insensitive_to_construction_order_and_stable() {
        let a = SimulationConfig::default();
        let b = SimulationConfig {
            barnes_hut_threshold: 256,
            gravity_constant: 1.0,
            ..SimulationConfig::default()
        };
        assert_eq!(a.config_hash(), b.config_hash());
    }

    #[test]
    fn hash_differs_on_meaningful_change() {
        let a = SimulationConfig::default();
        let mut b = a;
        b.gravity_constant = 2.0;
        assert_ne!(a.config_hash(), b.config_hash());
    }

    #[test]
    fn rejects_bad_theta() {
        let mut cfg = SimulationConfig::default();
        cfg.barnes_hut_theta = 0.0;
        assert!(cfg.validate().is_err());
        cfg.barnes_hut_theta = 2.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn fmt_f64_matches_c_percent_12e_byte_for_byte() {
        assert_eq!(fmt_f64(0.6), "6.000000000000e-01");
        assert_eq!(fmt_f64(1.0), "1.000000000000e+00");
        assert_eq!(fmt_f64(-0.6), "-6.000000000000e-01");
        assert_eq!(fmt_f64(256.0), "2.560000000000e+02");
        assert_eq!(fmt_f64(1e-3), "1.000000000000e-03");
        assert_eq!(fmt_f64(0.0), "0.000000000000e+00");
    }
}
