//! Physical dynamics: force solver, integrator family, adaptive timestep
//! policy, and collision resolver (§4.1–§4.4).

pub mod collision;
pub mod force;
pub mod integrator;
pub mod timestep;

pub use collision::{resolve_collisions, CollisionOutcome};
pub use force::{compute_accelerations, ForceResult};
pub use integrator::{integrate, IntegrationResult};
pub use timestep::resolve_dt;
