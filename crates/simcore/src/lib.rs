//! Core value types shared by every crate in this workspace: 2-D vector
//! arithmetic, the body and config model, simulation state, and the error
//! families used throughout (§3, §7).

pub mod body;
pub mod config;
pub mod edit;
pub mod error;
pub mod state;
pub mod vec2;

pub use body::SimulationBody;
pub use config::{CollisionMode, DtPolicy, GravitySolver, IntegratorKind, SimulationConfig};
pub use edit::{BodyDelete, BodyEdit, BodyUpdate, MetadataPatch};
pub use error::{EngineError, ValidationError, ValidationIssue};
pub use state::{SimulationState, SolverMode, StepSummary};
pub use vec2::Vec2;
