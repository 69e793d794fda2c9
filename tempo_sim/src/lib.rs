//! `tempo_sim`
//!
//! Simulation-side systems:
//! - Fixed timestep accumulator with a per-frame step cap
//! - Frame clock and FPS counter
//! - Rigid body component bridging transforms to physics bodies
//! - Physics stepper: sync, step, smooth, dispose
//! - A small arena-backed physics world
//!
//! Determinism notes:
//! - Physics only ever advances in whole fixed steps.
//! - Entity iteration follows entity id order.

pub mod accumulator;
pub mod basic_world;
pub mod clock;
pub mod rigid_body;
pub mod stepper;

pub use accumulator::{FixedTimestep, StepPlan};
pub use basic_world::BasicWorld;
pub use clock::{FpsCounter, SimulationClock};
pub use rigid_body::RigidBody;
pub use stepper::{PhysicsStepper, StepStats};
