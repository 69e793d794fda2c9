//! `tempo_shared`
//!
//! Shared libraries used by the simulation and the application layer.
//!
//! Design goals:
//! - Deterministic and modular where practical.
//! - Clear separation of concerns (math, ecs, config, events, rendering, physics).
//! - Traits at the boundaries to external collaborators (window, physics engine).
//! - No `unsafe`.

pub mod config;
pub mod ecs;
pub mod event;
pub mod math;
pub mod physics;
pub mod render;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::config::*;
    pub use crate::ecs::*;
    pub use crate::event::*;
    pub use crate::math::*;
    pub use crate::physics::*;
    pub use crate::render::*;
}
