//! `tempo_app`
//!
//! Application layer:
//! - Engine context and frame loop (single- or dual-task rendering)
//! - Lifecycle status shared with the render task
//! - Mutex-guarded shared surface and the render task
//! - Scenes with fallible lifecycle hooks
//! - Developer console with physics bindings

pub mod console;
pub mod engine;
pub mod error;
pub mod scene;
pub mod status;
pub mod surface;

pub use console::Console;
pub use engine::Engine;
pub use error::LifecycleError;
pub use scene::{QuitOutcome, QuitResponse, Scene, SceneContext};
pub use status::{SharedStatus, Status};
pub use surface::SharedSurface;
