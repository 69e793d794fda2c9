//! Physics abstraction.
//!
//! The rigid-body engine is an external collaborator. This module only
//! describes what the simulation needs from it. All values crossing this
//! boundary are in physics units.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::{math::Vec2, render::DebugDraw};

/// Physics parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    #[serde(default = "default_gravity")]
    pub gravity: Vec2,
    #[serde(default = "default_velocity_iterations")]
    pub velocity_iterations: u32,
    #[serde(default = "default_position_iterations")]
    pub position_iterations: u32,
}

fn default_gravity() -> Vec2 {
    Vec2::new(0.0, 10.0)
}

fn default_velocity_iterations() -> u32 {
    8
}

fn default_position_iterations() -> u32 {
    3
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            velocity_iterations: default_velocity_iterations(),
            position_iterations: default_position_iterations(),
        }
    }
}

/// Handle to a body owned by a `PhysicsWorld`.
///
/// The generation makes stale handles to a reused slot resolve to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyId {
    pub index: u32,
    pub generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    Static,
    Kinematic,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Axis-aligned box in body space, given by half extents.
    Box { half_extents: Vec2 },
    Circle { radius: f32 },
}

/// Body creation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyDef {
    pub kind: BodyKind,
    pub position: Vec2,
    pub angle: f32,
    pub shape: Shape,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub density: f32,
}

impl BodyDef {
    pub fn new(kind: BodyKind, position: Vec2, shape: Shape) -> Self {
        Self {
            kind,
            position,
            angle: 0.0,
            shape,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            density: 1.0,
        }
    }
}

bitflags! {
    /// What the debug-draw pass should emit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DebugDrawFlags: u32 {
        const SHAPES = 1 << 0;
        const CENTERS = 1 << 1;
    }
}

impl Default for DebugDrawFlags {
    fn default() -> Self {
        Self::SHAPES
    }
}

/// The external rigid-body engine.
///
/// Every per-body accessor returns `None`/`false` for unknown or destroyed
/// bodies instead of failing.
pub trait PhysicsWorld: Send {
    fn create_body(&mut self, def: &BodyDef) -> BodyId;
    /// Returns true if the body existed.
    fn destroy_body(&mut self, id: BodyId) -> bool;
    fn body_count(&self) -> usize;

    fn body_kind(&self, id: BodyId) -> Option<BodyKind>;
    fn position(&self, id: BodyId) -> Option<Vec2>;
    fn angle(&self, id: BodyId) -> Option<f32>;
    fn set_transform(&mut self, id: BodyId, position: Vec2, angle: f32) -> bool;
    fn set_awake(&mut self, id: BodyId, awake: bool) -> bool;
    /// Disabled bodies are skipped by `step`.
    fn set_enabled(&mut self, id: BodyId, enabled: bool) -> bool;
    fn apply_force(&mut self, id: BodyId, force: Vec2) -> bool;
    fn set_linear_velocity(&mut self, id: BodyId, velocity: Vec2) -> bool;
    fn linear_velocity(&self, id: BodyId) -> Option<Vec2>;

    /// Advances the world by exactly `dt` seconds.
    fn step(&mut self, dt: f32, velocity_iterations: u32, position_iterations: u32);
    /// Drops forces applied since the last call.
    fn clear_forces(&mut self);

    fn gravity(&self) -> Vec2;
    fn set_gravity(&mut self, gravity: Vec2);

    /// Emits debug geometry in physics units.
    fn draw_debug(&self, flags: DebugDrawFlags, target: &mut dyn DebugDraw);
}

/// No-op physics.
#[derive(Default)]
pub struct NullPhysics {
    gravity: Vec2,
}

impl PhysicsWorld for NullPhysics {
    fn create_body(&mut self, _def: &BodyDef) -> BodyId {
        BodyId {
            index: u32::MAX,
            generation: 0,
        }
    }
    fn destroy_body(&mut self, _id: BodyId) -> bool {
        false
    }
    fn body_count(&self) -> usize {
        0
    }
    fn body_kind(&self, _id: BodyId) -> Option<BodyKind> {
        None
    }
    fn position(&self, _id: BodyId) -> Option<Vec2> {
        None
    }
    fn angle(&self, _id: BodyId) -> Option<f32> {
        None
    }
    fn set_transform(&mut self, _id: BodyId, _position: Vec2, _angle: f32) -> bool {
        false
    }
    fn set_awake(&mut self, _id: BodyId, _awake: bool) -> bool {
        false
    }
    fn set_enabled(&mut self, _id: BodyId, _enabled: bool) -> bool {
        false
    }
    fn apply_force(&mut self, _id: BodyId, _force: Vec2) -> bool {
        false
    }
    fn set_linear_velocity(&mut self, _id: BodyId, _velocity: Vec2) -> bool {
        false
    }
    fn linear_velocity(&self, _id: BodyId) -> Option<Vec2> {
        None
    }
    fn step(&mut self, _dt: f32, _velocity_iterations: u32, _position_iterations: u32) {}
    fn clear_forces(&mut self) {}
    fn gravity(&self) -> Vec2 {
        self.gravity
    }
    fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }
    fn draw_debug(&self, _flags: DebugDrawFlags, _target: &mut dyn DebugDraw) {}
}
