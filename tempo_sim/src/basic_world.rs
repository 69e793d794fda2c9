//! A small arena-backed rigid-body world.
//!
//! Integrates bodies with semi-implicit Euler under gravity and applied
//! forces. There is no collision detection or constraint solving; the solver
//! iteration counts are accepted and recorded but have nothing to iterate.
//! It exists so the stepper has a concrete engine to drive in the demo and
//! in tests; a real engine plugs in through the same `PhysicsWorld` trait.

use tempo_shared::{
    math::Vec2,
    physics::{BodyDef, BodyId, BodyKind, DebugDrawFlags, PhysicsWorld, Shape},
    render::{Color, DebugDraw},
};

#[derive(Debug, Clone)]
struct Body {
    kind: BodyKind,
    shape: Shape,
    position: Vec2,
    angle: f32,
    linear_velocity: Vec2,
    angular_velocity: f32,
    force: Vec2,
    inv_mass: f32,
    awake: bool,
    enabled: bool,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    body: Option<Body>,
}

/// Arena of bodies addressed by generational `BodyId`s.
#[derive(Debug, Clone)]
pub struct BasicWorld {
    gravity: Vec2,
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    steps_taken: u64,
    last_iterations: (u32, u32),
}

impl BasicWorld {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity,
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            steps_taken: 0,
            last_iterations: (0, 0),
        }
    }

    /// Number of `step` calls so far.
    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    /// Iteration counts passed to the most recent `step`.
    pub fn last_iterations(&self) -> (u32, u32) {
        self.last_iterations
    }

    pub fn is_awake(&self, id: BodyId) -> Option<bool> {
        self.get(id).map(|b| b.awake)
    }

    pub fn is_enabled(&self, id: BodyId) -> Option<bool> {
        self.get(id).map(|b| b.enabled)
    }

    fn get(&self, id: BodyId) -> Option<&Body> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.body.as_ref())
    }

    fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.body.as_mut())
    }
}

fn mass_of(shape: Shape, density: f32) -> f32 {
    let area = match shape {
        Shape::Box { half_extents } => 4.0 * half_extents.x.abs() * half_extents.y.abs(),
        Shape::Circle { radius } => std::f32::consts::PI * radius * radius,
    };
    area * density
}

impl PhysicsWorld for BasicWorld {
    fn create_body(&mut self, def: &BodyDef) -> BodyId {
        let mass = mass_of(def.shape, def.density);
        let body = Body {
            kind: def.kind,
            shape: def.shape,
            position: def.position,
            angle: def.angle,
            linear_velocity: def.linear_velocity,
            angular_velocity: def.angular_velocity,
            force: Vec2::ZERO,
            inv_mass: if mass > 0.0 && mass.is_finite() {
                1.0 / mass
            } else {
                0.0
            },
            awake: true,
            enabled: true,
        };

        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.body = Some(body);
            return BodyId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            body: Some(body),
        });
        BodyId {
            index,
            generation: 0,
        }
    }

    fn destroy_body(&mut self, id: BodyId) -> bool {
        let Some(slot) = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation && slot.body.is_some())
        else {
            return false;
        };
        slot.body = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        true
    }

    fn body_count(&self) -> usize {
        self.live
    }

    fn body_kind(&self, id: BodyId) -> Option<BodyKind> {
        self.get(id).map(|b| b.kind)
    }

    fn position(&self, id: BodyId) -> Option<Vec2> {
        self.get(id).map(|b| b.position)
    }

    fn angle(&self, id: BodyId) -> Option<f32> {
        self.get(id).map(|b| b.angle)
    }

    fn set_transform(&mut self, id: BodyId, position: Vec2, angle: f32) -> bool {
        self.get_mut(id)
            .map(|b| {
                b.position = position;
                b.angle = angle;
            })
            .is_some()
    }

    fn set_awake(&mut self, id: BodyId, awake: bool) -> bool {
        self.get_mut(id).map(|b| b.awake = awake).is_some()
    }

    fn set_enabled(&mut self, id: BodyId, enabled: bool) -> bool {
        self.get_mut(id).map(|b| b.enabled = enabled).is_some()
    }

    fn apply_force(&mut self, id: BodyId, force: Vec2) -> bool {
        self.get_mut(id)
            .map(|b| {
                if b.kind == BodyKind::Dynamic {
                    b.force += force;
                    b.awake = true;
                }
            })
            .is_some()
    }

    fn set_linear_velocity(&mut self, id: BodyId, velocity: Vec2) -> bool {
        self.get_mut(id)
            .map(|b| {
                if b.kind != BodyKind::Static {
                    b.linear_velocity = velocity;
                    b.awake = true;
                }
            })
            .is_some()
    }

    fn linear_velocity(&self, id: BodyId) -> Option<Vec2> {
        self.get(id).map(|b| b.linear_velocity)
    }

    fn step(&mut self, dt: f32, velocity_iterations: u32, position_iterations: u32) {
        self.steps_taken += 1;
        self.last_iterations = (velocity_iterations, position_iterations);

        let gravity = self.gravity;
        for body in self.slots.iter_mut().filter_map(|s| s.body.as_mut()) {
            if !body.enabled || !body.awake {
                continue;
            }
            match body.kind {
                BodyKind::Static => continue,
                BodyKind::Dynamic => {
                    let accel = gravity + body.force * body.inv_mass;
                    body.linear_velocity += accel * dt;
                }
                BodyKind::Kinematic => {}
            }
            body.position += body.linear_velocity * dt;
            body.angle += body.angular_velocity * dt;
        }
    }

    fn clear_forces(&mut self) {
        for body in self.slots.iter_mut().filter_map(|s| s.body.as_mut()) {
            body.force = Vec2::ZERO;
        }
    }

    fn gravity(&self) -> Vec2 {
        self.gravity
    }

    fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    fn draw_debug(&self, flags: DebugDrawFlags, target: &mut dyn DebugDraw) {
        for body in self.slots.iter().filter_map(|s| s.body.as_ref()) {
            if !body.enabled {
                continue;
            }
            let color = match (body.kind, body.awake) {
                (BodyKind::Static, _) => Color::DEBUG_STATIC,
                (BodyKind::Kinematic, _) => Color::DEBUG_KINEMATIC,
                (BodyKind::Dynamic, false) => Color::DEBUG_ASLEEP,
                (BodyKind::Dynamic, true) => Color::DEBUG_DYNAMIC,
            };

            if flags.contains(DebugDrawFlags::SHAPES) {
                match body.shape {
                    Shape::Box { half_extents: h } => {
                        let corners = [
                            Vec2::new(-h.x, -h.y),
                            Vec2::new(h.x, -h.y),
                            Vec2::new(h.x, h.y),
                            Vec2::new(-h.x, h.y),
                        ]
                        .map(|c| body.position + c.rotate(body.angle));
                        target.draw_polygon(&corners, color);
                    }
                    Shape::Circle { radius } => {
                        target.draw_circle(body.position, radius, color);
                        let rim = body.position + Vec2::new(radius, 0.0).rotate(body.angle);
                        target.draw_segment(body.position, rim, color);
                    }
                }
            }
            if flags.contains(DebugDrawFlags::CENTERS) {
                target.draw_circle(body.position, 0.05, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempo_shared::render::RenderFrame;

    fn ball(kind: BodyKind, at: Vec2) -> BodyDef {
        BodyDef::new(kind, at, Shape::Circle { radius: 0.5 })
    }

    #[test]
    fn dynamic_body_falls_static_does_not() {
        let mut world = BasicWorld::new(Vec2::new(0.0, 10.0));
        let d = world.create_body(&ball(BodyKind::Dynamic, Vec2::ZERO));
        let s = world.create_body(&ball(BodyKind::Static, Vec2::ZERO));
        world.step(0.1, 8, 3);

        assert!(world.position(d).unwrap().y > 0.0);
        assert_eq!(world.position(s), Some(Vec2::ZERO));
        assert_eq!(world.last_iterations(), (8, 3));
    }

    #[test]
    fn stale_handles_resolve_to_nothing() {
        let mut world = BasicWorld::new(Vec2::ZERO);
        let a = world.create_body(&ball(BodyKind::Dynamic, Vec2::ZERO));
        assert!(world.destroy_body(a));
        assert!(!world.destroy_body(a));

        let b = world.create_body(&ball(BodyKind::Dynamic, Vec2::new(1.0, 1.0)));
        assert_eq!(b.index, a.index);
        assert_ne!(b.generation, a.generation);
        assert_eq!(world.position(a), None);
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn disabled_bodies_do_not_move() {
        let mut world = BasicWorld::new(Vec2::new(0.0, 10.0));
        let d = world.create_body(&ball(BodyKind::Dynamic, Vec2::ZERO));
        world.set_enabled(d, false);
        world.step(0.5, 8, 3);
        assert_eq!(world.position(d), Some(Vec2::ZERO));
    }

    #[test]
    fn forces_last_until_cleared() {
        let mut world = BasicWorld::new(Vec2::ZERO);
        let d = world.create_body(&ball(BodyKind::Dynamic, Vec2::ZERO));
        world.apply_force(d, Vec2::new(100.0, 0.0));
        world.step(0.1, 8, 3);
        let v1 = world.linear_velocity(d).unwrap();
        world.clear_forces();
        world.step(0.1, 8, 3);
        assert_eq!(world.linear_velocity(d), Some(v1));
        assert!(v1.x > 0.0);
    }

    #[test]
    fn debug_draw_emits_shapes() {
        let mut world = BasicWorld::new(Vec2::ZERO);
        world.create_body(&BodyDef::new(
            BodyKind::Static,
            Vec2::ZERO,
            Shape::Box {
                half_extents: Vec2::new(1.0, 1.0),
            },
        ));
        world.create_body(&ball(BodyKind::Dynamic, Vec2::ZERO));
        let mut frame = RenderFrame::default();
        world.draw_debug(DebugDrawFlags::SHAPES, &mut frame);
        // Box polygon, circle, and the circle's angle marker.
        assert_eq!(frame.debug_shapes.len(), 3);
    }
}
