//! Physics stepper.
//!
//! Owns the physics world and advances it in fixed steps, independent of the
//! frame rate. Visual transforms are blended between the last two physics
//! poses so rendering stays smooth when frames and steps do not line up.
//!
//! Per-frame order, which must not be reordered:
//! 1. push edited transforms into out-of-sync bodies
//! 2. for each step to run: record smoothing poses, then step
//! 3. clear forces
//! 4. interpolate transforms and destroy queued bodies
//!
//! Physics space and visual space differ by a linear `scale`
//! (visual = physics * scale). Every value crossing between the ECS and the
//! physics world is converted here.

use std::time::Duration;

use tempo_shared::{
    config::EngineConfig,
    ecs::{EntityId, Transform, World},
    math::{lerp_angle, Vec2},
    physics::{BodyDef, BodyId, BodyKind, DebugDrawFlags, PhysicsWorld, Shape},
    render::{Color, DebugDraw},
};
use tracing::debug;

use crate::{
    accumulator::{FixedTimestep, StepPlan},
    basic_world::BasicWorld,
    rigid_body::RigidBody,
};

/// Running totals, mostly for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    pub frames: u64,
    pub steps_run: u64,
    pub steps_discarded: u64,
    pub bodies_disposed: u64,
}

/// The physics subsystem of a scene.
pub struct PhysicsStepper {
    world: Box<dyn PhysicsWorld>,
    timestep: FixedTimestep,
    scale: f32,
    velocity_iterations: u32,
    position_iterations: u32,
    debug_flags: DebugDrawFlags,
    stats: StepStats,
    /// Bodies of components removed through `detach`, destroyed at the
    /// next disposal point.
    detached: Vec<BodyId>,
}

impl PhysicsStepper {
    /// Wraps `world`, applying the configured gravity.
    pub fn new(mut world: Box<dyn PhysicsWorld>, cfg: &EngineConfig) -> Self {
        world.set_gravity(cfg.physics.gravity);
        Self {
            world,
            timestep: FixedTimestep::new(cfg.fixed_step(), cfg.max_steps_per_frame),
            scale: cfg.pixels_per_meter,
            velocity_iterations: cfg.physics.velocity_iterations,
            position_iterations: cfg.physics.position_iterations,
            debug_flags: DebugDrawFlags::default(),
            stats: StepStats::default(),
            detached: Vec::new(),
        }
    }

    /// Stepper over a fresh `BasicWorld`.
    pub fn with_basic_world(cfg: &EngineConfig) -> Self {
        Self::new(Box::new(BasicWorld::new(cfg.physics.gravity)), cfg)
    }

    /// Runs one frame's worth of physics for `elapsed` wall time.
    pub fn update(&mut self, entities: &mut World, elapsed: Duration) -> StepPlan {
        self.park_queued_bodies(entities);

        let plan = self.timestep.advance(elapsed.as_secs_f64());
        let dt = self.timestep.fixed_step() as f32;

        self.synchronize_out_of_sync_bodies(entities);
        for _ in 0..plan.steps_to_run {
            self.prepare_step_smoothing(entities);
            self.run_fixed_step(dt);
        }
        self.clear_accumulated_forces();

        self.interpolate(entities, self.timestep.interpolation_fraction());
        let disposed = self.dispose_queued_bodies(entities);

        let stats = &mut self.stats;
        stats.frames = stats.frames.saturating_add(1);
        stats.steps_run = stats.steps_run.saturating_add(u64::from(plan.steps_to_run));
        stats.steps_discarded = stats.steps_discarded.saturating_add(plan.discarded());
        stats.bodies_disposed = stats.bodies_disposed.saturating_add(disposed as u64);
        if plan.discarded() > 0 {
            debug!(
                steps_due = plan.steps_due,
                steps_run = plan.steps_to_run,
                discarded = plan.discarded(),
                "Step cap hit, dropping simulated time"
            );
        }
        plan
    }

    /// Pushes the transform of every out-of-sync entity into its body.
    ///
    /// The flag stays set on entities without a body until one is attached.
    pub fn synchronize_out_of_sync_bodies(&mut self, entities: &mut World) {
        let world = &mut self.world;
        let scale = self.scale;
        entities.each_mut::<Transform, RigidBody, _>(|_, t, rb| {
            let Some(body) = rb.body else {
                return;
            };
            if !rb.out_of_sync {
                return;
            }
            let position = t.position / scale;
            world.set_transform(body, position, t.rotation);
            world.set_awake(body, true);
            rb.previous_position = position;
            rb.previous_angle = t.rotation;
            rb.out_of_sync = false;
        });
    }

    /// Records the current pose of every moving body as its smoothing origin.
    pub fn prepare_step_smoothing(&mut self, entities: &mut World) {
        let world = &self.world;
        entities.each_mut::<Transform, RigidBody, _>(|_, _, rb| {
            let Some(body) = rb.body else {
                return;
            };
            if matches!(world.body_kind(body), None | Some(BodyKind::Static)) {
                return;
            }
            if let (Some(position), Some(angle)) = (world.position(body), world.angle(body)) {
                rb.previous_position = position;
                rb.previous_angle = angle;
            }
        });
    }

    /// Advances the physics world by exactly `dt` seconds.
    pub fn run_fixed_step(&mut self, dt: f32) {
        self.world
            .step(dt, self.velocity_iterations, self.position_iterations);
    }

    /// Forces are applied for a single frame only.
    pub fn clear_accumulated_forces(&mut self) {
        self.world.clear_forces();
    }

    /// Sets every moving entity's transform to
    /// `fraction * current + (1 - fraction) * previous`, with rotation blended
    /// along the shortest arc.
    pub fn interpolate(&mut self, entities: &mut World, fraction: f32) {
        let world = &self.world;
        let scale = self.scale;
        entities.each_mut::<Transform, RigidBody, _>(|_, t, rb| {
            let Some(body) = rb.body else {
                return;
            };
            if matches!(world.body_kind(body), None | Some(BodyKind::Static)) {
                return;
            }
            let (Some(position), Some(angle)) = (world.position(body), world.angle(body)) else {
                return;
            };
            t.position = rb.previous_position.lerp(position, fraction) * scale;
            t.rotation = lerp_angle(rb.previous_angle, angle, fraction);
        });
    }

    /// Destroys every queued body and empties the queues. Returns how many
    /// bodies were actually destroyed.
    pub fn dispose_queued_bodies(&mut self, entities: &mut World) -> usize {
        let world = &mut self.world;
        let queued = entities
            .iter_mut::<RigidBody>()
            .flat_map(|(_, rb)| rb.dispose_list.drain(..))
            .chain(self.detached.drain(..));
        let destroyed = queued.filter(|&body| world.destroy_body(body)).count();
        if destroyed > 0 {
            debug!(destroyed, remaining = world.body_count(), "Disposed queued bodies");
        }
        destroyed
    }

    /// Queued bodies stay in the world until the disposal point; keep the
    /// steps of this frame from moving them.
    fn park_queued_bodies(&mut self, entities: &World) {
        let queued = entities
            .iter::<RigidBody>()
            .flat_map(|(_, rb)| rb.dispose_list.iter())
            .chain(&self.detached);
        for &body in queued {
            self.world.set_enabled(body, false);
        }
    }

    /// Removes the `RigidBody` of `entity`. Its body and anything it had
    /// queued are destroyed at the end of the next frame, like
    /// `RigidBody::queue_dispose`. Removing the component straight from the
    /// `World` leaves its bodies alive.
    pub fn detach(&mut self, entities: &mut World, entity: EntityId) -> Option<RigidBody> {
        let mut rb = entities.remove::<RigidBody>(entity)?;
        rb.queue_dispose();
        self.detached.extend(rb.dispose_list.drain(..));
        debug!(entity = ?entity, queued = self.detached.len(), "Detached rigid body");
        Some(rb)
    }

    /// Creates a body for `entity` from a visual-space definition and
    /// attaches it. The entity's transform, if present, overrides the
    /// definition's pose; otherwise one is inserted from it. A body already
    /// attached to the entity is queued for disposal.
    pub fn attach_body(&mut self, entities: &mut World, entity: EntityId, def: &BodyDef) -> BodyId {
        let transform = match entities.get::<Transform>(entity) {
            Some(t) => *t,
            None => {
                let t = Transform::new(def.position, def.angle);
                entities.insert(entity, t);
                t
            }
        };

        let physics_def = BodyDef {
            position: transform.position / self.scale,
            angle: transform.rotation,
            shape: match def.shape {
                Shape::Box { half_extents } => Shape::Box {
                    half_extents: half_extents / self.scale,
                },
                Shape::Circle { radius } => Shape::Circle {
                    radius: radius / self.scale,
                },
            },
            linear_velocity: def.linear_velocity / self.scale,
            ..*def
        };
        let body = self.world.create_body(&physics_def);

        if entities.get::<RigidBody>(entity).is_none() {
            entities.insert(entity, RigidBody::new());
        }
        if let Some(rb) = entities.get_mut::<RigidBody>(entity) {
            rb.attach(body);
            rb.out_of_sync = false;
            rb.previous_position = physics_def.position;
            rb.previous_angle = physics_def.angle;
        }
        debug!(entity = ?entity, body = ?body, "Attached rigid body");
        body
    }

    /// Applies a visual-space force to `body` for this frame.
    pub fn apply_force(&mut self, body: BodyId, force: Vec2) -> bool {
        self.world.apply_force(body, force / self.scale)
    }

    /// Gravity in visual units.
    pub fn gravity(&self) -> Vec2 {
        self.to_visual(self.world.gravity())
    }

    /// Sets gravity from visual units.
    pub fn set_gravity(&mut self, gravity: Vec2) {
        let g = self.to_physics(gravity);
        self.world.set_gravity(g);
    }

    /// Scales the current gravity by `m` on both axes.
    pub fn set_gravity_multiplier(&mut self, m: f32) {
        let g = self.gravity();
        self.set_gravity(g * m);
    }

    /// Live bodies in the physics world, including ones queued for disposal.
    pub fn body_count(&self) -> usize {
        self.world.body_count()
    }

    /// Body position in visual units.
    pub fn body_position(&self, body: BodyId) -> Option<Vec2> {
        self.world.position(body).map(|p| self.to_visual(p))
    }

    pub fn to_visual(&self, v: Vec2) -> Vec2 {
        v * self.scale
    }

    pub fn to_physics(&self, v: Vec2) -> Vec2 {
        v / self.scale
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn timestep(&self) -> &FixedTimestep {
        &self.timestep
    }

    pub fn stats(&self) -> StepStats {
        self.stats
    }

    pub fn set_debug_flags(&mut self, flags: DebugDrawFlags) {
        self.debug_flags = flags;
    }

    pub fn world(&self) -> &dyn PhysicsWorld {
        self.world.as_ref()
    }

    pub fn world_mut(&mut self) -> &mut dyn PhysicsWorld {
        self.world.as_mut()
    }

    /// Asks the physics world to draw its debug geometry into `target`,
    /// converted to visual units.
    pub fn debug_draw(&self, target: &mut dyn DebugDraw) {
        let mut scaled = ScaledDraw {
            inner: target,
            scale: self.scale,
        };
        self.world.draw_debug(self.debug_flags, &mut scaled);
    }
}

/// Converts physics-space debug geometry to visual space on the way through.
struct ScaledDraw<'a> {
    inner: &'a mut dyn DebugDraw,
    scale: f32,
}

impl DebugDraw for ScaledDraw<'_> {
    fn draw_polygon(&mut self, vertices: &[Vec2], color: Color) {
        let scaled: Vec<Vec2> = vertices.iter().map(|v| *v * self.scale).collect();
        self.inner.draw_polygon(&scaled, color);
    }

    fn draw_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.inner
            .draw_circle(center * self.scale, radius * self.scale, color);
    }

    fn draw_segment(&mut self, from: Vec2, to: Vec2, color: Color) {
        self.inner
            .draw_segment(from * self.scale, to * self.scale, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempo_shared::{
        math::wrap_angle,
        physics::NullPhysics,
        render::{DebugShape, RenderFrame},
    };

    fn cfg() -> EngineConfig {
        EngineConfig::default()
    }

    fn ball() -> BodyDef {
        BodyDef::new(BodyKind::Dynamic, Vec2::ZERO, Shape::Circle { radius: 10.0 })
    }

    fn spawn_ball(stepper: &mut PhysicsStepper, world: &mut World, at: Vec2) -> (EntityId, BodyId) {
        let e = world.spawn();
        world.insert(e, Transform::new(at, 0.0));
        let body = stepper.attach_body(world, e, &ball());
        (e, body)
    }

    fn snapshot(world: &World) -> Vec<(EntityId, Transform, Option<BodyId>, (Vec2, f32), bool)> {
        world
            .iter::<RigidBody>()
            .map(|(e, rb)| {
                (
                    e,
                    *world.get::<Transform>(e).unwrap(),
                    rb.body(),
                    rb.previous_pose(),
                    rb.is_out_of_sync(),
                )
            })
            .collect()
    }

    #[test]
    fn attach_body_converts_units() {
        let mut stepper = PhysicsStepper::with_basic_world(&cfg());
        let mut world = World::default();
        let (e, body) = spawn_ball(&mut stepper, &mut world, Vec2::new(250.0, 100.0));

        assert_eq!(stepper.world().position(body), Some(Vec2::new(2.5, 1.0)));
        assert_eq!(stepper.body_position(body), Some(Vec2::new(250.0, 100.0)));
        let rb = world.get::<RigidBody>(e).unwrap();
        assert!(!rb.is_out_of_sync());
        assert_eq!(rb.previous_pose().0, Vec2::new(2.5, 1.0));
    }

    #[test]
    fn synchronize_without_flags_changes_nothing() {
        let mut stepper = PhysicsStepper::with_basic_world(&cfg());
        let mut world = World::default();
        let (_, body) = spawn_ball(&mut stepper, &mut world, Vec2::new(100.0, 0.0));
        stepper.run_fixed_step(0.1);

        let before = snapshot(&world);
        let body_before = stepper.world().position(body);
        stepper.synchronize_out_of_sync_bodies(&mut world);
        assert_eq!(snapshot(&world), before);
        assert_eq!(stepper.world().position(body), body_before);
    }

    #[test]
    fn synchronize_teleports_body() {
        let mut stepper = PhysicsStepper::with_basic_world(&cfg());
        let mut world = World::default();
        let (e, body) = spawn_ball(&mut stepper, &mut world, Vec2::ZERO);
        stepper.world_mut().set_awake(body, false);

        world.get_mut::<Transform>(e).unwrap().position = Vec2::new(500.0, -200.0);
        world.get_mut::<Transform>(e).unwrap().rotation = 1.25;
        world.get_mut::<RigidBody>(e).unwrap().mark_out_of_sync();
        stepper.synchronize_out_of_sync_bodies(&mut world);

        assert_eq!(stepper.world().position(body), Some(Vec2::new(5.0, -2.0)));
        assert_eq!(stepper.world().angle(body), Some(1.25));
        let rb = world.get::<RigidBody>(e).unwrap();
        assert!(!rb.is_out_of_sync());
        assert_eq!(rb.previous_pose(), (Vec2::new(5.0, -2.0), 1.25));
    }

    #[test]
    fn flag_waits_for_a_body() {
        let mut stepper = PhysicsStepper::with_basic_world(&cfg());
        let mut world = World::default();
        let e = world.spawn();
        world.insert(e, Transform::default());
        let mut rb = RigidBody::new();
        rb.mark_out_of_sync();
        world.insert(e, rb);

        stepper.synchronize_out_of_sync_bodies(&mut world);
        assert!(world.get::<RigidBody>(e).unwrap().is_out_of_sync());
    }

    #[test]
    fn interpolation_blends_between_previous_and_current() {
        let mut stepper = PhysicsStepper::with_basic_world(&cfg());
        let mut world = World::default();
        let (e, body) = spawn_ball(&mut stepper, &mut world, Vec2::ZERO);
        stepper.world_mut().set_linear_velocity(body, Vec2::new(1.0, 0.0));
        stepper.set_gravity(Vec2::ZERO);

        stepper.prepare_step_smoothing(&mut world);
        stepper.run_fixed_step(1.0);
        let current = stepper.body_position(body).unwrap();
        assert_eq!(current, Vec2::new(100.0, 0.0));

        stepper.interpolate(&mut world, 0.0);
        assert_eq!(world.get::<Transform>(e).unwrap().position, Vec2::ZERO);

        stepper.interpolate(&mut world, 0.25);
        assert_eq!(world.get::<Transform>(e).unwrap().position, Vec2::new(25.0, 0.0));

        stepper.interpolate(&mut world, 1.0 - f32::EPSILON);
        let near = world.get::<Transform>(e).unwrap().position;
        assert!((near - current).len() < 1e-3);
    }

    #[test]
    fn rotation_blend_is_finite_and_short() {
        let mut stepper = PhysicsStepper::with_basic_world(&cfg());
        let mut world = World::default();
        let (e, body) = spawn_ball(&mut stepper, &mut world, Vec2::ZERO);
        stepper
            .world_mut()
            .set_transform(body, Vec2::ZERO, 3.0);
        stepper.prepare_step_smoothing(&mut world);
        stepper
            .world_mut()
            .set_transform(body, Vec2::ZERO, -3.0);

        stepper.interpolate(&mut world, 0.5);
        let rotation = world.get::<Transform>(e).unwrap().rotation;
        assert!(rotation.is_finite());
        // Halfway along the short arc between 3 and -3 rad is pi.
        assert!((wrap_angle(rotation).abs() - std::f32::consts::PI).abs() < 1e-4);
    }

    #[test]
    fn static_bodies_are_not_smoothed() {
        let mut stepper = PhysicsStepper::with_basic_world(&cfg());
        let mut world = World::default();
        let e = world.spawn();
        world.insert(e, Transform::new(Vec2::new(10.0, 10.0), 0.0));
        let def = BodyDef::new(BodyKind::Static, Vec2::ZERO, Shape::Circle { radius: 1.0 });
        stepper.attach_body(&mut world, e, &def);

        world.get_mut::<Transform>(e).unwrap().position = Vec2::new(99.0, 99.0);
        stepper.interpolate(&mut world, 0.5);
        assert_eq!(world.get::<Transform>(e).unwrap().position, Vec2::new(99.0, 99.0));
    }

    #[test]
    fn missing_body_is_a_noop() {
        let mut stepper = PhysicsStepper::with_basic_world(&cfg());
        let mut world = World::default();
        let (e, body) = spawn_ball(&mut stepper, &mut world, Vec2::new(5.0, 5.0));
        // Destroyed behind the component's back.
        stepper.world_mut().destroy_body(body);

        world.get_mut::<RigidBody>(e).unwrap().mark_out_of_sync();
        stepper.update(&mut world, Duration::from_millis(50));
        assert_eq!(world.get::<Transform>(e).unwrap().position, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn gravity_round_trips_through_scale() {
        let mut stepper = PhysicsStepper::with_basic_world(&cfg());
        stepper.set_gravity(Vec2::new(0.0, 10.0));
        assert_eq!(stepper.world().gravity(), Vec2::new(0.0, 0.1));

        stepper.set_gravity_multiplier(2.0);
        let g = stepper.gravity();
        assert!(g.x.abs() < 1e-5 && (g.y - 20.0).abs() < 1e-4, "{g:?}");
    }

    #[test]
    fn gravity_multiplier_handles_zero_and_negative() {
        let mut stepper = PhysicsStepper::with_basic_world(&cfg());
        stepper.set_gravity(Vec2::new(3.0, -4.0));
        stepper.set_gravity_multiplier(-0.5);
        let g = stepper.gravity();
        assert!((g.x + 1.5).abs() < 1e-4 && (g.y - 2.0).abs() < 1e-4, "{g:?}");

        stepper.set_gravity_multiplier(0.0);
        assert_eq!(stepper.gravity(), Vec2::ZERO);
    }

    #[test]
    fn queued_body_is_frozen_then_destroyed_once() {
        let mut stepper = PhysicsStepper::with_basic_world(&cfg());
        let mut world = World::default();
        let (e, body) = spawn_ball(&mut stepper, &mut world, Vec2::ZERO);
        let (_, other) = spawn_ball(&mut stepper, &mut world, Vec2::ZERO);
        assert_eq!(stepper.body_count(), 2);

        let frozen_at = stepper.world().position(body);
        world.get_mut::<RigidBody>(e).unwrap().queue_dispose();

        // Stepping is not allowed to touch the queued body. Check by hand
        // what the frame will do before the disposal point.
        stepper.park_queued_bodies(&world);
        stepper.run_fixed_step(0.1);
        assert_eq!(stepper.world().position(body), frozen_at);
        assert_ne!(stepper.world().position(other), frozen_at);

        stepper.update(&mut world, Duration::from_millis(20));
        assert_eq!(stepper.body_count(), 1);
        assert_eq!(stepper.stats().bodies_disposed, 1);
        assert!(world.get::<RigidBody>(e).unwrap().pending_disposals().is_empty());

        stepper.update(&mut world, Duration::from_millis(20));
        assert_eq!(stepper.stats().bodies_disposed, 1);
        assert_eq!(stepper.world().position(body), None);
    }

    #[test]
    fn detached_component_body_is_destroyed_at_frame_end() {
        let mut stepper = PhysicsStepper::with_basic_world(&cfg());
        let mut world = World::default();
        let (e, body) = spawn_ball(&mut stepper, &mut world, Vec2::ZERO);
        let (_, other) = spawn_ball(&mut stepper, &mut world, Vec2::ZERO);
        let frozen_at = stepper.world().position(body);

        let rb = stepper.detach(&mut world, e).unwrap();
        assert!(!rb.has_body());
        assert!(rb.pending_disposals().is_empty());
        assert!(world.get::<RigidBody>(e).is_none());
        assert!(stepper.detach(&mut world, e).is_none());
        assert_eq!(stepper.body_count(), 2);

        stepper.park_queued_bodies(&world);
        stepper.run_fixed_step(0.1);
        assert_eq!(stepper.world().position(body), frozen_at);

        stepper.update(&mut world, Duration::from_millis(20));
        assert_eq!(stepper.body_count(), 1);
        assert_eq!(stepper.world().position(body), None);
        assert!(stepper.world().position(other).is_some());
        assert_eq!(stepper.stats().bodies_disposed, 1);

        stepper.update(&mut world, Duration::from_millis(20));
        assert_eq!(stepper.stats().bodies_disposed, 1);
    }

    #[test]
    fn detach_also_drops_bodies_already_queued() {
        let mut stepper = PhysicsStepper::with_basic_world(&cfg());
        let mut world = World::default();
        let (e, _) = spawn_ball(&mut stepper, &mut world, Vec2::ZERO);
        // Re-attaching queues the first body.
        stepper.attach_body(&mut world, e, &ball());
        assert_eq!(stepper.body_count(), 2);

        stepper.detach(&mut world, e);
        stepper.update(&mut world, Duration::ZERO);
        assert_eq!(stepper.body_count(), 0);
        assert_eq!(stepper.stats().bodies_disposed, 2);
    }

    #[test]
    fn thirtieth_of_a_second_runs_one_step() {
        // The nanosecond duration lands just short of two 60 Hz steps.
        let mut stepper = PhysicsStepper::with_basic_world(&cfg());
        let mut world = World::default();
        let plan = stepper.update(&mut world, Duration::from_secs_f64(1.0 / 30.0));
        assert_eq!(plan.steps_to_run, 1);
        assert!((stepper.timestep().accumulated() - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn maximal_elapsed_twice_saturates_stats() {
        let mut stepper = PhysicsStepper::with_basic_world(&cfg());
        let mut world = World::default();
        for _ in 0..2 {
            let plan = stepper.update(&mut world, Duration::MAX);
            assert_eq!(plan.steps_to_run, 5);
        }
        let stats = stepper.stats();
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.steps_run, 10);
        assert_eq!(stats.steps_discarded, u64::MAX);
        let f = stepper.timestep().interpolation_fraction();
        assert!((0.0..1.0).contains(&f));
    }

    #[test]
    fn long_frame_runs_capped_steps() {
        let mut stepper = PhysicsStepper::with_basic_world(&cfg());
        let mut world = World::default();
        let (e, body) = spawn_ball(&mut stepper, &mut world, Vec2::ZERO);

        let plan = stepper.update(&mut world, Duration::from_secs(1));
        assert_eq!(plan.steps_to_run, 5);
        assert_eq!(stepper.stats().steps_run, 5);
        assert_eq!(stepper.stats().steps_discarded, 55);

        // Same body stepped five times by hand.
        let mut reference = BasicWorld::new(cfg().physics.gravity);
        let r = reference.create_body(&BodyDef::new(
            BodyKind::Dynamic,
            Vec2::ZERO,
            Shape::Circle { radius: 0.1 },
        ));
        for _ in 0..5 {
            reference.step((1.0f64 / 60.0) as f32, 8, 3);
        }
        assert_eq!(stepper.world().position(body), reference.position(r));
        // Remainder is ~0, so the transform sits at the start of the last step.
        let shown = world.get::<Transform>(e).unwrap().position;
        let (previous, _) = world.get::<RigidBody>(e).unwrap().previous_pose();
        assert!((shown - previous * 100.0).len() < 1e-3);
    }

    #[test]
    fn debug_draw_is_in_visual_units() {
        let mut stepper = PhysicsStepper::with_basic_world(&cfg());
        let mut world = World::default();
        spawn_ball(&mut stepper, &mut world, Vec2::new(200.0, 0.0));

        let mut frame = RenderFrame::default();
        stepper.debug_draw(&mut frame);
        match &frame.debug_shapes[0] {
            DebugShape::Circle { center, radius, .. } => {
                assert_eq!(*center, Vec2::new(200.0, 0.0));
                assert!((radius - 10.0).abs() < 1e-4);
            }
            other => panic!("expected circle, got {other:?}"),
        }
    }

    #[test]
    fn null_physics_frames_are_harmless() {
        let mut stepper = PhysicsStepper::new(Box::new(NullPhysics::default()), &cfg());
        let mut world = World::default();
        let e = world.spawn();
        world.insert(e, Transform::default());
        world.insert(e, RigidBody::new());
        let plan = stepper.update(&mut world, Duration::from_millis(100));
        assert_eq!(plan.steps_to_run, 5);
        assert_eq!(stepper.body_count(), 0);
    }
}
