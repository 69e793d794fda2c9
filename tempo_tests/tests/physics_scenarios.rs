//! Stepper behaviour across frame sequences, driven through the public API.

use std::time::Duration;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tempo_app::Scene;
use tempo_shared::{
    config::EngineConfig,
    ecs::{EntityId, Transform, World},
    math::Vec2,
    physics::{BodyDef, BodyId, BodyKind, Shape},
};
use tempo_sim::{PhysicsStepper, RigidBody};

fn config(tick_hz: u32) -> EngineConfig {
    EngineConfig {
        tick_hz,
        ..EngineConfig::default()
    }
}

fn drop_ball(stepper: &mut PhysicsStepper, world: &mut World, x: f32) -> (EntityId, BodyId) {
    let e = world.spawn();
    let mut def = BodyDef::new(BodyKind::Dynamic, Vec2::new(x, 0.0), Shape::Circle { radius: 5.0 });
    def.angular_velocity = 3.0;
    let body = stepper.attach_body(world, e, &def);
    (e, body)
}

#[test]
fn executed_steps_follow_total_time_below_the_cap() {
    // 1/64 s steps and 1/128 s frame slices are exact in binary.
    let mut stepper = PhysicsStepper::with_basic_world(&config(64));
    let mut world = World::default();
    drop_ball(&mut stepper, &mut world, 0.0);

    let mut rng = StdRng::seed_from_u64(0x7e4d0);
    let mut slices = 0u64;
    for _ in 0..500 {
        let k: u64 = rng.gen_range(0..=6);
        slices += k;
        let plan = stepper.update(&mut world, Duration::from_nanos(k * 7_812_500));
        assert!(plan.steps_to_run <= 3);
        let fraction = stepper.timestep().interpolation_fraction();
        assert!((0.0..1.0).contains(&fraction));
    }

    let stats = stepper.stats();
    assert_eq!(stats.steps_run, slices / 2);
    assert_eq!(stats.steps_discarded, 0);
    assert_eq!(stats.frames, 500);
}

#[test]
fn short_frame_leaves_remainder_for_the_next() {
    let mut stepper = PhysicsStepper::with_basic_world(&config(60));
    let mut world = World::default();

    // 1/40 s is one and a half steps at 60 Hz.
    let plan = stepper.update(&mut world, Duration::from_secs_f64(1.0 / 40.0));
    assert_eq!(plan.steps_to_run, 1);
    assert!((stepper.timestep().accumulated() - 1.0 / 120.0).abs() < 1e-9);
    assert!((stepper.timestep().interpolation_fraction() - 0.5).abs() < 1e-4);

    let plan = stepper.update(&mut world, Duration::from_millis(10));
    assert_eq!(plan.steps_to_run, 1);
    assert!((stepper.timestep().accumulated() - (0.035 - 2.0 / 60.0)).abs() < 1e-9);
}

#[test]
fn thirtieth_of_a_second_frame_runs_one_step() {
    let mut stepper = PhysicsStepper::with_basic_world(&config(60));
    let mut world = World::default();
    let (_, body) = drop_ball(&mut stepper, &mut world, 0.0);

    // 1/30 s as a Duration is 33_333_333 ns, just under two steps.
    let plan = stepper.update(&mut world, Duration::from_secs_f64(1.0 / 30.0));
    assert_eq!(plan.steps_to_run, 1);
    assert!((stepper.timestep().accumulated() - 1.0 / 60.0).abs() < 1e-6);
    assert!(stepper.body_position(body).is_some_and(|p| p.y > 0.0));

    // The banked remainder tops up on the next frame.
    let plan = stepper.update(&mut world, Duration::from_millis(1));
    assert_eq!(plan.steps_to_run, 1);
    assert_eq!(stepper.stats().steps_run, 2);
}

#[test]
fn despawned_entities_release_their_bodies() {
    let mut scene = Scene::new("despawn")
        .on_begin(|ctx| {
            ctx.use_physics_system();
            for i in 0..4 {
                let e = ctx.world().spawn();
                let position = Vec2::new(i as f32 * 10.0, 0.0);
                let def = BodyDef::new(BodyKind::Dynamic, position, Shape::Circle { radius: 1.0 });
                ctx.attach_body(e, &def);
            }
            Ok(())
        })
        .on_update(|ctx, _| {
            let doomed: Vec<EntityId> = ctx.world().iter::<RigidBody>().map(|(e, _)| e).collect();
            for e in doomed {
                ctx.detach_body(e);
            }
            Ok(())
        });
    scene.show();
    assert_eq!(scene.physics().map(|p| p.body_count()), Some(4));

    scene.update(Duration::from_millis(16));
    let physics = scene.physics().expect("installed");
    assert_eq!(physics.body_count(), 0);
    assert_eq!(physics.stats().bodies_disposed, 4);
    assert_eq!(scene.world().count::<RigidBody>(), 0);
}

#[test]
fn hitch_runs_five_steps_and_drops_the_rest() {
    let mut stepper = PhysicsStepper::with_basic_world(&config(60));
    let mut world = World::default();
    let (_, body) = drop_ball(&mut stepper, &mut world, 0.0);

    let plan = stepper.update(&mut world, Duration::from_secs(1));
    assert_eq!(plan.steps_to_run, 5);
    assert_eq!(plan.steps_due, 60);
    assert_eq!(plan.discarded(), 55);
    assert!(stepper.timestep().accumulated() < stepper.timestep().fixed_step());

    // The lost time is not paid back later.
    let after_hitch = stepper.body_position(body);
    let plan = stepper.update(&mut world, Duration::ZERO);
    assert_eq!(plan.steps_to_run, 0);
    assert_eq!(stepper.body_position(body), after_hitch);
    assert_eq!(stepper.stats().steps_discarded, 55);
}

#[test]
fn frame_slicing_does_not_change_the_simulation() {
    let mut fine = PhysicsStepper::with_basic_world(&config(64));
    let mut coarse = PhysicsStepper::with_basic_world(&config(64));
    let mut fine_world = World::default();
    let mut coarse_world = World::default();
    let (_, a) = drop_ball(&mut fine, &mut fine_world, 50.0);
    let (_, b) = drop_ball(&mut coarse, &mut coarse_world, 50.0);

    for _ in 0..16 {
        fine.update(&mut fine_world, Duration::from_nanos(7_812_500));
    }
    for _ in 0..4 {
        coarse.update(&mut coarse_world, Duration::from_nanos(31_250_000));
    }

    assert_eq!(fine.stats().steps_run, 8);
    assert_eq!(coarse.stats().steps_run, 8);
    assert_eq!(fine.body_position(a), coarse.body_position(b));
    assert_eq!(fine.world().angle(a), coarse.world().angle(b));
}

#[test]
fn falling_body_is_drawn_smoothly_under_irregular_frames() {
    let mut stepper = PhysicsStepper::with_basic_world(&config(60));
    let mut world = World::default();
    let (e, _) = drop_ball(&mut stepper, &mut world, 0.0);

    let mut rng = StdRng::seed_from_u64(42);
    let mut last_y = f32::MIN;
    for _ in 0..200 {
        let ms = rng.gen_range(1..40);
        stepper.update(&mut world, Duration::from_millis(ms));
        let t = world.get::<Transform>(e).copied().unwrap_or_default();
        assert!(t.position.is_finite());
        assert!(t.rotation.is_finite());
        assert!(t.position.y >= last_y, "visual position went backwards");
        last_y = t.position.y;
    }
    assert!(last_y > 0.0);
}

#[test]
fn gravity_multiplier_scales_current_gravity() {
    let mut stepper = PhysicsStepper::with_basic_world(&config(60));
    stepper.set_gravity(Vec2::new(0.0, 10.0));
    stepper.set_gravity_multiplier(2.0);
    assert_eq!(stepper.gravity(), Vec2::new(0.0, 20.0));
    stepper.set_gravity_multiplier(-0.5);
    assert_eq!(stepper.gravity(), Vec2::new(0.0, -10.0));
}

#[test]
fn scene_disposes_bodies_queued_by_its_update_hook() {
    let mut scene = Scene::new("cleanup")
        .on_begin(|ctx| {
            ctx.use_physics_system();
            for i in 0..3 {
                let e = ctx.world().spawn();
                let def = BodyDef::new(
                    BodyKind::Dynamic,
                    Vec2::new(i as f32 * 20.0, 0.0),
                    Shape::Box {
                        half_extents: Vec2::new(2.0, 2.0),
                    },
                );
                ctx.attach_body(e, &def);
            }
            Ok(())
        })
        .on_update(|ctx, _| {
            let world = ctx.world();
            let fallen: Vec<EntityId> = world
                .iter::<Transform>()
                .filter(|(_, t)| t.position.y > 10.0)
                .map(|(e, _)| e)
                .collect();
            for e in fallen {
                if let Some(rb) = world.get_mut::<RigidBody>(e) {
                    rb.queue_dispose();
                }
            }
            Ok(())
        });
    scene.show();
    assert_eq!(scene.physics().map(|p| p.body_count()), Some(3));

    let mut frames = 0;
    while scene.physics().map_or(0, |p| p.body_count()) > 0 && frames < 600 {
        scene.update(Duration::from_millis(16));
        frames += 1;
    }
    let physics = scene.physics().expect("installed");
    assert_eq!(physics.body_count(), 0);
    assert_eq!(physics.stats().bodies_disposed, 3);
    for (_, rb) in scene.world().iter::<RigidBody>() {
        assert!(!rb.has_body());
        assert!(rb.pending_disposals().is_empty());
    }
    assert_eq!(scene.world().count::<RigidBody>(), 3);
}
