//! Soak runner.
//!
//! Runs the headless engine in single-threaded and multithreaded mode with a
//! scene that keeps spawning and disposing bodies, then prints a summary.
//!
//! Usage:
//!   cargo run -p tempo_tests --bin soak_runner -- [seconds]

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use rand::{rngs::StdRng, Rng, SeedableRng};
use tempo_app::{Engine, Scene};
use tempo_shared::{
    config::EngineConfig,
    ecs::{EntityId, Transform},
    math::Vec2,
    physics::{BodyDef, BodyKind, Shape},
    render::{Color, HeadlessSurface, Sprite},
};
use tracing::info;

#[derive(Debug, Default)]
struct Counters {
    spawned: AtomicU64,
    disposed: AtomicU64,
}

/// Spawns a body every update and disposes bodies older than a second.
fn churn_scene(seconds: f32, counters: Arc<Counters>) -> Scene {
    let mut rng = StdRng::seed_from_u64(7);
    let mut elapsed = 0.0f32;
    let mut live: Vec<(EntityId, f32)> = Vec::new();

    Scene::new("churn")
        .on_begin(|ctx| {
            ctx.use_physics_system();
            Ok(())
        })
        .on_update(move |ctx, dt| {
            elapsed += dt.as_secs_f32();
            if elapsed >= seconds {
                ctx.request_terminate();
                return Ok(());
            }

            let e = ctx.world().spawn();
            ctx.world().insert(
                e,
                Sprite {
                    size: Vec2::new(6.0, 6.0),
                    color: Color::GREEN,
                },
            );
            let position = Vec2::new(rng.gen_range(0.0..1280.0), rng.gen_range(0.0..200.0));
            let def = BodyDef::new(BodyKind::Dynamic, position, Shape::Circle { radius: 3.0 });
            if ctx.attach_body(e, &def).is_some() {
                counters.spawned.fetch_add(1, Ordering::Relaxed);
                live.push((e, elapsed));
            }

            live.retain(|&(e, born)| {
                if elapsed - born < 1.0 {
                    return true;
                }
                if ctx.detach_body(e).is_some() {
                    counters.disposed.fetch_add(1, Ordering::Relaxed);
                }
                ctx.world().remove::<Sprite>(e);
                ctx.world().remove::<Transform>(e);
                false
            });
            Ok(())
        })
}

struct Summary {
    mode: &'static str,
    frames: u64,
    displayed: u64,
    spawned: u64,
    disposed: u64,
    wall: Duration,
    late_draws: u64,
}

async fn soak(multithreaded: bool, seconds: f32) -> anyhow::Result<Summary> {
    let config = EngineConfig {
        multithreaded,
        ..EngineConfig::default()
    };
    let counters = Arc::new(Counters::default());
    let (surface, _input, stats) = HeadlessSurface::new();

    let mut engine = Engine::new();
    engine.initialise(config, surface)?;
    engine.switch_scene(churn_scene(seconds, Arc::clone(&counters)));

    let started = Instant::now();
    engine.start().await?;
    let wall = started.elapsed();

    Ok(Summary {
        mode: if multithreaded { "multithreaded" } else { "single-threaded" },
        frames: engine.frame_index(),
        displayed: stats.frames_displayed(),
        spawned: counters.spawned.load(Ordering::Relaxed),
        disposed: counters.disposed.load(Ordering::Relaxed),
        wall,
        late_draws: stats.draws_after_close(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let seconds: f32 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(3.0);

    println!("tempo soak runner");
    println!("=================\n");

    let mut failed = false;
    for multithreaded in [false, true] {
        let s = soak(multithreaded, seconds).await?;
        info!(mode = s.mode, frames = s.frames, "Soak finished");
        let secs = s.wall.as_secs_f64().max(f64::EPSILON);
        println!("{}:", s.mode);
        println!("  wall time:        {:.2}s", s.wall.as_secs_f64());
        println!("  frames simulated: {} ({:.0}/s)", s.frames, s.frames as f64 / secs);
        println!("  frames displayed: {} ({:.0}/s)", s.displayed, s.displayed as f64 / secs);
        println!("  bodies spawned:   {}", s.spawned);
        println!("  bodies disposed:  {}", s.disposed);
        println!("  late draws:       {}\n", s.late_draws);
        if s.late_draws > 0 || s.displayed == 0 {
            failed = true;
        }
    }

    if failed {
        anyhow::bail!("soak run found drawing problems");
    }
    println!("All modes OK.");
    Ok(())
}
