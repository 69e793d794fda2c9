//! Headless demo.
//!
//! Usage:
//!   cargo run -p tempo_app -- [--multithreaded] [--debug] [--seconds 5] [--config engine.json] [--console]
//!
//! Drops boxes onto a static floor for a few seconds, then terminates. Boxes
//! that fall past the bottom of the view have their bodies disposed.
//!
//! Console commands (with --console):
//!   getGravity / setGravity <x> <y> / setGravityMult <m>
//!   physicsBodyCount
//!   debug true|false

use std::env;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tempo_app::{Engine, Scene};
use tempo_shared::{
    config::EngineConfig,
    ecs::{EntityId, Transform},
    math::Vec2,
    physics::{BodyDef, BodyKind, Shape},
    render::{Color, HeadlessSurface, Sprite},
};
use tempo_sim::RigidBody;
use tokio::sync::mpsc;
use tracing::info;

struct Args {
    config: EngineConfig,
    seconds: f32,
    console: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let argv: Vec<String> = env::args().collect();
    let mut config_path: Option<PathBuf> = None;
    let mut multithreaded = false;
    let mut debug = false;
    let mut seconds = 5.0;
    let mut console = false;
    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--multithreaded" => {
                multithreaded = true;
                i += 1;
            }
            "--debug" => {
                debug = true;
                i += 1;
            }
            "--console" => {
                console = true;
                i += 1;
            }
            "--seconds" if i + 1 < argv.len() => {
                seconds = argv[i + 1].parse().unwrap_or(5.0);
                i += 2;
            }
            "--config" if i + 1 < argv.len() => {
                config_path = Some(PathBuf::from(&argv[i + 1]));
                i += 2;
            }
            _ => i += 1,
        }
    }

    let mut config = match config_path {
        Some(path) => EngineConfig::from_file(&path)?,
        None => EngineConfig::default(),
    };
    config.multithreaded |= multithreaded;
    config.debug |= debug;
    Ok(Args {
        config,
        seconds,
        console,
    })
}

/// Falling boxes over a static floor.
fn demo_scene(width: f32, height: f32, seconds: f32) -> Scene {
    let mut rng = StdRng::from_entropy();
    let mut since_spawn = 0.0f32;
    let mut running_for = 0.0f32;
    let mut boxes: Vec<EntityId> = Vec::new();

    Scene::new("boxes")
        .on_begin(move |ctx| {
            ctx.use_physics_system();
            let floor = ctx.world().spawn();
            let size = Vec2::new(width * 0.8, 20.0);
            ctx.world().insert(floor, Transform::new(Vec2::new(width * 0.5, height - 40.0), 0.0));
            ctx.world().insert(floor, Sprite { size, color: Color::DEBUG_STATIC });
            let def = BodyDef::new(BodyKind::Static, Vec2::ZERO, Shape::Box { half_extents: size * 0.5 });
            ctx.attach_body(floor, &def).context("physics system missing")?;
            Ok(())
        })
        .on_update(move |ctx, dt| {
            let dt = dt.as_secs_f32();
            running_for += dt;
            since_spawn += dt;
            if running_for >= seconds {
                ctx.request_terminate();
                return Ok(());
            }

            if since_spawn >= 0.25 {
                since_spawn = 0.0;
                let side = rng.gen_range(10.0..40.0);
                let position = Vec2::new(rng.gen_range(0.0..width), -side);
                let e = ctx.world().spawn();
                ctx.world().insert(e, Sprite { size: Vec2::new(side, side), color: Color::GREEN });
                let mut def = BodyDef::new(BodyKind::Dynamic, position, Shape::Box {
                    half_extents: Vec2::new(side * 0.5, side * 0.5),
                });
                def.angle = rng.gen_range(-1.0..1.0);
                def.angular_velocity = rng.gen_range(-2.0..2.0);
                ctx.attach_body(e, &def).context("physics system missing")?;
                boxes.push(e);
            }

            // Nothing collides with the floor, so boxes leave through the bottom.
            let world = ctx.world();
            boxes.retain(|&e| {
                let fallen = world.get::<Transform>(e).is_some_and(|t| t.position.y > height + 100.0);
                if fallen {
                    if let Some(rb) = world.get_mut::<RigidBody>(e) {
                        rb.queue_dispose();
                    }
                    world.remove::<Sprite>(e);
                }
                !fallen
            });
            Ok(())
        })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = parse_args().context("parse arguments")?;
    let width = args.config.window_width as f32;
    let height = args.config.window_height as f32;
    info!(
        multithreaded = args.config.multithreaded,
        seconds = args.seconds,
        "Starting demo"
    );

    let (surface, _input, stats) = HeadlessSurface::new();
    let mut engine = Engine::new();
    engine.initialise(args.config, surface)?;
    engine.switch_scene(demo_scene(width, height, args.seconds));

    if args.console {
        let (console_tx, console_rx) = mpsc::channel::<String>(32);
        engine.set_console_input(console_rx);

        // Spawn stdin reader thread.
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            loop {
                print!("] ");
                let _ = stdout.flush();
                let mut line = String::new();
                if stdin.lock().read_line(&mut line).is_err() {
                    break;
                }
                let line = line.trim().to_string();
                if !line.is_empty() && console_tx.blocking_send(line).is_err() {
                    break;
                }
            }
        });
    }

    let started = std::time::Instant::now();
    engine.start().await?;
    let wall = started.elapsed();

    println!();
    println!("frames simulated: {}", engine.frame_index());
    println!("frames displayed: {}", stats.frames_displayed());
    println!("wall time:        {:.2}s", wall.as_secs_f32());
    if wall > Duration::ZERO {
        println!(
            "average fps:      {:.0}",
            engine.frame_index() as f32 / wall.as_secs_f32()
        );
    }
    Ok(())
}
