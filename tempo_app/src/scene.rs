//! Scenes.
//!
//! A scene is the gameplay layer: it owns an ECS world, optionally a physics
//! subsystem, and a set of lifecycle hooks supplied by gameplay code. Every
//! hook is optional and fallible. A failing hook is logged with its name and
//! otherwise behaves as if it were absent for that call; a failing quit hook
//! counts as not vetoing the quit.

use std::time::Duration;

use tempo_shared::{
    config::EngineConfig,
    ecs::{EntityId, Transform, World},
    event::InputEvent,
    physics::{BodyDef, BodyId},
    render::{RenderFrame, Sprite, SpriteInstance},
};
use tempo_sim::{PhysicsStepper, RigidBody};
use tracing::{error, info};

/// What a quit hook wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitResponse {
    /// Veto this quit; the engine stays in `Quitting`.
    Stay,
    Terminate,
}

/// Result of asking a scene about a quit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOutcome {
    Vetoed,
    Terminate,
}

pub type Hook = Box<dyn FnMut(&mut SceneContext<'_>) -> anyhow::Result<()> + Send>;
pub type UpdateHook = Box<dyn FnMut(&mut SceneContext<'_>, Duration) -> anyhow::Result<()> + Send>;
pub type EventHook = Box<dyn FnMut(&mut SceneContext<'_>, &InputEvent) -> anyhow::Result<()> + Send>;
pub type QuitHook = Box<dyn FnMut(&mut SceneContext<'_>) -> anyhow::Result<QuitResponse> + Send>;

#[derive(Default)]
struct SceneHooks {
    begin: Option<Hook>,
    show: Option<Hook>,
    hide: Option<Hook>,
    update: Option<UpdateHook>,
    event: Option<EventHook>,
    quit: Option<QuitHook>,
}

/// What hooks can reach.
pub struct SceneContext<'a> {
    world: &'a mut World,
    physics: &'a mut Option<PhysicsStepper>,
    config: &'a EngineConfig,
    terminate_requested: &'a mut bool,
}

impl SceneContext<'_> {
    pub fn world(&mut self) -> &mut World {
        self.world
    }

    pub fn physics(&mut self) -> Option<&mut PhysicsStepper> {
        self.physics.as_mut()
    }

    /// Installs the physics subsystem if the scene has none yet.
    pub fn use_physics_system(&mut self) -> &mut PhysicsStepper {
        let config = self.config;
        self.physics.get_or_insert_with(|| {
            info!("Initialising physics system");
            PhysicsStepper::with_basic_world(config)
        })
    }

    /// Creates a body for `entity`. `None` without a physics system.
    pub fn attach_body(&mut self, entity: EntityId, def: &BodyDef) -> Option<BodyId> {
        let physics = self.physics.as_mut()?;
        Some(physics.attach_body(self.world, entity, def))
    }

    /// Removes the entity's `RigidBody`; its bodies go at the end of the frame.
    pub fn detach_body(&mut self, entity: EntityId) -> Option<RigidBody> {
        self.physics.as_mut()?.detach(self.world, entity)
    }

    /// Asks the engine to terminate after this call, bypassing the quit hook.
    pub fn request_terminate(&mut self) {
        *self.terminate_requested = true;
    }
}

/// Gameplay layer driven by the engine.
pub struct Scene {
    name: String,
    world: World,
    physics: Option<PhysicsStepper>,
    config: EngineConfig,
    hooks: SceneHooks,
    has_begun: bool,
    terminate_requested: bool,
}

fn report_failure(scene: &str, hook: &str, e: &anyhow::Error) {
    error!(scene, hook, error = %format!("{e:#}"), "Scene hook failed");
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            world: World::default(),
            physics: None,
            config: EngineConfig::default(),
            hooks: SceneHooks::default(),
            has_begun: false,
            terminate_requested: false,
        }
    }

    pub fn on_begin<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut SceneContext<'_>) -> anyhow::Result<()> + Send + 'static,
    {
        self.hooks.begin = Some(Box::new(f));
        self
    }

    pub fn on_show<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut SceneContext<'_>) -> anyhow::Result<()> + Send + 'static,
    {
        self.hooks.show = Some(Box::new(f));
        self
    }

    pub fn on_hide<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut SceneContext<'_>) -> anyhow::Result<()> + Send + 'static,
    {
        self.hooks.hide = Some(Box::new(f));
        self
    }

    pub fn on_update<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut SceneContext<'_>, Duration) -> anyhow::Result<()> + Send + 'static,
    {
        self.hooks.update = Some(Box::new(f));
        self
    }

    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut SceneContext<'_>, &InputEvent) -> anyhow::Result<()> + Send + 'static,
    {
        self.hooks.event = Some(Box::new(f));
        self
    }

    pub fn on_quit<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut SceneContext<'_>) -> anyhow::Result<QuitResponse> + Send + 'static,
    {
        self.hooks.quit = Some(Box::new(f));
        self
    }

    /// Removes the quit hook, so the next quit proceeds.
    pub fn clear_quit_hook(&mut self) {
        self.hooks.quit = None;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn physics(&self) -> Option<&PhysicsStepper> {
        self.physics.as_ref()
    }

    pub fn physics_mut(&mut self) -> Option<&mut PhysicsStepper> {
        self.physics.as_mut()
    }

    /// Installs the physics subsystem if absent.
    pub fn use_physics_system(&mut self) -> &mut PhysicsStepper {
        let config = &self.config;
        self.physics.get_or_insert_with(|| {
            info!("Initialising physics system");
            PhysicsStepper::with_basic_world(config)
        })
    }

    pub fn has_begun(&self) -> bool {
        self.has_begun
    }

    pub(crate) fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
    }

    /// Splits the scene into its hooks, a hook context, and its name.
    fn split(&mut self) -> (&mut SceneHooks, SceneContext<'_>, &str) {
        (
            &mut self.hooks,
            SceneContext {
                world: &mut self.world,
                physics: &mut self.physics,
                config: &self.config,
                terminate_requested: &mut self.terminate_requested,
            },
            &self.name,
        )
    }

    fn run_simple(&mut self, label: &str, pick: fn(&mut SceneHooks) -> &mut Option<Hook>) {
        let (hooks, mut ctx, name) = self.split();
        if let Some(hook) = pick(hooks).as_mut() {
            if let Err(e) = hook(&mut ctx) {
                report_failure(name, label, &e);
            }
        }
    }

    /// Runs the begin hook. Called once, on first show.
    pub fn begin(&mut self) {
        self.run_simple("begin", |h| &mut h.begin);
        self.has_begun = true;
    }

    pub fn show(&mut self) {
        if !self.has_begun {
            self.begin();
        }
        self.run_simple("show", |h| &mut h.show);
    }

    pub fn hide(&mut self) {
        self.run_simple("hide", |h| &mut h.hide);
    }

    /// Runs the update hook, then the physics subsystem.
    pub fn update(&mut self, dt: Duration) {
        let (hooks, mut ctx, name) = self.split();
        if let Some(hook) = hooks.update.as_mut() {
            if let Err(e) = hook(&mut ctx, dt) {
                report_failure(name, "update", &e);
            }
        }
        if let Some(physics) = self.physics.as_mut() {
            physics.update(&mut self.world, dt);
        }
    }

    pub fn handle_event(&mut self, event: &InputEvent) {
        let (hooks, mut ctx, name) = self.split();
        if let Some(hook) = hooks.event.as_mut() {
            if let Err(e) = hook(&mut ctx, event) {
                report_failure(name, "event", &e);
            }
        }
    }

    /// Gives the quit hook its one chance to veto.
    pub fn quit(&mut self) -> QuitOutcome {
        let (hooks, mut ctx, name) = self.split();
        let response = match hooks.quit.as_mut().map(|hook| hook(&mut ctx)) {
            Some(Ok(response)) => response,
            Some(Err(e)) => {
                report_failure(name, "quit", &e);
                QuitResponse::Terminate
            }
            None => QuitResponse::Terminate,
        };
        match response {
            QuitResponse::Stay => {
                info!(scene = %self.name, "Quit vetoed by scene");
                QuitOutcome::Vetoed
            }
            QuitResponse::Terminate => {
                info!(scene = %self.name, "Terminating program");
                QuitOutcome::Terminate
            }
        }
    }

    /// Returns and clears a pending `request_terminate`.
    pub fn take_terminate_request(&mut self) -> bool {
        std::mem::take(&mut self.terminate_requested)
    }

    /// Fills `frame` with this scene's sprites, plus physics debug geometry
    /// when `debug` is set.
    pub fn build_frame(&self, frame: &mut RenderFrame, debug: bool) {
        frame.clear();
        for (entity, sprite) in self.world.iter::<Sprite>() {
            let Some(t) = self.world.get::<Transform>(entity) else {
                continue;
            };
            frame.sprites.push(SpriteInstance {
                entity,
                position: t.position,
                rotation: t.rotation,
                size: sprite.size,
                color: sprite.color,
            });
        }
        if debug {
            if let Some(physics) = &self.physics {
                physics.debug_draw(frame);
            }
        }
    }
}
