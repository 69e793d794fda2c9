//! Engine context and frame loop.
//!
//! `Engine` owns everything a run needs: status, configuration, the shared
//! surface, the active scene and the developer console. Per frame:
//! 1. measure elapsed time and count the frame for the FPS counter
//! 2. run queued console lines
//! 3. try to take the surface lock; if free, poll input (and, when rendering
//!    on a second task, publish the last built frame); if busy, skip input
//! 4. dispatch events: `Closed` starts the quit sequence, the rest reach the
//!    scene
//! 5. update the scene, which steps its physics
//! 6. build the next frame; render it now (single-threaded) or yield
//!
//! Shutdown order: quit, scene veto, `ShuttingDown`, close the surface, join
//! the render task, release the scene, back to `Uninitialised`.

use std::time::Duration;

use tempo_shared::{
    config::EngineConfig,
    event::{EventQueue, InputEvent},
    render::{RenderFrame, RenderSurface, View},
};
use tempo_sim::{FpsCounter, SimulationClock};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, info, trace, warn};

use crate::{
    console::{Console, CvarValue},
    error::LifecycleError,
    scene::{QuitOutcome, Scene},
    status::{SharedStatus, Status},
    surface::{spawn_render_task, SharedSurface},
};

/// The explicitly-owned engine context.
pub struct Engine<S> {
    status: SharedStatus,
    config: EngineConfig,
    surface: Option<SharedSurface<S>>,
    scene: Option<Scene>,
    console: Console,
    console_rx: Option<mpsc::Receiver<String>>,
    view: View,
    clock: SimulationClock,
    fps: FpsCounter,
    frame_index: u64,
    frame: RenderFrame,
    events: EventQueue,
    render_task: Option<JoinHandle<()>>,
}

impl<S: RenderSurface + 'static> Default for Engine<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: RenderSurface + 'static> Engine<S> {
    pub fn new() -> Self {
        Self {
            status: SharedStatus::default(),
            config: EngineConfig::default(),
            surface: None,
            scene: None,
            console: Console::new(),
            console_rx: None,
            view: View::default(),
            clock: SimulationClock::new(),
            fps: FpsCounter::default(),
            frame_index: 0,
            frame: RenderFrame::default(),
            events: EventQueue::default(),
            render_task: None,
        }
    }

    /// Takes ownership of the surface and moves to `Ready`.
    pub fn initialise(&mut self, config: EngineConfig, surface: S) -> Result<(), LifecycleError> {
        let status = self.status.get();
        if status != Status::Uninitialised {
            let err = LifecycleError::AlreadyInitialised { status };
            error!(error = %err, "Initialise refused");
            return Err(err);
        }
        if let Err(e) = config.validate() {
            let err = LifecycleError::InvalidConfig(format!("{e:#}"));
            error!(error = %err, "Initialise refused");
            return Err(err);
        }

        self.view = View::covering(config.window_width as f32, config.window_height as f32);
        self.surface = Some(SharedSurface::new(surface, self.view));
        self.set_debug_mode(config.debug);
        if let Some(scene) = self.scene.as_mut() {
            scene.set_config(config.clone());
        }
        info!(
            title = %config.title,
            multithreaded = config.multithreaded,
            debug = config.debug,
            tick_hz = config.tick_hz,
            "Engine initialised"
        );
        self.config = config;
        self.frame_index = 0;
        self.status.advance(Status::Ready);
        Ok(())
    }

    /// Makes `scene` active: hides the current one, then shows the new one.
    /// Returns the scene that was replaced.
    pub fn switch_scene(&mut self, mut scene: Scene) -> Option<Scene> {
        let mut previous = self.scene.take();
        if let Some(old) = previous.as_mut() {
            old.hide();
        }
        info!(scene = scene.name(), "Switching scene");
        scene.set_config(self.config.clone());
        scene.show();
        self.scene = Some(scene);
        previous
    }

    /// Runs the frame loop until shutdown, then releases everything.
    pub async fn start(&mut self) -> Result<(), LifecycleError> {
        self.launch()?;
        while self.status.get().is_live() {
            let elapsed = self.clock.restart();
            self.run_frame(elapsed).await;
        }
        self.finish().await;
        info!("Exiting");
        Ok(())
    }

    /// Moves from `Ready` to `Running` and, in multithreaded mode, spawns the
    /// render task. Must be called inside a tokio runtime.
    pub fn launch(&mut self) -> Result<(), LifecycleError> {
        let status = self.status.get();
        if status != Status::Ready {
            let err = LifecycleError::NotReady { status };
            error!(error = %err, "Start refused");
            return Err(err);
        }
        self.status.advance(Status::Running);
        self.clock.restart();
        self.fps = FpsCounter::default();

        if self.config.multithreaded {
            if let Some(surface) = &self.surface {
                let interval = Duration::from_millis(self.config.render_interval_ms);
                self.render_task = Some(spawn_render_task(
                    surface.clone(),
                    self.status.clone(),
                    interval,
                ));
            }
        }
        info!(multithreaded = self.config.multithreaded, "Engine running");
        Ok(())
    }

    /// One iteration of the frame loop for `elapsed` wall time.
    pub async fn run_frame(&mut self, elapsed: Duration) {
        self.fps.record_frame();
        self.process_console_input();
        self.poll_input();
        self.dispatch_events().await;

        let mut terminate = false;
        if self.status.get().is_live() {
            if let Some(scene) = self.scene.as_mut() {
                scene.update(elapsed);
                terminate = scene.take_terminate_request();
            }
        }
        if terminate {
            info!("Scene requested termination");
            self.terminate().await;
        }

        self.present().await;
        self.frame_index += 1;
    }

    /// Starts the quit sequence. The scene may veto once per request; a
    /// vetoed quit leaves the engine in `Quitting`.
    pub async fn quit(&mut self) {
        if self.status.get() < Status::Running {
            debug!(status = ?self.status.get(), "Quit ignored before start");
            return;
        }
        self.status.advance(Status::Quitting);
        if !self.status.get().is_live() {
            return;
        }
        info!("Quit requested");
        let outcome = match self.scene.as_mut() {
            Some(scene) => scene.quit(),
            None => QuitOutcome::Terminate,
        };
        if outcome == QuitOutcome::Terminate {
            self.terminate().await;
        }
    }

    /// Moves to `ShuttingDown` and closes the surface. Not retractable.
    pub async fn terminate(&mut self) {
        if !self.status.advance(Status::ShuttingDown) {
            return;
        }
        info!("Shutting down");
        if let Some(surface) = &self.surface {
            surface.acquire().await.close();
        }
    }

    /// Completes shutdown: joins the render task, then releases resources.
    pub async fn finish(&mut self) {
        if self.status.get().is_live() {
            self.terminate().await;
        }
        if let Some(handle) = self.render_task.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "Render task failed");
            }
            debug!("Render task joined");
        }
        self.shutdown();
    }

    fn shutdown(&mut self) {
        info!("Releasing resources");
        self.scene = None;
        self.surface = None;
        self.events = EventQueue::default();
        self.frame.clear();
        self.status.reset();
    }

    fn process_console_input(&mut self) {
        while let Some(line) = self.console_rx.as_mut().and_then(|rx| rx.try_recv().ok()) {
            match self.exec_console(&line) {
                Ok(output) => {
                    for out in output {
                        info!(target: "console", "{out}");
                    }
                }
                Err(e) => warn!(command = %line, error = %format!("{e:#}"), "Console command failed"),
            }
        }
    }

    fn poll_input(&mut self) {
        let Some(surface) = &self.surface else {
            return;
        };
        let Some(mut state) = surface.try_acquire() else {
            trace!(frame = self.frame_index, "Surface busy, input skipped");
            return;
        };
        state.poll_events(&mut self.events);
        if self.config.multithreaded {
            state.publish(&self.frame, self.view);
        }
    }

    async fn dispatch_events(&mut self) {
        while let Some(event) = self.events.poll() {
            if !self.status.get().is_live() {
                break;
            }
            match event {
                InputEvent::Closed => {
                    self.quit().await;
                    continue;
                }
                InputEvent::Resized { width, height } => {
                    self.view = View::covering(width as f32, height as f32);
                    debug!(width, height, "View resized");
                }
                _ => {}
            }
            if let Some(scene) = self.scene.as_mut() {
                scene.handle_event(&event);
            }
        }
    }

    async fn present(&mut self) {
        let debug = self.debug_mode();
        match &self.scene {
            Some(scene) => scene.build_frame(&mut self.frame, debug),
            None => self.frame.clear(),
        }
        self.frame.frame = self.frame_index;

        if self.config.multithreaded {
            tokio::task::yield_now().await;
            return;
        }
        if !self.status.get().is_live() {
            return;
        }
        if let Some(surface) = &self.surface {
            let mut state = surface.acquire().await;
            state.publish(&self.frame, self.view);
            state.render();
        }
    }

    /// Runs one console line against the active scene.
    pub fn exec_console(&mut self, line: &str) -> anyhow::Result<Vec<String>> {
        self.console.exec(line, self.scene.as_mut())
    }

    /// Feeds console lines from another thread or task.
    pub fn set_console_input(&mut self, rx: mpsc::Receiver<String>) {
        self.console_rx = Some(rx);
    }

    pub fn console_mut(&mut self) -> &mut Console {
        &mut self.console
    }

    pub fn debug_mode(&self) -> bool {
        self.console
            .get_cvar("debug")
            .is_some_and(|v| v.as_bool())
    }

    pub fn set_debug_mode(&mut self, on: bool) {
        if let Err(e) = self.console.set_cvar("debug", CvarValue::Bool(on)) {
            warn!(error = %e, "Could not set debug mode");
        }
    }

    pub fn status(&self) -> Status {
        self.status.get()
    }

    /// Handle observing the status from other tasks.
    pub fn shared_status(&self) -> SharedStatus {
        self.status.clone()
    }

    pub fn fps(&self) -> u32 {
        self.fps.fps()
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    pub fn surface(&self) -> Option<&SharedSurface<S>> {
        self.surface.as_ref()
    }

    /// The frame most recently built by the simulation side.
    pub fn last_frame(&self) -> &RenderFrame {
        &self.frame
    }
}
