//! Shared rendering surface.
//!
//! The window is the only resource touched by both the simulation side and
//! the render task. It lives behind one async mutex together with the latest
//! frame published for drawing:
//! - the render task waits for the lock, draws, releases, then sleeps
//! - the simulation side only ever `try_lock`s, and only to poll input and
//!   publish a frame; when the lock is busy it skips input for that frame
//!   instead of waiting
//!
//! Nothing else crosses between the two: the render task never sees the ECS
//! or the physics world, only the published `RenderFrame`.

use std::{sync::Arc, time::Duration};

use tempo_shared::{
    event::EventQueue,
    render::{RenderFrame, RenderSurface, View},
};
use tokio::{
    sync::{Mutex, MutexGuard},
    task::JoinHandle,
};
use tracing::debug;

use crate::status::{SharedStatus, Status};

/// Everything behind the surface lock.
pub struct SurfaceState<S> {
    pub surface: S,
    frame: RenderFrame,
    view: View,
    frames_rendered: u64,
}

impl<S: RenderSurface> SurfaceState<S> {
    /// Moves every pending window event into `into`. Returns how many.
    pub fn poll_events(&mut self, into: &mut EventQueue) -> usize {
        let mut n = 0;
        while let Some(e) = self.surface.poll_event() {
            into.push(e);
            n += 1;
        }
        n
    }

    /// Replaces the frame the render task will draw next.
    pub fn publish(&mut self, frame: &RenderFrame, view: View) {
        self.frame.clone_from(frame);
        self.view = view;
    }

    /// Draws the published frame. Does nothing once the surface is closed.
    pub fn render(&mut self) {
        if !self.surface.is_open() {
            return;
        }
        self.frame.draw_to(&mut self.surface, self.view);
        self.frames_rendered += 1;
    }

    pub fn close(&mut self) {
        self.surface.close();
    }

    pub fn is_open(&self) -> bool {
        self.surface.is_open()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn published_frame(&self) -> &RenderFrame {
        &self.frame
    }
}

/// Cloneable handle to the mutex-guarded surface.
pub struct SharedSurface<S> {
    inner: Arc<Mutex<SurfaceState<S>>>,
}

impl<S> Clone for SharedSurface<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: RenderSurface> SharedSurface<S> {
    pub fn new(surface: S, view: View) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SurfaceState {
                surface,
                frame: RenderFrame::default(),
                view,
                frames_rendered: 0,
            })),
        }
    }

    /// Takes the lock if it is free right now.
    pub fn try_acquire(&self) -> Option<MutexGuard<'_, SurfaceState<S>>> {
        self.inner.try_lock().ok()
    }

    /// Waits for the lock.
    pub async fn acquire(&self) -> MutexGuard<'_, SurfaceState<S>> {
        self.inner.lock().await
    }
}

/// Starts the render task: lock, draw, unlock, sleep `interval`, until the
/// status leaves the live range or the surface closes.
pub fn spawn_render_task<S>(
    surface: SharedSurface<S>,
    status: SharedStatus,
    interval: Duration,
) -> JoinHandle<()>
where
    S: RenderSurface + 'static,
{
    tokio::spawn(async move {
        if status.get() < Status::Running {
            return;
        }
        debug!(interval_ms = interval.as_millis() as u64, "Render task started");

        let mut frames = 0u64;
        while status.get().is_live() {
            {
                let mut state = surface.acquire().await;
                // Shutdown may have closed the surface while we waited.
                if !status.get().is_live() || !state.is_open() {
                    break;
                }
                state.render();
                frames += 1;
            }
            tokio::time::sleep(interval).await;
        }
        debug!(frames, "Render task finished");
    })
}
