//! Rendering abstraction.
//!
//! This crate intentionally does not depend on a graphics backend.
//! Define traits that a window/renderer implementation would satisfy.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    Arc,
};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::{ecs::EntityId, event::InputEvent, math::Vec2};

/// RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 200, 70);
    pub const DEBUG_DYNAMIC: Self = Self::rgb(230, 178, 178);
    pub const DEBUG_STATIC: Self = Self::rgb(128, 230, 128);
    pub const DEBUG_KINEMATIC: Self = Self::rgb(128, 128, 230);
    pub const DEBUG_ASLEEP: Self = Self::rgb(153, 153, 153);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Visible area of the world in visual units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub center: Vec2,
    pub size: Vec2,
}

impl View {
    /// View covering `(0, 0) .. (width, height)`.
    pub fn covering(width: f32, height: f32) -> Self {
        Self {
            center: Vec2::new(width * 0.5, height * 0.5),
            size: Vec2::new(width, height),
        }
    }
}

impl Default for View {
    fn default() -> Self {
        Self::covering(1280.0, 720.0)
    }
}

/// Component: draw this entity as a rectangle of `size` centered on its
/// transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub size: Vec2,
    pub color: Color,
}

/// A sprite resolved for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteInstance {
    pub entity: EntityId,
    pub position: Vec2,
    pub rotation: f32,
    pub size: Vec2,
    pub color: Color,
}

/// Debug geometry in visual units.
#[derive(Debug, Clone, PartialEq)]
pub enum DebugShape {
    Polygon { vertices: Vec<Vec2>, color: Color },
    Circle { center: Vec2, radius: f32, color: Color },
    Segment { from: Vec2, to: Vec2, color: Color },
}

/// Sink for debug geometry.
pub trait DebugDraw {
    fn draw_polygon(&mut self, vertices: &[Vec2], color: Color);
    fn draw_circle(&mut self, center: Vec2, radius: f32, color: Color);
    fn draw_segment(&mut self, from: Vec2, to: Vec2, color: Color);
}

/// Everything needed to draw one frame, built by the simulation side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderFrame {
    /// Simulation frame this was built on.
    pub frame: u64,
    pub sprites: Vec<SpriteInstance>,
    pub debug_shapes: Vec<DebugShape>,
}

impl RenderFrame {
    pub fn clear(&mut self) {
        self.sprites.clear();
        self.debug_shapes.clear();
    }

    /// Clears the surface, draws the frame under `view` and presents it.
    pub fn draw_to<S: RenderSurface + ?Sized>(&self, surface: &mut S, view: View) {
        surface.clear(Color::BLACK);
        surface.set_view(view);
        for sprite in &self.sprites {
            surface.draw_sprite(sprite);
        }
        for shape in &self.debug_shapes {
            surface.draw_shape(shape);
        }
        surface.display();
    }
}

impl DebugDraw for RenderFrame {
    fn draw_polygon(&mut self, vertices: &[Vec2], color: Color) {
        self.debug_shapes.push(DebugShape::Polygon {
            vertices: vertices.to_vec(),
            color,
        });
    }

    fn draw_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.debug_shapes.push(DebugShape::Circle {
            center,
            radius,
            color,
        });
    }

    fn draw_segment(&mut self, from: Vec2, to: Vec2, color: Color) {
        self.debug_shapes.push(DebugShape::Segment { from, to, color });
    }
}

/// A window-like rendering target that also produces input events.
pub trait RenderSurface: Send {
    fn poll_event(&mut self) -> Option<InputEvent>;
    fn clear(&mut self, color: Color);
    fn set_view(&mut self, view: View);
    fn draw_sprite(&mut self, sprite: &SpriteInstance);
    fn draw_shape(&mut self, shape: &DebugShape);
    fn display(&mut self);
    fn close(&mut self);
    fn is_open(&self) -> bool;
}

/// Counters shared between a `HeadlessSurface` and its observers.
#[derive(Debug, Default)]
pub struct HeadlessStats {
    frames_displayed: AtomicU64,
    last_sprite_count: AtomicUsize,
    last_shape_count: AtomicUsize,
    draws_after_close: AtomicU64,
    closed: AtomicBool,
}

impl HeadlessStats {
    pub fn frames_displayed(&self) -> u64 {
        self.frames_displayed.load(Ordering::Acquire)
    }

    pub fn last_sprite_count(&self) -> usize {
        self.last_sprite_count.load(Ordering::Acquire)
    }

    pub fn last_shape_count(&self) -> usize {
        self.last_shape_count.load(Ordering::Acquire)
    }

    /// Frames presented after `close`; always zero for a well-behaved loop.
    pub fn draws_after_close(&self) -> u64 {
        self.draws_after_close.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Handle for feeding events into a `HeadlessSurface` from outside.
#[derive(Debug, Clone)]
pub struct HeadlessInput {
    tx: mpsc::UnboundedSender<InputEvent>,
}

impl HeadlessInput {
    /// Queues an event. Returns false once the surface is gone.
    pub fn send(&self, event: InputEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// A surface with no backend, useful for headless runs and tests.
pub struct HeadlessSurface {
    events: mpsc::UnboundedReceiver<InputEvent>,
    stats: Arc<HeadlessStats>,
    view: View,
    sprites_this_frame: usize,
    shapes_this_frame: usize,
    open: bool,
}

impl HeadlessSurface {
    pub fn new() -> (Self, HeadlessInput, Arc<HeadlessStats>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let stats = Arc::new(HeadlessStats::default());
        let surface = Self {
            events: rx,
            stats: Arc::clone(&stats),
            view: View::default(),
            sprites_this_frame: 0,
            shapes_this_frame: 0,
            open: true,
        };
        (surface, HeadlessInput { tx }, stats)
    }

    pub fn view(&self) -> View {
        self.view
    }
}

impl RenderSurface for HeadlessSurface {
    fn poll_event(&mut self) -> Option<InputEvent> {
        if !self.open {
            return None;
        }
        self.events.try_recv().ok()
    }

    fn clear(&mut self, _color: Color) {
        self.sprites_this_frame = 0;
        self.shapes_this_frame = 0;
    }

    fn set_view(&mut self, view: View) {
        self.view = view;
    }

    fn draw_sprite(&mut self, _sprite: &SpriteInstance) {
        self.sprites_this_frame += 1;
    }

    fn draw_shape(&mut self, _shape: &DebugShape) {
        self.shapes_this_frame += 1;
    }

    fn display(&mut self) {
        if !self.open {
            self.stats.draws_after_close.fetch_add(1, Ordering::AcqRel);
            return;
        }
        self.stats
            .last_sprite_count
            .store(self.sprites_this_frame, Ordering::Release);
        self.stats
            .last_shape_count
            .store(self.shapes_this_frame, Ordering::Release);
        self.stats.frames_displayed.fetch_add(1, Ordering::AcqRel);
    }

    fn close(&mut self) {
        self.open = false;
        self.stats.closed.store(true, Ordering::Release);
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
