//! Input events.
//!
//! Events are produced by the window behind a `RenderSurface` and drained by
//! the frame loop. `Closed` starts the quit sequence; everything else is
//! forwarded to the active scene.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Window/input event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// The user asked to close the window.
    Closed,
    /// The window was resized to `width` x `height` pixels.
    Resized { width: u32, height: u32 },
    KeyPressed { code: String },
    KeyReleased { code: String },
    MouseMoved { position: Vec2 },
    MouseButtonPressed { button: u8, position: Vec2 },
    MouseButtonReleased { button: u8, position: Vec2 },
    TextEntered { ch: char },
    FocusLost,
    FocusGained,
}

impl InputEvent {
    pub fn is_close_request(&self) -> bool {
        matches!(self, InputEvent::Closed)
    }
}

/// FIFO of pending events.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: VecDeque<InputEvent>,
}

impl EventQueue {
    /// Pushes an event into the queue.
    pub fn push(&mut self, e: InputEvent) {
        self.pending.push_back(e);
    }

    /// Pops the oldest event.
    pub fn poll(&mut self) -> Option<InputEvent> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
