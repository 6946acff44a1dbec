//! Input unification
//!
//! Keyboard arrows, wheel notches and touch drags all steer the one paddle.
//! Host event handlers push tagged [`InputEvent`]s into an [`InputQueue`];
//! the game loop drains the queue once per frame through [`InputUnifier`].

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::state::Paddle;

/// Keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Left,
    Right,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value; unrelated keys map to `None`
    pub fn from_dom(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" | "Left" => Some(Key::Left),
            "ArrowRight" | "Right" => Some(Key::Right),
            _ => None,
        }
    }
}

/// A single input event, tagged by source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    /// Vertical scroll delta; positive scrolls down and moves the paddle right
    Wheel { delta_y: f32 },
    TouchStart { x: f32, y: f32 },
    TouchMove { x: f32, y: f32 },
    TouchEnd,
}

/// FIFO of input events waiting for the next frame
#[derive(Debug, Clone, Default)]
pub struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Take every queued event in arrival order
    pub fn drain(&mut self) -> impl Iterator<Item = InputEvent> + '_ {
        self.events.drain(..)
    }
}

/// Held-key flags and touch anchor, updated by events across frames
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputUnifier {
    pub moving_left: bool,
    pub moving_right: bool,
    /// x of the last touch point while a finger is down
    pub touch_x: Option<f32>,
}

impl InputUnifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event.
    ///
    /// Flags and the touch anchor always update. Wheel and touch deltas move
    /// `paddle` immediately (clamped) only when `paddle` is given, i.e. while
    /// the round is running.
    pub fn apply(
        &mut self,
        event: InputEvent,
        paddle: Option<&mut Paddle>,
        field_width: f32,
        wheel_step: f32,
    ) {
        match event {
            InputEvent::KeyDown(Key::Left) => self.moving_left = true,
            InputEvent::KeyDown(Key::Right) => self.moving_right = true,
            InputEvent::KeyUp(Key::Left) => self.moving_left = false,
            InputEvent::KeyUp(Key::Right) => self.moving_right = false,
            InputEvent::Wheel { delta_y } => {
                if let Some(paddle) = paddle {
                    paddle.shift(wheel_shift(delta_y, wheel_step), field_width);
                }
            }
            InputEvent::TouchStart { x, .. } => {
                self.touch_x = x.is_finite().then_some(x);
            }
            InputEvent::TouchMove { x, .. } => {
                if !x.is_finite() {
                    return;
                }
                if let (Some(prev), Some(paddle)) = (self.touch_x, paddle) {
                    paddle.shift(x - prev, field_width);
                }
                self.touch_x = Some(x);
            }
            InputEvent::TouchEnd => self.touch_x = None,
        }
    }

    /// Net keyboard displacement for one frame; opposite keys cancel
    pub fn intent(&self, paddle_speed: f32) -> f32 {
        let right = if self.moving_right { 1.0 } else { 0.0 };
        let left = if self.moving_left { 1.0 } else { 0.0 };
        (right - left) * paddle_speed
    }

    /// Drop held keys and touch (used when a round starts)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Paddle displacement for a wheel event: direction of the delta times the step
#[inline]
pub fn wheel_shift(delta_y: f32, wheel_step: f32) -> f32 {
    if delta_y > 0.0 {
        wheel_step
    } else if delta_y < 0.0 {
        -wheel_step
    } else {
        0.0
    }
}
