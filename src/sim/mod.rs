//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One step per display frame, velocities in pixels per frame
//! - Seeded RNG only
//! - Stable iteration order (bricks scanned row-major)
//! - No rendering or platform dependencies

pub mod collision;
pub mod input;
pub mod state;
pub mod tick;

pub use collision::{Contact, Rect, reflect_velocity};
pub use input::{InputEvent, InputQueue, InputUnifier, Key};
pub use state::{Ball, Brick, BrickGrid, GamePhase, GameState, Paddle};
pub use tick::{FrameReport, apply_input, step_physics, tick};
