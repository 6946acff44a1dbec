//! Breakout R1 - classic brick breaker for small touch/scroll-wheel devices
//!
//! Core modules:
//! - `sim`: Deterministic simulation (input unification, physics, game state)
//! - `runner`: Frame-driven game loop with an explicit tick source
//! - `settings`: Playfield dimensions and tuning, persisted on the web
//! - `harness`: Synthetic input scenarios checking paddle responsiveness
//! - `platform`: Browser feature detection

pub mod error;
pub mod harness;
pub mod platform;
pub mod runner;
pub mod settings;
pub mod sim;

pub use error::SettingsError;
pub use runner::{GameLoop, ManualClock, Renderer, StopToken, TickSource};
pub use settings::{PaddleDeflection, Settings};

/// Game configuration constants (defaults for [`Settings`])
pub mod consts {
    /// Playfield dimensions
    pub const FIELD_WIDTH: f32 = 480.0;
    pub const FIELD_HEIGHT: f32 = 320.0;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 75.0;
    pub const PADDLE_HEIGHT: f32 = 10.0;
    /// Gap between the paddle bottom edge and the playfield bottom
    pub const PADDLE_BOTTOM_MARGIN: f32 = 10.0;
    /// Keyboard movement per frame while an arrow key is held
    pub const PADDLE_SPEED: f32 = 7.0;
    /// Paddle displacement per wheel notch
    pub const WHEEL_STEP: f32 = 20.0;

    /// Ball defaults (speeds in pixels per frame)
    pub const BALL_RADIUS: f32 = 10.0;
    pub const BALL_SPEED_X: f32 = 2.0;
    pub const BALL_SPEED_Y: f32 = 2.0;

    /// Brick grid layout
    pub const BRICK_ROWS: usize = 3;
    pub const BRICK_COLS: usize = 5;
    pub const BRICK_WIDTH: f32 = 75.0;
    pub const BRICK_HEIGHT: f32 = 20.0;
    pub const BRICK_PADDING: f32 = 10.0;
    pub const BRICK_OFFSET_TOP: f32 = 30.0;
    pub const BRICK_OFFSET_LEFT: f32 = 30.0;
}

/// Clamp a paddle x coordinate to `[0, field_width - paddle_width]`
#[inline]
pub fn clamp_paddle_x(x: f32, field_width: f32, paddle_width: f32) -> f32 {
    let max_x = (field_width - paddle_width).max(0.0);
    if x.is_nan() { 0.0 } else { x.clamp(0.0, max_x) }
}
