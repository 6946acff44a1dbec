//! Game state and core simulation types
//!
//! Everything the frame step reads or writes lives in [`GameState`]; the
//! renderer only ever borrows it immutably.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use crate::clamp_paddle_x;
use crate::settings::Settings;

/// Current phase of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Page loaded, waiting for the start control
    Idle,
    /// Active gameplay
    Running,
    /// Every brick destroyed
    Won,
    /// Ball fell past the paddle
    GameOver,
}

impl GamePhase {
    /// Whether the round has ended (won or lost)
    pub fn is_ended(&self) -> bool {
        matches!(self, GamePhase::Won | GamePhase::GameOver)
    }
}

/// The ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    /// Velocity in pixels per frame
    pub vel: Vec2,
    pub radius: f32,
}

/// The player's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    /// Left edge
    pub x: f32,
    /// Top edge (fixed)
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Paddle {
    /// Paddle centered horizontally above the bottom margin
    pub fn new(settings: &Settings) -> Self {
        Self {
            x: settings.paddle_center_x(),
            y: settings.paddle_y(),
            width: settings.paddle_width,
            height: settings.paddle_height,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Move by `dx`, staying inside `[0, field_width - width]`
    pub fn shift(&mut self, dx: f32, field_width: f32) {
        if dx.is_finite() {
            self.x = clamp_paddle_x(self.x + dx, field_width, self.width);
        }
    }
}

/// A brick cell; its rectangle is derived from its grid position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Brick {
    pub row: usize,
    pub col: usize,
    pub alive: bool,
}

/// Fixed-size grid of bricks, stored row-major
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrickGrid {
    pub rows: usize,
    pub cols: usize,
    bricks: Vec<Brick>,
    width: f32,
    height: f32,
    padding: f32,
    offset_top: f32,
    offset_left: f32,
}

impl BrickGrid {
    /// Full grid, every brick alive
    pub fn new(settings: &Settings) -> Self {
        let (rows, cols) = (settings.brick_rows, settings.brick_cols);
        let bricks = (0..rows)
            .flat_map(|row| (0..cols).map(move |col| Brick { row, col, alive: true }))
            .collect();
        Self {
            rows,
            cols,
            bricks,
            width: settings.brick_width,
            height: settings.brick_height,
            padding: settings.brick_padding,
            offset_top: settings.brick_offset_top,
            offset_left: settings.brick_offset_left,
        }
    }

    /// Bricks in row-major order
    pub fn iter(&self) -> impl Iterator<Item = &Brick> {
        self.bricks.iter()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Brick> {
        if row < self.rows && col < self.cols {
            self.bricks.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// Bounding rectangle of the cell at (row, col)
    pub fn rect_of(&self, row: usize, col: usize) -> Rect {
        Rect::new(
            self.offset_left + col as f32 * (self.width + self.padding),
            self.offset_top + row as f32 * (self.height + self.padding),
            self.width,
            self.height,
        )
    }

    pub fn alive_count(&self) -> usize {
        self.bricks.iter().filter(|b| b.alive).count()
    }

    /// Destroy a brick. Returns false if it was already dead or out of range.
    pub fn kill(&mut self, row: usize, col: usize) -> bool {
        if row >= self.rows || col >= self.cols {
            return false;
        }
        let brick = &mut self.bricks[row * self.cols + col];
        let was_alive = brick.alive;
        brick.alive = false;
        was_alive
    }

    /// First alive brick (row-major) whose rectangle the circle overlaps
    pub fn first_hit(&self, center: Vec2, radius: f32) -> Option<(usize, usize)> {
        self.bricks
            .iter()
            .filter(|b| b.alive)
            .find(|b| self.rect_of(b.row, b.col).overlaps_circle(center, radius))
            .map(|b| (b.row, b.col))
    }
}

/// Complete game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub settings: Settings,
    /// Seed for the launch direction of the next round
    pub seed: u64,
    pub phase: GamePhase,
    pub paddle: Paddle,
    pub ball: Ball,
    pub bricks: BrickGrid,
    /// Bricks destroyed this round
    pub score: u32,
    /// Frames simulated this round
    pub frame: u64,
    /// Rounds started since creation
    pub round: u32,
}

impl GameState {
    /// Fresh state in the idle phase
    pub fn new(settings: Settings, seed: u64) -> Self {
        let paddle = Paddle::new(&settings);
        let bricks = BrickGrid::new(&settings);
        let ball = Self::serve_ball(&settings, seed);
        Self {
            settings,
            seed,
            phase: GamePhase::Idle,
            paddle,
            ball,
            bricks,
            score: 0,
            frame: 0,
            round: 0,
        }
    }

    /// Ball resting above the paddle center, heading up and to a seeded side
    fn serve_ball(settings: &Settings, seed: u64) -> Ball {
        let mut rng = Pcg32::seed_from_u64(seed);
        let dx = if rng.random_bool(0.5) {
            settings.ball_speed_x
        } else {
            -settings.ball_speed_x
        };
        let y = settings.paddle_y() - settings.ball_radius - 1.0;
        Ball {
            pos: Vec2::new(settings.field_width / 2.0, y),
            vel: Vec2::new(dx, -settings.ball_speed_y),
            radius: settings.ball_radius,
        }
    }

    /// Reset paddle, ball, bricks and score, and enter [`GamePhase::Running`]
    pub fn start(&mut self) {
        self.round += 1;
        let round_seed = self.seed.wrapping_add(self.round as u64);
        self.paddle = Paddle::new(&self.settings);
        self.ball = Self::serve_ball(&self.settings, round_seed);
        self.bricks = BrickGrid::new(&self.settings);
        self.score = 0;
        self.frame = 0;
        self.phase = GamePhase::Running;
        log::info!("Round {} started", self.round);
    }

    /// Positions are finite and inside the playfield
    pub fn within_bounds(&self) -> bool {
        let s = &self.settings;
        let paddle_ok = self.paddle.x.is_finite()
            && self.paddle.x >= 0.0
            && self.paddle.x <= s.field_width - self.paddle.width;
        let ball = &self.ball;
        let ball_ok = ball.pos.is_finite()
            && ball.pos.x >= ball.radius
            && ball.pos.x <= s.field_width - ball.radius
            && ball.pos.y >= ball.radius
            && ball.pos.y <= s.field_height;
        paddle_ok && ball_ok
    }
}
