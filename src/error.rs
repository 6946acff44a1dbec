//! Error types
//!
//! Gameplay never fails (positions clamp at the playfield edges); the only
//! fallible surface is loading and validating [`crate::Settings`].

use thiserror::Error;

/// Why a set of settings was rejected
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Stored settings were not valid JSON for this version
    #[error("settings JSON could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),

    /// A dimension or speed that must be positive and finite was not
    #[error("{field} must be positive and finite (got {value})")]
    NotPositive { field: &'static str, value: f32 },

    /// The paddle cannot move inside the playfield
    #[error("paddle width {paddle} does not fit playfield width {field}")]
    PaddleTooWide { paddle: f32, field: f32 },

    /// The ball cannot sit between the side walls or above the paddle
    #[error("ball radius {radius} does not fit a {width} x {height} space")]
    BallTooLarge { radius: f32, width: f32, height: f32 },

    /// The brick grid overflows the playfield
    #[error("brick grid ({width} x {height}) does not fit the playfield above the paddle")]
    GridOverflow { width: f32, height: f32 },

    /// A grid with no bricks would be won before it starts
    #[error("brick grid must have at least one row and one column")]
    EmptyGrid,
}
