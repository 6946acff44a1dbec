//! Game settings
//!
//! Playfield size and tuning values. Persisted in LocalStorage on the web;
//! native builds always use the defaults.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SettingsError;

/// What happens to the ball's horizontal speed when it bounces off the paddle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PaddleDeflection {
    /// Only dy is reflected; dx is unchanged
    #[default]
    Reflect,
    /// dx is replaced by the contact offset from paddle center, normalized
    /// to [-1, 1], times `max_dx`
    Offset { max_dx: f32 },
}

impl PaddleDeflection {
    /// New dx after a paddle bounce at `offset` (-1 = left edge, 1 = right edge)
    pub fn apply(&self, dx: f32, offset: f32) -> f32 {
        match *self {
            PaddleDeflection::Reflect => dx,
            PaddleDeflection::Offset { max_dx } => offset.clamp(-1.0, 1.0) * max_dx,
        }
    }
}

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Playfield ===
    pub field_width: f32,
    pub field_height: f32,

    // === Paddle ===
    pub paddle_width: f32,
    pub paddle_height: f32,
    pub paddle_bottom_margin: f32,
    /// Pixels per frame while an arrow key is held
    pub paddle_speed: f32,
    /// Pixels per wheel event
    pub wheel_step: f32,
    pub deflection: PaddleDeflection,

    // === Ball ===
    pub ball_radius: f32,
    pub ball_speed_x: f32,
    pub ball_speed_y: f32,

    // === Bricks ===
    pub brick_rows: usize,
    pub brick_cols: usize,
    pub brick_width: f32,
    pub brick_height: f32,
    pub brick_padding: f32,
    pub brick_offset_top: f32,
    pub brick_offset_left: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            field_width: FIELD_WIDTH,
            field_height: FIELD_HEIGHT,

            paddle_width: PADDLE_WIDTH,
            paddle_height: PADDLE_HEIGHT,
            paddle_bottom_margin: PADDLE_BOTTOM_MARGIN,
            paddle_speed: PADDLE_SPEED,
            wheel_step: WHEEL_STEP,
            deflection: PaddleDeflection::Reflect,

            ball_radius: BALL_RADIUS,
            ball_speed_x: BALL_SPEED_X,
            ball_speed_y: BALL_SPEED_Y,

            brick_rows: BRICK_ROWS,
            brick_cols: BRICK_COLS,
            brick_width: BRICK_WIDTH,
            brick_height: BRICK_HEIGHT,
            brick_padding: BRICK_PADDING,
            brick_offset_top: BRICK_OFFSET_TOP,
            brick_offset_left: BRICK_OFFSET_LEFT,
        }
    }
}

impl Settings {
    /// Top edge of the paddle (fixed for the whole round)
    pub fn paddle_y(&self) -> f32 {
        self.field_height - self.paddle_bottom_margin - self.paddle_height
    }

    /// Paddle x that centers it in the playfield
    pub fn paddle_center_x(&self) -> f32 {
        (self.field_width - self.paddle_width) / 2.0
    }

    /// Total width and height covered by the brick grid, offsets included
    pub fn grid_extent(&self) -> (f32, f32) {
        let cols = self.brick_cols as f32;
        let rows = self.brick_rows as f32;
        let width =
            self.brick_offset_left + cols * self.brick_width + (cols - 1.0) * self.brick_padding;
        let height =
            self.brick_offset_top + rows * self.brick_height + (rows - 1.0) * self.brick_padding;
        (width, height)
    }

    /// Check that the settings describe a playable field
    pub fn validate(&self) -> Result<(), SettingsError> {
        let positive = [
            ("field_width", self.field_width),
            ("field_height", self.field_height),
            ("paddle_width", self.paddle_width),
            ("paddle_height", self.paddle_height),
            ("paddle_speed", self.paddle_speed),
            ("wheel_step", self.wheel_step),
            ("ball_radius", self.ball_radius),
            ("ball_speed_y", self.ball_speed_y),
            ("brick_width", self.brick_width),
            ("brick_height", self.brick_height),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SettingsError::NotPositive { field, value });
            }
        }
        let non_negative = [
            ("paddle_bottom_margin", self.paddle_bottom_margin),
            ("ball_speed_x", self.ball_speed_x),
            ("brick_padding", self.brick_padding),
            ("brick_offset_top", self.brick_offset_top),
            ("brick_offset_left", self.brick_offset_left),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SettingsError::NotPositive { field, value });
            }
        }

        if let PaddleDeflection::Offset { max_dx } = self.deflection {
            if !(max_dx.is_finite() && max_dx >= 0.0) {
                return Err(SettingsError::NotPositive {
                    field: "deflection.max_dx",
                    value: max_dx,
                });
            }
        }

        // Serve spot is one pixel above the paddle, inside [r, W - r]
        let ball_span = 2.0 * self.ball_radius;
        if ball_span > self.field_width || ball_span + 1.0 > self.paddle_y() {
            return Err(SettingsError::BallTooLarge {
                radius: self.ball_radius,
                width: self.field_width,
                height: self.paddle_y(),
            });
        }

        if self.paddle_width >= self.field_width {
            return Err(SettingsError::PaddleTooWide {
                paddle: self.paddle_width,
                field: self.field_width,
            });
        }

        if self.brick_rows == 0 || self.brick_cols == 0 {
            return Err(SettingsError::EmptyGrid);
        }

        let (width, height) = self.grid_extent();
        if width > self.field_width || height > self.paddle_y() - 2.0 * self.ball_radius {
            return Err(SettingsError::GridOverflow { width, height });
        }

        Ok(())
    }

    /// Parse and validate settings from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize for storage
    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string(self)?)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "breakout_r1_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            match self.to_json() {
                Ok(json) => match storage.set_item(Self::STORAGE_KEY, &json) {
                    Ok(()) => log::info!("Settings saved"),
                    Err(_) => log::warn!("LocalStorage rejected settings"),
                },
                Err(e) => log::warn!("Failed to serialize settings: {}", e),
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.paddle_center_x(), (FIELD_WIDTH - PADDLE_WIDTH) / 2.0);
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let settings = Settings::from_json(r#"{ "paddle_speed": 9.0 }"#).unwrap();
        assert_eq!(settings.paddle_speed, 9.0);
        assert_eq!(settings.field_width, FIELD_WIDTH);
        assert_eq!(settings.deflection, PaddleDeflection::Reflect);
    }

    #[test]
    fn test_from_json_deflection_policy() {
        let settings =
            Settings::from_json(r#"{ "deflection": { "mode": "offset", "max_dx": 4.0 } }"#)
                .unwrap();
        assert_eq!(settings.deflection, PaddleDeflection::Offset { max_dx: 4.0 });
    }

    #[test]
    fn test_rejects_bad_json() {
        let err = Settings::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_rejects_invalid_values() {
        let settings = Settings {
            ball_radius: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::NotPositive { field: "ball_radius", .. })
        ));

        let settings = Settings {
            paddle_width: 500.0,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(SettingsError::PaddleTooWide { .. })));

        let settings = Settings {
            brick_cols: 20,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(SettingsError::GridOverflow { .. })));

        let settings = Settings {
            brick_rows: 0,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(SettingsError::EmptyGrid)));

        let settings = Settings {
            paddle_speed: f32::NAN,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_unbounded_deflection() {
        // 1e39 overflows f32 to infinity
        let err = Settings::from_json(r#"{ "deflection": { "mode": "offset", "max_dx": 1e39 } }"#)
            .unwrap_err();
        assert!(matches!(
            err,
            SettingsError::NotPositive { field: "deflection.max_dx", .. }
        ));

        let settings = Settings {
            deflection: PaddleDeflection::Offset { max_dx: -1.0 },
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            deflection: PaddleDeflection::Offset { max_dx: 0.0 },
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_rejects_ball_wider_than_field() {
        let settings = Settings {
            field_width: 30.0,
            paddle_width: 10.0,
            ball_radius: 20.0,
            brick_cols: 1,
            brick_width: 5.0,
            brick_offset_left: 0.0,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(SettingsError::BallTooLarge { .. })));

        // Exactly as wide as the field still fits
        let settings = Settings {
            field_width: 40.0,
            ..settings
        };
        assert!(settings.validate().is_ok());
        let mut state = crate::sim::GameState::new(settings, 1);
        state.start();
        assert!(state.within_bounds());
    }

    #[test]
    fn test_stored_settings_reload() {
        let settings = Settings {
            paddle_speed: 5.0,
            deflection: PaddleDeflection::Offset { max_dx: 3.0 },
            ..Default::default()
        };
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_offset_deflection() {
        let policy = PaddleDeflection::Offset { max_dx: 4.0 };
        assert_eq!(policy.apply(2.0, 0.0), 0.0);
        assert_eq!(policy.apply(2.0, -1.0), -4.0);
        assert_eq!(policy.apply(2.0, 3.0), 4.0);
        assert_eq!(PaddleDeflection::Reflect.apply(-2.0, 0.9), -2.0);
    }
}
