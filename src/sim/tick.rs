//! Per-frame simulation step
//!
//! Input is applied first, then the ball moves and collides. Velocities are
//! in pixels per frame, so one call advances exactly one display frame.

use super::collision::{paddle_offset, resolve_contact, wall_contacts};
use super::input::{InputEvent, InputUnifier};
use super::state::{GamePhase, GameState};

/// What happened during one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Ball bounced off the paddle
    pub paddle_hit: bool,
    /// Brick destroyed this frame (row, col)
    pub brick_destroyed: Option<(usize, usize)>,
    /// Phase entered this frame, if it changed
    pub transition: Option<GamePhase>,
}

/// Drain `events` into the unifier and move the paddle.
///
/// Wheel and touch displacements land in arrival order, each clamped; the
/// held-key intent is applied once afterwards.
pub fn apply_input(
    state: &mut GameState,
    unifier: &mut InputUnifier,
    events: impl IntoIterator<Item = InputEvent>,
) {
    let running = state.phase == GamePhase::Running;
    let field_width = state.settings.field_width;
    let wheel_step = state.settings.wheel_step;

    for event in events {
        let paddle = running.then_some(&mut state.paddle);
        unifier.apply(event, paddle, field_width, wheel_step);
    }

    if running {
        let intent = unifier.intent(state.settings.paddle_speed);
        state.paddle.shift(intent, field_width);
    }
}

/// Advance ball physics by one frame
pub fn step_physics(state: &mut GameState) -> FrameReport {
    let mut report = FrameReport::default();
    if state.phase != GamePhase::Running {
        return report;
    }

    state.frame += 1;
    let field_width = state.settings.field_width;
    let field_height = state.settings.field_height;
    let ball = &mut state.ball;

    // 1. Move
    ball.pos += ball.vel;

    // 2. Walls (left, right, top)
    for contact in wall_contacts(ball.pos, ball.radius, field_width).into_iter().flatten() {
        resolve_contact(&mut ball.pos, &mut ball.vel, &contact);
    }

    // 3. Paddle, only while falling
    let paddle_rect = state.paddle.rect();
    if ball.vel.y > 0.0 && paddle_rect.overlaps_circle(ball.pos, ball.radius) {
        let offset = paddle_offset(ball.pos.x, &paddle_rect);
        ball.vel.y = -ball.vel.y.abs();
        ball.vel.x = state.settings.deflection.apply(ball.vel.x, offset);
        ball.pos.y = paddle_rect.y - ball.radius;
        report.paddle_hit = true;
        log::trace!("Paddle hit at offset {:.2}", offset);
    }

    // 4. Bricks, at most one per frame
    if let Some((row, col)) = state.bricks.first_hit(ball.pos, ball.radius) {
        state.bricks.kill(row, col);
        ball.vel.y = -ball.vel.y;
        state.score += 1;
        report.brick_destroyed = Some((row, col));
        log::debug!("Brick ({}, {}) destroyed, score {}", row, col, state.score);
    }

    // 5. Terminal checks
    if ball.pos.y > field_height && !report.paddle_hit {
        ball.pos.y = field_height;
        state.phase = GamePhase::GameOver;
        report.transition = Some(GamePhase::GameOver);
        log::info!("Game over after {} frames, score {}", state.frame, state.score);
    } else if state.bricks.alive_count() == 0 {
        state.phase = GamePhase::Won;
        report.transition = Some(GamePhase::Won);
        log::info!("All bricks cleared in {} frames", state.frame);
    }

    report
}

/// Advance the game by one frame: input, then physics
pub fn tick(
    state: &mut GameState,
    unifier: &mut InputUnifier,
    events: impl IntoIterator<Item = InputEvent>,
) -> FrameReport {
    apply_input(state, unifier, events);
    step_physics(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{PaddleDeflection, Settings};
    use crate::sim::input::Key;
    use glam::Vec2;

    fn running() -> GameState {
        let mut state = GameState::new(Settings::default(), 12345);
        state.start();
        state
    }

    fn no_input() -> std::iter::Empty<InputEvent> {
        std::iter::empty()
    }

    #[test]
    fn test_idle_does_not_move() {
        let mut state = GameState::new(Settings::default(), 1);
        let mut unifier = InputUnifier::new();
        let ball = state.ball.pos;
        let paddle = state.paddle.x;

        let report = tick(
            &mut state,
            &mut unifier,
            [InputEvent::KeyDown(Key::Right), InputEvent::Wheel { delta_y: 120.0 }],
        );
        assert_eq!(report, FrameReport::default());
        assert_eq!(state.ball.pos, ball);
        assert_eq!(state.paddle.x, paddle);
        // Flags still track the keyboard
        assert!(unifier.moving_right);
    }

    #[test]
    fn test_hold_right_moves_paddle() {
        // 500ms held at 50ms ticks
        let mut state = running();
        let mut unifier = InputUnifier::new();
        let max_x = state.settings.field_width - state.settings.paddle_width;
        let mut last = state.paddle.x;

        tick(&mut state, &mut unifier, [InputEvent::KeyDown(Key::Right)]);
        assert!(state.paddle.x > last);
        last = state.paddle.x;
        for _ in 1..10 {
            tick(&mut state, &mut unifier, no_input());
            assert!(state.paddle.x > last);
            assert!(state.paddle.x <= max_x);
            last = state.paddle.x;
        }
    }

    #[test]
    fn test_opposite_keys_hold_still() {
        let mut state = running();
        let mut unifier = InputUnifier::new();
        let start = state.paddle.x;
        tick(
            &mut state,
            &mut unifier,
            [InputEvent::KeyDown(Key::Left), InputEvent::KeyDown(Key::Right)],
        );
        for _ in 0..5 {
            tick(&mut state, &mut unifier, no_input());
        }
        assert_eq!(state.paddle.x, start);
    }

    #[test]
    fn test_right_wall_reflects_once() {
        let mut state = running();
        let r = state.ball.radius;
        let w = state.settings.field_width;
        state.ball.pos = Vec2::new(w - r - 1.0, 200.0);
        state.ball.vel = Vec2::new(3.0, -1.0);

        step_physics(&mut state);
        assert_eq!(state.ball.pos.x, w - r);
        assert_eq!(state.ball.vel.x, -3.0);

        step_physics(&mut state);
        assert_eq!(state.ball.vel.x, -3.0);
        assert!(state.ball.pos.x < w - r);
    }

    #[test]
    fn test_left_and_top_walls() {
        let mut state = running();
        let r = state.ball.radius;
        state.ball.pos = Vec2::new(r + 1.0, r + 1.0);
        state.ball.vel = Vec2::new(-2.0, -2.0);

        step_physics(&mut state);
        assert_eq!(state.ball.pos, Vec2::new(r, r));
        assert_eq!(state.ball.vel, Vec2::new(2.0, 2.0));
    }

    #[test]
    fn test_paddle_bounce_at_center() {
        let mut state = running();
        let paddle_top = state.paddle.y;
        state.ball.pos = Vec2::new(state.paddle.center_x(), paddle_top - state.ball.radius);
        state.ball.vel = Vec2::new(0.0, 2.0);

        let report = step_physics(&mut state);
        assert!(report.paddle_hit);
        assert_eq!(state.ball.vel.y, -2.0);
        assert_eq!(state.ball.vel.x, 0.0);
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_paddle_ignored_while_rising() {
        let mut state = running();
        state.ball.pos = Vec2::new(state.paddle.center_x(), state.paddle.y + 2.0);
        state.ball.vel = Vec2::new(0.0, -2.0);

        let report = step_physics(&mut state);
        assert!(!report.paddle_hit);
        assert_eq!(state.ball.vel.y, -2.0);
    }

    #[test]
    fn test_offset_deflection() {
        let settings = Settings {
            deflection: PaddleDeflection::Offset { max_dx: 4.0 },
            ..Default::default()
        };
        let mut state = GameState::new(settings, 3);
        state.start();
        let right_edge = state.paddle.x + state.paddle.width;
        state.ball.pos = Vec2::new(right_edge, state.paddle.y - state.ball.radius);
        state.ball.vel = Vec2::new(0.0, 2.0);

        step_physics(&mut state);
        assert_eq!(state.ball.vel.y, -2.0);
        assert_eq!(state.ball.vel.x, 4.0);
    }

    #[test]
    fn test_brick_destroyed_once() {
        let mut state = running();
        let rect = state.bricks.rect_of(2, 1);
        state.ball.pos = Vec2::new(rect.x + rect.w / 2.0, rect.y + rect.h + state.ball.radius + 1.0);
        state.ball.vel = Vec2::new(0.0, -2.0);

        let report = step_physics(&mut state);
        assert_eq!(report.brick_destroyed, Some((2, 1)));
        assert_eq!(state.ball.vel.y, 2.0);
        assert_eq!(state.score, 1);
        assert_eq!(state.bricks.alive_count(), 14);

        // Same spot again: the brick is gone
        state.ball.pos = Vec2::new(rect.x + rect.w / 2.0, rect.y + rect.h + state.ball.radius + 1.0);
        state.ball.vel = Vec2::new(0.0, -2.0);
        let report = step_physics(&mut state);
        assert_ne!(report.brick_destroyed, Some((2, 1)));
    }

    #[test]
    fn test_one_brick_per_frame() {
        let mut state = running();
        // Between (0,0) and (0,1), overlapping both
        let left = state.bricks.rect_of(0, 0);
        state.ball.pos = Vec2::new(left.x + left.w + 5.0, left.y + left.h / 2.0);
        state.ball.vel = Vec2::ZERO;

        let report = step_physics(&mut state);
        assert_eq!(report.brick_destroyed, Some((0, 0)));
        assert_eq!(state.bricks.alive_count(), 14);
    }

    #[test]
    fn test_win_when_all_bricks_dead() {
        let mut state = running();
        for row in 0..state.bricks.rows {
            for col in 0..state.bricks.cols {
                state.bricks.kill(row, col);
            }
        }
        let report = step_physics(&mut state);
        assert_eq!(report.transition, Some(GamePhase::Won));
        assert_eq!(state.phase, GamePhase::Won);
    }

    #[test]
    fn test_game_over_exactly_once() {
        let mut state = running();
        state.paddle.x = 0.0;
        let h = state.settings.field_height;
        state.ball.pos = Vec2::new(400.0, h - 1.0);
        state.ball.vel = Vec2::new(0.0, 3.0);

        let report = step_physics(&mut state);
        assert_eq!(report.transition, Some(GamePhase::GameOver));
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.ball.pos.y <= h);

        let report = step_physics(&mut state);
        assert_eq!(report, FrameReport::default());
        assert_eq!(state.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_determinism() {
        let mut state1 = GameState::new(Settings::default(), 99999);
        let mut state2 = GameState::new(Settings::default(), 99999);
        state1.start();
        state2.start();
        let mut u1 = InputUnifier::new();
        let mut u2 = InputUnifier::new();

        let inputs = [
            vec![InputEvent::KeyDown(Key::Left)],
            vec![],
            vec![InputEvent::Wheel { delta_y: 120.0 }],
            vec![InputEvent::KeyUp(Key::Left), InputEvent::TouchStart { x: 10.0, y: 0.0 }],
            vec![InputEvent::TouchMove { x: 40.0, y: 0.0 }],
        ];

        for _ in 0..40 {
            for events in &inputs {
                tick(&mut state1, &mut u1, events.iter().copied());
                tick(&mut state2, &mut u2, events.iter().copied());
            }
        }

        assert_eq!(state1.frame, state2.frame);
        assert_eq!(state1.ball.pos, state2.ball.pos);
        assert_eq!(state1.paddle.x, state2.paddle.x);
        assert_eq!(state1.phase, state2.phase);
    }
}
