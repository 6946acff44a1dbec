//! Synthetic input scenarios
//!
//! Drives a headless [`GameLoop`] with scripted keyboard, wheel and touch
//! events on a [`ManualClock`] and checks that the paddle responds to each
//! input method. A seeded random-walk agent then hammers the game with
//! arbitrary input and checks the bounds invariants every frame.
//!
//! Frame rates in the report are synthetic (fixed-step clock) unless
//! replaced with live stats via [`HarnessReport::with_live_performance`].

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::platform::{self, FeatureSupport};
use crate::runner::{FrameStats, GameLoop, Headless, ManualClock, TickSource};
use crate::settings::Settings;
use crate::sim::{InputEvent, Key};

/// Minimum acceptable average frame rate
pub const TARGET_FPS: f64 = 30.0;
/// One 60 Hz frame
pub const RENDER_BUDGET_MS: f64 = 16.0;
pub const INPUT_LATENCY_BUDGET_MS: f64 = 100.0;

/// Outcome of one scenario
#[derive(Debug, Clone, Serialize)]
pub struct TestOutcome {
    pub passed: bool,
    pub details: String,
}

impl TestOutcome {
    fn new(passed: bool, details: String) -> Self {
        Self { passed, details }
    }

    fn status(&self) -> &'static str {
        if self.passed { "PASSED" } else { "FAILED" }
    }
}

/// Frame rate and timing summary with tuning hints
#[derive(Debug, Clone, Default, Serialize)]
pub struct PerfSummary {
    /// Frames came from a fixed-step clock, so FPS reflects the clock only
    pub synthetic_clock: bool,
    pub avg_fps: f64,
    pub min_fps: u32,
    pub max_fps: u32,
    pub avg_render_ms: f64,
    pub max_render_ms: f64,
    pub avg_input_latency_ms: f64,
    pub max_input_latency_ms: f64,
    pub recommendations: Vec<String>,
}

impl PerfSummary {
    pub fn from_stats(stats: &FrameStats, synthetic_clock: bool) -> Self {
        let fps = &stats.fps_samples;
        let mut recommendations = Vec::new();
        if !fps.is_empty() && fps.mean() < TARGET_FPS {
            recommendations.push(format!(
                "FPS below target ({}) - optimize rendering and game loop",
                TARGET_FPS
            ));
        }
        if stats.render_ms.mean() > RENDER_BUDGET_MS {
            recommendations
                .push("Render time too high - reduce drawing operations".to_string());
        }
        if stats.input_ms.mean() > INPUT_LATENCY_BUDGET_MS {
            recommendations.push("Input latency too high - optimize event handlers".to_string());
        }

        Self {
            synthetic_clock,
            avg_fps: fps.mean(),
            min_fps: fps.min.round() as u32,
            max_fps: fps.max.round() as u32,
            avg_render_ms: stats.render_ms.mean(),
            max_render_ms: stats.render_ms.max,
            avg_input_latency_ms: stats.input_ms.mean(),
            max_input_latency_ms: stats.input_ms.max,
            recommendations,
        }
    }
}

/// Results of a full harness run
#[derive(Debug, Clone, Serialize)]
pub struct HarnessReport {
    /// Milliseconds since the Unix epoch when the run finished
    pub timestamp_ms: f64,
    pub rapid_input_changes: TestOutcome,
    pub multiple_simultaneous_inputs: TestOutcome,
    /// `None` outside a browser
    pub browser_compatibility: Option<TestOutcome>,
    pub input_method_differences: TestOutcome,
    pub scroll_wheel_input: TestOutcome,
    pub keyboard_taps: TestOutcome,
    pub invariant_fuzz: TestOutcome,
    pub performance: PerfSummary,
}

impl HarnessReport {
    fn outcomes(&self) -> Vec<(&'static str, &TestOutcome)> {
        let mut outcomes = vec![
            ("rapidInputChanges", &self.rapid_input_changes),
            ("multipleSimultaneousInputs", &self.multiple_simultaneous_inputs),
        ];
        if let Some(compat) = &self.browser_compatibility {
            outcomes.push(("browserCompatibility", compat));
        }
        outcomes.push(("inputMethodDifferences", &self.input_method_differences));
        outcomes.push(("scrollWheelInput", &self.scroll_wheel_input));
        outcomes.push(("keyboardTaps", &self.keyboard_taps));
        outcomes.push(("invariantFuzz", &self.invariant_fuzz));
        outcomes
    }

    pub fn all_passed(&self) -> bool {
        self.outcomes().iter().all(|(_, o)| o.passed)
    }

    /// Replace the synthetic frame timings with ones measured by a live loop
    pub fn with_live_performance(mut self, stats: &FrameStats) -> Self {
        self.performance = PerfSummary::from_stats(stats, false);
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the results to the log
    pub fn log_summary(&self) {
        log::info!("===== BREAKOUT EDGE CASE TEST RESULTS =====");
        for (name, outcome) in self.outcomes() {
            log::info!("{}: {}", name, outcome.status());
            log::info!("  {}", outcome.details);
        }
        if self.browser_compatibility.is_none() {
            log::info!("browserCompatibility: skipped (no browser)");
        }
        let perf = &self.performance;
        log::info!(
            "Average FPS: {:.2}{}",
            perf.avg_fps,
            if perf.synthetic_clock { " (synthetic clock)" } else { "" }
        );
        log::info!("Average render time: {:.2}ms", perf.avg_render_ms);
        log::info!("Average input latency: {:.2}ms", perf.avg_input_latency_ms);
        for rec in &perf.recommendations {
            log::warn!("- {}", rec);
        }
        if self.all_passed() {
            log::info!("Overall Result: ALL TESTS PASSED");
        } else {
            log::warn!("Overall Result: SOME TESTS FAILED");
        }
    }
}

/// Runs the scenarios against a private game instance
pub struct Harness {
    game: GameLoop,
    clock: ManualClock,
    seed: u64,
    fuzz_frames: u64,
}

impl Harness {
    pub fn new(settings: Settings, seed: u64) -> Self {
        Self {
            game: GameLoop::new(settings, seed),
            clock: ManualClock::display_rate(),
            seed,
            fuzz_frames: 3600,
        }
    }

    /// Number of frames the random-walk agent plays
    pub fn with_fuzz_frames(mut self, frames: u64) -> Self {
        self.fuzz_frames = frames;
        self
    }

    /// Run every scenario
    pub fn run(mut self) -> HarnessReport {
        log::info!("Starting Breakout edge case tests (seed {})", self.seed);

        let rapid_input_changes = self.rapid_input_changes();
        let multiple_simultaneous_inputs = self.multiple_simultaneous_inputs();
        let browser_compatibility = platform::probe().map(browser_compatibility);
        let input_method_differences = self.input_method_differences();
        let scroll_wheel_input = self.scroll_wheel_input();
        let keyboard_taps = self.keyboard_taps();
        let invariant_fuzz = self.invariant_fuzz();
        let performance = PerfSummary::from_stats(&self.game.stats, true);

        HarnessReport {
            timestamp_ms: platform::unix_time_ms(),
            rapid_input_changes,
            multiple_simultaneous_inputs,
            browser_compatibility,
            input_method_differences,
            scroll_wheel_input,
            keyboard_taps,
            invariant_fuzz,
            performance,
        }
    }

    fn center_paddle(&mut self) -> f32 {
        let x = self.game.state.settings.paddle_center_x();
        self.game.state.paddle.x = x;
        x
    }

    /// Start a new round with the paddle centered
    fn fresh_round(&mut self) -> f32 {
        self.game.start();
        self.center_paddle()
    }

    /// Let `ms` of frames pass; returns the largest single-frame paddle move
    fn wait(&mut self, ms: f64) -> f32 {
        let mut max_step: f32 = 0.0;
        for _ in 0..self.clock.frames_for(ms) {
            if !self.game.should_continue() {
                break;
            }
            let Some(time) = self.clock.next_frame() else {
                break;
            };
            let before = self.game.state.paddle.x;
            self.game.frame(time, &mut Headless);
            max_step = max_step.max((self.game.state.paddle.x - before).abs());
        }
        max_step
    }

    fn release_keys(&mut self) {
        self.game.push_input(InputEvent::KeyUp(Key::Left));
        self.game.push_input(InputEvent::KeyUp(Key::Right));
    }

    /// Fast alternating left/right presses move the paddle smoothly
    fn rapid_input_changes(&mut self) -> TestOutcome {
        log::info!("Testing rapid input changes...");
        let start = self.fresh_round();
        let speed = self.game.state.settings.paddle_speed;

        let mut moved = false;
        let mut max_step: f32 = 0.0;
        for i in 0..20 {
            let key = if i % 2 == 0 { Key::Right } else { Key::Left };
            self.game.push_input(InputEvent::KeyDown(key));
            max_step = max_step.max(self.wait(50.0));
            moved |= self.game.state.paddle.x != start;
            self.game.push_input(InputEvent::KeyUp(key));
        }

        self.release_keys();
        self.wait(500.0);

        let smooth = max_step <= speed + f32::EPSILON;
        TestOutcome::new(
            moved && smooth,
            format!(
                "Paddle {} rapid input changes, largest frame step {:.1}px (limit {:.1}px)",
                if moved { "responded to" } else { "did not respond to" },
                max_step,
                speed
            ),
        )
    }

    /// Opposite arrows cancel; a wheel notch still moves the paddle
    fn multiple_simultaneous_inputs(&mut self) -> TestOutcome {
        log::info!("Testing multiple simultaneous inputs...");
        let start = self.fresh_round();

        self.game.push_input(InputEvent::KeyDown(Key::Left));
        self.game.push_input(InputEvent::KeyDown(Key::Right));
        self.wait(500.0);
        let after_keys = self.game.state.paddle.x;

        self.game.push_input(InputEvent::Wheel { delta_y: 120.0 });
        self.wait(500.0);
        let after_wheel = self.game.state.paddle.x;

        self.release_keys();
        self.wait(500.0);

        let keys_cancelled = after_keys == start;
        let wheel_handled = after_wheel != after_keys;
        TestOutcome::new(
            keys_cancelled && wheel_handled,
            format!(
                "Conflicting keys {}, wheel input {}",
                if keys_cancelled { "cancelled out" } else { "moved the paddle" },
                if wheel_handled { "was handled" } else { "was not handled" }
            ),
        )
    }

    /// Keyboard, wheel and touch each move the paddle on their own
    fn input_method_differences(&mut self) -> TestOutcome {
        log::info!("Testing input method differences...");
        self.game.start();
        let width = self.game.state.settings.field_width;
        let height = self.game.state.settings.field_height;

        let center = self.center_paddle();
        self.game.push_input(InputEvent::KeyDown(Key::Right));
        self.wait(300.0);
        self.game.push_input(InputEvent::KeyUp(Key::Right));
        self.wait(0.0);
        let keyboard_moved = self.game.state.paddle.x != center;

        self.center_paddle();
        self.wait(300.0);
        self.game.push_input(InputEvent::Wheel { delta_y: 120.0 });
        self.wait(300.0);
        let wheel_moved = self.game.state.paddle.x != center;

        self.center_paddle();
        self.wait(300.0);
        self.game.push_input(InputEvent::TouchStart {
            x: width / 4.0,
            y: height / 2.0,
        });
        self.wait(100.0);
        self.game.push_input(InputEvent::TouchMove {
            x: width / 2.0,
            y: height / 2.0,
        });
        self.wait(300.0);
        let touch_moved = self.game.state.paddle.x != center;
        self.game.push_input(InputEvent::TouchEnd);
        self.wait(0.0);

        let worked = |ok: bool| if ok { "Worked" } else { "Failed" };
        TestOutcome::new(
            keyboard_moved && wheel_moved && touch_moved,
            format!(
                "Keyboard: {}, Wheel: {}, Touch: {}",
                worked(keyboard_moved),
                worked(wheel_moved),
                worked(touch_moved)
            ),
        )
    }

    /// One wheel event, then `ms` of frames; true if the paddle moved by `expected`
    fn wheel_moves_by(&mut self, delta_y: f32, expected: f32) -> bool {
        let before = self.game.state.paddle.x;
        self.game.push_input(InputEvent::Wheel { delta_y });
        self.wait(100.0);
        (self.game.state.paddle.x - before - expected).abs() < 1e-3
    }

    /// Every wheel event moves the paddle one step in the delta's direction,
    /// whatever its magnitude, and never past a wall
    fn scroll_wheel_input(&mut self) -> TestOutcome {
        log::info!("Testing scroll wheel input...");
        let step = self.game.state.settings.wheel_step;
        let mut events = 0;
        let mut mismatched = 0;

        self.fresh_round();
        for speed in [120.0, 240.0, 480.0] {
            for delta_y in [speed, -speed] {
                events += 1;
                if !self.wheel_moves_by(delta_y, step.copysign(delta_y)) {
                    mismatched += 1;
                }
            }
        }

        let start = self.fresh_round();
        for i in 0..10 {
            let delta_y: f32 = if i % 2 == 0 { 120.0 } else { -120.0 };
            events += 1;
            if !self.wheel_moves_by(delta_y, step.copysign(delta_y)) {
                mismatched += 1;
            }
        }
        let returned = self.game.state.paddle.x == start;

        let max_x = self.game.state.settings.field_width - self.game.state.paddle.width;
        self.game.state.paddle.x = max_x - step / 2.0;
        self.wheel_moves_by(480.0, step / 2.0);
        let clamped = self.game.state.paddle.x == max_x;

        TestOutcome::new(
            mismatched == 0 && returned && clamped,
            format!(
                "{}/{} wheel events moved exactly {:.1}px, alternating scrolls {}, wall clamp {}",
                events - mismatched,
                events,
                step,
                if returned { "cancelled out" } else { "drifted" },
                if clamped { "held" } else { "failed" }
            ),
        )
    }

    /// Press, hold for `hold_ms`, release; true if the paddle moved by
    /// hold frames times paddle speed
    fn tap_moves(&mut self, key: Key, hold_ms: f64) -> bool {
        let speed = self.game.state.settings.paddle_speed;
        let direction = match key {
            Key::Left => -1.0,
            Key::Right => 1.0,
        };
        let expected = direction * self.clock.frames_for(hold_ms) as f32 * speed;

        let before = self.game.state.paddle.x;
        self.game.push_input(InputEvent::KeyDown(key));
        self.wait(hold_ms);
        self.game.push_input(InputEvent::KeyUp(key));
        (self.game.state.paddle.x - before - expected).abs() < 1e-3
    }

    /// Slow and fast arrow taps each move the paddle by hold time x speed
    fn keyboard_taps(&mut self) -> TestOutcome {
        log::info!("Testing keyboard taps...");
        let mut taps = 0;
        let mut mismatched = 0;

        let start = self.fresh_round();
        for _ in 0..5 {
            for key in [Key::Right, Key::Left] {
                taps += 1;
                if !self.tap_moves(key, 200.0) {
                    mismatched += 1;
                }
            }
        }
        let slow_returned = self.game.state.paddle.x == start;

        let start = self.fresh_round();
        for i in 0..10 {
            let key = if i % 2 == 0 { Key::Right } else { Key::Left };
            taps += 1;
            if !self.tap_moves(key, 50.0) {
                mismatched += 1;
            }
        }
        let fast_returned = self.game.state.paddle.x == start;

        self.release_keys();
        self.wait(0.0);

        TestOutcome::new(
            mismatched == 0 && slow_returned && fast_returned,
            format!(
                "{}/{} taps moved the expected distance, paddle {} to its start",
                taps - mismatched,
                taps,
                if slow_returned && fast_returned { "returned" } else { "did not return" }
            ),
        )
    }

    /// Random input for many frames never breaks the bounds invariants
    fn invariant_fuzz(&mut self) -> TestOutcome {
        log::info!("Fuzzing with random input for {} frames...", self.fuzz_frames);
        let mut agent = RandomWalkAgent::new(self.seed, &self.game.state.settings);
        self.game.start();
        self.game.stats.clear();
        let total_bricks = self.game.state.bricks.rows * self.game.state.bricks.cols;

        let mut rounds = 1u32;
        let mut violations = Vec::new();
        let mut alive = self.game.state.bricks.alive_count();

        for _ in 0..self.fuzz_frames {
            if !self.game.should_continue() {
                self.game.start();
                alive = self.game.state.bricks.alive_count();
                rounds += 1;
            }
            if let Some(event) = agent.next_input() {
                self.game.push_input(event);
            }
            let Some(time) = self.clock.next_frame() else {
                break;
            };
            self.game.frame(time, &mut Headless);

            let state = &self.game.state;
            let now_alive = state.bricks.alive_count();
            if !state.within_bounds() {
                violations.push(format!("frame {}: out of bounds", state.frame));
            }
            if now_alive > alive {
                violations.push(format!("frame {}: brick revived", state.frame));
            }
            if now_alive + state.score as usize != total_bricks {
                violations.push(format!("frame {}: score out of sync", state.frame));
            }
            alive = now_alive;
        }

        for v in violations.iter().take(5) {
            log::warn!("Invariant violation at {}", v);
        }
        TestOutcome::new(
            violations.is_empty(),
            format!(
                "{} frames over {} rounds, {} invariant violations",
                self.fuzz_frames,
                rounds,
                violations.len()
            ),
        )
    }
}

/// Checks that the browser provides everything the game needs
pub fn browser_compatibility(features: FeatureSupport) -> TestOutcome {
    let available = features.all_available();
    TestOutcome::new(
        available,
        format!(
            "Required browser features: {} ({:?})",
            if available { "All available" } else { "Some missing" },
            features
        ),
    )
}

/// Seeded agent emitting a random input event (or none) each frame
pub struct RandomWalkAgent {
    rng: Pcg32,
    field_width: f32,
    touch_x: f32,
}

impl RandomWalkAgent {
    pub fn new(seed: u64, settings: &Settings) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            field_width: settings.field_width,
            touch_x: settings.field_width / 2.0,
        }
    }

    pub fn next_input(&mut self) -> Option<InputEvent> {
        let event = match self.rng.random_range(0..10) {
            0 => InputEvent::KeyDown(Key::Left),
            1 => InputEvent::KeyDown(Key::Right),
            2 => InputEvent::KeyUp(Key::Left),
            3 => InputEvent::KeyUp(Key::Right),
            4 => InputEvent::Wheel {
                delta_y: self.rng.random_range(-480.0..480.0),
            },
            5 => {
                self.touch_x = self.rng.random_range(0.0..self.field_width);
                InputEvent::TouchStart {
                    x: self.touch_x,
                    y: 0.0,
                }
            }
            6 => {
                // Drags may leave the canvas entirely
                self.touch_x += self.rng.random_range(-200.0..200.0);
                InputEvent::TouchMove {
                    x: self.touch_x,
                    y: 0.0,
                }
            }
            7 => InputEvent::TouchEnd,
            _ => return None,
        };
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_harness_passes() {
        let report = Harness::new(Settings::default(), 42)
            .with_fuzz_frames(1200)
            .run();
        assert!(report.rapid_input_changes.passed, "{}", report.rapid_input_changes.details);
        assert!(
            report.multiple_simultaneous_inputs.passed,
            "{}",
            report.multiple_simultaneous_inputs.details
        );
        assert!(
            report.input_method_differences.passed,
            "{}",
            report.input_method_differences.details
        );
        assert!(report.scroll_wheel_input.passed, "{}", report.scroll_wheel_input.details);
        assert!(report.keyboard_taps.passed, "{}", report.keyboard_taps.details);
        assert!(report.invariant_fuzz.passed, "{}", report.invariant_fuzz.details);
        assert!(report.performance.synthetic_clock);
        assert!(report.browser_compatibility.is_none());
        assert!(report.all_passed());
    }

    #[test]
    fn test_report_json() {
        let report = Harness::new(Settings::default(), 7)
            .with_fuzz_frames(300)
            .run();
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["rapid_input_changes"]["passed"].is_boolean());
        assert!(value["browser_compatibility"].is_null());
        assert!(value["performance"]["avg_fps"].is_number());
        assert!(value["performance"]["avg_render_ms"].is_number());
        assert_eq!(value["performance"]["synthetic_clock"], true);
        assert!(value["scroll_wheel_input"]["passed"].is_boolean());
        assert!(value["keyboard_taps"]["passed"].is_boolean());
        assert!(value["timestamp_ms"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_wheel_magnitude_ignored() {
        let mut harness = Harness::new(Settings::default(), 11);
        let step = harness.game.state.settings.wheel_step;
        harness.fresh_round();
        assert!(harness.wheel_moves_by(480.0, step));
        assert!(harness.wheel_moves_by(-120.0, -step));
        assert!(!harness.wheel_moves_by(240.0, 2.0 * step));
    }

    #[test]
    fn test_live_performance_replaces_synthetic() {
        let report = Harness::new(Settings::default(), 3)
            .with_fuzz_frames(60)
            .run();
        let mut stats = FrameStats::default();
        stats.fps_samples.push(24.0);
        stats.render_ms.push(20.0);
        let report = report.with_live_performance(&stats);
        assert!(!report.performance.synthetic_clock);
        assert_eq!(report.performance.min_fps, 24);
        assert_eq!(report.performance.recommendations.len(), 2);
    }

    #[test]
    fn test_perf_summary() {
        let mut stats = FrameStats::default();
        for fps in [20.0, 24.0, 28.0] {
            stats.fps_samples.push(fps);
        }
        let summary = PerfSummary::from_stats(&stats, false);
        assert_eq!(summary.min_fps, 20);
        assert_eq!(summary.max_fps, 28);
        assert!((summary.avg_fps - 24.0).abs() < 1e-9);
        assert_eq!(summary.recommendations.len(), 1);

        let mut stats = FrameStats::default();
        stats.fps_samples.push(60.0);
        stats.render_ms.push(4.0);
        stats.render_ms.push(30.0);
        stats.input_ms.push(1.0);
        let summary = PerfSummary::from_stats(&stats, false);
        assert_eq!(summary.avg_render_ms, 17.0);
        assert_eq!(summary.max_render_ms, 30.0);
        assert_eq!(summary.max_input_latency_ms, 1.0);
        assert_eq!(summary.recommendations.len(), 1);
        assert!(summary.recommendations[0].starts_with("Render time"));

        let empty = PerfSummary::from_stats(&FrameStats::default(), true);
        assert_eq!(empty.avg_fps, 0.0);
        assert!(empty.recommendations.is_empty());
    }

    #[test]
    fn test_browser_compatibility_outcome() {
        let all = FeatureSupport {
            animation_frame: true,
            canvas_2d: true,
            event_listeners: true,
            prevent_default: true,
        };
        assert!(browser_compatibility(all).passed);
        let missing = FeatureSupport {
            canvas_2d: false,
            ..all
        };
        assert!(!browser_compatibility(missing).passed);
    }

    #[test]
    fn test_agent_is_deterministic() {
        let settings = Settings::default();
        let mut a = RandomWalkAgent::new(5, &settings);
        let mut b = RandomWalkAgent::new(5, &settings);
        for _ in 0..100 {
            assert_eq!(a.next_input(), b.next_input());
        }
    }
}
