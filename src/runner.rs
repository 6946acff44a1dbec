//! Frame-driven game loop
//!
//! In the browser, `requestAnimationFrame` calls [`GameLoop::frame`] once per
//! display refresh. Everywhere else a [`TickSource`] such as [`ManualClock`]
//! supplies the frame timestamps, so the same loop runs under tests.

use std::cell::Cell;
use std::rc::Rc;

use crate::platform;
use crate::settings::Settings;
use crate::sim::{
    FrameReport, GamePhase, GameState, InputEvent, InputQueue, InputUnifier, apply_input,
    step_physics,
};

/// Number of frame timestamps kept for the FPS estimate
const FPS_WINDOW: usize = 60;

/// Supplies frame timestamps in milliseconds
pub trait TickSource {
    /// Timestamp of the next frame, or `None` when the source is exhausted
    fn next_frame(&mut self) -> Option<f64>;
}

/// Deterministic clock producing evenly spaced frames
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_ms: f64,
    step_ms: f64,
    remaining: Option<u64>,
}

impl ManualClock {
    /// Unbounded clock ticking every `step_ms`
    pub fn new(step_ms: f64) -> Self {
        Self {
            now_ms: 0.0,
            step_ms,
            remaining: None,
        }
    }

    /// Clock at the usual 60 Hz display rate
    pub fn display_rate() -> Self {
        Self::new(1000.0 / 60.0)
    }

    /// Stop after `frames` more frames
    pub fn limit(mut self, frames: u64) -> Self {
        self.remaining = Some(frames);
        self
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn step_ms(&self) -> f64 {
        self.step_ms
    }

    /// Frames needed to cover `ms` of wall time (at least one)
    pub fn frames_for(&self, ms: f64) -> u64 {
        ((ms / self.step_ms).round() as u64).max(1)
    }
}

impl TickSource for ManualClock {
    fn next_frame(&mut self) -> Option<f64> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }
        self.now_ms += self.step_ms;
        Some(self.now_ms)
    }
}

/// Shared stop flag; cloning shares the flag
#[derive(Debug, Clone, Default)]
pub struct StopToken(Rc<Cell<bool>>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.get()
    }

    /// Clear the flag so the loop can be scheduled again
    pub fn reset(&self) {
        self.0.set(false);
    }
}

/// Draws the game; never mutates it
pub trait Renderer {
    fn render(&mut self, state: &GameState);
}

/// Renderer that draws nothing (headless runs)
#[derive(Debug, Default, Clone, Copy)]
pub struct Headless;

impl Renderer for Headless {
    fn render(&mut self, _state: &GameState) {}
}

/// Running aggregate of a metric; constant memory however long the game runs
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Series {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl Series {
    pub fn push(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.sum / self.count as f64 }
    }
}

/// Rolling frames-per-second estimate plus frame timings
#[derive(Debug, Clone)]
pub struct FrameStats {
    frame_times: [f64; FPS_WINDOW],
    frame_index: usize,
    pub fps: u32,
    /// One FPS sample per elapsed second of frames
    pub fps_samples: Series,
    /// Time spent in the renderer per frame (ms)
    pub render_ms: Series,
    /// Time spent applying queued input, for frames that had any (ms)
    pub input_ms: Series,
    last_sample_ms: Option<f64>,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self {
            frame_times: [0.0; FPS_WINDOW],
            frame_index: 0,
            fps: 0,
            fps_samples: Series::default(),
            render_ms: Series::default(),
            input_ms: Series::default(),
            last_sample_ms: None,
        }
    }
}

impl FrameStats {
    /// Record a frame timestamp (ms)
    pub fn record(&mut self, time: f64) {
        self.frame_times[self.frame_index] = time;
        self.frame_index = (self.frame_index + 1) % FPS_WINDOW;

        // Oldest entry is the one about to be overwritten
        let oldest_time = self.frame_times[self.frame_index];
        if oldest_time > 0.0 {
            let elapsed = time - oldest_time;
            if elapsed > 0.0 {
                self.fps = ((FPS_WINDOW - 1) as f64 * 1000.0 / elapsed).round() as u32;
            }
        }

        match self.last_sample_ms {
            None => self.last_sample_ms = Some(time),
            Some(last) if time - last >= 1000.0 && self.fps > 0 => {
                self.fps_samples.push(self.fps as f64);
                self.last_sample_ms = Some(time);
            }
            Some(_) => {}
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Game instance: state, pending input, and frame scheduling
pub struct GameLoop {
    pub state: GameState,
    pub unifier: InputUnifier,
    pub queue: InputQueue,
    pub stats: FrameStats,
    stop: StopToken,
}

impl GameLoop {
    pub fn new(settings: Settings, seed: u64) -> Self {
        Self {
            state: GameState::new(settings, seed),
            unifier: InputUnifier::new(),
            queue: InputQueue::new(),
            stats: FrameStats::default(),
            stop: StopToken::new(),
        }
    }

    /// Token that halts this loop when stopped
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    /// Queue an input event for the next frame. Events are dropped while no
    /// round is running, since [`GameLoop::start`] resets input state anyway.
    pub fn push_input(&mut self, event: InputEvent) -> bool {
        if !self.should_continue() {
            log::trace!("Dropping {:?} outside a running round", event);
            return false;
        }
        self.queue.push(event);
        true
    }

    /// Start (or restart) a round; valid from any phase
    pub fn start(&mut self) {
        self.state.start();
        self.unifier.reset();
        self.queue = InputQueue::new();
        self.stop.reset();
    }

    /// Whether another frame should be scheduled
    pub fn should_continue(&self) -> bool {
        self.state.phase == GamePhase::Running && !self.stop.is_stopped()
    }

    /// One frame: drain input, step physics, render
    pub fn frame(&mut self, time: f64, renderer: &mut impl Renderer) -> FrameReport {
        let had_input = !self.queue.is_empty();
        let state = &mut self.state;
        let unifier = &mut self.unifier;
        let queue = &mut self.queue;
        let ((), input_ms) = platform::measure(|| apply_input(state, unifier, queue.drain()));
        if had_input {
            self.stats.input_ms.push(input_ms);
        }

        let report = step_physics(&mut self.state);

        let state = &self.state;
        let ((), render_ms) = platform::measure(|| renderer.render(state));
        self.stats.render_ms.push(render_ms);
        self.stats.record(time);
        report
    }

    /// Run frames from `source` until the round ends, the token stops the
    /// loop, or the source runs dry. Returns the number of frames run.
    pub fn run(&mut self, source: &mut impl TickSource, renderer: &mut impl Renderer) -> u64 {
        let mut frames = 0;
        while self.should_continue() {
            let Some(time) = source.next_frame() else {
                break;
            };
            self.frame(time, renderer);
            frames += 1;
        }
        frames
    }
}
