//! Frame timing and timers.
//!
//! [`TimeSystem`] turns the raw wall-clock delta of each frame into the
//! scaled, clamped delta the simulation integrates with. Movement written as
//! `speed * time.delta_seconds()` is frame-rate independent.
//!
//! The raw delta is supplied by the caller, which keeps headless runs and
//! replays deterministic.

use serde::{Deserialize, Serialize};

/// Default upper bound on a single frame's delta, in seconds.
pub const DEFAULT_MAX_DELTA_SECONDS: f32 = 0.1;

/// How often the FPS counter is recomputed, in seconds of raw time.
const FPS_WINDOW_SECONDS: f32 = 0.5;

// ---------------------------------------------------------------------------
// TimeSystem
// ---------------------------------------------------------------------------

/// Per-frame time bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSystem {
    delta_seconds: f32,
    raw_delta_seconds: f32,
    time_scale: f32,
    elapsed_seconds: f64,
    raw_elapsed_seconds: f64,
    max_delta_seconds: f32,

    fps: u32,
    average_fps: u32,
    window_frames: u32,
    window_seconds: f32,
    total_frames: u64,
}

impl TimeSystem {
    pub fn new() -> Self {
        Self::with_max_delta(DEFAULT_MAX_DELTA_SECONDS)
    }

    /// A time system whose per-frame delta never exceeds `max_delta_seconds`.
    pub fn with_max_delta(max_delta_seconds: f32) -> Self {
        Self {
            delta_seconds: 0.0,
            raw_delta_seconds: 0.0,
            time_scale: 1.0,
            elapsed_seconds: 0.0,
            raw_elapsed_seconds: 0.0,
            max_delta_seconds,
            fps: 0,
            average_fps: 0,
            window_frames: 0,
            window_seconds: 0.0,
            total_frames: 0,
        }
    }

    /// Advance by one frame that took `raw_delta_seconds` of wall time.
    ///
    /// The simulation delta is `raw * time_scale`, capped at the max delta so
    /// a stalled frame cannot launch objects through walls.
    pub fn pre_update(&mut self, raw_delta_seconds: f32) {
        let raw = raw_delta_seconds.max(0.0);
        self.raw_delta_seconds = raw;
        self.raw_elapsed_seconds += raw as f64;
        self.delta_seconds = (raw * self.time_scale).min(self.max_delta_seconds);
        self.elapsed_seconds += self.delta_seconds as f64;
        self.update_fps();
    }

    fn update_fps(&mut self) {
        self.window_frames += 1;
        self.total_frames += 1;
        self.window_seconds += self.raw_delta_seconds;

        if self.window_seconds >= FPS_WINDOW_SECONDS {
            self.fps = (self.window_frames as f32 / self.window_seconds) as u32;
            if self.elapsed_seconds > 0.0 {
                self.average_fps = (self.total_frames as f64 / self.elapsed_seconds) as u32;
            }
            self.window_frames = 0;
            self.window_seconds = 0.0;
        }
    }

    /// Scale the simulation speed. 1.0 is normal, 0.5 half speed.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale;
    }

    /// Zero the accumulated (scaled) elapsed time.
    pub fn reset_total_time(&mut self) {
        self.elapsed_seconds = 0.0;
    }

    // -- accessors ----------------------------------------------------------

    /// Scaled, clamped seconds since the previous frame.
    pub fn delta_seconds(&self) -> f32 {
        self.delta_seconds
    }

    pub fn raw_delta_seconds(&self) -> f32 {
        self.raw_delta_seconds
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Sum of all simulation deltas since start (or the last reset).
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    pub fn raw_elapsed_seconds(&self) -> f64 {
        self.raw_elapsed_seconds
    }

    pub fn max_delta_seconds(&self) -> f32 {
        self.max_delta_seconds
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn average_fps(&self) -> u32 {
        self.average_fps
    }

    pub fn frame_count(&self) -> u64 {
        self.total_frames
    }
}

impl Default for TimeSystem {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

/// A one-shot countdown measured against [`TimeSystem::elapsed_seconds`].
///
/// Used for cooldowns, fire rates and particle emission intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    start_time: f64,
    elapsed: f64,
    duration: f64,
    in_progress: bool,
    finished: bool,
}

impl Timer {
    /// A stopped timer of `duration` seconds.
    pub fn new(duration: f64) -> Self {
        Self {
            start_time: 0.0,
            elapsed: 0.0,
            duration,
            in_progress: false,
            finished: false,
        }
    }

    /// (Re)start counting from now.
    pub fn start(&mut self, time: &TimeSystem) {
        self.start_time = time.elapsed_seconds();
        self.elapsed = 0.0;
        self.in_progress = true;
        self.finished = false;
    }

    /// Whether the duration has elapsed since [`start`](Self::start).
    ///
    /// Once finished the timer stays finished until restarted.
    pub fn is_finished(&mut self, time: &TimeSystem) -> bool {
        if self.finished {
            return true;
        }
        if self.in_progress {
            self.elapsed = time.elapsed_seconds() - self.start_time;
            if self.elapsed >= self.duration {
                self.finished = true;
                self.in_progress = false;
                return true;
            }
        }
        false
    }

    /// Seconds remaining as of the last [`is_finished`](Self::is_finished)
    /// poll; 0 when the timer is not running.
    pub fn time_left(&self) -> f64 {
        if !self.in_progress {
            return 0.0;
        }
        self.duration - self.elapsed
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
