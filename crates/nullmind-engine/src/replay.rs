//! Deterministic replay with per-frame input recording and checkpoint
//! verification.
//!
//! A [`ReplayRecorder`] collects the [`FrameInput`] fed to every frame plus
//! periodic state hash checkpoints into a [`ReplayLog`]. [`replay`] restores
//! the log's initial snapshot, feeds the same frames back and compares the
//! state hash at each checkpoint.
//!
//! ```
//! use nullmind_engine::prelude::*;
//!
//! let mut app = App::new(EngineConfig::default()).unwrap();
//! app.start().unwrap();
//!
//! let mut recorder = ReplayRecorder::new(app.capture_snapshot(), 10);
//! for _ in 0..30 {
//!     let input = FrameInput::idle(1.0 / 60.0);
//!     recorder.record_frame(app.frame_count(), &input, Some(app.state_hash()));
//!     app.frame(input.raw_dt, &input.events).unwrap();
//! }
//! let log = recorder.finish();
//!
//! let result = replay(&mut app, &log).unwrap();
//! assert!(result.completed);
//! assert_eq!(result.frames_replayed, 30);
//! assert!(result.first_divergence.is_none());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::app::{App, AppEvent};
use crate::snapshot::GameSnapshot;

// ---------------------------------------------------------------------------
// FrameInput
// ---------------------------------------------------------------------------

/// Everything a frame consumes from outside the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    pub raw_dt: f32,
    pub events: Vec<AppEvent>,
}

impl FrameInput {
    pub fn new(raw_dt: f32, events: Vec<AppEvent>) -> Self {
        Self { raw_dt, events }
    }

    /// A frame with no events.
    pub fn idle(raw_dt: f32) -> Self {
        Self::new(raw_dt, Vec::new())
    }
}

// ---------------------------------------------------------------------------
// ReplayLog
// ---------------------------------------------------------------------------

/// Initial snapshot plus the ordered inputs and checkpoints that followed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayLog {
    pub initial_snapshot: GameSnapshot,
    /// Frames recorded. Replay runs exactly this many frames.
    pub total_frames: u64,
    pub entries: Vec<ReplayEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReplayEntry {
    /// Input fed to the frame with this index.
    Input { frame: u64, input: FrameInput },
    /// State hash taken before the frame with this index ran.
    Checkpoint { frame: u64, state_hash: String },
}

// ---------------------------------------------------------------------------
// ReplayResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayResult {
    /// All frames ran and every checkpoint matched.
    pub completed: bool,
    pub frames_replayed: u64,
    /// First checkpoint whose hash differed, if any.
    pub first_divergence: Option<ReplayDivergence>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayDivergence {
    pub frame: u64,
    pub expected_hash: String,
    pub actual_hash: String,
}

// ---------------------------------------------------------------------------
// ReplayRecorder
// ---------------------------------------------------------------------------

/// Records a run into a [`ReplayLog`]. Call
/// [`record_frame`](Self::record_frame) before each frame runs.
pub struct ReplayRecorder {
    log: ReplayLog,
    /// Checkpoint every this many frames; 0 checkpoints whenever a hash is
    /// given.
    checkpoint_interval: u64,
    frames_recorded: u64,
    last_frame: Option<u64>,
}

impl ReplayRecorder {
    pub fn new(snapshot: GameSnapshot, checkpoint_interval: u64) -> Self {
        Self {
            log: ReplayLog {
                initial_snapshot: snapshot,
                total_frames: 0,
                entries: Vec::new(),
            },
            checkpoint_interval,
            frames_recorded: 0,
            last_frame: None,
        }
    }

    /// Record the input of `frame` and, on checkpoint frames, `state_hash`.
    ///
    /// # Panics
    ///
    /// Panics if `frame` is not strictly greater than the previously
    /// recorded frame.
    pub fn record_frame(&mut self, frame: u64, input: &FrameInput, state_hash: Option<String>) {
        if let Some(prev) = self.last_frame {
            assert!(
                frame > prev,
                "ReplayRecorder::record_frame: frame {frame} is not strictly greater than previous frame {prev}"
            );
        }
        self.last_frame = Some(frame);
        self.frames_recorded += 1;

        self.log.entries.push(ReplayEntry::Input {
            frame,
            input: input.clone(),
        });

        if let Some(hash) = state_hash {
            let due = self.checkpoint_interval == 0 || frame % self.checkpoint_interval == 0;
            if due {
                self.log.entries.push(ReplayEntry::Checkpoint {
                    frame,
                    state_hash: hash,
                });
            }
        }
    }

    pub fn frames_recorded(&self) -> u64 {
        self.frames_recorded
    }

    pub fn finish(mut self) -> ReplayLog {
        self.log.total_frames = self.frames_recorded;
        self.log
    }
}

// ---------------------------------------------------------------------------
// replay()
// ---------------------------------------------------------------------------

/// Replay `log` on `app` and stop at the first divergent checkpoint.
///
/// Frames with no recorded input run with the configured `fixed_dt` and no
/// events. Systems must already be registered on `app`.
///
/// # Errors
///
/// A malformed log (duplicate entries, frame overflow) or a snapshot that
/// fails to restore. The log is validated before `app` is touched. A system
/// error during replay is also returned.
pub fn replay(app: &mut App, log: &ReplayLog) -> Result<ReplayResult, anyhow::Error> {
    let mut inputs: BTreeMap<u64, &FrameInput> = BTreeMap::new();
    let mut checkpoints: BTreeMap<u64, &str> = BTreeMap::new();

    for entry in &log.entries {
        match entry {
            ReplayEntry::Input { frame, input } => {
                if inputs.insert(*frame, input).is_some() {
                    return Err(anyhow::anyhow!(
                        "replay log contains duplicate Input entry at frame {frame}"
                    ));
                }
            }
            ReplayEntry::Checkpoint { frame, state_hash } => {
                if checkpoints.insert(*frame, state_hash.as_str()).is_some() {
                    return Err(anyhow::anyhow!(
                        "replay log contains duplicate Checkpoint entry at frame {frame}"
                    ));
                }
            }
        }
    }

    let start_frame = log.initial_snapshot.frame;
    let total_frames = log.total_frames;
    if total_frames == 0 {
        return Ok(ReplayResult {
            completed: true,
            frames_replayed: 0,
            first_divergence: None,
        });
    }
    let end_frame = start_frame.checked_add(total_frames).ok_or_else(|| {
        anyhow::anyhow!(
            "frame range overflow: start_frame ({start_frame}) + total_frames ({total_frames}) exceeds u64::MAX"
        )
    })?;

    app.restore_from_snapshot(&log.initial_snapshot)
        .map_err(|e| anyhow::anyhow!("failed to restore initial snapshot for replay: {e}"))?;

    let fixed_dt = app.config().fixed_dt;
    let mut frames_replayed = 0u64;
    for frame in start_frame..end_frame {
        if let Some(expected_hash) = checkpoints.get(&frame) {
            let actual_hash = app.state_hash();
            if actual_hash != *expected_hash {
                tracing::warn!(frame, "replay diverged");
                return Ok(ReplayResult {
                    completed: false,
                    frames_replayed,
                    first_divergence: Some(ReplayDivergence {
                        frame,
                        expected_hash: (*expected_hash).to_owned(),
                        actual_hash,
                    }),
                });
            }
        }

        match inputs.get(&frame) {
            Some(input) => app.frame(input.raw_dt, &input.events)?,
            None => app.frame(fixed_dt, &[])?,
        };
        frames_replayed += 1;
    }

    Ok(ReplayResult {
        completed: true,
        frames_replayed,
        first_divergence: None,
    })
}
