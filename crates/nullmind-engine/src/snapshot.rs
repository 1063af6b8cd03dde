//! Game state snapshots with BLAKE3 hashing.
//!
//! [`GameSnapshot`] holds everything that affects the next frame: time,
//! input, colliders, RNG, particles, map, camera and scene. Its hash is a
//! BLAKE3 hex digest of that state serialized to JSON, which makes it usable
//! for integrity checks and for comparing two runs.
//!
//! ```
//! use nullmind_engine::prelude::*;
//!
//! let mut app = App::new(EngineConfig::default()).unwrap();
//! app.start().unwrap();
//! app.run_frames(10).unwrap();
//!
//! let snapshot = app.capture_snapshot();
//! assert_eq!(snapshot.frame, 10);
//! assert_eq!(snapshot.hash.len(), 64);
//!
//! app.run_frames(10).unwrap();
//! app.restore_from_snapshot(&snapshot).unwrap();
//! assert_eq!(app.frame_count(), 10);
//! assert_eq!(app.state_hash(), snapshot.hash);
//! ```
//!
//! Not captured: registered systems, the configuration, the draw list
//! (rebuilt every Render) and diagnostics.

use nullmind_core::camera::Camera;
use nullmind_core::collision::ColliderRegistry;
use nullmind_core::input::InputState;
use nullmind_core::random::GameRng;
use nullmind_core::time::TimeSystem;
use serde::{Deserialize, Serialize};

use crate::app::{App, GameContext, Scene};
use crate::map::EnvironmentMap;
use crate::particles::EmitterPool;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Frames completed at capture time.
    pub frame: u64,
    pub time: TimeSystem,
    pub input: InputState,
    pub colliders: ColliderRegistry,
    pub rng: GameRng,
    pub particles: EmitterPool,
    pub map: Option<EnvironmentMap>,
    pub camera: Camera,
    pub scene: Scene,
    pub running: bool,
    /// BLAKE3 hex digest of every other field.
    pub hash: String,
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HashableState<'a> {
    frame: u64,
    time: &'a TimeSystem,
    input: &'a InputState,
    colliders: &'a ColliderRegistry,
    rng: &'a GameRng,
    particles: &'a EmitterPool,
    map: &'a Option<EnvironmentMap>,
    camera: &'a Camera,
    scene: Scene,
    running: bool,
}

impl<'a> HashableState<'a> {
    fn of_context(ctx: &'a GameContext) -> Self {
        Self {
            frame: ctx.frame,
            time: &ctx.time,
            input: &ctx.input,
            colliders: &ctx.colliders,
            rng: &ctx.rng,
            particles: &ctx.particles,
            map: &ctx.map,
            camera: &ctx.camera,
            scene: ctx.scene,
            running: ctx.running,
        }
    }

    fn of_snapshot(snapshot: &'a GameSnapshot) -> Self {
        Self {
            frame: snapshot.frame,
            time: &snapshot.time,
            input: &snapshot.input,
            colliders: &snapshot.colliders,
            rng: &snapshot.rng,
            particles: &snapshot.particles,
            map: &snapshot.map,
            camera: &snapshot.camera,
            scene: snapshot.scene,
            running: snapshot.running,
        }
    }

    fn hash(&self) -> String {
        let json_bytes =
            serde_json::to_vec(self).expect("game state should always be JSON-serializable");
        blake3::hash(&json_bytes).to_hex().to_string()
    }
}

// ---------------------------------------------------------------------------
// App snapshot/restore methods
// ---------------------------------------------------------------------------

impl App {
    pub fn capture_snapshot(&self) -> GameSnapshot {
        let ctx = self.context();
        let hash = HashableState::of_context(ctx).hash();
        GameSnapshot {
            frame: ctx.frame,
            time: ctx.time.clone(),
            input: ctx.input.clone(),
            colliders: ctx.colliders.clone(),
            rng: ctx.rng.clone(),
            particles: ctx.particles.clone(),
            map: ctx.map.clone(),
            camera: ctx.camera.clone(),
            scene: ctx.scene,
            running: ctx.running,
            hash,
        }
    }

    /// Replace the game state with `snapshot`. Registered systems and the
    /// configuration are kept, the draw list is cleared and the app counts as
    /// started.
    ///
    /// # Errors
    ///
    /// Fails without touching any state when the recorded hash does not
    /// match the snapshot's contents.
    pub fn restore_from_snapshot(&mut self, snapshot: &GameSnapshot) -> Result<(), anyhow::Error> {
        let expected_hash = HashableState::of_snapshot(snapshot).hash();
        if expected_hash != snapshot.hash {
            return Err(anyhow::anyhow!(
                "snapshot hash mismatch: recorded {} but recomputed {}. \
                 The snapshot may be corrupted or tampered with.",
                snapshot.hash,
                expected_hash
            ));
        }

        let ctx = self.context_mut();
        ctx.frame = snapshot.frame;
        ctx.time = snapshot.time.clone();
        ctx.input = snapshot.input.clone();
        ctx.colliders = snapshot.colliders.clone();
        ctx.rng = snapshot.rng.clone();
        ctx.particles = snapshot.particles.clone();
        ctx.map = snapshot.map.clone();
        ctx.camera = snapshot.camera.clone();
        ctx.scene = snapshot.scene;
        ctx.running = snapshot.running;
        ctx.draw_list.clear();
        self.set_started(true);

        tracing::debug!(frame = snapshot.frame, "restored snapshot");
        Ok(())
    }

    /// BLAKE3 hex digest of the current state; equal to
    /// `capture_snapshot().hash` without cloning the state.
    pub fn state_hash(&self) -> String {
        HashableState::of_context(self.context()).hash()
    }

    /// Capture a branch point. Same as [`capture_snapshot`](Self::capture_snapshot).
    pub fn fork_snapshot(&self) -> GameSnapshot {
        self.capture_snapshot()
    }
}
