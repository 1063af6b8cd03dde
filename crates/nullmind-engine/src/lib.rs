//! Null Mind Engine -- frame lifecycle, particles and procedural levels on
//! top of [`nullmind_core`].
//!
//! An [`App`](app::App) owns the [`GameContext`](app::GameContext) and drives
//! it through the per-frame stages:
//!
//! `Start` (once) -> [`PreUpdate` -> `EventHandler` (per event) ->
//! `PostUpdate` -> `Render`] -> `Quit` (once).
//!
//! Nothing here touches a window or GPU. Render systems fill a
//! [`DrawList`](draw::DrawList) which an external renderer may consume.
//!
//! # Quick Start
//!
//! ```
//! use nullmind_engine::prelude::*;
//!
//! let mut app = App::new(EngineConfig::default()).unwrap();
//! app.add_system(Stage::PostUpdate, "count", |ctx| {
//!     ctx.camera.position.x += 1.0;
//!     Ok(())
//! });
//!
//! app.start().unwrap();
//! app.run_frames(10).unwrap();
//! assert_eq!(app.frame_count(), 10);
//! assert_eq!(app.context().camera.position.x, 10.0);
//! ```

#![deny(unsafe_code)]

pub mod app;
pub mod config;
pub mod draw;
pub mod map;
pub mod particles;
pub mod replay;
pub mod snapshot;

/// Re-export the core crate for convenience.
pub use nullmind_core;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ConfigIo {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid JSON for [`EngineConfig`](config::EngineConfig).
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A system returned an error; the current stage was aborted.
    #[error("{stage} system '{system}' failed: {message}")]
    Stage {
        stage: app::Stage,
        system: String,
        message: String,
    },

    /// A frame was requested before [`App::start`](app::App::start).
    #[error("app has not been started")]
    NotStarted,

    /// A collision registry operation failed.
    #[error(transparent)]
    Core(#[from] nullmind_core::CoreError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use nullmind_core::prelude::*;

    pub use crate::app::{
        App, AppEvent, EventSystemFn, FrameDiagnostics, GameContext, Scene, Stage, SystemFn,
        SystemResult,
    };
    pub use crate::config::{EngineConfig, MapConfig};
    pub use crate::draw::{DrawCommand, DrawList};
    pub use crate::map::{
        EnvironmentChunk, EnvironmentMap, GridPos, Hallways, RoomFloorPattern, RoomSize,
        RoomType, Tile, TileRotation, TileType, CHUNK_SIZE_PIXEL, CHUNK_SIZE_TILE,
        HALLWAY_SIZE_TILE, MAP_SIZE_CHUNK, TILE_SIZE_PIXELS,
    };
    pub use crate::particles::{
        EmitterId, EmitterPool, Particle, ParticleEmitter, ParticleMovement, Rgba,
    };
    pub use crate::replay::{
        replay, FrameInput, ReplayDivergence, ReplayEntry, ReplayLog, ReplayRecorder,
        ReplayResult,
    };
    pub use crate::snapshot::GameSnapshot;
    pub use crate::EngineError;
}
