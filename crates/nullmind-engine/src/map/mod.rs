//! Procedural environment: a square grid of chunks, each holding at most one
//! room joined to its neighbours by hallways.
//!
//! World space is measured in pixels with the origin at the top-left corner
//! of chunk `(0, 0)`. A chunk is [`CHUNK_SIZE_TILE`] tiles of
//! [`TILE_SIZE_PIXELS`] pixels on a side.

mod chunk;
mod generate;
mod tiles;

use nullmind_core::geometry::{Rect, Vec2};
use nullmind_core::random::GameRng;
use serde::{Deserialize, Serialize};

pub use chunk::{EnvironmentChunk, Hallways, RoomFloorPattern, RoomSize, RoomType};
pub use generate::EnvironmentMap;
pub use tiles::{Tile, TileRotation, TileType};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const TILE_SIZE_PIXELS: usize = 20;
pub const CHUNK_SIZE_TILE: usize = 40;
pub const CHUNK_SIZE_PIXEL: usize = CHUNK_SIZE_TILE * TILE_SIZE_PIXELS;
pub const HALLWAY_SIZE_TILE: usize = 6;
/// Default width and height of the chunk grid.
pub const MAP_SIZE_CHUNK: usize = 5;

/// First tile of a hallway, across its width.
pub const HALLWAY_START: i32 = 17;
/// One past the last tile of a hallway, across its width.
pub const HALLWAY_END: i32 = HALLWAY_START + HALLWAY_SIZE_TILE as i32;

// ---------------------------------------------------------------------------
// Grid positions
// ---------------------------------------------------------------------------

/// Integer position on the chunk grid or inside a chunk's tile grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

// ---------------------------------------------------------------------------
// Utilities
// ---------------------------------------------------------------------------

/// Split a world pixel into `(chunk, tile)` indices. Negative coordinates
/// map to `(0, 0)` for both.
pub fn tile_from_pixel(pixel: Vec2) -> (GridPos, GridPos) {
    if pixel.x < 0.0 || pixel.y < 0.0 {
        return (GridPos::default(), GridPos::default());
    }
    let chunk_px = CHUNK_SIZE_PIXEL as f32;
    let chunk = GridPos::new((pixel.x / chunk_px) as i32, (pixel.y / chunk_px) as i32);
    let local_x = (pixel.x % chunk_px) as i32;
    let local_y = (pixel.y % chunk_px) as i32;
    let tile_px = TILE_SIZE_PIXELS as i32;
    (chunk, GridPos::new(local_x / tile_px, local_y / tile_px))
}

pub fn tile_is_valid(tile: GridPos) -> bool {
    let size = CHUNK_SIZE_TILE as i32;
    (0..size).contains(&tile.x) && (0..size).contains(&tile.y)
}

/// Whether `chunk` lies on a grid of `size_chunks` by `size_chunks`.
pub fn chunk_is_valid(chunk: GridPos, size_chunks: usize) -> bool {
    let size = size_chunks as i32;
    (0..size).contains(&chunk.x) && (0..size).contains(&chunk.y)
}

/// World pixel of a tile's top-left corner. `None` for an invalid tile or a
/// negative chunk index.
pub fn tile_index_to_pixel(tile: GridPos, chunk: GridPos) -> Option<Vec2> {
    if !tile_is_valid(tile) || chunk.x < 0 || chunk.y < 0 {
        return None;
    }
    let chunk_px = CHUNK_SIZE_PIXEL as i32;
    let tile_px = TILE_SIZE_PIXELS as i32;
    Some(Vec2::new(
        (chunk.x * chunk_px + tile.x * tile_px) as f32,
        (chunk.y * chunk_px + tile.y * tile_px) as f32,
    ))
}

/// Uniform point inside `rect`.
pub fn random_pixel_in_rect(rect: Rect, rng: &mut GameRng) -> Vec2 {
    Vec2::new(
        rng.rand_float(rect.x as f32, rect.right() as f32),
        rng.rand_float(rect.y as f32, rect.bottom() as f32),
    )
}
