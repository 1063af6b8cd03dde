//! Map layout: start and end rooms joined by a random-walk main path.

use nullmind_core::camera::Camera;
use nullmind_core::collision::ColliderRegistry;
use nullmind_core::geometry::Vec2;
use nullmind_core::random::GameRng;
use serde::{Deserialize, Serialize};

use super::chunk::{EnvironmentChunk, Hallways, RoomFloorPattern, RoomSize, RoomType};
use super::tiles::Tile;
use super::{chunk_is_valid, tile_from_pixel, GridPos, CHUNK_SIZE_PIXEL};
use crate::config::MapConfig;
use crate::draw::DrawList;
use crate::EngineError;

/// Start and end rooms are always this many tiles on a side.
const FIXED_ROOM_SIZE: RoomSize = RoomSize::new(12, 12);

/// Branch directions in the order the walk draws from.
const DIRECTIONS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentMap {
    size: usize,
    /// `x`-major: chunk `(x, y)` lives at `x * size + y`.
    chunks: Vec<EnvironmentChunk>,
    start: GridPos,
    end: GridPos,
    main_path: Vec<GridPos>,
}

impl EnvironmentMap {
    /// Lay out and build a whole map, registering every wall collider in
    /// `registry`.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidConfig`] for an invalid `config`, or
    /// [`EngineError::Core`] when the registry fills up.
    pub fn generate(
        config: &MapConfig,
        rng: &mut GameRng,
        registry: &mut ColliderRegistry,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let size = config.size_chunks;
        let mut map = Self {
            size,
            chunks: (0..size * size)
                .map(|i| GridPos::new((i / size) as i32, (i % size) as i32))
                .map(EnvironmentChunk::empty)
                .collect(),
            start: GridPos::default(),
            end: GridPos::default(),
            main_path: Vec::new(),
        };

        let half = size as i32 / 2;
        let last = size as i32 - 1;
        map.start = GridPos::new(half, half);
        map.end = GridPos::new(rng.rand_int(half + 1, last), rng.rand_int(half + 1, last));
        map.place_fixed_room(map.start, RoomType::Start);
        map.place_fixed_room(map.end, RoomType::End);

        map.create_main_path(config.branch_steps, rng);
        map.build_rooms(config, rng, registry)?;

        tracing::info!(
            size,
            rooms = map.room_count(),
            path = map.main_path.len(),
            colliders = map.collider_count(),
            start = ?(map.start.x, map.start.y),
            end = ?(map.end.x, map.end.y),
            "generated map"
        );
        Ok(map)
    }

    fn place_fixed_room(&mut self, pos: GridPos, room_type: RoomType) {
        if let Some(chunk) = self.chunk_mut(pos) {
            chunk.empty = false;
            chunk.room_size = FIXED_ROOM_SIZE;
            chunk.room_type = room_type;
        }
    }

    fn open(&mut self, pos: GridPos) {
        if let Some(chunk) = self.chunk_mut(pos) {
            chunk.empty = false;
        }
    }

    /// Random walk from the start room, then a straight carve to the end
    /// room so it is always reachable.
    fn create_main_path(&mut self, steps: u32, rng: &mut GameRng) {
        let mut node = self.start;
        self.main_path.push(node);

        for _ in 0..steps {
            let branches = match rng.rand_int(1, 10) {
                1..=4 => 1,
                5..=8 => 2,
                9 => 3,
                _ => 4,
            };
            tracing::debug!(branches, x = node.x, y = node.y, "branching");

            let mut remaining = DIRECTIONS.to_vec();
            let mut next = node;
            for _ in 0..branches {
                let pick = rng.rand_int(0, remaining.len() as i32 - 1) as usize;
                let (dx, dy) = remaining.remove(pick);
                let cell = node.offset(dx, dy);
                if !chunk_is_valid(cell, self.size) {
                    tracing::debug!(x = cell.x, y = cell.y, "branch leaves the map, skipped");
                    continue;
                }
                self.open(cell);
                next = cell;
            }

            if next != node {
                self.main_path.push(next);
                node = next;
            }
        }

        while node.x != self.end.x {
            node = node.offset((self.end.x - node.x).signum(), 0);
            self.open(node);
            self.main_path.push(node);
        }
        while node.y != self.end.y {
            node = node.offset(0, (self.end.y - node.y).signum());
            self.open(node);
            self.main_path.push(node);
        }
    }

    fn build_rooms(
        &mut self,
        config: &MapConfig,
        rng: &mut GameRng,
        registry: &mut ColliderRegistry,
    ) -> Result<(), EngineError> {
        for idx in 0..self.chunks.len() {
            if self.chunks[idx].empty {
                continue;
            }
            let pos = self.chunks[idx].position;
            let hallways = self.hallways_for(pos);
            let room_type = self.chunks[idx].room_type;
            let room_size = match room_type {
                RoomType::Normal => RoomSize::new(
                    rng.rand_int(config.min_room_half, config.max_room_half) * 2,
                    rng.rand_int(config.min_room_half, config.max_room_half) * 2,
                ),
                RoomType::Start | RoomType::End => self.chunks[idx].room_size,
            };

            let mut chunk = EnvironmentChunk::generate(
                pos,
                room_type,
                room_size,
                RoomFloorPattern::Pattern1,
                hallways,
                rng,
                registry,
            )?;
            if room_type == RoomType::Normal {
                chunk.enemy_count = rng.rand_int(config.enemies_min, config.enemies_max);
            }
            self.chunks[idx] = chunk;
        }
        Ok(())
    }

    /// Hallways towards every non-empty neighbour.
    fn hallways_for(&self, pos: GridPos) -> Hallways {
        let mut hallways = Hallways::NONE;
        let neighbours = [
            (pos.offset(-1, 0), Hallways::LEFT),
            (pos.offset(1, 0), Hallways::RIGHT),
            (pos.offset(0, -1), Hallways::UP),
            (pos.offset(0, 1), Hallways::DOWN),
        ];
        for (neighbour, side) in neighbours {
            if self.chunk(neighbour).is_some_and(|c| !c.empty) {
                hallways |= side;
            }
        }
        hallways
    }

    // -- queries ------------------------------------------------------------

    /// Width and height of the grid in chunks.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn start(&self) -> GridPos {
        self.start
    }

    pub fn end(&self) -> GridPos {
        self.end
    }

    /// Chunks visited by the walk, start first, end last.
    pub fn main_path(&self) -> &[GridPos] {
        &self.main_path
    }

    pub fn chunk_is_valid(&self, pos: GridPos) -> bool {
        chunk_is_valid(pos, self.size)
    }

    pub fn chunk(&self, pos: GridPos) -> Option<&EnvironmentChunk> {
        if !self.chunk_is_valid(pos) {
            return None;
        }
        self.chunks.get(pos.x as usize * self.size + pos.y as usize)
    }

    fn chunk_mut(&mut self, pos: GridPos) -> Option<&mut EnvironmentChunk> {
        if !self.chunk_is_valid(pos) {
            return None;
        }
        self.chunks.get_mut(pos.x as usize * self.size + pos.y as usize)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &EnvironmentChunk> + '_ {
        self.chunks.iter()
    }

    pub fn start_chunk(&self) -> Option<&EnvironmentChunk> {
        self.chunk(self.start)
    }

    pub fn end_chunk(&self) -> Option<&EnvironmentChunk> {
        self.chunk(self.end)
    }

    /// The chunk under a world pixel, if it lies on the map.
    pub fn chunk_at_pixel(&self, pixel: Vec2) -> Option<&EnvironmentChunk> {
        if pixel.x < 0.0 || pixel.y < 0.0 {
            return None;
        }
        let chunk_px = CHUNK_SIZE_PIXEL as f32;
        self.chunk(GridPos::new((pixel.x / chunk_px) as i32, (pixel.y / chunk_px) as i32))
    }

    /// The tile under a world pixel.
    pub fn tile_at_pixel(&self, pixel: Vec2) -> Option<Tile> {
        let chunk = self.chunk_at_pixel(pixel)?;
        let (_, tile) = tile_from_pixel(pixel);
        chunk.tile(tile.x, tile.y)
    }

    /// Centre of the start room in world pixels.
    pub fn start_position(&self) -> Vec2 {
        self.start_chunk()
            .map(|chunk| chunk.room_rect().center())
            .unwrap_or(Vec2::ZERO)
    }

    pub fn room_count(&self) -> usize {
        self.chunks.iter().filter(|c| !c.empty).count()
    }

    pub fn collider_count(&self) -> usize {
        self.chunks.iter().map(|c| c.colliders().len()).sum()
    }

    pub fn enemy_budget(&self) -> i32 {
        self.chunks.iter().map(|c| c.enemy_count).sum()
    }

    /// Queue the visible tiles of every chunk.
    pub fn render(&self, list: &mut DrawList, camera: &Camera) {
        for chunk in &self.chunks {
            chunk.render(list, camera);
        }
    }

    /// Reset every wall collider of every chunk.
    pub fn destroy(&mut self, registry: &mut ColliderRegistry) {
        for chunk in &mut self.chunks {
            chunk.destroy(registry);
        }
        tracing::debug!("map destroyed");
    }
}
