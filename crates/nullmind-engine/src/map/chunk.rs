//! One cell of the map grid: a centered room, hallways to its neighbours,
//! the tiles that draw them and the wall colliders that bound them.
//!
//! Tile coordinates are chunk-local, `(0, 0)` top-left, `x` to the right and
//! `y` down. Generation runs in a fixed order because later passes overwrite
//! earlier ones:
//!
//! 1. room floor
//! 2. room walls (three rows on top, one column either side)
//! 3. hallway floors, which cut through the room walls
//! 4. hallway walls
//! 5. wall colliders

use bitflags::bitflags;
use nullmind_core::camera::Camera;
use nullmind_core::collision::{Collider, ColliderRegistry, CollisionLayer};
use nullmind_core::geometry::{Rect, Vec2};
use nullmind_core::handle::ColliderHandle;
use nullmind_core::random::GameRng;
use nullmind_core::CoreError;
use serde::{Deserialize, Serialize};

use super::tiles::{Tile, TileRotation, TileType};
use super::{
    GridPos, CHUNK_SIZE_PIXEL, CHUNK_SIZE_TILE, HALLWAY_END, HALLWAY_START, TILE_SIZE_PIXELS,
};
use crate::draw::DrawList;

bitflags! {
    /// Sides of a chunk that open into a hallway.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Hallways: u8 {
        const NONE = 0;
        const UP = 1 << 0;
        const DOWN = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomType {
    #[default]
    Normal,
    Start,
    End,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomFloorPattern {
    /// Each floor tile picked at random.
    Random,
    /// Plain floor everywhere.
    #[default]
    Pattern1,
}

/// Room dimensions in tiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomSize {
    pub width: i32,
    pub height: i32,
}

impl RoomSize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Chunk-local tile bounds of a room; `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RoomBounds {
    start_x: i32,
    start_y: i32,
    end_x: i32,
    end_y: i32,
}

impl RoomBounds {
    fn of(size: RoomSize) -> Self {
        let start_x = (CHUNK_SIZE_TILE as i32 - size.width) / 2;
        let start_y = (CHUNK_SIZE_TILE as i32 - size.height) / 2;
        Self {
            start_x,
            start_y,
            end_x: start_x + size.width,
            end_y: start_y + size.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentChunk {
    pub position: GridPos,
    pub room_size: RoomSize,
    pub hallways: Hallways,
    pub floor_pattern: RoomFloorPattern,
    pub room_type: RoomType,
    pub empty: bool,
    /// Column-major, `CHUNK_SIZE_TILE` squared; empty for empty chunks.
    tiles: Vec<Tile>,
    colliders: Vec<ColliderHandle>,
    pub enemy_count: i32,
}

impl EnvironmentChunk {
    /// An empty chunk with no tiles and no colliders.
    pub fn empty(position: GridPos) -> Self {
        Self {
            position,
            room_size: RoomSize::default(),
            hallways: Hallways::NONE,
            floor_pattern: RoomFloorPattern::default(),
            room_type: RoomType::Normal,
            empty: true,
            tiles: Vec::new(),
            colliders: Vec::new(),
            enemy_count: 0,
        }
    }

    /// Lay out the tiles of a room chunk and register its wall colliders.
    ///
    /// # Errors
    ///
    /// [`CoreError::RegistryFull`] if the registry runs out of slots. The
    /// colliders registered before the failure stay registered.
    pub fn generate(
        position: GridPos,
        room_type: RoomType,
        room_size: RoomSize,
        floor_pattern: RoomFloorPattern,
        hallways: Hallways,
        rng: &mut GameRng,
        registry: &mut ColliderRegistry,
    ) -> Result<Self, CoreError> {
        let mut chunk = Self {
            position,
            room_size,
            hallways,
            floor_pattern,
            room_type,
            empty: false,
            tiles: vec![Tile::VOID; CHUNK_SIZE_TILE * CHUNK_SIZE_TILE],
            colliders: Vec::new(),
            enemy_count: 0,
        };

        chunk.generate_floor_tiles(rng);
        chunk.generate_wall_tiles();
        chunk.generate_hallways();
        chunk.generate_hallway_wall_tiles();
        chunk.generate_colliders(registry)?;

        tracing::debug!(
            x = position.x,
            y = position.y,
            ?room_type,
            colliders = chunk.colliders.len(),
            "generated chunk"
        );
        Ok(chunk)
    }

    // -- tiles --------------------------------------------------------------

    /// Tile at chunk-local `(x, y)`; `None` outside the chunk or for an
    /// empty chunk.
    pub fn tile(&self, x: i32, y: i32) -> Option<Tile> {
        let idx = tile_offset(x, y)?;
        self.tiles.get(idx).copied()
    }

    fn set_tile(&mut self, x: i32, y: i32, kind: TileType, rotation: TileRotation) {
        if let Some(idx) = tile_offset(x, y) {
            self.tiles[idx] = Tile::new(kind, rotation);
        }
    }

    fn bounds(&self) -> RoomBounds {
        RoomBounds::of(self.room_size)
    }

    fn generate_floor_tiles(&mut self, rng: &mut GameRng) {
        let b = self.bounds();
        for x in b.start_x..b.end_x {
            for y in b.start_y..b.end_y {
                let kind = match self.floor_pattern {
                    RoomFloorPattern::Random => rng
                        .choose(&TileType::RANDOM_FLOORS)
                        .copied()
                        .unwrap_or(TileType::Floor1),
                    RoomFloorPattern::Pattern1 => TileType::Floor1,
                };
                self.set_tile(x, y, kind, TileRotation::None);
            }
        }
    }

    fn generate_wall_tiles(&mut self) {
        let b = self.bounds();
        for x in b.start_x..b.end_x {
            self.set_tile(x, b.start_y - 1, TileType::WallBottom, TileRotation::None);
            self.set_tile(x, b.start_y - 2, TileType::WallTop, TileRotation::None);
            self.set_tile(x, b.start_y - 3, TileType::WallSideBorder, TileRotation::None);
        }
        for y in (b.start_y - 2)..b.end_y {
            self.set_tile(
                b.start_x - 1,
                y,
                TileType::WallSideBorder,
                TileRotation::Counterclockwise,
            );
            self.set_tile(b.end_x, y, TileType::WallSideBorder, TileRotation::Clockwise);
        }
        self.set_tile(
            b.start_x - 1,
            b.start_y - 3,
            TileType::WallCornerBorderSmall,
            TileRotation::Counterclockwise,
        );
        self.set_tile(b.end_x, b.start_y - 3, TileType::WallCornerBorderSmall, TileRotation::None);
    }

    fn generate_hallways(&mut self) {
        let b = self.bounds();
        let edge = CHUNK_SIZE_TILE as i32;
        for across in HALLWAY_START..HALLWAY_END {
            if self.hallways.contains(Hallways::UP) {
                for y in 0..b.start_y {
                    self.set_tile(across, y, TileType::Floor1, TileRotation::None);
                }
            }
            if self.hallways.contains(Hallways::DOWN) {
                for y in b.end_y..edge {
                    self.set_tile(across, y, TileType::Floor1, TileRotation::None);
                }
            }
            if self.hallways.contains(Hallways::LEFT) {
                for x in 0..b.start_x {
                    self.set_tile(x, across, TileType::Floor1, TileRotation::None);
                }
            }
            if self.hallways.contains(Hallways::RIGHT) {
                for x in b.end_x..edge {
                    self.set_tile(x, across, TileType::Floor1, TileRotation::None);
                }
            }
        }
    }

    fn generate_hallway_wall_tiles(&mut self) {
        let b = self.bounds();
        let edge = CHUNK_SIZE_TILE as i32;
        use TileRotation::{Clockwise, Counterclockwise};

        if self.hallways.contains(Hallways::UP) {
            for y in 0..(b.start_y - 2) {
                self.set_tile(HALLWAY_START - 1, y, TileType::WallSideBorder, Counterclockwise);
                self.set_tile(HALLWAY_END, y, TileType::WallSideBorder, Clockwise);
            }
            self.set_tile(
                HALLWAY_START - 1,
                b.start_y - 3,
                TileType::WallCornerBorder,
                Counterclockwise,
            );
            self.set_tile(
                HALLWAY_END,
                b.start_y - 3,
                TileType::WallCornerBorder,
                TileRotation::None,
            );
        }

        if self.hallways.contains(Hallways::LEFT) {
            for x in 0..b.start_x {
                self.set_hallway_top_wall(x);
            }
            self.set_tile(
                b.start_x - 1,
                HALLWAY_START - 3,
                TileType::WallCornerBorder,
                Counterclockwise,
            );
        }

        if self.hallways.contains(Hallways::RIGHT) {
            for x in b.end_x..edge {
                self.set_hallway_top_wall(x);
            }
            self.set_tile(
                b.end_x,
                HALLWAY_START - 3,
                TileType::WallCornerBorder,
                TileRotation::None,
            );
        }

        if self.hallways.contains(Hallways::DOWN) {
            for y in b.end_y..edge {
                self.set_tile(HALLWAY_START - 1, y, TileType::WallSideBorder, Counterclockwise);
                self.set_tile(HALLWAY_END, y, TileType::WallSideBorder, Clockwise);
            }
        }
    }

    /// The three-tile wall above a horizontal hallway at column `x`.
    fn set_hallway_top_wall(&mut self, x: i32) {
        self.set_tile(x, HALLWAY_START - 1, TileType::WallBottom, TileRotation::None);
        self.set_tile(x, HALLWAY_START - 2, TileType::WallTop, TileRotation::None);
        self.set_tile(x, HALLWAY_START - 3, TileType::WallSideBorder, TileRotation::None);
    }

    // -- colliders ----------------------------------------------------------

    /// Wall colliders as inclusive chunk-local tile spans.
    fn wall_spans(&self) -> Vec<((i32, i32), (i32, i32))> {
        let b = self.bounds();
        let last = CHUNK_SIZE_TILE as i32 - 1;
        let (hs, he) = (HALLWAY_START, HALLWAY_END);
        let mut spans = Vec::with_capacity(16);

        if self.hallways.contains(Hallways::UP) {
            spans.push(((hs - 1, 0), (hs - 1, b.start_y - 3)));
            spans.push(((he, 0), (he, b.start_y - 3)));
            spans.push(((b.start_x, b.start_y - 2), (hs - 1, b.start_y - 2)));
            spans.push(((he, b.start_y - 2), (b.end_x - 1, b.start_y - 2)));
        } else {
            spans.push(((b.start_x, b.start_y - 2), (b.end_x - 1, b.start_y - 2)));
        }

        if self.hallways.contains(Hallways::LEFT) {
            spans.push(((0, hs - 2), (b.start_x - 1, hs - 2)));
            spans.push(((0, he), (b.start_x - 1, he)));
            spans.push(((b.start_x - 1, b.start_y - 1), (b.start_x - 1, hs - 3)));
            spans.push(((b.start_x - 1, he + 1), (b.start_x - 1, b.end_y - 1)));
        } else {
            spans.push(((b.start_x - 1, b.start_y - 1), (b.start_x - 1, b.end_y - 1)));
        }

        if self.hallways.contains(Hallways::DOWN) {
            spans.push(((b.start_x, b.end_y), (hs - 2, b.end_y)));
            spans.push(((hs - 1, b.end_y), (hs - 1, last)));
            spans.push(((he, b.end_y), (he, last)));
            spans.push(((he + 1, b.end_y), (b.end_x - 1, b.end_y)));
        } else {
            spans.push(((b.start_x, b.end_y), (b.end_x - 1, b.end_y)));
        }

        if self.hallways.contains(Hallways::RIGHT) {
            spans.push(((b.end_x, b.start_y - 1), (b.end_x, hs - 3)));
            spans.push(((b.end_x, hs - 2), (last, hs - 2)));
            spans.push(((b.end_x, he), (last, he)));
            spans.push(((b.end_x, he + 1), (b.end_x, b.end_y - 1)));
        } else {
            spans.push(((b.end_x, b.start_y - 1), (b.end_x, b.end_y - 1)));
        }

        spans
    }

    fn generate_colliders(&mut self, registry: &mut ColliderRegistry) -> Result<(), CoreError> {
        for (start, end) in self.wall_spans() {
            // Narrow rooms leave no wall between room edge and hallway.
            if end.0 < start.0 || end.1 < start.1 {
                continue;
            }
            self.add_collider(start, end, registry)?;
        }
        Ok(())
    }

    fn add_collider(
        &mut self,
        start: (i32, i32),
        end: (i32, i32),
        registry: &mut ColliderRegistry,
    ) -> Result<(), CoreError> {
        let tile = TILE_SIZE_PIXELS as i32;
        let origin = self.pixel_origin();
        let hitbox = Rect::new(
            start.0 * tile + origin.0,
            start.1 * tile + origin.1,
            (end.0 - start.0 + 1) * tile,
            (end.1 - start.1 + 1) * tile,
        );
        let collider = Collider::new(hitbox, CollisionLayer::ENVIRONMENT, CollisionLayer::NONE);
        let handle = registry.register(collider, None)?;
        self.colliders.push(handle);
        Ok(())
    }

    pub fn colliders(&self) -> &[ColliderHandle] {
        &self.colliders
    }

    /// Reset every wall collider of this chunk.
    pub fn destroy(&mut self, registry: &mut ColliderRegistry) {
        for handle in self.colliders.drain(..) {
            // A stale handle is already logged by the registry.
            let _ = registry.reset(handle);
        }
    }

    // -- rendering ----------------------------------------------------------

    /// Queue a filled rectangle for every visible, on-screen tile.
    pub fn render(&self, list: &mut DrawList, camera: &Camera) {
        if self.empty {
            return;
        }
        let tile = TILE_SIZE_PIXELS as i32;
        let origin = self.pixel_origin();
        let top_left = camera.world_to_screen(Vec2::new(origin.0 as f32, origin.1 as f32));
        let screen = Rect::new(0, 0, camera.screen_width as i32, camera.screen_height as i32);
        let chunk_px = CHUNK_SIZE_PIXEL as i32;
        let chunk_rect = Rect::new(top_left.x as i32, top_left.y as i32, chunk_px, chunk_px);
        if !chunk_rect.has_intersection(&screen) {
            return;
        }

        for (idx, t) in self.tiles.iter().enumerate() {
            let Some(color) = t.kind.color() else {
                continue;
            };
            let x = (idx / CHUNK_SIZE_TILE) as i32;
            let y = (idx % CHUNK_SIZE_TILE) as i32;
            let rect = chunk_rect.translated(x * tile, y * tile);
            let rect = Rect::new(rect.x, rect.y, tile, tile);
            if rect.has_intersection(&screen) {
                list.fill_rect(rect, color);
            }
        }
    }

    // -- geometry -----------------------------------------------------------

    fn pixel_origin(&self) -> (i32, i32) {
        let size = CHUNK_SIZE_PIXEL as i32;
        (self.position.x * size, self.position.y * size)
    }

    /// World-space rectangle of the room floor.
    pub fn room_rect(&self) -> Rect {
        let b = self.bounds();
        let tile = TILE_SIZE_PIXELS as i32;
        let origin = self.pixel_origin();
        Rect::new(
            origin.0 + b.start_x * tile,
            origin.1 + b.start_y * tile,
            self.room_size.width * tile,
            self.room_size.height * tile,
        )
    }

    /// World-space pixel of a random tile inside the room, one tile clear of
    /// the walls.
    pub fn random_tile_in_room(&self, rng: &mut GameRng) -> Vec2 {
        let b = self.bounds();
        let tile_x = rng.rand_int(b.start_x + 1, b.end_x - 1);
        let tile_y = rng.rand_int(b.start_y + 1, b.end_y - 1);
        let origin = self.pixel_origin();
        let tile = TILE_SIZE_PIXELS as i32;
        Vec2::new(
            (origin.0 + tile_x * tile) as f32,
            (origin.1 + tile_y * tile) as f32,
        )
    }
}

fn tile_offset(x: i32, y: i32) -> Option<usize> {
    let size = CHUNK_SIZE_TILE as i32;
    if (0..size).contains(&x) && (0..size).contains(&y) {
        Some(x as usize * CHUNK_SIZE_TILE + y as usize)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(hallways: Hallways, registry: &mut ColliderRegistry) -> EnvironmentChunk {
        let mut rng = GameRng::from_seed(5);
        EnvironmentChunk::generate(
            GridPos::new(1, 2),
            RoomType::Normal,
            RoomSize::new(20, 20),
            RoomFloorPattern::Pattern1,
            hallways,
            &mut rng,
            registry,
        )
        .unwrap()
    }

    #[test]
    fn closed_room_layout() {
        let mut registry = ColliderRegistry::new();
        let chunk = room(Hallways::NONE, &mut registry);

        // 20x20 room centered in a 40x40 chunk spans tiles 10..30.
        assert_eq!(chunk.tile(10, 10).unwrap().kind, TileType::Floor1);
        assert_eq!(chunk.tile(29, 29).unwrap().kind, TileType::Floor1);
        assert_eq!(chunk.tile(15, 9).unwrap().kind, TileType::WallBottom);
        assert_eq!(chunk.tile(15, 8).unwrap().kind, TileType::WallTop);
        assert_eq!(chunk.tile(15, 7).unwrap().kind, TileType::WallSideBorder);
        assert_eq!(chunk.tile(9, 7).unwrap().kind, TileType::WallCornerBorderSmall);
        assert_eq!(chunk.tile(30, 20).unwrap().rotation, TileRotation::Clockwise);
        assert_eq!(chunk.tile(0, 0).unwrap().kind, TileType::Void);
        assert_eq!(chunk.tile(40, 0), None);

        // One collider per side.
        assert_eq!(chunk.colliders().len(), 4);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn hallway_cuts_through_to_chunk_edge() {
        let mut registry = ColliderRegistry::new();
        let chunk = room(Hallways::UP | Hallways::RIGHT, &mut registry);
        for y in 0..10 {
            assert_eq!(chunk.tile(HALLWAY_START, y).unwrap().kind, TileType::Floor1);
        }
        for x in 30..40 {
            assert_eq!(chunk.tile(x, HALLWAY_START).unwrap().kind, TileType::Floor1);
        }
        assert_eq!(chunk.tile(HALLWAY_START - 1, 0).unwrap().kind, TileType::WallSideBorder);
        // Two open sides contribute four spans each.
        assert_eq!(chunk.colliders().len(), 4 + 4 + 1 + 1);
    }

    #[test]
    fn colliders_are_world_space_environment_walls() {
        let mut registry = ColliderRegistry::new();
        let chunk = room(Hallways::NONE, &mut registry);
        let top = registry.get(chunk.colliders()[0]).unwrap();

        // Top wall: tiles (10, 8)..=(29, 8) in chunk (1, 2).
        assert_eq!(top.hitbox, Rect::new(800 + 200, 1600 + 160, 400, 20));
        assert_eq!(top.layer, CollisionLayer::ENVIRONMENT);
        assert_eq!(top.collides_with, CollisionLayer::NONE);
        assert!(top.active);
        assert_eq!(top.owner, None);
    }

    #[test]
    fn room_interior_is_free_of_colliders() {
        let mut registry = ColliderRegistry::new();
        let chunk = room(Hallways::all(), &mut registry);
        let mut result = nullmind_core::collision::CheckResult::new();
        let interior = chunk.room_rect();
        assert!(!registry.query_rect(&interior, CollisionLayer::ENVIRONMENT, None, &mut result));

        // Walking out of the room hits a wall.
        let beyond = interior.translated(0, -40);
        assert!(registry.query_rect(&beyond, CollisionLayer::ENVIRONMENT, None, &mut result));
    }

    #[test]
    fn destroy_resets_colliders() {
        let mut registry = ColliderRegistry::new();
        let mut chunk = room(Hallways::DOWN, &mut registry);
        assert!(!registry.is_empty());
        chunk.destroy(&mut registry);
        assert!(registry.is_empty());
        assert!(chunk.colliders().is_empty());
    }

    #[test]
    fn random_tile_stays_inside_room() {
        let mut registry = ColliderRegistry::new();
        let chunk = room(Hallways::NONE, &mut registry);
        let rect = chunk.room_rect();
        let mut rng = GameRng::from_seed(8);
        for _ in 0..100 {
            let p = chunk.random_tile_in_room(&mut rng);
            assert!(rect.contains_point(p));
        }
    }

    #[test]
    fn render_draws_only_visible_tiles() {
        let mut registry = ColliderRegistry::new();
        let chunk = room(Hallways::NONE, &mut registry);
        let mut list = DrawList::new();

        // Camera far away from chunk (1, 2).
        let mut camera = Camera::new(320, 240);
        camera.follow(Vec2::new(-5000.0, -5000.0));
        chunk.render(&mut list, &camera);
        assert!(list.is_empty());

        // Centered on the room: a 320x240 view shows 16x12 floor tiles.
        camera.follow(chunk.room_rect().center());
        chunk.render(&mut list, &camera);
        assert_eq!(list.len(), 16 * 12);
    }

    #[test]
    fn registry_full_is_reported() {
        let mut registry = ColliderRegistry::with_capacity(2);
        let mut rng = GameRng::from_seed(5);
        let err = EnvironmentChunk::generate(
            GridPos::new(0, 0),
            RoomType::Start,
            RoomSize::new(12, 12),
            RoomFloorPattern::Random,
            Hallways::NONE,
            &mut rng,
            &mut registry,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::RegistryFull { capacity: 2 }));
    }
}
