//! Tile kinds and orientation.

use serde::{Deserialize, Serialize};

use crate::draw::Rgba;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    #[default]
    Void,
    Floor1,
    Floor2,
    Floor3,
    FloorVent1,
    FloorVent2,
    FloorVent3,
    FloorScratched1,
    FloorScratched2,
    FloorScratched3,
    WallTop,
    WallBottom,
    WallCornerBorder,
    WallCornerBorderSmall,
    WallSideBorder,
}

impl TileType {
    /// Floors picked from by the random floor pattern.
    pub const RANDOM_FLOORS: [TileType; 6] = [
        TileType::Floor1,
        TileType::Floor2,
        TileType::Floor3,
        TileType::FloorVent1,
        TileType::FloorVent2,
        TileType::FloorVent3,
    ];

    pub fn is_floor(self) -> bool {
        matches!(
            self,
            TileType::Floor1
                | TileType::Floor2
                | TileType::Floor3
                | TileType::FloorVent1
                | TileType::FloorVent2
                | TileType::FloorVent3
                | TileType::FloorScratched1
                | TileType::FloorScratched2
                | TileType::FloorScratched3
        )
    }

    /// Flat color used when tiles are drawn as filled rectangles. `None` for
    /// void tiles, which are not drawn.
    pub fn color(self) -> Option<Rgba> {
        let color = match self {
            TileType::Void => return None,
            TileType::Floor1 | TileType::Floor2 | TileType::Floor3 => Rgba::new(58, 60, 66, 255),
            TileType::FloorVent1 | TileType::FloorVent2 | TileType::FloorVent3 => {
                Rgba::new(48, 50, 56, 255)
            }
            TileType::FloorScratched1 | TileType::FloorScratched2 | TileType::FloorScratched3 => {
                Rgba::new(66, 62, 60, 255)
            }
            TileType::WallTop => Rgba::new(96, 100, 110, 255),
            TileType::WallBottom => Rgba::new(80, 84, 94, 255),
            TileType::WallCornerBorder
            | TileType::WallCornerBorderSmall
            | TileType::WallSideBorder => Rgba::new(24, 24, 28, 255),
        };
        Some(color)
    }

    pub fn is_wall(self) -> bool {
        matches!(
            self,
            TileType::WallTop
                | TileType::WallBottom
                | TileType::WallCornerBorder
                | TileType::WallCornerBorderSmall
                | TileType::WallSideBorder
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileRotation {
    #[default]
    None,
    Clockwise,
    Counterclockwise,
    R180,
}

impl TileRotation {
    /// Clockwise rotation in degrees, as a renderer expects it.
    pub fn degrees(self) -> f32 {
        match self {
            TileRotation::None => 0.0,
            TileRotation::Clockwise => 90.0,
            TileRotation::Counterclockwise => 270.0,
            TileRotation::R180 => 180.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TileType,
    pub rotation: TileRotation,
}

impl Tile {
    pub const VOID: Tile = Tile {
        kind: TileType::Void,
        rotation: TileRotation::None,
    };

    pub const fn new(kind: TileType, rotation: TileRotation) -> Self {
        Self { kind, rotation }
    }
}
