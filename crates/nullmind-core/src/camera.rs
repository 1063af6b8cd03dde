//! World/screen coordinate conversion.

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// A camera centered on `position` in world space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// World point shown at the center of the screen.
    pub position: Vec2,
    pub screen_width: u32,
    pub screen_height: u32,
}

impl Camera {
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        Self {
            position: Vec2::ZERO,
            screen_width,
            screen_height,
        }
    }

    fn screen_center(&self) -> Vec2 {
        Vec2::new(
            (self.screen_width / 2) as f32,
            (self.screen_height / 2) as f32,
        )
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        self.screen_center() + (world - self.position)
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        self.position + (screen - self.screen_center())
    }

    /// Center the camera on `target`.
    pub fn follow(&mut self, target: Vec2) {
        self.position = target;
    }
}
