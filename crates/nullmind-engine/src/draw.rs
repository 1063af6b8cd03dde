//! Renderer-agnostic draw list.
//!
//! Render systems describe what to draw as [`DrawCommand`]s in screen
//! coordinates. The list is cleared at the start of every Render stage; a
//! platform renderer, if any, consumes it after the frame.

use nullmind_core::camera::Camera;
use nullmind_core::collision::{ColliderRegistry, CollisionLayer};
use nullmind_core::geometry::{Rect, Vec2};
use serde::{Deserialize, Serialize};

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Linear interpolation per channel, `t` clamped to `[0, 1]`.
    pub fn lerp(from: Rgba, to: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgba {
            r: mix(from.r, to.r),
            g: mix(from.g, to.g),
            b: mix(from.b, to.b),
            a: mix(from.a, to.a),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    FillRect { rect: Rect, color: Rgba },
    OutlineRect { rect: Rect, color: Rgba },
}

/// The draw commands of one frame, in submission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    pub fn outline_rect(&mut self, rect: Rect, color: Rgba) {
        self.commands.push(DrawCommand::OutlineRect { rect, color });
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Outline every active collider, colored by layer.
    pub fn debug_hitboxes(&mut self, registry: &ColliderRegistry, camera: &Camera) {
        for (_, collider) in registry.iter().filter(|(_, c)| c.active) {
            let (position, _) = collider.hitbox.position_and_size();
            let screen = camera.world_to_screen(position);
            let rect = Rect::new(
                screen.x as i32,
                screen.y as i32,
                collider.hitbox.w,
                collider.hitbox.h,
            );
            self.outline_rect(rect, layer_color(collider.layer));
        }
    }
}

fn layer_color(layer: CollisionLayer) -> Rgba {
    if layer.contains(CollisionLayer::PLAYER) {
        Rgba::new(0, 255, 0, 255)
    } else if layer.contains(CollisionLayer::ENEMY) {
        Rgba::new(255, 0, 0, 255)
    } else if layer.contains(CollisionLayer::ENVIRONMENT) {
        Rgba::new(0, 128, 255, 255)
    } else if layer.contains(CollisionLayer::TRIGGER) {
        Rgba::new(255, 255, 0, 255)
    } else if layer
        .intersects(CollisionLayer::PLAYER_PROJECTILE | CollisionLayer::ENEMY_PROJECTILE)
    {
        Rgba::new(255, 0, 255, 255)
    } else {
        Rgba::new(255, 255, 255, 255)
    }
}

/// Screen-space rectangle of a world-space box.
pub(crate) fn world_rect(camera: &Camera, position: Vec2, size: Vec2) -> Rect {
    let screen = camera.world_to_screen(position);
    Rect::new(screen.x as i32, screen.y as i32, size.x as i32, size.y as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nullmind_core::collision::Collider;

    #[test]
    fn lerp_endpoints_and_midpoint() {
        let a = Rgba::new(255, 0, 0, 100);
        let b = Rgba::new(255, 255, 0, 0);
        assert_eq!(Rgba::lerp(a, b, 0.0), a);
        assert_eq!(Rgba::lerp(a, b, 1.0), b);
        assert_eq!(Rgba::lerp(a, b, 0.5), Rgba::new(255, 128, 0, 50));
        assert_eq!(Rgba::lerp(a, b, 7.0), b);
    }

    #[test]
    fn debug_hitboxes_skips_inactive_and_applies_camera() {
        let mut registry = ColliderRegistry::new();
        let wall = registry
            .register(
                Collider::new(
                    Rect::new(100, 100, 20, 40),
                    CollisionLayer::ENVIRONMENT,
                    CollisionLayer::NONE,
                ),
                None,
            )
            .unwrap();
        let enemy = registry
            .register(
                Collider::new(Rect::new(0, 0, 8, 8), CollisionLayer::ENEMY, CollisionLayer::PLAYER),
                None,
            )
            .unwrap();
        registry.set_active(enemy, false).unwrap();

        let mut camera = Camera::new(200, 200);
        camera.follow(Vec2::new(100.0, 100.0));

        let mut list = DrawList::new();
        list.debug_hitboxes(&registry, &camera);
        assert_eq!(list.len(), 1);
        assert_eq!(
            list.commands()[0],
            DrawCommand::OutlineRect {
                rect: Rect::new(100, 100, 20, 40),
                color: Rgba::new(0, 128, 255, 255),
            }
        );
        assert!(registry.contains(wall));
    }
}
