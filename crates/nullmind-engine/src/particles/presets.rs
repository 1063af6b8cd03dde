//! Ready-made emitter configurations.
//!
//! Presets are templates: clone one into a live emitter with
//! [`ParticleEmitter::from_preset`] and adjust position and direction each
//! frame.

use nullmind_core::geometry::Vec2;

use super::{ParticleEmitter, ParticleMovement};
use crate::draw::Rgba;

impl ParticleEmitter {
    /// Slow red-to-yellow embers spraying in every direction.
    pub fn default_preset() -> Self {
        let mut emitter = Self::with_settings(
            0.01,
            10,
            10_000,
            Vec2::UP,
            360.0,
            30.0,
            20.0,
            Rgba::new(255, 0, 0, 100),
            Rgba::new(255, 255, 0, 0),
            Vec2::new(3.0, 3.0),
            Vec2::new(1.0, 1.0),
        );
        emitter.position = Vec2::new(100.0, 100.0);
        emitter.drag = 4.0;
        emitter
    }

    /// A short cone of hot sparks, fired once per activation.
    pub fn gun_sparks() -> Self {
        let mut emitter = Self::with_settings(
            0.02,
            8,
            256,
            Vec2::RIGHT,
            40.0,
            0.25,
            300.0,
            Rgba::new(255, 230, 150, 255),
            Rgba::new(255, 90, 0, 0),
            Vec2::new(3.0, 3.0),
            Vec2::new(1.0, 1.0),
        );
        emitter.movement = ParticleMovement::Decelerated;
        emitter.emitter_lifetime = 0.04;
        emitter.loop_count = 0;
        emitter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preset_values() {
        let preset = ParticleEmitter::default_preset();
        assert_eq!(preset.emission_rate, 0.01);
        assert_eq!(preset.emission_number, 10);
        assert_eq!(preset.max_particles(), 10_000);
        assert_eq!(preset.angle_range, 360.0);
        assert_eq!(preset.particle_lifetime, 30.0);
        assert_eq!(preset.particle_speed, 20.0);
        assert_eq!(preset.start_color, Rgba::new(255, 0, 0, 100));
        assert_eq!(preset.end_color, Rgba::new(255, 255, 0, 0));
        assert_eq!(preset.drag, 4.0);
        assert_eq!(preset.loop_count, 1);
        assert!(!preset.active);
    }

    #[test]
    fn gun_sparks_need_activation() {
        let sparks = ParticleEmitter::gun_sparks();
        assert!(!sparks.active);
        assert_eq!(sparks.loop_count, 0);
        assert_eq!(sparks.movement, ParticleMovement::Decelerated);
    }
}
