//! Per-particle movement rules.

use nullmind_core::geometry::Vec2;
use nullmind_core::random::GameRng;
use serde::{Deserialize, Serialize};

use super::Particle;

/// Speed gained per second by [`ParticleMovement::Accelerated`].
const ACCELERATION_PER_SECOND: f32 = 100.0;
/// Fraction of speed lost per second by [`ParticleMovement::Decelerated`].
const DECELERATION_FACTOR: f32 = 2.7;
/// Degrees per second turned by [`ParticleMovement::Spiral`].
const SPIRAL_DEGREES_PER_SECOND: f32 = 180.0;
/// Amplitude of the [`ParticleMovement::Sine`] wobble.
const SINE_AMPLITUDE: f32 = 10.0;

/// How an emitter moves its particles each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleMovement {
    /// Speed decays by the particle's drag; gravity and acceleration are
    /// added to the velocity.
    #[default]
    Default,
    /// Constant speed and direction.
    Linear,
    /// Speed grows steadily.
    Accelerated,
    /// Speed decays at a fixed rate regardless of drag.
    Decelerated,
    /// Direction turns at a constant rate.
    Spiral,
    /// Linear movement with one pixel of jitter per axis per frame.
    Random,
    /// Linear movement with a sine/cosine wobble.
    Sine,
}

impl ParticleMovement {
    /// Advance `particle` by `dt` seconds.
    pub fn apply(self, particle: &mut Particle, gravity: Vec2, dt: f32, rng: &mut GameRng) {
        match self {
            ParticleMovement::Default => {
                particle.speed -= dt * particle.speed * particle.drag;
                particle.velocity =
                    particle.direction * particle.speed + particle.acceleration + gravity;
                particle.position += particle.velocity * dt;
            }
            ParticleMovement::Linear => step_linear(particle, dt),
            ParticleMovement::Accelerated => {
                particle.speed += ACCELERATION_PER_SECOND * dt;
                step_linear(particle, dt);
            }
            ParticleMovement::Decelerated => {
                particle.speed -= dt * particle.speed * DECELERATION_FACTOR;
                step_linear(particle, dt);
            }
            ParticleMovement::Spiral => {
                particle.direction = particle
                    .direction
                    .rotate_degrees(SPIRAL_DEGREES_PER_SECOND * dt);
                step_linear(particle, dt);
            }
            ParticleMovement::Random => {
                step_linear(particle, dt);
                particle.position += Vec2::new(
                    rng.rand_int(-1, 1) as f32,
                    rng.rand_int(-1, 1) as f32,
                );
            }
            ParticleMovement::Sine => {
                step_linear(particle, dt);
                let t = particle.time_alive;
                particle.position += Vec2::new(
                    (t * rng.rand_int(1, 5) as f32).sin() * dt * SINE_AMPLITUDE,
                    (t * rng.rand_int(1, 5) as f32).cos() * dt * SINE_AMPLITUDE,
                );
            }
        }
    }
}

fn step_linear(particle: &mut Particle, dt: f32) {
    particle.velocity = particle.direction * particle.speed;
    particle.position += particle.velocity * dt;
}
