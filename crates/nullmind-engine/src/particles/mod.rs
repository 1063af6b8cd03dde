//! Particle effects.
//!
//! A [`ParticleEmitter`] owns a bounded pool of [`Particle`]s and moves them
//! according to its [`ParticleMovement`]. Emitters live in an
//! [`EmitterPool`] owned by the game context, addressed by [`EmitterId`]. The
//! pool updates every emitter once per frame during PostUpdate and drops
//! one-shot emitters (`destroy_when_done`) as soon as their last particle
//! expires, after which their id no longer resolves.

mod emitter;
mod movement;
mod presets;

use std::collections::BTreeMap;
use std::fmt;

use nullmind_core::camera::Camera;
use nullmind_core::geometry::Vec2;
use nullmind_core::random::GameRng;
use nullmind_core::time::TimeSystem;
use serde::{Deserialize, Serialize};

use crate::draw::DrawList;

pub use crate::draw::Rgba;
pub use emitter::ParticleEmitter;
pub use movement::ParticleMovement;

// ---------------------------------------------------------------------------
// Particle
// ---------------------------------------------------------------------------

/// One particle. `initial_*` fields hold the values at emission and anchor
/// the interpolation over the particle's life.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub position: Vec2,
    pub direction: Vec2,
    pub speed: f32,
    pub alive: bool,
    /// Seconds the particle lives.
    pub max_lifetime: f32,
    pub time_alive: f32,

    pub color: Rgba,
    pub size: Vec2,
    pub rotation: f32,
    /// Degrees per second.
    pub rotation_speed: f32,

    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub drag: f32,

    pub initial_speed: f32,
    pub initial_color: Rgba,
    pub initial_size: Vec2,
}

// ---------------------------------------------------------------------------
// EmitterPool
// ---------------------------------------------------------------------------

/// Identifier of an emitter inside an [`EmitterPool`]. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmitterId(u64);

impl fmt::Display for EmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "emitter#{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmitterPool {
    emitters: BTreeMap<EmitterId, ParticleEmitter>,
    next_id: u64,
}

impl EmitterPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, emitter: ParticleEmitter) -> EmitterId {
        let id = EmitterId(self.next_id);
        self.next_id += 1;
        self.emitters.insert(id, emitter);
        id
    }

    pub fn get(&self, id: EmitterId) -> Option<&ParticleEmitter> {
        self.emitters.get(&id)
    }

    pub fn get_mut(&mut self, id: EmitterId) -> Option<&mut ParticleEmitter> {
        self.emitters.get_mut(&id)
    }

    pub fn remove(&mut self, id: EmitterId) -> Option<ParticleEmitter> {
        self.emitters.remove(&id)
    }

    pub fn contains(&self, id: EmitterId) -> bool {
        self.emitters.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }

    pub fn clear(&mut self) {
        self.emitters.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (EmitterId, &ParticleEmitter)> + '_ {
        self.emitters.iter().map(|(id, e)| (*id, e))
    }

    /// Update every emitter in id order, then drop finished one-shot
    /// emitters.
    pub fn update(&mut self, time: &TimeSystem, rng: &mut GameRng) {
        for emitter in self.emitters.values_mut() {
            emitter.update(time, rng);
        }
        self.emitters.retain(|id, emitter| {
            let finished = emitter.destroy_when_done && emitter.is_done();
            if finished {
                tracing::debug!(%id, "emitter destroyed");
            }
            !finished
        });
    }

    pub fn render(&self, list: &mut DrawList, camera: &Camera) {
        for emitter in self.emitters.values() {
            emitter.render(list, camera);
        }
    }

    /// Live particles across all emitters.
    pub fn particle_count(&self) -> usize {
        self.emitters.values().map(ParticleEmitter::alive_count).sum()
    }
}
