//! Particle emitter: configuration plus a bounded particle pool.

use nullmind_core::camera::Camera;
use nullmind_core::geometry::Vec2;
use nullmind_core::random::GameRng;
use nullmind_core::time::{TimeSystem, Timer};
use serde::{Deserialize, Serialize};

use super::{Particle, ParticleMovement};
use crate::draw::{world_rect, DrawList, Rgba};

/// Emits, moves and fades particles.
///
/// The pool grows on demand up to `max_particles`; dead particles are
/// recycled lowest index first. Emission happens in bursts of
/// `emission_number` particles every `emission_rate` seconds while the
/// emitter is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleEmitter {
    pub position: Vec2,

    // -- emission -----------------------------------------------------------
    /// Seconds between bursts.
    pub emission_rate: f32,
    /// Particles per burst.
    pub emission_number: u32,
    max_particles: usize,
    /// Base direction; each particle is rotated by up to half of
    /// `angle_range` degrees either way.
    pub direction: Vec2,
    pub angle_range: f32,

    // -- control ------------------------------------------------------------
    pub active: bool,
    /// Length of one emission loop in seconds. Negative runs forever.
    pub emitter_lifetime: f32,
    pub emitter_age: f32,
    /// Remaining loops. `-1` loops forever; `0` stops at the end of the
    /// current loop.
    pub loop_count: i32,
    /// Let the owning pool drop this emitter once it is done.
    pub destroy_when_done: bool,

    // -- particles ----------------------------------------------------------
    pub particle_lifetime: f32,
    pub particle_speed: f32,
    pub movement: ParticleMovement,
    pub start_color: Rgba,
    pub end_color: Rgba,
    pub start_size: Vec2,
    pub end_size: Vec2,
    pub gravity: Vec2,
    pub drag: f32,

    // -- runtime ------------------------------------------------------------
    emission_timer: Timer,
    particles: Vec<Particle>,
    ready_index: usize,
}

impl ParticleEmitter {
    /// A fresh emitter with `preset`'s configuration and an empty pool.
    pub fn from_preset(preset: &ParticleEmitter) -> Self {
        let mut emitter = preset.clone();
        emitter.particles.clear();
        emitter.ready_index = 0;
        emitter.emitter_age = 0.0;
        emitter.emission_timer = Timer::new(emitter.emission_rate as f64);
        emitter
    }

    /// Build an emitter from raw settings. Runtime state starts empty.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn with_settings(
        emission_rate: f32,
        emission_number: u32,
        max_particles: usize,
        direction: Vec2,
        angle_range: f32,
        particle_lifetime: f32,
        particle_speed: f32,
        start_color: Rgba,
        end_color: Rgba,
        start_size: Vec2,
        end_size: Vec2,
    ) -> Self {
        Self {
            position: Vec2::ZERO,
            emission_rate,
            emission_number,
            max_particles,
            direction,
            angle_range,
            active: false,
            emitter_lifetime: 0.0,
            emitter_age: 0.0,
            loop_count: 1,
            destroy_when_done: false,
            particle_lifetime,
            particle_speed,
            movement: ParticleMovement::Default,
            start_color,
            end_color,
            start_size,
            end_size,
            gravity: Vec2::ZERO,
            drag: 0.0,
            emission_timer: Timer::new(emission_rate as f64),
            particles: Vec::new(),
            ready_index: 0,
        }
    }

    /// Spawn one particle in the ready slot. Does nothing when the pool is
    /// full.
    pub fn emit(&mut self, rng: &mut GameRng) {
        if self.ready_index >= self.max_particles {
            return;
        }
        if self.ready_index == self.particles.len() {
            self.particles.push(Particle::default());
        }

        let half = self.angle_range / 2.0;
        let direction = self.direction.rotate_degrees(rng.rand_float(-half, half));

        self.particles[self.ready_index] = Particle {
            position: self.position,
            direction,
            speed: self.particle_speed,
            alive: true,
            max_lifetime: self.particle_lifetime,
            time_alive: 0.0,
            color: self.start_color,
            size: self.start_size,
            rotation: 0.0,
            rotation_speed: 0.0,
            velocity: Vec2::ZERO,
            acceleration: self.gravity,
            drag: self.drag,
            initial_speed: self.particle_speed,
            initial_color: self.start_color,
            initial_size: self.start_size,
        };

        self.ready_index = self.next_ready();
    }

    /// Index of the lowest dead particle, or `max_particles` when full.
    pub fn next_ready(&self) -> usize {
        self.particles
            .iter()
            .position(|p| !p.alive)
            .unwrap_or_else(|| {
                if self.particles.len() < self.max_particles {
                    self.particles.len()
                } else {
                    self.max_particles
                }
            })
    }

    /// Age, move and fade every live particle.
    pub fn update_particles(&mut self, dt: f32, rng: &mut GameRng) {
        let movement = self.movement;
        let gravity = self.gravity;
        let end_color = self.end_color;
        let end_size = self.end_size;

        for (idx, particle) in self.particles.iter_mut().enumerate() {
            if !particle.alive {
                continue;
            }

            particle.time_alive += dt;
            if particle.time_alive >= particle.max_lifetime {
                particle.alive = false;
                self.ready_index = self.ready_index.min(idx);
                continue;
            }

            movement.apply(particle, gravity, dt, rng);

            let t = particle.time_alive / particle.max_lifetime;
            particle.color = Rgba::lerp(particle.initial_color, end_color, t);
            particle.size = Vec2::lerp(particle.initial_size, end_size, t);
            particle.rotation += particle.rotation_speed * dt;
        }
    }

    /// Per-frame update: particles first, then loop bookkeeping, then
    /// emission.
    pub fn update(&mut self, time: &TimeSystem, rng: &mut GameRng) {
        let dt = time.delta_seconds();
        self.update_particles(dt, rng);

        if !self.active {
            return;
        }

        self.emitter_age += dt;
        if self.emitter_lifetime >= 0.0 && self.emitter_age >= self.emitter_lifetime {
            self.emitter_age = 0.0;
            if self.loop_count == 0 {
                self.active = false;
                return;
            }
            if self.loop_count > 0 {
                self.loop_count -= 1;
            }
        }

        // A timer that was never started counts as elapsed, so the first
        // active frame emits immediately.
        let due = !self.emission_timer.is_in_progress() || self.emission_timer.is_finished(time);
        if due {
            for _ in 0..self.emission_number {
                self.emit(rng);
            }
            self.emission_timer.set_duration(self.emission_rate as f64);
            self.emission_timer.start(time);
        }
    }

    /// Run one more emission loop.
    pub fn activate_once(&mut self) {
        self.active = true;
        self.emitter_age = 0.0;
        if self.loop_count == 0 {
            self.loop_count = 1;
        }
    }

    /// Stop emitting. Live particles keep moving until they expire.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.emitter_age = 0.0;
    }

    pub fn particles_alive(&self) -> bool {
        self.particles.iter().any(|p| p.alive)
    }

    pub fn alive_count(&self) -> usize {
        self.particles.iter().filter(|p| p.alive).count()
    }

    pub fn max_particles(&self) -> usize {
        self.max_particles
    }

    /// Resize the pool. Particles beyond the new bound are discarded.
    pub fn set_max_particles(&mut self, max_particles: usize) {
        self.max_particles = max_particles;
        self.particles.truncate(max_particles);
        self.ready_index = self.next_ready();
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Queue a filled rectangle for every visible particle.
    pub fn render(&self, list: &mut DrawList, camera: &Camera) {
        for particle in self.particles.iter().filter(|p| p.alive && p.color.a > 0) {
            list.fill_rect(
                world_rect(camera, particle.position, particle.size),
                particle.color,
            );
        }
    }

    /// Inactive with no particles left.
    pub fn is_done(&self) -> bool {
        !self.active && !self.particles_alive()
    }
}
