//! Layered collider registry.
//!
//! Every hitbox in the game is a [`Collider`] registered in a
//! [`ColliderRegistry`]. A collider belongs to exactly one
//! [`CollisionLayer`] and carries a `collides_with` mask; a check against it
//! only considers other colliders whose layer is in that mask.
//!
//! Lifecycle:
//!
//! 1. [`start`](ColliderRegistry::start) once when a game session begins.
//! 2. [`register`](ColliderRegistry::register) each collider when its owner
//!    is created. The collider is placed in the lowest free slot.
//! 3. Move colliders with [`set_hitbox`](ColliderRegistry::set_hitbox) as
//!    their owners move, and call [`check`](ColliderRegistry::check) during
//!    PostUpdate.
//! 4. [`reset`](ColliderRegistry::reset) when the owner is destroyed; the
//!    slot becomes free and the handle stale.
//!
//! The check is a linear scan in slot order. With at most
//! [`MAX_COLLIDABLES`] colliders and a handful of checkers per frame this is
//! cheaper than maintaining a broad phase.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Vec2};
use crate::handle::{ColliderHandle, OwnerId, SlotAllocator};
use crate::CoreError;

/// Default capacity of a [`ColliderRegistry`].
pub const MAX_COLLIDABLES: usize = 1024;

/// Upper bound on the hits reported by a single check.
pub const MAX_COLLISIONS_PER_CHECK: usize = 10;

/// Step budget used for beams such as lasers.
pub const MAX_RAYCAST_STEPS: u32 = 2000;

// ---------------------------------------------------------------------------
// CollisionLayer
// ---------------------------------------------------------------------------

bitflags! {
    /// Collision layers as bit flags.
    ///
    /// A collider's `layer` normally has exactly one bit set; its
    /// `collides_with` mask may combine any number of them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CollisionLayer: u32 {
        const NONE = 0;
        const PLAYER = 1 << 0;
        const ENVIRONMENT = 1 << 1;
        const ENEMY = 1 << 2;
        /// Pickups, interactables and trigger volumes.
        const TRIGGER = 1 << 3;
        const ENEMY_PROJECTILE = 1 << 4;
        const PLAYER_PROJECTILE = 1 << 5;
    }
}

impl CollisionLayer {
    /// Alias for [`TRIGGER`](Self::TRIGGER): items share the trigger bit.
    pub const ITEM: CollisionLayer = CollisionLayer::TRIGGER;

    /// Whether a collider on `layer` passes this mask.
    #[inline]
    pub fn accepts(self, layer: CollisionLayer) -> bool {
        self.intersects(layer)
    }
}

// ---------------------------------------------------------------------------
// Collider
// ---------------------------------------------------------------------------

/// A hitbox tagged with a collision layer.
///
/// `owner` and `active` are filled in by [`ColliderRegistry::register`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    /// World-space hitbox in pixels.
    pub hitbox: Rect,
    /// The layer this collider belongs to.
    pub layer: CollisionLayer,
    /// Layers this collider reports hits against.
    pub collides_with: CollisionLayer,
    /// The object this collider belongs to.
    pub owner: Option<OwnerId>,
    /// Inactive colliders are skipped by every check.
    pub active: bool,
}

impl Collider {
    /// An unregistered, inactive collider.
    pub fn new(hitbox: Rect, layer: CollisionLayer, collides_with: CollisionLayer) -> Self {
        Self {
            hitbox,
            layer,
            collides_with,
            owner: None,
            active: false,
        }
    }

    /// Clear the collider back to its unregistered state.
    fn clear(&mut self) {
        self.active = false;
        self.owner = None;
        self.layer = CollisionLayer::NONE;
        self.collides_with = CollisionLayer::NONE;
    }
}

// ---------------------------------------------------------------------------
// RayHit
// ---------------------------------------------------------------------------

/// Outcome of [`ColliderRegistry::raycast`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Where the ray stopped: the first touching step, or the last step taken.
    pub end: Vec2,
    /// The collider that stopped the ray, if any.
    pub hit: Option<ColliderHandle>,
}

// ---------------------------------------------------------------------------
// CheckResult
// ---------------------------------------------------------------------------

/// Hits reported by one check, in registry slot order.
///
/// Never holds more than [`MAX_COLLISIONS_PER_CHECK`] handles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckResult {
    objects: Vec<ColliderHandle>,
}

impl CheckResult {
    pub fn new() -> Self {
        Self {
            objects: Vec::with_capacity(MAX_COLLISIONS_PER_CHECK),
        }
    }

    /// The detected colliders.
    pub fn objects(&self) -> &[ColliderHandle] {
        &self.objects
    }

    /// Number of collisions detected.
    pub fn count(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.objects.len() >= MAX_COLLISIONS_PER_CHECK
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = ColliderHandle> + '_ {
        self.objects.iter().copied()
    }

    fn push(&mut self, handle: ColliderHandle) {
        debug_assert!(!self.is_full());
        self.objects.push(handle);
    }
}

// ---------------------------------------------------------------------------
// ColliderRegistry
// ---------------------------------------------------------------------------

/// Fixed-capacity store of every collider in the game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColliderRegistry {
    slots: Vec<Option<Collider>>,
    allocator: SlotAllocator,
}

impl ColliderRegistry {
    /// A registry holding at most [`MAX_COLLIDABLES`] colliders.
    pub fn new() -> Self {
        Self::with_capacity(MAX_COLLIDABLES)
    }

    /// A registry holding at most `capacity` colliders.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            allocator: SlotAllocator::new(capacity),
        }
    }

    /// Empty the registry. Every handle issued so far becomes stale.
    pub fn start(&mut self) {
        self.slots.clear();
        self.allocator.clear();
    }

    /// Register `collider` in the first free slot and activate it.
    ///
    /// # Errors
    ///
    /// [`CoreError::RegistryFull`] when every slot is in use. Registration
    /// never evicts an existing collider.
    pub fn register(
        &mut self,
        mut collider: Collider,
        owner: Option<OwnerId>,
    ) -> Result<ColliderHandle, CoreError> {
        let Some(handle) = self.allocator.allocate() else {
            let capacity = self.allocator.capacity();
            tracing::warn!(capacity, "maximum collidables reached");
            return Err(CoreError::RegistryFull { capacity });
        };

        collider.active = true;
        collider.owner = owner;

        let idx = handle.index() as usize;
        if idx >= self.slots.len() {
            self.slots.resize(idx + 1, None);
        }
        self.slots[idx] = Some(collider);

        tracing::debug!(%handle, count = self.count(), "added collider");
        Ok(handle)
    }

    /// Collect every collider that overlaps the one behind `handle`.
    ///
    /// `result` is cleared first. Colliders are scanned in slot order,
    /// skipping the checker itself, inactive colliders and layers outside the
    /// checker's `collides_with` mask. The scan stops after
    /// [`MAX_COLLISIONS_PER_CHECK`] hits.
    ///
    /// Returns `true` if at least one collision was found. A stale handle or
    /// an inactive checker reports no collisions.
    pub fn check(&self, handle: ColliderHandle, result: &mut CheckResult) -> bool {
        result.clear();
        let Some(collider) = self.checker(handle) else {
            return false;
        };
        self.scan(&collider.hitbox, collider.collides_with, Some(handle), result);
        !result.is_empty()
    }

    /// Whether the collider behind `handle` overlaps anything in its mask.
    /// Stops at the first hit.
    pub fn check_any(&self, handle: ColliderHandle) -> bool {
        let Some(collider) = self.checker(handle) else {
            return false;
        };
        self.candidates(collider.collides_with, Some(handle))
            .any(|(_, other)| collider.hitbox.has_intersection(&other.hitbox))
    }

    /// Probe a hypothetical hitbox against the registry, e.g. the position
    /// an entity is about to move to.
    ///
    /// Same filtering and bound as [`check`](Self::check); `exclude` is
    /// typically the mover's own collider.
    pub fn query_rect(
        &self,
        hitbox: &Rect,
        mask: CollisionLayer,
        exclude: Option<ColliderHandle>,
        result: &mut CheckResult,
    ) -> bool {
        result.clear();
        self.scan(hitbox, mask, exclude, result);
        !result.is_empty()
    }

    /// March a 1x1 probe from `start` by `direction` per step until it
    /// touches a collider in `mask` or `max_steps` steps have been taken.
    ///
    /// The probe sits at the truncated position of each step. A zero
    /// `direction` never moves, so the result is `start` with no hit.
    pub fn raycast(
        &self,
        start: Vec2,
        direction: Vec2,
        mask: CollisionLayer,
        max_steps: u32,
        exclude: Option<ColliderHandle>,
    ) -> RayHit {
        let mut position = start;
        let mut hits = CheckResult::new();
        if direction == Vec2::ZERO {
            return RayHit {
                end: position,
                hit: None,
            };
        }
        for _ in 0..max_steps {
            let probe = position.to_rect(Vec2::new(1.0, 1.0));
            if self.query_rect(&probe, mask, exclude, &mut hits) {
                return RayHit {
                    end: position,
                    hit: hits.objects().first().copied(),
                };
            }
            position += direction;
        }
        RayHit {
            end: position,
            hit: None,
        }
    }

    /// Deactivate a collider, clear its owner and layers, and free its slot.
    ///
    /// Returns the cleared collider so the caller can re-register it.
    ///
    /// # Errors
    ///
    /// [`CoreError::StaleHandle`] if the handle was already reset or never
    /// issued by this registry.
    pub fn reset(&mut self, handle: ColliderHandle) -> Result<Collider, CoreError> {
        if !self.allocator.deallocate(handle) {
            tracing::warn!(%handle, "reset of a collider that is not registered");
            return Err(CoreError::StaleHandle { handle });
        }
        let mut collider = self.slots[handle.index() as usize]
            .take()
            .ok_or(CoreError::StaleHandle { handle })?;
        collider.clear();
        Ok(collider)
    }

    // -- accessors ----------------------------------------------------------

    pub fn get(&self, handle: ColliderHandle) -> Option<&Collider> {
        if !self.allocator.is_alive(handle) {
            return None;
        }
        self.slots.get(handle.index() as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, handle: ColliderHandle) -> Option<&mut Collider> {
        if !self.allocator.is_alive(handle) {
            return None;
        }
        self.slots.get_mut(handle.index() as usize)?.as_mut()
    }

    /// Move a collider's hitbox, typically to follow its owner.
    pub fn set_hitbox(&mut self, handle: ColliderHandle, hitbox: Rect) -> Result<(), CoreError> {
        let collider = self
            .get_mut(handle)
            .ok_or(CoreError::StaleHandle { handle })?;
        collider.hitbox = hitbox;
        Ok(())
    }

    /// Enable or disable a collider without freeing its slot.
    pub fn set_active(&mut self, handle: ColliderHandle, active: bool) -> Result<(), CoreError> {
        let collider = self
            .get_mut(handle)
            .ok_or(CoreError::StaleHandle { handle })?;
        collider.active = active;
        Ok(())
    }

    pub fn contains(&self, handle: ColliderHandle) -> bool {
        self.allocator.is_alive(handle)
    }

    /// Registered colliders in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ColliderHandle, &Collider)> + '_ {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            let collider = slot.as_ref()?;
            Some((self.allocator.handle_at(idx)?, collider))
        })
    }

    /// Number of registered colliders.
    pub fn len(&self) -> usize {
        self.allocator.alive_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One past the highest occupied slot: the span a check has to scan.
    pub fn count(&self) -> usize {
        self.allocator.high_water()
    }

    pub fn capacity(&self) -> usize {
        self.allocator.capacity()
    }

    // -- internals ----------------------------------------------------------

    fn checker(&self, handle: ColliderHandle) -> Option<&Collider> {
        let Some(collider) = self.get(handle) else {
            tracing::warn!(
                %handle,
                "collider not found in registry; register it before checking collisions"
            );
            return None;
        };
        collider.active.then_some(collider)
    }

    fn candidates(
        &self,
        mask: CollisionLayer,
        exclude: Option<ColliderHandle>,
    ) -> impl Iterator<Item = (ColliderHandle, &Collider)> + '_ {
        self.iter().filter(move |(handle, other)| {
            Some(*handle) != exclude && other.active && mask.accepts(other.layer)
        })
    }

    fn scan(
        &self,
        hitbox: &Rect,
        mask: CollisionLayer,
        exclude: Option<ColliderHandle>,
        result: &mut CheckResult,
    ) {
        for (handle, other) in self.candidates(mask, exclude) {
            if hitbox.has_intersection(&other.hitbox) {
                result.push(handle);
                if result.is_full() {
                    break;
                }
            }
        }
    }
}

impl Default for ColliderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
