//! Collider handles and slot allocation.
//!
//! A [`ColliderHandle`] is a 64-bit handle that packs a *generation* counter
//! in the high 32 bits and a registry *slot index* in the low 32 bits. The
//! generation is bumped every time a slot is freed, so a handle kept around
//! after its collider was reset is detected as stale instead of silently
//! aliasing whatever collider reuses the slot.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ColliderHandle
// ---------------------------------------------------------------------------

/// A generational collider handle.
///
/// Layout: `[generation: u32 | index: u32]`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColliderHandle(u64);

impl ColliderHandle {
    /// Construct a handle from a slot index and generation.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// The slot index (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// The generation (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for ColliderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ColliderHandle({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for ColliderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// OwnerId
// ---------------------------------------------------------------------------

/// Opaque tag naming the game object that owns a collider.
///
/// The registry never interprets it; collision responders use it to map a
/// hit back to the player, an enemy, a bullet and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerId(pub u64);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SlotAllocator
// ---------------------------------------------------------------------------

/// Fixed-capacity slot allocator with generational tracking.
///
/// Allocation always returns the lowest free slot, so a freed slot is reused
/// before the high-water mark grows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotAllocator {
    /// Current generation for each slot ever used.
    generations: Vec<u32>,
    /// Whether the slot is currently in use.
    alive: Vec<bool>,
    /// Maximum number of slots.
    capacity: usize,
    /// Number of slots currently in use.
    alive_count: usize,
}

impl SlotAllocator {
    /// Create an empty allocator holding at most `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            generations: Vec::new(),
            alive: Vec::new(),
            capacity,
            alive_count: 0,
        }
    }

    /// Allocate the lowest free slot, or `None` when every slot is in use.
    pub fn allocate(&mut self) -> Option<ColliderHandle> {
        if let Some(index) = self.alive.iter().position(|&a| !a) {
            self.alive[index] = true;
            self.alive_count += 1;
            return Some(ColliderHandle::new(index as u32, self.generations[index]));
        }
        if self.generations.len() >= self.capacity {
            return None;
        }
        let index = self.generations.len();
        self.generations.push(0);
        self.alive.push(true);
        self.alive_count += 1;
        Some(ColliderHandle::new(index as u32, 0))
    }

    /// Free a slot, incrementing its generation so outstanding handles
    /// become stale.
    ///
    /// Returns `false` if the handle was already stale.
    pub fn deallocate(&mut self, handle: ColliderHandle) -> bool {
        if !self.is_alive(handle) {
            return false;
        }
        let idx = handle.index() as usize;
        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.alive_count -= 1;
        true
    }

    /// Returns `true` if `handle` names a slot in use with a matching
    /// generation.
    pub fn is_alive(&self, handle: ColliderHandle) -> bool {
        let idx = handle.index() as usize;
        idx < self.generations.len()
            && self.alive[idx]
            && self.generations[idx] == handle.generation()
    }

    /// Free every slot. Generations are bumped so that no handle issued
    /// before the clear stays valid.
    pub fn clear(&mut self) {
        for (idx, alive) in self.alive.iter_mut().enumerate() {
            if *alive {
                *alive = false;
                self.generations[idx] = self.generations[idx].wrapping_add(1);
            }
        }
        self.alive_count = 0;
    }

    /// Handle for the slot at `index` if it is in use.
    pub fn handle_at(&self, index: usize) -> Option<ColliderHandle> {
        if index < self.alive.len() && self.alive[index] {
            Some(ColliderHandle::new(index as u32, self.generations[index]))
        } else {
            None
        }
    }

    /// One past the highest slot currently in use.
    pub fn high_water(&self) -> usize {
        self.alive.iter().rposition(|&a| a).map_or(0, |i| i + 1)
    }

    pub fn alive_count(&self) -> usize {
        self.alive_count
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.alive_count >= self.capacity
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
