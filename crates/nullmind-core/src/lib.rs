//! Null Mind Core -- collision registry and the small engine primitives the
//! game simulation is built on.
//!
//! Colliders live in a fixed-capacity [`ColliderRegistry`](collision::ColliderRegistry)
//! and are addressed by generational [`ColliderHandle`](handle::ColliderHandle)s.
//! Each collider sits on one [`CollisionLayer`](collision::CollisionLayer) and
//! carries a mask of the layers it wants to hear about; a check walks the
//! registry in slot order and reports at most
//! [`MAX_COLLISIONS_PER_CHECK`](collision::MAX_COLLISIONS_PER_CHECK) hits.
//!
//! # Quick Start
//!
//! ```
//! use nullmind_core::prelude::*;
//!
//! let mut registry = ColliderRegistry::new();
//! registry.start();
//!
//! let player = registry
//!     .register(
//!         Collider::new(
//!             Rect::new(0, 0, 16, 16),
//!             CollisionLayer::PLAYER,
//!             CollisionLayer::ENVIRONMENT,
//!         ),
//!         Some(OwnerId(1)),
//!     )
//!     .unwrap();
//! let wall = registry
//!     .register(
//!         Collider::new(
//!             Rect::new(8, 8, 40, 40),
//!             CollisionLayer::ENVIRONMENT,
//!             CollisionLayer::NONE,
//!         ),
//!         None,
//!     )
//!     .unwrap();
//!
//! let mut result = CheckResult::new();
//! assert!(registry.check(player, &mut result));
//! assert_eq!(result.objects(), &[wall]);
//! ```

#![deny(unsafe_code)]

pub mod camera;
pub mod collision;
pub mod geometry;
pub mod handle;
pub mod input;
pub mod random;
pub mod time;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by core operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Every slot of the collider registry is in use.
    #[error("collider registry is full (capacity {capacity})")]
    RegistryFull { capacity: usize },

    /// The handle does not refer to a registered collider (stale generation,
    /// reset, or never issued by this registry).
    #[error("collider {handle:?} is not registered (stale or never allocated)")]
    StaleHandle { handle: handle::ColliderHandle },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::camera::Camera;
    pub use crate::collision::{
        CheckResult, Collider, ColliderRegistry, CollisionLayer, RayHit, MAX_COLLIDABLES,
        MAX_COLLISIONS_PER_CHECK, MAX_RAYCAST_STEPS,
    };
    pub use crate::geometry::{Rect, Vec2};
    pub use crate::handle::{ColliderHandle, OwnerId, SlotAllocator};
    pub use crate::input::{ButtonState, InputEvent, InputState, Key, MouseButton};
    pub use crate::random::GameRng;
    pub use crate::time::{TimeSystem, Timer};
    pub use crate::CoreError;
}
