//! Property tests for the collider registry.
//!
//! Random sequences of register / reset / move operations are applied to a
//! small registry and the registry is compared against a brute-force model
//! after every step.

use nullmind_core::prelude::*;
use proptest::prelude::*;

const CAPACITY: usize = 32;

#[derive(Debug, Clone)]
enum RegistryOp {
    Register(Rect, u8, u8),
    Reset(usize),
    Move(usize, i32, i32),
    Deactivate(usize),
}

fn layer_strategy() -> impl Strategy<Value = u8> {
    0u8..6
}

fn layer_from(idx: u8) -> CollisionLayer {
    match idx {
        0 => CollisionLayer::PLAYER,
        1 => CollisionLayer::ENVIRONMENT,
        2 => CollisionLayer::ENEMY,
        3 => CollisionLayer::TRIGGER,
        4 => CollisionLayer::ENEMY_PROJECTILE,
        _ => CollisionLayer::PLAYER_PROJECTILE,
    }
}

fn mask_from(bits: u8) -> CollisionLayer {
    CollisionLayer::from_bits_truncate(bits as u32)
}

fn rect_strategy() -> impl Strategy<Value = Rect> {
    (-50..50i32, -50..50i32, 0..40i32, 0..40i32).prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn op_strategy() -> impl Strategy<Value = RegistryOp> {
    prop_oneof![
        4 => (rect_strategy(), layer_strategy(), any::<u8>())
            .prop_map(|(r, l, m)| RegistryOp::Register(r, l, m)),
        1 => (0..64usize).prop_map(RegistryOp::Reset),
        2 => (0..64usize, -20..20i32, -20..20i32)
            .prop_map(|(i, dx, dy)| RegistryOp::Move(i, dx, dy)),
        1 => (0..64usize).prop_map(RegistryOp::Deactivate),
    ]
}

/// Every collision the registry could report for `handle`, in slot order.
fn brute_force(registry: &ColliderRegistry, handle: ColliderHandle) -> Vec<ColliderHandle> {
    let me = registry.get(handle).unwrap();
    if !me.active {
        return Vec::new();
    }
    registry
        .iter()
        .filter(|(h, other)| {
            *h != handle
                && other.active
                && me.collides_with.intersects(other.layer)
                && me.hitbox.has_intersection(&other.hitbox)
        })
        .map(|(h, _)| h)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn registry_matches_brute_force(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let mut registry = ColliderRegistry::with_capacity(CAPACITY);
        registry.start();
        let mut alive: Vec<ColliderHandle> = Vec::new();
        let mut stale: Vec<ColliderHandle> = Vec::new();

        for op in ops {
            match op {
                RegistryOp::Register(rect, layer, mask) => {
                    let collider = Collider::new(rect, layer_from(layer), mask_from(mask));
                    match registry.register(collider, Some(OwnerId(alive.len() as u64))) {
                        Ok(h) => alive.push(h),
                        Err(CoreError::RegistryFull { capacity }) => {
                            prop_assert_eq!(capacity, CAPACITY);
                            prop_assert_eq!(alive.len(), CAPACITY);
                        }
                        Err(e) => prop_assert!(false, "unexpected error {e}"),
                    }
                }
                RegistryOp::Reset(idx) => {
                    if !alive.is_empty() {
                        let h = alive.remove(idx % alive.len());
                        let cleared = registry.reset(h).unwrap();
                        prop_assert!(!cleared.active);
                        prop_assert_eq!(cleared.owner, None);
                        stale.push(h);
                    }
                }
                RegistryOp::Move(idx, dx, dy) => {
                    if !alive.is_empty() {
                        let h = alive[idx % alive.len()];
                        let moved = registry.get(h).unwrap().hitbox.translated(dx, dy);
                        registry.set_hitbox(h, moved).unwrap();
                    }
                }
                RegistryOp::Deactivate(idx) => {
                    if !alive.is_empty() {
                        let h = alive[idx % alive.len()];
                        registry.set_active(h, false).unwrap();
                    }
                }
            }

            prop_assert_eq!(registry.len(), alive.len());
            prop_assert!(registry.count() <= CAPACITY);

            for &h in &stale {
                prop_assert!(!registry.contains(h));
            }

            let mut result = CheckResult::new();
            for &h in &alive {
                let expected = brute_force(&registry, h);
                let hit = registry.check(h, &mut result);
                let bounded = expected.len().min(MAX_COLLISIONS_PER_CHECK);
                prop_assert_eq!(hit, !expected.is_empty());
                prop_assert_eq!(result.objects(), &expected[..bounded]);
                prop_assert_eq!(registry.check_any(h), !expected.is_empty());
            }
        }
    }

    /// A handle reset and then recycled by a new registration never aliases
    /// the new collider.
    #[test]
    fn stale_handles_never_alias(
        count in 1..20usize,
        resets in prop::collection::vec(0..20usize, 1..10),
    ) {
        let mut registry = ColliderRegistry::with_capacity(CAPACITY);
        let mut handles: Vec<ColliderHandle> = (0..count)
            .map(|i| {
                let rect = Rect::new(i as i32 * 10, 0, 10, 10);
                let enemy = Collider::new(rect, CollisionLayer::ENEMY, CollisionLayer::PLAYER);
                registry.register(enemy, None).unwrap()
            })
            .collect();

        let mut stale = Vec::new();
        for idx in resets {
            if !handles.is_empty() {
                let h = handles.remove(idx % handles.len());
                registry.reset(h).unwrap();
                stale.push(h);
            }
        }
        for _ in 0..stale.len() {
            let rect = Rect::new(0, 100, 10, 10);
            let enemy = Collider::new(rect, CollisionLayer::ENEMY, CollisionLayer::PLAYER);
            handles.push(registry.register(enemy, None).unwrap());
        }

        for &h in &stale {
            prop_assert!(registry.get(h).is_none());
            prop_assert!(registry.reset(h).is_err());
        }
        for &h in &handles {
            prop_assert!(registry.get(h).is_some());
        }
    }
}
