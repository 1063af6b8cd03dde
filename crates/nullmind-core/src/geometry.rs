//! 2D vector math and integer pixel rectangles.
//!
//! [`Vec2`] is used for positions, directions and velocities in world pixels
//! (y grows downward). [`Rect`] is the integer hitbox type the collision
//! registry tests against.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Vec2
// ---------------------------------------------------------------------------

/// A 2D vector of `f32` components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component (positive is down).
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const UP: Vec2 = Vec2 { x: 0.0, y: -1.0 };
    pub const DOWN: Vec2 = Vec2 { x: 0.0, y: 1.0 };
    pub const LEFT: Vec2 = Vec2 { x: -1.0, y: 0.0 };
    pub const RIGHT: Vec2 = Vec2 { x: 1.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Length of the vector.
    #[inline]
    pub fn magnitude(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the same direction. The zero vector normalizes to zero
    /// instead of producing NaNs.
    pub fn normalize(self) -> Self {
        let mag = self.magnitude();
        if mag == 0.0 {
            return Self::ZERO;
        }
        Self::new(self.x / mag, self.y / mag)
    }

    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Linear interpolation from `a` to `b`; `t` is not clamped.
    #[inline]
    pub fn lerp(a: Self, b: Self, t: f32) -> Self {
        Self::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }

    /// Rotate around the origin by `angle` radians.
    pub fn rotate_radians(self, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Rotate around the origin by `angle` degrees.
    pub fn rotate_degrees(self, angle: f32) -> Self {
        self.rotate_radians(angle.to_radians())
    }

    /// Rotate this point around `center` by `angle` radians.
    pub fn rotate_around_radians(self, center: Self, angle: f32) -> Self {
        (self - center).rotate_radians(angle) + center
    }

    /// Rotate this point around `center` by `angle` degrees.
    pub fn rotate_around_degrees(self, center: Self, angle: f32) -> Self {
        self.rotate_around_radians(center, angle.to_radians())
    }

    /// Component-wise clamp between `min` and `max`.
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self::new(self.x.max(min.x).min(max.x), self.y.max(min.y).min(max.y))
    }

    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }

    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs())
    }

    /// Rect with this vector as its top-left corner. Components are truncated
    /// toward zero.
    pub fn to_rect(self, size: Self) -> Rect {
        Rect::new(self.x as i32, self.y as i32, size.x as i32, size.y as i32)
    }

    /// Rect of `size` centered on this vector.
    pub fn to_centered_rect(self, size: Self) -> Rect {
        let top_left = self.to_centered_position(size);
        Rect::new(
            top_left.x as i32,
            top_left.y as i32,
            size.x as i32,
            size.y as i32,
        )
    }

    /// Top-left corner of an object of `size` centered on this vector.
    pub fn to_centered_position(self, size: Self) -> Self {
        Self::new(self.x - size.x / 2.0, self.y - size.y / 2.0)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, scalar: f32) -> Vec2 {
        Vec2::new(self.x * scalar, self.y * scalar)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;
    fn div(self, scalar: f32) -> Vec2 {
        Vec2::new(self.x / scalar, self.y / scalar)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

// ---------------------------------------------------------------------------
// Rect
// ---------------------------------------------------------------------------

/// Integer pixel rectangle: top-left corner plus width and height.
///
/// Extents are half-open, so two rects that only share an edge do not
/// intersect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    #[inline]
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// A rect with no area. Empty rects never intersect anything.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Right edge, exclusive. Widened so rects near `i32::MAX` stay exact.
    #[inline]
    pub fn right(&self) -> i64 {
        self.x as i64 + self.w as i64
    }

    /// Bottom edge, exclusive.
    #[inline]
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.h as i64
    }

    /// Whether the two rects overlap by at least one pixel.
    pub fn has_intersection(&self, other: &Rect) -> bool {
        self.intersection(other).is_some()
    }

    /// Overlapping area of the two rects, if any.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if self.is_empty() || other.is_empty() {
            return None;
        }
        let left = self.x.max(other.x);
        let right = self.right().min(other.right());
        if right <= left as i64 {
            return None;
        }
        let top = self.y.max(other.y);
        let bottom = self.bottom().min(other.bottom());
        if bottom <= top as i64 {
            return None;
        }
        // The overlap is no wider than either rect, so it fits in i32.
        Some(Rect::new(
            left,
            top,
            (right - left as i64) as i32,
            (bottom - top as i64) as i32,
        ))
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.x as f32
            && point.x < self.right() as f32
            && point.y >= self.y as f32
            && point.y < self.bottom() as f32
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.x as f32 + self.w as f32 / 2.0,
            self.y as f32 + self.h as f32 / 2.0,
        )
    }

    /// Closest-point test against a circle. Touching the boundary counts as
    /// overlapping.
    pub fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        let closest_x = (self.x as f32).max(center.x.min(self.right() as f32));
        let closest_y = (self.y as f32).max(center.y.min(self.bottom() as f32));
        let dx = center.x - closest_x;
        let dy = center.y - closest_y;
        dx * dx + dy * dy <= radius * radius
    }

    /// Move by `(dx, dy)`, clamping the position at the `i32` range.
    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x.saturating_add(dx), self.y.saturating_add(dy), self.w, self.h)
    }

    /// Split into `(position, size)` vectors.
    pub fn position_and_size(&self) -> (Vec2, Vec2) {
        (
            Vec2::new(self.x as f32, self.y as f32),
            Vec2::new(self.w as f32, self.h as f32),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4
    }

    #[test]
    fn magnitude_and_normalize() {
        let v = Vec2::new(3.0, 4.0);
        assert_eq!(v.magnitude(), 5.0);
        assert!(approx(v.normalize(), Vec2::new(0.6, 0.8)));
    }

    #[test]
    fn rects_at_the_edge_of_i32_do_not_overflow() {
        let far = Rect::new(i32::MAX - 5, 0, 10, 10);
        assert!(!far.has_intersection(&Rect::new(0, 0, 10, 10)));
        assert_eq!(
            far.intersection(&Rect::new(i32::MAX - 8, 2, 5, 5)),
            Some(Rect::new(i32::MAX - 5, 2, 2, 5))
        );
        assert!(far.has_intersection(&far));
        assert_eq!(far.right(), i32::MAX as i64 + 5);
        assert!(!far.contains_point(Vec2::new(0.0, 5.0)));
        assert_eq!(far.translated(100, 0).x, i32::MAX);

        let low = Rect::new(i32::MIN, i32::MIN, 4, 4);
        assert_eq!(low.translated(-1, -1), low);
        assert!(!low.has_intersection(&far));
    }

    #[test]
    fn normalize_zero_is_zero() {
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
    }

    #[test]
    fn rotate_up_by_90_degrees_points_right() {
        // y-down screen space: rotating UP clockwise by 90 gives RIGHT.
        let r = Vec2::UP.rotate_degrees(90.0);
        assert!(approx(r, Vec2::RIGHT), "got {r:?}");
    }

    #[test]
    fn rotate_around_center() {
        let p = Vec2::new(2.0, 1.0);
        let c = Vec2::new(1.0, 1.0);
        let r = p.rotate_around_degrees(c, 180.0);
        assert!(approx(r, Vec2::new(0.0, 1.0)), "got {r:?}");
    }

    #[test]
    fn lerp_midpoint() {
        let m = Vec2::lerp(Vec2::ZERO, Vec2::new(10.0, -4.0), 0.5);
        assert_eq!(m, Vec2::new(5.0, -2.0));
    }

    #[test]
    fn clamp_min_max_abs() {
        let v = Vec2::new(-5.0, 50.0);
        assert_eq!(
            v.clamp(Vec2::ZERO, Vec2::new(10.0, 10.0)),
            Vec2::new(0.0, 10.0)
        );
        assert_eq!(v.abs(), Vec2::new(5.0, 50.0));
        assert_eq!(v.max(Vec2::ZERO), Vec2::new(0.0, 50.0));
        assert_eq!(v.min(Vec2::ZERO), Vec2::new(-5.0, 0.0));
    }

    #[test]
    fn centered_rect() {
        let r = Vec2::new(50.0, 50.0).to_centered_rect(Vec2::new(20.0, 10.0));
        assert_eq!(r, Rect::new(40, 45, 20, 10));
        assert_eq!(r.center(), Vec2::new(50.0, 50.0));
    }

    #[test]
    fn overlapping_rects_intersect() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert!(a.has_intersection(&b));
        assert_eq!(a.intersection(&b), Some(Rect::new(5, 5, 5, 5)));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect::new(0, 0, 10, 10);
        let right = Rect::new(10, 0, 10, 10);
        let below = Rect::new(0, 10, 10, 10);
        assert!(!a.has_intersection(&right));
        assert!(!a.has_intersection(&below));
    }

    #[test]
    fn empty_rect_never_intersects() {
        let a = Rect::new(0, 0, 10, 10);
        assert!(!a.has_intersection(&Rect::new(2, 2, 0, 5)));
        assert!(!Rect::new(2, 2, 5, -1).has_intersection(&a));
    }

    #[test]
    fn contained_rect_intersects() {
        let outer = Rect::new(0, 0, 100, 100);
        let inner = Rect::new(40, 40, 2, 2);
        assert!(outer.has_intersection(&inner));
        assert!(inner.has_intersection(&outer));
    }

    #[test]
    fn circle_overlap() {
        let r = Rect::new(0, 0, 10, 10);
        assert!(r.overlaps_circle(Vec2::new(5.0, 5.0), 1.0));
        assert!(r.overlaps_circle(Vec2::new(13.0, 5.0), 3.0));
        assert!(!r.overlaps_circle(Vec2::new(13.0, 5.0), 2.9));
        assert!(!r.overlaps_circle(Vec2::new(20.0, 20.0), 5.0));
    }

    #[test]
    fn contains_point_half_open() {
        let r = Rect::new(0, 0, 10, 10);
        assert!(r.contains_point(Vec2::new(0.0, 0.0)));
        assert!(!r.contains_point(Vec2::new(10.0, 5.0)));
    }
}
