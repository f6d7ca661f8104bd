//! Geometry helpers for the 0-100 play field
//!
//! Everything here is pure. Randomized helpers take the session RNG so runs
//! stay reproducible.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle given by its top-left corner and extent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Circle given by center and radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Proximity test on both axes: `|dx| < threshold && |dy| < threshold`
#[inline]
pub fn within_box(a: Vec2, b: Vec2, threshold: f32) -> bool {
    let d = (a - b).abs();
    d.x < threshold && d.y < threshold
}

/// Whether the segment `start -> end` passes through the open box
/// `(-threshold, threshold)` on both axes around the origin.
///
/// Used with relative positions so two movers that swap sides within one
/// step still register contact.
pub fn segment_enters_box(start: Vec2, end: Vec2, threshold: f32) -> bool {
    let delta = end - start;
    let mut enter = 0.0_f32;
    let mut exit = 1.0_f32;
    for (p, d) in [(start.x, delta.x), (start.y, delta.y)] {
        if d == 0.0 {
            if p.abs() >= threshold {
                return false;
            }
            continue;
        }
        let t0 = (-threshold - p) / d;
        let t1 = (threshold - p) / d;
        enter = enter.max(t0.min(t1));
        exit = exit.min(t0.max(t1));
    }
    enter < exit
}

/// Collision threshold for two centered entities: half of each extent plus
/// a forgiveness margin
#[inline]
pub fn contact_threshold(size_a: f32, size_b: f32, margin: f32) -> f32 {
    (size_a + size_b) * 0.5 + margin
}

/// Overlap of two rectangles (edges touching do not count)
pub fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    a.x < b.x + b.width && a.x + a.width > b.x && a.y < b.y + b.height && a.y + a.height > b.y
}

/// Overlap of two circles
pub fn circles_overlap(a: &Circle, b: &Circle) -> bool {
    distance(a.center, b.center) < a.radius + b.radius
}

/// Clamp a position into `[0, max.x] x [0, max.y]`
#[inline]
pub fn clamp_to_field(pos: Vec2, max: Vec2) -> Vec2 {
    pos.clamp(Vec2::ZERO, max)
}

/// Linear interpolation
#[inline]
pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start * (1.0 - t) + end * t
}

/// Cubic ease-in-out over `t` in [0, 1]
pub fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Uniform float in `[min, max)`; returns `min` for an empty range
pub fn random_range<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max <= min {
        return min;
    }
    rng.random_range(min..max)
}

/// Uniform integer in `[min, max]` (inclusive)
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, min: i32, max: i32) -> i32 {
    if max <= min {
        return min;
    }
    rng.random_range(min..=max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_within_box_is_strict() {
        let a = Vec2::new(50.0, 50.0);
        assert!(within_box(a, Vec2::new(54.9, 45.1), 5.0));
        assert!(!within_box(a, Vec2::new(55.0, 50.0), 5.0));
        assert!(!within_box(a, Vec2::new(50.0, 44.0), 5.0));
    }

    #[test]
    fn test_segment_enters_box() {
        // Passes straight through the middle without ending inside
        assert!(segment_enters_box(Vec2::new(0.0, 2.35), Vec2::new(0.0, -2.35), 2.25));
        // Ends inside
        assert!(segment_enters_box(Vec2::new(0.0, 6.0), Vec2::new(0.0, 2.0), 2.25));
        // Stops short
        assert!(!segment_enters_box(Vec2::new(0.0, 9.0), Vec2::new(0.0, 2.5), 2.25));
        // Crosses the y band too far to the side
        assert!(!segment_enters_box(Vec2::new(3.0, 5.0), Vec2::new(3.0, -5.0), 2.25));
        // Diagonal that clips past a corner
        assert!(!segment_enters_box(Vec2::new(-5.0, 0.0), Vec2::new(0.0, 5.0), 2.0));
        // Stationary relative motion falls back to the box test
        assert!(segment_enters_box(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0), 2.0));
        assert!(!segment_enters_box(Vec2::new(2.0, 1.0), Vec2::new(2.0, 1.0), 2.0));
    }

    #[test]
    fn test_contact_threshold() {
        assert_eq!(contact_threshold(4.0, 6.0, 0.0), 5.0);
        assert_eq!(contact_threshold(2.0, 2.0, 0.5), 2.5);
    }

    #[test]
    fn test_rects_and_circles() {
        let a = Rect { x: 0.0, y: 0.0, width: 10.0, height: 10.0 };
        let b = Rect { x: 9.0, y: 9.0, width: 5.0, height: 5.0 };
        let c = Rect { x: 10.0, y: 0.0, width: 5.0, height: 5.0 };
        assert!(rects_overlap(&a, &b));
        assert!(!rects_overlap(&a, &c));

        let p = Circle { center: Vec2::ZERO, radius: 3.0 };
        let q = Circle { center: Vec2::new(4.0, 3.0), radius: 2.1 };
        assert!(circles_overlap(&p, &q));
        let q = Circle { radius: 2.0, ..q };
        assert!(!circles_overlap(&p, &q));
    }

    #[test]
    fn test_clamp_to_field() {
        let max = Vec2::new(95.0, 85.0);
        assert_eq!(clamp_to_field(Vec2::new(-3.0, 120.0), max), Vec2::new(0.0, 85.0));
        assert_eq!(clamp_to_field(Vec2::new(40.0, 40.0), max), Vec2::new(40.0, 40.0));
    }

    #[test]
    fn test_easing_endpoints() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-6);
        assert!((ease_in_out(1.0) - 1.0).abs() < 1e-6);
        assert_eq!(lerp(10.0, 20.0, 0.25), 12.5);
    }

    #[test]
    fn test_random_helpers_stay_in_range() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..200 {
            let f = random_range(&mut rng, 5.0, 90.0);
            assert!((5.0..90.0).contains(&f));
            let i = random_int(&mut rng, 0, 4);
            assert!((0..=4).contains(&i));
        }
        assert_eq!(random_range(&mut rng, 3.0, 3.0), 3.0);
    }
}
