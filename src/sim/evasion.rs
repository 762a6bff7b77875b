//! Evasion engine: where the No button runs to
//!
//! Bounded random sampling inside the viewport, rejecting spots that crowd the
//! Yes button. When nothing fits in the attempt budget the last sample wins.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{MAX_PLACEMENT_ATTEMPTS, OBSTACLE_PADDING, PLACEMENT_MARGIN};

/// Axis-aligned rectangle in viewport coordinates (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner
    pub origin: Vec2,
    /// Width and height
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    pub fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.origin.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.origin.y
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.origin.x + self.size.x
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.y
    }

    /// Grow by `pad` on every side
    pub fn expand(&self, pad: f32) -> Self {
        Self {
            origin: self.origin - Vec2::splat(pad),
            size: self.size + Vec2::splat(pad * 2.0),
        }
    }

    /// Strict overlap test; touching edges do not count
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Uniform random point inside the rect
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        Vec2::new(
            self.origin.x + rng.random::<f32>() * self.size.x,
            self.origin.y + rng.random::<f32>() * self.size.y,
        )
    }
}

/// Outcome of a placement search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Top-left corner for the evading element
    pub position: Vec2,
    /// Candidates sampled (1..=MAX_PLACEMENT_ATTEMPTS)
    pub attempts: u32,
    /// True when the budget ran out and the last sample still overlaps
    pub overlaps: bool,
}

/// Width of the legal top-left range on one axis, starting at `margin`.
/// Zero when the element does not fit.
#[inline]
fn axis_span(extent: f32, bound: f32) -> f32 {
    (extent - bound - PLACEMENT_MARGIN * 2.0).max(0.0)
}

/// Pick a new spot for an element of `bounds` size that keeps clear of `obstacle`.
pub fn place_target<R: Rng + ?Sized>(
    rng: &mut R,
    bounds: Vec2,
    obstacle: &Rect,
    viewport: Vec2,
) -> Placement {
    let span_x = axis_span(viewport.x, bounds.x);
    let span_y = axis_span(viewport.y, bounds.y);
    let keep_out = obstacle.expand(OBSTACLE_PADDING);

    let mut position = Vec2::splat(PLACEMENT_MARGIN);
    let mut overlaps = true;
    let mut attempts = 0;

    while attempts < MAX_PLACEMENT_ATTEMPTS {
        attempts += 1;
        position = Vec2::new(
            PLACEMENT_MARGIN + rng.random::<f32>() * span_x,
            PLACEMENT_MARGIN + rng.random::<f32>() * span_y,
        );
        overlaps = Rect::from_origin_size(position, bounds).intersects(&keep_out);
        if !overlaps {
            break;
        }
    }

    if overlaps {
        log::debug!(
            "No clear spot after {} attempts, settling at ({:.0}, {:.0})",
            attempts,
            position.x,
            position.y
        );
    }

    Placement {
        position,
        attempts,
        overlaps,
    }
}

/// Pull an already-placed element back inside the margins after a resize
pub fn clamp_to_viewport(position: Vec2, bounds: Vec2, viewport: Vec2) -> Vec2 {
    let max = Vec2::new(
        PLACEMENT_MARGIN + axis_span(viewport.x, bounds.x),
        PLACEMENT_MARGIN + axis_span(viewport.y, bounds.y),
    );
    position.clamp(Vec2::splat(PLACEMENT_MARGIN), max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const BUTTON: Vec2 = Vec2::new(120.0, 48.0);

    /// Bounds check with a little slack for f32 rounding
    fn within_margins(placed: &Rect, viewport: Vec2) -> bool {
        const EPS: f32 = 1e-3;
        placed.left() >= PLACEMENT_MARGIN - EPS
            && placed.top() >= PLACEMENT_MARGIN - EPS
            && placed.right() <= viewport.x - PLACEMENT_MARGIN + EPS
            && placed.bottom() <= viewport.y - PLACEMENT_MARGIN + EPS
    }

    #[test]
    fn test_rect_overlap_is_strict() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let touching = Rect::new(10.0, 0.0, 10.0, 10.0);
        let overlapping = Rect::new(9.0, 9.0, 10.0, 10.0);
        assert!(!a.intersects(&touching));
        assert!(a.intersects(&overlapping));
        assert!(a.expand(1.0).intersects(&touching));
    }

    #[test]
    fn test_typical_placement_avoids_obstacle() {
        let mut rng = Pcg32::seed_from_u64(7);
        let viewport = Vec2::new(1280.0, 800.0);
        let yes = Rect::new(500.0, 600.0, 120.0, 48.0);

        let placement = place_target(&mut rng, BUTTON, &yes, viewport);
        assert!(!placement.overlaps);
        let placed = Rect::from_origin_size(placement.position, BUTTON);
        assert!(!placed.intersects(&yes.expand(OBSTACLE_PADDING)));
    }

    #[test]
    fn test_fallback_when_obstacle_covers_everything() {
        let mut rng = Pcg32::seed_from_u64(3);
        let viewport = Vec2::new(400.0, 300.0);
        let wall = Rect::new(0.0, 0.0, 400.0, 300.0);

        let placement = place_target(&mut rng, BUTTON, &wall, viewport);
        assert!(placement.overlaps);
        assert_eq!(placement.attempts, MAX_PLACEMENT_ATTEMPTS);
        // Still inside the margins
        let placed = Rect::from_origin_size(placement.position, BUTTON);
        assert!(within_margins(&placed, viewport));
    }

    #[test]
    fn test_tiny_viewport_pins_to_margin() {
        let mut rng = Pcg32::seed_from_u64(11);
        let viewport = Vec2::new(100.0, 50.0);
        let yes = Rect::new(500.0, 500.0, 10.0, 10.0);

        let placement = place_target(&mut rng, BUTTON, &yes, viewport);
        assert_eq!(placement.position, Vec2::splat(PLACEMENT_MARGIN));
    }

    #[test]
    fn test_clamp_after_shrink() {
        let viewport = Vec2::new(640.0, 480.0);
        let clamped = clamp_to_viewport(Vec2::new(1100.0, -5.0), BUTTON, viewport);
        assert_eq!(clamped, Vec2::new(640.0 - 120.0 - 20.0, 20.0));

        let inside = Vec2::new(100.0, 100.0);
        assert_eq!(clamp_to_viewport(inside, BUTTON, viewport), inside);
    }

    #[test]
    fn test_same_seed_same_spot() {
        let viewport = Vec2::new(1024.0, 768.0);
        let yes = Rect::new(300.0, 300.0, 120.0, 48.0);
        let a = place_target(&mut Pcg32::seed_from_u64(99), BUTTON, &yes, viewport);
        let b = place_target(&mut Pcg32::seed_from_u64(99), BUTTON, &yes, viewport);
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn prop_placement_stays_inside_margins(
            seed in any::<u64>(),
            vw in 200.0f32..2560.0,
            vh in 200.0f32..1600.0,
            ox in 0.0f32..2000.0,
            oy in 0.0f32..1200.0,
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let viewport = Vec2::new(vw, vh);
            let obstacle = Rect::new(ox, oy, 120.0, 48.0);
            let placement = place_target(&mut rng, BUTTON, &obstacle, viewport);
            let placed = Rect::from_origin_size(placement.position, BUTTON);
            prop_assert!(within_margins(&placed, viewport), "{:?} escaped {:?}", placed, viewport);
        }

        #[test]
        fn prop_roomy_viewport_never_falls_back(seed in any::<u64>()) {
            // Keep-out zone covers well under half of the legal area, so
            // 15 misses in a row is vanishingly unlikely for any seed we try.
            let mut rng = Pcg32::seed_from_u64(seed);
            let viewport = Vec2::new(1920.0, 1080.0);
            let obstacle = Rect::new(900.0, 500.0, 120.0, 48.0);
            let placement = place_target(&mut rng, BUTTON, &obstacle, viewport);
            prop_assert!(!placement.overlaps);
        }
    }
}
