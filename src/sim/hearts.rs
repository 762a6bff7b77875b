//! Floating hearts background loop
//!
//! Self-rescheduling: every spawn rolls the delay until the next one. The loop
//! keeps the handle of its pending timer so stopping cancels it exactly once.

use rand::Rng;

use crate::consts::{HEART_DELAY_MAX_MS, HEART_DELAY_MIN_MS};

pub const HEART_GLYPHS: [&str; 5] = [
    "\u{1F497}",
    "\u{1F495}",
    "\u{1F496}",
    "\u{2764}\u{FE0F}",
    "\u{1F49C}",
];

/// Everything the page needs to float one heart
#[derive(Debug, Clone, PartialEq)]
pub struct HeartSpawn {
    pub glyph: &'static str,
    /// Horizontal position in vw
    pub left_vw: f32,
    pub font_rem: f32,
    pub duration_s: f32,
    /// Horizontal sway amplitude in px
    pub sway_px: f32,
}

impl HeartSpawn {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            glyph: HEART_GLYPHS[rng.random_range(0..HEART_GLYPHS.len())],
            left_vw: rng.random_range(5.0..95.0),
            font_rem: rng.random_range(0.7..1.7),
            duration_s: rng.random_range(4.0..9.0),
            sway_px: rng.random_range(-40.0..40.0),
        }
    }
}

/// Heart loop state, generic over the host timer handle
#[derive(Debug)]
pub struct HeartLoop<H> {
    pending: Option<H>,
    running: bool,
}

impl<H> Default for HeartLoop<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> HeartLoop<H> {
    pub fn new() -> Self {
        Self {
            pending: None,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Begin spawning. Returns `true` when the caller should spawn now;
    /// `false` under reduced motion or when already running.
    pub fn start(&mut self, reduced_motion: bool) -> bool {
        if reduced_motion || self.running {
            return false;
        }
        self.running = true;
        log::debug!("Heart loop started");
        true
    }

    /// Roll the next heart and the delay before the one after it.
    ///
    /// Returns `None` once the loop was stopped, so a late timer does nothing.
    pub fn spawn<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<(HeartSpawn, u32)> {
        if !self.running {
            return None;
        }
        // The timer that fired us is no longer pending
        self.pending = None;
        let heart = HeartSpawn::random(rng);
        let delay = rng.random_range(HEART_DELAY_MIN_MS..HEART_DELAY_MAX_MS);
        Some((heart, delay))
    }

    /// Remember the timer scheduled for the next spawn
    pub fn arm(&mut self, handle: H) {
        if self.running {
            self.pending = Some(handle);
        }
    }

    /// Stop the loop. Returns the timer to cancel, at most once.
    pub fn stop(&mut self) -> Option<H> {
        if self.running {
            log::debug!("Heart loop stopped");
        }
        self.running = false;
        self.pending.take()
    }
}
