//! Confetti particle animator
//!
//! A single burst at success, simulated once per display frame. Per-frame
//! constants (gravity, damping, fade) are in "pixels per frame" units; only the
//! emission window is measured in wall time, from frame timestamps.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use super::evasion::Rect;
use super::tick::{FrameStatus, TickSource};
use crate::consts::{
    CONFETTI_DAMPING, CONFETTI_EMISSION_MS, CONFETTI_FADE_LINE, CONFETTI_FADE_PER_FRAME,
};

/// One paper rectangle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfettiParticle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Width and height
    pub size: Vec2,
    /// Index into the animator palette
    pub color: usize,
    pub rotation: f32,
    pub rotation_speed: f32,
    pub gravity: f32,
    pub opacity: f32,
}

impl ConfettiParticle {
    /// Roll a particle somewhere inside `origin`
    pub fn random<R: Rng + ?Sized>(rng: &mut R, origin: &Rect, palette_len: usize) -> Self {
        Self {
            pos: origin.sample(rng),
            vel: Vec2::new(
                rng.random_range(-6.0..=6.0),
                rng.random_range(-16.0..=-4.0),
            ),
            size: Vec2::new(rng.random_range(4.0..12.0), rng.random_range(3.0..9.0)),
            color: if palette_len == 0 {
                0
            } else {
                rng.random_range(0..palette_len)
            },
            rotation: rng.random_range(0.0..TAU),
            rotation_speed: rng.random_range(-0.075..=0.075),
            gravity: rng.random_range(0.12..=0.18),
            opacity: 1.0,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.opacity > 0.0
    }

    /// Advance one frame. Fades below `fade_line` or once emission closed.
    fn integrate(&mut self, fade_line: f32, emitting: bool) {
        self.vel.y += self.gravity;
        self.pos += self.vel;
        self.vel.x *= CONFETTI_DAMPING;
        self.rotation += self.rotation_speed;

        if self.pos.y > fade_line || !emitting {
            self.opacity = (self.opacity - CONFETTI_FADE_PER_FRAME).max(0.0);
        }
    }
}

/// Default launch band: middle 40% of the width, 40% down the screen
pub fn default_origin(viewport: Vec2) -> Rect {
    Rect::new(viewport.x * 0.3, viewport.y * 0.4, viewport.x * 0.4, 0.0)
}

/// Frame-stepped confetti simulation
#[derive(Debug, Clone)]
pub struct ConfettiAnimator {
    particles: Vec<ConfettiParticle>,
    palette: Vec<String>,
    viewport: Vec2,
    started_at: f64,
    emitting: bool,
    active: bool,
}

impl ConfettiAnimator {
    pub fn new(viewport: Vec2) -> Self {
        Self {
            particles: Vec::new(),
            palette: Vec::new(),
            viewport,
            started_at: 0.0,
            emitting: false,
            active: false,
        }
    }

    pub fn particles(&self) -> &[ConfettiParticle] {
        &self.particles
    }

    /// Particles that should still be drawn
    pub fn visible(&self) -> impl Iterator<Item = &ConfettiParticle> {
        self.particles.iter().filter(|p| p.is_alive())
    }

    pub fn live_count(&self) -> usize {
        self.visible().count()
    }

    /// CSS color for a particle
    pub fn color_of(&self, particle: &ConfettiParticle) -> &str {
        self.palette
            .get(particle.color)
            .map(String::as_str)
            .unwrap_or("#e91e63")
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_emitting(&self) -> bool {
        self.emitting
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    /// Seed `count` particles and open the emission window at `now_ms`
    pub fn burst<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        count: usize,
        origin: &Rect,
        palette: &[String],
        now_ms: f64,
    ) {
        self.palette = palette.to_vec();
        self.particles = (0..count)
            .map(|_| ConfettiParticle::random(rng, origin, palette.len()))
            .collect();
        self.started_at = now_ms;
        self.emitting = true;
        self.active = count > 0;
        log::info!("Confetti burst: {} particles", count);
    }

    /// Burst from the default origin and ask `source` for the first frame
    pub fn launch<R, T>(
        &mut self,
        rng: &mut R,
        count: usize,
        palette: &[String],
        now_ms: f64,
        source: &mut T,
    ) where
        R: Rng + ?Sized,
        T: TickSource + ?Sized,
    {
        let origin = default_origin(self.viewport);
        self.burst(rng, count, &origin, palette, now_ms);
        if self.active {
            source.request_frame();
        }
    }

    /// Simulate one frame at timestamp `now_ms`
    pub fn step(&mut self, now_ms: f64) -> FrameStatus {
        if !self.active {
            return FrameStatus::Finished;
        }

        if self.emitting && now_ms - self.started_at >= CONFETTI_EMISSION_MS {
            self.emitting = false;
            log::debug!("Confetti emission window closed");
        }

        let fade_line = self.viewport.y * CONFETTI_FADE_LINE;
        let emitting = self.emitting;
        for particle in self.particles.iter_mut().filter(|p| p.is_alive()) {
            particle.integrate(fade_line, emitting);
        }

        if !self.emitting && self.particles.iter().all(|p| !p.is_alive()) {
            self.active = false;
            log::debug!("Confetti retired");
            return FrameStatus::Finished;
        }
        FrameStatus::Running
    }

    /// Step and, while still running, schedule the next frame
    pub fn tick<T: TickSource + ?Sized>(&mut self, now_ms: f64, source: &mut T) -> FrameStatus {
        let status = self.step(now_ms);
        if status == FrameStatus::Running {
            source.request_frame();
        }
        status
    }

    /// Drop everything immediately (reduced motion switched on)
    pub fn stop<T: TickSource + ?Sized>(&mut self, source: &mut T) {
        if self.active {
            log::info!("Confetti stopped");
        }
        self.particles.clear();
        self.emitting = false;
        self.active = false;
        source.cancel_frame();
    }
}
