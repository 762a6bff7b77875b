//! Deterministic interaction core
//!
//! Everything that decides what the page does lives here. This module must be
//! pure and deterministic:
//! - Seeded RNG only
//! - Frame timestamps come from the caller
//! - No DOM or platform dependencies

pub mod confetti;
pub mod controller;
pub mod evasion;
pub mod hearts;
pub mod mood;
pub mod tick;

pub use confetti::{ConfettiAnimator, ConfettiParticle, default_origin};
pub use controller::{Controller, Directive, InputEvent, Layout, Phase, Signal};
pub use evasion::{Placement, Rect, clamp_to_viewport, place_target};
pub use hearts::{HeartLoop, HeartSpawn};
pub use mood::MoodState;
pub use tick::{FrameStatus, ManualStepper, TickSource};
