//! Valentine Duck - a duck that escalates until you click Yes
//!
//! Core modules:
//! - `sim`: Deterministic interaction core (mood, evasion, controller, confetti, hearts)
//! - `platform`: Browser adapter that turns directives into DOM effects
//! - `settings`: Page configuration with defaults

pub mod platform;
pub mod settings;
pub mod sim;

pub use settings::Settings;
pub use sim::{Controller, Directive, Signal};

/// Interaction tuning constants
pub mod consts {
    /// Distance kept between the escaping button and the viewport edge
    pub const PLACEMENT_MARGIN: f32 = 20.0;
    /// Extra clearance around the Yes button the No button must not enter
    pub const OBSTACLE_PADDING: f32 = 20.0;
    /// Random candidates tried before accepting an overlapping spot
    pub const MAX_PLACEMENT_ATTEMPTS: u32 = 15;

    /// Highest anger level (the gif)
    pub const MAX_MOOD_LEVEL: u8 = 8;
    /// Escapes beyond this trigger the meltdown
    pub const MELTDOWN_ESCAPES: u32 = 7;
    /// Focus escapes allowed before keyboard users get through
    pub const FOCUS_MERCY_LIMIT: u32 = 8;
    /// Delay before the Yes button detaches during meltdown
    pub const MELTDOWN_COLLAPSE_DELAY_MS: u32 = 400;
    /// Distance from the bottom edge where fallen elements land
    pub const FALL_MARGIN: f32 = 10.0;

    /// Confetti defaults
    pub const CONFETTI_COUNT: usize = 120;
    pub const CONFETTI_DAMPING: f32 = 0.99;
    pub const CONFETTI_FADE_PER_FRAME: f32 = 0.015;
    /// Fraction of the viewport height below which confetti starts fading
    pub const CONFETTI_FADE_LINE: f32 = 0.7;
    /// Emission window in milliseconds
    pub const CONFETTI_EMISSION_MS: f64 = 4000.0;

    /// Nominal display refresh used by the manual stepper and native demo
    pub const FRAME_MS: f64 = 1000.0 / 60.0;

    /// Heart spawn delay range (ms)
    pub const HEART_DELAY_MIN_MS: u32 = 1000;
    pub const HEART_DELAY_MAX_MS: u32 = 4000;
}
