//! Duck mood model
//!
//! Pure state: anger level, escape counters and the terminal success flag.
//! Presentation lives elsewhere; this only knows numbers and caption text.


use crate::consts::{FOCUS_MERCY_LIMIT, MAX_MOOD_LEVEL};

/// Level shown once the player said yes
pub const SUCCESS_LEVEL: u8 = 0;
/// Level shown before any escape
pub const DEFAULT_LEVEL: u8 = 1;
/// First level that shakes the duck
pub const EMPHASIS_LEVEL: u8 = 3;

/// Caption per mood level (index = level)
pub const ANGER_CAPTIONS: [&str; 9] = [
    "",
    "",
    "Hmm... \u{1F928}",
    "Hey! \u{1F620}",
    "Stop that! \u{1F621}",
    "I said STOP! \u{1F624}",
    "SERIOUSLY?! \u{1F92C}",
    "CLICK YES!! \u{1F4A2}",
    "JUST. CLICK. YES. \u{1F621}\u{1F4A2}\u{1F621}",
];

/// Caption shown after success
pub const SUCCESS_CAPTION: &str = "I love you! \u{1F496}";

/// Mood level for a given escape count (ignores success)
#[inline]
pub fn level_for_escapes(escape_count: u32) -> u8 {
    let level = escape_count.saturating_add(1).min(MAX_MOOD_LEVEL as u32) as u8;
    level.max(DEFAULT_LEVEL)
}

/// Caption text for a level (empty for out-of-range levels)
pub fn caption_for(level: u8) -> &'static str {
    ANGER_CAPTIONS.get(level as usize).copied().unwrap_or("")
}

/// Whether a level gets the shake effect
#[inline]
pub fn is_emphasized(level: u8) -> bool {
    level >= EMPHASIS_LEVEL
}

/// Current mood of the duck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoodState {
    level: u8,
    escape_count: u32,
    success: bool,
    focus_escapes: u32,
}

impl Default for MoodState {
    fn default() -> Self {
        Self::new()
    }
}

impl MoodState {
    pub fn new() -> Self {
        Self {
            level: DEFAULT_LEVEL,
            escape_count: 0,
            success: false,
            focus_escapes: 0,
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn escape_count(&self) -> u32 {
        self.escape_count
    }

    pub fn focus_escapes(&self) -> u32 {
        self.focus_escapes
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Keyboard users have earned a free pass
    pub fn mercy_granted(&self) -> bool {
        self.focus_escapes > FOCUS_MERCY_LIMIT
    }

    /// Count one more escape and recompute the level.
    ///
    /// Returns the resulting state. Does nothing once success is set.
    pub fn escalate(&mut self) -> MoodState {
        if self.success {
            return *self;
        }
        self.escape_count = self.escape_count.saturating_add(1);
        self.level = level_for_escapes(self.escape_count);
        self.check_invariant();
        *self
    }

    /// Count a focus-triggered escape.
    ///
    /// Returns `true` when the escape should be suppressed: from the ninth
    /// call onward, and always after success (without counting).
    pub fn record_focus_escape(&mut self) -> bool {
        if self.success {
            return true;
        }
        self.focus_escapes = self.focus_escapes.saturating_add(1);
        self.mercy_granted()
    }

    /// Freeze the duck in love. Idempotent.
    pub fn mark_success(&mut self) {
        if self.success {
            return;
        }
        self.success = true;
        self.level = SUCCESS_LEVEL;
    }

    fn check_invariant(&self) {
        if self.success {
            debug_assert_eq!(self.level, SUCCESS_LEVEL, "success must freeze level at 0");
        } else {
            debug_assert_eq!(
                self.level,
                level_for_escapes(self.escape_count),
                "level out of sync with escape count"
            );
        }
    }
}
