//! Interaction state machine
//!
//! Owns the mood and the placement RNG. Every page event is normalized into a
//! [`Signal`] and answered with a list of [`Directive`]s for the page to apply;
//! nothing in here touches the DOM.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::evasion::{Rect, clamp_to_viewport, place_target};
use super::mood::{self, MoodState, SUCCESS_CAPTION, SUCCESS_LEVEL};
use crate::consts::{MELTDOWN_COLLAPSE_DELAY_MS, MELTDOWN_ESCAPES};

pub const ANNOUNCE_ANNOYED: &str = "The No button escaped! The duck is getting annoyed.";
pub const ANNOUNCE_ANGRY: &str = "The No button escaped! The duck is getting angry.";
pub const ANNOUNCE_MELTDOWN: &str = "The duck has had enough! Only Yes is left.";
pub const ANNOUNCE_SUCCESS: &str = "Yaaay! The duck is so happy! You said yes!";

/// Where the interaction stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Happy duck, nothing happened yet
    Idle,
    /// Levels 2-7
    Escalating,
    /// Gif level, one more escape melts everything down
    MeltdownPending,
    /// Scene collapsed, only Yes is left
    Meltdown,
    /// Said yes (terminal)
    Success,
}

/// Raw events the page forwards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Pointer entered the No button
    PointerEnter,
    /// No button received focus
    Focus,
    /// Finger landed on the No button
    TouchStart,
    /// No button was clicked (fast cursor or keyboard activation)
    Click,
    /// Yes button was clicked
    ConfirmClick,
    ViewportResize,
}

/// Normalized signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Run away. `focus_based` is set for keyboard/assistive triggers.
    Evade { focus_based: bool },
    Confirm,
    Resize,
}

/// Page geometry at the time of an event
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Layout {
    pub viewport: Vec2,
    /// Current box of the No button
    pub target: Rect,
    /// Current box of the Yes button
    pub obstacle: Rect,
    /// Whether the No button holds keyboard focus
    pub target_focused: bool,
}

/// Commands for the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Swap the duck image to `level` and show `caption`
    SetMood { level: u8, caption: &'static str },
    /// Restart the shake effect
    Emphasize,
    ClearEmphasis,
    /// Put the No button's top-left corner here
    MoveTarget(Vec2),
    /// Replace the screen reader announcement
    Announce(&'static str),
    /// Swap to the real photo and drop the sign, caption and No button
    Meltdown,
    /// After `delay_ms`, detach the Yes button and drop the button row
    ScheduleCollapse { delay_ms: u32 },
    /// Undo the meltdown fall and cancel a pending collapse
    RestoreScene,
    StartHearts,
    StopHearts,
    LaunchConfetti,
    StopConfetti,
    /// Headline, sign text, hide No, disable Yes, make the duck clickable
    ShowSuccess,
    /// Toggle the success image: `true` shows the real photo
    ShowPhoto(bool),
    HideClickHint,
}

/// The state machine
#[derive(Debug, Clone)]
pub struct Controller {
    mood: MoodState,
    rng: Pcg32,
    seed: u64,
    /// Set once the No button left the layout flow
    target_position: Option<Vec2>,
    reduced_motion: bool,
    showing_photo: bool,
}

impl Controller {
    pub fn new(seed: u64) -> Self {
        Self {
            mood: MoodState::new(),
            rng: Pcg32::seed_from_u64(seed),
            seed,
            target_position: None,
            reduced_motion: false,
            showing_photo: false,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn mood(&self) -> &MoodState {
        &self.mood
    }

    /// Shared RNG for decorative randomness (hearts, confetti)
    pub fn rng_mut(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    pub fn target_position(&self) -> Option<Vec2> {
        self.target_position
    }

    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    pub fn phase(&self) -> Phase {
        if self.mood.is_success() {
            Phase::Success
        } else if self.is_melted() {
            Phase::Meltdown
        } else {
            match self.mood.level() {
                mood::DEFAULT_LEVEL => Phase::Idle,
                crate::consts::MAX_MOOD_LEVEL => Phase::MeltdownPending,
                _ => Phase::Escalating,
            }
        }
    }

    fn is_melted(&self) -> bool {
        self.mood.escape_count() > MELTDOWN_ESCAPES
    }

    /// Initial presentation for page load
    pub fn start(&mut self, reduced_motion: bool) -> Vec<Directive> {
        self.reduced_motion = reduced_motion;
        log::info!("Duck ready (seed {}, reduced motion {})", self.seed, reduced_motion);

        let mut out = vec![self.mood_directive()];
        if !reduced_motion {
            out.push(Directive::StartHearts);
        }
        out
    }

    /// Map a page event onto a logical signal
    pub fn normalize(&self, event: InputEvent, target_focused: bool) -> Signal {
        match event {
            InputEvent::PointerEnter | InputEvent::TouchStart => Signal::Evade {
                focus_based: target_focused,
            },
            InputEvent::Focus => Signal::Evade { focus_based: true },
            InputEvent::Click if self.mood.mercy_granted() => Signal::Confirm,
            InputEvent::Click => Signal::Evade {
                focus_based: target_focused,
            },
            InputEvent::ConfirmClick => Signal::Confirm,
            InputEvent::ViewportResize => Signal::Resize,
        }
    }

    /// Normalize and handle a page event
    pub fn handle_input(&mut self, event: InputEvent, layout: &Layout) -> Vec<Directive> {
        let signal = self.normalize(event, layout.target_focused);
        self.handle_signal(signal, layout)
    }

    /// Advance the state machine
    pub fn handle_signal(&mut self, signal: Signal, layout: &Layout) -> Vec<Directive> {
        match signal {
            Signal::Evade { focus_based } => self.evade(focus_based, layout),
            Signal::Confirm => self.confirm(),
            Signal::Resize => self.resize(layout),
        }
    }

    fn evade(&mut self, focus_based: bool, layout: &Layout) -> Vec<Directive> {
        if self.mood.is_success() {
            return Vec::new();
        }

        if focus_based && self.mood.record_focus_escape() {
            log::debug!(
                "Focus escape suppressed ({} so far)",
                self.mood.focus_escapes()
            );
            return Vec::new();
        }

        // The No button already fell off the page
        if self.is_melted() {
            return Vec::new();
        }

        let escalated = self.mood.escalate();
        if self.is_melted() {
            log::info!("Meltdown after {} escapes", escalated.escape_count());
            return vec![
                Directive::ClearEmphasis,
                Directive::Meltdown,
                Directive::StopHearts,
                Directive::ScheduleCollapse {
                    delay_ms: MELTDOWN_COLLAPSE_DELAY_MS,
                },
                Directive::Announce(ANNOUNCE_MELTDOWN),
            ];
        }

        let level = escalated.level();
        let mut out = vec![self.mood_directive()];
        if mood::is_emphasized(level) {
            out.push(Directive::Emphasize);
        }

        let placement = place_target(&mut self.rng, layout.target.size, &layout.obstacle, layout.viewport);
        self.target_position = Some(placement.position);
        out.push(Directive::MoveTarget(placement.position));

        log::info!(
            "Escape #{}: level {} -> ({:.0}, {:.0}) after {} tries",
            escalated.escape_count(),
            level,
            placement.position.x,
            placement.position.y,
            placement.attempts
        );

        out.push(Directive::Announce(if level <= mood::EMPHASIS_LEVEL {
            ANNOUNCE_ANNOYED
        } else {
            ANNOUNCE_ANGRY
        }));
        out
    }

    fn confirm(&mut self) -> Vec<Directive> {
        if self.mood.is_success() {
            return Vec::new();
        }
        let melted = self.is_melted();
        self.mood.mark_success();
        self.showing_photo = false;
        log::info!("Said yes after {} escapes", self.mood.escape_count());

        let mut out = Vec::new();
        if melted {
            out.push(Directive::RestoreScene);
        }
        out.push(Directive::ClearEmphasis);
        out.push(self.mood_directive());
        out.push(Directive::ShowSuccess);
        if !self.reduced_motion {
            out.push(Directive::LaunchConfetti);
        }
        out.push(Directive::Announce(ANNOUNCE_SUCCESS));
        out
    }

    fn resize(&mut self, layout: &Layout) -> Vec<Directive> {
        if self.mood.is_success() || self.is_melted() {
            return Vec::new();
        }
        let Some(position) = self.target_position else {
            return Vec::new();
        };
        let clamped = clamp_to_viewport(position, layout.target.size, layout.viewport);
        if clamped == position {
            return Vec::new();
        }
        self.target_position = Some(clamped);
        vec![Directive::MoveTarget(clamped)]
    }

    /// The motion preference changed
    pub fn set_reduced_motion(&mut self, reduced: bool) -> Vec<Directive> {
        if reduced == self.reduced_motion {
            return Vec::new();
        }
        self.reduced_motion = reduced;
        log::info!("Reduced motion: {}", reduced);

        if reduced {
            vec![Directive::StopHearts, Directive::StopConfetti]
        } else if self.is_melted() {
            // Meltdown cleared the hearts for good
            Vec::new()
        } else {
            vec![Directive::StartHearts]
        }
    }

    /// Click on the duck after success flips between duck and photo
    pub fn toggle_photo(&mut self) -> Vec<Directive> {
        if !self.mood.is_success() {
            return Vec::new();
        }
        self.showing_photo = !self.showing_photo;
        if self.showing_photo {
            vec![Directive::ShowPhoto(true), Directive::HideClickHint]
        } else {
            vec![Directive::ShowPhoto(false)]
        }
    }

    fn mood_directive(&self) -> Directive {
        let level = self.mood.level();
        let caption = if level == SUCCESS_LEVEL {
            SUCCESS_CAPTION
        } else {
            mood::caption_for(level)
        };
        Directive::SetMood { level, caption }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::OBSTACLE_PADDING;

    fn layout() -> Layout {
        Layout {
            viewport: Vec2::new(1280.0, 800.0),
            target: Rect::new(680.0, 500.0, 110.0, 48.0),
            obstacle: Rect::new(500.0, 500.0, 110.0, 48.0),
            target_focused: false,
        }
    }

    fn escalated(times: u32) -> Controller {
        let mut controller = Controller::new(42);
        controller.start(false);
        for _ in 0..times {
            controller.handle_input(InputEvent::PointerEnter, &layout());
        }
        controller
    }

    fn moved_to(directives: &[Directive]) -> Option<Vec2> {
        directives.iter().find_map(|d| match d {
            Directive::MoveTarget(pos) => Some(*pos),
            _ => None,
        })
    }

    #[test]
    fn test_start_shows_happy_duck_and_hearts() {
        let mut controller = Controller::new(1);
        let out = controller.start(false);
        assert_eq!(
            out,
            vec![
                Directive::SetMood { level: 1, caption: "" },
                Directive::StartHearts
            ]
        );
        assert_eq!(controller.phase(), Phase::Idle);

        let mut calm = Controller::new(1);
        assert!(!calm.start(true).contains(&Directive::StartHearts));
    }

    #[test]
    fn test_first_escape_moves_clear_of_yes() {
        let mut controller = escalated(0);
        let out = controller.handle_input(InputEvent::PointerEnter, &layout());

        assert_eq!(controller.mood().level(), 2);
        assert_eq!(controller.phase(), Phase::Escalating);
        assert_eq!(
            out[0],
            Directive::SetMood {
                level: 2,
                caption: "Hmm... \u{1F928}"
            }
        );
        assert!(!out.contains(&Directive::Emphasize));
        assert!(out.contains(&Directive::Announce(ANNOUNCE_ANNOYED)));

        let pos = moved_to(&out).expect("target moved");
        let placed = Rect::from_origin_size(pos, layout().target.size);
        assert!(!placed.intersects(&layout().obstacle.expand(OBSTACLE_PADDING)));
        assert_eq!(controller.target_position(), Some(pos));
    }

    #[test]
    fn test_anger_levels_emphasize_and_announce_angry() {
        let mut controller = escalated(2);
        let out = controller.handle_input(InputEvent::TouchStart, &layout());
        assert_eq!(controller.mood().level(), 4);
        assert!(out.contains(&Directive::Emphasize));
        assert!(out.contains(&Directive::Announce(ANNOUNCE_ANGRY)));
    }

    #[test]
    fn test_seventh_escape_is_meltdown_pending() {
        let controller = escalated(7);
        assert_eq!(controller.mood().level(), 8);
        assert_eq!(controller.phase(), Phase::MeltdownPending);
    }

    #[test]
    fn test_eighth_escape_melts_down_without_moving() {
        let mut controller = escalated(7);
        let before = controller.target_position();
        let out = controller.handle_input(InputEvent::PointerEnter, &layout());

        assert_eq!(controller.phase(), Phase::Meltdown);
        assert!(moved_to(&out).is_none());
        assert!(out.contains(&Directive::Meltdown));
        assert!(out.contains(&Directive::StopHearts));
        assert!(out.contains(&Directive::ScheduleCollapse { delay_ms: 400 }));
        assert_eq!(controller.target_position(), before);

        // Further hovers over the fallen button do nothing
        assert!(controller.handle_input(InputEvent::PointerEnter, &layout()).is_empty());
        assert_eq!(controller.mood().escape_count(), 8);
    }

    #[test]
    fn test_confirm_from_meltdown() {
        let mut controller = escalated(8);
        assert_eq!(controller.phase(), Phase::Meltdown);

        let out = controller.handle_input(InputEvent::ConfirmClick, &layout());
        assert_eq!(controller.phase(), Phase::Success);
        assert_eq!(controller.mood().level(), 0);
        assert_eq!(out[0], Directive::RestoreScene);
        assert!(out.contains(&Directive::SetMood {
            level: 0,
            caption: SUCCESS_CAPTION
        }));
        assert!(out.contains(&Directive::LaunchConfetti));
        assert!(out.contains(&Directive::Announce(ANNOUNCE_SUCCESS)));

        // Terminal
        for event in [
            InputEvent::PointerEnter,
            InputEvent::Focus,
            InputEvent::Click,
            InputEvent::ConfirmClick,
            InputEvent::ViewportResize,
        ] {
            assert!(controller.handle_input(event, &layout()).is_empty());
        }
        assert_eq!(controller.mood().level(), 0);
    }

    #[test]
    fn test_confirm_from_idle_skips_restore() {
        let mut controller = escalated(0);
        let out = controller.handle_input(InputEvent::ConfirmClick, &layout());
        assert!(!out.contains(&Directive::RestoreScene));
        assert!(out.contains(&Directive::ShowSuccess));
    }

    #[test]
    fn test_reduced_motion_skips_confetti() {
        let mut controller = Controller::new(5);
        controller.start(true);
        let out = controller.handle_signal(Signal::Confirm, &layout());
        assert!(!out.contains(&Directive::LaunchConfetti));
    }

    #[test]
    fn test_keyboard_mercy_turns_click_into_yes() {
        let mut controller = escalated(0);
        let focused = Layout {
            target_focused: true,
            ..layout()
        };
        for _ in 0..9 {
            controller.mood.record_focus_escape();
        }
        assert_eq!(controller.mood().escape_count(), 0);
        assert_eq!(controller.normalize(InputEvent::Click, true), Signal::Confirm);

        controller.handle_input(InputEvent::Click, &focused);
        assert_eq!(controller.phase(), Phase::Success);
    }

    #[test]
    fn test_focus_run_reaches_mercy() {
        let mut controller = escalated(0);
        let focused = Layout {
            target_focused: true,
            ..layout()
        };
        for _ in 0..8 {
            controller.handle_input(InputEvent::Focus, &focused);
        }
        assert_eq!(controller.phase(), Phase::Meltdown);
        assert_eq!(controller.mood().focus_escapes(), 8);

        // Ninth focus escape is suppressed but still counted
        assert!(controller.handle_input(InputEvent::Focus, &focused).is_empty());
        assert!(controller.mood().mercy_granted());

        controller.handle_input(InputEvent::Click, &focused);
        assert_eq!(controller.phase(), Phase::Success);
    }

    #[test]
    fn test_pointer_escapes_do_not_feed_mercy() {
        let mut controller = escalated(5);
        assert_eq!(controller.mood().focus_escapes(), 0);
        assert_eq!(
            controller.normalize(InputEvent::Click, false),
            Signal::Evade { focus_based: false }
        );
    }

    #[test]
    fn test_resize_clamps_escaped_button() {
        let mut controller = escalated(0);
        assert!(controller.handle_input(InputEvent::ViewportResize, &layout()).is_empty());

        controller.handle_input(InputEvent::PointerEnter, &layout());
        // Room left vertically only
        let short = Layout {
            viewport: Vec2::new(150.0, 100.0),
            ..layout()
        };
        let out = controller.handle_input(InputEvent::ViewportResize, &short);
        assert_eq!(moved_to(&out), Some(Vec2::new(20.0, 32.0)));

        // No room on either axis: pinned to the margin corner
        let small = Layout {
            viewport: Vec2::new(150.0, 80.0),
            ..layout()
        };
        let out = controller.handle_input(InputEvent::ViewportResize, &small);
        assert_eq!(moved_to(&out), Some(Vec2::splat(20.0)));
        assert_eq!(controller.target_position(), Some(Vec2::splat(20.0)));
    }

    #[test]
    fn test_resize_before_escape_is_noop() {
        let mut controller = Controller::new(9);
        assert!(controller.handle_signal(Signal::Resize, &layout()).is_empty());
    }

    #[test]
    fn test_reduced_motion_toggle() {
        let mut controller = escalated(1);
        assert!(controller.set_reduced_motion(false).is_empty());
        assert_eq!(
            controller.set_reduced_motion(true),
            vec![Directive::StopHearts, Directive::StopConfetti]
        );
        assert_eq!(controller.set_reduced_motion(false), vec![Directive::StartHearts]);

        let mut melted = escalated(8);
        melted.set_reduced_motion(true);
        assert!(melted.set_reduced_motion(false).is_empty());
    }

    #[test]
    fn test_photo_toggle_only_after_success() {
        let mut controller = escalated(0);
        assert!(controller.toggle_photo().is_empty());

        controller.handle_signal(Signal::Confirm, &layout());
        assert_eq!(
            controller.toggle_photo(),
            vec![Directive::ShowPhoto(true), Directive::HideClickHint]
        );
        assert_eq!(controller.toggle_photo(), vec![Directive::ShowPhoto(false)]);
    }

    #[test]
    fn test_same_seed_same_path() {
        let mut a = Controller::new(777);
        let mut b = Controller::new(777);
        for _ in 0..5 {
            assert_eq!(
                a.handle_input(InputEvent::PointerEnter, &layout()),
                b.handle_input(InputEvent::PointerEnter, &layout())
            );
        }
    }
}
