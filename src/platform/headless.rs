//! Headless page
//!
//! Applies directives to an in-memory model of the page instead of the DOM.
//! Drives the native build and end-to-end tests; frames come from a
//! [`ManualStepper`] and timers fire only when asked to.

use glam::Vec2;

use crate::settings::Settings;
use crate::sim::tick::run_until_idle;
use crate::sim::{
    ConfettiAnimator, Controller, Directive, HeartLoop, InputEvent, Layout, ManualStepper, Rect,
};

/// What a visitor would currently see
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageView {
    pub image: String,
    pub caption: String,
    pub shaking: bool,
    pub announcement: Option<&'static str>,
    /// Sign, caption and No button have fallen
    pub fallen: bool,
    /// Yes button detached below the photo
    pub collapsed: bool,
    pub success_shown: bool,
    pub click_hint: bool,
    pub hearts_on_screen: usize,
}

/// In-memory page driven by the controller
pub struct HeadlessPage {
    pub controller: Controller,
    pub settings: Settings,
    pub layout: Layout,
    pub view: PageView,
    pub confetti: ConfettiAnimator,
    pub frames: ManualStepper,
    pub hearts: HeartLoop<u32>,
    collapse_timer: Option<u32>,
    next_timer: u32,
}

impl HeadlessPage {
    /// A page with the Yes/No buttons side by side in the middle of `viewport`
    pub fn new(settings: Settings, viewport: Vec2) -> Self {
        let seed = settings.seed.unwrap_or(0);
        let button = Vec2::new(110.0, 48.0);
        let row_y = viewport.y * 0.7;
        let center_x = viewport.x / 2.0;
        Self {
            controller: Controller::new(seed),
            layout: Layout {
                viewport,
                target: Rect::from_origin_size(Vec2::new(center_x + 20.0, row_y), button),
                obstacle: Rect::from_origin_size(
                    Vec2::new(center_x - 20.0 - button.x, row_y),
                    button,
                ),
                target_focused: false,
            },
            view: PageView::default(),
            confetti: ConfettiAnimator::new(viewport),
            frames: ManualStepper::default(),
            hearts: HeartLoop::new(),
            collapse_timer: None,
            next_timer: 1,
            settings,
        }
    }

    pub fn start(&mut self, reduced_motion: bool) {
        let directives = self.controller.start(reduced_motion);
        self.apply(directives);
    }

    /// Forward a page event
    pub fn send(&mut self, event: InputEvent) {
        if event == InputEvent::Focus {
            self.layout.target_focused = true;
        }
        let directives = self.controller.handle_input(event, &self.layout);
        self.apply(directives);
    }

    pub fn resize(&mut self, viewport: Vec2) {
        self.layout.viewport = viewport;
        self.confetti.set_viewport(viewport);
        self.send(InputEvent::ViewportResize);
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        let directives = self.controller.set_reduced_motion(reduced);
        self.apply(directives);
    }

    pub fn click_duck(&mut self) {
        let directives = self.controller.toggle_photo();
        self.apply(directives);
    }

    fn timer(&mut self) -> u32 {
        let id = self.next_timer;
        self.next_timer += 1;
        id
    }

    /// Fire the pending heart timer, if any. Returns whether a heart spawned.
    pub fn fire_heart_timer(&mut self) -> bool {
        let Some((heart, delay)) = self.hearts.spawn(self.controller.rng_mut()) else {
            return false;
        };
        log::trace!("Heart {} at {:.0}vw, next in {}ms", heart.glyph, heart.left_vw, delay);
        self.view.hearts_on_screen += 1;
        let id = self.timer();
        self.hearts.arm(id);
        true
    }

    /// Fire the pending meltdown collapse, if any
    pub fn fire_collapse_timer(&mut self) -> bool {
        if self.collapse_timer.take().is_none() {
            return false;
        }
        self.view.collapsed = true;
        true
    }

    /// Run confetti frames until it retires (or `max_frames` pass)
    pub fn run_frames(&mut self, max_frames: u64) -> u64 {
        let confetti = &mut self.confetti;
        run_until_idle(&mut self.frames, max_frames, |now, source| {
            confetti.tick(now, source)
        })
    }

    pub fn apply(&mut self, directives: Vec<Directive>) {
        for directive in directives {
            log::debug!("apply {:?}", directive);
            match directive {
                Directive::SetMood { level, caption } => {
                    self.view.image = self.settings.images.for_level(level).to_owned();
                    self.view.caption = caption.to_owned();
                }
                Directive::Emphasize => self.view.shaking = true,
                Directive::ClearEmphasis => self.view.shaking = false,
                Directive::MoveTarget(pos) => self.layout.target.origin = pos,
                Directive::Announce(message) => self.view.announcement = Some(message),
                Directive::Meltdown => {
                    self.view.image = self.settings.images.photo.clone();
                    self.view.fallen = true;
                    self.view.hearts_on_screen = 0;
                }
                Directive::ScheduleCollapse { .. } => {
                    let id = self.timer();
                    self.collapse_timer = Some(id);
                }
                Directive::RestoreScene => {
                    self.collapse_timer = None;
                    self.view.collapsed = false;
                    self.view.fallen = false;
                }
                Directive::StartHearts => {
                    if self.hearts.start(self.controller.reduced_motion()) {
                        self.fire_heart_timer();
                    }
                }
                Directive::StopHearts => {
                    self.hearts.stop();
                }
                Directive::LaunchConfetti => {
                    let now = self.frames.now();
                    self.confetti.launch(
                        self.controller.rng_mut(),
                        self.settings.confetti_count,
                        &self.settings.palette,
                        now,
                        &mut self.frames,
                    );
                }
                Directive::StopConfetti => self.confetti.stop(&mut self.frames),
                Directive::ShowSuccess => {
                    self.view.success_shown = true;
                    self.view.click_hint = true;
                }
                Directive::ShowPhoto(photo) => {
                    self.view.image = if photo {
                        self.settings.images.photo.clone()
                    } else {
                        self.settings.images.for_level(0).to_owned()
                    };
                }
                Directive::HideClickHint => self.view.click_hint = false,
            }
        }
    }
}
