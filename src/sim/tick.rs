//! Frame tick source
//!
//! The confetti loop only ever asks "call me again next frame". On the web
//! that is `requestAnimationFrame`; in tests and the native demo it is a
//! manual stepper that hands out evenly spaced timestamps.

use crate::consts::FRAME_MS;

/// Something that can schedule one more simulation frame
pub trait TickSource {
    /// Request a single callback on the next display refresh
    fn request_frame(&mut self);
    /// Drop any pending request. Calling with nothing pending is a no-op.
    fn cancel_frame(&mut self);
}

/// Whether a frame-driven system wants more frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Running,
    Finished,
}

/// Deterministic tick source driven by hand
#[derive(Debug, Clone)]
pub struct ManualStepper {
    pending: bool,
    frame: u64,
    frame_ms: f64,
    /// Total frames requested over the stepper's life
    pub requested: u64,
}

impl Default for ManualStepper {
    fn default() -> Self {
        Self::new(FRAME_MS)
    }
}

impl ManualStepper {
    pub fn new(frame_ms: f64) -> Self {
        Self {
            pending: false,
            frame: 0,
            frame_ms,
            requested: 0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Timestamp (ms) of the current frame
    pub fn now(&self) -> f64 {
        self.frame as f64 * self.frame_ms
    }

    /// Consume the pending request and advance one frame.
    ///
    /// Returns the new frame's timestamp, or `None` when nothing was requested.
    pub fn advance(&mut self) -> Option<f64> {
        if !self.pending {
            return None;
        }
        self.pending = false;
        self.frame += 1;
        Some(self.now())
    }
}

impl TickSource for ManualStepper {
    fn request_frame(&mut self) {
        if !self.pending {
            self.requested += 1;
        }
        self.pending = true;
    }

    fn cancel_frame(&mut self) {
        self.pending = false;
    }
}

/// Run a frame-driven system until it stops asking for frames or `max_frames` pass.
///
/// Returns the number of frames stepped.
pub fn run_until_idle<F>(stepper: &mut ManualStepper, max_frames: u64, mut step: F) -> u64
where
    F: FnMut(f64, &mut ManualStepper) -> FrameStatus,
{
    let mut frames = 0;
    while frames < max_frames {
        let Some(now) = stepper.advance() else { break };
        frames += 1;
        if step(now, stepper) == FrameStatus::Finished {
            break;
        }
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stepper_only_advances_when_requested() {
        let mut stepper = ManualStepper::new(10.0);
        assert_eq!(stepper.advance(), None);

        stepper.request_frame();
        stepper.request_frame(); // coalesces
        assert_eq!(stepper.requested, 1);
        assert_eq!(stepper.advance(), Some(10.0));
        assert_eq!(stepper.advance(), None);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut stepper = ManualStepper::default();
        stepper.cancel_frame();
        stepper.request_frame();
        stepper.cancel_frame();
        stepper.cancel_frame();
        assert!(!stepper.is_pending());
        assert_eq!(stepper.advance(), None);
    }

    #[test]
    fn test_run_until_idle_stops_on_finish() {
        let mut stepper = ManualStepper::new(1.0);
        stepper.request_frame();
        let frames = run_until_idle(&mut stepper, 100, |now, source| {
            if now < 5.0 {
                source.request_frame();
                FrameStatus::Running
            } else {
                FrameStatus::Finished
            }
        });
        assert_eq!(frames, 5);
    }
}
