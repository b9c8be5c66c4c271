use std::sync::Arc;
use std::time::Duration;

use crate::decode::DecodedImage;

/// Tick-counted linear cross-fade between the outgoing and incoming slide.
///
/// Progress is driven by render ticks rather than wall-clock time, so a fade
/// always completes in exactly `ceil(fps * fade_seconds)` ticks regardless of
/// scheduling jitter, and alpha can never overshoot 1.0.
pub struct FadeController {
    total_ticks: u32,
    ticks_done: u32,
    foreground: Option<Arc<DecodedImage>>,
    background: Option<Arc<DecodedImage>>,
}

impl FadeController {
    pub fn new(fps: u32, fade: Duration) -> Self {
        let total_ticks = (fps as f64 * fade.as_secs_f64()).ceil() as u32;
        Self {
            total_ticks: total_ticks.max(1),
            ticks_done: 0,
            foreground: None,
            background: None,
        }
    }

    /// Install a new foreground and restart the fade from alpha 0.
    ///
    /// The outgoing foreground becomes the background. On the very first slide
    /// there is no outgoing image, so the background doubles the incoming one
    /// and the fade is invisible.
    pub fn begin(&mut self, next: Arc<DecodedImage>) {
        self.background = self.foreground.take().or_else(|| Some(Arc::clone(&next)));
        self.foreground = Some(next);
        self.ticks_done = 0;
    }

    /// Advance one render tick. Inert once the fade has completed.
    pub fn tick(&mut self) {
        if self.ticks_done < self.total_ticks {
            self.ticks_done += 1;
        }
    }

    pub fn alpha(&self) -> f32 {
        (self.ticks_done as f32 / self.total_ticks as f32).min(1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.ticks_done >= self.total_ticks
    }

    pub fn foreground(&self) -> Option<&Arc<DecodedImage>> {
        self.foreground.as_ref()
    }

    pub fn background(&self) -> Option<&Arc<DecodedImage>> {
        self.background.as_ref()
    }
}
