#![forbid(unsafe_code)]

//! Per-phase timing configuration.

use std::time::Duration;

use mm_flip::Easing;

/// Delay, duration, and easing for one animation phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseTiming {
    pub delay: Duration,
    pub duration: Duration,
    pub easing: Easing,
}

impl PhaseTiming {
    /// Create a phase timing.
    pub const fn new(delay: Duration, duration: Duration, easing: Easing) -> Self {
        Self {
            delay,
            duration,
            easing,
        }
    }

    /// Set the delay.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the duration.
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the easing curve.
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// Timing for the three morph phases, used symmetrically for opening and
/// closing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorphTiming {
    /// Overlay fade (runs concurrently with the popup morph).
    pub overlay_fade: PhaseTiming,
    /// Popup morph between the trigger rectangle and its opened position.
    pub popup_morph: PhaseTiming,
    /// Content fade (runs alone, after/before the morph).
    pub content_fade: PhaseTiming,
}

impl Default for MorphTiming {
    fn default() -> Self {
        Self {
            overlay_fade: PhaseTiming::new(
                Duration::ZERO,
                Duration::from_millis(300),
                Easing::InOutQuint,
            ),
            popup_morph: PhaseTiming::new(
                Duration::ZERO,
                Duration::from_millis(500),
                Easing::InOutQuint,
            ),
            content_fade: PhaseTiming::new(
                Duration::ZERO,
                Duration::from_millis(250),
                Easing::InQuint,
            ),
        }
    }
}

impl MorphTiming {
    /// The default timing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the overlay fade timing.
    pub fn overlay_fade(mut self, timing: PhaseTiming) -> Self {
        self.overlay_fade = timing;
        self
    }

    /// Set the popup morph timing.
    pub fn popup_morph(mut self, timing: PhaseTiming) -> Self {
        self.popup_morph = timing;
        self
    }

    /// Set the content fade timing.
    pub fn content_fade(mut self, timing: PhaseTiming) -> Self {
        self.content_fade = timing;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_replace_phases() {
        let timing = MorphTiming::new().popup_morph(PhaseTiming::new(
            Duration::from_millis(50),
            Duration::from_millis(400),
            Easing::InQuint,
        ));
        assert_eq!(timing.popup_morph.delay, Duration::from_millis(50));
        assert_eq!(timing.popup_morph.duration, Duration::from_millis(400));
        assert_eq!(timing.popup_morph.easing, Easing::InQuint);
        // Other phases keep their defaults.
        assert_eq!(timing.overlay_fade, MorphTiming::default().overlay_fade);
    }
}
