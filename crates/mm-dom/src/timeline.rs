#![forbid(unsafe_code)]

//! Host-driven transition timeline.
//!
//! The timeline owns virtual time. Nothing moves on its own: the host (a
//! test, or a driver loop calling `Document::tick`) advances the clock, and
//! transitions whose end time has been reached complete in end-time order.
//! Completion removes the transition's listed inline styles and dispatches
//! a bubbling [`EventKind::TransitionEnd`](crate::EventKind::TransitionEnd)
//! on the element.
//!
//! # Invariants
//!
//! - Completions are delivered in end-time order; ties complete in
//!   scheduling order.
//! - A transition scheduled from inside a completion callback joins the
//!   queue immediately and can itself complete within the same `advance`
//!   window.
//! - Virtual time never moves backwards.

use std::time::Duration;

use crate::document::Element;
use crate::event::TransitionId;

fn linear(t: f64) -> f64 {
    t
}

/// Configuration for one scheduled transition.
#[derive(Debug, Clone)]
pub struct TransitionSpec {
    /// Time to wait after scheduling before playback begins.
    pub delay: Duration,
    /// Playback length. Zero-duration transitions complete on the next
    /// `advance`, including `advance(Duration::ZERO)`.
    pub duration: Duration,
    /// Easing applied by [`Document::transition_progress`] when sampling.
    pub easing: fn(f64) -> f64,
    /// Inline style properties removed from the element when the
    /// transition completes.
    pub clear_styles: Vec<&'static str>,
}

impl TransitionSpec {
    /// A linear transition with nothing to clear on completion.
    pub fn new(delay: Duration, duration: Duration) -> Self {
        Self {
            delay,
            duration,
            easing: linear,
            clear_styles: Vec::new(),
        }
    }

    /// Set the easing used when sampling progress.
    pub fn easing(mut self, easing: fn(f64) -> f64) -> Self {
        self.easing = easing;
        self
    }

    /// Add an inline style property to remove on completion.
    pub fn clear_style(mut self, property: &'static str) -> Self {
        self.clear_styles.push(property);
        self
    }

    /// Offset from scheduling time to completion.
    #[inline]
    pub fn end_offset(&self) -> Duration {
        self.delay + self.duration
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Transition {
    pub(crate) id: TransitionId,
    pub(crate) element: Element,
    pub(crate) start: Duration,
    pub(crate) spec: TransitionSpec,
}

impl Transition {
    #[inline]
    pub(crate) fn end(&self) -> Duration {
        self.start + self.spec.end_offset()
    }
}

#[derive(Debug, Default)]
pub(crate) struct Timeline {
    now: Duration,
    pending: Vec<Transition>,
    next_id: u64,
}

impl Timeline {
    #[inline]
    pub(crate) fn now(&self) -> Duration {
        self.now
    }

    pub(crate) fn set_now(&mut self, now: Duration) {
        debug_assert!(now >= self.now, "virtual time must not move backwards");
        self.now = now;
    }

    #[inline]
    pub(crate) fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn begin(&mut self, element: Element, spec: TransitionSpec) -> TransitionId {
        let id = TransitionId(self.next_id);
        self.next_id += 1;
        self.pending.push(Transition {
            id,
            element,
            start: self.now,
            spec,
        });
        id
    }

    /// Earliest pending end time, if any transition is queued.
    pub(crate) fn next_end(&self) -> Option<Duration> {
        self.pending.iter().map(Transition::end).min()
    }

    /// Remove and return the next transition due at or before `target`.
    ///
    /// Ties resolve to the earliest-scheduled transition, keeping
    /// completion order deterministic.
    pub(crate) fn pop_due(&mut self, target: Duration) -> Option<Transition> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.end() <= target)
            .min_by_key(|(_, t)| (t.end(), t.id.0))
            .map(|(i, _)| i)?;
        Some(self.pending.remove(index))
    }

    /// Eased progress of the most recently scheduled transition still
    /// pending on `element`.
    pub(crate) fn progress_of(&self, element: Element) -> Option<f64> {
        let transition = self
            .pending
            .iter()
            .filter(|t| t.element == element)
            .max_by_key(|t| t.id.0)?;
        let elapsed = self.now.checked_sub(transition.start + transition.spec.delay);
        let raw = match elapsed {
            None => 0.0,
            // A zero-duration transition is complete once its delay passes.
            Some(_) if transition.spec.duration.is_zero() => 1.0,
            Some(run) => (run.as_secs_f64() / transition.spec.duration.as_secs_f64()).min(1.0),
        };
        Some((transition.spec.easing)(raw))
    }
}
