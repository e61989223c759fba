#![forbid(unsafe_code)]

//! The FLIP animation adapter.
//!
//! FLIP (first–last–invert–play) turns a layout jump into a smooth
//! transition: snapshot the element before the change (`first`), let the
//! caller apply the real class/style change, snapshot after it (`last`),
//! visually invert the element back to where it started (`invert`), then
//! release the inversion under a transition (`play`). Completion surfaces
//! as a bubbling [`EventKind::TransitionEnd`](mm_dom::EventKind) whose
//! target is the animated element.
//!
//! Snapshots cover geometry *and* opacity, so the same adapter drives both
//! morphs (popup) and fades (overlay, content).
//!
//! # Failure Modes
//!
//! - `invert`/`play` before both snapshots: logged no-op.
//! - `last` snapshot with zero width or height: the scale factor for that
//!   axis falls back to 1.0 (logged).

use std::time::Duration;

use mm_dom::{Document, Element, PxRect, TransitionId, TransitionSpec};
use tracing::warn;

use crate::easing::Easing;

const DEFAULT_DURATION: Duration = Duration::from_millis(300);

/// What a FLIP snapshot records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub rect: PxRect,
    pub opacity: f64,
}

/// One FLIP animation over one element.
///
/// The protocol is strictly `first → (caller mutates) → last → invert →
/// play`; the adapter is single-use and discarded afterwards.
#[derive(Debug, Clone)]
pub struct Flip {
    doc: Document,
    element: Element,
    easing: Easing,
    delay: Duration,
    duration: Duration,
    first: Option<Snapshot>,
    last: Option<Snapshot>,
}

impl Flip {
    /// Create an adapter for `element` with default timing.
    pub fn new(doc: &Document, element: Element) -> Self {
        Self {
            doc: doc.clone(),
            element,
            easing: Easing::default(),
            delay: Duration::ZERO,
            duration: DEFAULT_DURATION,
            first: None,
            last: None,
        }
    }

    /// Set the easing curve.
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Set the delay before playback starts.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the playback duration.
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// The animated element.
    #[inline]
    pub fn element(&self) -> Element {
        self.element
    }

    /// The configured delay.
    #[inline]
    pub fn configured_delay(&self) -> Duration {
        self.delay
    }

    /// The configured duration.
    #[inline]
    pub fn configured_duration(&self) -> Duration {
        self.duration
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            rect: self.doc.bounding_rect(self.element),
            opacity: self.doc.computed_opacity(self.element),
        }
    }

    /// Record the element's state before the caller mutates the document.
    pub fn first(&mut self) {
        self.first = Some(self.snapshot());
    }

    /// Record the element's state after the mutation.
    pub fn last(&mut self) {
        self.last = Some(self.snapshot());
    }

    /// The recorded pre-mutation snapshot.
    pub fn first_snapshot(&self) -> Option<Snapshot> {
        self.first
    }

    /// The recorded post-mutation snapshot.
    pub fn last_snapshot(&self) -> Option<Snapshot> {
        self.last
    }

    fn snapshots(&self, operation: &str) -> Option<(Snapshot, Snapshot)> {
        match (self.first, self.last) {
            (Some(first), Some(last)) => Some((first, last)),
            _ => {
                warn!(operation, "flip used before both snapshots were recorded");
                None
            }
        }
    }

    /// Apply the inverse transform so the element still appears in its
    /// `first` state despite the mutated layout.
    pub fn invert(&mut self) {
        let Some((first, last)) = self.snapshots("invert") else {
            return;
        };

        let dx = first.rect.left - last.rect.left;
        let dy = first.rect.top - last.rect.top;
        let sx = scale_factor(first.rect.width, last.rect.width);
        let sy = scale_factor(first.rect.height, last.rect.height);

        self.doc.set_style(self.element, "transform-origin", "0 0");
        self.doc.set_style(
            self.element,
            "transform",
            &format!("translate({dx}px, {dy}px) scale({sx}, {sy})"),
        );
        self.doc
            .set_style(self.element, "opacity", &first.opacity.to_string());
    }

    /// Release the inversion under a transition and schedule completion.
    ///
    /// The inline properties written by `invert`/`play` are removed when
    /// the transition completes, handing the element back to the page's
    /// own styles.
    pub fn play(&mut self) -> Option<TransitionId> {
        let Some((_, last)) = self.snapshots("play") else {
            return None;
        };

        self.doc.set_style(
            self.element,
            "transition",
            &format!(
                "all {}ms {} {}ms",
                self.duration.as_millis(),
                self.easing.css(),
                self.delay.as_millis()
            ),
        );
        self.doc.set_style(self.element, "transform", "none");
        self.doc
            .set_style(self.element, "opacity", &last.opacity.to_string());

        let spec = TransitionSpec::new(self.delay, self.duration)
            .easing(self.easing.as_fn())
            .clear_style("transform")
            .clear_style("transform-origin")
            .clear_style("transition")
            .clear_style("opacity");
        Some(self.doc.begin_transition(self.element, spec))
    }
}

fn scale_factor(first: f64, last: f64) -> f64 {
    if last == 0.0 {
        warn!("degenerate zero-size last snapshot, scale pinned to 1");
        1.0
    } else {
        first / last
    }
}
