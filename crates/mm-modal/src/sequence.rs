#![forbid(unsafe_code)]

//! Phase sequencing over concurrent FLIP animations.
//!
//! A phase plays several animations in the same synchronous tick, each
//! with a delay and duration known up front. Rather than joining on all of
//! them, [`after_flips`] computes which one finishes last and waits for
//! that single completion. That substitution is only sound because the
//! timing is known synchronously and completion fires in step with the
//! transition's own clock.
//!
//! Completions bubble, so an ancestor's listener also sees its children's
//! completions; the listener filters on target identity and fires the
//! continuation exactly once.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use mm_dom::{Document, Element, EventKind, ListenerId};
use mm_flip::Flip;
use tracing::trace;

/// What a phase needs to know about one of its animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseAnimation {
    pub element: Element,
    pub delay: Duration,
    pub duration: Duration,
}

impl PhaseAnimation {
    /// Describe an animation on `element`.
    pub const fn new(element: Element, delay: Duration, duration: Duration) -> Self {
        Self {
            element,
            delay,
            duration,
        }
    }

    /// When the animation finishes, relative to the phase start.
    #[inline]
    pub fn end_time(&self) -> Duration {
        self.delay + self.duration
    }
}

impl From<&Flip> for PhaseAnimation {
    fn from(flip: &Flip) -> Self {
        Self {
            element: flip.element(),
            delay: flip.configured_delay(),
            duration: flip.configured_duration(),
        }
    }
}

/// Invoke `continuation` once every animation in the phase has finished.
///
/// Selects the animation with the latest end time (`delay + duration`; on
/// ties the later-listed one wins), listens for its `TransitionEnd`,
/// ignores completions bubbling up from other elements, then removes the
/// listener and runs the continuation exactly once.
///
/// An empty `animations` slice runs the continuation synchronously.
pub fn after_flips(
    doc: &Document,
    animations: &[PhaseAnimation],
    continuation: impl FnOnce(&Document) + 'static,
) {
    let Some(slowest) = animations.iter().max_by_key(|anim| anim.end_time()) else {
        continuation(doc);
        return;
    };
    let tracked = slowest.element;
    trace!(
        element = ?tracked,
        end_ms = slowest.end_time().as_millis() as u64,
        "phase waits on slowest animation"
    );

    let pending: Rc<RefCell<Option<_>>> = Rc::new(RefCell::new(Some(continuation)));
    let listener_slot: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));

    let slot = Rc::clone(&listener_slot);
    let id = doc.listen(tracked, EventKind::TransitionEnd, move |doc, ev| {
        // Completions from descendants bubble through here; only the
        // tracked element's own completion ends the phase.
        if ev.target != tracked {
            return;
        }
        if let Some(id) = slot.take() {
            doc.unlisten(id);
        }
        if let Some(continuation) = pending.borrow_mut().take() {
            continuation(doc);
        }
    });
    listener_slot.set(Some(id));
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    /// Nested pair: the fast element is a child of the slow one, so the
    /// fast completion bubbles through the slow element's listener.
    fn nested_fixture() -> (Document, Element, Element) {
        let doc = Document::new();
        let slow = doc.create_element("div");
        let fast = doc.create_element("div");
        doc.append_child(doc.body(), slow);
        doc.append_child(slow, fast);
        (doc, slow, fast)
    }

    #[test]
    fn waits_for_the_latest_end_time() {
        let (doc, slow, fast) = nested_fixture();
        let fired = Rc::new(Cell::new(0));

        let count = Rc::clone(&fired);
        after_flips(
            &doc,
            &[
                PhaseAnimation::new(fast, ms(0), ms(100)),
                PhaseAnimation::new(slow, ms(50), ms(400)),
            ],
            move |_| count.set(count.get() + 1),
        );

        // The fast child finishes first; its completion bubbles through
        // the slow element but must not end the phase.
        doc.dispatch(EventKind::TransitionEnd, fast);
        assert_eq!(fired.get(), 0);

        doc.dispatch(EventKind::TransitionEnd, slow);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn fires_exactly_once() {
        let (doc, slow, _fast) = nested_fixture();
        let fired = Rc::new(Cell::new(0));

        let count = Rc::clone(&fired);
        after_flips(
            &doc,
            &[PhaseAnimation::new(slow, ms(0), ms(100))],
            move |_| count.set(count.get() + 1),
        );

        doc.dispatch(EventKind::TransitionEnd, slow);
        doc.dispatch(EventKind::TransitionEnd, slow);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn listener_is_removed_after_firing() {
        let (doc, slow, _fast) = nested_fixture();
        let baseline = doc.active_listener_count();

        after_flips(&doc, &[PhaseAnimation::new(slow, ms(0), ms(100))], |_| {});
        assert_eq!(doc.active_listener_count(), baseline + 1);

        doc.dispatch(EventKind::TransitionEnd, slow);
        assert_eq!(doc.active_listener_count(), baseline);
    }

    #[test]
    fn tie_break_prefers_the_later_listed_animation() {
        let (doc, slow, fast) = nested_fixture();
        let fired = Rc::new(Cell::new(0));

        let count = Rc::clone(&fired);
        after_flips(
            &doc,
            &[
                // Same end time both ways.
                PhaseAnimation::new(fast, ms(100), ms(100)),
                PhaseAnimation::new(slow, ms(0), ms(200)),
            ],
            move |_| count.set(count.get() + 1),
        );

        doc.dispatch(EventKind::TransitionEnd, fast);
        assert_eq!(fired.get(), 0);
        doc.dispatch(EventKind::TransitionEnd, slow);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn empty_phase_runs_synchronously() {
        let doc = Document::new();
        let fired = Rc::new(Cell::new(0));
        let count = Rc::clone(&fired);
        after_flips(&doc, &[], move |_| count.set(count.get() + 1));
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn works_with_real_timeline_completions() {
        let (doc, slow, fast) = nested_fixture();
        let fired = Rc::new(Cell::new(0));

        doc.begin_transition(fast, mm_dom::TransitionSpec::new(ms(0), ms(100)));
        doc.begin_transition(slow, mm_dom::TransitionSpec::new(ms(50), ms(400)));

        let count = Rc::clone(&fired);
        after_flips(
            &doc,
            &[
                PhaseAnimation::new(fast, ms(0), ms(100)),
                PhaseAnimation::new(slow, ms(50), ms(400)),
            ],
            move |_| count.set(count.get() + 1),
        );

        doc.advance(ms(100));
        assert_eq!(fired.get(), 0);
        doc.advance(ms(350));
        assert_eq!(fired.get(), 1);
    }

    proptest::proptest! {
        /// The tracked animation is always one with the maximum end time.
        #[test]
        fn tracked_element_has_max_end_time(
            timings in proptest::collection::vec((0u64..1000, 0u64..1000), 1..8)
        ) {
            let doc = Document::new();
            let animations: Vec<PhaseAnimation> = timings
                .iter()
                .map(|(delay, duration)| {
                    let el = doc.create_element("div");
                    doc.append_child(doc.body(), el);
                    PhaseAnimation::new(el, ms(*delay), ms(*duration))
                })
                .collect();
            let max_end = animations.iter().map(PhaseAnimation::end_time).max();

            let fired = Rc::new(Cell::new(None));
            let slot = Rc::clone(&fired);
            after_flips(&doc, &animations, move |_| slot.set(Some(())));

            // Complete every animation strictly before the maximum end
            // time; the continuation must not fire for any of them.
            for anim in &animations {
                if Some(anim.end_time()) != max_end {
                    doc.dispatch(EventKind::TransitionEnd, anim.element);
                    proptest::prop_assert_eq!(fired.get(), None);
                }
            }
            for anim in &animations {
                if Some(anim.end_time()) == max_end {
                    doc.dispatch(EventKind::TransitionEnd, anim.element);
                }
            }
            proptest::prop_assert_eq!(fired.get(), Some(()));
        }
    }
}
