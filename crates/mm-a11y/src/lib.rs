#![forbid(unsafe_code)]

//! Focus containment for modal surfaces.
//!
//! While a [`FocusTrap`] is active, keyboard focus cycles within its
//! container: focus landing outside is pulled back to the container's
//! first focusable element. The trap deactivates on Escape, on a click
//! outside the container (when configured), or explicitly via
//! [`FocusTrap::deactivate`]; deactivation restores the element that was
//! focused before activation and then invokes the `on_deactivate`
//! callback.
//!
//! # Invariants
//!
//! - `on_deactivate` fires exactly once per deactivation; the open/closed
//!   flag doubles as the re-entrancy guard, so a callback that calls
//!   `deactivate` again is a no-op.
//! - All document listeners installed by `activate` are removed before
//!   focus is restored, so the restoration itself is not re-contained.
//!
//! # Failure Modes
//!
//! - A container with no focusable descendants leaves focus where it was
//!   (logged); containment still applies to later focus changes.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use mm_dom::{Document, Element, EventKind, Key, ListenerId};
use tracing::{debug, warn};

type DeactivateFn = Rc<dyn Fn(&Document)>;

/// Configuration for a [`FocusTrap`].
#[derive(Clone)]
pub struct FocusTrapOptions {
    click_outside_deactivates: bool,
    on_deactivate: Option<DeactivateFn>,
}

impl Default for FocusTrapOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusTrapOptions {
    /// Options with outside-click deactivation enabled and no callback.
    pub fn new() -> Self {
        Self {
            click_outside_deactivates: true,
            on_deactivate: None,
        }
    }

    /// Whether a click outside the container deactivates the trap.
    pub fn click_outside_deactivates(mut self, deactivates: bool) -> Self {
        self.click_outside_deactivates = deactivates;
        self
    }

    /// Callback invoked after each deactivation.
    pub fn on_deactivate(mut self, callback: impl Fn(&Document) + 'static) -> Self {
        self.on_deactivate = Some(Rc::new(callback));
        self
    }
}

struct TrapInner {
    doc: Document,
    container: Element,
    options: FocusTrapOptions,
    active: bool,
    previously_focused: Option<Element>,
    listeners: Vec<ListenerId>,
}

/// A focus trap over one container element.
///
/// Cheap to clone; clones share the same trap state.
#[derive(Clone)]
pub struct FocusTrap {
    inner: Rc<RefCell<TrapInner>>,
}

impl FocusTrap {
    /// Create an inactive trap over `container`.
    pub fn new(doc: &Document, container: Element, options: FocusTrapOptions) -> Self {
        Self {
            inner: Rc::new(RefCell::new(TrapInner {
                doc: doc.clone(),
                container,
                options,
                active: false,
                previously_focused: None,
                listeners: Vec::new(),
            })),
        }
    }

    /// Whether the trap is currently containing focus.
    pub fn is_active(&self) -> bool {
        self.inner.borrow().active
    }

    /// The container focus is contained within.
    pub fn container(&self) -> Element {
        self.inner.borrow().container
    }

    /// Start containing focus. No-op when already active.
    ///
    /// Records the currently focused element, installs document-level
    /// listeners (focus containment, Escape, outside click), then moves
    /// focus to the container's first focusable descendant.
    pub fn activate(&self) {
        let (doc, container, click_outside) = {
            let mut inner = self.inner.borrow_mut();
            if inner.active {
                return;
            }
            inner.active = true;
            inner.previously_focused = inner.doc.focused_element();
            (
                inner.doc.clone(),
                inner.container,
                inner.options.click_outside_deactivates,
            )
        };
        debug!(container = ?container, "focus trap activated");

        let mut listeners = Vec::new();

        let weak = Rc::downgrade(&self.inner);
        listeners.push(doc.listen_document(EventKind::FocusIn, move |doc, ev| {
            let Some(trap) = Weak::upgrade(&weak) else {
                return;
            };
            let container = {
                let inner = trap.borrow();
                if !inner.active {
                    return;
                }
                inner.container
            };
            if doc.is_within(ev.target, container) {
                return;
            }
            if let Some(first) = doc.first_focusable_within(container) {
                doc.focus(first);
            }
        }));

        let weak = Rc::downgrade(&self.inner);
        listeners.push(doc.listen_document(EventKind::KeyDown, move |_, ev| {
            if ev.key != Some(Key::Escape) {
                return;
            }
            if let Some(inner) = Weak::upgrade(&weak) {
                FocusTrap { inner }.deactivate();
            }
        }));

        if click_outside {
            let weak = Rc::downgrade(&self.inner);
            listeners.push(doc.listen_document(EventKind::Click, move |doc, ev| {
                let Some(inner) = Weak::upgrade(&weak) else {
                    return;
                };
                let container = {
                    let borrowed = inner.borrow();
                    if !borrowed.active {
                        return;
                    }
                    borrowed.container
                };
                if !doc.is_within(ev.target, container) {
                    FocusTrap { inner }.deactivate();
                }
            }));
        }

        self.inner.borrow_mut().listeners = listeners;

        match doc.first_focusable_within(container) {
            Some(first) => doc.focus(first),
            None => warn!("focus trap container has no focusable descendants"),
        }
    }

    /// Stop containing focus. No-op when already inactive.
    ///
    /// Removes the trap's listeners, restores the previously focused
    /// element, then invokes `on_deactivate`.
    pub fn deactivate(&self) {
        let (doc, listeners, previous, callback) = {
            let mut inner = self.inner.borrow_mut();
            if !inner.active {
                return;
            }
            inner.active = false;
            (
                inner.doc.clone(),
                std::mem::take(&mut inner.listeners),
                inner.previously_focused.take(),
                inner.options.on_deactivate.clone(),
            )
        };
        debug!("focus trap deactivated");

        for id in listeners {
            doc.unlisten(id);
        }
        if let Some(previous) = previous {
            doc.focus(previous);
        }
        if let Some(callback) = callback {
            callback(&doc);
        }
    }
}
