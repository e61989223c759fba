#![forbid(unsafe_code)]

//! Event kinds and handles for the document host.
//!
//! Events bubble: dispatching an event on an element invokes listeners on
//! the element itself, then on each ancestor up to and including the
//! document root. Listeners always receive the *originating* element as
//! `DomEvent::target`, so a listener attached to an ancestor can tell its
//! own completions apart from a child's.

use crate::document::Element;

/// The event names the host understands, as a typed enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Pointer activation on an element.
    Click,
    /// A key was pressed; the key is carried in [`DomEvent::key`].
    KeyDown,
    /// An element received focus.
    FocusIn,
    /// A scheduled transition on an element ran to completion.
    TransitionEnd,
}

/// Keys the host distinguishes.
///
/// Only the keys the modal choreography reacts to get their own variant;
/// everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Tab,
    Enter,
    Other,
}

/// An event as delivered to listeners.
#[derive(Debug, Clone, Copy)]
pub struct DomEvent {
    pub kind: EventKind,
    /// The element the event originated on (not the listener's element).
    pub target: Element,
    /// Key payload for [`EventKind::KeyDown`]; `None` otherwise.
    pub key: Option<Key>,
}

/// Handle returned by `Document::listen`, used to remove the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Handle for an injected head stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleSheetId(pub(crate) u64);

/// Handle for a scheduled transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionId(pub(crate) u64);
