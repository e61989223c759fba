#![forbid(unsafe_code)]

//! Deterministic document host for morphmodal.
//!
//! This crate stands in for the browser collaborators the modal
//! choreography runs against (DOM, CSSOM, layout, and the animation
//! pipeline) as one small, single-threaded, host-driven world:
//!
//! - an element tree with classes, inline styles, and id lookup
//! - page class rules and injected head stylesheets resolved through a
//!   CSS-like cascade (inline → `!important` page rules → injected head
//!   rules → normal page rules → element defaults)
//! - bubbling events with typed kinds ([`EventKind`])
//! - focus state
//! - a virtual-time transition timeline the host advances explicitly
//!
//! Nothing here spins threads or reads wall-clock time behind the host's
//! back: tests call [`Document::advance`] / [`Document::run_until_idle`],
//! a live driver calls [`Document::tick`].

pub mod document;
pub mod event;
pub mod geometry;
pub(crate) mod style;
pub mod timeline;

pub use document::{Document, Element};
pub use event::{DomEvent, EventKind, Key, ListenerId, StyleSheetId, TransitionId};
pub use geometry::{PxRect, format_px, parse_px};
pub use timeline::TransitionSpec;
