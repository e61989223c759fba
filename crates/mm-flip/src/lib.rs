#![forbid(unsafe_code)]

//! FLIP animation primitive for morphmodal.
//!
//! Two pieces: the quintic [`Easing`] curves and the [`Flip`] adapter that
//! drives a `first → last → invert → play` transition over an
//! [`mm_dom::Document`].

pub mod easing;
pub mod flip;

pub use easing::{Easing, ease_in_out_quint, ease_in_quint};
pub use flip::{Flip, Snapshot};
