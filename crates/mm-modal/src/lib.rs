#![forbid(unsafe_code)]

//! Morphing-modal controller.
//!
//! A modal dialog that animates open from its trigger element's position
//! (and closes back onto it) using the FLIP technique, containing keyboard
//! focus while open.
//!
//! ```no_run
//! use mm_dom::Document;
//! use mm_modal::{ModalOptions, create};
//!
//! # fn run() -> Result<(), mm_modal::Error> {
//! let doc = Document::new();
//! # let trigger = doc.create_element("button");
//! let modal = create(&doc, "checkout-modal", ModalOptions::new().trigger(trigger))?;
//! modal.open();
//! doc.run_until_idle(16);
//! # Ok(())
//! # }
//! ```
//!
//! The required document structure under the element identified by the
//! modal id: a [`classes::POPUP`] descendant containing a
//! [`classes::CONTENT`] element (and optionally a [`classes::TITLE`]).
//! Close buttons anywhere inside the content carry [`classes::CLOSE`].

pub mod classes;
pub mod config;
pub mod error;
pub mod modal;
pub mod sequence;
pub mod stylesheet;

pub use config::{MorphTiming, PhaseTiming};
pub use error::Error;
pub use modal::{BgColor, Modal, ModalOptions, create};
pub use sequence::{PhaseAnimation, after_flips};
pub use stylesheet::{popup_position_rule, position_popup_over_trigger};
