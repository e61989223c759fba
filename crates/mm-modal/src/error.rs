#![forbid(unsafe_code)]

//! Setup-time validation errors.
//!
//! Only two conditions are validated: the modal element must exist and a
//! trigger must be supplied. Everything else (missing popup/content
//! descendants, for instance) is deliberately unguarded and surfaces later
//! as a documented panic when first needed; see [`crate::Modal::open`].

/// Errors raised by [`crate::create`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The given id resolved to no element in the document.
    #[error("no element with id `{id}` exists in the document")]
    ModalNotFound { id: String },

    /// No trigger element was supplied in the options.
    #[error("a trigger element is required to create a morphing modal")]
    MissingTrigger,
}
