#![forbid(unsafe_code)]

//! The CSS class contract consumed and produced by the controller.
//!
//! Structure classes (`mm__*`) identify the pieces of a modal in the
//! document; state modifiers (`*--opened`, `mm--visible`) are added and
//! removed by [`Modal::open`](crate::Modal::open) /
//! [`Modal::close`](crate::Modal::close) and are what the page's own
//! stylesheet keys its opened-state rules off.

/// Overlay is displayed (kept for the whole open/close cycle).
pub const VISIBLE: &str = "mm--visible";
/// Overlay is in its opened (faded-in) state.
pub const OPENED: &str = "mm--opened";

/// The popup element: the box that morphs between trigger and dialog.
pub const POPUP: &str = "mm__popup";
/// Popup is in its opened position.
pub const POPUP_OPENED: &str = "mm__popup--opened";

/// The content element inside the popup.
pub const CONTENT: &str = "mm__content";
/// Content is faded in.
pub const CONTENT_OPENED: &str = "mm__content--opened";

/// Optional title element inside the popup.
pub const TITLE: &str = "mm__title";

/// Close buttons inside the content.
pub const CLOSE: &str = "mm__close";
