#![forbid(unsafe_code)]

//! Temporary positioning stylesheet.
//!
//! Before each popup morph, a single head rule pins `.mm__popup` (scoped
//! under the modal's id) to the trigger's bounding rectangle. Measuring
//! through a head rule instead of writing inline `!important` overrides
//! keeps the element's own styles untouched while still giving the FLIP
//! step an accurate closed-state geometry. The caller removes the sheet
//! once the morph completes.

use mm_dom::{Document, Element, PxRect, StyleSheetId};

use crate::classes;

/// Render the positioning rule for a popup scoped under `modal_id`.
///
/// The rule text is stable and exact: whole-pixel values print without a
/// fractional part.
pub fn popup_position_rule(modal_id: &str, rect: PxRect) -> String {
    format!(
        "#{} .{} {{ top: {}px; left: {}px; height: {}px; width: {}px; }}",
        modal_id,
        classes::POPUP,
        rect.top,
        rect.left,
        rect.height,
        rect.width
    )
}

/// Inject a head rule pinning the modal's popup over the trigger's current
/// bounding rectangle. Returns the sheet handle for later removal.
pub fn position_popup_over_trigger(
    doc: &Document,
    modal_id: &str,
    trigger: Element,
) -> StyleSheetId {
    let rect = doc.bounding_rect(trigger);
    doc.inject_stylesheet(popup_position_rule(modal_id, rect))
}
