#![forbid(unsafe_code)]

//! Page style rules, injected stylesheets, and the property cascade.
//!
//! The host resolves each property through a fixed cascade, highest
//! priority first:
//!
//! 1. inline style on the element
//! 2. `!important` page class rules (last defined wins)
//! 3. injected head stylesheets (newest wins; see below)
//! 4. normal page class rules (last defined wins)
//! 5. element defaults (layout rectangle, opacity 1.0)
//!
//! Injected stylesheets participate in layout only when their text matches
//! the single rule shape the host understands:
//!
//! ```text
//! #ID .CLASS { top: Tpx; left: Lpx; height: Hpx; width: Wpx; }
//! ```
//!
//! The selector matches an element carrying `CLASS` that has an ancestor
//! with id `ID`. Any other sheet text is stored verbatim and has no layout
//! effect. This mirrors how the real cascade lets an id-scoped pin sit
//! between a page's `!important` opened-state rules and its base rules.

use ahash::AHashMap;

use crate::event::StyleSheetId;
use crate::geometry::{PxRect, parse_px};

/// A page class rule: declarations applied to every element carrying
/// `class`, at either the normal or the `!important` tier.
#[derive(Debug, Clone)]
pub(crate) struct ClassRule {
    pub(crate) class: String,
    pub(crate) declarations: AHashMap<String, String>,
    pub(crate) important: bool,
}

/// An injected head stylesheet: raw text plus the parsed positioning rule,
/// when the text matches the supported shape.
#[derive(Debug, Clone)]
pub(crate) struct Sheet {
    pub(crate) id: StyleSheetId,
    pub(crate) text: String,
    pub(crate) rule: Option<PositionRule>,
}

/// A parsed `#ID .CLASS { top/left/height/width }` rule.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PositionRule {
    pub(crate) scope_id: String,
    pub(crate) class: String,
    pub(crate) rect: PxRect,
}

impl PositionRule {
    /// The pinned value for a box property, if this rule covers it.
    pub(crate) fn property(&self, name: &str) -> Option<f64> {
        match name {
            "top" => Some(self.rect.top),
            "left" => Some(self.rect.left),
            "width" => Some(self.rect.width),
            "height" => Some(self.rect.height),
            _ => None,
        }
    }
}

/// Parse stylesheet text into a [`PositionRule`].
///
/// Strict by design: all four box properties must be present as `px`
/// lengths and the selector must be exactly `#id .class`. Returns `None`
/// otherwise, in which case the sheet is inert for layout.
pub(crate) fn parse_position_rule(text: &str) -> Option<PositionRule> {
    let text = text.trim();
    let rest = text.strip_prefix('#')?;
    let (scope_id, rest) = rest.split_once(char::is_whitespace)?;
    let rest = rest.trim_start();
    let rest = rest.strip_prefix('.')?;
    let brace = rest.find('{')?;
    let class = rest[..brace].trim();
    if scope_id.is_empty() || class.is_empty() {
        return None;
    }
    let body = rest[brace + 1..].trim_end();
    let body = body.strip_suffix('}')?;

    let mut top = None;
    let mut left = None;
    let mut width = None;
    let mut height = None;
    for declaration in body.split(';') {
        let declaration = declaration.trim();
        if declaration.is_empty() {
            continue;
        }
        let (name, value) = declaration.split_once(':')?;
        let value = parse_px(value)?;
        match name.trim() {
            "top" => top = Some(value),
            "left" => left = Some(value),
            "width" => width = Some(value),
            "height" => height = Some(value),
            _ => return None,
        }
    }

    Some(PositionRule {
        scope_id: scope_id.to_string(),
        class: class.to_string(),
        rect: PxRect::new(top?, left?, width?, height?),
    })
}
