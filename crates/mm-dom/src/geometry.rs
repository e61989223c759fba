#![forbid(unsafe_code)]

//! Pixel-space geometry for the document host.

/// An element's bounding rectangle in CSS pixels.
///
/// Field order follows the CSS box properties the host resolves
/// (`top`, `left`, `width`, `height`). Values are `f64` because computed
/// styles are fractional in real layouts, even though most fixtures use
/// whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PxRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl PxRect {
    /// Create a rectangle from its four box properties.
    pub const fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Whether the rectangle has no area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Parse a `px` length (`"12px"`, `"10.5px"`) into its numeric value.
///
/// Returns `None` for any other unit or malformed input.
pub fn parse_px(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix("px")?;
    number.trim().parse::<f64>().ok()
}

/// Format a length as a `px` value.
///
/// Integral values print without a fractional part (`10px`, not `10.0px`),
/// matching how computed styles serialize whole pixels.
pub fn format_px(value: f64) -> String {
    format!("{value}px")
}
