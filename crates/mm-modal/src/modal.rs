#![forbid(unsafe_code)]

//! The modal controller.
//!
//! Opening runs three phases, each started only after the slowest
//! animation of the previous one completes:
//!
//! 1. overlay fade-in + popup morph-in (concurrent); the popup measures
//!    its closed state through the temporary positioning stylesheet
//! 2. content fade-in (the positioning stylesheet is removed first)
//! 3. focus-trap activation + close-button click delegation
//!
//! Closing mirrors it: content fade-out, then overlay fade-out + popup
//! morph-out (the positioning stylesheet is recreated so the popup can
//! measure its way back onto the trigger), then final cleanup.
//!
//! # Invariants
//!
//! - `open()` while open and `close()` while closed are silent no-ops.
//! - Within one phase, animations are configured and started in the same
//!   synchronous tick, so their `first` measurements are consistent.
//! - At most one temporary positioning stylesheet exists per modal;
//!   installing a new one removes its predecessor.
//!
//! There is no guard against starting a close while an open sequence is
//! still mid-flight (or vice versa); the two chains then overlap on the
//! same elements and the visual result is undefined.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use mm_a11y::{FocusTrap, FocusTrapOptions};
use mm_dom::{Document, Element, EventKind, ListenerId, StyleSheetId};
use mm_flip::Flip;
use tracing::debug;

use crate::classes;
use crate::config::{MorphTiming, PhaseTiming};
use crate::error::Error;
use crate::sequence::{PhaseAnimation, after_flips};
use crate::stylesheet::position_popup_over_trigger;

/// Where the popup's background color comes from.
#[derive(Clone)]
pub enum BgColor {
    /// A fixed color value.
    Literal(String),
    /// A callback resolved at each open.
    Computed(Rc<dyn Fn() -> String>),
}

impl BgColor {
    fn resolve(&self) -> String {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Computed(callback) => callback(),
        }
    }
}

impl fmt::Debug for BgColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Computed(_) => f.debug_tuple("Computed").field(&"<callback>").finish(),
        }
    }
}

impl From<&str> for BgColor {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for BgColor {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

/// Options for [`create`].
///
/// The trigger is required; popup/content/title are normally discovered by
/// class under the modal element but can be overridden; `bg_color`
/// defaults to the trigger's computed background (empty string when the
/// trigger has none).
#[derive(Debug, Clone, Default)]
pub struct ModalOptions {
    trigger: Option<Element>,
    bg_color: Option<BgColor>,
    popup: Option<Element>,
    content: Option<Element>,
    title: Option<Element>,
    timing: Option<MorphTiming>,
}

impl ModalOptions {
    /// Empty options. A trigger must be set before [`create`] succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// The element the modal morphs from and back to.
    pub fn trigger(mut self, trigger: Element) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Background color for the popup (literal value or callback).
    pub fn bg_color(mut self, color: impl Into<BgColor>) -> Self {
        self.bg_color = Some(color.into());
        self
    }

    /// Background color resolved by a callback at each open.
    pub fn bg_color_with(mut self, callback: impl Fn() -> String + 'static) -> Self {
        self.bg_color = Some(BgColor::Computed(Rc::new(callback)));
        self
    }

    /// Override the popup element instead of discovering `.mm__popup`.
    pub fn popup(mut self, popup: Element) -> Self {
        self.popup = Some(popup);
        self
    }

    /// Override the content element instead of discovering `.mm__content`.
    pub fn content(mut self, content: Element) -> Self {
        self.content = Some(content);
        self
    }

    /// Override the title element instead of discovering `.mm__title`.
    pub fn title(mut self, title: Element) -> Self {
        self.title = Some(title);
        self
    }

    /// Phase timing; defaults to [`MorphTiming::default`].
    pub fn timing(mut self, timing: MorphTiming) -> Self {
        self.timing = Some(timing);
        self
    }
}

struct ModalInner {
    doc: Document,
    modal_id: String,
    overlay: Element,
    popup: Option<Element>,
    content: Option<Element>,
    title: Option<Element>,
    trigger: Element,
    bg_color: Option<BgColor>,
    timing: MorphTiming,
    is_open: bool,
    positioning_sheet: Option<StyleSheetId>,
    close_listener: Option<ListenerId>,
    focus_trap: Option<FocusTrap>,
}

/// A morphing modal. Cheap to clone; clones share the same modal state.
///
/// Created by [`create`]; never torn down. A page keeps its modal for its
/// whole lifetime and toggles it with [`Modal::open`] / [`Modal::close`].
#[derive(Clone)]
pub struct Modal {
    inner: Rc<RefCell<ModalInner>>,
}

impl fmt::Debug for Modal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Modal")
            .field("id", &inner.modal_id)
            .field("open", &inner.is_open)
            .finish_non_exhaustive()
    }
}

/// Set up a morphing modal over the element identified by `modal_id`.
///
/// Validates only that the modal element exists and a trigger was
/// supplied; both failures happen before any document mutation. The
/// `.mm__popup` / `.mm__content` / `.mm__title` descendants are resolved
/// here but deliberately not validated; see [`Modal::open`].
pub fn create(doc: &Document, modal_id: &str, options: ModalOptions) -> Result<Modal, Error> {
    let overlay = doc
        .element_by_id(modal_id)
        .ok_or_else(|| Error::ModalNotFound {
            id: modal_id.to_string(),
        })?;
    let trigger = options.trigger.ok_or(Error::MissingTrigger)?;

    let popup = options
        .popup
        .or_else(|| doc.descendant_with_class(overlay, classes::POPUP));
    let content = options
        .content
        .or_else(|| popup.and_then(|popup| doc.descendant_with_class(popup, classes::CONTENT)));
    let title = options
        .title
        .or_else(|| popup.and_then(|popup| doc.descendant_with_class(popup, classes::TITLE)));

    Ok(Modal {
        inner: Rc::new(RefCell::new(ModalInner {
            doc: doc.clone(),
            modal_id: modal_id.to_string(),
            overlay,
            popup,
            content,
            title,
            trigger,
            bg_color: options.bg_color,
            timing: options.timing.unwrap_or_default(),
            is_open: false,
            positioning_sheet: None,
            close_listener: None,
            focus_trap: None,
        })),
    })
}

fn flip_for(doc: &Document, element: Element, timing: PhaseTiming) -> Flip {
    Flip::new(doc, element)
        .easing(timing.easing)
        .delay(timing.delay)
        .duration(timing.duration)
}

fn required_part(part: Option<Element>, modal_id: &str, class: &str) -> Element {
    match part {
        Some(element) => element,
        None => panic!("modal `{modal_id}` is missing its required `.{class}` descendant"),
    }
}

impl Modal {
    /// Whether the modal is marked open.
    pub fn is_open(&self) -> bool {
        self.inner.borrow().is_open
    }

    /// The overlay element (the one identified by the modal id).
    pub fn overlay(&self) -> Element {
        self.inner.borrow().overlay
    }

    /// The trigger element the modal morphs from.
    pub fn trigger(&self) -> Element {
        self.inner.borrow().trigger
    }

    /// The popup element, when the document structure provides one.
    pub fn popup(&self) -> Option<Element> {
        self.inner.borrow().popup
    }

    /// The content element, when the document structure provides one.
    pub fn content(&self) -> Option<Element> {
        self.inner.borrow().content
    }

    /// The title element, when the document structure provides one.
    pub fn title(&self) -> Option<Element> {
        self.inner.borrow().title
    }

    fn downgrade(&self) -> Weak<RefCell<ModalInner>> {
        Rc::downgrade(&self.inner)
    }

    /// Install (or clear) the temporary positioning sheet, removing any
    /// predecessor so at most one exists per modal.
    fn set_positioning_sheet(&self, sheet: Option<StyleSheetId>) {
        let (doc, previous) = {
            let mut inner = self.inner.borrow_mut();
            let previous = inner.positioning_sheet.take();
            inner.positioning_sheet = sheet;
            (inner.doc.clone(), previous)
        };
        if let Some(previous) = previous {
            doc.remove_stylesheet(previous);
        }
    }

    /// Open the modal. Silent no-op while already open.
    ///
    /// # Panics
    ///
    /// Panics when the document structure lacks the required `.mm__popup`
    /// or `.mm__content` descendant (and no override was supplied);
    /// missing structure is deliberately not a setup-time error.
    pub fn open(&self) {
        let (doc, modal_id, overlay, popup, content, trigger, bg_color, timing) = {
            let mut inner = self.inner.borrow_mut();
            if inner.is_open {
                return;
            }
            inner.is_open = true;
            (
                inner.doc.clone(),
                inner.modal_id.clone(),
                inner.overlay,
                inner.popup,
                inner.content,
                inner.trigger,
                inner.bg_color.clone(),
                inner.timing,
            )
        };
        let popup = required_part(popup, &modal_id, classes::POPUP);
        let content = required_part(content, &modal_id, classes::CONTENT);
        debug!(modal = %modal_id, "opening");

        // Pin the popup over the trigger so the morph measures an accurate
        // closed state.
        let sheet = position_popup_over_trigger(&doc, &modal_id, trigger);
        self.set_positioning_sheet(Some(sheet));

        let background = match &bg_color {
            Some(source) => source.resolve(),
            None => doc.computed_background(trigger).unwrap_or_default(),
        };

        let mut overlay_fade = flip_for(&doc, overlay, timing.overlay_fade);
        let mut popup_morph = flip_for(&doc, popup, timing.popup_morph);
        overlay_fade.first();
        popup_morph.first();

        doc.add_class(overlay, classes::VISIBLE);
        doc.add_class(overlay, classes::OPENED);
        doc.add_class(popup, classes::POPUP_OPENED);
        if background.is_empty() {
            doc.remove_style(popup, "background-color");
        } else {
            doc.set_style(popup, "background-color", &background);
        }

        overlay_fade.last();
        popup_morph.last();
        overlay_fade.invert();
        popup_morph.invert();
        overlay_fade.play();
        popup_morph.play();

        let weak = self.downgrade();
        after_flips(
            &doc,
            &[
                PhaseAnimation::from(&overlay_fade),
                PhaseAnimation::from(&popup_morph),
            ],
            move |doc| {
                if let Some(inner) = weak.upgrade() {
                    Modal { inner }.open_content_phase(doc, content);
                }
            },
        );
    }

    /// Phase 2 of opening: the morph is done, fade the content in.
    fn open_content_phase(&self, doc: &Document, content: Element) {
        self.set_positioning_sheet(None);
        let timing = self.inner.borrow().timing.content_fade;
        debug!("content fade-in");

        let mut content_fade = flip_for(doc, content, timing);
        content_fade.first();
        doc.add_class(content, classes::CONTENT_OPENED);
        content_fade.last();
        content_fade.invert();
        content_fade.play();

        let weak = self.downgrade();
        after_flips(
            doc,
            &[PhaseAnimation::from(&content_fade)],
            move |doc| {
                if let Some(inner) = weak.upgrade() {
                    Modal { inner }.open_settled_phase(doc, content);
                }
            },
        );
    }

    /// Phase 3 of opening: the modal is fully visible; contain focus and
    /// wire up the close buttons.
    fn open_settled_phase(&self, doc: &Document, content: Element) {
        let trap = {
            let mut inner = self.inner.borrow_mut();
            let weak = Rc::downgrade(&self.inner);
            inner
                .focus_trap
                .get_or_insert_with(|| {
                    FocusTrap::new(
                        doc,
                        content,
                        FocusTrapOptions::new()
                            .click_outside_deactivates(true)
                            .on_deactivate(move |_| {
                                if let Some(inner) = weak.upgrade() {
                                    Modal { inner }.close();
                                }
                            }),
                    )
                })
                .clone()
        };
        trap.activate();

        let weak = self.downgrade();
        let listener = doc.listen(content, EventKind::Click, move |doc, ev| {
            if doc
                .closest_with_class(ev.target, classes::CLOSE, content)
                .is_some()
                && let Some(inner) = weak.upgrade()
            {
                Modal { inner }.close();
            }
        });
        self.inner.borrow_mut().close_listener = Some(listener);
        debug!("open complete");
    }

    /// Close the modal. Silent no-op while already closed, including when
    /// the modal was never opened, in which case nothing is mutated and no
    /// listener is touched.
    ///
    /// # Panics
    ///
    /// Same structural requirements as [`Modal::open`].
    pub fn close(&self) {
        let (doc, modal_id, overlay, popup, content, trigger, timing, close_listener, trap) = {
            let mut inner = self.inner.borrow_mut();
            if !inner.is_open {
                return;
            }
            inner.is_open = false;
            (
                inner.doc.clone(),
                inner.modal_id.clone(),
                inner.overlay,
                inner.popup,
                inner.content,
                inner.trigger,
                inner.timing,
                inner.close_listener.take(),
                inner.focus_trap.clone(),
            )
        };
        let popup = required_part(popup, &modal_id, classes::POPUP);
        let content = required_part(content, &modal_id, classes::CONTENT);
        debug!(modal = %modal_id, "closing");

        if let Some(listener) = close_listener {
            doc.unlisten(listener);
        }
        // Deactivating fires the trap's on_deactivate, which calls close()
        // again; the open flag is already cleared so that re-entry no-ops.
        if let Some(trap) = trap {
            trap.deactivate();
        }

        let mut content_fade = flip_for(&doc, content, timing.content_fade);
        content_fade.first();
        doc.remove_class(content, classes::CONTENT_OPENED);
        content_fade.last();
        content_fade.invert();
        content_fade.play();

        let weak = self.downgrade();
        after_flips(
            &doc,
            &[PhaseAnimation::from(&content_fade)],
            move |doc| {
                if let Some(inner) = weak.upgrade() {
                    Modal { inner }.close_morph_phase(doc, modal_id, overlay, popup, trigger, timing);
                }
            },
        );
    }

    /// Phase 2 of closing: morph the popup back onto the trigger while the
    /// overlay fades out.
    fn close_morph_phase(
        &self,
        doc: &Document,
        modal_id: String,
        overlay: Element,
        popup: Element,
        trigger: Element,
        timing: MorphTiming,
    ) {
        // Recreate the pin so removing the opened class lands the popup
        // back on the trigger's rectangle.
        let sheet = position_popup_over_trigger(doc, &modal_id, trigger);
        self.set_positioning_sheet(Some(sheet));
        debug!("morph out");

        let mut overlay_fade = flip_for(doc, overlay, timing.overlay_fade);
        let mut popup_morph = flip_for(doc, popup, timing.popup_morph);
        overlay_fade.first();
        popup_morph.first();

        doc.remove_class(overlay, classes::OPENED);
        doc.remove_class(popup, classes::POPUP_OPENED);

        overlay_fade.last();
        popup_morph.last();
        overlay_fade.invert();
        popup_morph.invert();
        overlay_fade.play();
        popup_morph.play();

        let weak = self.downgrade();
        after_flips(
            doc,
            &[
                PhaseAnimation::from(&overlay_fade),
                PhaseAnimation::from(&popup_morph),
            ],
            move |doc| {
                if let Some(inner) = weak.upgrade() {
                    Modal { inner }.close_settled_phase(doc, overlay);
                }
            },
        );
    }

    /// Phase 3 of closing: drop the pin and hide the overlay.
    fn close_settled_phase(&self, doc: &Document, overlay: Element) {
        self.set_positioning_sheet(None);
        doc.remove_class(overlay, classes::VISIBLE);
        debug!("close complete");
    }
}
