#![forbid(unsafe_code)]

//! The deterministic document: element tree, cascade resolution, event
//! dispatch, focus state, and the clock that drives transitions.
//!
//! A [`Document`] is a cheaply clonable handle over shared single-threaded
//! state (`Rc<RefCell<_>>`). Listener callbacks receive the document by
//! reference, so closures registered as listeners do not need to capture a
//! document handle of their own, which keeps listener storage free of
//! reference cycles.
//!
//! # Invariants
//!
//! - Dispatch bubbles from the target through its ancestors to the
//!   document root; `DomEvent::target` is always the originating element.
//! - Listeners added or removed *during* dispatch take effect immediately:
//!   a listener removed mid-dispatch is not invoked later in the same
//!   batch, and one added mid-dispatch waits for the next event.
//! - Virtual time only moves forward, and only when the host calls
//!   [`Document::advance`] / [`Document::run_until_idle`] /
//!   [`Document::tick`].
//!
//! # Failure Modes
//!
//! - [`Element`] handles are only meaningful for the document that created
//!   them; using one against another document indexes the wrong node or
//!   panics.
//! - A re-entrant `advance` (from inside a completion callback) is ignored
//!   with a warning rather than deadlocking on the shared state.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use ahash::{AHashMap, AHashSet};
use tracing::{trace, warn};

use crate::event::{DomEvent, EventKind, Key, ListenerId, StyleSheetId, TransitionId};
use crate::geometry::{PxRect, format_px, parse_px};
use crate::style::{ClassRule, PositionRule, Sheet, parse_position_rule};
use crate::timeline::{Timeline, TransitionSpec};

/// Handle to an element in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Element(u32);

impl Element {
    pub(crate) fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

type ListenerFn = Rc<dyn Fn(&Document, &DomEvent)>;

struct ListenerRec {
    id: ListenerId,
    element: Element,
    kind: EventKind,
    callback: ListenerFn,
}

struct NodeData {
    tag: String,
    id: Option<String>,
    classes: AHashSet<String>,
    inline: AHashMap<String, String>,
    parent: Option<Element>,
    children: Vec<Element>,
    focusable: bool,
    layout: PxRect,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            id: None,
            classes: AHashSet::new(),
            inline: AHashMap::new(),
            parent: None,
            children: Vec::new(),
            focusable: false,
            layout: PxRect::default(),
        }
    }
}

struct DocInner {
    nodes: Vec<NodeData>,
    by_id: AHashMap<String, Element>,
    class_rules: Vec<ClassRule>,
    sheets: Vec<Sheet>,
    listeners: Vec<ListenerRec>,
    focused: Option<Element>,
    timeline: Timeline,
    next_listener_id: u64,
    next_sheet_id: u64,
    clock_origin: Option<web_time::Instant>,
    advancing: bool,
}

const ROOT: Element = Element(0);
const BODY: Element = Element(1);

impl DocInner {
    fn node(&self, el: Element) -> &NodeData {
        &self.nodes[el.index()]
    }

    fn node_mut(&mut self, el: Element) -> &mut NodeData {
        &mut self.nodes[el.index()]
    }

    fn class_rule_value(&self, el: Element, property: &str, important: bool) -> Option<String> {
        let node = self.node(el);
        self.class_rules
            .iter()
            .rev()
            .filter(|rule| rule.important == important && node.classes.contains(&rule.class))
            .find_map(|rule| rule.declarations.get(property).cloned())
    }

    fn sheet_matches(&self, el: Element, rule: &PositionRule) -> bool {
        if !self.node(el).classes.contains(&rule.class) {
            return false;
        }
        let mut cursor = self.node(el).parent;
        while let Some(ancestor) = cursor {
            if self.node(ancestor).id.as_deref() == Some(rule.scope_id.as_str()) {
                return true;
            }
            cursor = self.node(ancestor).parent;
        }
        false
    }

    /// Cascade resolution for a single property. See the `style` module
    /// docs for tier order.
    fn computed_style(&self, el: Element, property: &str) -> Option<String> {
        if let Some(value) = self.node(el).inline.get(property) {
            return Some(value.clone());
        }
        if let Some(value) = self.class_rule_value(el, property, true) {
            return Some(value);
        }
        for sheet in self.sheets.iter().rev() {
            if let Some(rule) = &sheet.rule
                && self.sheet_matches(el, rule)
                && let Some(value) = rule.property(property)
            {
                return Some(format_px(value));
            }
        }
        self.class_rule_value(el, property, false)
    }

    fn resolved_box_property(&self, el: Element, property: &str, layout: f64) -> f64 {
        self.computed_style(el, property)
            .and_then(|value| parse_px(&value))
            .unwrap_or(layout)
    }
}

/// The document host. Clones share the same underlying state.
#[derive(Clone)]
pub struct Document {
    inner: Rc<RefCell<DocInner>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document").finish_non_exhaustive()
    }
}

impl Document {
    /// Create an empty document containing a root node and a `body`.
    pub fn new() -> Self {
        let mut nodes = Vec::new();
        nodes.push(NodeData::new("#document"));
        let mut body = NodeData::new("body");
        body.parent = Some(ROOT);
        nodes.push(body);
        nodes[ROOT.index()].children.push(BODY);

        Self {
            inner: Rc::new(RefCell::new(DocInner {
                nodes,
                by_id: AHashMap::new(),
                class_rules: Vec::new(),
                sheets: Vec::new(),
                listeners: Vec::new(),
                focused: None,
                timeline: Timeline::default(),
                next_listener_id: 0,
                next_sheet_id: 0,
                clock_origin: None,
                advancing: false,
            })),
        }
    }

    // --- Tree ---

    /// The `body` element every fixture hangs off of.
    pub fn body(&self) -> Element {
        BODY
    }

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> Element {
        let mut inner = self.inner.borrow_mut();
        let element = Element(inner.nodes.len() as u32);
        inner.nodes.push(NodeData::new(tag));
        element
    }

    /// Append `child` to `parent`, detaching it from any previous parent.
    pub fn append_child(&self, parent: Element, child: Element) {
        debug_assert_ne!(parent, child, "an element cannot parent itself");
        let mut inner = self.inner.borrow_mut();
        if let Some(old) = inner.node(child).parent {
            inner.node_mut(old).children.retain(|c| *c != child);
        }
        inner.node_mut(child).parent = Some(parent);
        inner.node_mut(parent).children.push(child);
    }

    /// The element's parent, if attached.
    pub fn parent(&self, el: Element) -> Option<Element> {
        self.inner.borrow().node(el).parent
    }

    /// The element's tag name.
    pub fn tag_name(&self, el: Element) -> String {
        self.inner.borrow().node(el).tag.clone()
    }

    /// Assign an element id. The newest assignment wins lookups.
    pub fn set_id(&self, el: Element, id: &str) {
        let mut inner = self.inner.borrow_mut();
        if let Some(old) = inner.node(el).id.clone() {
            inner.by_id.remove(&old);
        }
        inner.node_mut(el).id = Some(id.to_string());
        inner.by_id.insert(id.to_string(), el);
    }

    /// Look an element up by id.
    pub fn element_by_id(&self, id: &str) -> Option<Element> {
        self.inner.borrow().by_id.get(id).copied()
    }

    /// First descendant of `root` (depth-first, document order) carrying
    /// `class`. `root` itself is not considered.
    pub fn descendant_with_class(&self, root: Element, class: &str) -> Option<Element> {
        let inner = self.inner.borrow();
        let mut stack: Vec<Element> = inner.node(root).children.iter().rev().copied().collect();
        while let Some(el) = stack.pop() {
            if inner.node(el).classes.contains(class) {
                return Some(el);
            }
            stack.extend(inner.node(el).children.iter().rev().copied());
        }
        None
    }

    /// Whether `el` is `container` itself or one of its descendants.
    pub fn is_within(&self, el: Element, container: Element) -> bool {
        let inner = self.inner.borrow();
        let mut cursor = Some(el);
        while let Some(current) = cursor {
            if current == container {
                return true;
            }
            cursor = inner.node(current).parent;
        }
        false
    }

    /// Walk from `el` toward `within` (inclusive), returning the first
    /// element carrying `class`. Returns `None` when `el` is not inside
    /// `within` or nothing on the path matches.
    pub fn closest_with_class(
        &self,
        el: Element,
        class: &str,
        within: Element,
    ) -> Option<Element> {
        if !self.is_within(el, within) {
            return None;
        }
        let inner = self.inner.borrow();
        let mut cursor = el;
        loop {
            if inner.node(cursor).classes.contains(class) {
                return Some(cursor);
            }
            if cursor == within {
                return None;
            }
            cursor = inner.node(cursor).parent?;
        }
    }

    // --- Classes ---

    /// Add a class (set semantics; re-adding is a no-op).
    pub fn add_class(&self, el: Element, class: &str) {
        self.inner
            .borrow_mut()
            .node_mut(el)
            .classes
            .insert(class.to_string());
    }

    /// Remove a class if present.
    pub fn remove_class(&self, el: Element, class: &str) {
        self.inner.borrow_mut().node_mut(el).classes.remove(class);
    }

    /// Whether the element carries `class`.
    pub fn has_class(&self, el: Element, class: &str) -> bool {
        self.inner.borrow().node(el).classes.contains(class)
    }

    // --- Styles ---

    /// Set an inline style property.
    pub fn set_style(&self, el: Element, property: &str, value: &str) {
        self.inner
            .borrow_mut()
            .node_mut(el)
            .inline
            .insert(property.to_string(), value.to_string());
    }

    /// Remove an inline style property.
    pub fn remove_style(&self, el: Element, property: &str) {
        self.inner.borrow_mut().node_mut(el).inline.remove(property);
    }

    /// Read an inline style property (not the computed value).
    pub fn inline_style(&self, el: Element, property: &str) -> Option<String> {
        self.inner.borrow().node(el).inline.get(property).cloned()
    }

    /// Define a page class rule at the normal tier. Within a tier, later
    /// definitions win.
    pub fn define_class_style(&self, class: &str, declarations: &[(&str, &str)]) {
        self.push_class_rule(class, declarations, false);
    }

    /// Define a page class rule at the `!important` tier.
    pub fn define_class_style_important(&self, class: &str, declarations: &[(&str, &str)]) {
        self.push_class_rule(class, declarations, true);
    }

    fn push_class_rule(&self, class: &str, declarations: &[(&str, &str)], important: bool) {
        let declarations = declarations
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.inner.borrow_mut().class_rules.push(ClassRule {
            class: class.to_string(),
            declarations,
            important,
        });
    }

    /// Resolve a property through the cascade.
    pub fn computed_style(&self, el: Element, property: &str) -> Option<String> {
        self.inner.borrow().computed_style(el, property)
    }

    /// Computed opacity; defaults to fully opaque.
    pub fn computed_opacity(&self, el: Element) -> f64 {
        self.computed_style(el, "opacity")
            .and_then(|value| value.trim().parse::<f64>().ok())
            .unwrap_or(1.0)
    }

    /// Computed background color, when any tier defines one.
    pub fn computed_background(&self, el: Element) -> Option<String> {
        self.computed_style(el, "background-color")
    }

    // --- Geometry ---

    /// Set the element's layout rectangle: the geometry the page's own
    /// layout would produce when no style tier overrides it.
    pub fn set_bounding_rect(&self, el: Element, rect: PxRect) {
        self.inner.borrow_mut().node_mut(el).layout = rect;
    }

    /// The element's bounding rectangle, resolved per property through the
    /// cascade with the layout rectangle as the default.
    pub fn bounding_rect(&self, el: Element) -> PxRect {
        let inner = self.inner.borrow();
        let layout = inner.node(el).layout;
        PxRect {
            top: inner.resolved_box_property(el, "top", layout.top),
            left: inner.resolved_box_property(el, "left", layout.left),
            width: inner.resolved_box_property(el, "width", layout.width),
            height: inner.resolved_box_property(el, "height", layout.height),
        }
    }

    // --- Injected stylesheets ---

    /// Append a stylesheet to the document head. Returns a handle for
    /// removal. Text matching the supported positioning-rule shape
    /// participates in layout; anything else is stored verbatim.
    pub fn inject_stylesheet(&self, css: impl Into<String>) -> StyleSheetId {
        let text = css.into();
        let rule = parse_position_rule(&text);
        let mut inner = self.inner.borrow_mut();
        let id = StyleSheetId(inner.next_sheet_id);
        inner.next_sheet_id += 1;
        trace!(sheet = id.0, layout_rule = rule.is_some(), "stylesheet injected");
        inner.sheets.push(Sheet { id, text, rule });
        id
    }

    /// Remove an injected stylesheet. Returns whether it existed.
    pub fn remove_stylesheet(&self, id: StyleSheetId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.sheets.len();
        inner.sheets.retain(|sheet| sheet.id != id);
        let removed = inner.sheets.len() != before;
        if removed {
            trace!(sheet = id.0, "stylesheet removed");
        }
        removed
    }

    /// Number of injected stylesheets currently in the head.
    pub fn stylesheet_count(&self) -> usize {
        self.inner.borrow().sheets.len()
    }

    /// Raw texts of every injected stylesheet, in head order.
    pub fn stylesheet_texts(&self) -> Vec<String> {
        self.inner
            .borrow()
            .sheets
            .iter()
            .map(|sheet| sheet.text.clone())
            .collect()
    }

    /// Raw text of an injected stylesheet.
    pub fn stylesheet_text(&self, id: StyleSheetId) -> Option<String> {
        self.inner
            .borrow()
            .sheets
            .iter()
            .find(|sheet| sheet.id == id)
            .map(|sheet| sheet.text.clone())
    }

    // --- Listeners and dispatch ---

    /// Listen for `kind` events reaching `el` (targeted or bubbled).
    pub fn listen(
        &self,
        el: Element,
        kind: EventKind,
        callback: impl Fn(&Document, &DomEvent) + 'static,
    ) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_listener_id);
        inner.next_listener_id += 1;
        inner.listeners.push(ListenerRec {
            id,
            element: el,
            kind,
            callback: Rc::new(callback),
        });
        id
    }

    /// Listen at the document level (events of any target bubble here).
    pub fn listen_document(
        &self,
        kind: EventKind,
        callback: impl Fn(&Document, &DomEvent) + 'static,
    ) -> ListenerId {
        self.listen(ROOT, kind, callback)
    }

    /// Remove a listener. Returns whether it existed.
    pub fn unlisten(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|rec| rec.id != id);
        inner.listeners.len() != before
    }

    /// Number of registered listeners (test introspection).
    pub fn active_listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Dispatch an event on `target`, bubbling to the document root.
    pub fn dispatch(&self, kind: EventKind, target: Element) {
        self.dispatch_event(DomEvent {
            kind,
            target,
            key: None,
        });
    }

    /// Dispatch a click on `el`.
    pub fn click(&self, el: Element) {
        self.dispatch(EventKind::Click, el);
    }

    /// Dispatch a key press, targeted at the focused element (or the body
    /// when nothing is focused).
    pub fn dispatch_key_down(&self, key: Key) {
        let target = self.focused_element().unwrap_or(BODY);
        self.dispatch_event(DomEvent {
            kind: EventKind::KeyDown,
            target,
            key: Some(key),
        });
    }

    fn dispatch_event(&self, event: DomEvent) {
        // Snapshot the matching listeners in bubble order, then invoke
        // outside the borrow. Each listener is re-checked for liveness so
        // removals during dispatch (one-shot listeners) take effect within
        // the same batch.
        let batch: Vec<(ListenerId, ListenerFn)> = {
            let inner = self.inner.borrow();
            let mut chain = vec![event.target];
            let mut cursor = event.target;
            while let Some(parent) = inner.node(cursor).parent {
                chain.push(parent);
                cursor = parent;
            }
            chain
                .iter()
                .flat_map(|node| {
                    inner
                        .listeners
                        .iter()
                        .filter(|rec| rec.element == *node && rec.kind == event.kind)
                        .map(|rec| (rec.id, Rc::clone(&rec.callback)))
                        .collect::<Vec<_>>()
                })
                .collect()
        };
        for (id, callback) in batch {
            let alive = self.inner.borrow().listeners.iter().any(|rec| rec.id == id);
            if alive {
                callback(self, &event);
            }
        }
    }

    // --- Focus ---

    /// Mark an element as focusable.
    pub fn set_focusable(&self, el: Element, focusable: bool) {
        self.inner.borrow_mut().node_mut(el).focusable = focusable;
    }

    /// Whether the element is focusable.
    pub fn is_focusable(&self, el: Element) -> bool {
        self.inner.borrow().node(el).focusable
    }

    /// Move focus to `el` and dispatch a bubbling `FocusIn`.
    pub fn focus(&self, el: Element) {
        self.inner.borrow_mut().focused = Some(el);
        self.dispatch(EventKind::FocusIn, el);
    }

    /// The currently focused element.
    pub fn focused_element(&self) -> Option<Element> {
        self.inner.borrow().focused
    }

    /// First focusable descendant of `container` in document order.
    /// `container` itself is not considered.
    pub fn first_focusable_within(&self, container: Element) -> Option<Element> {
        let inner = self.inner.borrow();
        let mut stack: Vec<Element> = inner
            .node(container)
            .children
            .iter()
            .rev()
            .copied()
            .collect();
        while let Some(el) = stack.pop() {
            if inner.node(el).focusable {
                return Some(el);
            }
            stack.extend(inner.node(el).children.iter().rev().copied());
        }
        None
    }

    // --- Timeline ---

    /// Schedule a transition on `el` starting at the current virtual time.
    pub fn begin_transition(&self, el: Element, spec: TransitionSpec) -> TransitionId {
        let mut inner = self.inner.borrow_mut();
        trace!(
            element = el.0,
            delay_ms = spec.delay.as_millis() as u64,
            duration_ms = spec.duration.as_millis() as u64,
            "transition scheduled"
        );
        inner.timeline.begin(el, spec)
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.inner.borrow().timeline.now()
    }

    /// Number of transitions not yet completed (test introspection).
    pub fn pending_transition_count(&self) -> usize {
        self.inner.borrow().timeline.pending_count()
    }

    /// Eased progress of the newest pending transition on `el`.
    pub fn transition_progress(&self, el: Element) -> Option<f64> {
        self.inner.borrow().timeline.progress_of(el)
    }

    /// Advance virtual time by `dt`, completing every transition whose end
    /// time falls inside the window, including transitions scheduled by
    /// completion callbacks along the way.
    pub fn advance(&self, dt: Duration) {
        let target = {
            let mut inner = self.inner.borrow_mut();
            if inner.advancing {
                warn!("re-entrant advance ignored");
                return;
            }
            inner.advancing = true;
            inner.timeline.now() + dt
        };

        loop {
            let due = {
                let mut inner = self.inner.borrow_mut();
                match inner.timeline.pop_due(target) {
                    Some(transition) => {
                        let end = transition.end();
                        inner.timeline.set_now(end);
                        for property in &transition.spec.clear_styles {
                            inner.nodes[transition.element.index()].inline.remove(*property);
                        }
                        Some(transition)
                    }
                    None => None,
                }
            };
            let Some(transition) = due else { break };
            trace!(element = transition.element.0, "transition complete");
            self.dispatch(EventKind::TransitionEnd, transition.element);
        }

        let mut inner = self.inner.borrow_mut();
        inner.timeline.set_now(target);
        inner.advancing = false;
    }

    /// Repeatedly advance to the next completion until nothing is pending
    /// or `max_steps` is exhausted. Returns the number of steps taken.
    pub fn run_until_idle(&self, max_steps: usize) -> usize {
        let mut steps = 0;
        while steps < max_steps {
            let next_end = self.inner.borrow().timeline.next_end();
            let Some(end) = next_end else {
                return steps;
            };
            let now = self.now();
            self.advance(end.saturating_sub(now));
            steps += 1;
        }
        if self.pending_transition_count() > 0 {
            warn!(max_steps, "run_until_idle hit the step limit with work pending");
        }
        steps
    }

    /// Advance virtual time to match wall-clock time elapsed since the
    /// first `tick`. Suits a real driver loop; tests prefer `advance`.
    pub fn tick(&self) {
        let elapsed = {
            let mut inner = self.inner.borrow_mut();
            let origin = inner
                .clock_origin
                .get_or_insert_with(web_time::Instant::now);
            origin.elapsed()
        };
        let now = self.now();
        if elapsed > now {
            self.advance(elapsed - now);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;

    fn fixture() -> (Document, Element, Element, Element) {
        let doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        let leaf = doc.create_element("span");
        doc.append_child(doc.body(), outer);
        doc.append_child(outer, inner);
        doc.append_child(inner, leaf);
        (doc, outer, inner, leaf)
    }

    #[test]
    fn id_lookup_round_trips() {
        let doc = Document::new();
        let el = doc.create_element("div");
        doc.append_child(doc.body(), el);
        doc.set_id(el, "greeter");
        assert_eq!(doc.element_by_id("greeter"), Some(el));
        assert_eq!(doc.element_by_id("missing"), None);
        assert_eq!(doc.tag_name(el), "div");
        assert_eq!(doc.parent(el), Some(doc.body()));
    }

    #[test]
    fn class_set_semantics() {
        let doc = Document::new();
        let el = doc.create_element("div");
        doc.add_class(el, "a");
        doc.add_class(el, "a");
        assert!(doc.has_class(el, "a"));
        doc.remove_class(el, "a");
        assert!(!doc.has_class(el, "a"));
    }

    #[test]
    fn descendant_with_class_is_document_order() {
        let (doc, outer, inner, leaf) = fixture();
        doc.add_class(inner, "hit");
        doc.add_class(leaf, "hit");
        assert_eq!(doc.descendant_with_class(doc.body(), "hit"), Some(inner));
        // The root itself is not considered.
        doc.add_class(outer, "only-on-outer");
        assert_eq!(doc.descendant_with_class(outer, "only-on-outer"), None);
    }

    #[test]
    fn closest_with_class_stops_at_boundary() {
        let (doc, outer, inner, leaf) = fixture();
        doc.add_class(outer, "mark");
        // `outer` carries the class but lies outside the boundary `inner`.
        assert_eq!(doc.closest_with_class(leaf, "mark", inner), None);
        doc.add_class(inner, "mark");
        assert_eq!(doc.closest_with_class(leaf, "mark", inner), Some(inner));
        doc.add_class(leaf, "mark");
        assert_eq!(doc.closest_with_class(leaf, "mark", inner), Some(leaf));
    }

    #[test]
    fn cascade_precedence() {
        let doc = Document::new();
        let scope = doc.create_element("div");
        let el = doc.create_element("div");
        doc.append_child(doc.body(), scope);
        doc.append_child(scope, el);
        doc.set_id(scope, "scope");
        doc.add_class(el, "box");

        doc.set_bounding_rect(el, PxRect::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(doc.bounding_rect(el).top, 1.0);

        doc.define_class_style("box", &[("top", "2px")]);
        assert_eq!(doc.bounding_rect(el).top, 2.0);

        let sheet = doc.inject_stylesheet(
            "#scope .box { top: 3px; left: 0px; height: 0px; width: 0px; }",
        );
        assert_eq!(doc.bounding_rect(el).top, 3.0);

        doc.define_class_style_important("box", &[("top", "4px")]);
        assert_eq!(doc.bounding_rect(el).top, 4.0);

        doc.set_style(el, "top", "5px");
        assert_eq!(doc.bounding_rect(el).top, 5.0);

        doc.remove_style(el, "top");
        assert_eq!(doc.bounding_rect(el).top, 4.0);
        doc.remove_stylesheet(sheet);
        assert_eq!(doc.bounding_rect(el).top, 4.0);
    }

    #[test]
    fn later_class_rules_win_within_a_tier() {
        let doc = Document::new();
        let el = doc.create_element("div");
        doc.add_class(el, "box");
        doc.define_class_style("box", &[("opacity", "0")]);
        doc.define_class_style("box", &[("opacity", "0.5")]);
        assert_eq!(doc.computed_opacity(el), 0.5);
    }

    #[test]
    fn injected_sheet_requires_id_scope_ancestor() {
        let doc = Document::new();
        let el = doc.create_element("div");
        doc.append_child(doc.body(), el);
        doc.add_class(el, "box");
        doc.inject_stylesheet("#scope .box { top: 9px; left: 0px; height: 0px; width: 0px; }");
        // No ancestor carries #scope, so the pin does not apply.
        assert_eq!(doc.bounding_rect(el).top, 0.0);
    }

    #[test]
    fn newest_sheet_wins() {
        let doc = Document::new();
        let scope = doc.create_element("div");
        let el = doc.create_element("div");
        doc.append_child(doc.body(), scope);
        doc.append_child(scope, el);
        doc.set_id(scope, "s");
        doc.add_class(el, "p");
        doc.inject_stylesheet("#s .p { top: 1px; left: 0px; height: 0px; width: 0px; }");
        doc.inject_stylesheet("#s .p { top: 2px; left: 0px; height: 0px; width: 0px; }");
        assert_eq!(doc.bounding_rect(el).top, 2.0);
    }

    #[test]
    fn opacity_defaults_to_opaque() {
        let doc = Document::new();
        let el = doc.create_element("div");
        assert_eq!(doc.computed_opacity(el), 1.0);
        doc.set_style(el, "opacity", "0.25");
        assert_eq!(doc.computed_opacity(el), 0.25);
    }

    #[test]
    fn dispatch_bubbles_and_carries_target() {
        let (doc, outer, _inner, leaf) = fixture();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let log = Rc::clone(&seen);
        doc.listen(outer, EventKind::Click, move |_, ev| {
            log.borrow_mut().push(("outer", ev.target));
        });
        let log = Rc::clone(&seen);
        doc.listen_document(EventKind::Click, move |_, ev| {
            log.borrow_mut().push(("document", ev.target));
        });

        doc.click(leaf);

        let seen = seen.borrow();
        assert_eq!(seen.as_slice(), &[("outer", leaf), ("document", leaf)]);
    }

    #[test]
    fn listener_removed_during_dispatch_is_not_invoked() {
        let (doc, _outer, _inner, leaf) = fixture();
        let fired = Rc::new(Cell::new(0));
        let victim_slot: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));

        // The leaf listener runs first (bubble order) and removes the
        // ancestor listener before it gets a chance to run.
        let slot = Rc::clone(&victim_slot);
        doc.listen(leaf, EventKind::Click, move |doc, _| {
            if let Some(id) = slot.take() {
                doc.unlisten(id);
            }
        });
        let count = Rc::clone(&fired);
        let victim = doc.listen_document(EventKind::Click, move |_, _| {
            count.set(count.get() + 1);
        });
        victim_slot.set(Some(victim));

        doc.click(leaf);
        assert_eq!(fired.get(), 0);
        assert_eq!(doc.active_listener_count(), 1);
    }

    #[test]
    fn advance_completes_in_end_time_order_and_clears_styles() {
        let doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        doc.append_child(doc.body(), a);
        doc.append_child(doc.body(), b);
        doc.set_style(a, "transform", "none");

        let order = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&order);
        doc.listen_document(EventKind::TransitionEnd, move |_, ev| {
            log.borrow_mut().push(ev.target);
        });

        doc.begin_transition(
            a,
            TransitionSpec::new(Duration::from_millis(50), Duration::from_millis(400))
                .clear_style("transform"),
        );
        doc.begin_transition(b, TransitionSpec::new(Duration::ZERO, Duration::from_millis(100)));

        doc.advance(Duration::from_millis(500));

        assert_eq!(order.borrow().as_slice(), &[b, a]);
        assert_eq!(doc.inline_style(a, "transform"), None);
        assert_eq!(doc.pending_transition_count(), 0);
        assert_eq!(doc.now(), Duration::from_millis(500));
    }

    #[test]
    fn completion_callbacks_can_chain_transitions_within_one_advance() {
        let doc = Document::new();
        let el = doc.create_element("div");
        doc.append_child(doc.body(), el);

        let completions = Rc::new(Cell::new(0));
        let count = Rc::clone(&completions);
        doc.listen_document(EventKind::TransitionEnd, move |doc, ev| {
            count.set(count.get() + 1);
            if count.get() == 1 {
                doc.begin_transition(
                    ev.target,
                    TransitionSpec::new(Duration::ZERO, Duration::from_millis(100)),
                );
            }
        });

        doc.begin_transition(el, TransitionSpec::new(Duration::ZERO, Duration::from_millis(100)));
        // One window covers both: the chained transition starts at t=100
        // and ends at t=200.
        doc.advance(Duration::from_millis(250));
        assert_eq!(completions.get(), 2);
        assert_eq!(doc.pending_transition_count(), 0);
    }

    #[test]
    fn run_until_idle_drains_chained_phases() {
        let doc = Document::new();
        let el = doc.create_element("div");
        doc.append_child(doc.body(), el);

        let completions = Rc::new(Cell::new(0));
        let count = Rc::clone(&completions);
        doc.listen_document(EventKind::TransitionEnd, move |doc, ev| {
            count.set(count.get() + 1);
            if count.get() < 3 {
                doc.begin_transition(
                    ev.target,
                    TransitionSpec::new(Duration::ZERO, Duration::from_millis(10)),
                );
            }
        });

        doc.begin_transition(el, TransitionSpec::new(Duration::ZERO, Duration::from_millis(10)));
        let steps = doc.run_until_idle(16);
        assert_eq!(completions.get(), 3);
        assert!(steps >= 1);
        assert_eq!(doc.pending_transition_count(), 0);
    }

    #[test]
    fn focus_dispatches_focus_in() {
        let (doc, _outer, _inner, leaf) = fixture();
        doc.set_focusable(leaf, true);

        let seen = Rc::new(Cell::new(None));
        let slot = Rc::clone(&seen);
        doc.listen_document(EventKind::FocusIn, move |_, ev| {
            slot.set(Some(ev.target));
        });

        doc.focus(leaf);
        assert_eq!(doc.focused_element(), Some(leaf));
        assert_eq!(seen.get(), Some(leaf));
    }

    #[test]
    fn first_focusable_is_document_order() {
        let (doc, outer, inner, leaf) = fixture();
        doc.set_focusable(leaf, true);
        assert!(doc.is_focusable(leaf));
        assert_eq!(doc.first_focusable_within(outer), Some(leaf));
        doc.set_focusable(inner, true);
        assert_eq!(doc.first_focusable_within(outer), Some(inner));
        assert_eq!(doc.first_focusable_within(leaf), None);
    }

    #[test]
    fn tick_only_moves_time_forward() {
        let doc = Document::new();
        doc.tick();
        let first = doc.now();
        doc.tick();
        assert!(doc.now() >= first);
    }

    #[test]
    fn key_down_targets_focused_element() {
        let (doc, _outer, _inner, leaf) = fixture();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        doc.listen_document(EventKind::KeyDown, move |_, ev| {
            log.borrow_mut().push((ev.target, ev.key));
        });

        doc.dispatch_key_down(Key::Escape);
        doc.focus(leaf);
        doc.dispatch_key_down(Key::Escape);

        let seen = seen.borrow();
        assert_eq!(seen[0], (BODY, Some(Key::Escape)));
        assert_eq!(seen[1], (leaf, Some(Key::Escape)));
    }

    #[test]
    fn stylesheet_text_round_trips() {
        let doc = Document::new();
        let id = doc.inject_stylesheet("#m .p { top: 1px; left: 2px; height: 3px; width: 4px; }");
        assert_eq!(doc.stylesheet_count(), 1);
        assert_eq!(
            doc.stylesheet_text(id).as_deref(),
            Some("#m .p { top: 1px; left: 2px; height: 3px; width: 4px; }")
        );
        assert!(doc.remove_stylesheet(id));
        assert!(!doc.remove_stylesheet(id));
        assert_eq!(doc.stylesheet_count(), 0);
    }
}
