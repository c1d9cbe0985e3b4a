//! Explicit element selection over a parsed page, plus the edit plan that
//! the serializer applies. Nothing here touches a live DOM: callers pass the
//! document root in, so every pass is testable on plain strings.

use std::collections::HashMap;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

/// All elements matching `selector`, in document order.
pub fn select_ids(doc: &Html, selector: &Selector) -> Vec<NodeId> {
    doc.select(selector).map(|el| el.id()).collect()
}

/// Concatenated descendant text of an element, or empty for non-elements.
pub fn element_text(doc: &Html, id: NodeId) -> String {
    doc.tree
        .get(id)
        .and_then(ElementRef::wrap)
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default()
}

/// The raw `class` attribute of an element, if any.
pub fn class_attr(doc: &Html, id: NodeId) -> Option<&str> {
    doc.tree
        .get(id)
        .and_then(ElementRef::wrap)
        .and_then(|el| el.value().attr("class"))
}

/// Planned mutations for one enhancement run, keyed by node.
///
/// Classes are unioned with whatever the element already carries; a text or
/// inner-HTML replacement records at most one edit per node, so each
/// qualifying element is processed once per run.
#[derive(Debug, Default)]
pub struct PageEdits {
    texts: HashMap<NodeId, String>,
    classes: HashMap<NodeId, Vec<String>>,
    inner: HashMap<NodeId, String>,
}

impl PageEdits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the element's content with plain text (escaped on write).
    pub fn replace_text(&mut self, id: NodeId, text: String) {
        self.texts.insert(id, text);
    }

    /// Append a class token, keeping all existing classes.
    pub fn add_class(&mut self, id: NodeId, class: impl Into<String>) {
        let class = class.into();
        let classes = self.classes.entry(id).or_default();
        if !classes.contains(&class) {
            classes.push(class);
        }
    }

    /// Replace the element's content with pre-rendered markup (written raw).
    pub fn replace_inner(&mut self, id: NodeId, html: String) {
        self.inner.insert(id, html);
    }

    pub fn text_for(&self, id: NodeId) -> Option<&str> {
        self.texts.get(&id).map(String::as_str)
    }

    pub fn added_classes(&self, id: NodeId) -> &[String] {
        self.classes.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn inner_for(&self, id: NodeId) -> Option<&str> {
        self.inner.get(&id).map(String::as_str)
    }
}
