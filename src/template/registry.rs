//! Marker registry for placeholder elements

use std::collections::HashMap;
use std::fmt;

use crate::dom::{Document, Element, NodeId};
use crate::error::TemplateError;

use super::SVG_NS;

/// The substitution family a marker belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// `<rect>` placeholders, replaced by images or fragments, or removed
    Rect,
    /// Text-bearing elements (`<tspan>`, or the first child of a marked `<text>`)
    Span,
    /// `<g>` groups, which can only be removed
    Group,
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MarkerKind::Rect => "rect",
            MarkerKind::Span => "span",
            MarkerKind::Group => "group",
        })
    }
}

/// Marker ids mapped to the elements they address, one map per kind
#[derive(Debug, Default)]
pub struct MarkerRegistry {
    rects: HashMap<String, NodeId>,
    spans: HashMap<String, NodeId>,
    groups: HashMap<String, NodeId>,
}

impl MarkerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk `doc` in document order, registering and stripping every marker attribute
    pub fn index(doc: &mut Document, marker_attribute: &str) -> Result<Self, TemplateError> {
        let mut registry = Self::new();

        for node in doc.descendants(Document::ROOT) {
            let Some(el) = doc.element(node) else {
                continue;
            };
            let marker = match el.attribute(marker_attribute) {
                Some(marker) if !marker.is_empty() => marker.to_string(),
                _ => continue,
            };

            let (kind, target) = if is_svg(el, "rect") {
                (MarkerKind::Rect, node)
            } else if is_svg(el, "tspan") {
                (MarkerKind::Span, node)
            } else if is_svg(el, "g") {
                (MarkerKind::Group, node)
            } else if is_svg(el, "text") {
                let first = doc.child_elements(node).next().ok_or_else(|| {
                    TemplateError::template_parse(
                        el.qualified_name(),
                        &marker,
                        "marked <text> has no child element to hold the text",
                    )
                })?;
                (MarkerKind::Span, first)
            } else {
                return Err(TemplateError::unsupported_element(el.qualified_name(), marker));
            };

            if let Some(el) = doc.element_mut(node) {
                el.remove_attribute(marker_attribute);
            }
            tracing::trace!(%kind, marker = %marker, "indexed template marker");
            registry.register(kind, marker, target)?;
        }

        Ok(registry)
    }

    /// Register a marker
    pub fn register(&mut self, kind: MarkerKind, id: String, node: NodeId) -> Result<(), TemplateError> {
        let map = self.map_mut(kind);
        if map.contains_key(&id) {
            return Err(TemplateError::DuplicateMarker { kind, id });
        }
        map.insert(id, node);
        Ok(())
    }

    /// Look up a marker without consuming it
    pub fn get(&self, kind: MarkerKind, id: &str) -> Result<NodeId, TemplateError> {
        self.map(kind)
            .get(id)
            .copied()
            .ok_or_else(|| TemplateError::marker_not_found(kind, id))
    }

    /// Remove a marker, returning the element it addressed
    pub fn take(&mut self, kind: MarkerKind, id: &str) -> Result<NodeId, TemplateError> {
        self.map_mut(kind)
            .remove(id)
            .ok_or_else(|| TemplateError::marker_not_found(kind, id))
    }

    /// Check if a marker is still available
    pub fn contains(&self, kind: MarkerKind, id: &str) -> bool {
        self.map(kind).contains_key(id)
    }

    /// All available marker ids of one kind, sorted
    pub fn ids(&self, kind: MarkerKind) -> Vec<&str> {
        let mut ids: Vec<&str> = self.map(kind).keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of available markers of one kind
    pub fn len(&self, kind: MarkerKind) -> usize {
        self.map(kind).len()
    }

    /// Check if no markers of any kind are available
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty() && self.spans.is_empty() && self.groups.is_empty()
    }

    fn map(&self, kind: MarkerKind) -> &HashMap<String, NodeId> {
        match kind {
            MarkerKind::Rect => &self.rects,
            MarkerKind::Span => &self.spans,
            MarkerKind::Group => &self.groups,
        }
    }

    fn map_mut(&mut self, kind: MarkerKind) -> &mut HashMap<String, NodeId> {
        match kind {
            MarkerKind::Rect => &mut self.rects,
            MarkerKind::Span => &mut self.spans,
            MarkerKind::Group => &mut self.groups,
        }
    }
}

/// Whether `el` is the SVG element `local`; unnamespaced documents count as SVG
pub(crate) fn is_svg(el: &Element, local: &str) -> bool {
    el.local_name == local && el.namespace.as_deref().map_or(true, |ns| ns == SVG_NS)
}
