//! A loaded template and its substitution operations

use std::fmt;
use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::config::TemplateConfig;
use crate::dom::{self, Document, Element, NodeId, NodeKind};
use crate::error::TemplateError;

use super::ids::{regenerate_ids, IdGenerator, UuidGenerator};
use super::placement::{parse_length, Placement};
use super::registry::{is_svg, MarkerKind, MarkerRegistry};
use super::source::Source;
use super::{IMAGE_ATTRIBUTES, XLINK_NS};

/// An SVG template with its placeholder markers indexed
///
/// Every substitution mutates the owned tree in place. Operations that replace
/// or remove an element consume its marker; addressing it again fails with
/// [`TemplateError::MarkerNotFound`].
pub struct TemplateDocument {
    doc: Document,
    root: NodeId,
    defs: NodeId,
    markers: MarkerRegistry,
    config: TemplateConfig,
    ids: Box<dyn IdGenerator>,
}

impl fmt::Debug for TemplateDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateDocument")
            .field("root", &self.root)
            .field("defs", &self.defs)
            .field("markers", &self.markers)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TemplateDocument {
    /// Load a template with the default configuration
    pub fn load(source: Source<'_>) -> Result<Self, TemplateError> {
        Self::load_with_config(source, TemplateConfig::default())
    }

    /// Load a template from markup text
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        Self::load(Source::text(text))
    }

    /// Load a template, indexing markers named by `config.marker_attribute`
    pub fn load_with_config(source: Source<'_>, config: TemplateConfig) -> Result<Self, TemplateError> {
        config.validate()?;
        let text = source.read_text(&config)?;
        let mut doc = dom::parse(&text)?;
        let markers = MarkerRegistry::index(&mut doc, &config.marker_attribute)?;
        let root = doc
            .root_element()
            .ok_or_else(|| TemplateError::parse(0, "no root element"))?;
        let (defs, created_defs) = ensure_defs(&mut doc, root);

        tracing::debug!(
            rects = markers.len(MarkerKind::Rect),
            spans = markers.len(MarkerKind::Span),
            groups = markers.len(MarkerKind::Group),
            created_defs,
            "loaded template"
        );

        Ok(Self {
            doc,
            root,
            defs,
            markers,
            config,
            ids: Box::new(UuidGenerator),
        })
    }

    /// Use `ids` for identifiers assigned to spliced fragments
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// The configuration the template was loaded with
    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    /// The underlying tree
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The `<defs>` element, found or created at load
    pub fn defs(&self) -> NodeId {
        self.defs
    }

    /// Available marker ids of one kind, sorted
    pub fn markers(&self, kind: MarkerKind) -> Vec<&str> {
        self.markers.ids(kind)
    }

    /// Check if a marker can still be addressed
    pub fn has_marker(&self, kind: MarkerKind, id: &str) -> bool {
        self.markers.contains(kind, id)
    }

    /// Replace the text of a span marker
    pub fn set_text(&mut self, marker: &str, text: &str) -> Result<(), TemplateError> {
        let node = self.markers.get(MarkerKind::Span, marker)?;
        self.doc.set_text(node, text);
        tracing::debug!(marker, "set text");
        Ok(())
    }

    /// Turn a rect marker into an `<image>` filling the rect's box
    ///
    /// Without a MIME type the source must be a path, which is linked as-is.
    /// With a MIME type the content is read and embedded as a base64 `data:` URI.
    pub fn set_image(
        &mut self,
        marker: &str,
        source: Source<'_>,
        mime_type: Option<&str>,
    ) -> Result<(), TemplateError> {
        let href = match (source, mime_type) {
            (_, Some(mime)) if mime.trim().is_empty() => {
                Err(TemplateError::invalid_arguments("MIME type must not be empty"))
            }
            (Source::Path(path), None) => path.to_str().map(str::to_string).ok_or_else(|| {
                TemplateError::invalid_arguments(format!(
                    "linked image path {} is not valid UTF-8",
                    path.display()
                ))
            }),
            (_, None) => Err(TemplateError::invalid_arguments(
                "a MIME type is required unless linking an image by path",
            )),
            (source, Some(mime)) => {
                self.markers.get(MarkerKind::Rect, marker)?;
                let bytes = source.read_bytes(&self.config)?;
                Ok(data_uri(mime, &bytes))
            }
        }?;
        let embedded = mime_type.is_some();

        let node = self.markers.take(MarkerKind::Rect, marker)?;
        let xlink_prefix = self.doc.lookup_prefix(node, XLINK_NS);
        let el = self
            .doc
            .element_mut(node)
            .ok_or_else(|| TemplateError::marker_not_found(MarkerKind::Rect, marker))?;

        el.local_name = "image".to_string();
        el.attributes.retain(|a| {
            a.is_namespace_declaration()
                || (a.is_unqualified() && IMAGE_ATTRIBUTES.contains(&a.name.as_str()))
        });
        let href_name = match xlink_prefix {
            Some(prefix) => format!("{}:href", prefix),
            None => {
                el.set_attribute("xmlns:xlink", XLINK_NS);
                "xlink:href".to_string()
            }
        };
        el.set_attribute("preserveAspectRatio", "none");
        el.set_attribute(&href_name, href);

        tracing::debug!(marker, embedded, "set image");
        Ok(())
    }

    /// Replace a rect marker with the primary layer of another SVG document
    ///
    /// The fragment is positioned so its bottom edge meets the rect's `y`,
    /// every element in it gets a fresh `id`, and it is appended to this
    /// document's primary layer.
    pub fn set_svg(
        &mut self,
        marker: &str,
        source: Source<'_>,
        placement: Placement,
    ) -> Result<(), TemplateError> {
        placement.validate()?;
        let text = source.read_text(&self.config)?;
        let mut fragment = dom::parse(&text)?;

        let rect = self.markers.get(MarkerKind::Rect, marker)?;
        let rect_el = self
            .doc
            .element(rect)
            .ok_or_else(|| TemplateError::marker_not_found(MarkerKind::Rect, marker))?;
        let x = optional_length(rect_el, "x")?;
        let y = optional_length(rect_el, "y")?;

        let fragment_root = fragment
            .root_element()
            .ok_or_else(|| TemplateError::parse(0, "no root element"))?;
        let fragment_root_el = fragment
            .element(fragment_root)
            .ok_or_else(|| TemplateError::parse(0, "no root element"))?;
        let height = match fragment_root_el.attribute("height") {
            Some(value) => parse_length("height", value)?,
            None => {
                return Err(TemplateError::missing_attribute(
                    fragment_root_el.qualified_name(),
                    "height",
                ))
            }
        };

        let host_layer = first_layer(&self.doc, self.root).ok_or(TemplateError::MissingLayer {
            document: "template",
        })?;
        let fragment_layer = first_layer(&fragment, fragment_root).ok_or(TemplateError::MissingLayer {
            document: "fragment",
        })?;

        self.markers.take(MarkerKind::Rect, marker)?;
        self.doc.detach(rect);

        let regenerated = regenerate_ids(&mut fragment, fragment_layer, self.ids.as_mut());
        let transform = placement.transform(x, y, height);
        if let Some(layer) = fragment.element_mut(fragment_layer) {
            layer.set_attribute("transform", transform.as_str());
        }
        self.doc.import_subtree(&fragment, fragment_layer, host_layer);

        tracing::debug!(marker, regenerated, transform = %transform, "spliced svg fragment");
        Ok(())
    }

    /// Remove the group addressed by a group marker
    pub fn remove_group(&mut self, marker: &str) -> Result<(), TemplateError> {
        let node = self.markers.take(MarkerKind::Group, marker)?;
        self.doc.detach(node);
        tracing::debug!(marker, "removed group");
        Ok(())
    }

    /// Remove the rect addressed by a rect marker
    pub fn remove_rect(&mut self, marker: &str) -> Result<(), TemplateError> {
        let node = self.markers.take(MarkerKind::Rect, marker)?;
        self.doc.detach(node);
        tracing::debug!(marker, "removed rect");
        Ok(())
    }

    /// Write the current document as markup into `out`
    pub fn write_to<W: Write>(&self, out: W) -> Result<W, TemplateError> {
        dom::write(&self.doc, out)
    }

    /// Render the current document as markup
    pub fn serialize(&self) -> Result<String, TemplateError> {
        dom::to_string(&self.doc)
    }
}

impl fmt::Display for TemplateDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let markup = self.serialize().map_err(|_| fmt::Error)?;
        f.write_str(&markup)
    }
}

/// Find the root's `<defs>` child, creating it as the first child if absent
fn ensure_defs(doc: &mut Document, root: NodeId) -> (NodeId, bool) {
    let existing = doc
        .child_elements(root)
        .find(|&c| doc.element(c).is_some_and(|el| is_svg(el, "defs")));
    if let Some(defs) = existing {
        return (defs, false);
    }

    let (prefix, namespace) = doc
        .element(root)
        .map(|el| (el.prefix.clone(), el.namespace.clone()))
        .unwrap_or_default();
    let defs = doc.create(NodeKind::Element(Element::new(prefix, "defs", namespace)));
    doc.insert_child(root, 0, defs);
    (defs, true)
}

/// The first top-level `<g>` under `root`
fn first_layer(doc: &Document, root: NodeId) -> Option<NodeId> {
    doc.child_elements(root)
        .find(|&c| doc.element(c).is_some_and(|el| is_svg(el, "g")))
}

/// A coordinate attribute, `0` when absent
fn optional_length(el: &Element, attribute: &str) -> Result<f64, TemplateError> {
    el.attribute(attribute)
        .map_or(Ok(0.0), |value| parse_length(attribute, value))
}

fn data_uri(mime_type: &str, content: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type.trim(), STANDARD.encode(content))
}
