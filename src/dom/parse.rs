//! Build a [`Document`] from markup with the `quick-xml` reader
//!
//! Namespaces are resolved here rather than by the reader so that bindings
//! whose URI is written with an entity reference (`xmlns="&ns_svg;"`, as in
//! Illustrator exports) resolve to the expanded value.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{Attribute, Document, Element, NodeId, NodeKind, XmlDecl};
use crate::error::TemplateError;

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Prefix to URI bindings visible inside an open element
type Scope = BTreeMap<String, String>;

/// Parse a complete XML document
pub fn parse(text: &str) -> Result<Document, TemplateError> {
    let mut reader = Reader::from_str(text);
    let mut doc = Document::new();
    let mut entities = Entities::default();
    let top_scope = Rc::new(Scope::from([("xml".to_string(), XML_NS.to_string())]));
    let mut open: Vec<(NodeId, Rc<Scope>)> = Vec::new();
    let mut seen_root = false;

    loop {
        let event = reader.read_event()?;
        let position = reader.buffer_position() as u64;
        let (parent, scope) = match open.last() {
            Some((node, scope)) => (*node, Rc::clone(scope)),
            None => (Document::ROOT, Rc::clone(&top_scope)),
        };

        if matches!(event, Event::Start(_) | Event::Empty(_)) && open.is_empty() && seen_root {
            return Err(TemplateError::parse(position, "more than one root element"));
        }

        match event {
            Event::Start(e) => {
                let (element, scope) = build_element(&e, scope, &entities, position)?;
                let node = doc.create(NodeKind::Element(element));
                doc.append_child(parent, node);
                open.push((node, scope));
                seen_root = true;
            }
            Event::Empty(e) => {
                let (element, _) = build_element(&e, scope, &entities, position)?;
                let node = doc.create(NodeKind::Element(element));
                doc.append_child(parent, node);
                seen_root = true;
            }
            Event::End(_) => {
                if open.pop().is_none() {
                    return Err(TemplateError::parse(position, "unexpected closing tag"));
                }
            }
            Event::Text(e) => {
                let text = e
                    .unescape_with(|name| entities.resolve(name))
                    .map_err(quick_xml::Error::from)?
                    .into_owned();
                if open.is_empty() && !text.trim().is_empty() {
                    return Err(TemplateError::parse(position, "text outside the root element"));
                }
                let node = doc.create(NodeKind::Text(text));
                doc.append_child(parent, node);
            }
            Event::CData(e) => {
                if open.is_empty() {
                    return Err(TemplateError::parse(position, "CDATA outside the root element"));
                }
                let node = doc.create(NodeKind::CData(utf8(&e, "CDATA section")?));
                doc.append_child(parent, node);
            }
            Event::Comment(e) => {
                let node = doc.create(NodeKind::Comment(utf8(&e, "comment")?));
                doc.append_child(parent, node);
            }
            Event::PI(e) => {
                let node = doc.create(NodeKind::ProcessingInstruction(utf8(&e, "processing instruction")?));
                doc.append_child(parent, node);
            }
            Event::DocType(e) => {
                let doctype = utf8(&e, "doctype")?;
                entities = Entities::from_doctype(&doctype);
                let node = doc.create(NodeKind::DocType(doctype));
                doc.append_child(parent, node);
            }
            Event::Decl(e) => {
                let version = e.version().map_err(quick_xml::Error::from)?;
                let encoding = match e.encoding() {
                    Some(value) => Some(utf8(&value.map_err(quick_xml::Error::from)?, "XML declaration")?),
                    None => None,
                };
                let standalone = match e.standalone() {
                    Some(value) => Some(utf8(&value.map_err(quick_xml::Error::from)?, "XML declaration")?),
                    None => None,
                };
                let decl = XmlDecl {
                    version: utf8(&version, "XML declaration")?,
                    encoding,
                    standalone,
                };
                let node = doc.create(NodeKind::Declaration(decl));
                doc.append_child(parent, node);
            }
            Event::Eof => {
                if !open.is_empty() {
                    return Err(TemplateError::parse(position, "unclosed element at end of input"));
                }
                if !seen_root {
                    return Err(TemplateError::parse(position, "no root element"));
                }
                break;
            }
        }
    }

    Ok(doc)
}

/// General entities declared in the internal DTD subset
#[derive(Debug, Default)]
struct Entities(HashMap<String, String>);

impl Entities {
    /// Collect `<!ENTITY name "value">` declarations
    ///
    /// Parameter entities and external entities are skipped; their references
    /// stay unresolved and fail when used. Character and predefined references
    /// inside a value are expanded.
    fn from_doctype(doctype: &str) -> Self {
        let mut entities = HashMap::new();
        let mut rest = doctype;
        while let Some(start) = rest.find("<!ENTITY") {
            rest = rest[start + "<!ENTITY".len()..].trim_start();
            if rest.starts_with('%') {
                continue;
            }
            let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let (name, tail) = rest.split_at(name_end);
            let tail = tail.trim_start();
            let Some(quote) = tail.chars().next().filter(|c| *c == '"' || *c == '\'') else {
                rest = tail;
                continue;
            };
            let body = &tail[1..];
            let Some(end) = body.find(quote) else {
                break;
            };
            let raw = &body[..end];
            let value = unescape(raw).map_or_else(|_| raw.to_string(), |value| value.into_owned());
            entities.insert(name.to_string(), value);
            rest = &body[end + 1..];
        }
        Self(entities)
    }

    fn resolve(&self, name: &str) -> Option<&str> {
        resolve_predefined_entity(name).or_else(|| self.0.get(name).map(String::as_str))
    }
}

/// Build an element and the scope its children see
fn build_element(
    start: &BytesStart<'_>,
    parent_scope: Rc<Scope>,
    entities: &Entities,
    position: u64,
) -> Result<(Element, Rc<Scope>), TemplateError> {
    let name = utf8(start.name().as_ref(), "element name")?;
    let (prefix, local_name) = match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix.to_string()), local.to_string()),
        None => (None, name),
    };

    let mut element = Element::new(prefix, local_name, None);
    for attr in start.attributes() {
        let attr = attr?;
        let key = utf8(attr.key.as_ref(), "attribute name")?;
        let value = attr
            .unescape_value_with(|name| entities.resolve(name))
            .map_err(quick_xml::Error::from)?
            .into_owned();
        element.attributes.push(Attribute::new(key, value));
    }

    let scope = if element.namespace_declarations().next().is_some() {
        let mut scope = Scope::clone(&parent_scope);
        for (prefix, uri) in element.namespace_declarations() {
            scope.insert(prefix.to_string(), uri.to_string());
        }
        Rc::new(scope)
    } else {
        parent_scope
    };

    element.namespace = match &element.prefix {
        Some(prefix) => match scope.get(prefix) {
            Some(uri) if !uri.is_empty() => Some(uri.clone()),
            _ => {
                return Err(TemplateError::parse(
                    position,
                    format!("unknown namespace prefix '{}'", prefix),
                ))
            }
        },
        None => scope.get("").filter(|uri| !uri.is_empty()).cloned(),
    };
    Ok((element, scope))
}

fn utf8(bytes: &[u8], context: &'static str) -> Result<String, TemplateError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| TemplateError::Encoding { context })
}
