//! Serialize a [`Document`] with the `quick-xml` writer

use std::io::Write;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::{Document, NodeId, NodeKind};
use crate::error::TemplateError;

/// Write the whole document, prolog included, into `out`
pub fn write<W: Write>(doc: &Document, out: W) -> Result<W, TemplateError> {
    let mut writer = Writer::new(out);
    let mut stack = vec![Step::Enter(Document::ROOT)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(id) => {
                if !write_open(doc, id, &mut writer)? {
                    continue;
                }
                if doc.element(id).is_some() {
                    stack.push(Step::Leave(id));
                }
                stack.extend(doc.children(id).iter().rev().map(|&child| Step::Enter(child)));
            }
            Step::Leave(id) => {
                if let Some(el) = doc.element(id) {
                    writer.write_event(Event::End(BytesEnd::new(el.qualified_name())))?;
                }
            }
        }
    }
    Ok(writer.into_inner())
}

/// Render the whole document as a string
pub fn to_string(doc: &Document) -> Result<String, TemplateError> {
    let bytes = write(doc, Vec::new())?;
    String::from_utf8(bytes).map_err(|_| TemplateError::Encoding {
        context: "serialized document",
    })
}

enum Step {
    Enter(NodeId),
    Leave(NodeId),
}

/// Write a node's own markup, returning whether its children follow
fn write_open<W: Write>(doc: &Document, id: NodeId, writer: &mut Writer<W>) -> Result<bool, TemplateError> {
    match doc.kind(id) {
        NodeKind::Document => return Ok(true),
        NodeKind::Element(el) => {
            let name = el.qualified_name();
            let mut start = BytesStart::new(name.as_str());
            for attr in &el.attributes {
                start.push_attribute((attr.name.as_str(), attr.value.as_str()));
            }

            if doc.children(id).is_empty() {
                writer.write_event(Event::Empty(start))?;
            } else {
                writer.write_event(Event::Start(start))?;
                return Ok(true);
            }
        }
        NodeKind::Text(text) => {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        NodeKind::CData(text) => {
            writer.write_event(Event::CData(BytesCData::new(text.as_str())))?;
        }
        NodeKind::Comment(text) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?;
        }
        NodeKind::ProcessingInstruction(text) => {
            writer.write_event(Event::PI(BytesPI::new(text.as_str())))?;
        }
        NodeKind::Declaration(decl) => {
            writer.write_event(Event::Decl(BytesDecl::new(
                &decl.version,
                decl.encoding.as_deref(),
                decl.standalone.as_deref(),
            )))?;
        }
        NodeKind::DocType(text) => {
            writer.write_event(Event::DocType(BytesText::from_escaped(text.as_str())))?;
        }
    }
    Ok(false)
}
