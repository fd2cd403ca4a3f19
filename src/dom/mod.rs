//! Owned XML tree
//!
//! Markup is parsed with `quick-xml` into an arena of nodes addressed by
//! [`NodeId`]. Detached nodes stay in the arena but are no longer reachable
//! from [`Document::ROOT`], so they are never serialized.

mod parse;
mod write;

use std::collections::{BTreeMap, HashSet};

pub use parse::parse;
pub use write::{to_string, write};

/// Handle to a node inside one [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An attribute as written in the markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified name (`x`, `xlink:href`, `xmlns:inkscape`)
    pub name: String,
    /// Unescaped value
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Whether this attribute is an `xmlns` or `xmlns:*` declaration
    pub fn is_namespace_declaration(&self) -> bool {
        self.declared_prefix().is_some()
    }

    /// Prefix bound by a namespace declaration, `""` for the default namespace
    pub fn declared_prefix(&self) -> Option<&str> {
        if self.name == "xmlns" {
            Some("")
        } else {
            self.name.strip_prefix("xmlns:")
        }
    }

    /// Whether the attribute has no namespace prefix
    pub fn is_unqualified(&self) -> bool {
        !self.name.contains(':') && self.name != "xmlns"
    }
}

/// XML declaration fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDecl {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

/// An element with its raw name and resolved namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub prefix: Option<String>,
    pub local_name: String,
    /// Namespace URI the element name resolved to when it was parsed or created
    pub namespace: Option<String>,
    pub attributes: Vec<Attribute>,
}

impl Element {
    /// Create an element with no attributes
    pub fn new(prefix: Option<String>, local_name: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            prefix,
            local_name: local_name.into(),
            namespace,
            attributes: Vec::new(),
        }
    }

    /// Name as it appears in the markup
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// Get an attribute value by qualified name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing an existing value in place
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = value,
            None => self.attributes.push(Attribute::new(name, value)),
        }
    }

    /// Remove an attribute, returning its value
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(index).value)
    }

    /// Namespace declarations made on this element, as (prefix, uri) pairs
    pub fn namespace_declarations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .filter_map(|a| a.declared_prefix().map(|p| (p, a.value.as_str())))
    }
}

/// The kind and payload of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The synthetic document node owning the prolog and root element
    Document,
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    Declaration(XmlDecl),
    DocType(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An XML document stored as an arena of nodes
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// The document node; parent of the prolog and the root element
    pub const ROOT: NodeId = NodeId(0);

    /// Create an empty document
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Add a detached node to the arena
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Child nodes that are elements, in document order
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.element(c).is_some())
    }

    /// The single top-level element
    pub fn root_element(&self) -> Option<NodeId> {
        self.child_elements(Self::ROOT).next()
    }

    /// Elements of the subtree rooted at `id`, in pre-order (`id` first if it is an element)
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if self.element(node).is_some() {
                out.push(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Whether the node is still reachable from the document node
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == Self::ROOT {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Append `child` as the last child of `parent`, detaching it first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Insert `child` at `index` among the children of `parent`, detaching it first
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Remove a node from its parent; returns false if it was already detached
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.nodes[id.0].parent.take() else {
            return false;
        };
        self.nodes[parent.0].children.retain(|&c| c != id);
        true
    }

    /// Character data before the first non-text child
    pub fn text(&self, id: NodeId) -> String {
        let mut text = String::new();
        for &child in self.children(id) {
            match self.kind(child) {
                NodeKind::Text(t) | NodeKind::CData(t) => text.push_str(t),
                _ => break,
            }
        }
        text
    }

    /// Replace the character data before the first non-text child
    ///
    /// Text following child elements is left untouched.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        let leading: Vec<NodeId> = self
            .children(id)
            .iter()
            .copied()
            .take_while(|&c| matches!(self.kind(c), NodeKind::Text(_) | NodeKind::CData(_)))
            .collect();
        for child in leading {
            self.detach(child);
        }
        if !text.is_empty() {
            let node = self.create(NodeKind::Text(text.to_string()));
            self.insert_child(id, 0, node);
        }
    }

    /// Namespace bindings visible at `id`, keyed by prefix (`""` is the default namespace)
    pub fn namespaces_in_scope(&self, id: NodeId) -> BTreeMap<String, String> {
        let mut scope = BTreeMap::new();
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(el) = self.element(node) {
                for (prefix, uri) in el.namespace_declarations() {
                    scope
                        .entry(prefix.to_string())
                        .or_insert_with(|| uri.to_string());
                }
            }
            current = self.parent(node);
        }
        scope
    }

    /// Prefix bound to `uri` at `id`, if any non-default prefix is
    pub fn lookup_prefix(&self, id: NodeId, uri: &str) -> Option<String> {
        self.namespaces_in_scope(id)
            .into_iter()
            .find(|(prefix, bound)| !prefix.is_empty() && bound == uri)
            .map(|(prefix, _)| prefix)
    }

    /// Deep-copy `node` from `source` and append it to `parent`
    ///
    /// Bindings in scope at `node` in `source` that `parent` does not share are
    /// declared on the copied root so prefixed names keep their namespaces.
    pub fn import_subtree(&mut self, source: &Document, node: NodeId, parent: NodeId) -> NodeId {
        let source_scope = source
            .parent(node)
            .map(|p| source.namespaces_in_scope(p))
            .unwrap_or_default();
        let host_scope = self.namespaces_in_scope(parent);

        let copied = self.copy_from(source, node);
        if let Some(el) = self.element_mut(copied) {
            let declared: HashSet<String> = el
                .namespace_declarations()
                .map(|(prefix, _)| prefix.to_string())
                .collect();
            for (prefix, uri) in source_scope {
                if declared.contains(&prefix) || host_scope.get(&prefix) == Some(&uri) {
                    continue;
                }
                let name = if prefix.is_empty() {
                    "xmlns".to_string()
                } else {
                    format!("xmlns:{}", prefix)
                };
                el.attributes.push(Attribute::new(name, uri));
            }
        }
        self.append_child(parent, copied);
        copied
    }

    fn copy_from(&mut self, source: &Document, node: NodeId) -> NodeId {
        let copied = self.create(source.kind(node).clone());
        let mut pending = vec![(node, copied)];
        while let Some((from, to)) = pending.pop() {
            for &child in source.children(from) {
                let child_copy = self.create(source.kind(child).clone());
                self.append_child(to, child_copy);
                pending.push((child, child_copy));
            }
        }
        copied
    }
}
