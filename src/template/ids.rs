//! Fresh identifiers for spliced fragments

use uuid::Uuid;

use crate::dom::{Document, NodeId};

/// Source of unique element identifiers
pub trait IdGenerator {
    /// Produce an identifier not returned before by this generator
    fn next_id(&mut self) -> String;
}

/// Random UUID v4 identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic `<prefix><n>` identifiers, counting from 1
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

/// Assign a fresh `id` to every element under `root` (inclusive), root first
pub fn regenerate_ids(doc: &mut Document, root: NodeId, ids: &mut dyn IdGenerator) -> usize {
    let mut count = 0;
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if let Some(el) = doc.element_mut(node) {
            el.set_attribute("id", ids.next_id());
            count += 1;
        }
        stack.extend(doc.children(node).iter().rev().copied());
    }
    count
}
