//! Arena document - index-based element tree for output fragments.
//!
//! Elements are indices into a flat node vector rather than owned tree
//! objects, so fragment handles are cheap `Copy` values and the whole page
//! can be walked without borrow gymnastics. An id index gives O(1) lookup
//! by element identifier and best-effort duplicate detection.
//!
//! Queries (`get_by_id`, `query_class`) are side-effect-free; mutation goes
//! through explicit setters.

use std::collections::HashMap;

use crate::error::RenderError;

// =============================================================================
// Nodes
// =============================================================================

/// Handle to an element in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// One element: tag, identity, classes, attributes, text, children.
#[derive(Debug, Clone, Default)]
pub struct Node {
    /// Tag name (`div`, `span`, ...).
    pub tag: String,
    /// Element identifier, if assigned.
    pub element_id: Option<String>,
    /// Class list, in insertion order.
    pub classes: Vec<String>,
    /// Attribute map.
    pub attrs: HashMap<String, String>,
    /// Text content.
    pub text: String,
    children: Vec<NodeId>,
}

impl Node {
    /// Whether the class list contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

// =============================================================================
// Document
// =============================================================================

/// Flat-arena element tree.
#[derive(Debug, Default)]
pub struct Document {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    id_index: HashMap<String, NodeId>,
}

impl Document {
    /// Empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new element with the given tag. The element is detached
    /// until appended to a parent or to the document roots.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            tag: tag.to_string(),
            ..Node::default()
        });
        id
    }

    /// Assign an element identifier and index it.
    ///
    /// # Errors
    ///
    /// [`RenderError::DuplicateIdentifier`] if another element in this
    /// document already carries `id`. Collisions with markup outside the
    /// document cannot be seen here and remain a caller contract.
    pub fn set_element_id(&mut self, node: NodeId, id: &str) -> Result<(), RenderError> {
        if let Some(existing) = self.id_index.get(id) {
            if *existing != node {
                return Err(RenderError::DuplicateIdentifier(id.to_string()));
            }
            return Ok(());
        }
        // Drop any previous identifier of this node from the index.
        if let Some(old) = self.nodes[node.0].element_id.take() {
            self.id_index.remove(&old);
        }
        self.nodes[node.0].element_id = Some(id.to_string());
        self.id_index.insert(id.to_string(), node);
        Ok(())
    }

    /// Append `child` to `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
    }

    /// Append `node` as a document root.
    pub fn append_root(&mut self, node: NodeId) {
        self.roots.push(node);
    }

    /// Add a class to an element (no-op if already present).
    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if !self.nodes[node.0].has_class(class) {
            self.nodes[node.0].classes.push(class.to_string());
        }
    }

    /// Set an attribute.
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        self.nodes[node.0]
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    /// Remove an attribute (no-op if absent).
    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        self.nodes[node.0].attrs.remove(name);
    }

    /// Get an attribute value.
    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node.0].attrs.get(name).map(String::as_str)
    }

    /// Replace an element's text content.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.nodes[node.0].text = text.to_string();
    }

    /// An element's text content.
    pub fn text(&self, node: NodeId) -> &str {
        &self.nodes[node.0].text
    }

    /// Immutable access to a node.
    pub fn node(&self, node: NodeId) -> &Node {
        &self.nodes[node.0]
    }

    /// Look up an element by identifier.
    pub fn get_by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    /// All elements under `scope` (or the whole document) carrying `class`,
    /// in document (preorder) order. Idempotent and side-effect-free.
    pub fn query_class(&self, scope: Option<NodeId>, class: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        match scope {
            Some(root) => self.collect_class(root, class, &mut found),
            None => {
                for root in &self.roots {
                    self.collect_class(*root, class, &mut found);
                }
            }
        }
        found
    }

    fn collect_class(&self, node: NodeId, class: &str, found: &mut Vec<NodeId>) {
        if self.nodes[node.0].has_class(class) {
            found.push(node);
        }
        for child in &self.nodes[node.0].children {
            self.collect_class(*child, class, found);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_and_query() {
        let mut doc = Document::new();
        let root = doc.create_element("div");
        doc.append_root(root);
        doc.add_class(root, "panel");

        let a = doc.create_element("span");
        doc.add_class(a, "slot");
        doc.append_child(root, a);

        let b = doc.create_element("span");
        doc.add_class(b, "slot");
        doc.append_child(root, b);

        assert_eq!(doc.query_class(None, "slot"), vec![a, b]);
        assert_eq!(doc.query_class(Some(root), "panel"), vec![root]);
        assert!(doc.query_class(None, "missing").is_empty());
    }

    #[test]
    fn test_id_index() {
        let mut doc = Document::new();
        let node = doc.create_element("div");
        doc.set_element_id(node, "total").unwrap();
        assert_eq!(doc.get_by_id("total"), Some(node));
        assert_eq!(doc.get_by_id("other"), None);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        doc.set_element_id(a, "total").unwrap();
        assert!(matches!(
            doc.set_element_id(b, "total"),
            Err(RenderError::DuplicateIdentifier(_))
        ));
        // Re-assigning the same id to the same node is fine.
        assert!(doc.set_element_id(a, "total").is_ok());
    }

    #[test]
    fn test_document_order() {
        let mut doc = Document::new();
        let first = doc.create_element("div");
        let second = doc.create_element("div");
        doc.add_class(first, "out");
        doc.add_class(second, "out");
        doc.append_root(first);
        doc.append_root(second);

        let nested = doc.create_element("div");
        doc.add_class(nested, "out");
        doc.append_child(first, nested);

        // Preorder: first, its nested child, then second.
        assert_eq!(doc.query_class(None, "out"), vec![first, nested, second]);
    }

    #[test]
    fn test_text_and_attrs() {
        let mut doc = Document::new();
        let node = doc.create_element("span");
        doc.set_text(node, "95");
        assert_eq!(doc.text(node), "95");

        doc.set_attr(node, "data-countup", "true");
        assert_eq!(doc.attr(node, "data-countup"), Some("true"));
        doc.remove_attr(node, "data-countup");
        assert_eq!(doc.attr(node, "data-countup"), None);
    }
}
