//! The document tree and its query/mutation surface.

use indextree::{Arena, NodeId};

use crate::node::{ElementData, NodeData};

/// Errors that can occur when working with a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Node {0:?} does not exist in this document")]
    MissingNode(NodeId),

    #[error("Node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("Cannot attach node {child:?} under {parent:?}")]
    InvalidInsert { parent: NodeId, child: NodeId },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// A parsed HTML document or fragment.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) arena: Arena<NodeData>,
    pub(crate) root: NodeId,
    pub(crate) doctype: Option<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(NodeData::Root);
        Self {
            arena,
            root,
            doctype: None,
        }
    }

    /// The synthetic root node owning all top-level nodes.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The doctype declaration found while parsing, if any.
    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    /// Get a node payload.
    pub fn node(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.arena
            .get(id)
            .filter(|n| !n.is_removed())
            .map(|n| n.get())
            .ok_or(DomError::MissingNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, DomError> {
        self.arena
            .get_mut(id)
            .filter(|n| !n.is_removed())
            .map(|n| n.get_mut())
            .ok_or(DomError::MissingNode(id))
    }

    /// Get an element payload.
    pub fn element(&self, id: NodeId) -> Result<&ElementData, DomError> {
        self.node(id)?
            .as_element()
            .ok_or(DomError::NotAnElement(id))
    }

    /// Get a mutable element payload.
    pub fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        self.node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(id))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_ok()
    }

    /// Lowercase tag name of an element.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).ok().map(|el| el.tag.as_str())
    }

    /// Attribute value of an element. Missing nodes read as absent.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).ok().and_then(|el| el.attr(name))
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.element_mut(id)?.set_attr(name, value);
        Ok(())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Result<(), DomError> {
        self.element_mut(id)?.remove_attr(name);
        Ok(())
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_ok_and(|el| el.has_class(class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<(), DomError> {
        self.element_mut(id)?.add_class(class);
        Ok(())
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<(), DomError> {
        self.element_mut(id)?.remove_class(class);
        Ok(())
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.arena
            .new_node(NodeData::Element(ElementData::new(tag)))
    }

    /// Create a detached text node holding plain (unescaped) text.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.arena.new_node(NodeData::Text(text.to_string()))
    }

    pub(crate) fn create_comment(&mut self, body: &str) -> NodeId {
        self.arena.new_node(NodeData::Comment(body.to_string()))
    }

    /// Append `child` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.node(parent)?;
        self.node(child)?;
        parent
            .checked_append(child, &mut self.arena)
            .map_err(|_| DomError::InvalidInsert { parent, child })
    }

    /// Insert `node` immediately before `reference`.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) -> Result<(), DomError> {
        self.node(reference)?;
        self.node(node)?;
        let parent = self.parent(reference).ok_or(DomError::InvalidInsert {
            parent: reference,
            child: node,
        })?;
        reference
            .checked_insert_before(node, &mut self.arena)
            .map_err(|_| DomError::InvalidInsert {
                parent,
                child: node,
            })
    }

    /// Put `replacement` where `old` was and drop `old` with its subtree.
    pub fn replace(&mut self, old: NodeId, replacement: NodeId) -> Result<(), DomError> {
        self.insert_before(old, replacement)?;
        self.remove(old)
    }

    /// Remove a node and its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        self.node(id)?;
        id.remove_subtree(&mut self.arena);
        Ok(())
    }

    /// Replace all children of `id` with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        self.element(id)?;
        for child in self.children(id) {
            child.remove_subtree(&mut self.arena);
        }
        let text_node = self.create_text(text);
        self.append(id, text_node)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).ok()?;
        id.parent(&self.arena)
    }

    /// All child nodes, including text and comments.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        if self.node(id).is_err() {
            return Vec::new();
        }
        id.children(&self.arena).collect()
    }

    /// Child nodes that are elements, in document order.
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .into_iter()
            .filter(|c| self.is_element(*c))
            .collect()
    }

    /// Descendants in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        if self.node(id).is_err() {
            return Vec::new();
        }
        id.descendants(&self.arena).skip(1).collect()
    }

    /// First descendant element matching a predicate.
    pub fn find<F>(&self, id: NodeId, pred: F) -> Option<NodeId>
    where
        F: Fn(&ElementData) -> bool,
    {
        self.descendants(id)
            .into_iter()
            .find(|d| self.element(*d).is_ok_and(&pred))
    }

    /// All descendant elements matching a predicate.
    pub fn find_all<F>(&self, id: NodeId, pred: F) -> Vec<NodeId>
    where
        F: Fn(&ElementData) -> bool,
    {
        self.descendants(id)
            .into_iter()
            .filter(|d| self.element(*d).is_ok_and(&pred))
            .collect()
    }

    /// First descendant element with the given tag.
    pub fn find_tag(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.find(id, |el| el.tag == tag)
    }

    /// First descendant element carrying the given class.
    pub fn find_class(&self, id: NodeId, class: &str) -> Option<NodeId> {
        self.find(id, |el| el.has_class(class))
    }

    /// Closest element, starting at `id` itself, matching a predicate.
    pub fn closest<F>(&self, id: NodeId, pred: F) -> Option<NodeId>
    where
        F: Fn(&ElementData) -> bool,
    {
        self.node(id).ok()?;
        id.ancestors(&self.arena)
            .find(|a| self.element(*a).is_ok_and(&pred))
    }

    /// Whether `node` is `ancestor` or lies inside it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        if self.node(node).is_err() || self.node(ancestor).is_err() {
            return false;
        }
        node.ancestors(&self.arena).any(|a| a == ancestor)
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Ok(NodeData::Text(text)) = self.node(id) {
            out.push_str(text);
        }
        for d in self.descendants(id) {
            if let Ok(NodeData::Text(text)) = self.node(d) {
                out.push_str(text);
            }
        }
        out
    }

    /// Whether an element has no element children and only whitespace text.
    pub fn is_blank(&self, id: NodeId) -> bool {
        self.element_children(id).is_empty() && self.text_content(id).trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId) {
        let mut doc = Document::new();
        let block = doc.create_element("div");
        let root = doc.root();
        doc.append(root, block).unwrap();
        (doc, block)
    }

    #[test]
    fn builds_and_queries_tree() {
        let (mut doc, block) = sample();
        let p = doc.create_element("p");
        let strong = doc.create_element("strong");
        let text = doc.create_text("Title");
        doc.append(block, p).unwrap();
        doc.append(p, strong).unwrap();
        doc.append(strong, text).unwrap();

        assert_eq!(doc.element_children(block), vec![p]);
        assert_eq!(doc.find_tag(block, "strong"), Some(strong));
        assert_eq!(doc.text_content(block), "Title");
        assert_eq!(doc.closest(text, |el| el.tag == "p"), Some(p));
        assert!(doc.contains(block, text));
        assert!(!doc.contains(p, block));
    }

    #[test]
    fn replace_drops_old_subtree() {
        let (mut doc, block) = sample();
        let p = doc.create_element("p");
        doc.append(block, p).unwrap();
        let h2 = doc.create_element("h2");

        doc.replace(p, h2).unwrap();

        assert_eq!(doc.element_children(block), vec![h2]);
        assert!(matches!(doc.node(p), Err(DomError::MissingNode(_))));
    }

    #[test]
    fn removed_nodes_are_reported_not_panicking() {
        let (mut doc, block) = sample();
        doc.remove(block).unwrap();

        assert!(matches!(
            doc.set_attr(block, "role", "region"),
            Err(DomError::MissingNode(_))
        ));
        assert!(doc.element_children(block).is_empty());
        assert_eq!(doc.attr(block, "role"), None);
    }

    #[test]
    fn text_nodes_are_not_elements() {
        let (mut doc, block) = sample();
        let text = doc.create_text("hi");
        doc.append(block, text).unwrap();

        assert!(matches!(
            doc.add_class(text, "x"),
            Err(DomError::NotAnElement(_))
        ));
        assert!(doc.element_children(block).is_empty());
    }

    #[test]
    fn set_text_replaces_children() {
        let (mut doc, block) = sample();
        let span = doc.create_element("span");
        doc.append(block, span).unwrap();

        doc.set_text(block, "plain").unwrap();

        assert_eq!(doc.children(block).len(), 1);
        assert_eq!(doc.text_content(block), "plain");
        assert!(doc.node(span).is_err());
    }
}
