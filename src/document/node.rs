//! The in-memory configuration tree.
//!
//! The [`Document`] is the single source of truth for a case setup. It
//! knows nothing about persistence or domain semantics; those live in
//! [`crate::storage`] and [`crate::model`] respectively.
//!
//! Navigation comes in two deliberate flavours:
//!
//! - `peek_*` operations are pure reads and never change the tree.
//! - `ensure_*` operations create missing nodes on the way down. A
//!   repeated read through `ensure_*` can therefore change the document
//!   shape; callers that must not mutate use the `peek_*` form.

use std::collections::BTreeMap;

use tracing::debug;

use super::{path::NodePath, value::Value};

/// The name of the root node of every new document.
pub const ROOT_NAME: &str = "case";

/// A stable handle to a node in a [`Document`].
///
/// Handles stay valid until the node they refer to is removed. Slots are
/// never reused, so a handle to a removed node is detectably stale rather
/// than silently pointing at an unrelated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
struct NodeData {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attrs: BTreeMap<String, Value>,
}

impl NodeData {
    fn new(name: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            attrs: BTreeMap::new(),
        }
    }
}

/// An in-memory tree of named nodes with ordered children and scalar
/// attributes.
///
/// The tree is always well-formed: every node except the root has
/// exactly one parent, and child order is preserved across edits. Child
/// order is authoritative; consumers presenting lists derived from the
/// tree must not reorder them.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    nodes: Vec<Option<NodeData>>,
    root: NodeId,
}

impl Document {
    /// Creates an empty document containing only the root node.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(ROOT_NAME)
    }

    pub(crate) fn with_root(name: &str) -> Self {
        Self {
            nodes: vec![Some(NodeData::new(name, None))],
            root: NodeId(0),
        }
    }

    /// Returns the root node.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the number of live nodes in the document, including the
    /// root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns `true` if `id` refers to a live node in this document.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).is_some_and(Option::is_some)
    }

    fn data(&self, id: NodeId) -> &NodeData {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .expect("stale node id")
    }

    fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .expect("stale node id")
    }

    /// Returns the name of a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` refers to a removed node.
    #[must_use]
    pub fn name(&self, id: NodeId) -> &str {
        &self.data(id).name
    }

    /// Returns the parent of a node, or `None` for the root.
    ///
    /// # Panics
    ///
    /// Panics if `id` refers to a removed node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).parent
    }

    /// Returns the children of a node in document order.
    ///
    /// # Panics
    ///
    /// Panics if `id` refers to a removed node.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> {
        self.data(id).children.iter().copied()
    }

    /// Returns the children of a node with the given name, in document
    /// order.
    ///
    /// # Panics
    ///
    /// Panics if `id` refers to a removed node.
    pub fn children_named(&self, id: NodeId, name: &str) -> impl Iterator<Item = NodeId> {
        self.children(id)
            .filter(move |&child| self.data(child).name == name)
    }

    /// Returns the first child with the given name, without creating it.
    ///
    /// # Panics
    ///
    /// Panics if `id` refers to a removed node.
    #[must_use]
    pub fn peek_child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children_named(id, name).next()
    }

    /// Returns the first child with the given name, creating it if
    /// absent.
    ///
    /// This is the shape-mutating counterpart of [`Self::peek_child`].
    ///
    /// # Panics
    ///
    /// Panics if `id` refers to a removed node.
    pub fn ensure_child(&mut self, id: NodeId, name: &str) -> NodeId {
        if let Some(child) = self.peek_child(id, name) {
            return child;
        }
        debug!(parent = %self.data(id).name, name, "creating node");
        self.append_child(id, name)
    }

    /// Appends a new child node, regardless of whether siblings with the
    /// same name exist.
    ///
    /// # Panics
    ///
    /// Panics if `id` refers to a removed node.
    pub fn append_child(&mut self, id: NodeId, name: &str) -> NodeId {
        let child = NodeId(self.nodes.len());
        self.nodes.push(Some(NodeData::new(name, Some(id))));
        self.data_mut(id).children.push(child);
        child
    }

    /// Resolves a path from the root, without creating any nodes.
    #[must_use]
    pub fn peek_path(&self, path: &NodePath) -> Option<NodeId> {
        let mut node = self.root;
        for segment in path.iter() {
            node = self.peek_child(node, segment)?;
        }
        Some(node)
    }

    /// Resolves a path from the root, creating missing nodes along the
    /// way.
    ///
    /// This is the shape-mutating counterpart of [`Self::peek_path`].
    pub fn ensure_path(&mut self, path: &NodePath) -> NodeId {
        let mut node = self.root;
        for segment in path.iter() {
            node = self.ensure_child(node, segment);
        }
        node
    }

    /// Returns the first child with the given name whose attribute
    /// `attr` equals `value`, without creating anything.
    ///
    /// This is the lookup primitive for keyed collections such as
    /// `field` entries keyed by their `id` attribute.
    ///
    /// # Panics
    ///
    /// Panics if `id` refers to a removed node.
    #[must_use]
    pub fn find_child_by_attr(
        &self,
        id: NodeId,
        name: &str,
        attr: &str,
        value: &Value,
    ) -> Option<NodeId> {
        self.children_named(id, name)
            .find(|&child| self.data(child).attrs.get(attr) == Some(value))
    }

    /// Detaches a node from its parent and drops it together with its
    /// entire subtree.
    ///
    /// Returns `false` if the node was already removed.
    ///
    /// # Panics
    ///
    /// Panics if `id` is the root node; the root cannot be removed.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        assert_ne!(id, self.root, "the document root cannot be removed");
        if !self.contains(id) {
            return false;
        }

        if let Some(parent) = self.data(id).parent {
            self.data_mut(parent).children.retain(|&child| child != id);
        }

        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if let Some(data) = self.nodes[node.0].take() {
                stack.extend(data.children);
            }
        }
        true
    }

    /// Returns the value of an attribute, if present.
    ///
    /// # Panics
    ///
    /// Panics if `id` refers to a removed node.
    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&Value> {
        self.data(id).attrs.get(name)
    }

    /// Returns the names and values of all attributes on a node, in
    /// name order.
    ///
    /// # Panics
    ///
    /// Panics if `id` refers to a removed node.
    pub fn attrs(&self, id: NodeId) -> impl Iterator<Item = (&str, &Value)> {
        self.data(id)
            .attrs
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Sets an attribute, overwriting any previous value.
    ///
    /// # Panics
    ///
    /// Panics if `id` refers to a removed node.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<Value>) {
        self.data_mut(id).attrs.insert(name.to_string(), value.into());
    }

    /// Removes an attribute if present.
    ///
    /// Returns `true` if a value was removed.
    ///
    /// # Panics
    ///
    /// Panics if `id` refers to a removed node.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> bool {
        self.data_mut(id).attrs.remove(name).is_some()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
