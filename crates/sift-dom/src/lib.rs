//! Node tree for the Sift markup parser.
//!
//! # Design
//!
//! The tree uses arena allocation with [`NodeId`] indices for all relationships.
//! Children are owned through index lists and every node stores the index of
//! its parent, so the back-reference never dangles: removing a subtree frees
//! its slots as a unit, and freed slots are reused by later allocations.
//!
//! Attributes live inside [`ElementData`]; the attribute node kind is exposed
//! only as a read-only projection ([`AttributeNode`]) over the owning element.

use std::cmp::Ordering;

use strum_macros::Display;

mod attributes;

pub use attributes::{Attribute, AttributeNode, AttributeSet};

/// A type-safe index into the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root node is always at index 0.
    pub const ROOT: Self = Self(0);
}

/// Classification of a node, including the attribute projection kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum NodeKind {
    /// The single root of a parse.
    Root,
    /// Character data.
    Data,
    /// A comment, stored verbatim.
    Comment,
    /// A DTD fragment, stored verbatim.
    Dtd,
    /// A processing instruction, stored verbatim.
    ProcessingInstruction,
    /// An attribute of an element (projection only, never stored in the arena).
    Attribute,
    /// An element with a type name and attributes.
    Element,
}

/// The payload of a stored node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// The root node.
    Root,
    /// Unescaped character data.
    Data(String),
    /// Raw comment text, delimiters included.
    Comment(String),
    /// Raw DTD text, delimiters included.
    Dtd(String),
    /// Raw processing-instruction text, delimiters included.
    ProcessingInstruction(String),
    /// An element.
    Element(ElementData),
}

impl NodeData {
    /// The kind of this payload.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Root => NodeKind::Root,
            Self::Data(_) => NodeKind::Data,
            Self::Comment(_) => NodeKind::Comment,
            Self::Dtd(_) => NodeKind::Dtd,
            Self::ProcessingInstruction(_) => NodeKind::ProcessingInstruction,
            Self::Element(_) => NodeKind::Element,
        }
    }

    /// The value string. Empty for the root and for elements.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Data(s) | Self::Comment(s) | Self::Dtd(s) | Self::ProcessingInstruction(s) => s,
            Self::Root | Self::Element(_) => "",
        }
    }
}

/// Element-specific data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// The grammar-translated type name.
    pub type_name: String,
    /// Attributes in first-seen order.
    pub attributes: AttributeSet,
}

impl ElementData {
    /// Create element data with no attributes.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            attributes: AttributeSet::new(),
        }
    }

    /// Create element data with the given attributes.
    #[must_use]
    pub fn with_attributes(type_name: impl Into<String>, attributes: AttributeSet) -> Self {
        Self {
            type_name: type_name.into(),
            attributes,
        }
    }
}

/// A node stored in the arena.
///
/// Structural fields are private: only [`Tree`] may change them, which keeps
/// parent and children consistent in both directions.
#[derive(Debug, Clone)]
pub struct Node {
    /// The node payload.
    pub data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    position: Option<usize>,
}

impl Node {
    const fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
            position: None,
        }
    }

    /// The owning parent, `None` for the root and for detached nodes.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in document order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Document-order position, if a numbering pass has covered this node.
    #[must_use]
    pub const fn position(&self) -> Option<usize> {
        self.position
    }

    /// The kind of this node.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    /// The value string (see [`NodeData::value`]).
    #[must_use]
    pub fn value(&self) -> &str {
        self.data.value()
    }
}

/// Arena-based tree with O(1) node access.
///
/// Slot 0 always holds the root. Removed nodes leave an empty slot that the
/// next [`Tree::alloc`] reuses, so a streaming consumer that frees each closed
/// subtree keeps the arena bounded by the deepest open path.
#[derive(Debug, Clone)]
pub struct Tree {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    live: usize,
}

impl Tree {
    /// Create a tree holding only the root node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: vec![Some(Node::new(NodeData::Root))],
            free: Vec::new(),
            live: 1,
        }
    }

    /// The root node ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// Get a mutable reference to a node by its ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Number of nodes currently alive, root included.
    #[must_use]
    pub const fn live_count(&self) -> usize {
        self.live
    }

    /// Number of arena slots ever allocated (live or free).
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Allocate a new detached node and return its ID.
    pub fn alloc(&mut self, data: NodeData) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            self.slots[index] = Some(Node::new(data));
            return NodeId(index);
        }
        self.slots.push(Some(Node::new(data)));
        NodeId(self.slots.len() - 1)
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// A child that is still attached elsewhere is detached first. Unknown
    /// IDs are ignored, as are the root and any ancestor of `parent`, which
    /// would make a cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child
            || child == NodeId::ROOT
            || self.get(parent).is_none()
            || self.get(child).is_none()
            || self.is_descendant_of(parent, child)
        {
            return;
        }
        self.detach(child);
        if let Some(node) = self.get_mut(parent) {
            node.children.push(child);
        }
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
    }

    /// Unlink `id` from its parent, leaving the subtree itself intact.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(node) = self.get_mut(parent) {
            node.children.retain(|&c| c != id);
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = None;
        }
    }

    /// Remove `id` and all of its descendants, freeing their slots.
    ///
    /// Removing the root only removes its children; the root itself stays.
    /// Returns the number of nodes freed.
    pub fn remove_subtree(&mut self, id: NodeId) -> usize {
        if id == NodeId::ROOT {
            let children = self.children(id).to_vec();
            return children.into_iter().map(|c| self.remove_subtree(c)).sum();
        }
        self.detach(id);
        let mut freed = 0;
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            let Some(node) = self.slots.get_mut(next.0).and_then(Option::take) else {
                continue;
            };
            pending.extend(node.children);
            self.free.push(next.0);
            self.live -= 1;
            freed += 1;
        }
        freed
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Get the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.first().copied())
    }

    /// Get the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.last().copied())
    }

    /// Get the kind of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get(id).map(Node::kind)
    }

    /// Get the value string of a node.
    #[must_use]
    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(Node::value)
    }

    /// Get element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get mutable element data if this node is an element.
    pub fn as_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(|n| match &mut n.data {
            NodeData::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Look up an attribute of an element as an attribute node.
    ///
    /// The lookup is case-insensitive.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<AttributeNode<'_>> {
        let entry = self.as_element(id)?.attributes.entry(name)?;
        Some(AttributeNode::new(self, id, &entry.name))
    }

    /// All attributes of an element as attribute nodes, in first-seen order.
    pub fn attribute_nodes(&self, id: NodeId) -> impl Iterator<Item = AttributeNode<'_>> + '_ {
        self.as_element(id)
            .into_iter()
            .flat_map(|e| e.attributes.iter())
            .map(move |a| AttributeNode::new(self, id, &a.name))
    }

    /// Check if `descendant` is a descendant of `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, descendant: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(descendant).any(|id| id == ancestor)
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Iterate over `id` and its descendants in pre-order (document order).
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> DescendantIterator<'_> {
        let pending = if self.get(id).is_some() { vec![id] } else { Vec::new() };
        DescendantIterator {
            tree: self,
            pending,
        }
    }

    /// Number each node of the subtree at `id` in pre-order, starting at `base`.
    ///
    /// Returns the first unused position, so consecutive subtrees can be
    /// numbered without overlap.
    pub fn assign_positions(&mut self, id: NodeId, base: usize) -> usize {
        let order: Vec<NodeId> = self.descendants(id).collect();
        let mut next = base;
        for node_id in order {
            if let Some(node) = self.get_mut(node_id) {
                node.position = Some(next);
                next += 1;
            }
        }
        next
    }

    /// Document-order position of a node, if numbered.
    #[must_use]
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.get(id).and_then(Node::position)
    }

    /// Compare two nodes by their assigned positions.
    ///
    /// `None` unless both nodes have been numbered by [`Tree::assign_positions`].
    #[must_use]
    pub fn document_order(&self, a: NodeId, b: NodeId) -> Option<Ordering> {
        Some(self.position(a)?.cmp(&self.position(b)?))
    }

    /// Concatenated character data of the subtree at `id`.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .filter_map(|n| match self.get(n).map(|node| &node.data) {
                Some(NodeData::Data(text)) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'a> {
    tree: &'a Tree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}

/// Pre-order iterator over a subtree.
pub struct DescendantIterator<'a> {
    tree: &'a Tree,
    pending: Vec<NodeId>,
}

impl Iterator for DescendantIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.pending.pop()?;
        self.pending
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
