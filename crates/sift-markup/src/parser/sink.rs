//! Consumers of nesting events.
//!
//! [`TreeBuilder`] applies events to a persistent tree. [`StreamSink`]
//! applies them to a working tree, forwards the rendered tokens to a
//! [`TokenReceiver`] and removes every node as soon as it has been
//! forwarded, so only the currently open path stays in memory.

use sift_dom::{NodeData, NodeId, Tree};

use crate::error::ParseError;
use crate::grammar::Grammar;
use crate::receiver::TokenReceiver;
use crate::serialize::{empty_element, end_tag, leaf_text, start_tag};

use super::nesting::Event;

/// Applies nesting events.
pub trait EventSink {
    /// Apply one event.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Io`] when forwarding a token fails.
    fn apply(&mut self, event: Event, grammar: &dyn Grammar) -> Result<(), ParseError>;

    /// Called once after the last event.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Io`] when closing the output fails.
    fn finish(&mut self) -> Result<(), ParseError>;

    /// The node new content is appended to.
    fn cursor(&self) -> NodeId;

    /// The tree as built so far.
    fn tree(&self) -> &Tree;
}

/// What applying an event did to the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applied {
    Opened(NodeId),
    Inserted(NodeId),
    Closed(NodeId),
}

/// Builds a persistent tree.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    tree: Tree,
    cursor: NodeId,
}

impl TreeBuilder {
    /// Start from an empty tree with the cursor at the root.
    #[must_use]
    pub fn new() -> Self {
        let tree = Tree::new();
        let cursor = tree.root();
        Self { tree, cursor }
    }

    /// Take the tree.
    #[must_use]
    pub fn into_tree(self) -> Tree {
        self.tree
    }

    fn insert(&mut self, event: Event) -> Applied {
        match event {
            Event::Open { element, singular } => {
                let id = self.tree.alloc(NodeData::Element(element));
                self.tree.append_child(self.cursor, id);
                if singular {
                    Applied::Inserted(id)
                } else {
                    self.cursor = id;
                    Applied::Opened(id)
                }
            }
            Event::Close { .. } => {
                let closed = self.cursor;
                self.cursor = self.tree.parent(closed).unwrap_or_else(|| self.tree.root());
                Applied::Closed(closed)
            }
            Event::Leaf(data) => {
                let id = self.tree.alloc(data);
                self.tree.append_child(self.cursor, id);
                Applied::Inserted(id)
            }
        }
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for TreeBuilder {
    fn apply(&mut self, event: Event, _grammar: &dyn Grammar) -> Result<(), ParseError> {
        let _ = self.insert(event);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ParseError> {
        Ok(())
    }

    fn cursor(&self) -> NodeId {
        self.cursor
    }

    fn tree(&self) -> &Tree {
        &self.tree
    }
}

/// Forwards tokens to a receiver and frees each node once forwarded.
///
/// A start tag is held back until the next event shows whether its element
/// gets children, so that childless elements render the same way
/// [`tree_to_tokens`](crate::serialize::tree_to_tokens) renders them.
pub struct StreamSink<R> {
    builder: TreeBuilder,
    receiver: R,
    pending: Option<NodeId>,
    depth: usize,
}

impl<R: TokenReceiver> StreamSink<R> {
    /// Wrap a receiver.
    #[must_use]
    pub fn new(receiver: R) -> Self {
        Self {
            builder: TreeBuilder::new(),
            receiver,
            pending: None,
            depth: 0,
        }
    }

    /// The receiver.
    #[must_use]
    pub const fn receiver(&self) -> &R {
        &self.receiver
    }

    /// Take the receiver.
    #[must_use]
    pub fn into_receiver(self) -> R {
        self.receiver
    }

    /// Forward the held-back start tag, if any. It sits one level above
    /// the current depth.
    fn flush_pending(&mut self, grammar: &dyn Grammar) -> Result<(), ParseError> {
        let Some(id) = self.pending.take() else {
            return Ok(());
        };
        if let Some(element) = self.builder.tree.as_element(id) {
            let text = start_tag(element, grammar);
            self.receiver.store_token(&text, self.depth - 1)?;
        }
        Ok(())
    }

    fn forward_node(&mut self, id: NodeId, grammar: &dyn Grammar) -> Result<(), ParseError> {
        let Some(node) = self.builder.tree.get(id) else {
            return Ok(());
        };
        if let NodeData::Element(element) = &node.data {
            let (first, end) = empty_element(element, grammar);
            self.receiver.store_token(&first, self.depth)?;
            if let Some(end) = end {
                self.receiver.store_token(&end, self.depth)?;
            }
        } else if let Some(text) = leaf_text(&node.data, grammar) {
            self.receiver.store_token(&text, self.depth)?;
        }
        Ok(())
    }

    fn release(&mut self, id: NodeId) {
        if id != self.builder.tree.root() {
            let _ = self.builder.tree.remove_subtree(id);
        }
    }
}

impl<R: TokenReceiver> EventSink for StreamSink<R> {
    fn apply(&mut self, event: Event, grammar: &dyn Grammar) -> Result<(), ParseError> {
        match self.builder.insert(event) {
            Applied::Opened(id) => {
                self.flush_pending(grammar)?;
                self.pending = Some(id);
                self.depth += 1;
            }
            Applied::Inserted(id) => {
                self.flush_pending(grammar)?;
                self.forward_node(id, grammar)?;
                self.release(id);
            }
            Applied::Closed(id) => {
                if self.pending == Some(id) {
                    self.pending = None;
                    self.depth -= 1;
                    self.forward_node(id, grammar)?;
                } else {
                    self.flush_pending(grammar)?;
                    self.depth = self.depth.saturating_sub(1);
                    if let Some(element) = self.builder.tree.as_element(id) {
                        let text = end_tag(&element.type_name, grammar);
                        self.receiver.store_token(&text, self.depth)?;
                    }
                }
                self.release(id);
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ParseError> {
        self.receiver.close()?;
        Ok(())
    }

    fn cursor(&self) -> NodeId {
        self.builder.cursor
    }

    fn tree(&self) -> &Tree {
        &self.builder.tree
    }
}
