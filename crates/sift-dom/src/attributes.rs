//! Case-insensitive, insertion-ordered attribute storage.

use std::collections::HashMap;

use crate::{NodeId, NodeKind, Tree};

/// A single attribute with its name in original case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Name as first written in the source.
    pub name: String,
    /// Unescaped value.
    pub value: String,
}

/// Attribute map keyed case-insensitively.
///
/// Iteration follows first-seen insertion order. Replacing a value keeps the
/// original position and the original-case name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSet {
    entries: Vec<Attribute>,
    index: HashMap<String, usize>,
}

impl AttributeSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(name: &str) -> String {
        name.to_lowercase()
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set holds no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or replace an attribute, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        let key = Self::key(&name);
        if let Some(&i) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.entries[i].value, value));
        }
        let _ = self.index.insert(key, self.entries.len());
        self.entries.push(Attribute { name, value });
        None
    }

    /// Insert only if no attribute with this name exists yet.
    ///
    /// Returns `true` when the attribute was added.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        let _ = self.insert(name, value);
        true
    }

    /// Value of the attribute `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entry(name).map(|a| a.value.as_str())
    }

    /// The stored entry for `name`, original-case name included.
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&Attribute> {
        self.index.get(&Self::key(name)).map(|&i| &self.entries[i])
    }

    /// Whether an attribute named `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&Self::key(name))
    }

    /// Remove an attribute, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let i = self.index.remove(&Self::key(name))?;
        let removed = self.entries.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(removed.value)
    }

    /// Iterate in first-seen order.
    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a AttributeSet {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for AttributeSet {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut set = Self::new();
        for (name, value) in iter {
            let _ = set.insert(name, value);
        }
        set
    }
}

/// Read-only attribute view: a name plus the element that owns it.
///
/// Holds no value of its own; [`AttributeNode::value`] reads through to the
/// element every time.
#[derive(Debug, Clone, Copy)]
pub struct AttributeNode<'t> {
    tree: &'t Tree,
    element: NodeId,
    name: &'t str,
}

impl<'t> AttributeNode<'t> {
    pub(crate) const fn new(tree: &'t Tree, element: NodeId, name: &'t str) -> Self {
        Self {
            tree,
            element,
            name,
        }
    }

    /// Always [`NodeKind::Attribute`].
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        NodeKind::Attribute
    }

    /// Attribute name in original case.
    #[must_use]
    pub const fn name(&self) -> &'t str {
        self.name
    }

    /// The owning element.
    #[must_use]
    pub const fn parent(&self) -> NodeId {
        self.element
    }

    /// Current value, looked up on the owning element.
    #[must_use]
    pub fn value(&self) -> Option<&'t str> {
        self.tree
            .as_element(self.element)
            .and_then(|e| e.attributes.get(self.name))
    }
}
