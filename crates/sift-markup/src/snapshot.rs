//! Owned, serializable copies of a subtree.
//!
//! Snapshots compare by kind, value, attributes and child order, which is
//! the notion of tree equality used by the round-trip and streaming checks,
//! and they serialize to JSON for the command-line tool.

use serde::Serialize;
use sift_dom::{NodeData, NodeId, Tree};

/// One attribute of a snapshotted element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeSnapshot {
    /// Name in original case.
    pub name: String,
    /// Unescaped value.
    pub value: String,
}

/// A node and its descendants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSnapshot {
    /// Node kind, as displayed by [`sift_dom::NodeKind`].
    pub kind: String,
    /// Element type name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Value of data, comment, DTD and processing-instruction nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Element attributes in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeSnapshot>,
    /// Children in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    /// A copy with whitespace-only data nodes removed at every level.
    #[must_use]
    pub fn without_blank_data(&self) -> Self {
        Self {
            children: self
                .children
                .iter()
                .filter(|child| {
                    !(child.kind == "data" && child.value.as_deref().is_some_and(|v| v.trim().is_empty()))
                })
                .map(Self::without_blank_data)
                .collect(),
            ..self.clone()
        }
    }
}

/// Snapshot the subtree at `id`. Unknown IDs give an empty root snapshot.
#[must_use]
pub fn snapshot(tree: &Tree, id: NodeId) -> NodeSnapshot {
    let Some(node) = tree.get(id) else {
        return NodeSnapshot {
            kind: "root".to_string(),
            name: None,
            value: None,
            attributes: Vec::new(),
            children: Vec::new(),
        };
    };
    let (name, value, attributes) = match &node.data {
        NodeData::Root => (None, None, Vec::new()),
        NodeData::Element(element) => (
            Some(element.type_name.clone()),
            None,
            element
                .attributes
                .iter()
                .map(|a| AttributeSnapshot {
                    name: a.name.clone(),
                    value: a.value.clone(),
                })
                .collect(),
        ),
        other => (None, Some(other.value().to_string()), Vec::new()),
    };
    NodeSnapshot {
        kind: node.data.kind().to_string(),
        name,
        value,
        attributes,
        children: tree
            .children(id)
            .iter()
            .map(|&child| snapshot(tree, child))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::grammar::HtmlGrammar;
    use crate::parser::Parser;

    use super::*;

    #[test]
    fn test_snapshot_json_skips_empty_fields() {
        let grammar = HtmlGrammar::default();
        let tree = Parser::new(&grammar).parse_str("<a href=\"x\">t</a>").unwrap();
        let value = serde_json::to_value(snapshot(&tree, tree.root())).unwrap();
        assert_eq!(
            value,
            json!({
                "kind": "root",
                "children": [{
                    "kind": "element",
                    "name": "a",
                    "attributes": [{ "name": "href", "value": "x" }],
                    "children": [{ "kind": "data", "value": "t" }]
                }]
            })
        );
    }

    #[test]
    fn test_without_blank_data() {
        let grammar = HtmlGrammar::default();
        let tree = Parser::new(&grammar).parse_str("<a>\n  <b>x</b>\n</a>").unwrap();
        let trimmed = snapshot(&tree, tree.root()).without_blank_data();
        assert_eq!(trimmed.children[0].children.len(), 1);
        assert_eq!(trimmed.children[0].children[0].name.as_deref(), Some("b"));
    }
}
