//! Human-readable tree dumps.

use std::fmt::Write;

use sift_dom::{NodeData, NodeId, Tree};

/// Render the subtree at `id`, one node per line, two spaces per level.
///
/// Elements show their attributes inline; whitespace in data is made
/// visible.
#[must_use]
pub fn format_tree(tree: &Tree, id: NodeId) -> String {
    let mut out = String::new();
    write_node(tree, id, 0, &mut out);
    out
}

/// Print the subtree at `id` to stdout.
pub fn print_tree(tree: &Tree, id: NodeId) {
    print!("{}", format_tree(tree, id));
}

fn write_node(tree: &Tree, id: NodeId, indent: usize, out: &mut String) {
    let Some(node) = tree.get(id) else {
        return;
    };
    let prefix = "  ".repeat(indent);
    let _ = match &node.data {
        NodeData::Root => writeln!(out, "{prefix}Root"),
        NodeData::Element(data) => {
            if data.attributes.is_empty() {
                writeln!(out, "{prefix}<{}>", data.type_name)
            } else {
                let attrs: Vec<String> = data
                    .attributes
                    .iter()
                    .map(|a| format!("{}=\"{}\"", a.name, a.value))
                    .collect();
                writeln!(out, "{prefix}<{} {}>", data.type_name, attrs.join(" "))
            }
        }
        NodeData::Data(text) => {
            let display = text
                .replace('\n', "\\n")
                .replace('\t', "\\t")
                .replace(' ', "\u{00B7}");
            writeln!(out, "{prefix}\"{display}\"")
        }
        NodeData::Comment(text) | NodeData::Dtd(text) | NodeData::ProcessingInstruction(text) => {
            writeln!(out, "{prefix}{text}")
        }
    };
    for &child in tree.children(id) {
        write_node(tree, child, indent + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use sift_dom::{AttributeSet, ElementData};

    use super::*;

    #[test]
    fn test_format_tree() {
        let mut tree = Tree::new();
        let attributes: AttributeSet = [("id", "x")].into_iter().collect();
        let div = tree.alloc(NodeData::Element(ElementData::with_attributes("div", attributes)));
        tree.append_child(tree.root(), div);
        let text = tree.alloc(NodeData::Data("a b\n".to_string()));
        tree.append_child(div, text);
        let comment = tree.alloc(NodeData::Comment("<!-- c -->".to_string()));
        tree.append_child(tree.root(), comment);

        assert_eq!(
            format_tree(&tree, tree.root()),
            "Root\n  <div id=\"x\">\n    \"a\u{00B7}b\\n\"\n  <!-- c -->\n"
        );
    }
}
