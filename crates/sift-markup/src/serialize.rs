//! Tree serialization: back to markup text, or to a token stream.
//!
//! Both forms render the same tokens. An element with children becomes a
//! start tag, its children and an end tag. A childless element becomes a
//! genuine singular tag under a strict-XML grammar, a lone tag when the
//! grammar treats the rendered start tag as singular, and a start/end pair
//! otherwise. Data is escaped; comments, DTD fragments and processing
//! instructions are written verbatim.

use std::fmt;
use std::io;

use sift_dom::{ElementData, NodeData, NodeId, Tree};

use crate::grammar::Grammar;
use crate::receiver::TokenReceiver;

/// Render the start tag of an element.
#[must_use]
pub fn start_tag(element: &ElementData, grammar: &dyn Grammar) -> String {
    let mut out = String::new();
    out.push(grammar.tag_start());
    out.push_str(&element.type_name);
    for attribute in &element.attributes {
        out.push(' ');
        out.push_str(&attribute.name);
        out.push(grammar.value_separator());
        out.push('"');
        out.push_str(&grammar.escape(&attribute.value));
        out.push('"');
    }
    out.push(grammar.tag_end());
    out
}

/// Render the end tag for an element type.
#[must_use]
pub fn end_tag(type_name: &str, grammar: &dyn Grammar) -> String {
    let mut out = String::with_capacity(type_name.len() + 3);
    out.push(grammar.tag_start());
    out.push(grammar.end_marker());
    out.push_str(type_name);
    out.push(grammar.tag_end());
    out
}

/// Render a childless element: one token, or a start/end pair.
#[must_use]
pub fn empty_element(element: &ElementData, grammar: &dyn Grammar) -> (String, Option<String>) {
    let start = start_tag(element, grammar);
    if grammar.is_strict_xml() {
        let mut singular = start;
        let _ = singular.pop();
        singular.push(grammar.end_marker());
        singular.push(grammar.tag_end());
        return (singular, None);
    }
    if grammar.is_singular_tag(&start) {
        return (start, None);
    }
    (start, Some(end_tag(&element.type_name, grammar)))
}

/// Render a leaf node. `None` for the root and for elements.
#[must_use]
pub fn leaf_text(data: &NodeData, grammar: &dyn Grammar) -> Option<String> {
    match data {
        NodeData::Data(text) => Some(grammar.escape(text)),
        NodeData::Comment(text) | NodeData::Dtd(text) | NodeData::ProcessingInstruction(text) => {
            Some(text.clone())
        }
        NodeData::Root | NodeData::Element(_) => None,
    }
}

enum Visit {
    Enter(NodeId, usize),
    Exit(NodeId, usize),
}

/// Walk the subtree at `id` in document order, passing each rendered token
/// and its depth to `emit`. The root's children are at depth 0; any other
/// starting node is itself at depth 0.
fn walk<E>(
    tree: &Tree,
    id: NodeId,
    grammar: &dyn Grammar,
    emit: &mut dyn FnMut(&str, usize) -> Result<(), E>,
) -> Result<(), E> {
    let mut stack = Vec::new();
    if id == tree.root() {
        stack.extend(tree.children(id).iter().rev().map(|&child| Visit::Enter(child, 0)));
    } else {
        stack.push(Visit::Enter(id, 0));
    }

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(node, depth) => {
                let Some(data) = tree.get(node).map(|n| &n.data) else {
                    continue;
                };
                let NodeData::Element(element) = data else {
                    if let Some(text) = leaf_text(data, grammar) {
                        emit(&text, depth)?;
                    }
                    continue;
                };
                let children = tree.children(node);
                if children.is_empty() {
                    let (first, end) = empty_element(element, grammar);
                    emit(&first, depth)?;
                    if let Some(end) = end {
                        emit(&end, depth)?;
                    }
                    continue;
                }
                emit(&start_tag(element, grammar), depth)?;
                stack.push(Visit::Exit(node, depth));
                stack.extend(children.iter().rev().map(|&child| Visit::Enter(child, depth + 1)));
            }
            Visit::Exit(node, depth) => {
                if let Some(element) = tree.as_element(node) {
                    emit(&end_tag(&element.type_name, grammar), depth)?;
                }
            }
        }
    }
    Ok(())
}

/// Forward the subtree at `id` to a receiver, token by token.
///
/// This produces the same tokens, at the same depths, as a streaming parse
/// of the input the tree was built from.
///
/// # Errors
///
/// Returns the receiver's error.
pub fn tree_to_tokens(
    tree: &Tree,
    id: NodeId,
    grammar: &dyn Grammar,
    receiver: &mut dyn TokenReceiver,
) -> io::Result<()> {
    walk(tree, id, grammar, &mut |text, depth| receiver.store_token(text, depth))
}

/// Write the subtree at `id` as markup.
///
/// With `indent`, each token goes on its own line indented by the grammar's
/// standard indent per level, and whitespace-only data is left out.
///
/// # Errors
///
/// Returns the writer's error.
pub fn tree_to_code<W: fmt::Write + ?Sized>(
    tree: &Tree,
    id: NodeId,
    grammar: &dyn Grammar,
    indent: bool,
    out: &mut W,
) -> fmt::Result {
    if !indent {
        return walk(tree, id, grammar, &mut |text, _| out.write_str(text));
    }
    let unit = grammar.standard_indent();
    let mut first = true;
    walk(tree, id, grammar, &mut |text, depth| {
        if text.trim().is_empty() {
            return Ok(());
        }
        if !first {
            out.write_char('\n')?;
        }
        first = false;
        for _ in 0..depth {
            out.write_str(unit)?;
        }
        out.write_str(text)
    })
}

/// Render the subtree at `id` as a markup string.
#[must_use]
pub fn to_code(tree: &Tree, id: NodeId, grammar: &dyn Grammar, indent: bool) -> String {
    let mut out = String::new();
    let _ = tree_to_code(tree, id, grammar, indent, &mut out);
    out
}
