//! Integration tests for the parser: nesting correction, strict failures and
//! the step API.

use std::time::{Duration, Instant};

use sift_dom::{NodeData, NodeId, NodeKind, Tree};
use sift_markup::{
    Correction, CorrectionKind, GrammarOptions, HtmlGrammar, ParseError, Parser, ParserInstance,
    Step, Tokenizer, XmlGrammar, format_tree, to_code,
};

/// Helper for a correcting HTML grammar.
fn html() -> HtmlGrammar {
    HtmlGrammar::default()
}

/// Helper for an HTML grammar with error correction off.
fn strict_html() -> HtmlGrammar {
    HtmlGrammar::new(GrammarOptions::html().with_correct_errors(false))
}

/// Helper to parse with corrections.
fn parse(grammar: &HtmlGrammar, input: &str) -> (Tree, Vec<Correction>) {
    Parser::new(grammar)
        .parse_str_with_corrections(input)
        .unwrap()
}

/// Helper to describe a subtree as `name(child,child)` with data quoted.
fn shape(tree: &Tree, id: NodeId) -> String {
    let children: Vec<String> = tree.children(id).iter().map(|&c| shape(tree, c)).collect();
    let label = match tree.get(id).map(|n| &n.data) {
        Some(NodeData::Element(e)) => e.type_name.clone(),
        Some(NodeData::Data(text)) => format!("{text:?}"),
        Some(NodeData::Root) => "#root".to_string(),
        Some(other) => other.kind().to_string(),
        None => "?".to_string(),
    };
    if children.is_empty() {
        label
    } else {
        format!("{label}({})", children.join(","))
    }
}

/// Helper to list correction kinds with their tags.
fn corrections(list: &[Correction]) -> Vec<(CorrectionKind, &str)> {
    list.iter().map(|c| (c.kind, c.tag.as_str())).collect()
}

// ========== scenarios ==========

#[test]
fn test_well_formed_input_needs_no_correction() {
    let (tree, fixes) = parse(&html(), "<a><b>x</b></a>");
    assert_eq!(shape(&tree, tree.root()), "#root(a(b(\"x\")))");
    assert!(fixes.is_empty());
}

#[test]
fn test_missing_end_tag_is_closed_implicitly() {
    let (tree, fixes) = parse(&html(), "<a><b>x</a>");
    assert_eq!(shape(&tree, tree.root()), "#root(a(b(\"x\")))");
    assert_eq!(corrections(&fixes), vec![(CorrectionKind::ImplicitClose, "b")]);
    assert_eq!(fixes[0].context.as_deref(), Some("a"));
    assert_eq!(fixes[0].offset, 7);
}

#[test]
fn test_missing_end_tag_fails_without_correction() {
    let err = Parser::new(&strict_html())
        .parse_str("<a><b>x</a>")
        .unwrap_err();
    match err {
        ParseError::MissingEndTag {
            tag,
            closed_by,
            offset,
        } => {
            assert_eq!(tag, "b");
            assert_eq!(closed_by.as_deref(), Some("a"));
            assert_eq!(offset, 7);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unmatched_end_tag_is_dropped() {
    let (tree, fixes) = parse(&html(), "<a></c>");
    assert_eq!(shape(&tree, tree.root()), "#root(a)");
    assert_eq!(
        corrections(&fixes),
        vec![
            (CorrectionKind::IgnoredEndTag, "c"),
            (CorrectionKind::UnclosedAtEnd, "a"),
        ]
    );
}

#[test]
fn test_unmatched_end_tag_fails_without_correction() {
    let err = Parser::new(&strict_html()).parse_str("<a></c>").unwrap_err();
    assert!(matches!(
        err,
        ParseError::UnexpectedEndTag { ref tag, open: Some(ref open), offset: 3 } if tag == "c" && open == "a"
    ));

    let err = Parser::new(&strict_html()).parse_str("</c>").unwrap_err();
    assert!(matches!(err, ParseError::UnexpectedEndTag { open: None, .. }));
    assert!(err.to_string().contains("end of input"));
}

#[test]
fn test_stray_quote_in_attribute_is_recovered() {
    let (tree, fixes) = parse(&html(), "<x title=\"a \"b\" c\">");
    let x = tree.first_child(tree.root()).unwrap();
    let element = tree.as_element(x).unwrap();
    assert_eq!(element.attributes.len(), 1);
    assert_eq!(element.attributes.get("title"), Some("a \"b\" c"));
    assert_eq!(fixes[0].kind, CorrectionKind::RecoveredAttributes);
}

#[test]
fn test_stray_quote_fails_without_correction() {
    let err = Parser::new(&strict_html())
        .parse_str("<x title=\"a \"b\" c\"></x>")
        .unwrap_err();
    assert!(matches!(
        err,
        ParseError::UnexpectedCharacter { found: '"', offset: 12, .. }
    ));
}

#[test]
fn test_long_unterminated_quotes_parse_as_data() {
    let input = "<a x=\"".repeat(8_500);
    let start = Instant::now();
    let (tree, corrections) = parse(&html(), &input);
    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(corrections.is_empty());
    let children = tree.children(tree.root());
    assert_eq!(children.len(), 1);
    assert_eq!(tree.kind(children[0]), Some(NodeKind::Data));
    assert_eq!(tree.value(children[0]), Some(input.as_str()));
}

// ========== grammar-driven nesting ==========

#[test]
fn test_list_items_close_each_other() {
    let (tree, fixes) = parse(&html(), "<ul><li>a<li>b</ul>");
    assert_eq!(shape(&tree, tree.root()), "#root(ul(li(\"a\"),li(\"b\")))");
    assert_eq!(
        corrections(&fixes),
        vec![
            (CorrectionKind::ImplicitClose, "li"),
            (CorrectionKind::ImplicitClose, "li"),
        ]
    );
    assert_eq!(fixes[0].context.as_deref(), Some("li"));
    assert_eq!(fixes[1].context.as_deref(), Some("ul"));
}

#[test]
fn test_block_closes_paragraph() {
    let (tree, _) = parse(&html(), "<p>one<div>two</div>");
    assert_eq!(shape(&tree, tree.root()), "#root(p(\"one\"),div(\"two\"))");
}

#[test]
fn test_table_cells() {
    let (tree, _) = parse(&html(), "<table><tr><td>1<td>2</table>");
    assert_eq!(
        shape(&tree, tree.root()),
        "#root(table(tr(td(\"1\"),td(\"2\"))))"
    );
}

#[test]
fn test_item_without_valid_parent_stays_put() {
    let (tree, fixes) = parse(&html(), "<div><li>x</li></div>");
    assert_eq!(shape(&tree, tree.root()), "#root(div(li(\"x\")))");
    assert!(fixes.is_empty());
}

#[test]
fn test_suppressed_end_tag_after_implicit_close() {
    let (tree, fixes) = parse(&html(), "<p>a<p>b</p></p>");
    assert_eq!(shape(&tree, tree.root()), "#root(p(\"a\"),p(\"b\"))");
    assert_eq!(
        corrections(&fixes),
        vec![
            (CorrectionKind::ImplicitClose, "p"),
            (CorrectionKind::SuppressedEndTag, "p"),
        ]
    );
}

#[test]
fn test_invalid_nesting_fails_without_correction() {
    let err = Parser::new(&strict_html())
        .parse_str("<p>a<div>b</div></p>")
        .unwrap_err();
    assert!(matches!(
        err,
        ParseError::InvalidNesting { ref tag, ref open, offset: 4 } if tag == "div" && open == "p"
    ));
}

#[test]
fn test_end_of_input_closes_open_tags() {
    let (tree, fixes) = parse(&html(), "<a><b>x");
    assert_eq!(shape(&tree, tree.root()), "#root(a(b(\"x\")))");
    assert_eq!(
        corrections(&fixes),
        vec![
            (CorrectionKind::UnclosedAtEnd, "b"),
            (CorrectionKind::UnclosedAtEnd, "a"),
        ]
    );

    let err = Parser::new(&strict_html()).parse_str("<a><b>x").unwrap_err();
    assert!(matches!(
        err,
        ParseError::MissingEndTag { ref tag, closed_by: None, offset: 7 } if tag == "b"
    ));
}

#[test]
fn test_end_tags_match_case_insensitively() {
    let grammar = XmlGrammar::new(GrammarOptions::xml().with_correct_errors(true));
    let (tree, fixes) = Parser::new(&grammar)
        .parse_str_with_corrections("<Item>x</ITEM>")
        .unwrap();
    assert_eq!(shape(&tree, tree.root()), "#root(Item(\"x\"))");
    assert!(fixes.is_empty());
}

// ========== leaves and values ==========

#[test]
fn test_leaf_kinds() {
    let (tree, _) = parse(
        &html(),
        "<!DOCTYPE html><?xml version=\"1.0\"?><!-- c --><p>a &amp; b &#x41;</p>",
    );
    let kinds: Vec<NodeKind> = tree
        .children(tree.root())
        .iter()
        .filter_map(|&id| tree.kind(id))
        .collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::Dtd,
            NodeKind::ProcessingInstruction,
            NodeKind::Comment,
            NodeKind::Element,
        ]
    );
    let comment = tree.children(tree.root())[2];
    assert_eq!(tree.value(comment), Some("<!-- c -->"));
    let p = tree.children(tree.root())[3];
    assert_eq!(tree.text_content(p), "a & b A");
}

#[test]
fn test_singular_tags_do_not_nest() {
    let (tree, fixes) = parse(&html(), "<p>a<br>b<img src=x.png/>c</p>");
    assert_eq!(
        shape(&tree, tree.root()),
        "#root(p(\"a\",br,\"b\",img,\"c\"))"
    );
    assert!(fixes.is_empty());

    let xml = XmlGrammar::default();
    let tree = Parser::new(&xml)
        .parse_str("<r><i/><i a=\"1\"></i></r>")
        .unwrap();
    assert_eq!(shape(&tree, tree.root()), "#root(r(i,i))");
}

#[test]
fn test_raw_text_element_content_is_data() {
    let (tree, _) = parse(&html(), "<script>if (a<b) x();</script>");
    assert_eq!(shape(&tree, tree.root()), "#root(script(\"if (a<b) x();\"))");
}

#[test]
fn test_attribute_projection() {
    let (tree, _) = parse(&html(), "<a HREF=\"x\" id=y>t</a>");
    let a = tree.first_child(tree.root()).unwrap();
    let attribute = tree.attribute(a, "href").unwrap();
    assert_eq!(attribute.kind(), NodeKind::Attribute);
    assert_eq!(attribute.name(), "HREF");
    assert_eq!(attribute.value(), Some("x"));
    assert_eq!(attribute.parent(), a);
    assert_eq!(tree.attribute_nodes(a).count(), 2);
}

// ========== step API ==========

#[test]
fn test_step_by_step_with_incremental_input() {
    let grammar = html();
    let mut instance = ParserInstance::building(&grammar, Tokenizer::new(&grammar));
    instance.source_mut().push_str("<a><b>");
    assert_eq!(instance.step().unwrap(), Step::Consumed(sift_markup::TokenKind::StartTag));
    assert_eq!(instance.run().unwrap(), Step::Pending);
    assert_eq!(instance.open_tags(), ["a".to_string(), "b".to_string()]);
    assert!(!instance.is_finished());

    instance.source_mut().push_str("x</b></a>");
    instance.source_mut().end_input();
    assert_eq!(instance.run().unwrap(), Step::Finished);
    assert_eq!(instance.step().unwrap(), Step::Finished);
    assert!(instance.open_tags().is_empty());
    assert_eq!(instance.current_node(), NodeId::ROOT);

    let tree = instance.into_tree().unwrap();
    assert_eq!(shape(&tree, tree.root()), "#root(a(b(\"x\")))");
}

#[test]
fn test_unfinished_parse_has_no_tree() {
    let grammar = html();
    let mut instance = ParserInstance::building(&grammar, Tokenizer::new(&grammar));
    instance.source_mut().push_str("<a>");
    assert_eq!(instance.run().unwrap(), Step::Pending);
    assert!(instance.into_tree().is_none());
}

#[test]
fn test_partial_tree_survives_failure() {
    let grammar = strict_html();
    let mut instance =
        ParserInstance::building(&grammar, Tokenizer::with_input(&grammar, "<a><b>x</a>tail"));
    assert!(instance.run().is_err());
    assert_eq!(shape(instance.tree(), NodeId::ROOT), "#root(a(b(\"x\")))");
    assert_eq!(instance.open_tags(), ["a".to_string(), "b".to_string()]);
}

#[test]
fn test_conclude_closes_early() {
    let grammar = html();
    let mut instance = ParserInstance::building(&grammar, Tokenizer::new(&grammar));
    instance.source_mut().push_str("<a><b>y</b>x");
    assert_eq!(instance.run().unwrap(), Step::Pending);
    instance.conclude().unwrap();
    assert!(instance.is_finished());
    assert_eq!(
        corrections(instance.corrections()),
        vec![(CorrectionKind::UnclosedAtEnd, "a")]
    );
    let tree = instance.into_tree().unwrap();
    assert_eq!(shape(&tree, tree.root()), "#root(a(b(\"y\")))");
}

// ========== output ==========

#[test]
fn test_corrected_output() {
    let grammar = html();
    let (tree, _) = parse(&grammar, "<ul><li>a &amp; b<li title='say \"hi\"'>c</ul><br/>");
    assert_eq!(
        to_code(&tree, tree.root(), &grammar, false),
        "<ul><li>a &amp; b</li><li title=\"say &quot;hi&quot;\">c</li></ul><br>"
    );
}

#[test]
fn test_parse_reader() {
    let grammar = html();
    let input = "<div>\n<p>one\n<p>two\n</div>\n";
    let tree = Parser::new(&grammar)
        .parse_reader(std::io::Cursor::new(input))
        .unwrap();
    assert_eq!(
        format_tree(&tree, tree.root()),
        format_tree(&Parser::new(&grammar).parse_str(input).unwrap(), NodeId::ROOT)
    );
}
