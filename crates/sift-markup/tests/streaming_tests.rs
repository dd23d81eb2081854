//! Integration tests for streaming mode: token equivalence with tree mode,
//! bounded memory and writer output.

use std::io::Cursor;

use sift_markup::{
    CollectingReceiver, Grammar, GrammarOptions, HtmlGrammar, ParseError, Parser, ParserInstance,
    Step, Tokenizer, WriterReceiver, XmlGrammar, to_code, tree_to_tokens,
};

/// Helper to collect the tokens a streaming parse forwards.
fn stream(grammar: &dyn Grammar, input: &str) -> Vec<(String, usize)> {
    let receiver = Parser::new(grammar)
        .stream_str(input, CollectingReceiver::new())
        .unwrap();
    assert!(receiver.is_closed());
    receiver.tokens
}

/// Helper to collect the tokens of the tree built from the same input.
fn tree_tokens(grammar: &dyn Grammar, input: &str) -> Vec<(String, usize)> {
    let tree = Parser::new(grammar).parse_str(input).unwrap();
    let mut receiver = CollectingReceiver::new();
    tree_to_tokens(&tree, tree.root(), grammar, &mut receiver).unwrap();
    receiver.tokens
}

/// Inputs covering corrections, leaves, raw text and empty elements.
const SAMPLES: &[&str] = &[
    "",
    "plain text",
    "<a><b>x</b></a>",
    "<a><b>x</a>",
    "<a></c>tail",
    "<ul><li>one<li>two &amp; three</ul>",
    "<table><tr><td>1<td>2<tr><td>3</table>",
    "<p>para<div>block</div><p>again",
    "<!DOCTYPE html>\n<html><head><title>a < b</title></head><body><br><img src=x></body></html>",
    "<div><span></span><em/></div><!-- end --><?pi data?>",
    "<x title=\"a \"b\" c\">y</x>",
    "<p>a<p>b</p></p>",
];

// ========== equivalence ==========

#[test]
fn test_stream_matches_tree_tokens() {
    let grammar = HtmlGrammar::default();
    for input in SAMPLES {
        assert_eq!(stream(&grammar, input), tree_tokens(&grammar, input), "input {input:?}");
    }
}

#[test]
fn test_stream_matches_tree_tokens_for_xml() {
    let grammar = XmlGrammar::default();
    let input = "<?xml version=\"1.0\"?><r><empty></empty><i a=\"1\"/><t>x &lt; y</t></r>";
    let tokens = stream(&grammar, input);
    assert_eq!(tokens, tree_tokens(&grammar, input));
    assert_eq!(
        tokens,
        vec![
            ("<?xml version=\"1.0\"?>".to_string(), 0),
            ("<r>".to_string(), 0),
            ("<empty/>".to_string(), 1),
            ("<i a=\"1\"/>".to_string(), 1),
            ("<t>".to_string(), 1),
            ("x &lt; y".to_string(), 2),
            ("</t>".to_string(), 1),
            ("</r>".to_string(), 0),
        ]
    );
}

#[test]
fn test_stream_from_reader() {
    let grammar = HtmlGrammar::default();
    let input = "<ul>\n<li>one\n<li>two\n</ul>\n";
    let receiver = Parser::new(&grammar)
        .stream_reader(Cursor::new(input), CollectingReceiver::new())
        .unwrap();
    assert_eq!(receiver.tokens, tree_tokens(&grammar, input));
}

#[test]
fn test_streamed_tags_are_rendered_from_the_tree() {
    let grammar = HtmlGrammar::default();
    assert_eq!(
        stream(&grammar, "<A HREF=x>t &amp; u</A>"),
        vec![
            ("<a HREF=\"x\">".to_string(), 0),
            ("t &amp; u".to_string(), 1),
            ("</a>".to_string(), 0),
        ]
    );
}

// ========== memory ==========

#[test]
fn test_memory_stays_bounded() {
    let grammar = HtmlGrammar::default();
    let mut input = String::from("<ul>");
    for i in 0..5000 {
        input.push_str(&format!("<li>item {i} <b>bold</b><br>"));
    }
    input.push_str("</ul>");

    let mut instance = ParserInstance::streaming(
        &grammar,
        Tokenizer::with_input(&grammar, &input),
        CollectingReceiver::new(),
    );
    let mut peak = 0;
    loop {
        let step = instance.step().unwrap();
        peak = peak.max(instance.live_nodes());
        if step == Step::Finished {
            break;
        }
    }
    assert!(peak <= 5, "peak of {peak} live nodes");
    assert_eq!(instance.live_nodes(), 1);
    assert_eq!(instance.into_receiver().tokens.len(), 5000 * 7 + 2);
}

#[test]
fn test_pending_start_tag_is_forwarded_with_first_child() {
    let grammar = HtmlGrammar::default();
    let mut instance =
        ParserInstance::streaming(&grammar, Tokenizer::new(&grammar), CollectingReceiver::new());
    instance.source_mut().push_str("<div><p>");
    assert_eq!(instance.run().unwrap(), Step::Pending);
    assert_eq!(instance.receiver().tokens, vec![("<div>".to_string(), 0)]);

    instance.source_mut().push_str("x</p></div>");
    instance.source_mut().end_input();
    assert_eq!(instance.run().unwrap(), Step::Finished);
    assert_eq!(instance.receiver().concat(), "<div><p>x</p></div>");
}

// ========== writer output ==========

#[test]
fn test_writer_output_matches_code() {
    let grammar = HtmlGrammar::default();
    for input in SAMPLES {
        let tree = Parser::new(&grammar).parse_str(input).unwrap();

        let plain = Parser::new(&grammar)
            .stream_str(input, WriterReceiver::new(Vec::new()))
            .unwrap();
        assert_eq!(
            String::from_utf8(plain.into_inner()).unwrap(),
            to_code(&tree, tree.root(), &grammar, false)
        );

        let pretty = Parser::new(&grammar)
            .stream_str(input, WriterReceiver::indented(Vec::new(), "  "))
            .unwrap();
        let mut expected = to_code(&tree, tree.root(), &grammar, true);
        if !expected.is_empty() {
            expected.push('\n');
        }
        assert_eq!(String::from_utf8(pretty.into_inner()).unwrap(), expected);
    }
}

// ========== failures ==========

#[test]
fn test_stream_stops_at_strict_error() {
    let grammar = HtmlGrammar::new(GrammarOptions::html().with_correct_errors(false));
    let mut received = CollectingReceiver::new();
    let err = Parser::new(&grammar)
        .stream_str("<a>x<b>y</a>", &mut received)
        .unwrap_err();
    assert!(matches!(err, ParseError::MissingEndTag { .. }));
    assert_eq!(received.concat(), "<a>x<b>y");
    assert!(!received.is_closed());
}
