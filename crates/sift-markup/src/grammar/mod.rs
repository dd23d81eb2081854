//! Grammar policy consumed by the tokenizer, the attribute tokenizer, the
//! parser and the serializer.
//!
//! A [`Grammar`] answers every lexical and structural question the core asks:
//! delimiters, tag classification, escaping, the two nesting predicates and
//! the correct-errors switch. The trait is object safe and the core only ever
//! holds a `&dyn Grammar`.

mod html;
mod xml;

pub use html::HtmlGrammar;
pub use xml::XmlGrammar;

use serde::{Deserialize, Serialize};

use crate::escape;

/// Configuration shared by the built-in grammars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarOptions {
    /// Resolve malformed input instead of failing.
    pub correct_errors: bool,
    /// Render childless elements as genuine singular tags.
    pub strict_xml: bool,
    /// Indent unit used when serializing with indentation.
    pub indent: String,
}

impl GrammarOptions {
    /// Tolerant HTML-style defaults.
    #[must_use]
    pub fn html() -> Self {
        Self {
            correct_errors: true,
            strict_xml: false,
            indent: "  ".to_string(),
        }
    }

    /// Strict XML-style defaults.
    #[must_use]
    pub fn xml() -> Self {
        Self {
            correct_errors: false,
            strict_xml: true,
            indent: "  ".to_string(),
        }
    }

    /// Set the correct-errors flag.
    #[must_use]
    pub const fn with_correct_errors(mut self, correct_errors: bool) -> Self {
        self.correct_errors = correct_errors;
        self
    }

    /// Set the strict-XML flag.
    #[must_use]
    pub const fn with_strict_xml(mut self, strict_xml: bool) -> Self {
        self.strict_xml = strict_xml;
        self
    }

    /// Set the indent unit.
    #[must_use]
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }
}

impl Default for GrammarOptions {
    fn default() -> Self {
        Self::html()
    }
}

/// Lexical and structural policy for one markup dialect.
///
/// Tag classifiers receive the raw tag text including delimiters. Nesting
/// predicates receive type names as returned by [`Grammar::get_type`].
pub trait Grammar {
    /// Character opening every tag, comment, DTD and processing instruction.
    fn tag_start(&self) -> char {
        '<'
    }

    /// Character closing a tag.
    fn tag_end(&self) -> char {
        '>'
    }

    /// Marker after `tag_start` for end tags, and before `tag_end` for
    /// self-closed tags.
    fn end_marker(&self) -> char {
        '/'
    }

    /// Separator between an attribute name and its value.
    fn value_separator(&self) -> char {
        '='
    }

    /// Characters that may quote an attribute value.
    fn quote_chars(&self) -> &[char] {
        &['"', '\'']
    }

    /// Whether `c` separates attributes.
    fn is_attribute_separator(&self, c: char) -> bool {
        c.is_whitespace()
    }

    /// Whether `c` may start a tag name.
    fn is_name_start(&self, c: char) -> bool {
        c.is_alphabetic() || c == '_' || c == ':'
    }

    /// Whether `c` may continue a tag or attribute name.
    fn is_name_char(&self, c: char) -> bool {
        c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.')
    }

    /// Opening and closing comment markers.
    fn comment_markers(&self) -> (&str, &str) {
        ("<!--", "-->")
    }

    /// Opening and closing DTD markers.
    fn dtd_markers(&self) -> (&str, &str) {
        ("<!", ">")
    }

    /// Opening and closing processing-instruction markers.
    fn processing_instruction_markers(&self) -> (&str, &str) {
        ("<?", "?>")
    }

    /// Whether `text` is a complete comment.
    fn is_comment(&self, text: &str) -> bool {
        let (open, close) = self.comment_markers();
        text.len() >= open.len() + close.len() && text.starts_with(open) && text.ends_with(close)
    }

    /// Whether `text` is a complete DTD fragment.
    fn is_dtd(&self, text: &str) -> bool {
        let (open, close) = self.dtd_markers();
        !self.is_comment(text) && text.starts_with(open) && text.ends_with(close)
    }

    /// Whether `text` is a complete processing instruction.
    fn is_processing_instruction(&self, text: &str) -> bool {
        let (open, close) = self.processing_instruction_markers();
        text.len() >= open.len() + close.len() && text.starts_with(open) && text.ends_with(close)
    }

    /// Whether `text` is a start, end or singular tag.
    fn is_tag(&self, text: &str) -> bool {
        let mut chars = text.chars();
        if chars.next() != Some(self.tag_start()) || !text.ends_with(self.tag_end()) {
            return false;
        }
        chars
            .next()
            .is_some_and(|c| self.is_name_start(c) || c == self.end_marker())
    }

    /// Whether `tag` is an end tag.
    fn is_end_tag(&self, tag: &str) -> bool {
        self.is_tag(tag) && tag.chars().nth(1) == Some(self.end_marker())
    }

    /// Whether `tag` has no separate end tag.
    fn is_singular_tag(&self, tag: &str) -> bool {
        let body = tag.strip_suffix(self.tag_end()).unwrap_or(tag);
        !self.is_end_tag(tag) && body.ends_with(self.end_marker())
    }

    /// The type name of a tag.
    fn get_type(&self, tag: &str) -> String {
        tag.chars()
            .skip(1)
            .skip_while(|&c| c == self.end_marker())
            .take_while(|&c| self.is_name_char(c))
            .collect()
    }

    /// The element type name stored in the tree for a tag type.
    fn translate_tag(&self, type_name: &str) -> String {
        type_name.to_string()
    }

    /// Whether an element of type `tag` may be a direct child of `ancestor`.
    fn can_be_child_of(&self, _tag: &str, _ancestor: &str) -> bool {
        true
    }

    /// Whether an element of type `tag` may appear anywhere below `ancestor`.
    fn can_be_embedded_in(&self, _tag: &str, _ancestor: &str) -> bool {
        true
    }

    /// Whether the content of `tag` is raw text up to its own end tag.
    fn wait_for_end_tag(&self, _tag: &str) -> bool {
        false
    }

    /// Escape character data and attribute values.
    fn escape(&self, text: &str) -> String {
        escape::escape(text)
    }

    /// Escaped form of a quote character that must read as content.
    fn escape_quote(&self, quote: char) -> String {
        format!("&#{};", u32::from(quote))
    }

    /// Resolve escapes in character data and attribute values.
    fn unescape(&self, text: &str) -> String {
        escape::unescape(text)
    }

    /// Whether malformed input is corrected instead of rejected.
    fn correct_errors(&self) -> bool;

    /// Whether childless elements render as genuine singular tags.
    fn is_strict_xml(&self) -> bool;

    /// Indent unit for pretty serialization.
    fn standard_indent(&self) -> &str;
}
