//! Tolerant HTML-style grammar.

use super::{Grammar, GrammarOptions};

/// Elements that never have content.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is raw text up to their own end tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title", "xmp"];

/// Elements that implicitly end an open paragraph.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "main", "menu",
    "nav", "ol", "p", "pre", "section", "table", "ul",
];

/// Elements that may not contain another element of their own type.
const NO_SELF_NESTING: &[&str] = &["a", "button", "form", "nobr", "p"];

/// HTML-style grammar: lower-cased types, void elements, raw-text elements
/// and the common list/table/paragraph nesting rules.
#[derive(Debug, Clone, Default)]
pub struct HtmlGrammar {
    options: GrammarOptions,
}

impl HtmlGrammar {
    /// Create a grammar with the given options.
    #[must_use]
    pub const fn new(options: GrammarOptions) -> Self {
        Self { options }
    }

    /// The options this grammar was built with.
    #[must_use]
    pub const fn options(&self) -> &GrammarOptions {
        &self.options
    }
}

impl Grammar for HtmlGrammar {
    fn is_singular_tag(&self, tag: &str) -> bool {
        if self.is_end_tag(tag) {
            return false;
        }
        let body = tag.strip_suffix(self.tag_end()).unwrap_or(tag);
        body.ends_with(self.end_marker()) || VOID_ELEMENTS.contains(&self.get_type(tag).as_str())
    }

    fn get_type(&self, tag: &str) -> String {
        tag.chars()
            .skip(1)
            .skip_while(|&c| c == self.end_marker())
            .take_while(|&c| self.is_name_char(c))
            .flat_map(char::to_lowercase)
            .collect()
    }

    fn translate_tag(&self, type_name: &str) -> String {
        type_name.to_lowercase()
    }

    fn can_be_child_of(&self, tag: &str, ancestor: &str) -> bool {
        match tag {
            "li" => matches!(ancestor, "ul" | "ol" | "menu"),
            "dt" | "dd" => ancestor == "dl",
            "tr" => matches!(ancestor, "table" | "tbody" | "thead" | "tfoot"),
            "td" | "th" => ancestor == "tr",
            "tbody" | "thead" | "tfoot" | "caption" | "colgroup" => ancestor == "table",
            "col" => matches!(ancestor, "colgroup" | "table"),
            "option" => matches!(ancestor, "select" | "optgroup" | "datalist"),
            "optgroup" => ancestor == "select",
            "head" | "body" => ancestor == "html",
            _ => true,
        }
    }

    fn can_be_embedded_in(&self, tag: &str, ancestor: &str) -> bool {
        if ancestor == "p" && CLOSES_PARAGRAPH.contains(&tag) {
            return false;
        }
        !(tag == ancestor && NO_SELF_NESTING.contains(&tag))
    }

    fn wait_for_end_tag(&self, tag: &str) -> bool {
        RAW_TEXT_ELEMENTS.contains(&tag)
    }

    fn correct_errors(&self) -> bool {
        self.options.correct_errors
    }

    fn is_strict_xml(&self) -> bool {
        self.options.strict_xml
    }

    fn standard_indent(&self) -> &str {
        &self.options.indent
    }
}
