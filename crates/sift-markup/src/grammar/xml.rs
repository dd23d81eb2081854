//! Strict XML-style grammar.

use super::{Grammar, GrammarOptions};

/// XML-style grammar: case-preserving types, no nesting constraints, and a
/// tag is singular only when it is self-closed.
#[derive(Debug, Clone)]
pub struct XmlGrammar {
    options: GrammarOptions,
}

impl XmlGrammar {
    /// Create a grammar with the given options.
    #[must_use]
    pub const fn new(options: GrammarOptions) -> Self {
        Self { options }
    }
}

impl Default for XmlGrammar {
    fn default() -> Self {
        Self::new(GrammarOptions::xml())
    }
}

impl Grammar for XmlGrammar {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_defaults() {
        let g = XmlGrammar::default();
        assert!(!g.correct_errors());
        assert!(g.is_strict_xml());
        assert_eq!(g.get_type("<Item id='1'>"), "Item");
        assert!(g.is_singular_tag("<Item/>"));
        assert!(!g.is_singular_tag("<br>"));
        assert!(g.is_singular_tag("<ns:Item a=\"1\" />"));
        assert_eq!(g.get_type("<ns:Item/>"), "ns:Item");
    }
}
