//! The nesting state machine.
//!
//! [`NestingState`] turns tokens into structural [`Event`]s. It owns the
//! stack of open tag types and the list of tags implicitly closed since the
//! last start tag, and it decides every implicit close. It never touches a
//! tree: sinks apply the events, so tree mode and streaming mode share this
//! logic without any mode-specific branches.

use serde::Serialize;
use sift_dom::{ElementData, NodeData};
use strum_macros::Display;

use crate::attributes::parse_attributes;
use crate::error::ParseError;
use crate::grammar::Grammar;
use crate::tokenizer::{Token, TokenKind};

/// A structural change produced by one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Append an element under the cursor. Non-singular elements become the
    /// new cursor.
    Open {
        /// The element to append.
        element: ElementData,
        /// Whether the element has no separate end tag.
        singular: bool,
    },
    /// Close the element at the cursor and move the cursor to its parent.
    Close {
        /// Whether no end tag in the input closed it.
        implicit: bool,
    },
    /// Append a leaf under the cursor.
    Leaf(NodeData),
}

/// What kind of recovery was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum CorrectionKind {
    /// An open tag was closed without an end tag to make room for a token.
    ImplicitClose,
    /// An end tag was dropped because its element was already implicitly closed.
    SuppressedEndTag,
    /// An end tag matching no open tag was dropped.
    IgnoredEndTag,
    /// A tag was still open at end of input.
    UnclosedAtEnd,
    /// Stray quotes in a tag were escaped so its attributes could be read.
    RecoveredAttributes,
    /// A tag's attributes were read leniently after quote recovery failed.
    AbandonedAttributes,
}

/// A recovery applied in correction mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Correction {
    /// What was done.
    pub kind: CorrectionKind,
    /// Type of the tag concerned.
    pub tag: String,
    /// Type of the tag whose arrival caused it, if any.
    pub context: Option<String>,
    /// Byte offset of the token being consumed when it happened.
    pub offset: usize,
}

/// Open-tag stack and implicit-close bookkeeping for one parse.
#[derive(Debug, Default)]
pub struct NestingState {
    open: Vec<String>,
    missing: Vec<String>,
    corrections: Vec<Correction>,
}

fn same_type(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

impl NestingState {
    /// Create an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Types of the open tags, outermost first.
    #[must_use]
    pub fn open_tags(&self) -> &[String] {
        &self.open
    }

    /// Tags implicitly closed since the last start tag.
    #[must_use]
    pub fn implicitly_closed(&self) -> &[String] {
        &self.missing
    }

    /// Recoveries applied so far.
    #[must_use]
    pub fn corrections(&self) -> &[Correction] {
        &self.corrections
    }

    /// Take the recoveries applied so far.
    pub fn take_corrections(&mut self) -> Vec<Correction> {
        std::mem::take(&mut self.corrections)
    }

    /// Apply one token, appending the resulting events to `events`.
    ///
    /// # Errors
    ///
    /// With error correction off, returns the nesting or attribute error
    /// the token causes. The state is left as it was before the token.
    pub fn consume(
        &mut self,
        token: &Token,
        grammar: &dyn Grammar,
        events: &mut Vec<Event>,
    ) -> Result<(), ParseError> {
        match token.kind {
            TokenKind::EndTag => self.end_tag(token, grammar, events),
            TokenKind::StartTag => self.start_tag(token, false, grammar, events),
            TokenKind::SingularTag => self.start_tag(token, true, grammar, events),
            TokenKind::Data => {
                events.push(Event::Leaf(NodeData::Data(grammar.unescape(&token.text))));
                Ok(())
            }
            TokenKind::Comment => {
                events.push(Event::Leaf(NodeData::Comment(token.text.clone())));
                Ok(())
            }
            TokenKind::Dtd => {
                events.push(Event::Leaf(NodeData::Dtd(token.text.clone())));
                Ok(())
            }
            TokenKind::ProcessingInstruction => {
                events.push(Event::Leaf(NodeData::ProcessingInstruction(token.text.clone())));
                Ok(())
            }
        }
    }

    /// Close everything still open at end of input.
    ///
    /// # Errors
    ///
    /// With error correction off, returns [`ParseError::MissingEndTag`] for
    /// the innermost open tag.
    pub fn finish(
        &mut self,
        offset: usize,
        grammar: &dyn Grammar,
        events: &mut Vec<Event>,
    ) -> Result<(), ParseError> {
        if let Some(top) = self.open.last() {
            if !grammar.correct_errors() {
                return Err(ParseError::MissingEndTag {
                    tag: top.clone(),
                    closed_by: None,
                    offset,
                });
            }
        }
        while let Some(tag) = self.open.pop() {
            self.record(CorrectionKind::UnclosedAtEnd, tag, None, offset);
            events.push(Event::Close { implicit: true });
        }
        self.missing.clear();
        Ok(())
    }

    fn end_tag(
        &mut self,
        token: &Token,
        grammar: &dyn Grammar,
        events: &mut Vec<Event>,
    ) -> Result<(), ParseError> {
        let tag = grammar.get_type(&token.text);

        if let Some(index) = self.missing.iter().position(|m| same_type(m, &tag)) {
            let _ = self.missing.remove(index);
            self.record(CorrectionKind::SuppressedEndTag, tag, None, token.offset);
            return Ok(());
        }

        let Some(index) = self.open.iter().rposition(|open| same_type(open, &tag)) else {
            if !grammar.correct_errors() {
                return Err(ParseError::UnexpectedEndTag {
                    tag,
                    open: self.open.last().cloned(),
                    offset: token.offset,
                });
            }
            self.record(CorrectionKind::IgnoredEndTag, tag, None, token.offset);
            return Ok(());
        };

        if index + 1 < self.open.len() && !grammar.correct_errors() {
            return Err(ParseError::MissingEndTag {
                tag: self.open[self.open.len() - 1].clone(),
                closed_by: Some(tag),
                offset: token.offset,
            });
        }

        while self.open.len() > index + 1 {
            self.implicit_close(&tag, token.offset, events);
        }
        let _ = self.open.pop();
        events.push(Event::Close { implicit: false });
        Ok(())
    }

    fn start_tag(
        &mut self,
        token: &Token,
        singular: bool,
        grammar: &dyn Grammar,
        events: &mut Vec<Event>,
    ) -> Result<(), ParseError> {
        self.missing.clear();
        let tag = grammar.get_type(&token.text);
        let parsed = parse_attributes(&token.text, token.offset, grammar)?;

        let keep = self.keep_depth(&tag, grammar);
        if keep < self.open.len() {
            if !grammar.correct_errors() {
                return Err(ParseError::InvalidNesting {
                    tag,
                    open: self.open[self.open.len() - 1].clone(),
                    offset: token.offset,
                });
            }
            while self.open.len() > keep {
                self.implicit_close(&tag, token.offset, events);
            }
        }

        if parsed.recovered > 0 {
            self.record(CorrectionKind::RecoveredAttributes, tag.clone(), None, token.offset);
        }
        if parsed.abandoned {
            self.record(CorrectionKind::AbandonedAttributes, tag.clone(), None, token.offset);
        }

        events.push(Event::Open {
            element: ElementData::with_attributes(grammar.translate_tag(&tag), parsed.attributes),
            singular,
        });
        if !singular {
            self.open.push(tag);
        }
        Ok(())
    }

    /// Number of open tags that stay open when a `tag` start tag arrives.
    ///
    /// Tags from the first one `tag` cannot be embedded in upwards must
    /// close. Below that limit, the deepest open tag that `tag` can be a
    /// direct child of becomes its parent; when there is none, nothing more
    /// is closed.
    fn keep_depth(&self, tag: &str, grammar: &dyn Grammar) -> usize {
        let embeddable = self
            .open
            .iter()
            .position(|open| !grammar.can_be_embedded_in(tag, open))
            .unwrap_or(self.open.len());
        (1..=embeddable)
            .rev()
            .find(|&depth| grammar.can_be_child_of(tag, &self.open[depth - 1]))
            .unwrap_or(embeddable)
    }

    fn implicit_close(&mut self, cause: &str, offset: usize, events: &mut Vec<Event>) {
        let Some(closed) = self.open.pop() else {
            return;
        };
        self.missing.push(closed.clone());
        self.record(CorrectionKind::ImplicitClose, closed, Some(cause.to_string()), offset);
        events.push(Event::Close { implicit: true });
    }

    fn record(&mut self, kind: CorrectionKind, tag: String, context: Option<String>, offset: usize) {
        log::debug!(
            target: "sift::parser",
            "{kind} <{tag}> at offset {offset}{}",
            context.as_deref().map(|c| format!(" (by <{c}>)")).unwrap_or_default()
        );
        self.corrections.push(Correction {
            kind,
            tag,
            context,
            offset,
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::grammar::{GrammarOptions, HtmlGrammar};

    use super::*;

    fn tag(kind: TokenKind, text: &str) -> Token {
        Token::new(kind, text, 0)
    }

    fn feed(state: &mut NestingState, grammar: &dyn Grammar, tokens: &[Token]) -> Vec<Event> {
        let mut events = Vec::new();
        for token in tokens {
            state.consume(token, grammar, &mut events).unwrap();
        }
        events
    }

    #[test]
    fn test_keep_depth_prefers_nearest_valid_parent() {
        let grammar = HtmlGrammar::default();
        let mut state = NestingState::new();
        let _ = feed(
            &mut state,
            &grammar,
            &[
                tag(TokenKind::StartTag, "<ul>"),
                tag(TokenKind::StartTag, "<li>"),
                tag(TokenKind::StartTag, "<span>"),
            ],
        );
        assert_eq!(state.keep_depth("li", &grammar), 1);
        assert_eq!(state.keep_depth("b", &grammar), 3);
    }

    #[test]
    fn test_keep_depth_without_valid_parent_keeps_stack() {
        let grammar = HtmlGrammar::default();
        let mut state = NestingState::new();
        let _ = feed(&mut state, &grammar, &[tag(TokenKind::StartTag, "<div>")]);
        assert_eq!(state.keep_depth("li", &grammar), 1);
    }

    #[test]
    fn test_embedding_conflict_limits_search() {
        let grammar = HtmlGrammar::default();
        let mut state = NestingState::new();
        let _ = feed(
            &mut state,
            &grammar,
            &[
                tag(TokenKind::StartTag, "<div>"),
                tag(TokenKind::StartTag, "<p>"),
                tag(TokenKind::StartTag, "<b>"),
            ],
        );
        assert_eq!(state.keep_depth("div", &grammar), 1);
    }

    #[test]
    fn test_implicit_close_records_missing_end_tag() {
        let grammar = HtmlGrammar::default();
        let mut state = NestingState::new();
        let events = feed(
            &mut state,
            &grammar,
            &[
                tag(TokenKind::StartTag, "<a>"),
                tag(TokenKind::StartTag, "<b>"),
                tag(TokenKind::EndTag, "</a>"),
            ],
        );
        assert_eq!(
            events[2..],
            [Event::Close { implicit: true }, Event::Close { implicit: false }]
        );
        assert_eq!(state.implicitly_closed(), ["b".to_string()]);

        let events = feed(&mut state, &grammar, &[tag(TokenKind::EndTag, "</b>")]);
        assert!(events.is_empty());
        assert!(state.implicitly_closed().is_empty());
        assert_eq!(state.corrections()[1].kind, CorrectionKind::SuppressedEndTag);
    }

    #[test]
    fn test_strict_failure_leaves_state_untouched() {
        let grammar = HtmlGrammar::new(GrammarOptions::html().with_correct_errors(false));
        let mut state = NestingState::new();
        let _ = feed(
            &mut state,
            &grammar,
            &[tag(TokenKind::StartTag, "<a>"), tag(TokenKind::StartTag, "<b>")],
        );
        let mut events = Vec::new();
        let err = state
            .consume(&tag(TokenKind::EndTag, "</a>"), &grammar, &mut events)
            .unwrap_err();
        assert!(matches!(err, ParseError::MissingEndTag { ref tag, .. } if tag == "b"));
        assert!(events.is_empty());
        assert_eq!(state.open_tags(), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_finish_closes_open_tags() {
        let grammar = HtmlGrammar::default();
        let mut state = NestingState::new();
        let _ = feed(&mut state, &grammar, &[tag(TokenKind::StartTag, "<a>")]);
        let mut events = Vec::new();
        state.finish(3, &grammar, &mut events).unwrap();
        assert_eq!(events, [Event::Close { implicit: true }]);
        assert!(state.open_tags().is_empty());
        assert_eq!(state.corrections()[0].kind, CorrectionKind::UnclosedAtEnd);
    }
}
