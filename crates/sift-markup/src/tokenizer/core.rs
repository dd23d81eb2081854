use crate::grammar::Grammar;

use super::token::{Token, TokenKind};

/// Consumed input kept in front of the cursor before the buffer is compacted.
const COMPACT_THRESHOLD: usize = 8 * 1024;

/// Outcome of looking for a markup construct at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Scan {
    /// A complete construct of the given length. Tags are reported as
    /// [`TokenKind::StartTag`] and classified when taken.
    Markup(TokenKind, usize),
    /// The position may start markup, but its end has not arrived yet.
    Incomplete,
    /// Plain character data.
    NotMarkup,
}

/// Absolute offsets of the last occurrence of each closing marker in the
/// complete input. A construct whose body starts past the last occurrence
/// of its closing marker cannot end.
#[derive(Debug, Clone, Copy)]
pub(super) struct LastClose {
    pub(super) tag_end: Option<usize>,
    pub(super) comment: Option<usize>,
    pub(super) dtd: Option<usize>,
    pub(super) processing_instruction: Option<usize>,
}

/// Grammar-driven tokenizer over incrementally supplied characters.
///
/// Input arrives through [`Tokenizer::push_str`]; [`Tokenizer::end_input`]
/// marks the end. A construct whose end has not arrived yet produces no
/// token until more input is pushed; once input has ended, whatever remains
/// is emitted as trailing data. The token sequence does not depend on how
/// the input was split into chunks.
///
/// After a start tag whose type the grammar marks with
/// [`Grammar::wait_for_end_tag`], everything up to the matching end tag is
/// emitted as one data token.
pub struct Tokenizer<'g> {
    pub(super) grammar: &'g dyn Grammar,
    pub(super) buffer: String,
    pub(super) pos: usize,
    pub(super) base_offset: usize,
    pub(super) input_ended: bool,
    pub(super) raw_text_end: Option<String>,
    pub(super) last_close: Option<LastClose>,
    depth: usize,
    token_depth: usize,
}

impl<'g> Tokenizer<'g> {
    /// Create a tokenizer with no input yet.
    #[must_use]
    pub fn new(grammar: &'g dyn Grammar) -> Self {
        Self {
            grammar,
            buffer: String::new(),
            pos: 0,
            base_offset: 0,
            input_ended: false,
            raw_text_end: None,
            last_close: None,
            depth: 0,
            token_depth: 0,
        }
    }

    /// Create a tokenizer over a complete input.
    #[must_use]
    pub fn with_input(grammar: &'g dyn Grammar, input: &str) -> Self {
        let mut tokenizer = Self::new(grammar);
        tokenizer.push_str(input);
        tokenizer.end_input();
        tokenizer
    }

    /// Append a chunk of input. Ignored once input has ended.
    pub fn push_str(&mut self, chunk: &str) {
        if self.input_ended {
            log::warn!(
                target: "sift::tokenizer",
                "input pushed after end of input, ignoring {} bytes",
                chunk.len()
            );
            return;
        }
        self.buffer.push_str(chunk);
    }

    /// Mark the end of input.
    pub fn end_input(&mut self) {
        if self.input_ended {
            return;
        }
        self.input_ended = true;
        let g = self.grammar;
        let last = |marker: &str| self.buffer.rfind(marker).map(|i| self.base_offset + i);
        let mut tag_end = [0; 4];
        self.last_close = Some(LastClose {
            tag_end: last(g.tag_end().encode_utf8(&mut tag_end)),
            comment: last(g.comment_markers().1),
            dtd: last(g.dtd_markers().1),
            processing_instruction: last(g.processing_instruction_markers().1),
        });
    }

    /// Whether [`Tokenizer::end_input`] has been called.
    #[must_use]
    pub const fn is_input_ended(&self) -> bool {
        self.input_ended
    }

    /// Whether input has ended and every character has been tokenized.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.input_ended && self.pos >= self.buffer.len()
    }

    /// Absolute byte offset of the next unconsumed character.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.base_offset + self.pos
    }

    /// Open-tag depth implied by the tags emitted so far.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Depth of the most recently emitted token.
    #[must_use]
    pub const fn token_depth(&self) -> usize {
        self.token_depth
    }

    /// Produce the next token, or `None` when more input is needed or the
    /// input is exhausted (see [`Tokenizer::is_exhausted`]).
    pub fn next_token(&mut self) -> Option<Token> {
        if self.pos >= self.buffer.len() {
            return None;
        }
        let token = if self.raw_text_end.is_some() {
            self.next_raw_text()?
        } else {
            self.next_markup_or_data()?
        };
        self.track_depth(&token);
        self.compact();
        log::trace!(
            target: "sift::tokenizer",
            "{} at {} (depth {}): {:?}",
            token.kind,
            token.offset,
            self.token_depth,
            token.text
        );
        Some(token)
    }

    fn next_markup_or_data(&mut self) -> Option<Token> {
        let rest = &self.buffer[self.pos..];
        match self.scan_markup(rest) {
            Scan::Markup(kind, len) => return Some(self.take(kind, len)),
            Scan::Incomplete if !self.input_ended => return None,
            Scan::Incomplete | Scan::NotMarkup => {}
        }
        let end = self.find_data_end(rest)?;
        Some(self.take(TokenKind::Data, end))
    }

    fn next_raw_text(&mut self) -> Option<Token> {
        let type_name = self.raw_text_end.clone()?;
        let rest = &self.buffer[self.pos..];
        let remaining = rest.len();
        match self.find_raw_text_end(rest, &type_name) {
            Some(0) => {
                self.raw_text_end = None;
                self.next_markup_or_data()
            }
            Some(end) => {
                self.raw_text_end = None;
                Some(self.take(TokenKind::Data, end))
            }
            None if self.input_ended => {
                self.raw_text_end = None;
                Some(self.take(TokenKind::Data, remaining))
            }
            None => None,
        }
    }

    /// Cut `len` bytes at the cursor into a token.
    fn take(&mut self, kind: TokenKind, len: usize) -> Token {
        let start = self.pos;
        let text = &self.buffer[start..start + len];
        let kind = if kind == TokenKind::StartTag {
            self.classify_tag(text)
        } else {
            kind
        };
        let token = Token::new(kind, text, self.base_offset + start);
        self.pos += len;
        token
    }

    fn classify_tag(&self, text: &str) -> TokenKind {
        if self.grammar.is_end_tag(text) {
            TokenKind::EndTag
        } else if self.grammar.is_singular_tag(text) {
            TokenKind::SingularTag
        } else {
            TokenKind::StartTag
        }
    }

    fn track_depth(&mut self, token: &Token) {
        match token.kind {
            TokenKind::StartTag => {
                self.token_depth = self.depth;
                self.depth += 1;
                let type_name = self.grammar.get_type(&token.text);
                if self.grammar.wait_for_end_tag(&type_name) {
                    self.raw_text_end = Some(type_name);
                }
            }
            TokenKind::EndTag => {
                self.depth = self.depth.saturating_sub(1);
                self.token_depth = self.depth;
            }
            _ => self.token_depth = self.depth,
        }
    }

    fn compact(&mut self) {
        if self.pos >= COMPACT_THRESHOLD && self.pos * 2 >= self.buffer.len() {
            self.buffer.replace_range(..self.pos, "");
            self.base_offset += self.pos;
            self.pos = 0;
        }
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}
