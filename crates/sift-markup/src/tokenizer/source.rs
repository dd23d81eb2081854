use std::io::BufRead;

use crate::error::ParseError;
use crate::grammar::Grammar;

use super::core::Tokenizer;
use super::token::Token;

/// A pull-based supplier of tokens for the parser.
pub trait TokenSource {
    /// The next token. `Ok(None)` means either that more input is needed
    /// or, when [`TokenSource::is_exhausted`] holds, that input is over.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Io`] when the underlying input fails.
    fn pull(&mut self) -> Result<Option<Token>, ParseError>;

    /// Whether all input has been consumed and no tokens remain.
    fn is_exhausted(&self) -> bool;

    /// Absolute byte offset of the next unconsumed character.
    fn offset(&self) -> usize;
}

impl TokenSource for Tokenizer<'_> {
    fn pull(&mut self) -> Result<Option<Token>, ParseError> {
        Ok(self.next_token())
    }

    fn is_exhausted(&self) -> bool {
        Tokenizer::is_exhausted(self)
    }

    fn offset(&self) -> usize {
        Tokenizer::offset(self)
    }
}

/// Token source that reads its input line by line from a [`BufRead`].
///
/// Pulling never reports "more input needed": the reader is consulted until
/// a token is available or the reader is drained.
pub struct ReaderSource<'g, R> {
    tokenizer: Tokenizer<'g>,
    reader: R,
    line: String,
}

impl<'g, R: BufRead> ReaderSource<'g, R> {
    /// Wrap `reader`.
    #[must_use]
    pub fn new(grammar: &'g dyn Grammar, reader: R) -> Self {
        Self {
            tokenizer: Tokenizer::new(grammar),
            reader,
            line: String::new(),
        }
    }

    /// The underlying tokenizer.
    #[must_use]
    pub const fn tokenizer(&self) -> &Tokenizer<'g> {
        &self.tokenizer
    }
}

impl<R: BufRead> TokenSource for ReaderSource<'_, R> {
    fn pull(&mut self) -> Result<Option<Token>, ParseError> {
        loop {
            if let Some(token) = self.tokenizer.next_token() {
                return Ok(Some(token));
            }
            if self.tokenizer.is_input_ended() {
                return Ok(None);
            }
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                self.tokenizer.end_input();
            } else {
                self.tokenizer.push_str(&self.line);
            }
        }
    }

    fn is_exhausted(&self) -> bool {
        self.tokenizer.is_exhausted()
    }

    fn offset(&self) -> usize {
        self.tokenizer.offset()
    }
}
