//! Attribute tokenizer for start and singular tags.
//!
//! The tag text is scanned as: tag start, optional end marker, type name,
//! then attributes separated by grammar separators. An attribute is a name
//! optionally followed by the value separator and a value; a quoted value
//! may also follow the name directly. A standalone name takes itself as its
//! value. Values are unescaped before they are stored, and the first
//! occurrence of a name wins.
//!
//! # Quote recovery
//!
//! With error correction on, a scan failure is resolved by escaping the most
//! recent closing quote (so it reads as content) and scanning the patched
//! text again. Each patch must lie strictly after the previous one, which
//! bounds the number of rescans by the number of quote characters. When no
//! such quote exists the tag is scanned once more in lenient mode, where
//! malformed characters are skipped and an unterminated value runs to the
//! end of the tag.

use std::borrow::Cow;

use sift_common::warning::warn_once;
use sift_dom::AttributeSet;

use crate::error::ParseError;
use crate::grammar::Grammar;

/// The attributes of one tag plus what recovery had to do to get them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAttributes {
    /// Attributes in first-seen order.
    pub attributes: AttributeSet,
    /// Number of quote characters escaped before the tag scanned cleanly.
    pub recovered: usize,
    /// Whether quote recovery gave up and the lenient scan was used.
    pub abandoned: bool,
}

/// Parse the attribute list of a start or singular tag.
///
/// `offset` is the byte offset of `tag` in the whole input and is only used
/// for error positions.
///
/// # Errors
///
/// With error correction off, returns [`ParseError::UnexpectedCharacter`] or
/// [`ParseError::MissingCharacter`] for the first malformed construct. With
/// correction on, this never fails.
pub fn parse_attributes(
    tag: &str,
    offset: usize,
    grammar: &dyn Grammar,
) -> Result<ParsedAttributes, ParseError> {
    let mut text = Cow::Borrowed(tag);
    let mut last_corrected: Option<usize> = None;
    let mut recovered = 0;

    loop {
        let failure = match Scanner::new(&text, grammar, false).run() {
            Ok(attributes) => {
                return Ok(ParsedAttributes {
                    attributes,
                    recovered,
                    abandoned: false,
                });
            }
            Err(failure) => failure,
        };

        if !grammar.correct_errors() {
            return Err(failure.into_error(offset));
        }

        match failure.last_quote {
            Some(quote_at) if last_corrected.is_none_or(|at| quote_at > at) => {
                let quote = text[quote_at..].chars().next().unwrap_or('"');
                let escaped = grammar.escape_quote(quote);
                log::debug!(
                    target: "sift::attributes",
                    "escaping quote at offset {} in {:?}",
                    offset + quote_at,
                    tag
                );
                text.to_mut()
                    .replace_range(quote_at..quote_at + quote.len_utf8(), &escaped);
                last_corrected = Some(quote_at);
                recovered += 1;
            }
            _ => {
                warn_once(
                    "sift::attributes",
                    "attribute quoting could not be repaired, using lenient scan",
                );
                log::debug!(target: "sift::attributes", "lenient scan of {tag:?}");
                let attributes = Scanner::new(&text, grammar, true).run().unwrap_or_default();
                return Ok(ParsedAttributes {
                    attributes,
                    recovered,
                    abandoned: true,
                });
            }
        }
    }
}

/// Why a scan stopped, with the recovery hint.
#[derive(Debug)]
struct ScanFailure {
    /// Byte position in the scanned text.
    position: usize,
    /// The offending character, `None` when the tag ended too early.
    found: Option<char>,
    expected: &'static str,
    /// Position of the most recent closing quote seen before the failure.
    last_quote: Option<usize>,
}

impl ScanFailure {
    fn into_error(self, offset: usize) -> ParseError {
        let offset = offset + self.position;
        match self.found {
            Some(found) => ParseError::UnexpectedCharacter {
                found,
                offset,
                expected: self.expected,
            },
            None => ParseError::MissingCharacter {
                offset,
                expected: self.expected,
            },
        }
    }
}

/// One pass over a tag's text.
struct Scanner<'a> {
    text: &'a str,
    grammar: &'a dyn Grammar,
    /// End of the attribute region: before the tag end and any end marker.
    end: usize,
    pos: usize,
    lenient: bool,
    last_quote: Option<usize>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str, grammar: &'a dyn Grammar, lenient: bool) -> Self {
        let body = text.strip_suffix(grammar.tag_end()).unwrap_or(text);
        let body = body.strip_suffix(grammar.end_marker()).unwrap_or(body);
        let start = text
            .chars()
            .next()
            .filter(|&c| c == grammar.tag_start())
            .map_or(0, char::len_utf8);
        Self {
            text,
            grammar,
            end: body.len().max(start),
            pos: start,
            lenient,
            last_quote: None,
        }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..self.end].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.text[start..self.pos]
    }

    fn skip_separators(&mut self) {
        let g = self.grammar;
        let _ = self.eat_while(|c| g.is_attribute_separator(c));
    }

    fn fail(&self, position: usize, found: Option<char>, expected: &'static str) -> ScanFailure {
        ScanFailure {
            position,
            found,
            expected,
            last_quote: self.last_quote,
        }
    }

    fn run(mut self) -> Result<AttributeSet, ScanFailure> {
        let g = self.grammar;
        let mut attributes = AttributeSet::new();

        if self.peek() == Some(g.end_marker()) {
            let _ = self.bump();
        }
        let _ = self.eat_while(|c| g.is_name_char(c));

        loop {
            self.skip_separators();
            let Some(next) = self.peek() else {
                break;
            };

            let name = self.eat_while(|c| g.is_name_char(c));
            if name.is_empty() {
                if self.lenient {
                    let _ = self.bump();
                    continue;
                }
                return Err(self.fail(self.pos, Some(next), "attribute name"));
            }

            let before_value = self.pos;
            self.skip_separators();
            let value = match self.peek() {
                Some(c) if c == g.value_separator() => {
                    let _ = self.bump();
                    self.skip_separators();
                    self.read_value()?
                }
                Some(c) if g.quote_chars().contains(&c) && self.pos == before_value => {
                    self.read_quoted(c)?
                }
                _ => Cow::Borrowed(name),
            };

            let _ = attributes.insert_if_absent(name, g.unescape(&value));
        }

        Ok(attributes)
    }

    /// Value after the separator: quoted, or unquoted when tolerated.
    fn read_value(&mut self) -> Result<Cow<'a, str>, ScanFailure> {
        let g = self.grammar;
        match self.peek() {
            Some(c) if g.quote_chars().contains(&c) => self.read_quoted(c),
            Some(c) if !(self.lenient || g.correct_errors()) => {
                Err(self.fail(self.pos, Some(c), "quoted attribute value"))
            }
            Some(_) => Ok(Cow::Borrowed(
                self.eat_while(|c| !g.is_attribute_separator(c)),
            )),
            None if self.lenient => Ok(Cow::Borrowed("")),
            None => Err(self.fail(self.end, None, "attribute value")),
        }
    }

    fn read_quoted(&mut self, quote: char) -> Result<Cow<'a, str>, ScanFailure> {
        let g = self.grammar;
        let _ = self.bump();
        let start = self.pos;

        let Some(len) = self.text[start..self.end].find(quote) else {
            if self.lenient {
                self.pos = self.end;
                return Ok(Cow::Borrowed(&self.text[start..self.end]));
            }
            return Err(self.fail(self.end, None, "closing quote"));
        };

        let close = start + len;
        let value = &self.text[start..close];
        self.pos = close + quote.len_utf8();
        self.last_quote = Some(close);

        match self.peek() {
            Some(c) if !g.is_attribute_separator(c) && !self.lenient => Err(self.fail(
                close,
                Some(quote),
                "attribute separator after quoted value",
            )),
            _ => Ok(Cow::Borrowed(value)),
        }
    }
}
