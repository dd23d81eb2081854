//! Parse failures.
//!
//! Every structural variant is only produced when the grammar has error
//! correction switched off; with correction on, the same situations are
//! resolved and recorded as [`Correction`](crate::Correction)s instead.

use std::io;

use thiserror::Error;

/// A condition that aborts the current parse.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A start tag cannot be placed under the open tags without an implicit close.
    #[error("invalid nesting at offset {offset}: <{tag}> cannot be placed inside open <{open}>")]
    InvalidNesting {
        /// Type of the start tag being placed.
        tag: String,
        /// The open tag it conflicts with.
        open: String,
        /// Byte offset of the start tag.
        offset: usize,
    },

    /// Open tags would have to be closed implicitly.
    #[error("missing end tag at offset {offset}: <{tag}> is still open at {}", closer(.closed_by))]
    MissingEndTag {
        /// The first tag that would be closed implicitly.
        tag: String,
        /// The end tag that triggered the close, `None` at end of input.
        closed_by: Option<String>,
        /// Byte offset of the triggering end tag (or of the end of input).
        offset: usize,
    },

    /// An end tag matches no open tag.
    #[error("unexpected end tag </{tag}> at offset {offset}, expected {}", expected_close(.open))]
    UnexpectedEndTag {
        /// Type of the stray end tag.
        tag: String,
        /// The innermost open tag, `None` when nothing is open.
        open: Option<String>,
        /// Byte offset of the end tag.
        offset: usize,
    },

    /// Malformed attribute syntax inside a tag.
    #[error("unexpected character {found:?} at offset {offset}, expected {expected}")]
    UnexpectedCharacter {
        /// The offending character.
        found: char,
        /// Byte offset of the character.
        offset: usize,
        /// What the attribute tokenizer was looking for.
        expected: &'static str,
    },

    /// A tag ended while the attribute tokenizer still needed a character.
    #[error("missing character at offset {offset}, expected {expected}")]
    MissingCharacter {
        /// Byte offset where the character was needed.
        offset: usize,
        /// What the attribute tokenizer was looking for.
        expected: &'static str,
    },

    /// The character source failed.
    #[error("failed to read markup input")]
    Io(#[from] io::Error),
}

impl ParseError {
    /// Byte offset of the offending construct, if the error has one.
    #[must_use]
    pub const fn offset(&self) -> Option<usize> {
        match self {
            Self::InvalidNesting { offset, .. }
            | Self::MissingEndTag { offset, .. }
            | Self::UnexpectedEndTag { offset, .. }
            | Self::UnexpectedCharacter { offset, .. }
            | Self::MissingCharacter { offset, .. } => Some(*offset),
            Self::Io(_) => None,
        }
    }
}

fn closer(closed_by: &Option<String>) -> String {
    closed_by
        .as_deref()
        .map_or_else(|| "end of input".to_string(), |tag| format!("</{tag}>"))
}

fn expected_close(open: &Option<String>) -> String {
    open.as_deref()
        .map_or_else(|| "end of input".to_string(), |tag| format!("</{tag}>"))
}
