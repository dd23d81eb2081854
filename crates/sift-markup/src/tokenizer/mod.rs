//! Grammar-driven tokenizer.
//!
//! Splits a character stream into raw tokens: start, end and singular tags,
//! comments, DTD fragments, processing instructions and runs of data. The
//! concatenated token texts always reproduce the consumed input exactly.

mod core;
mod helpers;
mod source;
mod token;

pub use self::core::Tokenizer;
pub use self::source::{ReaderSource, TokenSource};
pub use self::token::{Token, TokenKind};
