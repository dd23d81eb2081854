//! Error-tolerant markup parsing for Sift.
//!
//! # Scope
//!
//! This crate implements:
//! - **Grammars** ([`Grammar`], [`HtmlGrammar`], [`XmlGrammar`]): all lexical
//!   and structural policy, including the correct-errors switch
//! - **Tokenizer** ([`Tokenizer`], [`ReaderSource`]): incremental, grammar-driven
//!   splitting of input into tags, comments, DTD fragments, processing
//!   instructions and data
//! - **Attribute tokenizer** ([`parse_attributes`]) with quote recovery
//! - **Parser** ([`Parser`], [`ParserInstance`]): stack-based nesting
//!   correction, in tree mode or streaming mode
//! - **Serialization** ([`tree_to_code`], [`tree_to_tokens`]) and
//!   [`TokenReceiver`] sinks
//!
//! # Not Implemented
//!
//! - Validation against a DTD or schema
//! - Entities beyond the fixed table in [`escape`]

/// Attribute tokenizer with quote recovery.
pub mod attributes;
/// Human-readable tree dumps.
pub mod debug;
/// Parse errors.
pub mod error;
/// The fixed escape table.
pub mod escape;
/// Grammar trait and built-in grammars.
pub mod grammar;
/// Parser instances, nesting state machine and event sinks.
pub mod parser;
/// Token receivers.
pub mod receiver;
/// Tree serialization.
pub mod serialize;
/// Serializable tree snapshots.
pub mod snapshot;
/// Grammar-driven tokenizer.
pub mod tokenizer;

pub use attributes::{ParsedAttributes, parse_attributes};
pub use debug::{format_tree, print_tree};
pub use error::ParseError;
pub use grammar::{Grammar, GrammarOptions, HtmlGrammar, XmlGrammar};
pub use parser::{Correction, CorrectionKind, Parser, ParserInstance, Step};
pub use receiver::{CollectingReceiver, TokenReceiver, WriterReceiver};
pub use serialize::{to_code, tree_to_code, tree_to_tokens};
pub use snapshot::{NodeSnapshot, snapshot};
pub use tokenizer::{ReaderSource, Token, TokenKind, TokenSource, Tokenizer};
