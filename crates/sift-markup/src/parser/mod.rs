//! Parser orchestration.
//!
//! A parse is a [`ParserInstance`]: a token source, the [`NestingState`]
//! that owns the open-tag stack, and an [`EventSink`] that applies the
//! resulting structural events. [`TreeBuilder`] keeps the tree (tree mode);
//! [`StreamSink`] forwards tokens to a receiver and frees nodes as they
//! close (streaming mode). [`Parser`] wraps the common whole-input cases.
//!
//! # Nesting correction
//!
//! An end tag first cancels a matching entry in the list of tags implicitly
//! closed since the last start tag. Otherwise it closes the nearest open tag
//! of its type, implicitly closing everything above it, or is dropped when
//! no open tag matches.
//!
//! A start tag closes every open tag from the first one it cannot be
//! embedded in upwards. Below that, the deepest open tag it can be a direct
//! child of becomes its parent. Tags still open at end of input are closed.
//!
//! With error correction off, each of these recoveries is an error instead.

mod core;
mod nesting;
mod sink;

pub use self::core::{Parser, ParserInstance, Step};
pub use self::nesting::{Correction, CorrectionKind, Event, NestingState};
pub use self::sink::{EventSink, StreamSink, TreeBuilder};
