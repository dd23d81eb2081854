use std::io::BufRead;

use sift_dom::{NodeId, Tree};

use crate::error::ParseError;
use crate::grammar::Grammar;
use crate::receiver::TokenReceiver;
use crate::tokenizer::{ReaderSource, TokenKind, TokenSource, Tokenizer};

use super::nesting::{Correction, Event, NestingState};
use super::sink::{EventSink, StreamSink, TreeBuilder};

/// Result of one [`ParserInstance::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// One token of this kind was consumed.
    Consumed(TokenKind),
    /// The source needs more input before it can produce a token.
    Pending,
    /// Input is exhausted and the parse is complete.
    Finished,
}

/// One parse in progress.
///
/// Tokens are pulled from `S` one at a time; each token runs through the
/// nesting state machine and the resulting events go to the sink `K`.
/// [`ParserInstance::step`] is the only suspension point: control returns
/// to the caller after every token.
pub struct ParserInstance<'g, S, K> {
    grammar: &'g dyn Grammar,
    source: S,
    nesting: NestingState,
    sink: K,
    events: Vec<Event>,
    finished: bool,
}

impl<'g, S: TokenSource> ParserInstance<'g, S, TreeBuilder> {
    /// A parse that builds a persistent tree.
    pub fn building(grammar: &'g dyn Grammar, source: S) -> Self {
        Self::with_sink(grammar, source, TreeBuilder::new())
    }

    /// The tree built so far. After a failure it stays valid up to the
    /// failing token.
    #[must_use]
    pub fn tree(&self) -> &Tree {
        self.sink.tree()
    }

    /// The finished tree, or `None` when the parse has not finished.
    #[must_use]
    pub fn into_tree(self) -> Option<Tree> {
        self.finished.then(|| self.sink.into_tree())
    }
}

impl<'g, S: TokenSource, R: TokenReceiver> ParserInstance<'g, S, StreamSink<R>> {
    /// A parse that forwards tokens to `receiver` and keeps only the open
    /// path in memory.
    pub fn streaming(grammar: &'g dyn Grammar, source: S, receiver: R) -> Self {
        Self::with_sink(grammar, source, StreamSink::new(receiver))
    }

    /// The receiver.
    #[must_use]
    pub const fn receiver(&self) -> &R {
        self.sink.receiver()
    }

    /// Take the receiver.
    #[must_use]
    pub fn into_receiver(self) -> R {
        self.sink.into_receiver()
    }

    /// Number of nodes held in memory, root included.
    #[must_use]
    pub fn live_nodes(&self) -> usize {
        self.sink.tree().live_count()
    }
}

impl<'g, S: TokenSource, K: EventSink> ParserInstance<'g, S, K> {
    /// A parse feeding an arbitrary event sink.
    pub fn with_sink(grammar: &'g dyn Grammar, source: S, sink: K) -> Self {
        Self {
            grammar,
            source,
            nesting: NestingState::new(),
            sink,
            events: Vec::new(),
            finished: false,
        }
    }

    /// Consume at most one token.
    ///
    /// # Errors
    ///
    /// Returns the first nesting, attribute or I/O error. The parse should
    /// not be stepped again after an error.
    pub fn step(&mut self) -> Result<Step, ParseError> {
        if self.finished {
            return Ok(Step::Finished);
        }
        match self.source.pull()? {
            Some(token) => {
                self.nesting.consume(&token, self.grammar, &mut self.events)?;
                self.drain_events()?;
                Ok(Step::Consumed(token.kind))
            }
            None if self.source.is_exhausted() => {
                self.conclude()?;
                Ok(Step::Finished)
            }
            None => Ok(Step::Pending),
        }
    }

    /// Step until the source needs more input or the parse finishes.
    ///
    /// # Errors
    ///
    /// Returns the first error [`ParserInstance::step`] reports.
    pub fn run(&mut self) -> Result<Step, ParseError> {
        loop {
            match self.step()? {
                Step::Consumed(_) => {}
                other => return Ok(other),
            }
        }
    }

    /// Treat the input consumed so far as complete: close every open tag
    /// and finish the sink. Input the source still holds is not parsed.
    ///
    /// # Errors
    ///
    /// With error correction off, returns [`ParseError::MissingEndTag`] when
    /// a tag is still open.
    pub fn conclude(&mut self) -> Result<(), ParseError> {
        if self.finished {
            return Ok(());
        }
        self.nesting
            .finish(self.source.offset(), self.grammar, &mut self.events)?;
        self.drain_events()?;
        self.sink.finish()?;
        self.finished = true;
        log::debug!(
            target: "sift::parser",
            "parse finished at offset {} with {} corrections",
            self.source.offset(),
            self.nesting.corrections().len()
        );
        Ok(())
    }

    fn drain_events(&mut self) -> Result<(), ParseError> {
        for event in self.events.drain(..) {
            self.sink.apply(event, self.grammar)?;
        }
        Ok(())
    }

    /// Types of the open tags, outermost first.
    #[must_use]
    pub fn open_tags(&self) -> &[String] {
        self.nesting.open_tags()
    }

    /// Recoveries applied so far.
    #[must_use]
    pub fn corrections(&self) -> &[Correction] {
        self.nesting.corrections()
    }

    /// Take the recoveries applied so far.
    pub fn take_corrections(&mut self) -> Vec<Correction> {
        self.nesting.take_corrections()
    }

    /// The node new content is appended to.
    #[must_use]
    pub fn current_node(&self) -> NodeId {
        self.sink.cursor()
    }

    /// Whether the parse has finished.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// The token source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// The token source, for supplying more input.
    pub const fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

/// Entry point for whole-input parses with one grammar.
#[derive(Clone, Copy)]
pub struct Parser<'g> {
    grammar: &'g dyn Grammar,
}

impl<'g> Parser<'g> {
    /// Create a parser.
    #[must_use]
    pub const fn new(grammar: &'g dyn Grammar) -> Self {
        Self { grammar }
    }

    /// The grammar.
    #[must_use]
    pub const fn grammar(&self) -> &'g dyn Grammar {
        self.grammar
    }

    /// Parse a complete string into a tree.
    ///
    /// # Errors
    ///
    /// With error correction off, returns the first nesting or attribute
    /// error.
    pub fn parse_str(&self, input: &str) -> Result<Tree, ParseError> {
        self.parse_str_with_corrections(input).map(|(tree, _)| tree)
    }

    /// Parse a complete string, returning the recoveries applied as well.
    ///
    /// # Errors
    ///
    /// With error correction off, returns the first nesting or attribute
    /// error.
    pub fn parse_str_with_corrections(
        &self,
        input: &str,
    ) -> Result<(Tree, Vec<Correction>), ParseError> {
        let source = Tokenizer::with_input(self.grammar, input);
        self.build(source)
    }

    /// Parse everything `reader` yields into a tree.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Io`] when reading fails, and with error
    /// correction off the first nesting or attribute error.
    pub fn parse_reader<B: BufRead>(&self, reader: B) -> Result<Tree, ParseError> {
        self.build(ReaderSource::new(self.grammar, reader))
            .map(|(tree, _)| tree)
    }

    /// Stream a complete string to `receiver` and hand the receiver back.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Io`] when the receiver fails, and with error
    /// correction off the first nesting or attribute error.
    pub fn stream_str<R: TokenReceiver>(&self, input: &str, receiver: R) -> Result<R, ParseError> {
        let source = Tokenizer::with_input(self.grammar, input);
        self.stream(source, receiver)
    }

    /// Stream everything `reader` yields to `receiver`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Io`] when reading or the receiver fails, and
    /// with error correction off the first nesting or attribute error.
    pub fn stream_reader<B: BufRead, R: TokenReceiver>(
        &self,
        reader: B,
        receiver: R,
    ) -> Result<R, ParseError> {
        self.stream(ReaderSource::new(self.grammar, reader), receiver)
    }

    fn build<S: TokenSource>(&self, source: S) -> Result<(Tree, Vec<Correction>), ParseError> {
        let mut instance = ParserInstance::building(self.grammar, source);
        if instance.run()? == Step::Pending {
            instance.conclude()?;
        }
        let corrections = instance.take_corrections();
        Ok((instance.sink.into_tree(), corrections))
    }

    fn stream<S: TokenSource, R: TokenReceiver>(
        &self,
        source: S,
        receiver: R,
    ) -> Result<R, ParseError> {
        let mut instance = ParserInstance::streaming(self.grammar, source, receiver);
        if instance.run()? == Step::Pending {
            instance.conclude()?;
        }
        Ok(instance.into_receiver())
    }
}
