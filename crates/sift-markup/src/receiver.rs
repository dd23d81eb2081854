//! Token sinks for streaming parses and tree serialization.

use std::io::{self, Write};

/// Receives serialized tokens in document order.
///
/// Tokens arrive as rendered from the corrected tree. Tags are rebuilt from
/// the element's type name and attributes, and data is escaped. Other leaves
/// keep their source text. `depth` is the number of open elements enclosing
/// the token.
pub trait TokenReceiver {
    /// Store one token.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying sink.
    fn store_token(&mut self, text: &str, depth: usize) -> io::Result<()>;

    /// Called once after the last token.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying sink.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<R: TokenReceiver + ?Sized> TokenReceiver for &mut R {
    fn store_token(&mut self, text: &str, depth: usize) -> io::Result<()> {
        (**self).store_token(text, depth)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Keeps every received token in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectingReceiver {
    /// Received `(text, depth)` pairs.
    pub tokens: Vec<(String, usize)>,
    closed: bool,
}

impl CollectingReceiver {
    /// Create an empty receiver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether [`TokenReceiver::close`] has been called.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// The received texts joined together.
    #[must_use]
    pub fn concat(&self) -> String {
        self.tokens.iter().map(|(text, _)| text.as_str()).collect()
    }
}

impl TokenReceiver for CollectingReceiver {
    fn store_token(&mut self, text: &str, depth: usize) -> io::Result<()> {
        self.tokens.push((text.to_string(), depth));
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Writes received tokens to an [`io::Write`].
///
/// Without an indent unit the tokens are written back to back. With one,
/// each token goes on its own line, indented by its depth, and
/// whitespace-only tokens are dropped.
pub struct WriterReceiver<W: Write> {
    writer: W,
    indent: Option<String>,
    first: bool,
}

impl<W: Write> WriterReceiver<W> {
    /// Write tokens unchanged.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            indent: None,
            first: true,
        }
    }

    /// Write one token per line, indented by `indent` per level.
    #[must_use]
    pub fn indented(writer: W, indent: impl Into<String>) -> Self {
        Self {
            writer,
            indent: Some(indent.into()),
            first: true,
        }
    }

    /// Recover the writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TokenReceiver for WriterReceiver<W> {
    fn store_token(&mut self, text: &str, depth: usize) -> io::Result<()> {
        let Some(indent) = &self.indent else {
            return self.writer.write_all(text.as_bytes());
        };
        if text.trim().is_empty() {
            return Ok(());
        }
        if !self.first {
            self.writer.write_all(b"\n")?;
        }
        self.first = false;
        for _ in 0..depth {
            self.writer.write_all(indent.as_bytes())?;
        }
        self.writer.write_all(text.as_bytes())
    }

    fn close(&mut self) -> io::Result<()> {
        if self.indent.is_some() && !self.first {
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()
    }
}
