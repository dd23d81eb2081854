use strum_macros::Display;

/// Lexical class of a raw token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum TokenKind {
    /// A tag that opens an element.
    StartTag,
    /// A tag that closes an element.
    EndTag,
    /// A tag with no separate end tag.
    SingularTag,
    /// A comment, delimiters included.
    Comment,
    /// A DTD fragment, delimiters included.
    Dtd,
    /// A processing instruction, delimiters included.
    ProcessingInstruction,
    /// A run of escaped character data.
    Data,
}

impl TokenKind {
    /// Whether this kind is one of the three tag kinds.
    #[must_use]
    pub const fn is_tag(self) -> bool {
        matches!(self, Self::StartTag | Self::EndTag | Self::SingularTag)
    }
}

/// A raw token produced by the tokenizer.
///
/// Tokens are transient: the parser takes ownership and does not keep them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lexical class.
    pub kind: TokenKind,
    /// Raw source text, exactly as it appeared in the input.
    pub text: String,
    /// Byte offset of the first character in the whole input.
    pub offset: usize,
}

impl Token {
    /// Create a token.
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            offset,
        }
    }
}
