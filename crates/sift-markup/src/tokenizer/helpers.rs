//! Scanning helpers for the tokenizer.
//!
//! Each scanner looks at the unconsumed input only; none of them move the
//! cursor.

use super::core::{LastClose, Scan, Tokenizer};
use super::token::TokenKind;

impl Tokenizer<'_> {
    /// Classify the construct starting at the beginning of `s`.
    ///
    /// Comments are recognized before DTD fragments, DTD fragments before
    /// processing instructions, and those before tags.
    pub(super) fn scan_markup(&self, s: &str) -> Scan {
        let g = self.grammar;
        if !s.starts_with(g.tag_start()) {
            return Scan::NotMarkup;
        }
        let at = self.offset_of(s);

        let (open, close) = g.comment_markers();
        if s.starts_with(open) {
            if !self.may_close(|last| last.comment, at + open.len()) {
                return Scan::Incomplete;
            }
            return find_close(s, open.len(), close, TokenKind::Comment);
        }
        if open.starts_with(s) {
            return Scan::Incomplete;
        }

        let (open, close) = g.dtd_markers();
        if s.starts_with(open) {
            if !self.may_close(|last| last.dtd, at + open.len()) {
                return Scan::Incomplete;
            }
            return self.scan_dtd(s, open.len(), close);
        }
        if open.starts_with(s) {
            return Scan::Incomplete;
        }

        let (open, close) = g.processing_instruction_markers();
        if s.starts_with(open) {
            if !self.may_close(|last| last.processing_instruction, at + open.len()) {
                return Scan::Incomplete;
            }
            return find_close(s, open.len(), close, TokenKind::ProcessingInstruction);
        }
        if open.starts_with(s) {
            return Scan::Incomplete;
        }

        match s.chars().nth(1) {
            None => Scan::Incomplete,
            Some(c) if g.is_name_start(c) || c == g.end_marker() => {
                if self.may_close(|last| last.tag_end, at + 1) {
                    self.scan_tag(s)
                } else {
                    Scan::Incomplete
                }
            }
            Some(_) => Scan::NotMarkup,
        }
    }

    /// Absolute offset of `s`, a suffix of the buffer.
    fn offset_of(&self, s: &str) -> usize {
        self.base_offset + self.buffer.len() - s.len()
    }

    /// Whether a closing marker can still occur at or after `from`. Always
    /// true while input is open.
    fn may_close(&self, pick: fn(&LastClose) -> Option<usize>, from: usize) -> bool {
        self.last_close
            .as_ref()
            .is_none_or(|last| pick(last).is_some_and(|at| at >= from))
    }

    /// A DTD fragment ends at its closing marker outside any bracketed
    /// internal subset and outside quotes.
    fn scan_dtd(&self, s: &str, open_len: usize, close: &str) -> Scan {
        let quotes = self.grammar.quote_chars();
        let mut brackets = 0usize;
        let mut quote = None;
        for (i, c) in s[open_len..].char_indices() {
            let at = open_len + i;
            if let Some(q) = quote {
                if c == q {
                    quote = None;
                }
                continue;
            }
            match c {
                '[' => brackets += 1,
                ']' => brackets = brackets.saturating_sub(1),
                c if quotes.contains(&c) => quote = Some(c),
                _ if brackets == 0 && s[at..].starts_with(close) => {
                    return Scan::Markup(TokenKind::Dtd, at + close.len());
                }
                _ => {}
            }
        }
        Scan::Incomplete
    }

    /// A tag ends at the first tag-end character outside a quoted value.
    ///
    /// A quote opens a value only directly after the value separator. When
    /// a quoted value runs into an end tag, or input ends inside it, the
    /// quote is treated as broken and the tag ends at the first tag-end
    /// character instead.
    fn scan_tag(&self, s: &str) -> Scan {
        let g = self.grammar;
        let mut quote: Option<char> = None;
        let mut after_separator = false;

        for (i, c) in s.char_indices().skip(1) {
            if let Some(q) = quote {
                if c == q {
                    quote = None;
                } else if c == g.tag_start() && s[i + c.len_utf8()..].starts_with(g.end_marker()) {
                    return self.scan_tag_unquoted(s);
                }
                continue;
            }
            if c == g.tag_end() {
                return Scan::Markup(TokenKind::StartTag, i + c.len_utf8());
            }
            if c == g.value_separator() {
                after_separator = true;
            } else if after_separator && g.quote_chars().contains(&c) {
                quote = Some(c);
                after_separator = false;
            } else if !g.is_attribute_separator(c) {
                after_separator = false;
            }
        }

        if quote.is_some() && self.input_ended {
            return self.scan_tag_unquoted(s);
        }
        Scan::Incomplete
    }

    fn scan_tag_unquoted(&self, s: &str) -> Scan {
        let tag_end = self.grammar.tag_end();
        s.find(tag_end).map_or(Scan::Incomplete, |i| {
            Scan::Markup(TokenKind::StartTag, i + tag_end.len_utf8())
        })
    }

    /// Length of the data run at the start of `rest`, or `None` when the run
    /// may continue into input that has not arrived yet.
    ///
    /// The first character is data already; the run ends where a complete
    /// markup construct begins.
    pub(super) fn find_data_end(&self, rest: &str) -> Option<usize> {
        let tag_start = self.grammar.tag_start();
        for (i, _) in rest.match_indices(tag_start).filter(|&(i, _)| i > 0) {
            match self.scan_markup(&rest[i..]) {
                Scan::Markup(..) => return Some(i),
                Scan::Incomplete if !self.input_ended => return None,
                Scan::Incomplete | Scan::NotMarkup => {}
            }
        }
        self.input_ended.then_some(rest.len())
    }

    /// Position of the end tag closing a raw-text element of `type_name`,
    /// matched case-insensitively and not followed by a name character.
    pub(super) fn find_raw_text_end(&self, rest: &str, type_name: &str) -> Option<usize> {
        let g = self.grammar;
        let mut needle = String::with_capacity(type_name.len() + 2);
        needle.push(g.tag_start());
        needle.push(g.end_marker());
        needle.push_str(type_name);

        for (i, _) in rest.match_indices(g.tag_start()) {
            let end = i + needle.len();
            if end > rest.len() {
                if self.input_ended {
                    continue;
                }
                return None;
            }
            let Some(candidate) = rest.get(i..end) else {
                continue;
            };
            if !candidate.eq_ignore_ascii_case(&needle) {
                continue;
            }
            match rest[end..].chars().next() {
                Some(c) if g.is_name_char(c) => {}
                None if !self.input_ended => return None,
                _ => return Some(i),
            }
        }
        None
    }
}

fn find_close(s: &str, open_len: usize, close: &str, kind: TokenKind) -> Scan {
    s[open_len..]
        .find(close)
        .map_or(Scan::Incomplete, |i| Scan::Markup(kind, open_len + i + close.len()))
}
