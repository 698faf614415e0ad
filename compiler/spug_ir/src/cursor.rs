//! Byte cursor over template source.
//!
//! Both the markup lexer and the expression parser scan the same source
//! buffer with a shared position, so an expression embedded in a markup line
//! is parsed in place and the lexer resumes right after it. All predicates
//! used with the cursor are ASCII classes, so every position the cursor
//! stops at is a character boundary.

use crate::Span;

#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Cursor { source, pos: 0 }
    }

    /// Cursor positioned at byte `pos`, clamped to the source length.
    pub fn at(source: &'a str, pos: usize) -> Self {
        Cursor {
            source,
            pos: pos.min(source.len()),
        }
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.source.len());
    }

    #[inline]
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Unconsumed remainder of the source.
    #[inline]
    pub fn rest(&self) -> &'a str {
        self.source.get(self.pos..).unwrap_or_default()
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Current byte, `0` at end of input.
    #[inline]
    pub fn current(&self) -> u8 {
        self.peek(0)
    }

    /// Byte `n` positions ahead, `0` past the end.
    #[inline]
    pub fn peek(&self, n: usize) -> u8 {
        self.source.as_bytes().get(self.pos + n).copied().unwrap_or(0)
    }

    #[inline]
    pub fn is(&self, b: u8) -> bool {
        !self.is_eof() && self.current() == b
    }

    /// Current byte satisfies `pred` (false at end of input).
    #[inline]
    pub fn is_class(&self, pred: impl Fn(u8) -> bool) -> bool {
        !self.is_eof() && pred(self.current())
    }

    #[inline]
    pub fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    #[inline]
    pub fn advance(&mut self) {
        self.advance_by(1);
    }

    #[inline]
    pub fn advance_by(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.source.len());
    }

    /// Consume `b` if it is the current byte.
    pub fn eat(&mut self, b: u8) -> bool {
        if self.is(b) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume `s` if the remainder starts with it.
    pub fn eat_str(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.advance_by(s.len());
            true
        } else {
            false
        }
    }

    /// Consume bytes while `pred` holds and return them.
    pub fn eat_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        let bytes = self.source.as_bytes();
        while self.pos < bytes.len() && pred(bytes[self.pos]) {
            self.pos += 1;
        }
        self.slice(start, self.pos)
    }

    /// Consume bytes until `pred` holds (or the input ends) and return them.
    pub fn eat_until(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        self.eat_while(|b| !pred(b))
    }

    pub fn skip_spacing(&mut self) {
        self.eat_while(crate::chars::is_spacing);
    }

    pub fn skip_whitespace(&mut self) {
        self.eat_while(crate::chars::is_whitespace);
    }

    /// Consume one line terminator (`\r\n`, `\n` or `\r`).
    pub fn skip_newline(&mut self) -> bool {
        if self.eat_str("\r\n") {
            return true;
        }
        self.eat(b'\n') || self.eat(b'\r')
    }

    /// Text up to (not including) the next line terminator, consumed.
    pub fn rest_of_line(&mut self) -> &'a str {
        self.eat_until(crate::chars::is_newline)
    }

    /// Source text between two byte offsets.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        self.source.get(start..end).unwrap_or_default()
    }

    /// Span from `start` to the current position.
    pub fn span_from(&self, start: usize) -> Span {
        Span::from_range(start..self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chars::{is_ident, is_newline};

    #[test]
    fn test_eat_while_returns_consumed_text() {
        let mut cursor = Cursor::new("name.rest");
        assert_eq!(cursor.eat_while(is_ident), "name");
        assert!(cursor.eat(b'.'));
        assert_eq!(cursor.rest(), "rest");
    }

    #[test]
    fn test_rest_of_line_stops_at_terminator() {
        let mut cursor = Cursor::new("first line\r\nsecond");
        assert_eq!(cursor.rest_of_line(), "first line");
        assert!(cursor.skip_newline());
        assert_eq!(cursor.rest(), "second");
        assert!(!cursor.skip_newline());
    }

    #[test]
    fn test_eof_behaviour() {
        let mut cursor = Cursor::at("ab", 10);
        assert!(cursor.is_eof());
        assert_eq!(cursor.current(), 0);
        assert!(!cursor.is(0));
        assert_eq!(cursor.eat_until(is_newline), "");
    }

    #[test]
    fn test_non_ascii_text_passes_through() {
        let mut cursor = Cursor::new("héllo\nnext");
        assert_eq!(cursor.rest_of_line(), "héllo");
        assert_eq!(cursor.span_from(0), Span::new(0, 6));
    }
}
