//! Tag info: `.class`, `#id`, `(attributes)`, `&attributes(expr)` and the
//! trailing `/`, `.`, `=` and `!=` markers.

use spug_ir::chars::{is_attr_word, is_tag_word, is_whitespace};
use spug_ir::{Span, TokenId, TokenKind};
use spug_parse::Options;

use super::{output_options, Lexer};
use crate::LexError;

impl Lexer<'_> {
    /// Read tag info after the tag name, then any text on the rest of the
    /// line. Stops before a `:` that chains another line.
    pub(super) fn read_tag_info(&mut self, data: TokenId, interpolated: bool) -> Result<(), LexError> {
        loop {
            let at = self.cursor.pos();
            let marker = match self.cursor.current() {
                b':' => return Ok(()),
                b'.' => {
                    self.cursor.advance();
                    let word_start = self.cursor.pos();
                    if !self.cursor.eat_while(is_tag_word).is_empty() {
                        let span = self.cursor.span_from(word_start);
                        self.tree.add(data, TokenKind::TagClassNote, span, None);
                        continue;
                    }
                    if !self.at_line_end() {
                        continue;
                    }
                    TokenKind::TagTrailingDot
                }
                b'#' => {
                    self.cursor.advance();
                    let word_start = self.cursor.pos();
                    self.cursor.eat_while(is_tag_word);
                    let span = self.cursor.span_from(word_start);
                    self.tree.add(data, TokenKind::TagIdNote, span, None);
                    continue;
                }
                b'(' => {
                    self.cursor.advance();
                    self.read_attributes(data)?;
                    continue;
                }
                b'&' => {
                    self.read_attribute_expression(data)?;
                    continue;
                }
                b'/' => TokenKind::TagTrailingSlash,
                b'=' => TokenKind::TagTrailingEq,
                b'!' if self.cursor.peek(1) == b'=' => TokenKind::TagTrailingNEq,
                _ => break,
            };

            if marker != TokenKind::TagTrailingDot {
                self.cursor.advance_by(if marker == TokenKind::TagTrailingNEq { 2 } else { 1 });
            }
            let span = self.cursor.span_from(at);
            self.tree.add(data, marker, span, None);

            self.cursor.skip_spacing();
            let at_end = self.at_line_end() || (interpolated && self.cursor.is(b']'));
            match marker {
                TokenKind::TagTrailingSlash | TokenKind::TagTrailingDot => {
                    if !at_end {
                        return Err(self.error(self.cursor.pos(), "Data after endline tag"));
                    }
                    return Ok(());
                }
                _ => {
                    if at_end {
                        return Ok(());
                    }
                    return self.read_tag_output(data, marker, interpolated);
                }
            }
        }

        self.cursor.skip_spacing();
        if !self.at_line_end() && !(interpolated && self.cursor.is(b']')) {
            self.read_text(data, interpolated)?;
        }
        Ok(())
    }

    /// Expression after a trailing `=` or `!=`; it must end the line.
    fn read_tag_output(
        &mut self,
        data: TokenId,
        marker: TokenKind,
        interpolated: bool,
    ) -> Result<(), LexError> {
        const CONTEXT: &str = "Invalid expression in tag attribute output block";
        let (expr, span) = self.read_expression(&output_options(), CONTEXT)?;
        if !self.at_line_end() && !(interpolated && self.cursor.is(b']')) {
            return Err(self.error(self.cursor.pos(), CONTEXT));
        }
        let kind = if marker == TokenKind::TagTrailingEq {
            TokenKind::OutputEscaped
        } else {
            TokenKind::OutputUnescaped
        };
        self.tree.add(data, kind, span, Some(expr));
        Ok(())
    }

    /// `&attributes(expr)`, cursor on the `&`.
    fn read_attribute_expression(&mut self, data: TokenId) -> Result<(), LexError> {
        const CONTEXT: &str = "Invalid expression in &attributes";
        if !self.cursor.eat_str("&attributes(") {
            return Err(self.error(self.cursor.pos(), "Unknown expression in tag"));
        }
        let (expr, span) = self.read_expression(&Options::inline(), CONTEXT)?;
        if !self.cursor.eat(b')') {
            return Err(self.error(self.cursor.pos(), CONTEXT));
        }
        self.tree.add(data, TokenKind::TagAttrExpr, span, Some(expr));
        Ok(())
    }

    /// Attribute list after `(`, up to and including `)`. May span lines.
    fn read_attributes(&mut self, data: TokenId) -> Result<(), LexError> {
        let list_start = self.cursor.pos();
        let list = self.tree.alloc(TokenKind::TagAttrList, Span::point(list_start), None);

        self.skip_attribute_separators(false);
        while !self.cursor.is_eof() && !self.cursor.is(b')') {
            let pair_start = self.cursor.pos();
            let name = self.read_attribute_name()?;
            let kind = if self.cursor.eat_str("!=") {
                TokenKind::AttrPairUnescaped
            } else if self.cursor.eat(b'=') {
                TokenKind::AttrPairEscaped
            } else if self.cursor.is_class(is_whitespace)
                || self.cursor.is(b',')
                || self.cursor.is(b')')
            {
                // Boolean attribute.
                let pair =
                    self.tree.alloc(TokenKind::AttrPairEscaped, self.cursor.span_from(pair_start), None);
                self.tree.append(pair, name);
                self.tree.append(list, pair);
                self.skip_attribute_separators(true);
                continue;
            } else {
                return Err(self.error(self.cursor.pos(), "Invalid attribute operator"));
            };

            let (expr, value) = self.read_expression(&Options::inline(), "Invalid attribute value")?;
            let pair = self.tree.alloc(kind, Span::from_range(pair_start..value.end as usize), None);
            self.tree.append(pair, name);
            self.tree.add(pair, TokenKind::AttrValue, value, Some(expr));
            self.tree.append(list, pair);
            self.skip_attribute_separators(true);
        }

        if !self.cursor.is(b')') {
            return Err(self.error(self.cursor.pos(), "Invalid attribute list"));
        }
        let span = self.cursor.span_from(list_start);
        self.tree.set_span(list, span);
        self.cursor.advance();
        self.tree.append(data, list);
        Ok(())
    }

    /// Whitespace (newlines included) and at most one comma.
    fn skip_attribute_separators(&mut self, comma: bool) {
        self.cursor.skip_whitespace();
        if comma && self.cursor.eat(b',') {
            self.cursor.skip_whitespace();
        }
    }

    /// Bare or quoted attribute name; the text pieces become `PlainText`
    /// children of the `AttrName` token.
    fn read_attribute_name(&mut self) -> Result<TokenId, LexError> {
        let start = self.cursor.pos();
        let name = self.tree.alloc(TokenKind::AttrName, Span::point(start), None);
        match self.cursor.current() {
            quote @ (b'\'' | b'"') => {
                self.cursor.advance();
                loop {
                    let piece_start = self.cursor.pos();
                    self.cursor.eat_until(|b| b == quote || b == b'\\');
                    let piece = self.cursor.span_from(piece_start);
                    if !piece.is_empty() {
                        self.tree.add(name, TokenKind::PlainText, piece, None);
                    }
                    if self.cursor.eat(quote) {
                        break;
                    }
                    if !self.cursor.eat(b'\\') || self.cursor.is_eof() {
                        return Err(self.error(start, "Invalid attribute name"));
                    }
                    let escaped = self.cursor.pos();
                    let width = self.cursor.rest().chars().next().map_or(0, char::len_utf8);
                    self.cursor.advance_by(width);
                    let piece = self.cursor.span_from(escaped);
                    self.tree.add(name, TokenKind::PlainText, piece, None);
                }
            }
            _ => {
                let mut word = self.cursor.eat_while(is_attr_word);
                if word.is_empty() {
                    return Err(self.error(start, "Invalid attribute name"));
                }
                // `(checked)`: the closing bracket is not part of the name.
                if word.ends_with(')') && !self.cursor.is(b'=') && !self.cursor.is(b'!') {
                    word = &word[..word.len() - 1];
                    self.cursor.set_pos(start + word.len());
                }
                let piece = Span::from_range(start..start + word.len());
                self.tree.add(name, TokenKind::PlainText, piece, None);
            }
        }
        let span = self.cursor.span_from(start);
        self.tree.set_span(name, span);
        Ok(name)
    }
}
