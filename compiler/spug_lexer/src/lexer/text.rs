//! Text runs with `#{}` / `!{}` interpolation and `#[tag]` inline tags.

use spug_ir::chars::{is_newline, is_tag_word};
use spug_ir::{Span, TokenId, TokenKind};
use spug_parse::Options;

use super::Lexer;
use crate::LexError;

/// Pending literal text. Adjacent pieces merge into one `PlainText` token.
#[derive(Default)]
struct TextRun {
    span: Option<Span>,
}

impl TextRun {
    fn push(&mut self, lexer: &mut Lexer<'_>, data: TokenId, piece: Span) {
        if piece.is_empty() {
            return;
        }
        self.span = match self.span {
            Some(span) if span.end == piece.start => Some(span.merge(piece)),
            Some(_) => {
                self.flush(lexer, data);
                Some(piece)
            }
            None => Some(piece),
        };
    }

    fn flush(&mut self, lexer: &mut Lexer<'_>, data: TokenId) {
        if let Some(span) = self.span.take() {
            lexer.tree.add(data, TokenKind::PlainText, span, None);
        }
    }
}

impl Lexer<'_> {
    /// Read text up to the end of the line into children of `data`.
    ///
    /// Inside an inline tag (`interpolated`) the text also ends at `]`.
    pub(super) fn read_text(&mut self, data: TokenId, interpolated: bool) -> Result<(), LexError> {
        let mut run = TextRun::default();
        loop {
            let piece_start = self.cursor.pos();
            self.cursor.eat_until(|b| {
                matches!(b, b'\\' | b'#' | b'!') || is_newline(b) || (interpolated && b == b']')
            });
            let piece = self.cursor.span_from(piece_start);
            run.push(self, data, piece);

            if self.at_line_end() || (interpolated && self.cursor.is(b']')) {
                break;
            }
            let at = self.cursor.pos();
            match (self.cursor.current(), self.cursor.peek(1)) {
                (b'\\', _) => {
                    self.cursor.advance();
                    if self.cursor.starts_with("#{")
                        || self.cursor.starts_with("#[")
                        || self.cursor.starts_with("!{")
                    {
                        let escaped = self.cursor.pos();
                        self.cursor.advance_by(2);
                        let piece = self.cursor.span_from(escaped);
                        run.push(self, data, piece);
                    } else {
                        // Other backslashes stay in the text.
                        let width = self.cursor.rest().chars().next().map_or(0, char::len_utf8);
                        self.cursor.advance_by(width);
                        let piece = self.cursor.span_from(at);
                        run.push(self, data, piece);
                    }
                }
                (b'#', b'{') => {
                    run.flush(self, data);
                    self.read_interpolation(data, TokenKind::OutputEscaped)?;
                }
                (b'!', b'{') => {
                    run.flush(self, data);
                    self.read_interpolation(data, TokenKind::OutputUnescaped)?;
                }
                (b'#', b'[') => {
                    run.flush(self, data);
                    self.read_inline_tag(data)?;
                }
                _ => {
                    self.cursor.advance();
                    let piece = self.cursor.span_from(at);
                    run.push(self, data, piece);
                }
            }
        }
        run.flush(self, data);
        Ok(())
    }

    /// `#{expr}` or `!{expr}`, cursor on the `#`/`!`.
    fn read_interpolation(&mut self, data: TokenId, kind: TokenKind) -> Result<(), LexError> {
        self.cursor.advance_by(2);
        let start = self.cursor.pos();
        let (expr, span) = self.read_expression(&Options::inline(), "Invalid interpolation expression")?;
        if !self.cursor.eat(b'}') {
            return Err(self.error(start, "Invalid interpolation expression"));
        }
        self.tree.add(data, kind, span, Some(expr));
        Ok(())
    }

    /// `#[tag(attrs) text]`, cursor on the `#`.
    fn read_inline_tag(&mut self, data: TokenId) -> Result<(), LexError> {
        let start = self.cursor.pos();
        self.cursor.advance_by(2);
        let word_start = self.cursor.pos();
        self.cursor.eat_while(is_tag_word);
        let word = self.cursor.span_from(word_start);

        let tag = self.tree.alloc(TokenKind::LineData, Span::point(start), None);
        self.tree.add(tag, TokenKind::Tag, word, None);
        self.read_tag_info(tag, true)?;
        if !self.cursor.eat(b']') {
            return Err(self.error(word_start, "Invalid tag interpolation expression"));
        }
        let span = self.cursor.span_from(start);
        self.tree.set_span(tag, span);
        self.tree.append(data, tag);
        Ok(())
    }
}
