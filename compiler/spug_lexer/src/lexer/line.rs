//! Line dispatch: decides what a line is from its first bytes.

use spug_ir::chars::{is_latin, is_newline, is_spacing, is_tag_word};
use spug_ir::{Block, Expr, ExprId, Op, Span, TokenId, TokenKind};
use spug_parse::Options;

use super::{output_options, Lexer};
use crate::LexError;

impl Lexer<'_> {
    /// Read a markup line starting at the cursor (indentation consumed).
    pub(super) fn read_line(&mut self) -> Result<TokenId, LexError> {
        let start = self.cursor.pos();
        if self.cursor.starts_with("//") {
            return self.read_comment(start);
        }
        let next = self.cursor.peek(1);
        match self.cursor.current() {
            b if is_latin(b) => self.read_keyword_line(start),
            b'.' | b'#' | b'(' | b'&' if is_tag_word(next) => {
                let data = self.tree.alloc(TokenKind::LineData, Span::point(start), None);
                self.tree.add(data, TokenKind::Tag, Span::point(start), None);
                self.read_tag_info(data, false)?;
                Ok(self.complete_line(data, start))
            }
            b'.' if next == 0 || is_newline(next) => {
                let data = self.tree.alloc(TokenKind::LineDot, Span::point(start), None);
                self.tree.add(data, TokenKind::TagTrailingDot, Span::from_range(start..start + 1), None);
                self.cursor.advance();
                Ok(self.complete_line(data, start))
            }
            b'|' => {
                let data = self.tree.alloc(TokenKind::LinePiped, Span::point(start), None);
                self.tree.add(data, TokenKind::PipeMark, Span::point(start), None);
                self.cursor.advance();
                self.cursor.skip_spacing();
                if !self.at_line_end() {
                    self.read_text(data, false)?;
                }
                Ok(self.complete_line(data, start))
            }
            b'=' => self.read_output_line(start, 1, TokenKind::OutputEscaped),
            b'!' if next == b'=' => self.read_output_line(start, 2, TokenKind::OutputUnescaped),
            b'-' => self.read_code_line(start),
            b'+' => self.read_mixin_call(start),
            b'<' => {
                self.cursor.rest_of_line();
                let data = self.tree.alloc(TokenKind::LinePlainText, Span::point(start), None);
                Ok(self.complete_line(data, start))
            }
            _ => Err(self.error(start, "Fail to recognize line type")),
        }
    }

    /// A line nested in a text block: all of it is (interpolated) text.
    pub(super) fn read_plain_line(&mut self) -> Result<TokenId, LexError> {
        let start = self.cursor.pos();
        let data = self.tree.alloc(TokenKind::LinePlainText, Span::point(start), None);
        self.read_text(data, false)?;
        Ok(self.complete_line(data, start))
    }

    fn read_comment(&mut self, start: usize) -> Result<TokenId, LexError> {
        let data = self.tree.alloc(TokenKind::LineComment, Span::point(start), None);
        if self.cursor.eat_str("//-") {
            self.tree.add(data, TokenKind::CommentTemplate, Span::from_range(start..start + 3), None);
            let text_start = self.cursor.pos();
            if !self.at_line_end() {
                self.cursor.rest_of_line();
                let span = self.cursor.span_from(text_start);
                self.tree.add(data, TokenKind::PlainText, span, None);
            }
        } else {
            self.cursor.advance_by(2);
            self.tree.add(data, TokenKind::CommentHtml, Span::from_range(start..start + 2), None);
            if !self.at_line_end() {
                self.read_text(data, false)?;
            }
        }
        Ok(self.complete_line(data, start))
    }

    /// `= expr` or `!= expr`.
    fn read_output_line(
        &mut self,
        start: usize,
        mark: usize,
        kind: TokenKind,
    ) -> Result<TokenId, LexError> {
        let data = self.tree.alloc(TokenKind::LineOut, Span::point(start), None);
        self.cursor.advance_by(mark);
        self.cursor.skip_spacing();
        if !self.at_line_end() {
            let (expr, span) = self.read_expression(&output_options(), "Invalid expression in output block")?;
            if !self.at_line_end() {
                return Err(self.error(
                    self.cursor.pos(),
                    "Invalid expression after output expression block",
                ));
            }
            self.tree.add(data, kind, span, Some(expr));
        }
        Ok(self.complete_line(data, start))
    }

    /// `+name` or `+name(args)`.
    fn read_mixin_call(&mut self, start: usize) -> Result<TokenId, LexError> {
        self.cursor.advance();
        self.cursor.skip_spacing();
        let name_start = self.cursor.pos();
        if self.cursor.eat_while(is_tag_word).is_empty() {
            return Err(self.error(name_start, "Invalid mixin name"));
        }
        let name = self.cursor.span_from(name_start);
        let data = self.tree.alloc(TokenKind::MixinCall, name, None);
        if self.cursor.is(b'(') {
            let (expr, span) =
                self.read_expression(&Options::inline(), "Invalid expression in mixin call block")?;
            self.tree.add(data, TokenKind::MixinArgs, span, Some(expr));
        }
        self.cursor.skip_spacing();
        if !self.at_line_end() {
            return Err(self.error(
                self.cursor.pos(),
                "Invalid expression after mixin call block",
            ));
        }
        let line = self.complete_line(data, start);
        // The call token's text is the mixin name, not the whole line.
        self.tree.set_span(data, name);
        Ok(line)
    }

    /// A line starting with a letter: a keyword statement or a tag.
    fn read_keyword_line(&mut self, start: usize) -> Result<TokenId, LexError> {
        let word = self.cursor.eat_while(is_tag_word);
        let word_span = self.cursor.span_from(start);
        let spaced = self.cursor.is_class(is_spacing);
        if spaced {
            self.cursor.skip_spacing();
            match word {
                "include" => return self.read_target(TokenKind::Include, start),
                "doctype" => return self.read_target(TokenKind::Doctype, start),
                "mixin" => return self.read_mixin_definition(start),
                "case" => return self.read_statement(TokenKind::ControlCase, start),
                "when" => return self.read_statement(TokenKind::ControlWhen, start),
                "if" => return self.read_statement(TokenKind::ControlIf, start),
                "unless" => return self.read_statement(TokenKind::ControlUnless, start),
                "elseif" => return self.read_statement(TokenKind::ControlElseIf, start),
                "while" => return self.read_statement(TokenKind::ControlWhile, start),
                "each" | "for" => return self.read_each(start),
                "else" if self.cursor.starts_with("if") => {
                    self.cursor.advance_by(2);
                    if !self.cursor.is_class(is_spacing) {
                        return Err(self.error(
                            self.cursor.pos(),
                            "Invalid expression in 'else if' statement",
                        ));
                    }
                    self.cursor.skip_spacing();
                    return self.read_statement(TokenKind::ControlElseIf, start);
                }
                _ => {}
            }
        }

        match word {
            "default" | "else" => {
                if !self.at_line_end() && !self.cursor.is(b':') {
                    let message = if word == "else" {
                        "Invalid 'else' line"
                    } else {
                        "Invalid 'default' line"
                    };
                    return Err(self.error(self.cursor.pos(), message));
                }
                let kind = if word == "else" {
                    TokenKind::ControlElse
                } else {
                    TokenKind::ControlDefault
                };
                return Ok(self.tree.alloc(kind, word_span, None));
            }
            "doctype" if self.at_line_end() => {
                return Ok(self.tree.alloc(TokenKind::Doctype, Span::point(self.cursor.pos()), None));
            }
            _ => {}
        }

        let data = self.tree.alloc(TokenKind::LineData, Span::point(start), None);
        self.tree.add(data, TokenKind::Tag, word_span, None);
        if !spaced {
            self.read_tag_info(data, false)?;
        } else if !self.at_line_end() {
            self.read_text(data, false)?;
        }
        Ok(self.complete_line(data, start))
    }

    /// Rest of the line as a name: `include NAME`, `doctype NAME`.
    fn read_target(&mut self, kind: TokenKind, start: usize) -> Result<TokenId, LexError> {
        let target_start = self.cursor.pos();
        let target = self.cursor.rest_of_line().trim_end_matches(&[' ', '\t'][..]);
        if target.is_empty() && kind == TokenKind::Include {
            return Err(self.error(start, "Invalid include target"));
        }
        let span = Span::from_range(target_start..target_start + target.len());
        Ok(self.tree.alloc(kind, span, None))
    }

    /// `keyword expr`; the token's text is the whole statement.
    fn read_statement(&mut self, kind: TokenKind, start: usize) -> Result<TokenId, LexError> {
        let (expr, _) =
            self.read_expression(&Options::inline(), "Invalid expression in control statement")?;
        if !self.at_line_end() && !self.cursor.is(b':') {
            return Err(self.error(
                self.cursor.pos(),
                "Invalid expression in control statement",
            ));
        }
        let span = self.cursor.span_from(start);
        Ok(self.tree.alloc(kind, span, Some(expr)))
    }

    /// `mixin name` or `mixin name(params)`.
    fn read_mixin_definition(&mut self, start: usize) -> Result<TokenId, LexError> {
        let token = self.read_statement(TokenKind::ControlMixin, start)?;
        let valid = self.tree.get(token).expr.is_some_and(|id| {
            let expr = self.tree.exprs.get(id);
            match (expr.op, expr.left) {
                (Op::Call, Some(callee)) => is_plain_token(self.tree.exprs.get(callee)),
                (Op::NoOp, None) => is_plain_token(expr),
                _ => false,
            }
        });
        if valid {
            Ok(token)
        } else {
            Err(self.error(self.cursor.pos(), "Invalid mixin definition"))
        }
    }

    /// `each value in expr` or `each value, key in expr` (`for` works too).
    fn read_each(&mut self, start: usize) -> Result<TokenId, LexError> {
        let first_start = self.cursor.pos();
        let first = self.cursor.eat_while(is_tag_word);
        let first = (!first.is_empty()).then(|| self.cursor.span_from(first_start));
        let mut second = None;

        if self.cursor.is_class(is_spacing) || self.cursor.is(b',') {
            self.cursor.skip_spacing();
            if self.cursor.eat(b',') {
                self.cursor.skip_spacing();
                let second_start = self.cursor.pos();
                self.cursor.eat_while(is_tag_word);
                second = Some(self.cursor.span_from(second_start));
                if !self.cursor.is_class(is_spacing) {
                    return Err(self.error(
                        self.cursor.pos(),
                        "Invalid variable expression in 'each' statement",
                    ));
                }
                self.cursor.skip_spacing();
            }
            if let Some(first) = first {
                if self.cursor.starts_with("in") && is_spacing(self.cursor.peek(2)) {
                    self.cursor.advance_by(2);
                    self.cursor.skip_spacing();
                    let (expr, _) = self
                        .read_expression(&Options::inline(), "Invalid expression in 'each' statement")?;
                    let kind = match second {
                        Some(second) if !second.is_empty() => TokenKind::ControlEachPair,
                        _ => TokenKind::ControlEach,
                    };
                    let each = self.tree.alloc(kind, self.cursor.span_from(start), Some(expr));
                    self.tree.add(each, TokenKind::ControlEachVariable, first, None);
                    if let Some(second) = second.filter(|s| !s.is_empty()) {
                        self.tree.add(each, TokenKind::ControlEachVariable, second, None);
                    }
                    return Ok(each);
                }
            }
        }
        Err(self.error(self.cursor.pos(), "Invalid 'each' statement"))
    }

    /// Parse an embedded expression at the cursor. Returns the expression
    /// and the span of its text; the cursor ends after trailing spacing.
    pub(super) fn read_expression(
        &mut self,
        options: &Options,
        context: &str,
    ) -> Result<(ExprId, Span), LexError> {
        let source = self.tree.source();
        let start = self.cursor.pos();
        let mut pos = start;
        let expr = spug_parse::parse(&mut self.tree.exprs, source, &mut pos, options)
            .map_err(|error| LexError::in_expression(source, context, &error))?;
        self.cursor.set_pos(pos);
        let text = self.cursor.slice(start, pos).trim_end_matches(&[' ', '\t'][..]);
        let span = Span::from_range(start..start + text.len());
        self.cursor.skip_spacing();
        Ok((expr, span))
    }
}

fn is_plain_token(expr: &Expr) -> bool {
    expr.op == Op::NoOp && expr.block == Block::None && expr.name().is_some()
}
