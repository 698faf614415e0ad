//! Code lines (`- stmt; stmt`) and code blocks (`-` followed by an indented
//! block of statements).

use spug_ir::chars::is_spacing;
use spug_ir::{Span, TokenId, TokenKind};
use spug_parse::Options;

use super::Lexer;
use crate::LexError;

impl Lexer<'_> {
    pub(super) fn read_code_line(&mut self, start: usize) -> Result<TokenId, LexError> {
        self.cursor.advance();
        if self.at_line_end() {
            return self.read_code_block(start);
        }
        let data = self.tree.alloc(TokenKind::LineCode, Span::point(start), None);
        self.read_statements(data, &Options::inline(), "Fail to read line of code")?;
        Ok(self.complete_line(data, start))
    }

    /// Statements separated by `;` up to the end of the line.
    fn read_statements(
        &mut self,
        data: TokenId,
        options: &Options,
        context: &str,
    ) -> Result<(), LexError> {
        loop {
            self.cursor.skip_spacing();
            if self.at_line_end() {
                return Ok(());
            }
            let (expr, span) = self.read_expression(options, context)?;
            self.tree.add(data, TokenKind::Code, span, Some(expr));
            if self.cursor.eat(b';') {
                continue;
            }
            if !self.at_line_end() {
                return Err(self.error(self.cursor.pos(), context));
            }
            return Ok(());
        }
    }

    /// Every following line indented deeper than the `-` line is a line of
    /// statements. A statement may continue on the next line of the block.
    fn read_code_block(&mut self, start: usize) -> Result<TokenId, LexError> {
        let data = self.tree.alloc(TokenKind::LineCodeBlock, Span::point(start), None);
        let source = self.tree.source();
        let line_begin = source
            .get(..start)
            .and_then(|before| before.rfind(|c: char| c == '\n' || c == '\r'))
            .map_or(0, |i| i + 1);
        let line_head = self.cursor.slice(line_begin, start);
        let outer_len = line_head.len() - line_head.trim_start_matches(&[' ', '\t'][..]).len();
        let outer = self.cursor.slice(line_begin, line_begin + outer_len);

        let mut indent: Option<&str> = None;
        loop {
            let line_end = self.cursor.pos();
            if !self.skip_to_next_content_line() {
                self.cursor.set_pos(line_end);
                break;
            }
            let prefix_start = self.cursor.pos();
            let skipped = self.cursor.slice(line_end, prefix_start);
            let line_break = if skipped.ends_with("\r\n") {
                "\r\n"
            } else if skipped.ends_with('\r') {
                "\r"
            } else {
                "\n"
            };
            let prefix = self.cursor.eat_while(is_spacing);
            let block_indent = *indent.get_or_insert(prefix);
            let belongs = prefix.starts_with(block_indent)
                && block_indent.len() > outer.len()
                && block_indent.starts_with(outer);
            if !belongs {
                self.cursor.set_pos(line_end);
                break;
            }
            self.cursor.set_pos(prefix_start + block_indent.len());
            let options = Options::with_newline_token(format!("{line_break}{block_indent}"));
            self.read_statements(data, &options, "Fail to read block of code")?;
        }
        Ok(self.complete_line(data, start))
    }

    /// From the end of a line, move to the start of the next line that is
    /// not blank. Returns `false` at the end of input.
    fn skip_to_next_content_line(&mut self) -> bool {
        loop {
            if !self.cursor.skip_newline() {
                return false;
            }
            let line_start = self.cursor.pos();
            self.cursor.skip_spacing();
            if self.cursor.is_eof() {
                return false;
            }
            if !self.at_line_end() {
                self.cursor.set_pos(line_start);
                return true;
            }
        }
    }
}
