//! Line reader with indentation tracking.
//!
//! The lexer keeps a stack of open parents, one per indentation level. A
//! line one level deeper than the previous one opens the previous line as a
//! parent; a shallower line pops back to the parent of its level.

mod code;
mod line;
mod tag;
mod text;

use spug_ir::chars::{is_newline, is_spacing};
use spug_ir::{Cursor, Span, TokenId, TokenKind, TokenTree};
use spug_parse::{Options, ParseFlags};
use tracing::trace;

use crate::LexError;

/// Output expressions (`= a, b`) keep unbracketed commas: each element is
/// printed in turn.
fn output_options() -> Options {
    Options::inline().with_flags(
        ParseFlags::STOP_ON_NEWLINE | ParseFlags::STOP_ON_ROOT_COLON | ParseFlags::STOP_ON_ROOT_SEQUENCE,
    )
}

/// Indentation unit, fixed by the first indented line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum IndentUnit {
    Tabs,
    Spaces(usize),
}

pub(crate) struct Lexer<'src> {
    tree: TokenTree<'src>,
    cursor: Cursor<'src>,
    unit: Option<IndentUnit>,
    /// Open parents; `parents[n]` receives the lines of depth `n`.
    parents: Vec<TokenId>,
    /// Innermost line of an `a: b` chain on the previous line. A deeper
    /// next line nests under it.
    chained: Option<TokenId>,
}

impl<'src> Lexer<'src> {
    pub(crate) fn new(source: &'src str) -> Self {
        Lexer {
            tree: TokenTree::new(source),
            cursor: Cursor::new(source),
            unit: None,
            parents: vec![TokenId::ROOT],
            chained: None,
        }
    }

    pub(crate) fn run(mut self) -> Result<TokenTree<'src>, LexError> {
        while !self.cursor.is_eof() {
            let indent_start = self.cursor.pos();
            let prefix = self.cursor.eat_while(is_spacing);
            if self.at_line_end() {
                self.finish_line();
                continue;
            }
            let depth = self.depth(prefix, indent_start)?;
            self.enter_depth(depth, indent_start)?;
            self.read_line_group()?;
            self.finish_line();
        }
        Ok(self.tree)
    }

    /// Read one source line, plus any lines chained onto it with `:`.
    fn read_line_group(&mut self) -> Result<(), LexError> {
        let parent = self.parent();
        self.chained = None;

        if self.nests_plain_text(parent) {
            let line = self.read_plain_line()?;
            self.tree.append(parent, line);
            return Ok(());
        }

        let mut line = self.read_line()?;
        self.tree.append(parent, line);
        while self.cursor.eat(b':') {
            self.cursor.skip_spacing();
            if self.at_line_end() {
                break;
            }
            let next = self.read_line()?;
            self.tree.append(line, next);
            self.chained = Some(next);
            line = next;
        }
        Ok(())
    }

    /// Indentation depth of the prefix just consumed.
    fn depth(&mut self, prefix: &str, offset: usize) -> Result<usize, LexError> {
        if prefix.is_empty() {
            return Ok(0);
        }
        let tabs = prefix.bytes().all(|b| b == b'\t');
        let spaces = prefix.bytes().all(|b| b == b' ');
        if !tabs && !spaces {
            return Err(self.error(offset, "Inconsistent indentation"));
        }
        match self.unit {
            None => {
                let unit = if tabs {
                    IndentUnit::Tabs
                } else {
                    IndentUnit::Spaces(prefix.len())
                };
                trace!(?unit, "calibrated indentation");
                self.unit = Some(unit);
                Ok(1)
            }
            Some(IndentUnit::Tabs) if tabs => Ok(prefix.len()),
            Some(IndentUnit::Spaces(width)) if spaces => Ok(prefix.len() / width),
            Some(_) => Err(self.error(offset, "Inconsistent indentation")),
        }
    }

    fn enter_depth(&mut self, depth: usize, offset: usize) -> Result<(), LexError> {
        let level = self.parents.len() - 1;
        if depth == level + 1 {
            let parent = self.parent();
            let Some(previous) = self.chained.or_else(|| self.last_line(parent)) else {
                return Err(self.error(offset, "Wrong indentation markup"));
            };
            self.parents.push(previous);
        } else if depth <= level {
            self.parents.truncate(depth + 1);
        } else {
            return Err(self.error(offset, "Wrong indentation markup"));
        }
        Ok(())
    }

    /// Last line appended to `parent`, skipping the data token of a `Line`
    /// and the loop variables of an `each`.
    fn last_line(&self, parent: TokenId) -> Option<TokenId> {
        let token = self.tree.get(parent);
        let tail = token.tail?;
        let is_line = match token.kind {
            TokenKind::Line => token.child != Some(tail),
            _ => self.tree.kind(tail) != TokenKind::ControlEachVariable,
        };
        is_line.then_some(tail)
    }

    fn parent(&self) -> TokenId {
        self.parents.last().copied().unwrap_or(TokenId::ROOT)
    }

    /// Lines nested in comments, `.` blocks, `tag.` lines and other text
    /// lines are text.
    fn nests_plain_text(&self, parent: TokenId) -> bool {
        let token = self.tree.get(parent);
        if token.kind != TokenKind::Line {
            return false;
        }
        let Some(data) = token.child else {
            return false;
        };
        let data = self.tree.get(data);
        data.kind.nests_plain_text()
            || (data.kind == TokenKind::LineData
                && data.tail.map(|tail| self.tree.kind(tail)) == Some(TokenKind::TagTrailingDot))
    }

    /// Wrap a finished data token into a `Line` token.
    fn complete_line(&mut self, data: TokenId, start: usize) -> TokenId {
        let end = self.cursor.pos();
        let data_start = self.tree.get(data).span.start as usize;
        self.tree.set_span(data, Span::from_range(data_start..end));
        let line = self.tree.alloc(TokenKind::Line, Span::from_range(start..end), None);
        self.tree.append(line, data);
        trace!(kind = ?self.tree.kind(data), line = ?self.tree.get(line).span, "line");
        line
    }

    fn at_line_end(&self) -> bool {
        self.cursor.is_eof() || self.cursor.is_class(is_newline)
    }

    /// Skip whatever is left of the current line and its terminator.
    fn finish_line(&mut self) {
        self.cursor.rest_of_line();
        self.cursor.skip_newline();
    }

    fn error(&self, offset: usize, message: &str) -> LexError {
        LexError::new(self.tree.source(), offset, message)
    }
}
