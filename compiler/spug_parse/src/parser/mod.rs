//! Precedence-climbing expression parser.
//!
//! # Architecture
//!
//! The parser reads operands and operators alternately and grows the tree by
//! insertion: each new binary operator is spliced into the tree built so far
//! at the position its priority dictates ([`Parser::insert_op`]). Nodes are
//! never re-parented by pointer; instead the node at the insertion point is
//! moved into a fresh slot and its old id is reused for the operator, so the
//! parent link that pointed at the insertion point stays valid.
//!
//! Bracket groups (`(...)`, `[...]`, `{...}`, and the `? ... :` half of the
//! ternary) recurse through [`Parser::read_group`] and are marked with a
//! [`Block`]; insertion never descends into a marked group.

mod operand;
mod operators;

use spug_ir::{ensure_sufficient_stack, Block, Cursor, Expr, ExprArena, ExprId, Op};
use tracing::trace;

use crate::{Options, ParseError, ParseErrorKind, ParseFlags};

pub(crate) struct Parser<'a, 'src> {
    arena: &'a mut ExprArena,
    cursor: Cursor<'src>,
    options: &'a Options,
}

impl<'a, 'src> Parser<'a, 'src> {
    pub(crate) fn new(arena: &'a mut ExprArena, cursor: Cursor<'src>, options: &'a Options) -> Self {
        Parser {
            arena,
            cursor,
            options,
        }
    }

    pub(crate) fn pos(&self) -> usize {
        self.cursor.pos()
    }

    /// Parse one expression from the cursor position.
    pub(crate) fn parse_root(&mut self) -> Result<ExprId, ParseError> {
        let root = self.arena.alloc(Expr::empty());
        self.read_operand(root, Op::NoOp)?;
        while self.skip_whitespace(true) {
            let Some(op) = self.read_operator(None)? else {
                break;
            };
            self.apply_operator(root, op)?;
        }
        trace!(expr = %self.arena.dump(root), "parsed expression");
        Ok(root)
    }

    /// Parse a bracket group starting at the opening bracket into `slot`.
    fn read_group(&mut self, slot: ExprId) -> Result<(), ParseError> {
        ensure_sufficient_stack(|| {
            let open = self.cursor.current();
            let (close, block, target) = match open {
                b'(' => (b')', Block::Parenthesis, Op::Call),
                b'[' => (b']', Block::Composition, Op::Subscript),
                b'{' => (b'}', Block::Operator, Op::Construct),
                b'?' => (b':', Block::Parenthesis, Op::Conditional),
                _ => return Err(self.error(ParseErrorKind::MissingOperand)),
            };
            let unmatched = ParseErrorKind::UnmatchedBracket(char::from(close));
            self.cursor.advance();

            if !self.skip_whitespace(false) {
                return Err(self.error(unmatched));
            }
            if matches!(open, b'[' | b'{') && self.cursor.eat(close) {
                let expr = self.arena.get_mut(slot);
                expr.op = target;
                expr.block = block;
                return Ok(());
            }

            self.read_operand(slot, target)?;
            loop {
                if !self.skip_whitespace(false) {
                    return Err(self.error(unmatched));
                }
                if self.cursor.is(close) {
                    break;
                }
                let Some(op) = self.read_operator(Some(close))? else {
                    return Err(self.error(unmatched));
                };
                self.apply_operator(slot, op)?;
            }
            self.cursor.advance();

            if self.arena.get(slot).block != Block::None {
                // The whole group is another group: keep both levels.
                let inner = std::mem::replace(self.arena.get_mut(slot), Expr::empty());
                let inner = self.arena.alloc(inner);
                self.arena.get_mut(slot).left = Some(inner);
            }
            self.arena.get_mut(slot).block = block;
            Ok(())
        })
    }

    /// Insert `op` into the tree rooted at `root` and read its right side.
    fn apply_operator(&mut self, root: ExprId, op: Op) -> Result<(), ParseError> {
        let node = self.insert_op(root, op);
        if op.is_suffix() {
            return Ok(());
        }
        let Some(right) = self.arena.get(node).right else {
            return Ok(());
        };
        match op {
            Op::Call | Op::Subscript | Op::Construct => self.read_group(right),
            Op::Conditional => {
                self.read_group(right)?;
                let switch = self.insert_op(root, Op::ConditionalSwitch);
                match self.arena.get(switch).right {
                    Some(otherwise) => self.read_operand(otherwise, Op::ConditionalSwitch),
                    None => Ok(()),
                }
            }
            _ => self.read_operand(right, op),
        }
    }

    /// Splice `op` into the tree and return the id of the new operator node,
    /// whose right child (if any) is an empty slot to be filled.
    fn insert_op(&mut self, root: ExprId, op: Op) -> ExprId {
        let priority = op.priority();

        let mut current = root;
        loop {
            let node = self.arena.get(current);
            if node.op.priority() <= priority || node.block != Block::None {
                break;
            }
            match node.right.or(node.left) {
                Some(child) => current = child,
                None => break,
            }
        }

        let node = self.arena.get(current);
        if op.is_right_assoc()
            && node.op.priority() >= priority
            && node.block == Block::None
            && node.right.is_some()
        {
            let mut parent = current;
            while let Some(right) = self.arena.get(parent).right {
                let next = self.arena.get(right);
                if next.left.is_some()
                    && next.right.is_some()
                    && next.op.priority() == priority
                    && next.block == Block::None
                {
                    parent = right;
                } else {
                    break;
                }
            }
            let operand = self.arena.get(parent).right;
            let slot = self.arena.alloc(Expr::empty());
            let node = self.arena.alloc(Expr::node(op, operand, Some(slot)));
            self.arena.get_mut(parent).right = Some(node);
            return node;
        }

        let moved = std::mem::replace(self.arena.get_mut(current), Expr::empty());
        let moved = self.arena.alloc(moved);
        let right = if op.is_suffix() {
            None
        } else {
            Some(self.arena.alloc(Expr::empty()))
        };
        *self.arena.get_mut(current) = Expr::node(op, Some(moved), right);
        current
    }

    /// Skip whitespace between tokens. Returns `false` when the expression
    /// cannot continue: end of input, or a newline that ends it.
    ///
    /// `finalizable` is true where the expression is complete if it stops
    /// here (after an operand at the root).
    fn skip_whitespace(&mut self, finalizable: bool) -> bool {
        if self.options.has(ParseFlags::USE_NEWLINE_TOKEN) {
            // Where the expression ends if no continuation follows.
            let mut line_end = None;
            loop {
                self.cursor.skip_spacing();
                if !self.cursor.is_class(spug_ir::chars::is_newline) {
                    break;
                }
                let end = *line_end.get_or_insert(self.cursor.pos());
                if self.skip_blank_line() {
                    continue;
                }
                let token = self.options.newline_token.as_str();
                if finalizable || token.is_empty() || !self.cursor.starts_with(token) {
                    self.cursor.set_pos(end);
                    return false;
                }
                self.cursor.advance_by(token.len());
                line_end = None;
            }
        } else if self.options.has(ParseFlags::STOP_ON_NEWLINE) {
            self.cursor.skip_spacing();
            if self.cursor.is_class(spug_ir::chars::is_newline) {
                return false;
            }
        } else {
            if finalizable {
                self.cursor.skip_spacing();
                if self.cursor.is_class(spug_ir::chars::is_newline) {
                    return false;
                }
            }
            self.cursor.skip_whitespace();
        }
        !self.cursor.is_eof()
    }

    /// At a newline: if the next line is blank, consume up to its own
    /// newline and return `true`.
    fn skip_blank_line(&mut self) -> bool {
        let start = self.cursor.pos();
        self.cursor.skip_newline();
        self.cursor.skip_spacing();
        if self.cursor.is_class(spug_ir::chars::is_newline) {
            true
        } else {
            self.cursor.set_pos(start);
            false
        }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.cursor.pos())
    }

    fn check_enabled(&self, op: Op) -> Result<(), ParseError> {
        if self.options.operators.contains(op) {
            Ok(())
        } else {
            Err(self.error(ParseErrorKind::DisabledOperator(op.symbol())))
        }
    }
}
