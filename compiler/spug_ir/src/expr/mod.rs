//! Flat expression trees.
//!
//! Expressions are stored in an [`ExprArena`] and addressed by [`ExprId`].
//! Every markup line that embeds an expression shares the arena of the
//! template it belongs to; chunks reference their expressions by id.
//!
//! # Node shapes
//!
//! - Leaf: `op == NoOp`, no children, payload in `value`. `is_token` marks
//!   identifiers (the name is a string payload) as opposed to literals.
//!   A token with a null payload is the empty argument list of `f()`.
//! - Prefix unary (`!x`, `-x`, `~x`, `++x`, `--x`, `var x`): left child only.
//! - Suffix (`x++`, `x--`): left child only.
//! - Binary: both children. Ternaries are
//!   `ConditionalSwitch(Conditional(cond, then), else)`.
//! - Empty literals `[]` and `{}`: no children, `op` is `Subscript` or
//!   `Construct` with the matching [`Block`].
//! - Group: `op == NoOp` with a left child only, used when a bracket group
//!   directly wraps another bracket group (`[[1]]`).

mod op;

pub use op::Op;

use std::fmt::{self, Write};

use crate::value::{format_float, Value};
use crate::ensure_sufficient_stack;

/// Index into an [`ExprArena`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        ExprId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Bracket kind a (sub)expression was written in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Block {
    #[default]
    None,
    /// `( ... )`
    Parenthesis,
    /// `[ ... ]`
    Composition,
    /// `{ ... }`
    Operator,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub op: Op,
    pub left: Option<ExprId>,
    pub right: Option<ExprId>,
    pub block: Block,
    pub is_token: bool,
    pub value: Value,
}

impl Expr {
    /// Empty leaf, filled in place by the parser.
    pub const fn empty() -> Self {
        Expr {
            op: Op::NoOp,
            left: None,
            right: None,
            block: Block::None,
            is_token: false,
            value: Value::Null,
        }
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Expr {
            value: value.into(),
            ..Expr::empty()
        }
    }

    pub fn token(name: impl Into<String>) -> Self {
        Expr {
            is_token: true,
            value: Value::Str(name.into()),
            ..Expr::empty()
        }
    }

    pub const fn node(op: Op, left: Option<ExprId>, right: Option<ExprId>) -> Self {
        Expr {
            op,
            left,
            right,
            block: Block::None,
            is_token: false,
            value: Value::Null,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Identifier name of a token leaf.
    pub fn name(&self) -> Option<&str> {
        match (&self.value, self.is_token) {
            (Value::Str(s), true) => Some(s),
            _ => None,
        }
    }

    /// Token with no name: the argument node of `f()`.
    pub fn is_empty_token(&self) -> bool {
        self.is_token && self.is_leaf() && self.value.is_null()
    }
}

/// Arena of expression nodes.
#[derive(Clone, Debug, Default)]
pub struct ExprArena {
    nodes: Vec<Expr>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, expr: Expr) -> ExprId {
        let index = u32::try_from(self.nodes.len()).unwrap_or(u32::MAX);
        self.nodes.push(expr);
        ExprId(index)
    }

    #[inline]
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every node allocated after `len`; used to discard a failed parse.
    pub fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
    }

    /// True iff the subtree can be evaluated without a context: it contains
    /// no call and no identifier other than a dictionary key.
    pub fn is_const(&self, id: ExprId) -> bool {
        self.is_const_under(id, Op::NoOp)
    }

    fn is_const_under(&self, id: ExprId, parent: Op) -> bool {
        ensure_sufficient_stack(|| {
            let expr = self.get(id);
            if expr.op == Op::Call {
                return false;
            }
            match (expr.left, expr.right) {
                (Some(left), Some(right)) => {
                    self.is_const_under(left, expr.op) && self.is_const_under(right, Op::NoOp)
                }
                (Some(child), None) | (None, Some(child)) => self.is_const_under(child, Op::NoOp),
                (None, None) => !expr.is_token || parent == Op::Colon,
            }
        })
    }

    /// S-expression dump of a subtree, e.g. `(+ a (* b 2))`.
    pub fn dump(&self, id: ExprId) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.dump_into(id, &mut out);
        out
    }

    fn dump_into(&self, id: ExprId, out: &mut String) -> fmt::Result {
        ensure_sufficient_stack(|| {
            let expr = self.get(id);
            let (open, close) = match expr.block {
                Block::Composition => ("[", "]"),
                Block::Operator => ("{", "}"),
                Block::None | Block::Parenthesis => ("", ""),
            };
            out.push_str(open);
            if expr.is_leaf() {
                // `[]` and `{}` leaves print as their brackets alone.
                if expr.op == Op::NoOp {
                    if expr.is_empty_token() {
                        out.push_str("()");
                    } else if expr.is_token {
                        out.push_str(&expr.value.to_text());
                    } else {
                        dump_literal(&expr.value, out)?;
                    }
                }
            } else {
                write!(out, "({}", expr.op.dump_name())?;
                for child in [expr.left, expr.right].into_iter().flatten() {
                    out.push(' ');
                    self.dump_into(child, out)?;
                }
                out.push(')');
            }
            out.push_str(close);
            Ok(())
        })
    }
}

fn dump_literal(value: &Value, out: &mut String) -> fmt::Result {
    match value {
        Value::Null => out.push_str("null"),
        Value::Str(_) => out.push_str(&value.to_json()),
        Value::Float(f) => {
            let text = format_float(*f);
            out.push_str(&text);
            if f.is_finite() && !text.contains(['.', 'e']) {
                out.push_str(".0");
            }
        }
        _ => write!(out, "{}", value.to_text())?,
    }
    Ok(())
}

#[cfg(test)]
mod tests;
