//! Operator recognition.

use spug_ir::Op;

use super::Parser;
use crate::{ParseError, ParseFlags};

/// Operators consumed on recognition, longest spellings first.
const CONSUMED: [(&str, Op); 24] = [
    ("+=", Op::SumAssignment),
    ("-=", Op::DiffAssignment),
    ("*=", Op::MultAssignment),
    ("/=", Op::DivAssignment),
    ("%=", Op::RemAssignment),
    ("<<=", Op::ShlAssignment),
    (">>=", Op::ShrAssignment),
    ("&=", Op::AndAssignment),
    ("^=", Op::XorAssignment),
    ("|=", Op::OrAssignment),
    ("&&", Op::And),
    ("||", Op::Or),
    ("++", Op::SuffixIncr),
    ("--", Op::SuffixDecr),
    ("<<", Op::ShiftLeft),
    (">>", Op::ShiftRight),
    ("<=", Op::LtEq),
    (">=", Op::GtEq),
    ("==", Op::Eq),
    ("!=", Op::NotEq),
    ("::", Op::Scope),
    ("=", Op::Assignment),
    ("#", Op::Sharp),
    (".", Op::Dot),
];

impl Parser<'_, '_> {
    /// Recognize the operator at the cursor.
    ///
    /// Opening brackets and `?` are returned without being consumed; the
    /// group reader consumes them. `Ok(None)` means the expression ends
    /// here: the byte is not an operator, or it is a separator that stops
    /// an unbracketed expression.
    pub(super) fn read_operator(&mut self, close: Option<u8>) -> Result<Option<Op>, ParseError> {
        let op = if let Some(op) = self.read_consumed_operator() {
            op
        } else {
            match self.cursor.current() {
                b'?' => Op::Conditional,
                b'(' => Op::Call,
                b'[' => Op::Subscript,
                b'{' => Op::Construct,
                b => {
                    let Some(op) = self.read_single_operator(b, close.is_some()) else {
                        return Ok(None);
                    };
                    self.cursor.advance();
                    op
                }
            }
        };
        self.check_enabled(op)?;
        Ok(Some(op))
    }

    fn read_consumed_operator(&mut self) -> Option<Op> {
        CONSUMED
            .iter()
            .find(|(symbol, _)| self.cursor.starts_with(symbol))
            .map(|&(symbol, op)| {
                self.cursor.advance_by(symbol.len());
                op
            })
    }

    fn read_single_operator(&self, b: u8, in_brackets: bool) -> Option<Op> {
        let stops = |flag| !in_brackets && self.options.has(flag);
        match b {
            b'*' => Some(Op::Mult),
            b'/' => Some(Op::Div),
            b'%' => Some(Op::Rem),
            b'+' => Some(Op::Sum),
            b'-' => Some(Op::Sub),
            b'<' => Some(Op::Lt),
            b'>' => Some(Op::Gt),
            b'&' => Some(Op::BitAnd),
            b'^' => Some(Op::BitXor),
            b'|' => Some(Op::BitOr),
            b':' if !stops(ParseFlags::STOP_ON_ROOT_COLON) => Some(Op::Colon),
            b',' if !stops(ParseFlags::STOP_ON_ROOT_COMMA) => Some(Op::Comma),
            b';' if !stops(ParseFlags::STOP_ON_ROOT_SEQUENCE) => Some(Op::Sequence),
            _ => None,
        }
    }
}
