//! Operands: prefix operators, bracket groups and literals.

use spug_ir::chars::{is_digit, is_ident, is_spacing};
use spug_ir::{ensure_sufficient_stack, Expr, ExprId, Op, Value};

use super::Parser;
use crate::{ParseError, ParseErrorKind};

impl Parser<'_, '_> {
    /// Fill the empty node `slot` with one operand. `op` is the operator the
    /// operand belongs to; after `.`, `#` and `::` the operand is a bare
    /// name.
    pub(super) fn read_operand(&mut self, slot: ExprId, op: Op) -> Result<(), ParseError> {
        ensure_sufficient_stack(|| {
            if !self.skip_whitespace(false) {
                return Err(self.error(ParseErrorKind::MissingOperand));
            }
            if matches!(op, Op::Dot | Op::Sharp | Op::Scope) {
                return self.read_name(slot);
            }

            let mut slot = slot;
            while let Some(prefix) = self.read_prefix()? {
                if let Some(prefix) = prefix {
                    let operand = self.arena.alloc(Expr::empty());
                    *self.arena.get_mut(slot) = Expr::node(prefix, Some(operand), None);
                    slot = operand;
                }
                if !self.skip_whitespace(false) {
                    return Err(self.error(ParseErrorKind::MissingOperand));
                }
            }

            if matches!(self.cursor.current(), b'(' | b'[' | b'{') {
                return self.read_group(slot);
            }
            self.read_value(slot, op)
        })
    }

    /// Consume one prefix operator. `Some(None)` is unary `+`, which is
    /// consumed without producing a node.
    fn read_prefix(&mut self) -> Result<Option<Option<Op>>, ParseError> {
        let prefix = if self.cursor.starts_with("var") && is_spacing(self.cursor.peek(3)) {
            self.cursor.advance_by(3);
            Some(Op::Var)
        } else if self.cursor.eat_str("++") {
            Some(Op::PrefixIncr)
        } else if self.cursor.eat_str("--") {
            Some(Op::PrefixDecr)
        } else {
            let op = match self.cursor.current() {
                b'!' => Some(Op::Neg),
                b'-' => Some(Op::Minus),
                b'~' => Some(Op::BitNot),
                b'+' => None,
                _ => return Ok(None),
            };
            self.cursor.advance();
            op
        };
        if let Some(op) = prefix {
            self.check_enabled(op)?;
        }
        Ok(Some(prefix))
    }

    fn read_name(&mut self, slot: ExprId) -> Result<(), ParseError> {
        let name = self.cursor.eat_while(is_ident);
        if name.is_empty() {
            return Err(self.error(ParseErrorKind::MissingOperand));
        }
        *self.arena.get_mut(slot) = Expr::token(name);
        Ok(())
    }

    fn read_value(&mut self, slot: ExprId, op: Op) -> Result<(), ParseError> {
        let expr = match self.cursor.current() {
            b'"' | b'\'' => Expr::literal(self.read_string()?),
            b if is_digit(b) => Expr::literal(self.read_number()),
            _ => {
                let name = self.cursor.eat_while(is_ident);
                match name {
                    "" if op == Op::Call => Expr {
                        is_token: true,
                        ..Expr::empty()
                    },
                    "" => return Err(self.error(ParseErrorKind::MissingOperand)),
                    "true" => Expr::literal(true),
                    "false" => Expr::literal(false),
                    "null" => Expr::literal(Value::Null),
                    "inf" => Expr::literal(f64::INFINITY),
                    "nan" => Expr::literal(f64::NAN),
                    _ => Expr::token(name),
                }
            }
        };
        *self.arena.get_mut(slot) = expr;
        Ok(())
    }

    /// Integer, or float when a fraction or exponent is present. Integers
    /// too large for `i64` become floats.
    fn read_number(&mut self) -> Value {
        let start = self.cursor.pos();
        self.cursor.eat_while(is_digit);
        let mut is_float = false;
        if self.cursor.is(b'.') && is_digit(self.cursor.peek(1)) {
            is_float = true;
            self.cursor.advance();
            self.cursor.eat_while(is_digit);
        }
        if matches!(self.cursor.current(), b'e' | b'E') {
            let sign = usize::from(matches!(self.cursor.peek(1), b'+' | b'-'));
            if is_digit(self.cursor.peek(1 + sign)) {
                is_float = true;
                self.cursor.advance_by(1 + sign);
                self.cursor.eat_while(is_digit);
            }
        }
        let text = self.cursor.slice(start, self.cursor.pos());
        if !is_float {
            if let Ok(int) = text.parse::<i64>() {
                return Value::Int(int);
            }
        }
        text.parse::<f64>().map_or(Value::Null, Value::Float)
    }

    fn read_string(&mut self) -> Result<String, ParseError> {
        let start = self.cursor.pos();
        let quote = self.cursor.current();
        self.cursor.advance();
        let mut out = String::new();
        loop {
            out.push_str(self.cursor.eat_until(|b| b == quote || b == b'\\'));
            if self.cursor.is_eof() {
                return Err(ParseError::new(ParseErrorKind::UnterminatedString, start));
            }
            if self.cursor.eat(quote) {
                return Ok(out);
            }
            self.cursor.advance();
            self.read_escape(&mut out, start)?;
        }
    }

    /// Decode the escape after a consumed backslash. Unknown escapes stand
    /// for the escaped character itself.
    fn read_escape(&mut self, out: &mut String, start: usize) -> Result<(), ParseError> {
        let unescaped = match self.cursor.current() {
            b'n' => '\n',
            b't' => '\t',
            b'r' => '\r',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'u' => {
                self.cursor.advance();
                return self.read_unicode_escape(out);
            }
            _ => {
                let Some(c) = self.cursor.rest().chars().next() else {
                    return Err(ParseError::new(ParseErrorKind::UnterminatedString, start));
                };
                self.cursor.advance_by(c.len_utf8());
                out.push(c);
                return Ok(());
            }
        };
        self.cursor.advance();
        out.push(unescaped);
        Ok(())
    }

    /// `XXXX` after `\u`, combining UTF-16 surrogate pairs.
    fn read_unicode_escape(&mut self, out: &mut String) -> Result<(), ParseError> {
        let high = self.read_hex4()?;
        let code = if (0xD800..0xDC00).contains(&high) {
            if !self.cursor.eat_str("\\u") {
                return Err(self.error(ParseErrorKind::MalformedEscape));
            }
            let low = self.read_hex4()?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(self.error(ParseErrorKind::MalformedEscape));
            }
            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
        } else {
            high
        };
        let c = char::from_u32(code).ok_or_else(|| self.error(ParseErrorKind::MalformedEscape))?;
        out.push(c);
        Ok(())
    }

    fn read_hex4(&mut self) -> Result<u32, ParseError> {
        let digits = self.cursor.rest().get(..4).unwrap_or_default();
        if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(self.error(ParseErrorKind::MalformedEscape));
        }
        let code = u32::from_str_radix(digits, 16)
            .map_err(|_| self.error(ParseErrorKind::MalformedEscape))?;
        self.cursor.advance_by(4);
        Ok(code)
    }
}
