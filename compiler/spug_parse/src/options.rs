//! Expression grammar options.
//!
//! The same expression grammar is embedded in several markup positions that
//! end differently: an output line ends at the newline, an attribute value
//! ends at an unbracketed comma or space, and a statement in a code block
//! may continue onto the next line when that line carries the block's
//! indentation. [`Options`] captures those differences.

use bitflags::bitflags;
use spug_ir::Op;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ParseFlags: u8 {
        /// A newline ends the expression.
        const STOP_ON_NEWLINE = 1;
        /// An unbracketed `:` ends the expression instead of being parsed.
        const STOP_ON_ROOT_COLON = 1 << 1;
        /// An unbracketed `,` ends the expression instead of being parsed.
        const STOP_ON_ROOT_COMMA = 1 << 2;
        /// An unbracketed `;` ends the expression instead of being parsed.
        const STOP_ON_ROOT_SEQUENCE = 1 << 3;
        /// A newline followed by [`Options::newline_token`] is whitespace.
        const USE_NEWLINE_TOKEN = 1 << 4;

        const STOP_ON_ROOT = Self::STOP_ON_ROOT_COLON.bits()
            | Self::STOP_ON_ROOT_COMMA.bits()
            | Self::STOP_ON_ROOT_SEQUENCE.bits();
    }
}

/// Set of enabled operators, one bit per [`Op`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OperatorSet(u64);

impl OperatorSet {
    pub const fn all() -> Self {
        OperatorSet((1u64 << Op::COUNT) - 1)
    }

    pub const fn empty() -> Self {
        OperatorSet(0)
    }

    #[inline]
    pub const fn contains(self, op: Op) -> bool {
        self.0 & (1u64 << op as u8) != 0
    }

    #[must_use]
    pub const fn with(self, op: Op) -> Self {
        OperatorSet(self.0 | (1u64 << op as u8))
    }

    #[must_use]
    pub const fn without(self, op: Op) -> Self {
        OperatorSet(self.0 & !(1u64 << op as u8))
    }
}

impl Default for OperatorSet {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<Op> for OperatorSet {
    fn from_iter<I: IntoIterator<Item = Op>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), OperatorSet::with)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    pub operators: OperatorSet,
    pub flags: ParseFlags,
    pub newline_token: String,
}

impl Options {
    /// Expressions embedded in a single markup line.
    pub fn inline() -> Self {
        Options {
            operators: OperatorSet::all(),
            flags: ParseFlags::STOP_ON_NEWLINE | ParseFlags::STOP_ON_ROOT,
            newline_token: String::new(),
        }
    }

    /// Free-standing scripts where newlines are plain whitespace.
    pub fn script() -> Self {
        Options {
            operators: OperatorSet::all(),
            flags: ParseFlags::STOP_ON_ROOT,
            newline_token: String::new(),
        }
    }

    /// Statements of a code block whose lines start with `token`
    /// (a newline followed by the block's indentation).
    pub fn with_newline_token(token: impl Into<String>) -> Self {
        Options {
            operators: OperatorSet::all(),
            flags: ParseFlags::STOP_ON_ROOT | ParseFlags::USE_NEWLINE_TOKEN,
            newline_token: token.into(),
        }
    }

    #[must_use]
    pub fn with_operators(mut self, operators: OperatorSet) -> Self {
        self.operators = operators;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: ParseFlags) -> Self {
        self.flags = flags;
        self
    }

    #[inline]
    pub fn has(&self, flag: ParseFlags) -> bool {
        self.flags.contains(flag)
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::inline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_set() {
        let set = OperatorSet::all().without(Op::Assignment);
        assert!(!set.contains(Op::Assignment));
        assert!(set.contains(Op::Sequence));
        assert!(set.contains(Op::NoOp));

        let only: OperatorSet = [Op::Sum, Op::Mult].into_iter().collect();
        assert!(only.contains(Op::Mult));
        assert!(!only.contains(Op::Sub));
    }

    #[test]
    fn test_presets() {
        assert!(Options::inline().has(ParseFlags::STOP_ON_NEWLINE));
        assert!(Options::inline().has(ParseFlags::STOP_ON_ROOT_COMMA));
        assert!(!Options::script().has(ParseFlags::STOP_ON_NEWLINE));
        let block = Options::with_newline_token("\n\t");
        assert!(block.has(ParseFlags::USE_NEWLINE_TOKEN));
        assert_eq!(block.newline_token, "\n\t");
    }
}
