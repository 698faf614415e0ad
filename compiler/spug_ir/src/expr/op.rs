//! Expression operators and their precedence table.

/// Expression operator.
///
/// Declaration order is significant: [`Op::ALL`] and operator sets index
/// operators by discriminant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Op {
    /// Leaf or transparent group.
    NoOp,
    /// `var name` declaration.
    Var,
    SuffixIncr,
    SuffixDecr,
    Sharp,
    Dot,
    Scope,
    Call,
    Subscript,
    Construct,
    PrefixIncr,
    PrefixDecr,
    /// Unary `-`.
    Minus,
    /// Unary `!`.
    Neg,
    BitNot,
    Mult,
    Div,
    Rem,
    Sum,
    Sub,
    ShiftLeft,
    ShiftRight,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
    /// `cond ? then`, always the left child of a [`Op::ConditionalSwitch`].
    Conditional,
    /// `: else` half of the ternary.
    ConditionalSwitch,
    Assignment,
    SumAssignment,
    DiffAssignment,
    MultAssignment,
    DivAssignment,
    RemAssignment,
    ShlAssignment,
    ShrAssignment,
    AndAssignment,
    XorAssignment,
    OrAssignment,
    Colon,
    Comma,
    Sequence,
}

impl Op {
    pub const COUNT: usize = Op::Sequence as usize + 1;

    pub const ALL: [Op; Op::COUNT] = [
        Op::NoOp,
        Op::Var,
        Op::SuffixIncr,
        Op::SuffixDecr,
        Op::Sharp,
        Op::Dot,
        Op::Scope,
        Op::Call,
        Op::Subscript,
        Op::Construct,
        Op::PrefixIncr,
        Op::PrefixDecr,
        Op::Minus,
        Op::Neg,
        Op::BitNot,
        Op::Mult,
        Op::Div,
        Op::Rem,
        Op::Sum,
        Op::Sub,
        Op::ShiftLeft,
        Op::ShiftRight,
        Op::Lt,
        Op::LtEq,
        Op::Gt,
        Op::GtEq,
        Op::Eq,
        Op::NotEq,
        Op::BitAnd,
        Op::BitXor,
        Op::BitOr,
        Op::And,
        Op::Or,
        Op::Conditional,
        Op::ConditionalSwitch,
        Op::Assignment,
        Op::SumAssignment,
        Op::DiffAssignment,
        Op::MultAssignment,
        Op::DivAssignment,
        Op::RemAssignment,
        Op::ShlAssignment,
        Op::ShrAssignment,
        Op::AndAssignment,
        Op::XorAssignment,
        Op::OrAssignment,
        Op::Colon,
        Op::Comma,
        Op::Sequence,
    ];

    /// Binding strength; lower binds tighter.
    pub const fn priority(self) -> u8 {
        match self {
            Op::NoOp => 0,
            Op::Var
            | Op::SuffixIncr
            | Op::SuffixDecr
            | Op::Sharp
            | Op::Dot
            | Op::Scope
            | Op::Call
            | Op::Subscript
            | Op::Construct => 1,
            Op::PrefixIncr | Op::PrefixDecr | Op::Minus | Op::Neg | Op::BitNot => 2,
            Op::Mult | Op::Div | Op::Rem => 3,
            Op::Sum | Op::Sub => 4,
            Op::ShiftLeft | Op::ShiftRight => 5,
            Op::Lt | Op::LtEq | Op::Gt | Op::GtEq => 6,
            Op::Eq | Op::NotEq => 7,
            Op::BitAnd => 8,
            Op::BitXor => 9,
            Op::BitOr => 10,
            Op::And => 11,
            Op::Or => 12,
            Op::Conditional => 13,
            Op::ConditionalSwitch => 14,
            Op::Assignment
            | Op::SumAssignment
            | Op::DiffAssignment
            | Op::MultAssignment
            | Op::DivAssignment
            | Op::RemAssignment
            | Op::ShlAssignment
            | Op::ShrAssignment
            | Op::AndAssignment
            | Op::XorAssignment
            | Op::OrAssignment => 15,
            Op::Colon => 16,
            Op::Comma => 17,
            Op::Sequence => 18,
        }
    }

    pub const fn is_right_assoc(self) -> bool {
        matches!(
            self,
            Op::PrefixIncr
                | Op::PrefixDecr
                | Op::Minus
                | Op::Neg
                | Op::BitNot
                | Op::Conditional
                | Op::ConditionalSwitch
        ) || self.is_assignment()
    }

    pub const fn is_assignment(self) -> bool {
        matches!(
            self,
            Op::Assignment
                | Op::SumAssignment
                | Op::DiffAssignment
                | Op::MultAssignment
                | Op::DivAssignment
                | Op::RemAssignment
                | Op::ShlAssignment
                | Op::ShrAssignment
                | Op::AndAssignment
                | Op::XorAssignment
                | Op::OrAssignment
        )
    }

    /// Operators written before their operand.
    pub const fn is_prefix(self) -> bool {
        matches!(
            self,
            Op::Var | Op::PrefixIncr | Op::PrefixDecr | Op::Minus | Op::Neg | Op::BitNot
        )
    }

    /// Operators written after their operand, stored without a right child.
    pub const fn is_suffix(self) -> bool {
        matches!(self, Op::SuffixIncr | Op::SuffixDecr)
    }

    /// Source spelling.
    pub const fn symbol(self) -> &'static str {
        match self {
            Op::NoOp => "",
            Op::Var => "var",
            Op::SuffixIncr | Op::PrefixIncr => "++",
            Op::SuffixDecr | Op::PrefixDecr => "--",
            Op::Sharp => "#",
            Op::Dot => ".",
            Op::Scope => "::",
            Op::Call => "()",
            Op::Subscript => "[]",
            Op::Construct => "{}",
            Op::Minus | Op::Sub => "-",
            Op::Neg => "!",
            Op::BitNot => "~",
            Op::Mult => "*",
            Op::Div => "/",
            Op::Rem => "%",
            Op::Sum => "+",
            Op::ShiftLeft => "<<",
            Op::ShiftRight => ">>",
            Op::Lt => "<",
            Op::LtEq => "<=",
            Op::Gt => ">",
            Op::GtEq => ">=",
            Op::Eq => "==",
            Op::NotEq => "!=",
            Op::BitAnd => "&",
            Op::BitXor => "^",
            Op::BitOr => "|",
            Op::And => "&&",
            Op::Or => "||",
            Op::Conditional => "?",
            Op::ConditionalSwitch => "?:",
            Op::Assignment => "=",
            Op::SumAssignment => "+=",
            Op::DiffAssignment => "-=",
            Op::MultAssignment => "*=",
            Op::DivAssignment => "/=",
            Op::RemAssignment => "%=",
            Op::ShlAssignment => "<<=",
            Op::ShrAssignment => ">>=",
            Op::AndAssignment => "&=",
            Op::XorAssignment => "^=",
            Op::OrAssignment => "|=",
            Op::Colon => ":",
            Op::Comma => ",",
            Op::Sequence => ";",
        }
    }

    /// Unambiguous name used by tree dumps.
    pub const fn dump_name(self) -> &'static str {
        match self {
            Op::NoOp => "group",
            Op::SuffixIncr => "post++",
            Op::SuffixDecr => "post--",
            Op::PrefixIncr => "pre++",
            Op::PrefixDecr => "pre--",
            Op::Minus => "neg",
            Op::Call => "call",
            Op::Subscript => "index",
            Op::Construct => "construct",
            _ => self.symbol(),
        }
    }
}
