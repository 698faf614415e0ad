//! Expression syntax errors.

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("missing closing `{0}`")]
    UnmatchedBracket(char),
    #[error("operator `{0}` is not allowed here")]
    DisabledOperator(&'static str),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("malformed escape sequence")]
    MalformedEscape,
    #[error("expected an operand")]
    MissingOperand,
    #[error("unexpected input after the expression")]
    TrailingInput,
}

/// A failed expression parse and the byte offset where it failed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub offset: usize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, offset: usize) -> Self {
        ParseError { kind, offset }
    }
}
