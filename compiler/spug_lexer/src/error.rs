//! Lexer errors.

use spug_diagnostic::{Diagnostic, Phase};
use spug_parse::ParseError;
use thiserror::Error;

/// A markup error. Lexing stops at the first one.
///
/// `Display` is the caret-formatted diagnostic.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{diagnostic}")]
pub struct LexError {
    /// Byte offset the diagnostic points at.
    pub offset: usize,
    pub diagnostic: Diagnostic,
}

impl LexError {
    pub fn new(source: &str, offset: usize, message: impl Into<String>) -> Self {
        LexError {
            offset,
            diagnostic: Diagnostic::at(Phase::Lexer, source, offset, message),
        }
    }

    /// An embedded expression failed to parse; the caret points at the
    /// failure inside the expression.
    pub fn in_expression(source: &str, context: &str, error: &ParseError) -> Self {
        Self::new(source, error.offset, format!("{context}: {error}"))
    }

    pub fn message(&self) -> &str {
        &self.diagnostic.message
    }
}
